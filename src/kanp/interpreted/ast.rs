use crate::kanp::common::error::ErrorInfo;

pub type Block = Vec<Statement>;

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Block,
}

impl Program {
    pub fn new(statements: Block) -> Self { Program { statements } }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    /// Recorded from the declaration keyword; calls dispatch the same either way.
    pub is_expert: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Block(Block),
    IfElse { cond: Expression, then_block: Block, else_block: Option<Block> },
    While(Expression, Block),
    /// Any fault inside, or a `return`, is rewrapped as a fatal system fault.
    Guarded(Block),
    Throw { message: String, error_info: ErrorInfo },
    Variable(String, Expression),
    Assign(String, Expression),
    Function(FunctionDef),
    Expression(Expression),
    Print(Expression),
    Return(Expression, ErrorInfo),
    NoOp,
}

impl Statement {
    pub fn variable<S: Into<String>>(str: S, expr: Expression) -> Self {
        Statement::Variable(str.into(), expr)
    }
    pub fn assign<S: Into<String>>(str: S, expr: Expression) -> Self {
        Statement::Assign(str.into(), expr)
    }
    pub fn function<S: Into<String>>(name: S, args: Vec<&str>, body: Block) -> Self {
        Statement::Function(FunctionDef {
            name: name.into(),
            params: args.into_iter().map(|e| e.into()).collect(),
            body,
            is_expert: false,
        })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Atomic(Atom),
    Binary(BinaryOperator, Box<Expression>, Box<Expression>),
    FunctionCall(String, Vec<Expression>),
}

impl Expression {
    pub fn pretty_print(&self) -> String {
        match self {
            Expression::Atomic(atom) => match atom {
                Atom::Identifier(name) => name.to_owned(),
                Atom::Integer(i) => i.to_string(),
                Atom::Float(f) => format!("{:?}", f),
                Atom::String(s) => format!("\"{}\"", s),
                Atom::Boolean(b) => b.to_string(),
            },
            Expression::Binary(op, e1, e2) =>
                format!("({} {} {})", e1.pretty_print(), op.symbol(), e2.pretty_print()),
            Expression::FunctionCall(name, args) => format!(
                "{}({})",
                name,
                args.iter().map(|a| a.pretty_print()).collect::<Vec<_>>().join(", "),
            ),
        }
    }
    pub fn identifier<S: Into<String>>(str: S) -> Self {
        Expression::Atomic(Atom::Identifier(str.into()))
    }
    pub fn string<S: Into<String>>(str: S) -> Self { Expression::Atomic(Atom::String(str.into())) }
    pub fn integer(i: i64) -> Self { Expression::Atomic(Atom::Integer(i)) }
    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary(op, Box::new(left), Box::new(right))
    }
    pub fn call<S: Into<String>>(name: S, args: Vec<Expression>) -> Self {
        Expression::FunctionCall(name.into(), args)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Atom {
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum BinaryOperator {
    Minus,
    Plus,
    Div,
    Mult,

    BangEqual,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &str {
        match self {
            BinaryOperator::Minus => "-",
            BinaryOperator::Plus => "+",
            BinaryOperator::Div => "/",
            BinaryOperator::Mult => "*",
            BinaryOperator::BangEqual => "!=",
            BinaryOperator::EqualEqual => "==",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
        }
    }
}
