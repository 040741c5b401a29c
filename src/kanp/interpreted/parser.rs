use std::mem;

use log::debug;
use num_traits::FromPrimitive;

use crate::kanp::common::error::{convert_error, ErrorInfo, KanpResult, ParserError};
use crate::kanp::common::lexer::{Token, TokenType};
use crate::kanp::interpreted::ast::{Atom, BinaryOperator, Block, Expression, FunctionDef, Program, Statement};

pub fn parse(tokens: &[Token]) -> KanpResult<Program> {
    convert_error(Parser::parse(tokens))
}

type ParserResult<A> = Result<A, ParserError>;

// Parenthesised expressions, operator chains, unary signs and nested blocks all count.
const MAX_NESTING: usize = 200;

#[derive(Debug)]
struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    depth: usize,
    // Stands in once the slice runs out, whether or not it ended with EOF.
    end: Token,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, FromPrimitive)]
enum Precedence {
    Expression /* + - == != > < >= <= */,
    Term /* * / */,
}

impl Precedence {
    fn next(&self) -> Option<Self> {
        FromPrimitive::from_u8(*self as u8 + 1)
    }

    fn operator(&self, tt: &TokenType) -> Option<BinaryOperator> {
        match (self, tt) {
            (Precedence::Expression, TokenType::Plus) => Some(BinaryOperator::Plus),
            (Precedence::Expression, TokenType::Minus) => Some(BinaryOperator::Minus),
            (Precedence::Expression, TokenType::EqualEqual) => Some(BinaryOperator::EqualEqual),
            (Precedence::Expression, TokenType::BangEqual) => Some(BinaryOperator::BangEqual),
            (Precedence::Expression, TokenType::Greater) => Some(BinaryOperator::Greater),
            (Precedence::Expression, TokenType::Less) => Some(BinaryOperator::Less),
            (Precedence::Expression, TokenType::GreaterEqual) => Some(BinaryOperator::GreaterEqual),
            (Precedence::Expression, TokenType::LessEqual) => Some(BinaryOperator::LessEqual),
            (Precedence::Term, TokenType::Star) => Some(BinaryOperator::Mult),
            (Precedence::Term, TokenType::Slash) => Some(BinaryOperator::Div),
            _ => None,
        }
    }
}

impl<'a> Parser<'a> {
    pub fn parse(tokens: &'a [Token]) -> ParserResult<Program> {
        let end = Token::new(tokens.last().map_or(0, |t| t.line), TokenType::Eof);
        let mut parser = Parser { tokens, current: 0, depth: 0, end };
        let statements = parser.block()?;
        debug!("Parsed {} top-level statements", statements.len());
        Ok(Program::new(statements))
    }

    // Stops at '}' or end of input, without consuming either.
    fn block(&mut self) -> ParserResult<Block> {
        let mut statements = Vec::new();
        while !self.check(&TokenType::CloseBrace) && !self.is_at_end() {
            match self.statement()? {
                Statement::NoOp => (),
                s => statements.push(s),
            }
        }
        Ok(statements)
    }

    fn braced_block(&mut self) -> ParserResult<Block> {
        self.consume(TokenType::OpenBrace)?;
        self.enter()?;
        let block = self.block()?;
        self.depth -= 1;
        self.consume(TokenType::CloseBrace)?;
        Ok(block)
    }

    // A failed parse is never resumed, so only the successful paths give depth back.
    fn enter(&mut self) -> ParserResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(ParserError::NestingTooDeep { line: self.peek().line });
        }
        self.depth += 1;
        Ok(())
    }

    fn statement(&mut self) -> ParserResult<Statement> {
        let token = self.peek().clone();
        match token.get_type() {
            TokenType::VarDecl => {
                self.advance();
                let name = self.consume_identifier()?;
                self.consume(TokenType::Equal)?;
                Ok(Statement::Variable(name, self.expression()?))
            }
            TokenType::Identifier(name) => {
                self.advance();
                match self.peek_type() {
                    TokenType::Equal => {
                        self.advance();
                        Ok(Statement::Assign(name.to_owned(), self.expression()?))
                    }
                    TokenType::OpenParen => {
                        self.advance();
                        let args = self.arguments()?;
                        Ok(Statement::Expression(Expression::FunctionCall(name.to_owned(), args)))
                    }
                    _ => Err(ParserError::NeitherAssignmentNorCall {
                        name: name.to_owned(),
                        line: token.line,
                    }),
                }
            }
            TokenType::Print => {
                self.advance();
                Ok(Statement::Print(self.expression()?))
            }
            TokenType::If => {
                self.advance();
                let cond = self.expression()?;
                let then_block = self.braced_block()?;
                let else_block = if self.check(&TokenType::Else) {
                    self.advance();
                    Some(self.braced_block()?)
                } else {
                    None
                };
                Ok(Statement::IfElse { cond, then_block, else_block })
            }
            TokenType::While => {
                self.advance();
                let cond = self.expression()?;
                Ok(Statement::While(cond, self.braced_block()?))
            }
            TokenType::AdvancedBlock => {
                self.advance();
                Ok(Statement::Guarded(self.braced_block()?))
            }
            TokenType::ThrowError => {
                self.advance();
                let error_info = self.peek().error_info();
                let message = self.consume_string()?;
                Ok(Statement::Throw { message, error_info })
            }
            TokenType::Return => {
                self.advance();
                Ok(Statement::Return(self.expression()?, token.error_info()))
            }
            TokenType::Function => {
                self.advance();
                self.function_declaration(false)
            }
            TokenType::ExpertFunc => {
                self.advance();
                if self.check(&TokenType::Function) {
                    self.advance();
                }
                self.function_declaration(true)
            }
            TokenType::OpenBrace => Ok(Statement::Block(self.braced_block()?)),
            TokenType::CloseBrace | TokenType::Eof => Ok(Statement::NoOp),
            // Stray tokens are dropped one at a time, so a block always makes progress.
            _ => {
                debug!("Ignoring stray {} on line {}", token.get_type().kind_name(), token.line);
                self.advance();
                Ok(Statement::NoOp)
            }
        }
    }

    fn function_declaration(&mut self, is_expert: bool) -> ParserResult<Statement> {
        let name = self.consume_identifier()?;
        self.consume(TokenType::OpenParen)?;
        let mut params = Vec::new();
        if let TokenType::Identifier(first) = self.peek_type() {
            params.push(first.to_owned());
            self.advance();
            while self.check(&TokenType::Comma) {
                self.advance();
                params.push(self.consume_identifier()?);
            }
        }
        self.consume(TokenType::CloseParen)?;
        let body = self.braced_block()?;
        Ok(Statement::Function(FunctionDef { name, params, body, is_expert }))
    }

    fn expression(&mut self) -> ParserResult<Expression> {
        self.enter()?;
        let expr = self.binary(Precedence::Expression)?;
        self.depth -= 1;
        Ok(expr)
    }

    // Every operator in a chain deepens the (left-leaning) tree by one.
    fn binary(&mut self, precedence: Precedence) -> ParserResult<Expression> {
        let mut expr = self.operand(precedence)?;
        let mut chained = 0;
        while let Some(operator) = precedence.operator(self.peek_type()) {
            self.enter()?;
            chained += 1;
            self.advance();
            let right = self.operand(precedence)?;
            expr = Expression::Binary(operator, Box::new(expr), Box::new(right));
        }
        self.depth -= chained;
        Ok(expr)
    }

    fn operand(&mut self, precedence: Precedence) -> ParserResult<Expression> {
        match precedence.next() {
            Some(next) => self.binary(next),
            None => self.factor(),
        }
    }

    fn factor(&mut self) -> ParserResult<Expression> {
        let token = self.peek().clone();
        match token.r#type {
            TokenType::Plus => {
                self.advance();
                self.enter()?;
                let operand = self.factor()?;
                self.depth -= 1;
                Ok(operand)
            }
            TokenType::Minus => {
                self.advance();
                self.enter()?;
                let operand = self.factor()?;
                self.depth -= 1;
                Ok(Expression::binary(BinaryOperator::Minus, Expression::integer(0), operand))
            }
            TokenType::IntegerLiteral(i) => {
                self.advance();
                Ok(Expression::Atomic(Atom::Integer(i)))
            }
            TokenType::FloatLiteral(f) => {
                self.advance();
                Ok(Expression::Atomic(Atom::Float(f)))
            }
            TokenType::StringLiteral(s) => {
                self.advance();
                Ok(Expression::Atomic(Atom::String(s)))
            }
            TokenType::BooleanLiteral(b) => {
                self.advance();
                Ok(Expression::Atomic(Atom::Boolean(b)))
            }
            TokenType::Identifier(name) => {
                self.advance();
                if self.check(&TokenType::OpenParen) {
                    self.advance();
                    Ok(Expression::FunctionCall(name, self.arguments()?))
                } else {
                    Ok(Expression::Atomic(Atom::Identifier(name)))
                }
            }
            TokenType::OpenParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::CloseParen)?;
                Ok(expr)
            }
            _ => Err(ParserError::ExpectedExpression(token)),
        }
    }

    // Expects the opening paren to be consumed already.
    fn arguments(&mut self) -> ParserResult<Vec<Expression>> {
        let mut args = Vec::new();
        if !self.check(&TokenType::CloseParen) {
            args.push(self.expression()?);
            while self.check(&TokenType::Comma) {
                self.advance();
                args.push(self.expression()?);
            }
        }
        self.consume(TokenType::CloseParen)?;
        Ok(args)
    }

    fn consume(&mut self, expected: TokenType) -> ParserResult<ErrorInfo> {
        if self.check(&expected) {
            Ok(self.advance().error_info())
        } else {
            self.unexpected(expected.kind_name())
        }
    }

    fn consume_identifier(&mut self) -> ParserResult<String> {
        match self.peek_type() {
            TokenType::Identifier(name) => {
                let name = name.to_owned();
                self.advance();
                Ok(name)
            }
            _ => self.unexpected("IDENTIFIER"),
        }
    }

    fn consume_string(&mut self) -> ParserResult<String> {
        match self.peek_type() {
            TokenType::StringLiteral(s) => {
                let s = s.to_owned();
                self.advance();
                Ok(s)
            }
            _ => self.unexpected("STRING"),
        }
    }

    fn unexpected<A>(&self, expected: &'static str) -> ParserResult<A> {
        Err(ParserError::UnexpectedToken { expected, actual: self.peek().to_owned() })
    }

    fn check(&self, expected: &TokenType) -> bool {
        mem::discriminant(self.peek_type()) == mem::discriminant(expected)
    }

    // Stops on an EOF token; past the end of the slice the synthetic `end` token is returned.
    fn advance(&mut self) -> &Token {
        let index = self.current;
        if index < self.tokens.len() && !self.is_at_end() {
            self.current += 1;
        }
        self.tokens.get(index).unwrap_or(&self.end)
    }

    fn is_at_end(&self) -> bool {
        self.peek_type() == &TokenType::Eof
    }
    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.end)
    }
    fn peek_type(&self) -> &TokenType {
        self.peek().get_type()
    }
}
