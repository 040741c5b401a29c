use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;

use either::Either::{Left, Right};
use log::{debug, trace};

use crate::kanp::common::error::{convert_error, KanpError, KanpResult};
use crate::kanp::interpreted::ast::{Atom, BinaryOperator, Expression, FunctionDef, Program, Statement};
use crate::kanp::interpreted::interpreter::environment::Environment;
use crate::kanp::interpreted::interpreter::kanp_value::KanpValue;
use crate::kanp::interpreted::interpreter::result::{Access, binary_type_error, Flow, InterpretResult, InterpreterError};

pub mod environment;
pub mod kanp_value;
pub mod result;

// Counts nested blocks and expressions, so each unit costs a bounded number of host stack frames.
const MAX_DEPTH: usize = 256;

pub fn interpret<W: Write>(program: &Program, writer: W) -> KanpResult<()> {
    convert_error(Interpreter::new(writer).run(program))
}

/// Owns the variable environment and the function table of exactly one program run; never share
/// an instance between runs.
pub struct Interpreter<'a, W: Write> {
    environment: Environment,
    functions: HashMap<&'a str, &'a FunctionDef>,
    writer: W,
    depth: usize,
}

impl<'a, W: Write> Interpreter<'a, W> {
    pub fn new(writer: W) -> Self {
        Interpreter { environment: Environment::new(), functions: HashMap::new(), writer, depth: 0 }
    }

    pub fn environment(&self) -> &Environment { &self.environment }

    pub fn into_writer(self) -> W { self.writer }

    /// A `return` that reaches this level has no call to land in.
    pub fn run(&mut self, program: &'a Program) -> InterpretResult<()> {
        debug!("Evaluating {} top-level statements", program.statements.len());
        match self.execute_block(&program.statements)? {
            Flow::Normal => Ok(()),
            Flow::Returned(_, info) => Err(InterpreterError::ReturnOutsideFunction(info)),
        }
    }

    fn enter(&mut self) -> InterpretResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(InterpreterError::RecursionLimit);
        }
        self.depth += 1;
        Ok(())
    }

    fn execute_block(&mut self, block: &'a [Statement]) -> InterpretResult<Flow> {
        self.enter()?;
        let flow = self.execute_statements(block);
        self.depth -= 1;
        flow
    }

    fn execute_statements(&mut self, block: &'a [Statement]) -> InterpretResult<Flow> {
        for statement in block {
            if let returned @ Flow::Returned(..) = self.execute(statement)? {
                return Ok(returned);
            }
        }
        Ok(Flow::Normal)
    }

    fn execute(&mut self, statement: &'a Statement) -> InterpretResult<Flow> {
        match statement {
            Statement::Variable(name, e) => {
                let value = self.evaluate(e)?;
                self.environment.define(name.to_owned(), value);
                Ok(Flow::Normal)
            }
            Statement::Assign(name, e) => {
                if !self.environment.contains(name) {
                    return Err(InterpreterError::UndeclaredVariable(name.to_owned(), Access::Write));
                }
                let value = self.evaluate(e)?;
                self.environment.assign(name, value);
                Ok(Flow::Normal)
            }
            Statement::Print(e) => {
                let value = self.evaluate(e)?;
                writeln!(self.writer, "{}", value)
                    .map_err(|err| InterpreterError::Output(err.to_string()))?;
                Ok(Flow::Normal)
            }
            Statement::IfElse { cond, then_block, else_block } => {
                if self.evaluate(cond)?.truthiness() {
                    self.execute_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.execute_block(else_block)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::While(cond, body) => {
                while self.evaluate(cond)?.truthiness() {
                    if let returned @ Flow::Returned(..) = self.execute_block(body)? {
                        return Ok(returned);
                    }
                }
                Ok(Flow::Normal)
            }
            // A `return` is caught here as well, its value standing in for the message.
            Statement::Guarded(body) => match self.execute_block(body) {
                Ok(Flow::Normal) => Ok(Flow::Normal),
                Ok(Flow::Returned(value, _)) => Err(InterpreterError::SystemFailure(value.stringify())),
                Err(e) => {
                    debug!("Guarded block caught: {:?}", e);
                    Err(InterpreterError::SystemFailure(e.get_message()))
                }
            },
            Statement::Throw { message, error_info } =>
                Err(InterpreterError::Thrown(message.to_owned(), *error_info)),
            Statement::Function(def) => {
                self.functions.insert(def.name.as_str(), def);
                Ok(Flow::Normal)
            }
            Statement::Expression(e) => self.evaluate(e).map(|_| Flow::Normal),
            Statement::Return(e, info) => Ok(Flow::Returned(self.evaluate(e)?, *info)),
            Statement::Block(block) => self.execute_block(block),
            Statement::NoOp => Ok(Flow::Normal),
        }
    }

    fn evaluate(&mut self, expression: &'a Expression) -> InterpretResult<KanpValue> {
        self.enter()?;
        let value = self.evaluate_expression(expression);
        self.depth -= 1;
        value
    }

    fn evaluate_expression(&mut self, expression: &'a Expression) -> InterpretResult<KanpValue> {
        match expression {
            Expression::Atomic(atom) => match atom {
                Atom::Identifier(name) => self.environment
                    .get(name)
                    .cloned()
                    .ok_or_else(|| InterpreterError::UndeclaredVariable(name.to_owned(), Access::Read)),
                Atom::Integer(i) => Ok(KanpValue::Integer(*i)),
                Atom::Float(f) => Ok(KanpValue::Float(*f)),
                Atom::String(s) => Ok(KanpValue::String(s.to_owned())),
                Atom::Boolean(b) => Ok(KanpValue::Bool(*b)),
            },
            Expression::Binary(op, e1, e2) => {
                let x1 = self.evaluate(e1)?;
                let x2 = self.evaluate(e2)?;
                binary(op, &x1, &x2)
            }
            Expression::FunctionCall(name, args) => self.call(name, args),
        }
    }

    fn call(&mut self, name: &str, args: &'a [Expression]) -> InterpretResult<KanpValue> {
        let func: &'a FunctionDef = self.functions
            .get(name)
            .copied()
            .ok_or_else(|| InterpreterError::UnknownFunction(name.to_owned()))?;
        if args.len() != func.params.len() {
            return Err(InterpreterError::ArityMismatch {
                name: name.to_owned(),
                expected: func.params.len(),
                actual: args.len(),
            });
        }
        let values = args.iter().map(|arg| self.evaluate(arg)).collect::<InterpretResult<Vec<_>>>()?;
        trace!("Calling '{}' with {:?}", name, values);

        let saved = self.environment.bind(&func.params, values);
        let outcome = self.execute_block(&func.body);
        self.environment.restore(saved);

        match outcome? {
            Flow::Normal => Ok(KanpValue::Void),
            Flow::Returned(value, _) => Ok(value),
        }
    }
}

fn binary(op: &BinaryOperator, x1: &KanpValue, x2: &KanpValue) -> InterpretResult<KanpValue> {
    match op {
        BinaryOperator::Plus => match (x1, x2) {
            (KanpValue::String(s1), KanpValue::String(s2)) => Ok(KanpValue::String(format!("{}{}", s1, s2))),
            _ => arithmetic(op, x1, x2, i64::checked_add, |a, b| a + b),
        },
        BinaryOperator::Minus => arithmetic(op, x1, x2, i64::checked_sub, |a, b| a - b),
        BinaryOperator::Mult => arithmetic(op, x1, x2, i64::checked_mul, |a, b| a * b),
        BinaryOperator::Div => match x1.numeric_pair(x2) {
            Some(Left((_, 0))) => Err(InterpreterError::Arithmetic("division by zero".to_owned())),
            Some(Right((_, b))) if b == 0.0 => Err(InterpreterError::Arithmetic("float division by zero".to_owned())),
            Some(Left((a, b))) => Ok(KanpValue::Float(a as f64 / b as f64)),
            Some(Right((a, b))) => Ok(KanpValue::Float(a / b)),
            None => binary_type_error(op, x1, x2),
        },
        BinaryOperator::EqualEqual => Ok(KanpValue::Bool(x1.equal_equal(x2))),
        BinaryOperator::BangEqual => Ok(KanpValue::Bool(!x1.equal_equal(x2))),
        BinaryOperator::Greater
        | BinaryOperator::GreaterEqual
        | BinaryOperator::Less
        | BinaryOperator::LessEqual => match x1.compare(x2) {
            Some(ordering) => Ok(KanpValue::Bool(match op {
                BinaryOperator::Greater => ordering == Ordering::Greater,
                BinaryOperator::GreaterEqual => ordering != Ordering::Less,
                BinaryOperator::Less => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            })),
            // Only NaN lands here among numbers; like any host float comparison it is just false.
            None if x1.numeric_pair(x2).is_some() => Ok(KanpValue::Bool(false)),
            None => binary_type_error(op, x1, x2),
        },
    }
}

fn arithmetic(
    op: &BinaryOperator,
    x1: &KanpValue,
    x2: &KanpValue,
    integers: fn(i64, i64) -> Option<i64>,
    floats: fn(f64, f64) -> f64,
) -> InterpretResult<KanpValue> {
    match x1.numeric_pair(x2) {
        Some(Left((a, b))) => integers(a, b)
            .map(KanpValue::Integer)
            .ok_or_else(|| InterpreterError::Arithmetic(format!("integer overflow in {} {} {}", a, op.symbol(), b))),
        Some(Right((a, b))) => Ok(KanpValue::Float(floats(a, b))),
        None => binary_type_error(op, x1, x2),
    }
}

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;
    use regex::Regex;

    use crate::kanp::common::error::{ErrorInfo, FaultKind};
    use crate::kanp::interpreted::tests::{unsafe_parse, unsafe_run};

    use super::*;

    fn run_err(program: Vec<&str>) -> InterpreterError {
        let ast = unsafe_parse(program);
        let mut buff = Vec::new();
        Interpreter::new(&mut buff).run(&ast).unwrap_err()
    }

    fn run_keeping_environment(program: Vec<&str>) -> (String, HashMap<String, KanpValue>) {
        let ast = unsafe_parse(program);
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run(&ast).unwrap();
        let snapshot = interpreter.environment().snapshot();
        (String::from_utf8(interpreter.into_writer()).unwrap(), snapshot)
    }

    #[test]
    fn simple_program() {
        assert_eq!(unsafe_run(vec!["mana x = 2", "mana y = 3", "bol x + y"]), "5\n");
    }

    #[test]
    fn arithmetic_matches_integers() {
        assert_eq!(unsafe_run(vec!["bol 7 + 5", "bol 7 - 5", "bol 7 * 5", "bol 2 - 5"]), "12\n2\n35\n-3\n");
    }

    #[test]
    fn division_is_always_fractional() {
        assert_eq!(unsafe_run(vec!["bol 4 / 2", "bol 7 / 2", "bol 1.5 * 2"]), "2.0\n3.5\n3.0\n");
    }

    #[test]
    fn large_and_small_floats_print_in_scientific_notation() {
        assert_eq!(
            unsafe_run(vec!["bol 100000000.0 * 1000000000.0", "bol 1.0 / 10000000"]),
            "1e+17\n1e-07\n",
        );
    }

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(unsafe_run(vec!["bol 2 + 3 * 4", "bol (2 + 3) * 4", "bol -3 + 1"]), "14\n20\n-2\n");
    }

    #[test]
    fn string_concat_and_comparisons() {
        assert_eq!(
            unsafe_run(vec![
                "bol \"kanp\" + \"ur\"",
                "bol 2 == 2.0",
                "bol 1 != 1",
                "bol \"a\" < \"b\"",
                "bol 3 >= 4",
                "bol 1 == \"1\"",
            ]),
            "kanpur\nTrue\nFalse\nTrue\nFalse\nFalse\n",
        );
    }

    #[test]
    fn redeclaration_overwrites() {
        let (output, env) = run_keeping_environment(vec!["mana x = 1", "mana x = \"do\"", "bol x"]);
        assert_eq!(output, "do\n");
        assert_eq!(env.get("x"), Some(&KanpValue::String("do".to_owned())));
    }

    #[test]
    fn undeclared_read_and_write_are_worded_differently() {
        let read = run_err(vec!["bol a", "mana a = 5"]);
        let write = run_err(vec!["a = 5"]);
        assert_eq!(read, InterpreterError::UndeclaredVariable("a".to_owned(), Access::Read));
        assert_eq!(write, InterpreterError::UndeclaredVariable("a".to_owned(), Access::Write));
        assert_ne!(read.get_message(), write.get_message());
        assert_eq!(read.kind(), FaultKind::User);
        assert_eq!(write.get_info().line, 0);
    }

    #[test]
    fn assignment_checks_before_evaluating() {
        // The right-hand side would fail with a different fault if it were evaluated first.
        assert_eq!(
            run_err(vec!["a = missing"]),
            InterpreterError::UndeclaredVariable("a".to_owned(), Access::Write),
        );
    }

    #[test]
    fn if_else_and_truthiness() {
        assert_eq!(
            unsafe_run(vec![
                "agar 0 { bol \"zero\" } warna { bol \"not zero\" }",
                "agar \"\" { bol \"empty\" }",
                "agar \"x\" { bol \"text\" }",
                "agar galat { bol 1 } warna { bol 2 }",
                "agar 0.5 { bol \"half\" }",
            ]),
            "not zero\ntext\n2\nhalf\n",
        );
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            unsafe_run(vec!["mana i = 0", "jabtak i < 3 { bol i i = i + 1 }", "bol \"done\""]),
            "0\n1\n2\ndone\n",
        );
    }

    #[test]
    fn falsy_while_never_runs() {
        for cond in vec!["0", "\"\"", "galat"] {
            let program = format!("jabtak {} {{ bol \"ran\" }}", cond);
            assert_eq!(unsafe_run(vec![program.as_str()]), "");
        }
    }

    #[test]
    fn functions_and_returns() {
        assert_eq!(
            unsafe_run(vec![
                "kaam add(a, b) { wapas a + b }",
                "bol add(2, 3)",
                "kaam shout(s) { bol s + \"!\" }",
                "shout(\"oye\")",
                "bol shout(\"x\")",
            ]),
            "5\noye!\nx!\nNone\n",
        );
    }

    #[test]
    fn return_unwinds_nested_blocks() {
        assert_eq!(
            unsafe_run(vec![
                "kaam first_big(n) {",
                "  mana i = 0",
                "  jabtak sahi {",
                "    agar i * i > n { wapas i }",
                "    i = i + 1",
                "  }",
                "}",
                "bol first_big(20)",
            ]),
            "5\n",
        );
    }

    #[test]
    fn recursion() {
        assert_eq!(
            unsafe_run(vec![
                "kaam fact(n) { agar n <= 1 { wapas 1 } wapas n * fact(n - 1) }",
                "bol fact(10)",
            ]),
            "3628800\n",
        );
    }

    #[test]
    fn parameter_shadowing_round_trip() {
        let (output, env) = run_keeping_environment(vec![
            "mana x = 1",
            "kaam f(x) { wapas x + 1 }",
            "bol f(10)",
            "bol x",
        ]);
        assert_eq!(output, "11\n1\n");
        assert_eq!(env.get("x"), Some(&KanpValue::Integer(1)));
    }

    #[test]
    fn parameters_without_prior_binding_are_removed() {
        let (_, env) = run_keeping_environment(vec!["kaam f(p) { wapas p }", "mana r = f(3)"]);
        assert_eq!(env.get("p"), None);
        assert_eq!(env.get("r"), Some(&KanpValue::Integer(3)));
    }

    #[test]
    fn callee_sees_caller_bindings() {
        assert_eq!(
            unsafe_run(vec![
                "kaam show() { bol n }",
                "kaam outer(n) { show() }",
                "outer(7)",
            ]),
            "7\n",
        );
    }

    #[test]
    fn parameters_restored_after_fault() {
        let ast = unsafe_parse(vec!["mana x = 1", "kaam f(x) { kaand \"uff\" }", "f(2)"]);
        let mut interpreter = Interpreter::new(Vec::new());
        assert!(interpreter.run(&ast).is_err());
        assert_eq!(interpreter.environment().get("x"), Some(&KanpValue::Integer(1)));
    }

    #[test]
    fn arguments_are_evaluated_before_binding() {
        assert_eq!(
            unsafe_run(vec!["mana a = 1", "mana b = 2", "kaam f(a, b) { wapas a - b }", "bol f(b, a)"]),
            "1\n",
        );
    }

    #[test]
    fn declaration_must_run_before_call() {
        assert_eq!(run_err(vec!["f()", "kaam f() { }"]), InterpreterError::UnknownFunction("f".to_owned()));
    }

    #[test]
    fn arity_mismatch_reports_both_counts() {
        lazy_static! {
            static ref ARITY: Regex =
                Regex::new(r"^Function '(\w+)' maang raha hai (\d+) arguments, tum diye (\d+)\.$").unwrap();
        }
        let error = run_err(vec!["kaam f(a, b) { }", "f(1)"]);
        assert_eq!(error, InterpreterError::ArityMismatch { name: "f".to_owned(), expected: 2, actual: 1 });
        let message = error.get_message();
        let captures = ARITY.captures(&message).expect("Arity message has an unexpected shape");
        assert_eq!(&captures[1], "f");
        assert_eq!(&captures[2], "2");
        assert_eq!(&captures[3], "1");
    }

    #[test]
    fn throw_carries_its_line() {
        let error = run_err(vec!["bol 1", "", "kaand \"kuch to gadbad hai\""]);
        assert_eq!(error.get_message(), "kuch to gadbad hai");
        assert_eq!(error.get_info().line, 3);
        assert_eq!(error.kind(), FaultKind::User);
    }

    #[test]
    fn guarded_block_rewraps_any_fault() {
        let error = run_err(vec!["bhaukaal { bol 1 kaand \"uff\" bol 2 }", "bol 3"]);
        assert_eq!(error, InterpreterError::SystemFailure("uff".to_owned()));
        assert_eq!(error.kind(), FaultKind::FatalSystem);
        crate::assert_msg_contains!(error.get_message(), "uff");

        let error = run_err(vec!["bhaukaal { bol missing }"]);
        assert_eq!(error.kind(), FaultKind::FatalSystem);
        crate::assert_msg_contains!(error.get_message(), "Variable 'missing' dhoond rahe ho?");

        let error = run_err(vec!["bhaukaal { bol 1 / 0 }"]);
        assert_eq!(error.kind(), FaultKind::FatalSystem);
    }

    #[test]
    fn guarded_block_without_fault_continues() {
        assert_eq!(unsafe_run(vec!["bhaukaal { bol 1 }", "bol 2"]), "1\n2\n");
    }

    #[test]
    fn guarded_block_catches_return_at_top_level() {
        let error = run_err(vec!["bhaukaal { wapas 1 }"]);
        assert_eq!(error, InterpreterError::SystemFailure("1".to_owned()));
        assert_eq!(error.kind(), FaultKind::FatalSystem);
        assert_eq!(error.get_message(), "Bhaukaal machane me galti ho gayi: 1");
    }

    #[test]
    fn guarded_block_catches_return_inside_function() {
        let ast = unsafe_parse(vec!["kaam f() { bhaukaal { wapas 4 } bol \"unreached\" }", "bol f()"]);
        let mut buff = Vec::new();
        let error = Interpreter::new(&mut buff).run(&ast).unwrap_err();
        assert_eq!(error, InterpreterError::SystemFailure("4".to_owned()));
        assert_eq!(error.kind(), FaultKind::FatalSystem);
        assert!(buff.is_empty());
    }

    #[test]
    fn runaway_recursion_is_an_internal_fault() {
        let error = run_err(vec!["kaam f(n) { wapas f(n + 1) }", "bol f(0)"]);
        assert_eq!(error, InterpreterError::RecursionLimit);
        assert_eq!(error.kind(), FaultKind::Internal);
        assert_eq!(error.get_message(), "maximum recursion depth exceeded");
    }

    #[test]
    fn runaway_recursion_inside_guarded_block() {
        let error = run_err(vec!["kaam f(n) { wapas f(n + 1) }", "bhaukaal { bol f(0) }"]);
        assert_eq!(error.kind(), FaultKind::FatalSystem);
        crate::assert_msg_contains!(error.get_message(), "maximum recursion depth exceeded");
    }

    #[test]
    fn depth_is_released_after_each_call() {
        assert_eq!(
            unsafe_run(vec![
                "kaam down(n) { agar n == 0 { wapas 0 } wapas down(n - 1) }",
                "mana i = 0",
                "jabtak i < 20 { mana r = down(50) i = i + 1 }",
                "bol down(50)",
            ]),
            "0\n",
        );
    }

    #[test]
    fn parameters_restored_after_runaway_recursion() {
        let ast = unsafe_parse(vec!["mana n = 7", "kaam f(n) { wapas f(n + 1) }", "f(0)"]);
        let mut interpreter = Interpreter::new(Vec::new());
        assert_eq!(interpreter.run(&ast), Err(InterpreterError::RecursionLimit));
        assert_eq!(interpreter.environment().get("n"), Some(&KanpValue::Integer(7)));
    }

    #[test]
    fn return_outside_function() {
        let error = run_err(vec!["bol 1", "wapas 2"]);
        assert_eq!(error, InterpreterError::ReturnOutsideFunction(ErrorInfo::new(2)));
        assert_eq!(error.kind(), FaultKind::Internal);
    }

    #[test]
    fn host_level_failures_are_internal() {
        for program in vec!["bol 1 / 0", "bol 1.0 / 0", "bol \"a\" - 1", "bol 1 < \"a\"", "bol sahi + 1"] {
            let error = run_err(vec![program]);
            assert_eq!(error.kind(), FaultKind::Internal, "for {}", program);
        }
        assert_eq!(run_err(vec!["bol 1 / 0"]).get_message(), "division by zero");
    }

    #[test]
    fn integer_overflow() {
        let error = run_err(vec!["bol 9223372036854775807 + 1"]);
        assert!(matches!(error, InterpreterError::Arithmetic(_)));
    }

    #[test]
    fn expert_functions_dispatch_normally() {
        assert_eq!(unsafe_run(vec!["ustaad kaam sq(n) { wapas n * n }", "bol sq(9)"]), "81\n");
    }

    #[test]
    fn redeclared_function_replaces_previous() {
        assert_eq!(
            unsafe_run(vec!["kaam f() { wapas 1 }", "bol f()", "kaam f() { wapas 2 }", "bol f()"]),
            "1\n2\n",
        );
    }

    #[test]
    fn nested_blocks_share_the_environment() {
        assert_eq!(unsafe_run(vec!["{ mana inner = 4 }", "bol inner"]), "4\n");
    }
}
