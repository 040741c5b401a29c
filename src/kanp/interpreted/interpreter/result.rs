use crate::kanp::common::error::{ErrorInfo, FaultKind, KanpError, RECURSION_LIMIT_MESSAGE};
use crate::kanp::interpreted::ast::BinaryOperator;
use crate::kanp::interpreted::interpreter::kanp_value::KanpValue;
use crate::kanp::interpreted::interpreter::result::InterpreterError::{Arithmetic, ArityMismatch, Output, RecursionLimit, ReturnOutsideFunction, SystemFailure, Thrown, TypeError, UndeclaredVariable, UnknownFunction};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug, PartialEq, Clone)]
pub enum InterpreterError {
    UndeclaredVariable(String, Access),
    UnknownFunction(String),
    ArityMismatch { name: String, expected: usize, actual: usize },
    Thrown(String, ErrorInfo),
    /// A fault raised inside a guarded block; only the original message survives.
    SystemFailure(String),

    // Outside the user-facing taxonomy.
    TypeError(String),
    Arithmetic(String),
    ReturnOutsideFunction(ErrorInfo),
    Output(String),
    /// Evaluation nested deeper than the interpreter allows.
    RecursionLimit,
}

impl KanpError for InterpreterError {
    fn get_info(&self) -> ErrorInfo {
        match self {
            Thrown(_, i) => *i,
            ReturnOutsideFunction(i) => *i,
            UndeclaredVariable(..) | UnknownFunction(_) | ArityMismatch { .. } | SystemFailure(_)
            | TypeError(_) | Arithmetic(_) | Output(_) | RecursionLimit => ErrorInfo::UNTRACKED,
        }
    }

    fn get_message(&self) -> String {
        match self {
            UndeclaredVariable(name, Access::Read) =>
                format!("Variable '{}' dhoond rahe ho? Pehle declare to karo!", name),
            UndeclaredVariable(name, Access::Write) =>
                format!("Variable '{}' declare nahi kiya hai be.", name),
            UnknownFunction(name) => format!("Function '{}' kaun banayega? Hum?", name),
            ArityMismatch { name, expected, actual } => format!(
                "Function '{}' maang raha hai {} arguments, tum diye {}.", name, expected, actual),
            Thrown(message, _) => message.to_owned(),
            SystemFailure(message) => format!("Bhaukaal machane me galti ho gayi: {}", message),
            TypeError(m) => format!("Type error: {}", m),
            Arithmetic(m) => m.to_owned(),
            ReturnOutsideFunction(_) => "Return outside of function".to_owned(),
            Output(m) => format!("Cannot write output: {}", m),
            RecursionLimit => RECURSION_LIMIT_MESSAGE.to_owned(),
        }
    }

    fn kind(&self) -> FaultKind {
        match self {
            UndeclaredVariable(..) | UnknownFunction(_) | ArityMismatch { .. } | Thrown(..) =>
                FaultKind::User,
            SystemFailure(_) => FaultKind::FatalSystem,
            TypeError(_) | Arithmetic(_) | ReturnOutsideFunction(_) | Output(_) | RecursionLimit =>
                FaultKind::Internal,
        }
    }
}

pub type InterpretResult<A> = Result<A, InterpreterError>;

/// How a statement finished: fell through, or hit a `return` that still has to reach its call.
#[derive(Debug, PartialEq, Clone)]
pub enum Flow {
    Normal,
    Returned(KanpValue, ErrorInfo),
}

pub fn binary_type_error<A>(op: &BinaryOperator, v1: &KanpValue, v2: &KanpValue) -> InterpretResult<A> {
    Err(TypeError(format!(
        "Cannot apply operator '{}' to {} '{}' and {} '{}'",
        op.symbol(),
        v1.type_name(),
        v1,
        v2.type_name(),
        v2,
    )))
}
