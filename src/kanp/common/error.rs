use std::fmt;
use std::fmt::{Debug, Display, Formatter};

use crate::kanp::common::lexer::Token;

pub trait KanpError: Debug {
    fn get_info(&self) -> ErrorInfo;
    fn get_message(&self) -> String;
    fn kind(&self) -> FaultKind;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ErrorInfo {
    pub line: usize,
}

impl ErrorInfo {
    /// For fault sites that never tracked a source position.
    pub const UNTRACKED: ErrorInfo = ErrorInfo { line: 0 };

    pub fn new(line: usize) -> Self { ErrorInfo { line } }
}

/// The closed fault taxonomy. `Internal` is everything outside of it, i.e., interpreter defects and
/// host-level failures such as dividing by zero.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FaultKind {
    User,
    FatalSystem,
    AdvisoryWarning,
    Internal,
}

impl FaultKind {
    pub fn label(&self) -> &'static str {
        match self {
            FaultKind::User => "BaklolError",
            FaultKind::FatalSystem => "BhaukaalError (Serious System Fail)",
            FaultKind::AdvisoryWarning => "GyaanPelWarning",
            FaultKind::Internal => "InternalError",
        }
    }
}

pub const RECURSION_LIMIT_MESSAGE: &str = "maximum recursion depth exceeded";

pub type KanpResult<A> = Result<A, Box<dyn KanpError>>;

pub fn convert_error<A, E: KanpError + 'static>(result: Result<A, E>) -> KanpResult<A> {
    result.map_err(|e| Box::new(e) as Box<dyn KanpError>)
}

#[derive(Debug, PartialEq, Clone)]
pub enum ParserError {
    UnexpectedToken { expected: &'static str, actual: Token },
    ExpectedExpression(Token),
    NeitherAssignmentNorCall { name: String, line: usize },
    NestingTooDeep { line: usize },
}

impl KanpError for ParserError {
    fn get_info(&self) -> ErrorInfo {
        match self {
            ParserError::UnexpectedToken { actual, .. } => actual.error_info(),
            ParserError::ExpectedExpression(token) => token.error_info(),
            ParserError::NeitherAssignmentNorCall { line, .. } | ParserError::NestingTooDeep { line } =>
                ErrorInfo::new(*line),
        }
    }

    fn get_message(&self) -> String {
        match self {
            ParserError::UnexpectedToken { expected, actual } =>
                format!("Umeed thi '{}' ki, par mila '{}'", expected, actual.get_type().kind_name()),
            ParserError::ExpectedExpression(_) =>
                "Expression expect kar rahe the, ye kya aa gaya?".to_owned(),
            ParserError::NeitherAssignmentNorCall { name, .. } =>
                format!("Na to assignment hai na function call, kya chahte ho '{}' se?", name),
            ParserError::NestingTooDeep { .. } => RECURSION_LIMIT_MESSAGE.to_owned(),
        }
    }

    fn kind(&self) -> FaultKind {
        match self {
            ParserError::NestingTooDeep { .. } => FaultKind::Internal,
            _ => FaultKind::User,
        }
    }
}

pub const SUCCESS_MARKER: &str = "\n✅ Execution Complete: Sab chaukas chal raha hai";

/// A detached, printable snapshot of a fault, as handed to hosting collaborators.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FaultReport {
    pub kind: FaultKind,
    pub message: String,
    pub line: usize,
}

impl FaultReport {
    pub fn from_error(error: &dyn KanpError) -> Self {
        FaultReport { kind: error.kind(), message: error.get_message(), line: error.get_info().line }
    }

    /// Internal faults are reported generically, with a surface-specific headline.
    pub fn render(&self, crash_headline: &str) -> String {
        match self.kind {
            FaultKind::Internal => format!("❌ BaklolError: {}\n{}", crash_headline, self.message),
            FaultKind::AdvisoryWarning => format!(
                "\n⚠️ {}:\n{}\nLine {}: Zyada mat socho", self.kind.label(), self.message, self.line),
            FaultKind::User | FaultKind::FatalSystem => format!(
                "\n❌ {}:\n{}\nLine {} pe kaand ho gaya", self.kind.label(), self.message, self.line),
        }
    }
}

impl Display for FaultReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("Interpreter hi fat gaya."))
    }
}

#[cfg(test)]
mod tests {
    use crate::kanp::common::lexer::TokenType;

    use super::*;

    #[test]
    fn unexpected_token_names_both_kinds() {
        let error = ParserError::UnexpectedToken {
            expected: "RPAREN",
            actual: Token::new(3, TokenType::Eof),
        };
        assert_eq!(error.get_message(), "Umeed thi 'RPAREN' ki, par mila 'EOF'");
        assert_eq!(error.get_info().line, 3);
        assert_eq!(error.kind(), FaultKind::User);
    }

    #[test]
    fn user_fault_report() {
        let report = FaultReport { kind: FaultKind::User, message: "oops".to_owned(), line: 4 };
        assert_eq!(report.to_string(), "\n❌ BaklolError:\noops\nLine 4 pe kaand ho gaya");
    }

    #[test]
    fn fatal_fault_report_uses_its_own_label() {
        let report = FaultReport { kind: FaultKind::FatalSystem, message: "boom".to_owned(), line: 0 };
        assert_eq!(
            report.to_string(),
            "\n❌ BhaukaalError (Serious System Fail):\nboom\nLine 0 pe kaand ho gaya",
        );
    }

    #[test]
    fn warning_report() {
        let report = FaultReport {
            kind: FaultKind::AdvisoryWarning,
            message: "socho mat".to_owned(),
            line: 2,
        };
        assert_eq!(report.to_string(), "\n⚠️ GyaanPelWarning:\nsocho mat\nLine 2: Zyada mat socho");
    }

    #[test]
    fn internal_fault_is_generic() {
        let report = FaultReport {
            kind: FaultKind::Internal,
            message: "division by zero".to_owned(),
            line: 0,
        };
        assert_eq!(report.to_string(), "❌ BaklolError: Interpreter hi fat gaya.\ndivision by zero");
        assert_eq!(
            report.render("System fat gaya."),
            "❌ BaklolError: System fat gaya.\ndivision by zero",
        );
    }
}
