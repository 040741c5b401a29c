pub mod error;
pub mod keywords;
pub mod lexer;
