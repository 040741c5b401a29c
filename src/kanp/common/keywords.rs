use std::collections::HashMap;
use std::fs::read_to_string;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::kanp::common::lexer::TokenType;

const STANDARD_TABLE: &str = include_str!("../../../keywords.json");

/// Token kinds a vernacular spelling can stand for.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Keyword {
    VarDecl,
    Print,
    If,
    Else,
    While,
    AdvancedBlock,
    ThrowError,
    Return,
    Function,
    ExpertFunc,
}

impl From<Keyword> for TokenType {
    fn from(keyword: Keyword) -> Self {
        match keyword {
            Keyword::VarDecl => TokenType::VarDecl,
            Keyword::Print => TokenType::Print,
            Keyword::If => TokenType::If,
            Keyword::Else => TokenType::Else,
            Keyword::While => TokenType::While,
            Keyword::AdvancedBlock => TokenType::AdvancedBlock,
            Keyword::ThrowError => TokenType::ThrowError,
            Keyword::Return => TokenType::Return,
            Keyword::Function => TokenType::Function,
            Keyword::ExpertFunc => TokenType::ExpertFunc,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read keyword table '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed keyword table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keyword table needs exactly one true and one false spelling, got {0:?}")]
    Booleans(HashMap<String, bool>),
}

#[derive(Debug, Deserialize)]
struct RawTable {
    keywords: HashMap<String, Keyword>,
    boolean: HashMap<String, bool>,
}

/// Vernacular spelling lookup handed to every lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTable {
    keywords: HashMap<String, Keyword>,
    booleans: HashMap<String, bool>,
}

impl KeywordTable {
    /// The table bundled with the crate.
    pub fn standard() -> Result<Self, ConfigError> {
        KeywordTable::from_json(STANDARD_TABLE)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        KeywordTable::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let RawTable { keywords, boolean } = serde_json::from_str(json)?;
        let trues = boolean.values().filter(|b| **b).count();
        if boolean.len() != 2 || trues != 1 {
            return Err(ConfigError::Booleans(boolean));
        }
        debug!("Loaded keyword table with {} keywords", keywords.len());
        Ok(KeywordTable { keywords, booleans: boolean })
    }

    /// Keywords win over boolean spellings; anything else is a plain identifier.
    pub fn classify(&self, word: &str) -> Option<TokenType> {
        self.keywords
            .get(word)
            .map(|k| TokenType::from(*k))
            .or_else(|| self.booleans.get(word).map(|b| TokenType::BooleanLiteral(*b)))
    }
}
