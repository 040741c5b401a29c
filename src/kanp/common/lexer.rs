use log::debug;

use crate::kanp::common;
use crate::kanp::common::error::{ErrorInfo, FaultKind, KanpError, KanpResult};
use crate::kanp::common::keywords::KeywordTable;

pub fn tokenize(source: &str, keywords: &KeywordTable) -> KanpResult<Vec<Token>> {
    common::error::convert_error(Lexer::new(source, keywords).get_lexems())
}

// Only failures possible during lexing are an unterminated string, a lone '!' or an integer that
// doesn't fit. Therefore, at most one error can occur at any given time.
type LexResult<A> = Result<A, LexError>;

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // Single-character tokens.
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comma,
    Minus,
    Plus,
    Slash,
    Star,
    // One or two character tokens.
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    // Keywords, spelled by the keyword table.
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

    IntegerLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    Identifier(String),

    Eof,
}

impl TokenType {
    pub fn string_literal<S: Into<String>>(str: S) -> Self { TokenType::StringLiteral(str.into()) }
    pub fn identifier<S: Into<String>>(str: S) -> Self { TokenType::Identifier(str.into()) }

    /// The kind's name as it appears in diagnostics, payload excluded.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TokenType::OpenParen => "LPAREN",
            TokenType::CloseParen => "RPAREN",
            TokenType::OpenBrace => "LBRACE",
            TokenType::CloseBrace => "RBRACE",
            TokenType::Comma => "COMMA",
            TokenType::Minus => "MINUS",
            TokenType::Plus => "PLUS",
            TokenType::Slash => "DIV",
            TokenType::Star => "MUL",
            TokenType::BangEqual => "NEQ",
            TokenType::Equal => "ASSIGN",
            TokenType::EqualEqual => "EQ",
            TokenType::Greater => "GT",
            TokenType::GreaterEqual => "GTE",
            TokenType::Less => "LT",
            TokenType::LessEqual => "LTE",
            TokenType::VarDecl => "VAR_DECL",
            TokenType::Print => "PRINT",
            TokenType::If => "IF",
            TokenType::Else => "ELSE",
            TokenType::While => "WHILE",
            TokenType::AdvancedBlock => "ADVANCED_BLOCK",
            TokenType::ThrowError => "THROW_ERROR",
            TokenType::Return => "RETURN",
            TokenType::Function => "FUNCTION",
            TokenType::ExpertFunc => "EXPERT_FUNC",
            TokenType::IntegerLiteral(_) => "INTEGER",
            TokenType::FloatLiteral(_) => "FLOAT",
            TokenType::StringLiteral(_) => "STRING",
            TokenType::BooleanLiteral(_) => "BOOLEAN",
            TokenType::Identifier(_) => "IDENTIFIER",
            TokenType::Eof => "EOF",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub line: usize,
    pub r#type: TokenType,
}

impl Token {
    pub fn new(line: usize, r#type: TokenType) -> Self {
        Token { line, r#type }
    }
    pub fn get_type(&self) -> &TokenType { &self.r#type }

    pub fn error_info(&self) -> ErrorInfo {
        ErrorInfo { line: self.line }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct LexError {
    line: usize,
    message: String,
}

impl KanpError for LexError {
    fn get_info(&self) -> ErrorInfo {
        ErrorInfo { line: self.line }
    }

    fn get_message(&self) -> String {
        self.message.to_owned()
    }

    fn kind(&self) -> FaultKind { FaultKind::User }
}

struct Lexer<'a> {
    source: Vec<char>,
    keywords: &'a KeywordTable,
    current: usize,
    start: usize,
    line: usize,
    lexems: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, keywords: &'a KeywordTable) -> Self {
        Lexer {
            source: source.chars().collect(),
            keywords,
            current: 0,
            start: 0,
            line: 1,
            lexems: Vec::new(),
        }
    }

    pub fn get_lexems(mut self) -> LexResult<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }
        self.add_token_type(TokenType::Eof);
        debug!("Tokenized {} tokens over {} lines", self.lexems.len(), self.line);
        Ok(self.lexems)
    }

    fn is_at_end(&self) -> bool { self.current >= self.source.len() }

    fn add_token_type(&mut self, tt: TokenType) {
        self.lexems.push(Token::new(self.line, tt));
    }
    fn matches(&mut self, expected: char) -> bool {
        let result = self.peek_test(expected);
        if result {
            self.current += 1;
        }
        result
    }
    fn scan_token(&mut self) -> LexResult<()> {
        let c = self.advance();
        match c {
            ',' => self.add_token_type(TokenType::Comma),
            '(' => self.add_token_type(TokenType::OpenParen),
            ')' => self.add_token_type(TokenType::CloseParen),
            '{' => self.add_token_type(TokenType::OpenBrace),
            '}' => self.add_token_type(TokenType::CloseBrace),
            '-' => self.add_token_type(TokenType::Minus),
            '+' => self.add_token_type(TokenType::Plus),
            '*' => self.add_token_type(TokenType::Star),
            '/' => self.add_token_type(TokenType::Slash),

            '!' =>
                if self.matches('=') {
                    self.add_token_type(TokenType::BangEqual)
                } else {
                    return self.error("Ye '!' kya hai be? '!=' likhna chah rahe ho kya?");
                },
            '=' => {
                let m = self.matches('=');
                self.add_token_type(if m { TokenType::EqualEqual } else { TokenType::Equal })
            }
            '<' => {
                let m = self.matches('=');
                self.add_token_type(if m { TokenType::LessEqual } else { TokenType::Less })
            }
            '>' => {
                let m = self.matches('=');
                self.add_token_type(if m { TokenType::GreaterEqual } else { TokenType::Greater })
            }

            '\n' => self.line += 1,
            '"' => {
                let literal = self.read_string_literal()?;
                self.add_token_type(literal)
            }
            c if c.is_whitespace() => (),
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                self.add_token_type(ident)
            }
            c if c.is_ascii_digit() => {
                let num = self.read_number_literal()?;
                self.add_token_type(num)
            }
            c => debug!("Skipping unrecognized char {:?} on line {}", c, self.line),
        }
        Ok(())
    }

    fn error<A>(&self, msg: &str) -> LexResult<A> {
        Err(LexError { line: self.line, message: msg.to_owned() })
    }

    fn advance(&mut self) -> char {
        let result = self.source[self.current];
        self.current += 1;
        result
    }

    fn peek_test<F: CharTest>(&self, f: F) -> bool {
        self.source.get(self.current).map(|e| f.char_test(*e)).unwrap_or(false)
    }

    // A second '.' ends the literal; it is left for the next scan.
    fn read_number_literal(&mut self) -> LexResult<TokenType> {
        let mut seen_dot = false;
        while self.peek_test(|e: char| e.is_ascii_digit() || e == '.') {
            if self.peek_test('.') {
                if seen_dot {
                    break;
                }
                seen_dot = true;
            }
            self.advance();
        }
        let lexeme = self.current_lexeme();
        if seen_dot {
            lexeme
                .parse::<f64>()
                .map(TokenType::FloatLiteral)
                .or_else(|_| self.error(&format!("Ye '{}' kaisa number hai?", lexeme)))
        } else {
            lexeme
                .parse::<i64>()
                .map(TokenType::IntegerLiteral)
                .or_else(|_| self.error(&format!("Itna bada number '{}'? Sambhal nahi payenge.", lexeme)))
        }
    }

    // No escape sequences, and newlines inside the literal don't advance the line counter.
    fn read_string_literal(&mut self) -> LexResult<TokenType> {
        while self.peek_test(negated_char_test('"')) {
            self.advance();
        }
        if self.is_at_end() {
            self.error("String band karna bhool gaye kya?")
        } else {
            self.start += 1; // Skip opening "
            let result = Ok(TokenType::string_literal(self.current_lexeme()));
            self.advance(); // Move past closing "
            result
        }
    }

    fn read_identifier(&mut self) -> TokenType {
        while self.peek_test(|e: char| e.is_alphanumeric() || e == '_') {
            self.advance();
        }
        let word = self.current_lexeme();
        self.keywords.classify(&word).unwrap_or(TokenType::Identifier(word))
    }

    fn current_lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }
}

trait CharTest {
    fn char_test(&self, c: char) -> bool;
}

fn negated_char_test(c: char) -> impl CharTest {
    move |c2| { c2 != c }
}

impl CharTest for char {
    fn char_test(&self, c: char) -> bool { self == &c }
}

impl<F> CharTest for F where F: Fn(char) -> bool {
    fn char_test(&self, c: char) -> bool { self(c) }
}
