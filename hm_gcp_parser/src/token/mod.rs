//! Token definitions for the lexer

#[cfg(test)]
mod tests;

use logos::Logos;

/// Raw tokens produced by logos.
///
/// Float literals and string bodies are not matched here; the [`crate::lexer::Lexer`]
/// wrapper extends `Integer` and `DoubleQuote` tokens by scanning the source.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"([ \t\r\n\f]+|//[^\n]*)")]
pub enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    /// Opens a struct literal
    #[token("@{")]
    AtBrace,
    #[token("->")]
    Arrow,
    #[token("=")]
    Equals,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    #[regex(r"[0-9]+")]
    Integer,
    /// Produced by the lexer wrapper only
    Float,
    #[token("\"")]
    DoubleQuote,
    /// A complete string literal, quotes included; produced by the lexer wrapper only
    Str,

    #[regex(r"[A-Za-z_*?+][A-Za-z0-9_*?+/]*")]
    Identifier,
}

impl Token {
    /// Human readable name used in "expected ..." messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::AtBrace => "'@{'",
            Token::Arrow => "'->'",
            Token::Equals => "'='",
            Token::Semicolon => "';'",
            Token::Comma => "','",
            Token::Dot => "'.'",
            Token::Integer => "integer",
            Token::Float => "float",
            Token::DoubleQuote | Token::Str => "string",
            Token::Identifier => "identifier",
        }
    }

    /// True for tokens that can begin a term.
    pub fn starts_term(&self) -> bool {
        matches!(
            self,
            Token::LParen
                | Token::LBrace
                | Token::AtBrace
                | Token::Integer
                | Token::Float
                | Token::Str
                | Token::DoubleQuote
                | Token::Identifier
        )
    }
}
