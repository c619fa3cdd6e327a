//! Tests for token module

use super::*;
use logos::Logos;

#[test]
fn test_punctuation() {
    let mut lexer = Token::lexer("( ) { } @{ -> = ; , .");
    assert_eq!(lexer.next(), Some(Ok(Token::LParen)));
    assert_eq!(lexer.next(), Some(Ok(Token::RParen)));
    assert_eq!(lexer.next(), Some(Ok(Token::LBrace)));
    assert_eq!(lexer.next(), Some(Ok(Token::RBrace)));
    assert_eq!(lexer.next(), Some(Ok(Token::AtBrace)));
    assert_eq!(lexer.next(), Some(Ok(Token::Arrow)));
    assert_eq!(lexer.next(), Some(Ok(Token::Equals)));
    assert_eq!(lexer.next(), Some(Ok(Token::Semicolon)));
    assert_eq!(lexer.next(), Some(Ok(Token::Comma)));
    assert_eq!(lexer.next(), Some(Ok(Token::Dot)));
    assert_eq!(lexer.next(), None);
}

#[test]
fn test_identifiers() {
    let mut lexer = Token::lexer("pair eq0 * + ?x a/b _tmp");
    for expected in ["pair", "eq0", "*", "+", "?x", "a/b", "_tmp"] {
        assert_eq!(lexer.next(), Some(Ok(Token::Identifier)));
        assert_eq!(lexer.slice(), expected);
    }
    assert_eq!(lexer.next(), None);
}

#[test]
fn test_integer_then_field() {
    // "2.x" is a field load from a number, never a float
    let mut lexer = Token::lexer("2.x");
    assert_eq!(lexer.next(), Some(Ok(Token::Integer)));
    assert_eq!(lexer.next(), Some(Ok(Token::Dot)));
    assert_eq!(lexer.next(), Some(Ok(Token::Identifier)));
}

#[test]
fn test_comments_skipped() {
    let mut lexer = Token::lexer("// leading\n(dec 3) // trailing");
    assert_eq!(lexer.next(), Some(Ok(Token::LParen)));
    assert_eq!(lexer.next(), Some(Ok(Token::Identifier)));
    assert_eq!(lexer.next(), Some(Ok(Token::Integer)));
    assert_eq!(lexer.next(), Some(Ok(Token::RParen)));
    assert_eq!(lexer.next(), None);
}

#[test]
fn test_unknown_character() {
    let mut lexer = Token::lexer("#");
    assert_eq!(lexer.next(), Some(Err(())));
}

#[test]
fn test_starts_term() {
    assert!(Token::Identifier.starts_term());
    assert!(Token::AtBrace.starts_term());
    assert!(!Token::RParen.starts_term());
    assert!(!Token::Arrow.starts_term());
}
