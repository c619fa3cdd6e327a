//! Recursive descent parser
//!
//! ```text
//! program := fterm EOF
//! fterm   := term ("." field)*
//! field   := id | digits
//! term    := number | string
//!          | "(" fterm fterm* ")"
//!          | "{" id+ "->" fterm "}"
//!          | id "=" fterm ";" fterm
//!          | id
//!          | "@{" (id "=" fterm ","?)* "}"
//! ```

use crate::ast::{Expr, Literal};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, SpannedToken};
use crate::span::Span;
use crate::token::Token;

/// Program parser
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Current token (peeked)
    current: Option<SpannedToken<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            current: None,
        }
    }

    /// Parse a whole program; trailing input is an error.
    pub fn parse_program(mut self) -> ParseResult<Expr> {
        self.advance()?;
        let program = self.parse_fterm()?;
        if let Some(junk) = &self.current {
            let rest = self.lexer.source()[junk.span.start..].trim_end().to_string();
            let span = self.lexer.source_map().span(junk.span.start, self.lexer.source().len());
            return Err(ParseError::TrailingInput { rest, span });
        }
        Ok(program)
    }

    // ==================== Token Management ====================

    /// Advance to the next token, returning the previous one.
    fn advance(&mut self) -> ParseResult<Option<SpannedToken<'a>>> {
        let prev = self.current.take();
        self.current = self.lexer.next_token().transpose()?;
        Ok(prev)
    }

    fn check(&self, expected: Token) -> bool {
        self.current.as_ref().is_some_and(|t| t.token == expected)
    }

    fn error_here(&self, expected: &str) -> ParseError {
        match &self.current {
            Some(t) => ParseError::unexpected_token(t.text, expected, t.span),
            None => ParseError::unexpected_eof(expected, self.lexer.eof_span()),
        }
    }

    /// Consume current token if it matches, return error otherwise
    fn expect(&mut self, expected: Token) -> ParseResult<SpannedToken<'a>> {
        if !self.check(expected) {
            return Err(self.error_here(expected.describe()));
        }
        match self.advance()? {
            Some(token) => Ok(token),
            None => Err(self.error_here(expected.describe())),
        }
    }

    fn expect_ident(&mut self) -> ParseResult<(String, Span)> {
        let token = self.expect(Token::Identifier)?;
        Ok((token.text.to_string(), token.span))
    }

    // ==================== Grammar ====================

    fn parse_fterm(&mut self) -> ParseResult<Expr> {
        let mut term = self.parse_term()?;
        while self.check(Token::Dot) {
            self.advance()?;
            for (name, span) in self.field_names()? {
                let span = term.span().to(&span);
                term = Expr::Field {
                    rec: Box::new(term),
                    name,
                    span,
                };
            }
        }
        Ok(term)
    }

    /// Field names after a `.`. Tuple fields are digit runs, and the lexer
    /// reads `p.0.1` as `p`, `.`, `0.1`, so a float splits into two loads.
    fn field_names(&mut self) -> ParseResult<Vec<(String, Span)>> {
        let Some(token) = self.current.clone() else {
            return Err(self.error_here("a field name"));
        };
        match token.token {
            Token::Identifier | Token::Integer => {
                self.advance()?;
                Ok(vec![(token.text.to_string(), token.span)])
            }
            Token::Float => {
                self.advance()?;
                let Some(dot) = token.text.find('.') else {
                    return Err(ParseError::unexpected_token(token.text, "a field name", token.span));
                };
                let (start, end) = (token.span.start, token.span.end);
                let map = self.lexer.source_map();
                Ok(vec![
                    (token.text[..dot].to_string(), map.span(start, start + dot)),
                    (token.text[dot + 1..].to_string(), map.span(start + dot + 1, end)),
                ])
            }
            _ => Err(self.error_here("a field name")),
        }
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let Some(token) = self.current.clone() else {
            return Err(self.error_here("a term"));
        };
        match token.token {
            Token::Integer => {
                self.advance()?;
                parse_integer(token.text, token.span)
            }
            Token::Float => {
                self.advance()?;
                let value = token.text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    literal: token.text.to_string(),
                    span: token.span,
                })?;
                Ok(Expr::Lit {
                    value: Literal::Float(value),
                    span: token.span,
                })
            }
            Token::Str => {
                self.advance()?;
                let body = &token.text[1..token.text.len() - 1];
                Ok(Expr::Lit {
                    value: Literal::Str(body.to_string()),
                    span: token.span,
                })
            }
            Token::LParen => self.parse_apply(),
            Token::LBrace => self.parse_lambda(),
            Token::AtBrace => self.parse_struct(),
            Token::Identifier => self.parse_ident_or_let(),
            _ => Err(self.error_here("a term")),
        }
    }

    fn parse_apply(&mut self) -> ParseResult<Expr> {
        let open = self.expect(Token::LParen)?;
        let fun = self.parse_fterm()?;
        let mut args = Vec::new();
        while self.current.as_ref().is_some_and(|t| t.token.starts_term()) {
            args.push(self.parse_fterm()?);
        }
        let close = self.expect(Token::RParen)?;
        Ok(Expr::Apply {
            fun: Box::new(fun),
            args,
            span: open.span.to(&close.span),
        })
    }

    fn parse_lambda(&mut self) -> ParseResult<Expr> {
        let open = self.expect(Token::LBrace)?;
        let mut params = Vec::new();
        while self.check(Token::Identifier) {
            params.push(self.expect_ident()?.0);
        }
        if params.is_empty() {
            return Err(self.error_here("a parameter"));
        }
        self.expect(Token::Arrow)?;
        let body = self.parse_fterm()?;
        let close = self.expect(Token::RBrace)?;
        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
            span: open.span.to(&close.span),
        })
    }

    fn parse_ident_or_let(&mut self) -> ParseResult<Expr> {
        let (name, span) = self.expect_ident()?;
        if !self.check(Token::Equals) {
            return Ok(Expr::Ident { name, span });
        }
        self.advance()?;
        let def = self.parse_fterm()?;
        self.expect(Token::Semicolon)?;
        let body = self.parse_fterm()?;
        let span = span.to(&body.span());
        Ok(Expr::Let {
            name,
            def: Box::new(def),
            body: Box::new(body),
            span,
        })
    }

    fn parse_struct(&mut self) -> ParseResult<Expr> {
        let open = self.expect(Token::AtBrace)?;
        let mut fields = Vec::new();
        while self.check(Token::Identifier) {
            let (name, _) = self.expect_ident()?;
            self.expect(Token::Equals)?;
            let value = self.parse_fterm()?;
            fields.push((name, value));
            if self.check(Token::Comma) {
                self.advance()?;
            }
        }
        let close = self.expect(Token::RBrace)?;
        Ok(Expr::Struct {
            fields,
            span: open.span.to(&close.span),
        })
    }

    #[cfg(test)]
    fn current_token(&self) -> Option<Token> {
        self.current.as_ref().map(|t| t.token)
    }
}

/// `0` is the nil literal; every other digit run is an `i64`.
fn parse_integer(text: &str, span: Span) -> ParseResult<Expr> {
    if text == "0" {
        return Ok(Expr::Lit {
            value: Literal::Nil,
            span,
        });
    }
    let value = text.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
        literal: text.to_string(),
        span,
    })?;
    Ok(Expr::Lit {
        value: Literal::Int(value),
        span,
    })
}

/// Parse a complete program.
pub fn parse(source: &str) -> ParseResult<Expr> {
    Parser::new(source).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_starts_before_first_token() {
        let mut parser = Parser::new("(dec 1)");
        assert_eq!(parser.current_token(), None);
        assert!(parser.advance().is_ok());
        assert_eq!(parser.current_token(), Some(Token::LParen));
    }

    #[test]
    fn test_integer_overflow() {
        let err = parse("99999999999999999999").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn test_float_after_dot_splits_into_two_fields() {
        let expr = parse("p.0.1").unwrap();
        let Expr::Field { rec, name, span } = expr else {
            panic!("expected field load");
        };
        assert_eq!(name, "1");
        assert_eq!((span.start, span.end), (0, 5));
        let Expr::Field { name, span, .. } = *rec else {
            panic!("expected inner field load");
        };
        assert_eq!(name, "0");
        assert_eq!((span.start, span.end, span.column), (0, 3, 1));
    }
}
