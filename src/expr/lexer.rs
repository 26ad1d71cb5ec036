//! Tokenizer for lambda expressions.
//!
//! Uses the logos lexer generator. Literal tokens carry their parsed value
//! so the parser never re-reads source text.

use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

use super::Diagnostic;

/// Byte range of a token in the expression text.
pub type Span = Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[token("new")]
    New,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[token("=>")]
    Arrow,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("??")]
    Coalesce,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("=")]
    Assign,

    #[token("!")]
    Bang,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("?")]
    Question,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    /// Decimal, exponent or suffixed (`2.5`, `1e3`, `4m`) number.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?[mMdDfF]?", lex_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[mMdDfF]?", lex_float)]
    #[regex(r"[0-9]+[mMdDfF]", lex_float)]
    Float(f64),

    /// Integer literal; `L` suffix allowed.
    #[regex(r"[0-9]+[lL]?", lex_int)]
    Int(i64),

    /// Double- or single-quoted string, escapes processed.
    #[regex(r#""([^"\\]|\\.)*""#, lex_string)]
    #[regex(r"'([^'\\]|\\.)*'", lex_string)]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn lex_float(lex: &mut Lexer<'_, Token>) -> Option<f64> {
    let text = lex.slice().trim_end_matches(['m', 'M', 'd', 'D', 'f', 'F']);
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn lex_int(lex: &mut Lexer<'_, Token>) -> Option<i64> {
    lex.slice().trim_end_matches(['l', 'L']).parse().ok()
}

fn lex_string(lex: &mut Lexer<'_, Token>) -> Option<String> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            _ => return None,
        }
    }
    Some(out)
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::New => f.write_str("new"),
            Token::True => f.write_str("true"),
            Token::False => f.write_str("false"),
            Token::Null => f.write_str("null"),
            Token::Arrow => f.write_str("=>"),
            Token::EqEq => f.write_str("=="),
            Token::NotEq => f.write_str("!="),
            Token::LtEq => f.write_str("<="),
            Token::GtEq => f.write_str(">="),
            Token::AndAnd => f.write_str("&&"),
            Token::OrOr => f.write_str("||"),
            Token::Coalesce => f.write_str("??"),
            Token::Lt => f.write_str("<"),
            Token::Gt => f.write_str(">"),
            Token::Assign => f.write_str("="),
            Token::Bang => f.write_str("!"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::Question => f.write_str("?"),
            Token::Colon => f.write_str(":"),
            Token::Comma => f.write_str(","),
            Token::Dot => f.write_str("."),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::LBrace => f.write_str("{"),
            Token::RBrace => f.write_str("}"),
            Token::Float(x) => write!(f, "{x}"),
            Token::Int(i) => write!(f, "{i}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Ident(name) => f.write_str(name),
        }
    }
}

/// Tokenize expression text.
///
/// Every unrecognised character becomes a diagnostic; tokenizing continues
/// past errors so all of them are reported together.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, Vec<Diagnostic>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let text = &source[span.clone()];
                let message = if text.starts_with('"') || text.starts_with('\'') {
                    format!("invalid string literal {text}")
                } else if text.starts_with(|c: char| c.is_ascii_digit()) {
                    format!("invalid numeric literal '{text}'")
                } else {
                    format!("unexpected character '{text}'")
                };
                errors.push(Diagnostic::new(span.start, message));
            }
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_lambda_tokens() {
        assert_eq!(
            kinds("x => (int)x > 10"),
            vec![
                Token::Ident("x".into()),
                Token::Arrow,
                Token::LParen,
                Token::Ident("int".into()),
                Token::RParen,
                Token::Ident("x".into()),
                Token::Gt,
                Token::Int(10),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("2.5"), vec![Token::Float(2.5)]);
        assert_eq!(kinds("4m"), vec![Token::Float(4.0)]);
        assert_eq!(kinds("1e3"), vec![Token::Float(1000.0)]);
        assert_eq!(kinds("7L"), vec![Token::Int(7)]);
    }

    #[test]
    fn test_member_access_is_not_float() {
        assert_eq!(
            kinds("x.Key"),
            vec![
                Token::Ident("x".into()),
                Token::Dot,
                Token::Ident("Key".into())
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(kinds(r#""a\"b""#), vec![Token::Str("a\"b".into())]);
        assert_eq!(kinds("'hi'"), vec![Token::Str("hi".into())]);
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        assert_eq!(kinds("new"), vec![Token::New]);
        assert_eq!(kinds("newer"), vec![Token::Ident("newer".into())]);
    }

    #[test]
    fn test_unexpected_character_reports_column() {
        let errors = tokenize("x => x # 2").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].column, 8);
        assert!(errors[0].message.contains('#'));
    }
}
