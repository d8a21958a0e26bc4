//! Lexer for pipeline expressions.
//!
//! Converts source text into a stream of tokens using the logos lexer generator.
//! Every valid input produces exactly one token sequence; malformed numbers and
//! strings produce targeted errors instead of falling through to a generic one.
//!
//! # Token Categories
//!
//! - **Literals**: double-quoted strings, backtick raw strings, integers, floats
//! - **Punctuation**: `(`, `)`, `|`, `$`, `.`, `[`, `]`
//! - **Identifiers**: function names and reference keys

use logos::{Logos, Span};
use std::fmt;

/// A token with its span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Span) -> Self {
        Self { token, span }
    }
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexerError {
    #[default]
    UnexpectedCharacter,
    UnterminatedString,
    InvalidEscape,
    InvalidNumber,
    InvalidNumberIdent(String),
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexerError::UnexpectedCharacter => write!(f, "unexpected character"),
            LexerError::UnterminatedString => write!(f, "unterminated string"),
            LexerError::InvalidEscape => write!(f, "invalid escape sequence"),
            LexerError::InvalidNumber => write!(f, "invalid number"),
            LexerError::InvalidNumberIdent(s) => {
                write!(f, "identifier cannot start with digit: {}", s)
            }
        }
    }
}

/// Tokens of the pipeline expression language.
///
/// Tokens that carry semantic values (strings, numbers, identifiers) include
/// the parsed value directly, so the parser never re-reads source text.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexerError)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("|")]
    Pipe,

    /// Reference sigil: `$` followed by one or more keys
    #[token("$")]
    Dollar,

    #[token(".")]
    Dot,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    /// Double-quoted string with escapes processed, or backtick raw string
    #[regex(r#""([^"\\\n]|\\.)*""#, lex_string)]
    #[regex(r"`[^`]*`", lex_raw_string)]
    String(String),

    /// Integer literal: decimal, `0x`/`0o`/`0b` prefixed, or octal with a leading `0`
    #[regex(r"-?[0-9][0-9_]*", lex_int, priority = 2)]
    #[regex(r"-?0[xX][0-9a-fA-F_]+", lex_int, priority = 4)]
    #[regex(r"-?0[oO][0-7_]+", lex_int, priority = 4)]
    #[regex(r"-?0[bB][01_]+", lex_int, priority = 4)]
    Int(i64),

    /// Float literal: `1.5`, `5.`, `.5`, each with an optional exponent, or `1e3`
    #[regex(r"-?[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", lex_float)]
    #[regex(r"-?\.[0-9]+([eE][+-]?[0-9]+)?", lex_float)]
    #[regex(r"-?[0-9]+[eE][+-]?[0-9]+", lex_float, priority = 4)]
    Float(f64),

    /// Invalid: number followed by identifier characters (like 123abc)
    #[regex(r"-?[0-9][0-9_]*[a-zA-Z][a-zA-Z0-9_]*", lex_invalid_number_ident, priority = 3)]
    InvalidNumberIdent,

    /// Identifier: function names and bare keys
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", lex_ident)]
    Ident(String),
}

fn lex_string(lex: &mut logos::Lexer<Token>) -> Result<String, LexerError> {
    parse_string_literal(lex.slice())
}

/// Lex a backtick raw string (no escape processing).
fn lex_raw_string(lex: &mut logos::Lexer<Token>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

fn lex_int(lex: &mut logos::Lexer<Token>) -> Result<i64, LexerError> {
    parse_int_literal(lex.slice())
}

fn lex_float(lex: &mut logos::Lexer<Token>) -> Result<f64, LexerError> {
    lex.slice().parse().map_err(|_| LexerError::InvalidNumber)
}

/// Always returns Err to produce a lexer error instead of a token.
fn lex_invalid_number_ident(lex: &mut logos::Lexer<Token>) -> Result<(), LexerError> {
    Err(LexerError::InvalidNumberIdent(lex.slice().to_string()))
}

fn lex_ident(lex: &mut logos::Lexer<Token>) -> String {
    lex.slice().to_string()
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Pipe => write!(f, "|"),
            Token::Dollar => write!(f, "$"),
            Token::Dot => write!(f, "."),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::String(s) => write!(f, "{s:?}"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::InvalidNumberIdent => write!(f, "<invalid number>"),
        }
    }
}

/// Tokenize source code into a vector of spanned tokens.
///
/// Skips whitespace, including newlines: an expression may span lines.
/// Returns every error with its position so the caller can report them all.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, Vec<Spanned<LexerError>>> {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, span) in lexer.spanned() {
        match result {
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(err) => errors.push(Spanned::new(err, span)),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Parse an integer literal the way Go reads it: `0x`, `0o` and `0b` select
/// the radix, a leading `0` means octal, and `_` may separate digits.
pub fn parse_int_literal(source: &str) -> Result<i64, LexerError> {
    let (sign, unsigned) = match source.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", source),
    };
    let (radix, digits) = match unsigned.as_bytes() {
        [b'0', b'x' | b'X', ..] => (16, &unsigned[2..]),
        [b'0', b'o' | b'O', ..] => (8, &unsigned[2..]),
        [b'0', b'b' | b'B', ..] => (2, &unsigned[2..]),
        [b'0', _, ..] => (8, &unsigned[1..]),
        _ => (10, unsigned),
    };
    if digits.ends_with('_') || digits.contains("__") {
        return Err(LexerError::InvalidNumber);
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() {
        return Err(LexerError::InvalidNumber);
    }
    i64::from_str_radix(&format!("{sign}{cleaned}"), radix).map_err(|_| LexerError::InvalidNumber)
}

/// Extract the string content from a string token (removes quotes, processes escapes).
///
/// Escapes are Go's: `\a \b \f \n \r \t \v \\ \"`, `\xHH` and `\ooo` for single
/// bytes, `\uXXXX` and `\UXXXXXXXX` for code points. The decoded bytes must form
/// valid UTF-8.
pub fn parse_string_literal(source: &str) -> Result<String, LexerError> {
    if source.len() < 2 || !source.starts_with('"') || !source.ends_with('"') {
        return Err(LexerError::UnterminatedString);
    }

    let inner = &source[1..source.len() - 1];
    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            push_char(&mut bytes, ch);
            continue;
        }
        match chars.next().ok_or(LexerError::InvalidEscape)? {
            'a' => bytes.push(0x07),
            'b' => bytes.push(0x08),
            'f' => bytes.push(0x0c),
            'n' => bytes.push(b'\n'),
            'r' => bytes.push(b'\r'),
            't' => bytes.push(b'\t'),
            'v' => bytes.push(0x0b),
            '\\' => bytes.push(b'\\'),
            '"' => bytes.push(b'"'),
            'x' => bytes.push(byte_escape(escape_digits(&mut chars, 2, 16)?)?),
            first @ '0'..='7' => {
                let high = first as u32 - '0' as u32;
                let value = high * 64 + escape_digits(&mut chars, 2, 8)?;
                bytes.push(byte_escape(value)?);
            }
            'u' => push_char(&mut bytes, code_point(escape_digits(&mut chars, 4, 16)?)?),
            'U' => push_char(&mut bytes, code_point(escape_digits(&mut chars, 8, 16)?)?),
            _ => return Err(LexerError::InvalidEscape),
        }
    }

    String::from_utf8(bytes).map_err(|_| LexerError::InvalidEscape)
}

fn push_char(bytes: &mut Vec<u8>, ch: char) {
    bytes.extend_from_slice(ch.encode_utf8(&mut [0; 4]).as_bytes());
}

/// Read exactly `count` digits of `radix`.
fn escape_digits(chars: &mut std::str::Chars<'_>, count: usize, radix: u32) -> Result<u32, LexerError> {
    let mut value = 0u32;
    for _ in 0..count {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(radix))
            .ok_or(LexerError::InvalidEscape)?;
        value = value * radix + digit;
    }
    Ok(value)
}

fn byte_escape(value: u32) -> Result<u8, LexerError> {
    u8::try_from(value).map_err(|_| LexerError::InvalidEscape)
}

fn code_point(value: u32) -> Result<char, LexerError> {
    char::from_u32(value).ok_or(LexerError::InvalidEscape)
}
