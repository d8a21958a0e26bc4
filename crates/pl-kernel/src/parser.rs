//! Parser for pipeline expressions.
//!
//! Transforms a token stream from the lexer into a [`Pipeline`] AST.
//! Uses chumsky for parser combinators.
//!
//! ```text
//! pipeline  := "(" ( call ( "|" call )* )? ")"
//! call      := IDENT argument*
//! argument  := STRING | FLOAT | INT | reference | pipeline
//! reference := "$" key+
//! key       := "." ( IDENT | STRING )
//!            | "[" ( IDENT | STRING | INT ) "]"
//! ```

use crate::ast::{Argument, Call, Key, Pipeline, Reference};
use crate::lexer::{self, Token};
use chumsky::{input::ValueInput, prelude::*};

/// Span type used throughout the parser.
pub type Span = SimpleSpan;

/// Parse error with location and context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {:?}", self.message, self.span)
    }
}

impl std::error::Error for ParseError {}

/// Deepest pipeline nesting [`parse`] accepts; a flat pipeline has depth 0.
///
/// The parser recurses once per level, so input past this bound is rejected
/// before any parsing happens.
pub const MAX_NESTING: usize = 128;

/// Parse a pipeline expression such as `(sum 1 2 | printf "%d")`.
///
/// The whole input must be exactly one pipeline; trailing tokens are an error.
/// Pipelines nested deeper than [`MAX_NESTING`] are rejected.
#[tracing::instrument(level = "trace", skip(source), fields(len = source.len()))]
pub fn parse(source: &str) -> Result<Pipeline, Vec<ParseError>> {
    let tokens = lex(source)?;
    check_nesting(&tokens, MAX_NESTING)?;
    let end_span: Span = (source.len()..source.len()).into();

    let parser = pipeline_parser().then_ignore(end());
    let result = parser.parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)));
    result.into_result().map_err(convert_errors)
}

/// Parse a standalone reference such as `$.a[0].b`.
///
/// Hosts use this to address context slots outside of a pipeline.
pub fn parse_reference(source: &str) -> Result<Reference, Vec<ParseError>> {
    let tokens = lex(source)?;
    let end_span: Span = (source.len()..source.len()).into();

    let parser = reference_parser().then_ignore(end());
    let result = parser.parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)));
    result.into_result().map_err(convert_errors)
}

fn lex(source: &str) -> Result<Vec<(Token, Span)>, Vec<ParseError>> {
    let tokens = lexer::tokenize(source).map_err(|errs| {
        errs.into_iter()
            .map(|e| ParseError {
                span: (e.span.start..e.span.end).into(),
                message: format!("lexer error: {}", e.token),
            })
            .collect::<Vec<_>>()
    })?;

    Ok(tokens
        .into_iter()
        .map(|spanned| (spanned.token, (spanned.span.start..spanned.span.end).into()))
        .collect())
}

/// Reject the first `(` that opens a pipeline nested deeper than `limit`.
fn check_nesting(tokens: &[(Token, Span)], limit: usize) -> Result<(), Vec<ParseError>> {
    let mut open = 0usize;
    for (token, span) in tokens {
        match token {
            Token::LParen => {
                // The outermost pipeline is depth 0.
                if open > limit {
                    return Err(vec![ParseError {
                        span: *span,
                        message: format!("pipelines nest deeper than {limit} levels"),
                    }]);
                }
                open += 1;
            }
            Token::RParen => open = open.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn convert_errors(errs: Vec<Rich<'_, Token, Span>>) -> Vec<ParseError> {
    errs.into_iter()
        .map(|e| ParseError {
            span: *e.span(),
            message: e.to_string(),
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// A parenthesized pipeline; recursive through nested-pipeline arguments.
fn pipeline_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Pipeline, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(|pipeline| {
        let argument = choice((
            literal_parser(),
            reference_parser().map(Argument::Reference),
            pipeline.map(Argument::Nested),
        ))
        .labelled("argument");

        let call = ident_parser()
            .then(argument.repeated().collect::<Vec<_>>())
            .map(|(name, args)| Call { name, args })
            .labelled("call");

        call.separated_by(just(Token::Pipe))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|calls| Pipeline { calls })
            .labelled("pipeline")
    })
    .boxed()
}

/// `$` followed by at least one key.
fn reference_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Reference, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    just(Token::Dollar)
        .ignore_then(key_parser().repeated().at_least(1).collect::<Vec<_>>())
        .map(|keys| Reference { keys })
        .labelled("reference")
}

/// `.name`, `."name"`, `[name]`, `["name"]` or `[0]`.
fn key_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Key, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let dotted = just(Token::Dot).ignore_then(key_name_parser()).map(Key::Name);

    let bracketed = choice((
        key_name_parser().map(Key::Name),
        select! { Token::Int(n) => Key::Index(n) },
    ))
    .delimited_by(just(Token::LBracket), just(Token::RBracket));

    choice((dotted, bracketed)).labelled("key")
}

fn key_name_parser<'tokens, I>(
) -> impl Parser<'tokens, I, String, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Ident(s) => s,
        Token::String(s) => s,
    }
    .labelled("key name")
}

fn literal_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Argument, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::String(s) => Argument::String(s),
        Token::Float(f) => Argument::Float(f),
        Token::Int(n) => Argument::Int(n),
    }
    .labelled("literal")
}

/// Identifier parser.
fn ident_parser<'tokens, I>(
) -> impl Parser<'tokens, I, String, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Ident(s) => s,
    }
    .labelled("identifier")
}
