//! Tokenizer for CQL filter text.

use winnow::ascii::{Caseless, digit1, multispace0};
use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::validators::WKT_KEYWORDS;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Identifiers and values
    Ident(String),
    Number(String), // kept as written
    Str(String),    // quotes removed, '' unescaped
    Geometry(String),

    // Comparison operators
    Eq, // =
    Ne, // <>
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Keywords
    And,
    Or,
    Not,
    Like,
    Between,
    Is,
    Null,

    // Punctuation
    LParen,
    RParen,
    Comma,

    Eof,
}

type PResult<T> = Result<T, ErrMode<ContextError>>;

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::default())
}

/// `'it''s'` lexes to `it's`.
fn lex_string(input: &mut &str) -> PResult<Token> {
    '\''.parse_next(input)?;
    let mut value = String::new();
    loop {
        let chunk = take_while(0.., |c: char| c != '\'').parse_next(input)?;
        value.push_str(chunk);
        '\''.parse_next(input)?;
        if opt('\'').parse_next(input)?.is_some() {
            value.push('\'');
        } else {
            break;
        }
    }
    Ok(Token::Str(value))
}

fn lex_number(input: &mut &str) -> PResult<Token> {
    let text = (
        opt('-'),
        digit1,
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input)?;
    Ok(Token::Number(text.to_string()))
}

/// A parenthesised run with balanced nesting, parens included.
fn balanced_parens<'i>(input: &mut &'i str) -> PResult<&'i str> {
    let text = *input;
    if !text.starts_with('(') {
        return Err(backtrack());
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let (body, rest) = text.split_at(i + 1);
                    *input = rest;
                    return Ok(body);
                }
            }
            _ => {}
        }
    }
    Err(backtrack())
}

fn geometry_body<'i>(input: &mut &'i str) -> PResult<&'i str> {
    (multispace0, alt((balanced_parens, Caseless("EMPTY"))))
        .take()
        .parse_next(input)
}

/// Identifiers, keywords, and WKT geometries (a geometry keyword followed by
/// its coordinate text).
fn lex_word(input: &mut &str) -> PResult<Token> {
    let word = (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '-' | '/' | '@')
        }),
    )
        .take()
        .parse_next(input)?;

    let upper = word.to_ascii_uppercase();
    let token = match upper.as_str() {
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        "LIKE" => Token::Like,
        "BETWEEN" => Token::Between,
        "IS" => Token::Is,
        "NULL" => Token::Null,
        keyword if WKT_KEYWORDS.contains(&keyword) => match opt(geometry_body).parse_next(input)? {
            Some(body) => Token::Geometry(format!("{word}{body}")),
            None => Token::Ident(word.to_string()),
        },
        _ => Token::Ident(word.to_string()),
    };
    Ok(token)
}

fn lex_token(input: &mut &str) -> PResult<Token> {
    multispace0.parse_next(input)?;

    if input.is_empty() {
        return Ok(Token::Eof);
    }

    alt((
        // Multi-char operators first
        "<>".value(Token::Ne),
        "!=".value(Token::Ne),
        "<=".value(Token::Le),
        ">=".value(Token::Ge),
        "=".value(Token::Eq),
        "<".value(Token::Lt),
        ">".value(Token::Gt),
        "(".value(Token::LParen),
        ")".value(Token::RParen),
        ",".value(Token::Comma),
        lex_string,
        lex_number,
        lex_word,
    ))
    .parse_next(input)
}

/// Tokenize the entire input; the last token is always `Eof`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut remaining = input;
    let mut tokens = Vec::new();

    loop {
        match lex_token(&mut remaining) {
            Ok(Token::Eof) => break,
            Ok(tok) => tokens.push(tok),
            Err(_) => return Err(format!("unexpected input at {remaining:?}")),
        }
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}
