//! Splits expression text into number, operator and parenthesis tokens.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::tasks::Operation;

/// Anchored at the start of the remaining input: a decimal number
/// (`12`, `1.5`, `3.`, `.5`) or a single operator/parenthesis.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+(?:\.\d*)?|\.\d+)|([-+*/()]))").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Operator(Operation),
    LeftParen,
    RightParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Operator(op) => write!(f, "{op}"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
        }
    }
}

/// Tokenize `input` after stripping all whitespace.
///
/// A `+` or `-` directly followed by a number is folded into a signed number
/// when it appears where an operand is expected: at the start, after an
/// operator, or after `(`. Elsewhere it is a binary operator, so `2-3`
/// stays a subtraction.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let normalized: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if normalized.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < normalized.len() {
        let rest = &normalized[pos..];
        let Some(caps) = TOKEN.captures(rest) else {
            return Err(ParseError::UnexpectedCharacter {
                ch: rest.chars().next().unwrap_or_default(),
                position: normalized[..pos].chars().count(),
            });
        };

        if let Some(number) = caps.get(1) {
            tokens.push(Token::Number(parse_number(number.as_str())?));
            pos += number.len();
            continue;
        }

        pos += 1;
        let token = match rest.as_bytes()[0] {
            b'(' => Token::LeftParen,
            b')' => Token::RightParen,
            symbol => {
                let operation = Operation::from_symbol(symbol as char).ok_or(
                    ParseError::UnexpectedCharacter {
                        ch: symbol as char,
                        position: normalized[..pos - 1].chars().count(),
                    },
                )?;

                let signed = matches!(operation, Operation::Add | Operation::Subtract)
                    && expects_operand(tokens.last());
                let number = signed
                    .then(|| TOKEN.captures(&rest[1..]).and_then(|c| c.get(1)))
                    .flatten();

                match number {
                    Some(number) => {
                        let value = parse_number(number.as_str())?;
                        pos += number.len();
                        if operation == Operation::Subtract {
                            Token::Number(-value)
                        } else {
                            Token::Number(value)
                        }
                    }
                    None => Token::Operator(operation),
                }
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

fn expects_operand(previous: Option<&Token>) -> bool {
    matches!(
        previous,
        None | Some(Token::Operator(_)) | Some(Token::LeftParen)
    )
}

fn parse_number(text: &str) -> Result<f64, ParseError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber(text.to_string()))
}
