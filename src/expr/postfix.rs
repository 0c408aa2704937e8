//! Infix to postfix conversion (shunting-yard).

use super::tokenizer::Token;
use crate::error::ParseError;

/// Reorder infix tokens into postfix order.
///
/// `*` and `/` bind tighter than `+` and `-`; all four are left-associative,
/// so an incoming operator pops every stacked operator of equal or higher
/// precedence before being pushed.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, ParseError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for &token in tokens {
        match token {
            Token::Number(_) => output.push(token),
            Token::LeftParen => stack.push(token),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(Token::LeftParen) => break,
                    Some(op) => output.push(op),
                    None => return Err(ParseError::MismatchedParentheses),
                }
            },
            Token::Operator(incoming) => {
                while let Some(&Token::Operator(top)) = stack.last() {
                    if incoming.precedence() > top.precedence() {
                        break;
                    }
                    output.push(Token::Operator(top));
                    stack.pop();
                }
                stack.push(token);
            }
        }
    }

    while let Some(token) = stack.pop() {
        if token == Token::LeftParen {
            return Err(ParseError::MismatchedParentheses);
        }
        output.push(token);
    }

    Ok(output)
}
