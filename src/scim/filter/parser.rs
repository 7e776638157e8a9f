//! Recursive-descent filter parser
//!
//! ```text
//! Or      := And ("or" And)*
//! And     := Unary ("and" Unary)*
//! Unary   := "not" Unary | Primary
//! Primary := "(" Or ")" | AttrPath "pr" | AttrPath Operator Literal
//! Literal := quoted-string | number | "true" | "false" | "null"
//! ```

use super::ast::{FilterNode, Operator};
use super::lexer::{Token, tokenize};
use crate::error::{ScimError, ScimResult};
use crate::scim::path::AttributePath;
use serde_json::{Number, Value};
use std::iter::Peekable;
use std::vec::IntoIter;
use tracing::trace;

/// Maximum nesting of parentheses and `not` before the parser gives up
pub const MAX_NESTING_DEPTH: usize = 32;

/// Parse a filter expression into a [`FilterNode`] tree.
pub fn parse(filter: &str) -> ScimResult<FilterNode> {
    let filter = filter.trim();
    if filter.is_empty() {
        return Err(ScimError::FilterSyntax("empty filter".into()));
    }

    let tokens = tokenize(filter)?;
    trace!(count = tokens.len(), "Tokenized filter");

    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
        depth: 0,
    };
    let node = parser.parse_or()?;

    match parser.tokens.next() {
        None => Ok(node),
        Some(Token::RParen) => Err(ScimError::FilterSyntax(
            "unbalanced parentheses: unexpected ')'".into(),
        )),
        Some(token) => Err(ScimError::FilterSyntax(format!(
            "unexpected trailing token {}",
            describe(&token)
        ))),
    }
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    depth: usize,
}

impl Parser {
    fn parse_or(&mut self) -> ScimResult<FilterNode> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = FilterNode::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ScimResult<FilterNode> {
        let mut left = self.parse_unary()?;
        while self.eat_keyword("and") {
            let right = self.parse_unary()?;
            left = FilterNode::and(left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ScimResult<FilterNode> {
        if self.eat_keyword("not") {
            self.descend()?;
            let child = self.parse_unary()?;
            self.depth -= 1;
            return Ok(FilterNode::not(child));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ScimResult<FilterNode> {
        match self.tokens.next() {
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.tokens.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(ScimError::FilterSyntax(format!(
                        "expected ')' but found {}",
                        describe(&token)
                    ))),
                    None => Err(ScimError::FilterSyntax(
                        "unbalanced parentheses: missing ')'".into(),
                    )),
                }
            }
            Some(Token::Word(attribute)) => self.parse_condition(attribute),
            Some(token) => Err(ScimError::FilterSyntax(format!(
                "expected attribute but found {}",
                describe(&token)
            ))),
            None => Err(ScimError::FilterSyntax(
                "unexpected end of filter, expected attribute".into(),
            )),
        }
    }

    fn parse_condition(&mut self, attribute: String) -> ScimResult<FilterNode> {
        let path = AttributePath::allowed(&attribute)
            .ok_or_else(|| ScimError::UnsupportedAttribute(attribute.clone()))?;

        let op = match self.tokens.next() {
            Some(Token::Word(word)) => {
                Operator::parse(&word).ok_or(ScimError::UnsupportedOperator(word))?
            }
            Some(token) => {
                return Err(ScimError::FilterSyntax(format!(
                    "expected operator after '{attribute}' but found {}",
                    describe(&token)
                )));
            }
            None => {
                return Err(ScimError::FilterSyntax(format!(
                    "missing operator after '{attribute}'"
                )));
            }
        };

        if op == Operator::Pr {
            return Ok(FilterNode::Presence { path });
        }

        let value = match self.tokens.next() {
            Some(Token::Str(text)) => Value::String(text),
            Some(Token::Word(word)) => parse_literal(&word)?,
            Some(token) => {
                return Err(ScimError::FilterSyntax(format!(
                    "expected value after '{attribute} {op}' but found {}",
                    describe(&token)
                )));
            }
            None => {
                return Err(ScimError::FilterSyntax(format!(
                    "missing value after '{attribute} {op}'"
                )));
            }
        };

        Ok(FilterNode::Comparison { path, op, value })
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let matched = matches!(
            self.tokens.peek(),
            Some(Token::Word(word)) if word.eq_ignore_ascii_case(keyword)
        );
        if matched {
            self.tokens.next();
        }
        matched
    }

    fn descend(&mut self) -> ScimResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ScimError::FilterSyntax(format!(
                "filter nesting exceeds maximum depth of {MAX_NESTING_DEPTH}"
            )));
        }
        Ok(())
    }
}

/// Unquoted literal: boolean, null or number
fn parse_literal(word: &str) -> ScimResult<Value> {
    if word.eq_ignore_ascii_case("true") {
        return Ok(Value::Bool(true));
    }
    if word.eq_ignore_ascii_case("false") {
        return Ok(Value::Bool(false));
    }
    if word.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    if let Ok(int) = word.parse::<i64>() {
        return Ok(Value::Number(int.into()));
    }
    word.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| {
            ScimError::FilterSyntax(format!(
                "invalid value '{word}': strings must be double-quoted"
            ))
        })
}

fn describe(token: &Token) -> String {
    match token {
        Token::LParen => "'('".into(),
        Token::RParen => "')'".into(),
        Token::Word(word) => format!("'{word}'"),
        Token::Str(text) => format!("\"{text}\""),
    }
}
