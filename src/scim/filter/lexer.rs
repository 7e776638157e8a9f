//! Filter tokenizer
//!
//! Splits on whitespace and on parentheses outside of double quotes. Quoted
//! strings are taken verbatim; there is no escape processing.

use crate::error::{ScimError, ScimResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    /// Bare word: attribute path, keyword, operator or unquoted literal
    Word(String),
    /// Contents of a double-quoted string
    Str(String),
}

pub fn tokenize(input: &str) -> ScimResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '(' | ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(if c == '(' {
                    Token::LParen
                } else {
                    Token::RParen
                });
            }
            '"' => {
                flush(&mut word, &mut tokens);
                let mut literal = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    literal.push(c);
                }
                if !closed {
                    return Err(ScimError::FilterSyntax(format!(
                        "unterminated string literal \"{literal}"
                    )));
                }
                tokens.push(Token::Str(literal));
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);

    Ok(tokens)
}

fn flush(word: &mut String, tokens: &mut Vec<Token>) {
    if !word.is_empty() {
        tokens.push(Token::Word(std::mem::take(word)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn test_simple_comparison() {
        let tokens = tokenize(r#"userName eq "a b@x.com""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                word("userName"),
                word("eq"),
                Token::Str("a b@x.com".into())
            ]
        );
    }

    #[test]
    fn test_parentheses_split_words() {
        let tokens = tokenize("(active eq true)and(id pr)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                word("active"),
                word("eq"),
                word("true"),
                Token::RParen,
                word("and"),
                Token::LParen,
                word("id"),
                word("pr"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_parentheses_inside_quotes_are_literal() {
        let tokens = tokenize(r#"name.givenName co "(x)""#).unwrap();
        assert_eq!(tokens[2], Token::Str("(x)".into()));
    }

    #[test]
    fn test_empty_string_literal() {
        let tokens = tokenize(r#"externalId eq """#).unwrap();
        assert_eq!(tokens[2], Token::Str(String::new()));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = tokenize(r#"userName eq "abc"#).unwrap_err();
        assert!(matches!(err, ScimError::FilterSyntax(_)));
    }
}
