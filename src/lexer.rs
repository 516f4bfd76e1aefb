use crate::error::{Error, ErrorType, Result};
use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenType {
    #[regex("[ \t\r]+")]
    Whitespace,
    #[regex(";[^\n]*")]
    Comment,
    #[token("\n")]
    Newline,

    #[regex("-?[0-9]+")]
    IntegerLiteral,
    #[regex("-?0[bB][0-1]+")]
    BinaryIntegerLiteral,
    #[regex("-?0[xX][0-9a-fA-F]+")]
    HexIntegerLiteral,

    #[regex("[a-zA-Z_][_0-9a-zA-Z]*")]
    Identifier,

    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn expand(&self, other: &Self) -> Self {
        SourceRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<Range<usize>> for SourceRange {
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

impl From<SourceRange> for Range<usize> {
    fn from(range: SourceRange) -> Self {
        range.start..range.end
    }
}

#[derive(Debug)]
pub struct Token<'a> {
    pub token_type: TokenType,
    pub value: &'a str,
    pub range: SourceRange,
}

impl<'a> Token<'a> {
    pub fn new(token_type: TokenType, value: &'a str, range: SourceRange) -> Self {
        Self {
            token_type,
            value,
            range,
        }
    }
}

impl<'a> PartialEq for Token<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.token_type == other.token_type && self.range == other.range
    }
}

impl<'a> PartialEq<TokenType> for &Token<'a> {
    fn eq(&self, other: &TokenType) -> bool {
        self.token_type == *other
    }
}

pub fn lex(input: &str) -> Result<Vec<Token>> {
    let mut lex = TokenType::lexer(input);

    let mut tokens = vec![];

    while let Some(token_type) = lex.next() {
        match token_type {
            Err(_) => {
                return Err(Error::new_with_range(
                    ErrorType::Lexer,
                    format!("Unknown character '{}'", lex.slice()),
                    lex.span().into(),
                ))
            }
            Ok(TokenType::Whitespace) | Ok(TokenType::Comment) => continue,
            Ok(token_type) => tokens.push(Token::new(token_type, lex.slice(), lex.span().into())),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::TokenType::*;
    use super::*;

    fn get_tokens(input: &str) -> Vec<Token> {
        let tokens = lex(input);
        assert!(tokens.is_ok());
        tokens.unwrap()
    }

    #[test]
    fn lexer_empty() {
        let tokens = get_tokens("");
        assert_eq!(tokens.len(), 0);
    }

    #[test]
    fn lexer_comment_only() {
        let tokens = get_tokens("   ; nothing to see here");
        assert_eq!(tokens.len(), 0);
    }

    #[test]
    fn lexer_instruction() {
        let tokens = get_tokens("mov ax, 12");

        assert_eq!(tokens[0], Token::new(Identifier, "mov", (0..3).into()));
        assert_eq!(tokens[1], Token::new(Identifier, "ax", (4..6).into()));
        assert_eq!(tokens[2], Token::new(Comma, ",", (6..7).into()));
        assert_eq!(tokens[3], Token::new(IntegerLiteral, "12", (8..10).into()));
    }

    #[test]
    fn lexer_label_declaration() {
        let tokens = get_tokens("loop_start:\n");

        assert_eq!(tokens[0].token_type, Identifier);
        assert_eq!(tokens[1].token_type, Colon);
        assert_eq!(tokens[2].token_type, Newline);
    }

    #[test]
    fn lexer_integer_literals() {
        let tokens = get_tokens("-5 0x1F 0b101 -0x10");

        assert_eq!(tokens[0], Token::new(IntegerLiteral, "-5", (0..2).into()));
        assert_eq!(tokens[1].token_type, HexIntegerLiteral);
        assert_eq!(tokens[2].token_type, BinaryIntegerLiteral);
        assert_eq!(tokens[3].token_type, HexIntegerLiteral);
    }

    #[test]
    fn lexer_newlines_are_kept() {
        let tokens = get_tokens("inc ax\ninc bx\n");

        let newlines = tokens.iter().filter(|t| t == &Newline).count();
        assert_eq!(newlines, 2);
    }

    #[test]
    fn lexer_error() {
        let tokens = lex("mov ax, $5");

        assert!(tokens.is_err());
        let error = tokens.unwrap_err();
        assert_eq!(error.error_type, ErrorType::Lexer);
        assert_eq!(error.range.map(|r| r.start), Some(8));
    }
}
