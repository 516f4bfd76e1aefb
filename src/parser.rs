use crate::{
    error::{Error, ErrorType, Result},
    lexer::{SourceRange, Token, TokenType},
    program::{Program, ProgramBuilder},
};

/// One line-level item of assembly source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    Label {
        name: &'a str,
        range: SourceRange,
    },
    Instruction {
        mnemonic: &'a str,
        operands: Vec<&'a str>,
        range: SourceRange,
    },
}

pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    index: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn eof(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn out_of_bounds(&self) -> Error {
        let range = self
            .tokens
            .last()
            .map(|t| t.range)
            .unwrap_or_else(SourceRange::empty);
        Error::new_with_range(
            ErrorType::Parser,
            "Token stream out of bounds".to_string(),
            range,
        )
    }

    fn peek(&self) -> Result<&'t Token<'a>> {
        self.tokens.get(self.index).ok_or_else(|| self.out_of_bounds())
    }

    fn peeks(&self, i: usize) -> Result<&'t Token<'a>> {
        self.tokens
            .get(self.index + i)
            .ok_or_else(|| self.out_of_bounds())
    }

    fn consume(&mut self) -> Result<&'t Token<'a>> {
        let token = self.peek()?;
        self.index += 1;
        Ok(token)
    }

    fn consume_assert(&mut self, token_type: TokenType) -> Result<&'t Token<'a>> {
        let token = self.consume()?;
        if token.token_type != token_type {
            return Err(Error::new_with_range(
                ErrorType::Parser,
                format!(
                    "Expected token {:?}, but got {:?}",
                    token_type, token.token_type
                ),
                token.range,
            ));
        }
        Ok(token)
    }

    fn skip_newlines(&mut self) {
        while let Ok(token) = self.peek() {
            if token.token_type != TokenType::Newline {
                break;
            }
            self.index += 1;
        }
    }

    fn at_line_end(&self) -> bool {
        match self.peek() {
            Ok(token) => token.token_type == TokenType::Newline,
            Err(_) => true,
        }
    }

    fn parse_operand(&mut self) -> Result<&'t Token<'a>> {
        let token = self.consume()?;
        match token.token_type {
            TokenType::Identifier
            | TokenType::IntegerLiteral
            | TokenType::BinaryIntegerLiteral
            | TokenType::HexIntegerLiteral => Ok(token),
            _ => Err(Error::new_with_range(
                ErrorType::Parser,
                format!("Expected an operand, but got {:?}", token.token_type),
                token.range,
            )),
        }
    }

    fn parse_instruction(&mut self) -> Result<Statement<'a>> {
        let mnemonic = self.consume_assert(TokenType::Identifier)?;
        let mut range = mnemonic.range;
        let mut operands = vec![];

        if !self.at_line_end() {
            loop {
                let operand = self.parse_operand()?;
                range = range.expand(&operand.range);
                operands.push(operand.value);

                if self.at_line_end() {
                    break;
                }
                self.consume_assert(TokenType::Comma)?;
            }
        }

        Ok(Statement::Instruction {
            mnemonic: mnemonic.value,
            operands,
            range,
        })
    }

    pub fn parse_statement(&mut self) -> Result<Statement<'a>> {
        let token = self.peek()?;

        if token.token_type == TokenType::Identifier {
            if let Ok(next) = self.peeks(1) {
                if next.token_type == TokenType::Colon {
                    self.index += 2;
                    return Ok(Statement::Label {
                        name: token.value,
                        range: token.range.expand(&next.range),
                    });
                }
            }
        }

        self.parse_instruction()
    }

    /// Parses the remaining statements straight into a [`Program`].
    pub fn parse_program(self) -> Result<Program> {
        let mut builder = ProgramBuilder::new();

        for statement in self {
            match statement? {
                Statement::Label { name, .. } => {
                    builder.label(name);
                }
                Statement::Instruction {
                    mnemonic,
                    operands,
                    range,
                } => {
                    builder.emit_tokens_at(mnemonic, &operands, range)?;
                }
            }
        }

        Ok(builder.build())
    }
}

impl<'t, 'a> Iterator for Parser<'t, 'a> {
    type Item = Result<Statement<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_newlines();
        if self.eof() {
            return None;
        }

        let statement = self.parse_statement();
        if statement.is_err() {
            // Nothing sensible follows a malformed line.
            self.index = self.tokens.len();
        }
        Some(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse(input: &str) -> Result<Vec<Statement>> {
        let tokens = lex(input)?;
        Parser::new(&tokens).collect()
    }

    #[test]
    fn parser_empty() {
        assert_eq!(parse("\n\n ; comment\n").unwrap(), vec![]);
    }

    #[test]
    fn parser_instruction() {
        let statements = parse("mov ax, 5").unwrap();
        assert_eq!(
            statements,
            vec![Statement::Instruction {
                mnemonic: "mov",
                operands: vec!["ax", "5"],
                range: (0..9).into(),
            }]
        );
    }

    #[test]
    fn parser_label_and_instruction_on_one_line() {
        let statements = parse("top: inc ax\njl top\n").unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[0],
            Statement::Label {
                name: "top",
                range: (0..4).into()
            }
        );
        assert!(matches!(
            &statements[1],
            Statement::Instruction { mnemonic: "inc", operands, .. } if operands == &vec!["ax"]
        ));
        assert!(matches!(
            &statements[2],
            Statement::Instruction { mnemonic: "jl", operands, .. } if operands == &vec!["top"]
        ));
    }

    #[test]
    fn parser_missing_comma() {
        let error = parse("mov ax 5").unwrap_err();
        assert_eq!(error.error_type, ErrorType::Parser);
        assert_eq!(
            error.message,
            "Expected token Comma, but got IntegerLiteral"
        );
    }

    #[test]
    fn parser_trailing_comma() {
        let error = parse("cmp ax,\n").unwrap_err();
        assert_eq!(error.message, "Expected an operand, but got Newline");
    }

    #[test]
    fn parser_statement_must_start_with_identifier() {
        let error = parse("5, ax").unwrap_err();
        assert_eq!(error.error_type, ErrorType::Parser);
        assert_eq!(error.range, Some(SourceRange::new(0, 1)));
    }

    #[test]
    fn parser_builds_program() {
        let tokens = lex("start:\n  mov bx, 0x10\n  jmp end\nend:\n").unwrap();
        let program = Parser::new(&tokens).parse_program().unwrap();

        assert_eq!(program.len(), 2);
        assert_eq!(program.resolve_label("start"), Some(0));
        assert_eq!(program.resolve_label("end"), Some(2));
        assert_eq!(program.get(0).unwrap().to_string(), "mov bx, 16");
        assert_eq!(program.get(1).unwrap().range(), SourceRange::new(24, 31));
    }

    #[test]
    fn parser_build_errors_carry_range() {
        let tokens = lex("mov ax, 1\nmov ex, 2\n").unwrap();
        let error = Parser::new(&tokens).parse_program().unwrap_err();

        assert_eq!(error.error_type, ErrorType::UnknownRegister);
        assert_eq!(error.message, "Unknown register 'ex'");
        assert_eq!(error.range, Some(SourceRange::new(10, 19)));
    }
}
