use crate::lexer::SourceRange;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;
use std::ops::Range;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Lexer,
    Parser,
    UnknownRegister,
    MalformedOperand,
    MalformedInstruction,
    UnresolvedLabel,
    StepLimit,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorType::Lexer => "lexer error",
            ErrorType::Parser => "parser error",
            ErrorType::UnknownRegister => "unknown register",
            ErrorType::MalformedOperand => "malformed operand",
            ErrorType::MalformedInstruction => "malformed instruction",
            ErrorType::UnresolvedLabel => "unresolved label",
            ErrorType::StepLimit => "step limit",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub error_type: ErrorType,
    pub message: String,
    pub range: Option<SourceRange>,
}

impl Error {
    pub fn new(error_type: ErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            range: None,
        }
    }

    pub fn new_with_range(error_type: ErrorType, message: String, range: SourceRange) -> Self {
        Self {
            error_type,
            message,
            range: Some(range),
        }
    }

    /// Attaches `range` unless the error already points somewhere.
    pub fn with_range(mut self, range: SourceRange) -> Self {
        if self.range.is_none() && range != SourceRange::empty() {
            self.range = Some(range);
        }
        self
    }

    /// Prints the error as a report on stderr, underlining the offending
    /// span of `source` when it is known.
    pub fn print(&self, file: &str, source: &str) -> std::io::Result<()> {
        let offset = self.range.map(|r| r.start).unwrap_or(0);

        let mut report = Report::<(&str, Range<usize>)>::build(ReportKind::Error, file, offset)
            .with_message(self.error_type.to_string());

        match self.range {
            Some(range) => {
                let span: Range<usize> = range.into();
                report = report.with_label(
                    Label::new((file, span))
                        .with_message(&self.message)
                        .with_color(Color::Red),
                );
            }
            None => report = report.with_note(&self.message),
        }

        report.finish().eprint((file, Source::from(source)))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for Error {}
