use crate::error::{Error, ErrorType, Result};
use crate::lexer::SourceRange;
use crate::register::Register;
use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Mov,
    Inc,
    Dec,
    Cmp,
    Jmp,
    Je,
    Jne,
    Jl,
    Jle,
    Jg,
    Jge,
}

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::Mov,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Cmp,
        Opcode::Jmp,
        Opcode::Je,
        Opcode::Jne,
        Opcode::Jl,
        Opcode::Jle,
        Opcode::Jg,
        Opcode::Jge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Mov => "mov",
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Cmp => "cmp",
            Opcode::Jmp => "jmp",
            Opcode::Je => "je",
            Opcode::Jne => "jne",
            Opcode::Jl => "jl",
            Opcode::Jle => "jle",
            Opcode::Jg => "jg",
            Opcode::Jge => "jge",
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::Jmp
                | Opcode::Je
                | Opcode::Jne
                | Opcode::Jl
                | Opcode::Jle
                | Opcode::Jg
                | Opcode::Jge
        )
    }

    /// Whether a jump with this opcode is taken given the last comparison.
    /// Always false for non-jump opcodes.
    pub fn jump_taken(self, flag: ComparisonFlag) -> bool {
        use ComparisonFlag::*;

        match self {
            Opcode::Jmp => true,
            Opcode::Je => flag == Equal,
            Opcode::Jne => flag != Equal,
            Opcode::Jl => flag == Less,
            Opcode::Jle => flag != Greater,
            Opcode::Jg => flag == Greater,
            Opcode::Jge => flag != Less,
            Opcode::Mov | Opcode::Inc | Opcode::Dec | Opcode::Cmp => false,
        }
    }

    fn arity(self) -> RangeInclusive<usize> {
        match self {
            Opcode::Mov | Opcode::Cmp => 2..=2,
            Opcode::Inc | Opcode::Dec => 1..=2,
            _ => 1..=1,
        }
    }
}

impl FromStr for Opcode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::new(
                    ErrorType::MalformedInstruction,
                    format!("Unknown instruction '{}'", s),
                )
            })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of the most recent `cmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonFlag {
    Less,
    #[default]
    Equal,
    Greater,
}

impl From<Ordering> for ComparisonFlag {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => ComparisonFlag::Less,
            Ordering::Equal => ComparisonFlag::Equal,
            Ordering::Greater => ComparisonFlag::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Literal(i64),
    Label(String),
}

impl Operand {
    /// Classifies a raw operand token. Identifiers that are not registers
    /// become label references; whether that is legal depends on where the
    /// operand is used, which `Instruction::new` checks.
    pub fn parse(token: &str) -> Result<Self> {
        if let Ok(register) = token.parse::<Register>() {
            return Ok(Operand::Register(register));
        }

        if let Some(value) = parse_integer(token)? {
            return Ok(Operand::Literal(value));
        }

        if is_identifier(token) {
            return Ok(Operand::Label(token.to_string()));
        }

        Err(Error::new(
            ErrorType::MalformedOperand,
            format!("Malformed operand '{}'", token),
        ))
    }
}

impl From<Register> for Operand {
    fn from(register: Register) -> Self {
        Operand::Register(register)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Literal(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Literal(value as i64)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{}", register),
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Label(name) => write!(f, "{}", name),
        }
    }
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Parses decimal, `0x` and `0b` integers with an optional leading minus.
/// Returns `Ok(None)` when the token is not integer shaped at all.
pub fn parse_integer(token: &str) -> Result<Option<i64>> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else {
        (10, digits)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Ok(None);
    }

    // Parse with the sign attached so i64::MIN is representable.
    let signed = if negative {
        format!("-{}", digits)
    } else {
        digits.to_string()
    };

    i64::from_str_radix(&signed, radix).map(Some).map_err(|_| {
        Error::new(
            ErrorType::MalformedOperand,
            format!("Integer literal '{}' out of range", token),
        )
    })
}

/// A single recorded instruction. Operands are validated on construction
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    opcode: Opcode,
    operands: Vec<Operand>,
    range: SourceRange,
}

impl Instruction {
    pub fn new(opcode: Opcode, mut operands: Vec<Operand>) -> Result<Self> {
        let arity = opcode.arity();
        if !arity.contains(&operands.len()) {
            let expected = if arity.start() == arity.end() {
                arity.start().to_string()
            } else {
                format!("{} or {}", arity.start(), arity.end())
            };
            return Err(Error::new(
                ErrorType::MalformedInstruction,
                format!(
                    "{} expects {} operand(s), got {}",
                    opcode.name().to_uppercase(),
                    expected,
                    operands.len()
                ),
            ));
        }

        match opcode {
            Opcode::Mov | Opcode::Inc | Opcode::Dec => {
                if operands.len() == 1 {
                    operands.push(Operand::Literal(1));
                }
                check_destination(opcode, &operands[0])?;
                check_source(&operands[1])?;
            }
            Opcode::Cmp => {
                check_source(&operands[0])?;
                check_source(&operands[1])?;
            }
            _ => check_target(opcode, &operands[0])?,
        }

        Ok(Self {
            opcode,
            operands,
            range: SourceRange::empty(),
        })
    }

    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = range;
        self
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }

    /// Label this instruction jumps to, if it is a jump.
    pub fn target(&self) -> Option<&str> {
        match (self.opcode.is_jump(), self.operands.first()) {
            (true, Some(Operand::Label(name))) => Some(name),
            _ => None,
        }
    }
}

fn check_destination(opcode: Opcode, operand: &Operand) -> Result<()> {
    match operand {
        Operand::Register(_) => Ok(()),
        Operand::Label(name) => Err(unknown_register(name)),
        Operand::Literal(value) => Err(Error::new(
            ErrorType::MalformedOperand,
            format!(
                "Expected a register as destination of {}, got '{}'",
                opcode.name().to_uppercase(),
                value
            ),
        )),
    }
}

fn check_source(operand: &Operand) -> Result<()> {
    match operand {
        Operand::Label(name) => Err(unknown_register(name)),
        _ => Ok(()),
    }
}

fn check_target(opcode: Opcode, operand: &Operand) -> Result<()> {
    match operand {
        Operand::Label(_) => Ok(()),
        other => Err(Error::new(
            ErrorType::MalformedOperand,
            format!(
                "Expected a label as target of {}, got '{}'",
                opcode.name().to_uppercase(),
                other
            ),
        )),
    }
}

fn unknown_register(name: &str) -> Error {
    Error::new(
        ErrorType::UnknownRegister,
        format!("Unknown register '{}'", name),
    )
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands = self
            .operands
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>();
        write!(f, "{} {}", self.opcode, operands.join(", "))
    }
}
