use crate::error::{Error, ErrorType, Result};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

pub const REGISTER_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Ax,
    Bx,
    Cx,
    Dx,
}

impl Register {
    /// All registers in declaration order, which is also snapshot order.
    pub const ALL: [Register; REGISTER_COUNT] = [Register::Ax, Register::Bx, Register::Cx, Register::Dx];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Register::Ax => "ax",
            Register::Bx => "bx",
            Register::Cx => "cx",
            Register::Dx => "dx",
        }
    }
}

impl FromStr for Register {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Register::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::new(ErrorType::UnknownRegister, format!("Unknown register '{}'", s)))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fixed bank of integer registers, all starting at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterBank {
    values: [i64; REGISTER_COUNT],
}

impl RegisterBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, register: Register) -> i64 {
        self.values[register.index()]
    }

    pub fn set(&mut self, register: Register, value: i64) {
        self.values[register.index()] = value;
    }

    pub fn reset(&mut self) {
        self.values = [0; REGISTER_COUNT];
    }

    pub fn iter(&self) -> impl Iterator<Item = (Register, i64)> + '_ {
        Register::ALL.into_iter().map(|r| (r, self.get(r)))
    }

    pub fn to_array(&self) -> [i64; REGISTER_COUNT] {
        self.values
    }
}

impl Index<Register> for RegisterBank {
    type Output = i64;

    fn index(&self, register: Register) -> &i64 {
        &self.values[register.index()]
    }
}

impl IndexMut<Register> for RegisterBank {
    fn index_mut(&mut self, register: Register) -> &mut i64 {
        &mut self.values[register.index()]
    }
}

impl fmt::Display for RegisterBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .iter()
            .map(|(r, v)| format!("{} = {}", r, v))
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join("\n"))
    }
}
