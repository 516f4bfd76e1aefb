use crate::error::{Error, ErrorType, Result};
use crate::instruction::{ComparisonFlag, Instruction, Opcode, Operand};
use crate::program::Program;
use crate::register::RegisterBank;
use log::{debug, trace};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Abort with a step limit error after this many executed instructions.
    pub max_steps: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

enum InstructionExecuteResult {
    Next,
    Jump(usize),
}

/// Fetch-execute loop over a built [`Program`].
///
/// State is not reset between runs; call [`Engine::reset`] or construct a
/// new engine to run the same program again from scratch.
pub struct Engine<'a> {
    program: &'a Program,
    options: EngineOptions,
    registers: RegisterBank,
    flag: ComparisonFlag,
    instruction_pointer: usize,
    steps: u64,
}

impl<'a> Engine<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self::with_options(program, EngineOptions::default())
    }

    pub fn with_options(program: &'a Program, options: EngineOptions) -> Self {
        Self {
            program,
            options,
            registers: RegisterBank::new(),
            flag: ComparisonFlag::default(),
            instruction_pointer: 0,
            steps: 0,
        }
    }

    pub fn reset(&mut self) {
        self.registers.reset();
        self.flag = ComparisonFlag::default();
        self.instruction_pointer = 0;
        self.steps = 0;
    }

    pub fn registers(&self) -> &RegisterBank {
        &self.registers
    }

    pub fn flag(&self) -> ComparisonFlag {
        self.flag
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn state(&self) -> State {
        if self.instruction_pointer < self.program.len() {
            State::Running
        } else {
            State::Halted
        }
    }

    fn resolve(&self, operand: &Operand) -> Result<i64> {
        match operand {
            Operand::Register(register) => Ok(self.registers[*register]),
            Operand::Literal(value) => Ok(*value),
            Operand::Label(name) => Err(Error::new(
                ErrorType::UnknownRegister,
                format!("Unknown register '{}'", name),
            )),
        }
    }

    fn execute_instruction(&mut self, instr: &Instruction) -> Result<InstructionExecuteResult> {
        use Opcode::*;

        match (instr.opcode(), instr.operands()) {
            (Mov, [Operand::Register(dst), src]) => {
                self.registers[*dst] = self.resolve(src)?;
            }
            (Inc, [Operand::Register(dst), src]) => {
                let value = self.resolve(src)?;
                self.registers[*dst] = self.registers[*dst].wrapping_add(value);
            }
            (Dec, [Operand::Register(dst), src]) => {
                let value = self.resolve(src)?;
                self.registers[*dst] = self.registers[*dst].wrapping_sub(value);
            }
            (Cmp, [left, right]) => {
                let left = self.resolve(left)?;
                let right = self.resolve(right)?;
                self.flag = left.cmp(&right).into();
            }
            (opcode, [Operand::Label(name)]) if opcode.is_jump() => {
                if !opcode.jump_taken(self.flag) {
                    return Ok(InstructionExecuteResult::Next);
                }

                let target = self.program.resolve_label(name).ok_or_else(|| {
                    Error::new(
                        ErrorType::UnresolvedLabel,
                        format!("Unresolved label '{}'", name),
                    )
                })?;

                return Ok(InstructionExecuteResult::Jump(target));
            }
            _ => {
                return Err(Error::new(
                    ErrorType::MalformedInstruction,
                    format!("Malformed instruction '{}'", instr),
                ))
            }
        }

        Ok(InstructionExecuteResult::Next)
    }

    /// Executes the instruction at the current pointer. Does nothing once halted.
    pub fn step(&mut self) -> Result<State> {
        let program = self.program;
        let instr = match program.get(self.instruction_pointer) {
            Some(instr) => instr,
            None => return Ok(State::Halted),
        };

        if let Some(max_steps) = self.options.max_steps {
            if self.steps >= max_steps {
                return Err(Error::new_with_range(
                    ErrorType::StepLimit,
                    format!("Step limit of {} exceeded", max_steps),
                    instr.range(),
                ));
            }
        }

        trace!(
            "{:4}: {:<16} flag={:?}",
            self.instruction_pointer,
            instr.to_string(),
            self.flag
        );

        let result = self
            .execute_instruction(instr)
            .map_err(|e| e.with_range(instr.range()))?;
        self.steps += 1;

        self.instruction_pointer = match result {
            InstructionExecuteResult::Next => self.instruction_pointer + 1,
            InstructionExecuteResult::Jump(target) => target,
        };

        Ok(self.state())
    }

    /// Runs until the pointer leaves the program and returns the final registers.
    pub fn run(&mut self) -> Result<RegisterBank> {
        debug!(
            "running {} instruction(s) from {}",
            self.program.len(),
            self.instruction_pointer
        );

        while self.step()? == State::Running {}

        debug!("halted after {} step(s)", self.steps);

        Ok(self.registers.clone())
    }
}
