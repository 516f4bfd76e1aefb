use crate::error::Result;
use crate::instruction::{Instruction, Opcode, Operand};
use crate::lexer::SourceRange;
use crate::register::Register;
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;

/// Records instructions and label declarations in a single linear pass.
///
/// Jump targets are stored by name and only looked up when the jump
/// executes, so a label may be declared before or after the jumps that use it.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

macro_rules! jump {
    ($name:ident, $opcode:expr) => {
        pub fn $name(&mut self, label: &str) -> Result<&mut Self> {
            self.emit_op($opcode, vec![Operand::Label(label.to_string())])
        }
    };
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` as pointing at the next instruction to be recorded.
    pub fn label(&mut self, name: &str) -> &mut Self {
        let index = self.instructions.len();
        if let Some(previous) = self.labels.insert(name.to_string(), index) {
            warn!(
                "label '{}' redeclared, moving it from {} to {}",
                name, previous, index
            );
        } else {
            debug!("label '{}' -> {}", name, index);
        }
        self
    }

    pub fn emit(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    pub fn emit_op(&mut self, opcode: Opcode, operands: Vec<Operand>) -> Result<&mut Self> {
        let instruction = Instruction::new(opcode, operands)?;
        Ok(self.emit(instruction))
    }

    /// Emits an instruction from untyped tokens, e.g. `("mov", &["ax", "5"])`.
    pub fn emit_tokens(&mut self, mnemonic: &str, tokens: &[&str]) -> Result<&mut Self> {
        self.emit_tokens_at(mnemonic, tokens, SourceRange::empty())
    }

    pub(crate) fn emit_tokens_at(
        &mut self,
        mnemonic: &str,
        tokens: &[&str],
        range: SourceRange,
    ) -> Result<&mut Self> {
        let build = || -> Result<Instruction> {
            let opcode = mnemonic.parse::<Opcode>()?;
            let operands = tokens
                .iter()
                .map(|t| Operand::parse(t))
                .collect::<Result<Vec<_>>>()?;
            Instruction::new(opcode, operands)
        };

        let instruction = build().map_err(|e| e.with_range(range))?;
        Ok(self.emit(instruction.with_range(range)))
    }

    pub fn mov(&mut self, dst: Register, src: impl Into<Operand>) -> Result<&mut Self> {
        self.emit_op(Opcode::Mov, vec![dst.into(), src.into()])
    }

    pub fn inc(&mut self, dst: Register, value: impl Into<Operand>) -> Result<&mut Self> {
        self.emit_op(Opcode::Inc, vec![dst.into(), value.into()])
    }

    pub fn dec(&mut self, dst: Register, value: impl Into<Operand>) -> Result<&mut Self> {
        self.emit_op(Opcode::Dec, vec![dst.into(), value.into()])
    }

    pub fn cmp(&mut self, left: impl Into<Operand>, right: impl Into<Operand>) -> Result<&mut Self> {
        self.emit_op(Opcode::Cmp, vec![left.into(), right.into()])
    }

    jump!(jmp, Opcode::Jmp);
    jump!(je, Opcode::Je);
    jump!(jne, Opcode::Jne);
    jump!(jl, Opcode::Jl);
    jump!(jle, Opcode::Jle);
    jump!(jg, Opcode::Jg);
    jump!(jge, Opcode::Jge);

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn build(self) -> Program {
        Program {
            instructions: self.instructions,
            labels: self.labels,
        }
    }
}

/// A completed instruction sequence together with its label table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn labels(&self) -> &HashMap<String, usize> {
        &self.labels
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn resolve_label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Jumps whose target was never declared. These only fail once executed.
    pub fn unresolved_labels(&self) -> Vec<&Instruction> {
        self.instructions
            .iter()
            .filter(|i| matches!(i.target(), Some(name) if !self.labels.contains_key(name)))
            .collect()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut labels = self.labels.iter().collect::<Vec<_>>();
        labels.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)));
        let mut labels = labels.into_iter().peekable();

        for index in 0..=self.instructions.len() {
            while let Some((name, _)) = labels.next_if(|(_, i)| **i == index) {
                writeln!(f, "{}:", name)?;
            }
            if let Some(instruction) = self.instructions.get(index) {
                writeln!(f, "{:4}    {}", index, instruction)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use Register::*;

    #[test]
    fn builder_new() {
        let builder = ProgramBuilder::new();
        assert!(builder.is_empty());
        assert!(builder.build().is_empty());
    }

    #[test]
    fn builder_labels_point_at_next_instruction() {
        let mut builder = ProgramBuilder::new();
        builder.label("start");
        builder.mov(Ax, 1).unwrap();
        builder.label("middle");
        builder.label("also_middle");
        builder.inc(Ax, 1).unwrap();
        builder.label("end");

        let program = builder.build();
        assert_eq!(program.len(), 2);
        assert_eq!(program.resolve_label("start"), Some(0));
        assert_eq!(program.resolve_label("middle"), Some(1));
        assert_eq!(program.resolve_label("also_middle"), Some(1));
        assert_eq!(program.resolve_label("end"), Some(2));
        assert_eq!(program.resolve_label("missing"), None);
    }

    #[test]
    fn builder_redeclared_label_last_wins() {
        let mut builder = ProgramBuilder::new();
        builder.label("a");
        builder.mov(Bx, 2).unwrap();
        builder.label("a");

        assert_eq!(builder.build().resolve_label("a"), Some(1));
    }

    #[test]
    fn builder_emit_tokens() {
        let mut builder = ProgramBuilder::new();
        builder.emit_tokens("mov", &["ax", "5"]).unwrap();
        builder.emit_tokens("JNE", &["done"]).unwrap();

        let program = builder.build();
        assert_eq!(program.get(0).unwrap().to_string(), "mov ax, 5");
        assert_eq!(program.get(1).unwrap().target(), Some("done"));
    }

    #[test]
    fn builder_emit_tokens_errors() {
        let mut builder = ProgramBuilder::new();

        let error = builder.emit_tokens("mov", &["ex", "5"]).unwrap_err();
        assert_eq!(error.error_type, ErrorType::UnknownRegister);

        let error = builder.emit_tokens("mov", &["ax", "5$"]).unwrap_err();
        assert_eq!(error.error_type, ErrorType::MalformedOperand);

        let error = builder.emit_tokens("jmp", &["a", "b"]).unwrap_err();
        assert_eq!(error.error_type, ErrorType::MalformedInstruction);

        let error = builder.emit_tokens("halt", &[]).unwrap_err();
        assert_eq!(error.error_type, ErrorType::MalformedInstruction);

        assert!(builder.is_empty());
    }

    #[test]
    fn builder_rejects_label_as_comparison_operand() {
        let mut builder = ProgramBuilder::new();
        builder.jmp("anywhere").unwrap();
        assert!(builder.cmp(Ax, Operand::Label("x".to_string())).is_err());
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn program_unresolved_labels() {
        let mut builder = ProgramBuilder::new();
        builder.je("present").unwrap();
        builder.jmp("absent").unwrap();
        builder.label("present");

        let program = builder.build();
        let unresolved = program.unresolved_labels();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].target(), Some("absent"));
    }

    #[test]
    fn program_display() {
        let mut builder = ProgramBuilder::new();
        builder.label("top");
        builder.inc(Ax, 1).unwrap();
        builder.cmp(Ax, 3).unwrap();
        builder.jl("top").unwrap();
        builder.label("end");

        let listing = builder.build().to_string();
        assert_eq!(
            listing,
            "top:\n   0    inc ax, 1\n   1    cmp ax, 3\n   2    jl top\nend:\n"
        );
    }
}
