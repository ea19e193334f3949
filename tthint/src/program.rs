//! Active program and instruction decoding state.

use super::{
    call_stack::{CallRecord, CallStack},
    code::{Decoder, Program},
    definition::Definition,
    error::HintErrorKind,
};

/// Tracks which bytecode is executing and where.
pub struct ProgramState<'a> {
    /// Bytecode indexed by `Program`.
    pub bytecode: [&'a [u8]; 3],
    /// The program that execution started in.
    pub initial: Program,
    /// The program containing the instruction being executed.
    pub current: Program,
    pub decoder: Decoder<'a>,
    pub call_stack: CallStack,
}

impl<'a> ProgramState<'a> {
    pub fn new(
        font_code: &'a [u8],
        cv_code: &'a [u8],
        glyph_code: &'a [u8],
        initial: Program,
    ) -> Self {
        let bytecode = [font_code, cv_code, glyph_code];
        Self {
            bytecode,
            initial,
            current: initial,
            decoder: Decoder::new(bytecode[initial as usize], 0),
            call_stack: CallStack::default(),
        }
    }

    /// Prepares for execution of the given program from the start.
    pub fn reset(&mut self, program: Program) {
        self.initial = program;
        self.current = program;
        self.decoder = Decoder::new(self.bytecode[program as usize], 0);
        self.call_stack.clear();
    }

    /// Byte range that jumps may target from the current position.
    ///
    /// Inside a definition this is the body of the definition, otherwise it
    /// is the whole program.
    pub fn jump_range(&self) -> core::ops::Range<usize> {
        match self.call_stack.peek() {
            Some(record) => record.definition.code_range(),
            None => 0..self.decoder.bytecode.len(),
        }
    }

    /// Transfers control to the body of `definition`, arranging for it to
    /// run `count` times.
    pub fn enter(&mut self, definition: Definition, count: u32) -> Result<(), HintErrorKind> {
        let program = definition.program();
        self.call_stack.push(CallRecord {
            caller_program: self.current,
            return_pc: self.decoder.pc,
            remaining: count,
            definition,
        })?;
        self.current = program;
        self.decoder = Decoder::new(self.bytecode[program as usize], definition.code_range().start);
        Ok(())
    }

    /// Handles the end of the definition on top of the call stack.
    ///
    /// Restarts the body while iterations remain, otherwise resumes the
    /// caller.
    pub fn leave(&mut self) -> Result<(), HintErrorKind> {
        let mut record = self.call_stack.pop()?;
        if record.remaining > 1 {
            record.remaining -= 1;
            self.decoder.pc = record.definition.code_range().start;
            self.call_stack.push(record)?;
        } else {
            self.current = record.caller_program;
            self.decoder = Decoder::new(
                self.bytecode[record.caller_program as usize],
                record.return_pc,
            );
        }
        Ok(())
    }
}
