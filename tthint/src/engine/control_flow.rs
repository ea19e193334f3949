//! Managing the flow of control.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-flow-of-control>

use super::{super::code::Opcode, Engine, HintErrorKind, OpResult};

impl Engine<'_> {
    /// If test.
    ///
    /// IF[] (0x58)
    ///
    /// Pops: e
    ///
    /// When e is zero, skips to the matching ELSE or EIF, accounting for
    /// nested IF blocks. Otherwise execution continues with the next
    /// instruction.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#if-test>
    pub(super) fn op_if(&mut self) -> OpResult {
        if self.value_stack.pop()? != 0 {
            return Ok(());
        }
        let mut depth = 1;
        loop {
            match self.program.decoder.next()?.opcode {
                Opcode::IF => depth += 1,
                Opcode::ELSE if depth == 1 => return Ok(()),
                Opcode::EIF => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Else.
    ///
    /// ELSE[] (0x1B)
    ///
    /// Only reached at the end of a taken IF branch, so skips to the
    /// matching EIF.
    pub(super) fn op_else(&mut self) -> OpResult {
        let mut depth = 1;
        while depth != 0 {
            match self.program.decoder.next()?.opcode {
                Opcode::IF => depth += 1,
                Opcode::EIF => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// EIF[] (0x59): marks the end of an IF block.
    pub(super) fn op_eif(&mut self) -> OpResult {
        Ok(())
    }

    /// Jump.
    ///
    /// JMPR[] (0x1C)
    ///
    /// Pops: offset (bytes)
    ///
    /// The offset is relative to the jump instruction itself.
    pub(super) fn op_jmpr(&mut self) -> OpResult {
        let offset = self.value_stack.pop()?;
        self.jump(offset)
    }

    /// Jump relative on true.
    ///
    /// JROT[] (0x78)
    ///
    /// Pops: e, offset
    pub(super) fn op_jrot(&mut self) -> OpResult {
        let e = self.value_stack.pop()?;
        let offset = self.value_stack.pop()?;
        if e != 0 {
            self.jump(offset)?;
        }
        Ok(())
    }

    /// Jump relative on false.
    ///
    /// JROF[] (0x79)
    ///
    /// Pops: e, offset
    pub(super) fn op_jrof(&mut self) -> OpResult {
        let e = self.value_stack.pop()?;
        let offset = self.value_stack.pop()?;
        if e == 0 {
            self.jump(offset)?;
        }
        Ok(())
    }

    /// Moves the instruction pointer by `offset` bytes from the jump
    /// instruction.
    ///
    /// Inside a definition the target must stay within its body. At the top
    /// level it may land on the end of the program, which finishes it.
    fn jump(&mut self, offset: i32) -> OpResult {
        if offset == 0 {
            return Err(HintErrorKind::InvalidJump);
        }
        if offset < 0 {
            self.loop_budget.doing_backward_jump()?;
        }
        // The decoder has already moved past the single byte jump opcode
        let ins_pc = self.program.decoder.pc.saturating_sub(1);
        let target = ins_pc
            .checked_add_signed(offset as isize)
            .ok_or(HintErrorKind::InvalidJump)?;
        let is_valid = if self.program.call_stack.is_empty() {
            target <= self.program.decoder.bytecode.len()
        } else {
            self.program.jump_range().contains(&target)
        };
        if !is_valid {
            return Err(HintErrorKind::InvalidJump);
        }
        self.program.decoder.pc = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        super::{
            code::Program,
            error::{HintError, HintingError},
        },
        tests::MockEngine,
        HintErrorKind,
    };

    fn run(code: &[u8]) -> (Result<(), HintError>, Vec<i32>) {
        let mut mock = MockEngine::new();
        mock.glyph_code = code.to_vec();
        let mut engine = mock.engine();
        let result = engine.run_program(Program::Glyph, false);
        (result, engine.stack().to_vec())
    }

    #[test]
    fn if_else() {
        // PUSHB[0] c, IF, PUSHB[0] 1, ELSE, PUSHB[0] 2, EIF
        for (cond, expected) in [(1, 1), (0, 2)] {
            let code = [0xB0, cond, 0x58, 0xB0, 1, 0x1B, 0xB0, 2, 0x59];
            assert_eq!(run(&code), (Ok(()), vec![expected]));
        }
    }

    #[test]
    fn nested_if_skipped() {
        // PUSHB[0] 0, IF, PUSHB[0] 1, IF, PUSHB[0] 5, EIF, ELSE, PUSHB[0] 7, EIF
        let code = [
            0xB0, 0, 0x58, 0xB0, 1, 0x58, 0xB0, 5, 0x59, 0x1B, 0xB0, 7, 0x59,
        ];
        assert_eq!(run(&code), (Ok(()), vec![7]));
    }

    #[test]
    fn if_without_eif() {
        // PUSHB[0] 0, IF, DUP
        let (result, _) = run(&[0xB0, 0, 0x58, 0x20]);
        assert_eq!(
            result.map_err(|e| e.kind),
            Err(HintErrorKind::UnexpectedEndOfBytecode)
        );
    }

    #[test]
    fn conditional_jumps() {
        // PUSHB[1] 3 c, JROT, PUSHB[0] 1, PUSHB[0] 2
        // Taken jump lands on the second push
        for (cond, expected) in [(1, vec![2]), (0, vec![1, 2])] {
            let code = [0xB1, 3, cond, 0x78, 0xB0, 1, 0xB0, 2];
            assert_eq!(run(&code), (Ok(()), expected));
        }
        // Same with JROF
        for (cond, expected) in [(0, vec![2]), (1, vec![1, 2])] {
            let code = [0xB1, 3, cond, 0x79, 0xB0, 1, 0xB0, 2];
            assert_eq!(run(&code), (Ok(()), expected));
        }
    }

    #[test]
    fn jump_to_end_finishes() {
        // PUSHB[0] 3, JMPR, PUSHB[0] 1
        assert_eq!(run(&[0xB0, 3, 0x1C, 0xB0, 1]), (Ok(()), vec![]));
    }

    #[test]
    fn invalid_jumps() {
        // Zero offset would loop in place
        let (result, _) = run(&[0xB0, 0, 0x1C]);
        assert_eq!(result.map_err(|e| e.kind), Err(HintErrorKind::InvalidJump));
        // Past the end
        let (result, _) = run(&[0xB0, 2, 0x1C]);
        assert_eq!(result.map_err(|e| e.kind), Err(HintErrorKind::InvalidJump));
        // Before the start: PUSHW[0] -8, JMPR
        let (result, _) = run(&[0xB8, 0xFF, 0xF8, 0x1C]);
        assert_eq!(result.map_err(|e| e.kind), Err(HintErrorKind::InvalidJump));
    }

    #[test]
    fn infinite_loop_times_out() {
        // PUSHW[0] -3, JMPR
        let (result, _) = run(&[0xB8, 0xFF, 0xFD, 0x1C]);
        let error = HintingError::from(result.unwrap_err());
        assert!(matches!(error, HintingError::ExecutionTimeout(_)));
    }

    #[test]
    fn backward_jumps_are_budgeted() {
        let mut mock = MockEngine::new();
        mock.glyph_code = vec![0xB8, 0xFF, 0xFD, 0x1C];
        let mut engine = mock.engine();
        engine.max_instructions = usize::MAX;
        let error = engine.run_program(Program::Glyph, false).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::ExceededExecutionBudget);
        assert_eq!(error.pc, 3);
    }
}
