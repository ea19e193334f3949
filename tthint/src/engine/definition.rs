//! Defining and using functions and instructions.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#defining-and-using-functions-and-instructions>

use super::{
    super::{
        code::{Opcode, Program},
        definition::{Definition, MAX_DEFINITION_SIZE},
    },
    Engine, HintErrorKind, OpResult,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum DefinitionKind {
    Function,
    Instruction,
}

impl Engine<'_> {
    /// Function definition.
    ///
    /// FDEF[] (0x2C)
    ///
    /// Pops: f (function number)
    ///
    /// Records the code up to and including the matching ENDF as the body
    /// of function f and skips over it. Only the font and control value
    /// programs may define functions.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#function-definition>
    pub(super) fn op_fdef(&mut self) -> OpResult {
        let f = self.value_stack.pop()?;
        self.define(DefinitionKind::Function, f)
    }

    /// End function definition.
    ///
    /// ENDF[] (0x2D)
    ///
    /// Returns from the active function or instruction, or restarts its
    /// body when called by LOOPCALL with iterations remaining.
    pub(super) fn op_endf(&mut self) -> OpResult {
        self.program.leave()
    }

    /// Call function.
    ///
    /// CALL[] (0x2B)
    ///
    /// Pops: f (function number)
    pub(super) fn op_call(&mut self) -> OpResult {
        let f = self.value_stack.pop()?;
        self.call(DefinitionKind::Function, f, 1)
    }

    /// Loop and call function.
    ///
    /// LOOPCALL[] (0x2A)
    ///
    /// Pops: f (function number), count
    ///
    /// A count of zero or less does nothing. Iterations are charged against
    /// the loop budget before the first call.
    pub(super) fn op_loopcall(&mut self) -> OpResult {
        let f = self.value_stack.pop()?;
        let count = self.value_stack.pop()?;
        if count <= 0 {
            return Ok(());
        }
        self.loop_budget.doing_loop_call(count as usize)?;
        self.call(DefinitionKind::Function, f, count as u32)
    }

    /// Instruction definition.
    ///
    /// IDEF[] (0x89)
    ///
    /// Pops: opcode
    ///
    /// Like FDEF, but the body runs whenever the interpreter meets an
    /// opcode that it does not otherwise handle.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#instruction-definition>
    pub(super) fn op_idef(&mut self) -> OpResult {
        let opcode = self.value_stack.pop()?;
        self.define(DefinitionKind::Instruction, opcode)
    }

    /// Runs the instruction definition for an opcode without built in
    /// behavior.
    pub(super) fn op_unknown(&mut self, opcode: Opcode) -> OpResult {
        match self.call(DefinitionKind::Instruction, opcode.to_u8() as i32, 1) {
            Err(HintErrorKind::InvalidDefinition(_)) => Err(HintErrorKind::UnhandledOpcode(opcode)),
            result => result,
        }
    }

    fn define(&mut self, kind: DefinitionKind, key: i32) -> OpResult {
        if self.program.initial == Program::Glyph {
            return Err(HintErrorKind::DefinitionInGlyphProgram);
        }
        let defs = match kind {
            DefinitionKind::Function => &mut self.definitions.functions,
            DefinitionKind::Instruction => &mut self.definitions.instructions,
        };
        let def = defs.allocate(key)?;
        let start = self.program.decoder.pc;
        let result = loop {
            let ins = match self.program.decoder.next() {
                Ok(ins) => ins,
                Err(e) => break Err(e),
            };
            match ins.opcode {
                Opcode::FDEF | Opcode::IDEF => break Err(HintErrorKind::NestedDefinition),
                Opcode::ENDF => {
                    let range = start..ins.pc + 1;
                    if self.graphics.is_pedantic && range.len() > MAX_DEFINITION_SIZE {
                        break Err(HintErrorKind::DefinitionTooLarge);
                    }
                    break Ok(range);
                }
                _ => {}
            }
        };
        match result {
            Ok(range) => {
                *def = Definition::new(self.program.current, range, key);
                Ok(())
            }
            Err(e) => {
                *def = Definition::default();
                Err(e)
            }
        }
    }

    fn call(&mut self, kind: DefinitionKind, key: i32, count: u32) -> OpResult {
        let defs = match kind {
            DefinitionKind::Function => &self.definitions.functions,
            DefinitionKind::Instruction => &self.definitions.instructions,
        };
        let def = *defs.get(key)?;
        self.program.enter(def, count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        super::{code::Program, error::HintingError},
        tests::MockEngine,
        HintErrorKind,
    };

    // PUSHB[1] 1 0, FDEF, PUSHB[0] 2, ADD, ENDF,
    // FDEF, PUSHB[0] 0, CALL, PUSHB[1] 5 0, LOOPCALL, NEG, ENDF
    const FUNCTIONS: &[u8] = &[
        0xB1, 1, 0, 0x2C, 0xB0, 2, 0x60, 0x2D, 0x2C, 0xB0, 0, 0x2B, 0xB1, 5, 0, 0x2A, 0x65, 0x2D,
    ];

    #[test]
    fn define_and_call() {
        let mut mock = MockEngine::new();
        mock.font_code = FUNCTIONS.to_vec();
        // PUSHB[1] 10 1, CALL
        mock.glyph_code = vec![0xB1, 10, 1, 0x2B];
        let mut engine = mock.engine();
        engine.run_program(Program::Font, false).unwrap();
        assert!(engine.stack().is_empty());
        engine.run_program(Program::Glyph, false).unwrap();
        // 10 + 2 + 5 * 2, negated
        assert_eq!(engine.stack(), [-22]);
    }

    #[test]
    fn loopcall_zero_is_noop() {
        let mut mock = MockEngine::new();
        mock.font_code = FUNCTIONS.to_vec();
        // PUSHB[2] 7 0 0, LOOPCALL
        mock.glyph_code = vec![0xB2, 7, 0, 0, 0x2A];
        let mut engine = mock.engine();
        engine.run_program(Program::Font, false).unwrap();
        engine.run_program(Program::Glyph, false).unwrap();
        assert_eq!(engine.stack(), [7]);
    }

    #[test]
    fn loopcall_is_budgeted() {
        let mut mock = MockEngine::new();
        mock.font_code = FUNCTIONS.to_vec();
        // PUSHW[1] 1000 0, LOOPCALL
        mock.glyph_code = vec![0xB9, 0x03, 0xE8, 0, 0, 0x2A];
        let mut engine = mock.engine();
        engine.run_program(Program::Font, false).unwrap();
        let error = engine.run_program(Program::Glyph, false).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::ExceededExecutionBudget);
    }

    #[test]
    fn definitions_outside_font_program() {
        let mut mock = MockEngine::new();
        mock.cv_code = vec![0xB0, 3, 0x2C, 0x2D];
        mock.glyph_code = vec![0xB0, 3, 0x2C, 0x2D];
        let mut engine = mock.engine();
        engine.run_program(Program::ControlValue, false).unwrap();
        assert_eq!(
            engine.run_program(Program::Glyph, false).unwrap_err().kind,
            HintErrorKind::DefinitionInGlyphProgram
        );
    }

    #[test]
    fn malformed_definitions() {
        let mut mock = MockEngine::new();
        // PUSHB[1] 1 0, FDEF, FDEF, ENDF
        mock.font_code = vec![0xB1, 1, 0, 0x2C, 0x2C, 0x2D];
        let mut engine = mock.engine();
        assert_eq!(
            engine.run_program(Program::Font, false).unwrap_err().kind,
            HintErrorKind::NestedDefinition
        );
        drop(engine);
        // PUSHB[0] 0, FDEF, DUP
        mock.font_code = vec![0xB0, 0, 0x2C, 0x20];
        let mut engine = mock.engine();
        assert_eq!(
            engine.run_program(Program::Font, false).unwrap_err().kind,
            HintErrorKind::UnexpectedEndOfBytecode
        );
    }

    #[test]
    fn missing_function() {
        let mut mock = MockEngine::new();
        mock.glyph_code = vec![0xB0, 9, 0x2B];
        let mut engine = mock.engine();
        let error = engine.run_program(Program::Glyph, false).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::InvalidDefinition(9));
        assert!(matches!(
            HintingError::from(error),
            HintingError::IndexOutOfRange(_)
        ));
    }

    #[test]
    fn instruction_definition() {
        let mut mock = MockEngine::new();
        // PUSHB[0] 0x91, IDEF, PUSHB[0] 42, ENDF
        mock.font_code = vec![0xB0, 0x91, 0x89, 0xB0, 42, 0x2D];
        // 0x91, 0x91
        mock.glyph_code = vec![0x91, 0x91];
        let mut engine = mock.engine();
        engine.run_program(Program::Font, false).unwrap();
        engine.run_program(Program::Glyph, false).unwrap();
        assert_eq!(engine.stack(), [42, 42]);
    }

    #[test]
    fn unbounded_recursion() {
        let mut mock = MockEngine::new();
        // PUSHB[0] 0, FDEF, PUSHB[0] 0, CALL, ENDF
        mock.font_code = vec![0xB0, 0, 0x2C, 0xB0, 0, 0x2B, 0x2D];
        mock.glyph_code = vec![0xB0, 0, 0x2B];
        let mut engine = mock.engine();
        engine.run_program(Program::Font, false).unwrap();
        let error = engine.run_program(Program::Glyph, false).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::CallStackOverflow);
    }

    #[test]
    fn pedantic_size_limit() {
        let mut mock = MockEngine::new();
        let mut code = vec![0xB0, 0, 0x2C];
        code.extend(core::iter::repeat(0x20).take(u16::MAX as usize));
        code.push(0x2D);
        mock.font_code = code;
        let mut engine = mock.engine();
        engine.max_instructions = usize::MAX;
        engine.run_program(Program::Font, false).unwrap();
        assert_eq!(
            engine.run_program(Program::Font, true).unwrap_err().kind,
            HintErrorKind::DefinitionTooLarge
        );
    }
}
