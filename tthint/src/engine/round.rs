//! Compensating for the engine characteristics.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#compensating-for-the-engine-characteristics>

use super::{Engine, OpResult};

impl Engine<'_> {
    /// Round value.
    ///
    /// ROUND\[ab\] (0x68 - 0x6B)
    ///
    /// Pops: n1
    /// Pushes: n2
    ///
    /// Applies the compensation for the distance type `ab` and rounds with
    /// the current round state.
    pub(super) fn op_round(&mut self, opcode: u8) -> OpResult {
        let n1 = self.value_stack.pop()?;
        let n2 = self.graphics.round(n1, opcode);
        self.value_stack.push(n2)
    }

    /// No rounding.
    ///
    /// NROUND\[ab\] (0x6C - 0x6F)
    ///
    /// Pops: n1
    /// Pushes: n2
    ///
    /// Applies the compensation for the distance type without rounding. The
    /// sign of the value never changes.
    pub(super) fn op_nround(&mut self, opcode: u8) -> OpResult {
        let n1 = self.value_stack.pop()?;
        let n2 = self.graphics.round_none(n1, opcode);
        self.value_stack.push(n2)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{super::graphics::RoundMode, tests::MockEngine, HintErrorKind};

    #[test]
    fn round_with_state() {
        let mut mock = MockEngine::new();
        let mut engine = mock.engine();
        for (mode, expected) in [
            (RoundMode::Grid, [64, -64, 128]),
            (RoundMode::HalfGrid, [32, -32, 96]),
            (RoundMode::DoubleGrid, [32, -32, 96]),
            (RoundMode::DownToGrid, [0, 0, 64]),
            (RoundMode::UpToGrid, [64, -64, 128]),
            (RoundMode::Off, [33, -33, 100]),
        ] {
            engine.graphics.round_state.mode = mode;
            for value in [33, -33, 100] {
                engine.push_all(&[value]);
                engine.exec(0x68).unwrap();
            }
            assert_eq!(engine.stack(), expected, "{mode:?}");
            engine.op_clear().unwrap();
        }
    }

    #[test]
    fn no_round_keeps_value() {
        let mut mock = MockEngine::new();
        let mut engine = mock.engine();
        engine.push_all(&[33]);
        engine.exec(0x6C).unwrap();
        assert_eq!(engine.stack(), [33]);
        engine.op_clear().unwrap();
        assert_eq!(engine.exec(0x6F), Err(HintErrorKind::ValueStackUnderflow));
    }
}
