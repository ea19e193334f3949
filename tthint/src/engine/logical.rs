//! Logical functions.
//!
//! Comparisons push 1 for true and 0 for false.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#logical-functions>

use super::{Engine, OpResult};

impl Engine<'_> {
    /// LT[] (0x50): pops e2, e1 and pushes e1 < e2.
    pub(super) fn op_lt(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok((a < b) as i32))
    }

    /// LTEQ[] (0x51)
    pub(super) fn op_lteq(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok((a <= b) as i32))
    }

    /// GT[] (0x52)
    pub(super) fn op_gt(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok((a > b) as i32))
    }

    /// GTEQ[] (0x53)
    pub(super) fn op_gteq(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok((a >= b) as i32))
    }

    /// EQ[] (0x54)
    pub(super) fn op_eq(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok((a == b) as i32))
    }

    /// NEQ[] (0x55)
    pub(super) fn op_neq(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok((a != b) as i32))
    }

    /// Odd.
    ///
    /// ODD[] (0x56)
    ///
    /// Pops: e1
    /// Pushes: 1 if e1, rounded with the current round state, is an odd
    /// number of pixels
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#odd>
    pub(super) fn op_odd(&mut self) -> OpResult {
        let e1 = self.value_stack.pop()?;
        let rounded = self.graphics.round(e1, 3);
        self.value_stack.push((rounded & 127 == 64) as i32)
    }

    /// Even.
    ///
    /// EVEN[] (0x57)
    ///
    /// Pops: e1
    /// Pushes: 1 if e1, rounded with the current round state, is an even
    /// number of pixels
    pub(super) fn op_even(&mut self) -> OpResult {
        let e1 = self.value_stack.pop()?;
        let rounded = self.graphics.round(e1, 3);
        self.value_stack.push((rounded & 127 == 0) as i32)
    }

    /// AND[] (0x5A)
    pub(super) fn op_and(&mut self) -> OpResult {
        self.value_stack
            .apply_binary(|a, b| Ok((a != 0 && b != 0) as i32))
    }

    /// OR[] (0x5B)
    pub(super) fn op_or(&mut self) -> OpResult {
        self.value_stack
            .apply_binary(|a, b| Ok((a != 0 || b != 0) as i32))
    }

    /// NOT[] (0x5C)
    pub(super) fn op_not(&mut self) -> OpResult {
        self.value_stack.apply_unary(|e| Ok((e == 0) as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{super::graphics::RoundMode, tests::MockEngine, Engine};

    fn binary(engine: &mut Engine, opcode: u8, a: i32, b: i32) -> i32 {
        engine.push_all(&[a, b]);
        engine.exec(opcode).unwrap();
        engine.value_stack.pop().unwrap()
    }

    #[test]
    fn comparisons() {
        let mut mock = MockEngine::new();
        let mut engine = mock.engine();
        // LT, LTEQ, GT, GTEQ, EQ, NEQ
        let cases = [
            (0x50, [1, 0, 0]),
            (0x51, [1, 1, 0]),
            (0x52, [0, 0, 1]),
            (0x53, [0, 1, 1]),
            (0x54, [0, 1, 0]),
            (0x55, [1, 0, 1]),
        ];
        for (opcode, expected) in cases {
            // (less, equal, greater)
            let results = [
                binary(&mut engine, opcode, -5, 3),
                binary(&mut engine, opcode, 3, 3),
                binary(&mut engine, opcode, 4, 3),
            ];
            assert_eq!(results, expected, "{opcode:#x}");
        }
    }

    #[test]
    fn boolean_ops() {
        let mut mock = MockEngine::new();
        let mut engine = mock.engine();
        // AND, OR
        assert_eq!(binary(&mut engine, 0x5A, 5, -1), 1);
        assert_eq!(binary(&mut engine, 0x5A, 5, 0), 0);
        assert_eq!(binary(&mut engine, 0x5B, 0, 0), 0);
        assert_eq!(binary(&mut engine, 0x5B, 0, 9), 1);
        engine.push_all(&[0]);
        engine.op_not().unwrap();
        engine.op_not().unwrap();
        assert_eq!(engine.stack(), [0]);
    }

    #[test]
    fn parity_uses_round_state() {
        let mut mock = MockEngine::new();
        let mut engine = mock.engine();
        // 1.5 pixels rounds to 2 with the grid and to 1 when rounding down
        for (mode, odd) in [(RoundMode::Grid, 0), (RoundMode::DownToGrid, 1)] {
            engine.graphics.round_state.mode = mode;
            engine.push_all(&[96]);
            engine.op_odd().unwrap();
            engine.push_all(&[96]);
            engine.op_even().unwrap();
            assert_eq!(engine.stack(), [odd, 1 - odd]);
            engine.op_clear().unwrap();
        }
    }
}
