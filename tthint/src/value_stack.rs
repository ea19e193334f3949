//! Operand stack for the interpreter.

use super::{code::InlineOperands, error::HintErrorKind};

use HintErrorKind::{ValueStackOverflow, ValueStackUnderflow};

/// Operand stack backed by a buffer owned by the execution context.
///
/// The capacity is fixed for the duration of a program run and comes from
/// the `maxStackElements` field of `maxp`.
pub struct ValueStack<'a> {
    values: &'a mut [i32],
    top: usize,
}

impl<'a> ValueStack<'a> {
    pub fn new(values: &'a mut [i32]) -> Self {
        Self { values, top: 0 }
    }

    /// Returns the depth of the stack.
    pub fn len(&self) -> usize {
        self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    pub fn values(&self) -> &[i32] {
        &self.values[..self.top]
    }

    pub fn push(&mut self, value: i32) -> Result<(), HintErrorKind> {
        *self.values.get_mut(self.top).ok_or(ValueStackOverflow)? = value;
        self.top += 1;
        Ok(())
    }

    /// Pushes operands decoded from the instruction stream.
    ///
    /// Implements `PUSHB`, `PUSHW`, `NPUSHB` and `NPUSHW`.
    pub fn push_inline_operands(
        &mut self,
        operands: &InlineOperands,
    ) -> Result<(), HintErrorKind> {
        let count = operands.len();
        let base = self.top;
        let slots = self
            .values
            .get_mut(base..base + count)
            .ok_or(ValueStackOverflow)?;
        for (slot, value) in slots.iter_mut().zip(operands.values()) {
            *slot = value;
        }
        self.top += count;
        Ok(())
    }

    pub fn peek(&self) -> Option<i32> {
        self.top
            .checked_sub(1)
            .and_then(|ix| self.values.get(ix).copied())
    }

    pub fn pop(&mut self) -> Result<i32, HintErrorKind> {
        let value = self.peek().ok_or(ValueStackUnderflow)?;
        self.top -= 1;
        Ok(value)
    }

    /// Pops a value that will be used as an index.
    ///
    /// Negative values become huge indices that fail the subsequent bounds
    /// check.
    pub fn pop_usize(&mut self) -> Result<usize, HintErrorKind> {
        Ok(self.pop()? as u32 as usize)
    }

    /// Pops `a` and pushes `op(a)`.
    pub fn apply_unary(
        &mut self,
        mut op: impl FnMut(i32) -> Result<i32, HintErrorKind>,
    ) -> Result<(), HintErrorKind> {
        let a = self.pop()?;
        self.push(op(a)?)
    }

    /// Pops `b` then `a` and pushes `op(a, b)`.
    pub fn apply_binary(
        &mut self,
        mut op: impl FnMut(i32, i32) -> Result<i32, HintErrorKind>,
    ) -> Result<(), HintErrorKind> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(op(a, b)?)
    }

    pub fn clear(&mut self) {
        self.top = 0;
    }

    pub fn dup(&mut self) -> Result<(), HintErrorKind> {
        let value = self.peek().ok_or(ValueStackUnderflow)?;
        self.push(value)
    }

    pub fn swap(&mut self) -> Result<(), HintErrorKind> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.push(a)?;
        self.push(b)
    }

    /// Replaces the top element `k` with a copy of the `k`th element.
    ///
    /// Implements `CINDEX`.
    pub fn copy_index(&mut self) -> Result<(), HintErrorKind> {
        let (top_ix, element_ix) = self.indexed_element()?;
        self.values[top_ix] = self.values[element_ix];
        Ok(())
    }

    /// Replaces the top element `k` by moving the `k`th element to the top.
    ///
    /// Implements `MINDEX`.
    pub fn move_index(&mut self) -> Result<(), HintErrorKind> {
        let (top_ix, element_ix) = self.indexed_element()?;
        let value = self.values[element_ix];
        self.values.copy_within(element_ix + 1..top_ix, element_ix);
        self.values[top_ix - 1] = value;
        self.top -= 1;
        Ok(())
    }

    /// Resolves the 1-based depth stored on top of the stack.
    fn indexed_element(&self) -> Result<(usize, usize), HintErrorKind> {
        let top_ix = self.top.checked_sub(1).ok_or(ValueStackUnderflow)?;
        let depth = self.values[top_ix];
        if depth <= 0 {
            return Err(HintErrorKind::InvalidStackValue(depth));
        }
        let element_ix = top_ix
            .checked_sub(depth as usize)
            .ok_or(ValueStackUnderflow)?;
        Ok((top_ix, element_ix))
    }

    /// Moves the third element to the top.
    ///
    /// Implements `ROLL`.
    pub fn roll(&mut self) -> Result<(), HintErrorKind> {
        let a = self.pop()?;
        let b = self.pop()?;
        let c = self.pop()?;
        self.push(b)?;
        self.push(a)?;
        self.push(c)
    }
}

#[cfg(test)]
mod tests {
    use super::{HintErrorKind, ValueStack};

    // Macros because a function can't return a stack borrowing a temporary.
    macro_rules! make_stack {
        ($values:expr) => {
            ValueStack {
                values: $values,
                top: $values.len(),
            }
        };
    }
    macro_rules! make_empty_stack {
        ($values:expr) => {
            ValueStack {
                values: $values,
                top: 0,
            }
        };
    }

    #[test]
    fn push_until_full() {
        let mut stack = make_empty_stack!(&mut [0; 4]);
        for i in 0..4 {
            stack.push(i).unwrap();
            assert_eq!(stack.peek(), Some(i));
        }
        assert_eq!(stack.push(0), Err(HintErrorKind::ValueStackOverflow));
    }

    #[test]
    fn push_inline_operands() {
        use crate::code::Decoder;
        // NPUSHW 3: -5, 2845, i16::MIN
        let bytecode = [0x41, 3, 0xFF, 0xFB, 0x0B, 0x1D, 0x80, 0x00];
        let ins = Decoder::new(&bytecode, 0).next().unwrap();
        let mut stack = make_empty_stack!(&mut [0; 8]);
        stack.push_inline_operands(&ins.inline_operands).unwrap();
        assert_eq!(stack.values(), &[-5, 2845, i16::MIN as i32]);
        let mut small = make_empty_stack!(&mut [0; 2]);
        assert_eq!(
            small.push_inline_operands(&ins.inline_operands),
            Err(HintErrorKind::ValueStackOverflow)
        );
        assert!(small.is_empty());
    }

    #[test]
    fn pop_until_empty() {
        let mut stack = make_stack!(&mut [0, 1, 2, 3]);
        for i in (0..4).rev() {
            assert_eq!(stack.pop(), Ok(i));
        }
        assert_eq!(stack.pop(), Err(HintErrorKind::ValueStackUnderflow));
    }

    #[test]
    fn dup_swap_roll() {
        let mut stack = make_stack!(&mut [1, 2, 3, 0]);
        stack.pop().unwrap();
        stack.dup().unwrap();
        assert_eq!(stack.values(), &[1, 2, 3, 3]);
        stack.pop().unwrap();
        stack.swap().unwrap();
        assert_eq!(stack.values(), &[1, 3, 2]);
        stack.roll().unwrap();
        assert_eq!(stack.values(), &[3, 2, 1]);
    }

    #[test]
    fn copy_index() {
        let mut stack = make_stack!(&mut [4, 10, 2, 1, 3]);
        stack.copy_index().unwrap();
        assert_eq!(stack.values(), &[4, 10, 2, 1, 10]);
    }

    #[test]
    fn move_index() {
        let mut stack = make_stack!(&mut [4, 10, 2, 1, 3]);
        stack.move_index().unwrap();
        assert_eq!(stack.values(), &[4, 2, 1, 10]);
    }

    #[test]
    fn bad_index_depth() {
        let mut stack = make_stack!(&mut [4, 10, 9]);
        assert_eq!(stack.copy_index(), Err(HintErrorKind::ValueStackUnderflow));
        let mut stack = make_stack!(&mut [4, 0]);
        assert_eq!(stack.move_index(), Err(HintErrorKind::InvalidStackValue(0)));
    }

    #[test]
    fn unary_and_binary() {
        let mut stack = make_empty_stack!(&mut [0; 32]);
        for value in 1..=5 {
            stack.push(value).unwrap();
        }
        stack.apply_binary(|a, b| Ok(a + b)).unwrap();
        assert_eq!(stack.peek(), Some(9));
        stack.apply_binary(|a, b| Ok(a - b)).unwrap();
        assert_eq!(stack.peek(), Some(-6));
        stack.apply_unary(|a| Ok(-a)).unwrap();
        assert_eq!(stack.values(), &[1, 2, 6]);
    }
}
