//! Stack manipulation and pushing inline data.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-stack>

use super::{super::code::InlineOperands, Engine, OpResult};

impl Engine<'_> {
    /// DUP[] (0x20): duplicates the top element.
    pub(super) fn op_dup(&mut self) -> OpResult {
        self.value_stack.dup()
    }

    /// POP[] (0x21): discards the top element.
    pub(super) fn op_pop(&mut self) -> OpResult {
        self.value_stack.pop().map(|_| ())
    }

    /// CLEAR[] (0x22): discards every element.
    pub(super) fn op_clear(&mut self) -> OpResult {
        self.value_stack.clear();
        Ok(())
    }

    /// SWAP[] (0x23): exchanges the top two elements.
    pub(super) fn op_swap(&mut self) -> OpResult {
        self.value_stack.swap()
    }

    /// DEPTH[] (0x24): pushes the number of elements on the stack.
    pub(super) fn op_depth(&mut self) -> OpResult {
        let depth = self.value_stack.len() as i32;
        self.value_stack.push(depth)
    }

    /// Copy the indexed element to the top of the stack.
    ///
    /// CINDEX[] (0x25)
    ///
    /// Pops: k
    /// Pushes: ek, the k-th element counting from the top (1 based)
    pub(super) fn op_cindex(&mut self) -> OpResult {
        self.value_stack.copy_index()
    }

    /// Move the indexed element to the top of the stack.
    ///
    /// MINDEX[] (0x26)
    ///
    /// Pops: k
    /// Pushes: ek, removed from its original position
    pub(super) fn op_mindex(&mut self) -> OpResult {
        self.value_stack.move_index()
    }

    /// ROLL[] (0x8A): moves the third element to the top.
    pub(super) fn op_roll(&mut self) -> OpResult {
        self.value_stack.roll()
    }

    /// Push data decoded from the instruction stream.
    ///
    /// Covers NPUSHB[] (0x40), NPUSHW[] (0x41), PUSHB[abc] (0xB0 - 0xB7)
    /// and PUSHW[abc] (0xB8 - 0xBF). Words are sign extended and bytes are
    /// not.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#pushing-data-onto-the-interpreter-stack>
    pub(super) fn op_push(&mut self, operands: &InlineOperands) -> OpResult {
        self.value_stack.push_inline_operands(operands)
    }
}
