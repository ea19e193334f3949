//! Arithmetic and math instructions.
//!
//! Operands and results are 26.6 values. Addition, subtraction and
//! negation wrap; multiplication and division round through a 64-bit
//! intermediate and saturate.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#arithmetic-and-math-instructions>

use super::{super::math, Engine, HintErrorKind, OpResult};

impl Engine<'_> {
    /// ADD[] (0x60): pops n2, n1 and pushes n1 + n2.
    pub(super) fn op_add(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok(a.wrapping_add(b)))
    }

    /// SUB[] (0x61): pops n2, n1 and pushes n1 - n2.
    pub(super) fn op_sub(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok(a.wrapping_sub(b)))
    }

    /// Divide.
    ///
    /// DIV[] (0x62)
    ///
    /// Pops: n2: divisor, n1: dividend
    /// Pushes: (n1 * 64) / n2, truncated
    ///
    /// A zero divisor is an error.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#divide>
    pub(super) fn op_div(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| {
            if b == 0 {
                Err(HintErrorKind::DivideByZero)
            } else {
                Ok(math::mul_div_no_round(a, 64, b))
            }
        })
    }

    /// Multiply.
    ///
    /// MUL[] (0x63)
    ///
    /// Pops: n2, n1
    /// Pushes: (n1 * n2) / 64, rounded
    pub(super) fn op_mul(&mut self) -> OpResult {
        self.value_stack
            .apply_binary(|a, b| Ok(math::mul_div(a, b, 64)))
    }

    /// ABS[] (0x64)
    pub(super) fn op_abs(&mut self) -> OpResult {
        self.value_stack.apply_unary(|n| Ok(n.wrapping_abs()))
    }

    /// NEG[] (0x65)
    pub(super) fn op_neg(&mut self) -> OpResult {
        self.value_stack.apply_unary(|n| Ok(n.wrapping_neg()))
    }

    /// FLOOR[] (0x66): largest integer pixel value not greater than n.
    pub(super) fn op_floor(&mut self) -> OpResult {
        self.value_stack.apply_unary(|n| Ok(math::floor(n)))
    }

    /// CEILING[] (0x67): smallest integer pixel value not less than n.
    pub(super) fn op_ceiling(&mut self) -> OpResult {
        self.value_stack.apply_unary(|n| Ok(math::ceil(n)))
    }

    /// MAX[] (0x8B)
    pub(super) fn op_max(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok(a.max(b)))
    }

    /// MIN[] (0x8C)
    pub(super) fn op_min(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok(a.min(b)))
    }
}
