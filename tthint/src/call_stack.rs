//! Tracking of function and instruction definition invocations.

use super::{code::Program, definition::Definition, error::HintErrorKind};

/// Maximum nesting depth of calls.
const CALL_STACK_SIZE: usize = 32;

/// Where to resume once a definition finishes, and how many more times it
/// should run first.
#[derive(Copy, Clone, Default, Debug)]
pub struct CallRecord {
    pub caller_program: Program,
    pub return_pc: usize,
    pub remaining: u32,
    pub definition: Definition,
}

#[derive(Default)]
pub struct CallStack {
    records: [CallRecord; CALL_STACK_SIZE],
    top: usize,
}

impl CallStack {
    pub fn len(&self) -> usize {
        self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    pub fn clear(&mut self) {
        self.top = 0;
    }

    pub fn push(&mut self, record: CallRecord) -> Result<(), HintErrorKind> {
        *self
            .records
            .get_mut(self.top)
            .ok_or(HintErrorKind::CallStackOverflow)? = record;
        self.top += 1;
        Ok(())
    }

    pub fn peek(&self) -> Option<&CallRecord> {
        self.records.get(self.top.checked_sub(1)?)
    }

    pub fn pop(&mut self) -> Result<CallRecord, HintErrorKind> {
        let record = *self.peek().ok_or(HintErrorKind::CallStackUnderflow)?;
        self.top -= 1;
        Ok(record)
    }
}
