//! Storage area.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-storage-area>

use super::{super::cow_slice::CowSlice, Engine, HintErrorKind, OpResult};

/// Storage area for the interpreter.
///
/// Sized by `maxStorage` in `maxp`. Glyph programs see the values left by
/// the control value program and write to a private copy.
pub struct Storage<'a>(CowSlice<'a>);

impl Storage<'_> {
    pub fn get(&self, index: usize) -> Result<i32, HintErrorKind> {
        self.0
            .get(index)
            .ok_or(HintErrorKind::InvalidStorageIndex(index))
    }

    pub fn set(&mut self, index: usize, value: i32) -> OpResult {
        self.0
            .set(index, value)
            .ok_or(HintErrorKind::InvalidStorageIndex(index))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> From<CowSlice<'a>> for Storage<'a> {
    fn from(value: CowSlice<'a>) -> Self {
        Self(value)
    }
}

impl Engine<'_> {
    /// Read store.
    ///
    /// RS[] (0x43)
    ///
    /// Pops: location
    /// Pushes: the value stored at location
    pub(super) fn op_rs(&mut self) -> OpResult {
        let location = self.value_stack.pop_usize()?;
        let value = self.storage.get(location)?;
        self.value_stack.push(value)
    }

    /// Write store.
    ///
    /// WS[] (0x42)
    ///
    /// Pops: value, location
    pub(super) fn op_ws(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let location = self.value_stack.pop_usize()?;
        self.storage.set(location, value)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{tests::MockEngine, HintErrorKind};

    #[test]
    fn write_then_read() {
        let mut mock = MockEngine::new();
        let mut engine = mock.engine();
        assert_eq!(engine.storage.len(), 32);
        for (location, value) in [(0, -7), (31, 1 << 20), (5, 64)] {
            engine.push_all(&[location, value]);
            engine.op_ws().unwrap();
        }
        for (location, value) in [(5, 64), (0, -7), (31, 1 << 20), (1, 0)] {
            engine.push_all(&[location]);
            engine.op_rs().unwrap();
            assert_eq!(engine.value_stack.pop(), Ok(value));
        }
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut mock = MockEngine::new();
        let mut engine = mock.engine();
        engine.push_all(&[32, 1]);
        assert_eq!(engine.op_ws(), Err(HintErrorKind::InvalidStorageIndex(32)));
        engine.push_all(&[-1]);
        assert_eq!(
            engine.op_rs(),
            Err(HintErrorKind::InvalidStorageIndex(u32::MAX as usize))
        );
    }
}
