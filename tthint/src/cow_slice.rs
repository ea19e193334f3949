/// Copy-on-write buffer for the CVT and storage area.
///
/// Glyph programs read the values established by the control value
/// program and only pay for a copy on the first write, which keeps their
/// changes from leaking into the next glyph.
pub struct CowSlice<'a> {
    /// True once `data_mut` holds the live values.
    has_mut: bool,
    data: &'a [i32],
    data_mut: &'a mut [i32],
}

impl<'a> CowSlice<'a> {
    /// Creates a view that reads from `data` until the first write.
    ///
    /// Returns `None` if the buffers differ in length.
    pub fn new(data: &'a [i32], data_mut: &'a mut [i32]) -> Option<Self> {
        (data.len() == data_mut.len()).then_some(Self {
            has_mut: false,
            data,
            data_mut,
        })
    }

    /// Creates a view that reads and writes `data_mut` directly.
    pub fn new_mut(data_mut: &'a mut [i32]) -> Self {
        Self {
            has_mut: true,
            data: &[],
            data_mut,
        }
    }

    pub fn get(&self, index: usize) -> Option<i32> {
        if self.has_mut {
            self.data_mut.get(index).copied()
        } else {
            self.data.get(index).copied()
        }
    }

    pub fn set(&mut self, index: usize, value: i32) -> Option<()> {
        if index >= self.len() {
            return None;
        }
        if !self.has_mut {
            self.data_mut.copy_from_slice(self.data);
            self.has_mut = true;
        }
        *self.data_mut.get_mut(index)? = value;
        Some(())
    }

    pub fn len(&self) -> usize {
        self.data_mut.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
