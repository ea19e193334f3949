//! Managing the control value table.
//!
//! Reads and writes in pixels go through the ratio for the current
//! projection vector so that non-square pixel sizes share one table.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-control-value-table>

use super::{Engine, OpResult};

impl Engine<'_> {
    /// Write control value table in pixel units.
    ///
    /// WCVTP[] (0x44)
    ///
    /// Pops: value (26.6), location
    pub(super) fn op_wcvtp(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let location = self.value_stack.pop_usize()?;
        let ratio = self.cvt_ratio();
        self.cvt.write_pixels(location, value, ratio)
    }

    /// Write control value table in font units.
    ///
    /// WCVTF[] (0x70)
    ///
    /// Pops: value (font units), location
    ///
    /// The value is scaled to pixels with the current size.
    pub(super) fn op_wcvtf(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let location = self.value_stack.pop_usize()?;
        self.cvt
            .write_funits(location, value, self.metrics.scale())
    }

    /// Read control value table entry.
    ///
    /// RCVT[] (0x45)
    ///
    /// Pops: location
    /// Pushes: value (26.6)
    pub(super) fn op_rcvt(&mut self) -> OpResult {
        let location = self.value_stack.pop_usize()?;
        let value = self.cvt.read(location, self.cvt_ratio())?;
        self.value_stack.push(value)
    }
}
