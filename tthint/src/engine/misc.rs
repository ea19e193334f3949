//! Miscellaneous instructions.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#miscellaneous-instructions>

use super::{super::options::InterpreterVersion, Engine, OpResult};

/// Selector and result bits for `GETINFO`.
pub(crate) mod getinfo {
    pub const VERSION_SELECTOR_BIT: i32 = 1 << 0;
    pub const GLYPH_ROTATED_SELECTOR_BIT: i32 = 1 << 1;
    pub const GLYPH_ROTATED_RESULT_BIT: i32 = 1 << 8;
    pub const GLYPH_STRETCHED_SELECTOR_BIT: i32 = 1 << 2;
    pub const GLYPH_STRETCHED_RESULT_BIT: i32 = 1 << 9;
    pub const FONT_SMOOTHING_SELECTOR_BIT: i32 = 1 << 5;
    pub const FONT_SMOOTHING_RESULT_BIT: i32 = 1 << 12;
    pub const CLEARTYPE_ENABLED_SELECTOR_BIT: i32 = 1 << 6;
    pub const CLEARTYPE_ENABLED_RESULT_BIT: i32 = 1 << 13;
    pub const SUBPIXEL_POSITIONED_SELECTOR_BIT: i32 = 1 << 10;
    pub const SUBPIXEL_POSITIONED_RESULT_BIT: i32 = 1 << 17;
    pub const SYMMETRICAL_SMOOTHING_SELECTOR_BIT: i32 = 1 << 11;
    pub const SYMMETRICAL_SMOOTHING_RESULT_BIT: i32 = 1 << 18;
}

impl Engine<'_> {
    /// Get information.
    ///
    /// GETINFO[] (0x88)
    ///
    /// Pops: selector
    /// Pushes: result
    ///
    /// Each set bit in the selector requests one piece of information about
    /// the rasterizer or the current glyph. Version 35 reports grayscale
    /// smoothing. Version 40 reports ClearType hinting with subpixel
    /// positioning and symmetrical smoothing instead; vertical LCD and
    /// ClearType over grayscale are never reported. Variation fonts are not
    /// supported so the variation bit is always clear.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#get-information>
    pub(super) fn op_getinfo(&mut self) -> OpResult {
        use getinfo::*;
        let selector = self.value_stack.pop()?;
        let is_v40 = self.version == InterpreterVersion::V40;
        let mut result = 0;
        if selector & VERSION_SELECTOR_BIT != 0 {
            result = self.version.number();
        }
        if selector & GLYPH_ROTATED_SELECTOR_BIT != 0 && self.metrics.rotated() {
            result |= GLYPH_ROTATED_RESULT_BIT;
        }
        if selector & GLYPH_STRETCHED_SELECTOR_BIT != 0 && self.metrics.stretched() {
            result |= GLYPH_STRETCHED_RESULT_BIT;
        }
        if selector & FONT_SMOOTHING_SELECTOR_BIT != 0 && !is_v40 {
            result |= FONT_SMOOTHING_RESULT_BIT;
        }
        if is_v40 {
            for (selector_bit, result_bit) in [
                (CLEARTYPE_ENABLED_SELECTOR_BIT, CLEARTYPE_ENABLED_RESULT_BIT),
                (
                    SUBPIXEL_POSITIONED_SELECTOR_BIT,
                    SUBPIXEL_POSITIONED_RESULT_BIT,
                ),
                (
                    SYMMETRICAL_SMOOTHING_SELECTOR_BIT,
                    SYMMETRICAL_SMOOTHING_RESULT_BIT,
                ),
            ] {
                if selector & selector_bit != 0 {
                    result |= result_bit;
                }
            }
        }
        self.value_stack.push(result)
    }

    /// DEBUG[] (0x4F): pops and ignores a value.
    pub(super) fn op_debug(&mut self) -> OpResult {
        self.value_stack.pop()?;
        Ok(())
    }

    /// AA[] (0x7F): obsolete adjust angle; pops and ignores a point.
    pub(super) fn op_aa(&mut self) -> OpResult {
        self.value_stack.pop()?;
        Ok(())
    }
}
