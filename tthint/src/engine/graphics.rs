//! Managing the graphics state.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-the-graphics-state>

use read_fonts::types::Point;

use super::{
    super::{
        code::Program,
        graphics::{RoundMode, GRID_PERIOD, GRID_PERIOD_45},
        math,
        options::InterpreterVersion,
        zone::ZonePointer,
    },
    Engine, HintErrorKind, OpResult,
};

impl Engine<'_> {
    /// Set freedom and projection vectors to coordinate axis.
    ///
    /// SVTCA\[a\] (0x00 - 0x01), SPVTCA\[a\] (0x02 - 0x03) and
    /// SFVTCA\[a\] (0x04 - 0x05)
    ///
    /// Bit 0 of the opcode selects the x axis when set and the y axis
    /// otherwise. Opcodes below 4 set the projection vector (and the dual
    /// projection vector) and opcodes with bit 1 clear set the freedom
    /// vector.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#set-freedom-and-projection-vectors-to-coordinate-axis>
    pub(super) fn op_svtca(&mut self, opcode: u8) -> OpResult {
        let x = (opcode as i32 & 1) << 14;
        let axis = Point::new(x, x ^ math::ONE_2_14);
        let gs = &mut self.graphics;
        if opcode < 4 {
            gs.proj_vector = axis;
            gs.dual_proj_vector = axis;
        }
        if opcode & 2 == 0 {
            gs.freedom_vector = axis;
        }
        gs.update_projection_state();
        Ok(())
    }

    /// Set projection or freedom vector to line.
    ///
    /// SPVTL\[a\] (0x06 - 0x07) and SFVTL\[a\] (0x08 - 0x09)
    ///
    /// Pops: p1, p2
    ///
    /// The vector runs from p1 (in zp2) to p2 (in zp1), rotated 90 degrees
    /// counter-clockwise when bit 0 of the opcode is set.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#set-projection_vector-to-line>
    pub(super) fn op_svtl(&mut self, opcode: u8) -> OpResult {
        let p1_ix = self.pop_point()?;
        let p2_ix = self.pop_point()?;
        let p2 = self.graphics.zp1().point(p2_ix)?;
        let p1 = self.graphics.zp2().point(p1_ix)?;
        let vector = line_vector(p2, p1, opcode & 1 != 0);
        if opcode < 8 {
            self.graphics.proj_vector = vector;
            self.graphics.dual_proj_vector = vector;
        } else {
            self.graphics.freedom_vector = vector;
        }
        self.graphics.update_projection_state();
        Ok(())
    }

    /// Set dual projection vector to line.
    ///
    /// SDPVTL\[a\] (0x86 - 0x87)
    ///
    /// Pops: p1, p2
    ///
    /// Like `SPVTL`, but the dual projection vector is computed from the
    /// original outline while the projection vector comes from the current
    /// one.
    pub(super) fn op_sdpvtl(&mut self, opcode: u8) -> OpResult {
        let p1_ix = self.pop_point()?;
        let p2_ix = self.pop_point()?;
        let rotate = opcode & 1 != 0;
        let (zp1, zp2) = (self.graphics.zp1(), self.graphics.zp2());
        let dual = line_vector(zp1.original(p2_ix)?, zp2.original(p1_ix)?, rotate);
        let proj = line_vector(zp1.point(p2_ix)?, zp2.point(p1_ix)?, rotate);
        self.graphics.dual_proj_vector = dual;
        self.graphics.proj_vector = proj;
        self.graphics.update_projection_state();
        Ok(())
    }

    /// SPVFS[] (0x0A): sets the projection vector from two 2.14 values on
    /// the stack.
    pub(super) fn op_spvfs(&mut self) -> OpResult {
        let Point { x, y } = self.pop_vector()?;
        // The zero vector leaves the state unchanged
        if (x, y) != (0, 0) {
            let vector = math::normalize14(x, y);
            self.graphics.proj_vector = vector;
            self.graphics.dual_proj_vector = vector;
            self.graphics.update_projection_state();
        }
        Ok(())
    }

    /// SFVFS[] (0x0B): sets the freedom vector from two 2.14 values on the
    /// stack.
    pub(super) fn op_sfvfs(&mut self) -> OpResult {
        let Point { x, y } = self.pop_vector()?;
        if (x, y) != (0, 0) {
            self.graphics.freedom_vector = math::normalize14(x, y);
            self.graphics.update_projection_state();
        }
        Ok(())
    }

    /// GPV[] (0x0C): pushes the x and y components of the projection
    /// vector.
    pub(super) fn op_gpv(&mut self) -> OpResult {
        let vector = self.graphics.proj_vector;
        self.value_stack.push(vector.x)?;
        self.value_stack.push(vector.y)
    }

    /// GFV[] (0x0D)
    pub(super) fn op_gfv(&mut self) -> OpResult {
        let vector = self.graphics.freedom_vector;
        self.value_stack.push(vector.x)?;
        self.value_stack.push(vector.y)
    }

    /// SFVTPV[] (0x0E)
    pub(super) fn op_sfvtpv(&mut self) -> OpResult {
        self.graphics.freedom_vector = self.graphics.proj_vector;
        self.graphics.update_projection_state();
        Ok(())
    }

    /// SRP0[] (0x10)
    pub(super) fn op_srp0(&mut self) -> OpResult {
        self.graphics.rp0 = self.pop_point()?;
        Ok(())
    }

    /// SRP1[] (0x11)
    pub(super) fn op_srp1(&mut self) -> OpResult {
        self.graphics.rp1 = self.pop_point()?;
        Ok(())
    }

    /// SRP2[] (0x12)
    pub(super) fn op_srp2(&mut self) -> OpResult {
        self.graphics.rp2 = self.pop_point()?;
        Ok(())
    }

    /// SZP0[] (0x13): pops a zone number (0 for twilight, 1 for glyph).
    pub(super) fn op_szp0(&mut self) -> OpResult {
        self.graphics.zp0 = self.pop_zone()?;
        Ok(())
    }

    /// SZP1[] (0x14)
    pub(super) fn op_szp1(&mut self) -> OpResult {
        self.graphics.zp1 = self.pop_zone()?;
        Ok(())
    }

    /// SZP2[] (0x15)
    pub(super) fn op_szp2(&mut self) -> OpResult {
        self.graphics.zp2 = self.pop_zone()?;
        Ok(())
    }

    /// SZPS[] (0x16): sets all three zone pointers.
    pub(super) fn op_szps(&mut self) -> OpResult {
        let zone = self.pop_zone()?;
        self.graphics.zp0 = zone;
        self.graphics.zp1 = zone;
        self.graphics.zp2 = zone;
        Ok(())
    }

    /// Set loop variable.
    ///
    /// SLOOP[] (0x17)
    ///
    /// Pops: n
    ///
    /// Negative counts are an error and large counts are clamped to
    /// 0xFFFF. A count of zero makes the next looping instruction a no-op.
    pub(super) fn op_sloop(&mut self) -> OpResult {
        let count = self.value_stack.pop()?;
        if count < 0 {
            return Err(HintErrorKind::NegativeLoopCounter);
        }
        self.graphics.loop_counter = count.min(0xFFFF) as u32;
        Ok(())
    }

    /// RTG[] (0x18)
    pub(super) fn op_rtg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::Grid)
    }

    /// RTHG[] (0x19)
    pub(super) fn op_rthg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::HalfGrid)
    }

    /// RTDG[] (0x3D)
    pub(super) fn op_rtdg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::DoubleGrid)
    }

    /// RDTG[] (0x7D)
    pub(super) fn op_rdtg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::DownToGrid)
    }

    /// RUTG[] (0x7C)
    pub(super) fn op_rutg(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::UpToGrid)
    }

    /// ROFF[] (0x7A)
    pub(super) fn op_roff(&mut self) -> OpResult {
        self.set_round_mode(RoundMode::Off)
    }

    /// Super round.
    ///
    /// SROUND[] (0x76)
    ///
    /// Pops: n, a packed description of period (bits 6-7), phase (bits 4-5)
    /// and threshold (bits 0-3) for a grid of one pixel
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#super-round>
    pub(super) fn op_sround(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        let round_state = &mut self.graphics.round_state;
        round_state.set_super(GRID_PERIOD, selector);
        round_state.mode = RoundMode::Super;
        Ok(())
    }

    /// S45ROUND[] (0x77): `SROUND` with a grid period of sqrt(2)/2 pixels.
    pub(super) fn op_s45round(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        let round_state = &mut self.graphics.round_state;
        round_state.set_super(GRID_PERIOD_45, selector);
        round_state.mode = RoundMode::Super45;
        Ok(())
    }

    /// SMD[] (0x1A): sets the minimum distance.
    pub(super) fn op_smd(&mut self) -> OpResult {
        self.graphics.min_distance = self.value_stack.pop()?;
        Ok(())
    }

    /// SCVTCI[] (0x1D): sets the control value cut-in.
    pub(super) fn op_scvtci(&mut self) -> OpResult {
        self.graphics.control_value_cutin = self.value_stack.pop()?;
        Ok(())
    }

    /// SSWCI[] (0x1E): sets the single width cut-in.
    pub(super) fn op_sswci(&mut self) -> OpResult {
        self.graphics.single_width_cutin = self.value_stack.pop()?;
        Ok(())
    }

    /// SSW[] (0x1F): sets the single width value from a distance in font
    /// units.
    pub(super) fn op_ssw(&mut self) -> OpResult {
        let funits = self.value_stack.pop()?;
        self.graphics.single_width = math::mul(funits, self.metrics.scale());
        Ok(())
    }

    /// FLIPON[] (0x4D): enables auto flip.
    pub(super) fn op_flipon(&mut self) -> OpResult {
        self.graphics.auto_flip = true;
        Ok(())
    }

    /// FLIPOFF[] (0x4E)
    pub(super) fn op_flipoff(&mut self) -> OpResult {
        self.graphics.auto_flip = false;
        Ok(())
    }

    /// SANGW[] (0x7E): obsolete; pops and ignores the angle weight.
    pub(super) fn op_sangw(&mut self) -> OpResult {
        self.value_stack.pop()?;
        Ok(())
    }

    /// SDB[] (0x5E): sets the delta base.
    pub(super) fn op_sdb(&mut self) -> OpResult {
        self.graphics.delta_base = self.value_stack.pop()? as u16;
        Ok(())
    }

    /// SDS[] (0x5F): sets the delta shift, which must not exceed 6.
    pub(super) fn op_sds(&mut self) -> OpResult {
        let shift = self.value_stack.pop()?;
        if !(0..=6).contains(&shift) {
            return Err(HintErrorKind::InvalidStackValue(shift));
        }
        self.graphics.delta_shift = shift as u16;
        Ok(())
    }

    /// Set instruction execution control.
    ///
    /// INSTCTRL[] (0x8E)
    ///
    /// Pops: s (selector), value
    ///
    /// Selectors are indices from 1 to 3 and the value must be either 0 or
    /// the flag for the selector. Only the control value program may change
    /// the flags, except that a glyph program may toggle backward
    /// compatibility for itself with selector 3.
    ///
    /// Invalid arguments are ignored unless running in pedantic mode.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#set-instruction-execution-control>
    pub(super) fn op_instctrl(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        let value = self.value_stack.pop()?;
        if !(1..=3).contains(&selector) {
            return self.pedantic_error(HintErrorKind::InvalidStackValue(selector));
        }
        let flag = 1 << (selector - 1);
        if value != 0 && value != flag {
            return self.pedantic_error(HintErrorKind::InvalidStackValue(value));
        }
        match (self.program.initial, selector) {
            (Program::ControlValue, _) => {
                self.graphics.instruct_control &= !(flag as u8);
                self.graphics.instruct_control |= value as u8;
            }
            (Program::Glyph, 3) => {
                if self.version == InterpreterVersion::V40 {
                    self.graphics.backward_compatibility = value != 4;
                }
            }
            _ => return self.pedantic_error(HintErrorKind::InvalidStackValue(selector)),
        }
        Ok(())
    }

    /// Scan conversion control.
    ///
    /// SCANCTRL[] (0x85)
    ///
    /// Pops: n
    ///
    /// Bits 0-7 hold a ppem threshold, with 0xFF meaning always and 0
    /// meaning never. Bits 8-10 enable dropout control when the size is at
    /// or below the threshold, rotated or stretched respectively; bits
    /// 11-13 disable it under the inverse conditions.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#scan-conversion-control>
    pub(super) fn op_scanctrl(&mut self) -> OpResult {
        let n = self.value_stack.pop()?;
        let threshold = n & 0xFF;
        let scan_control = match threshold {
            0xFF => true,
            0 => false,
            _ => {
                let ppem = self.metrics.ppem() as i32;
                let rotated = self.metrics.rotated();
                let stretched = self.metrics.stretched();
                let mut on = self.graphics.scan_control;
                if n & 0x100 != 0 && ppem <= threshold {
                    on = true;
                }
                if n & 0x200 != 0 && rotated {
                    on = true;
                }
                if n & 0x400 != 0 && stretched {
                    on = true;
                }
                if n & 0x800 != 0 && ppem > threshold {
                    on = false;
                }
                if n & 0x1000 != 0 && rotated {
                    on = false;
                }
                if n & 0x2000 != 0 && stretched {
                    on = false;
                }
                on
            }
        };
        self.graphics.scan_control = scan_control;
        Ok(())
    }

    /// SCANTYPE[] (0x8D): selects the dropout control rules. Negative
    /// values are ignored.
    pub(super) fn op_scantype(&mut self) -> OpResult {
        let scan_type = self.value_stack.pop()?;
        if scan_type >= 0 {
            self.graphics.scan_type = scan_type & 0xFFFF;
        }
        Ok(())
    }

    fn set_round_mode(&mut self, mode: RoundMode) -> OpResult {
        self.graphics.round_state.mode = mode;
        Ok(())
    }

    fn pop_zone(&mut self) -> Result<ZonePointer, HintErrorKind> {
        ZonePointer::try_from(self.value_stack.pop()?)
    }

    /// Returns `error` in pedantic mode and succeeds otherwise.
    pub(super) fn pedantic_error(&self, error: HintErrorKind) -> OpResult {
        if self.graphics.is_pedantic {
            Err(error)
        } else {
            Ok(())
        }
    }
}

/// Computes the unit vector from `p2` to `p1`, optionally rotated by 90
/// degrees counter-clockwise.
///
/// Coincident points produce the x axis.
fn line_vector(p1: Point<i32>, p2: Point<i32>, rotate: bool) -> Point<i32> {
    let (dx, dy) = (p1.x.saturating_sub(p2.x), p1.y.saturating_sub(p2.y));
    if dx == 0 && dy == 0 {
        Point::new(math::ONE_2_14, 0)
    } else if rotate {
        math::normalize14(dy.saturating_neg(), dx)
    } else {
        math::normalize14(dx, dy)
    }
}
