//! Managing exceptions.
//!
//! Delta instructions adjust points or control values at a single ppem.
//! Each exception is a pair of an index and an argument byte: the high
//! nibble selects the ppem relative to the delta base and the low nibble
//! the step, in units of `1 / 2^delta_shift` pixels.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-exceptions>

use super::{
    super::{code::Opcode, graphics::CoordAxis},
    Engine, HintErrorKind, OpResult,
};

impl Engine<'_> {
    /// Delta exception P1, P2 and P3.
    ///
    /// DELTAP1[] (0x5D)
    /// DELTAP2[] (0x71)
    /// DELTAP3[] (0x72)
    ///
    /// Pops: n, then n pairs of point and argument
    ///
    /// Every point index is checked, including those of exceptions for
    /// other sizes. With backward compatibility enabled, only points
    /// already touched in y move, and only before both IUP instructions
    /// have run.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#delta-exception-p1>
    pub(super) fn op_deltap(&mut self, opcode: Opcode) -> OpResult {
        let ppem = self.projected_ppem();
        let bias = self.delta_bias(opcode, Opcode::DELTAP2, Opcode::DELTAP3);
        let count = self.pop_delta_count()?;
        let point_count = self.graphics.zp0().points.len();
        for _ in 0..count {
            let point_ix = self.pop_point()?;
            let arg = self.value_stack.pop()?;
            if point_ix >= point_count {
                return Err(HintErrorKind::InvalidPointIndex(point_ix));
            }
            let Some(distance) = self.delta_distance(arg, bias, ppem) else {
                continue;
            };
            let gs = &mut self.graphics;
            if gs.backward_compatibility {
                let did_iup = gs.did_iup_x && gs.did_iup_y;
                let may_move = (gs.is_composite && gs.freedom_vector.y != 0)
                    || gs.zp0().is_touched(point_ix, CoordAxis::Y)?;
                if !did_iup && may_move {
                    gs.move_point(gs.zp0, point_ix, distance)?;
                }
            } else {
                gs.move_point(gs.zp0, point_ix, distance)?;
            }
        }
        Ok(())
    }

    /// Delta exception C1, C2 and C3.
    ///
    /// DELTAC1[] (0x73)
    /// DELTAC2[] (0x74)
    /// DELTAC3[] (0x75)
    ///
    /// Pops: n, then n pairs of control value index and argument
    ///
    /// Adjustments are in pixels along the current projection vector.
    pub(super) fn op_deltac(&mut self, opcode: Opcode) -> OpResult {
        let ppem = self.projected_ppem();
        let bias = self.delta_bias(opcode, Opcode::DELTAC2, Opcode::DELTAC3);
        let count = self.pop_delta_count()?;
        let ratio = self.cvt_ratio();
        for _ in 0..count {
            let cvt_ix = self.value_stack.pop_usize()?;
            let arg = self.value_stack.pop()?;
            if cvt_ix >= self.cvt.len() {
                return Err(HintErrorKind::InvalidCvtIndex(cvt_ix));
            }
            if let Some(delta) = self.delta_distance(arg, bias, ppem) {
                self.cvt.add_delta(cvt_ix, delta, ratio)?;
            }
        }
        Ok(())
    }

    fn delta_bias(&self, opcode: Opcode, second: Opcode, third: Opcode) -> i32 {
        let range_bias = if opcode == second {
            16
        } else if opcode == third {
            32
        } else {
            0
        };
        range_bias + self.graphics.delta_base as i32
    }

    /// Pops the exception count, limited to the number of complete pairs on
    /// the stack.
    fn pop_delta_count(&mut self) -> Result<usize, HintErrorKind> {
        let count = self.value_stack.pop_usize()?;
        Ok(count.min(self.value_stack.len() / 2))
    }

    /// Decodes an exception argument, returning the distance (26.6) when
    /// it applies at `ppem`.
    fn delta_distance(&self, arg: i32, bias: i32, ppem: i32) -> Option<i32> {
        let target_ppem = ((arg & 0xF0) >> 4) + bias;
        if target_ppem != ppem {
            return None;
        }
        // Steps are -8..=-1 and 1..=8; there is no zero step
        let mut step = (arg & 0xF) - 8;
        if step >= 0 {
            step += 1;
        }
        Some(step * (1 << (6 - self.graphics.delta_shift.min(6) as i32)))
    }
}
