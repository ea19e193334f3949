//! Reading and writing data.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#reading-and-writing-data>

use read_fonts::types::Point;

use super::{
    super::{math, options::InterpreterVersion, zone::ZonePointer},
    Engine, OpResult,
};

impl Engine<'_> {
    /// Get coordinate projected onto the projection vector.
    ///
    /// GC\[a\] (0x46 - 0x47)
    ///
    /// a: 0: current position of point p
    ///    1: original position of point p, on the dual projection vector
    ///
    /// Pops: p
    /// Pushes: coordinate (26.6)
    pub(super) fn op_gc(&mut self, opcode: u8) -> OpResult {
        let p = self.pop_point()?;
        let gs = &self.graphics;
        let value = if opcode & 1 != 0 {
            gs.dual_project(gs.zp2().original(p)?, Point::default())
        } else {
            gs.project(gs.zp2().point(p)?, Point::default())
        };
        self.value_stack.push(value)
    }

    /// Set coordinate from the stack using projection vector and freedom
    /// vector.
    ///
    /// SCFS[] (0x48)
    ///
    /// Pops: value (26.6), p
    ///
    /// Moves point p along the freedom vector until its projection equals
    /// value. Twilight points also get their original position updated.
    pub(super) fn op_scfs(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let p = self.pop_point()?;
        let gs = &mut self.graphics;
        let projection = gs.project(gs.zp2().point(p)?, Point::default());
        gs.move_point(gs.zp2, p, value.saturating_sub(projection))?;
        if gs.zp2.is_twilight() {
            let twilight = gs.zone_mut(ZonePointer::Twilight);
            *twilight.original_mut(p)? = twilight.point(p)?;
        }
        Ok(())
    }

    /// Measure distance.
    ///
    /// MD\[a\] (0x49 - 0x4A)
    ///
    /// a: 0: measure in the original outline
    ///    1: measure in the grid fitted outline
    ///
    /// Pops: p1, p2
    /// Pushes: distance from p1 in zp1 to p2 in zp0 (26.6)
    ///
    /// Original distances come from the unscaled outline, scaled to pixels,
    /// except when either point is in the twilight zone, which has no
    /// unscaled outline.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#measure-distance>
    pub(super) fn op_md(&mut self, opcode: u8) -> OpResult {
        let p1 = self.pop_point()?;
        let p2 = self.pop_point()?;
        let gs = &self.graphics;
        let distance = if opcode & 1 != 0 {
            gs.project(gs.zp0().point(p2)?, gs.zp1().point(p1)?)
        } else if gs.zp0.is_twilight() || gs.zp1.is_twilight() {
            gs.dual_project(gs.zp0().original(p2)?, gs.zp1().original(p1)?)
        } else {
            math::mul(
                gs.dual_project(gs.zp0().unscaled(p2)?, gs.zp1().unscaled(p1)?),
                gs.unscaled_to_pixels(),
            )
        };
        self.value_stack.push(distance)
    }

    /// Measure pixels per em.
    ///
    /// MPPEM[] (0x4B)
    ///
    /// Pushes: ppem along the projection vector
    pub(super) fn op_mppem(&mut self) -> OpResult {
        let ppem = self.projected_ppem();
        self.value_stack.push(ppem)
    }

    /// Measure point size.
    ///
    /// MPS[] (0x4C)
    ///
    /// Version 35 pushes the ppem; version 40 pushes the requested point
    /// size in 26.6.
    pub(super) fn op_mps(&mut self) -> OpResult {
        let size = match self.version {
            InterpreterVersion::V35 => self.projected_ppem(),
            InterpreterVersion::V40 => self.metrics.point_size(),
        };
        self.value_stack.push(size)
    }
}
