//! Graphics state for the interpreter.
//!
//! The graphics state is split in two. [`RetainedGraphicsState`] holds the
//! tunables that the control value program may establish for every glyph of
//! a size. [`GraphicsState`] wraps it with the registers that are reset at
//! the start of each program run (vectors, reference points, zone pointers
//! and the loop counter) and with the zones being operated on.

mod projection;
mod round;

use core::ops::{Deref, DerefMut};

use read_fonts::types::Point;

use super::{
    error::HintErrorKind,
    math,
    zone::{Zone, ZonePointer},
};

pub use round::{RoundMode, RoundState, GRID_PERIOD, GRID_PERIOD_45};

/// Axis to which a measurement or movement is restricted.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum CoordAxis {
    #[default]
    Both,
    X,
    Y,
}

impl CoordAxis {
    /// Returns the coordinate of `point` on this axis. `Both` selects x.
    pub fn coord(self, point: Point<i32>) -> i32 {
        match self {
            Self::Y => point.y,
            _ => point.x,
        }
    }

    pub fn coord_mut(self, point: &mut Point<i32>) -> &mut i32 {
        match self {
            Self::Y => &mut point.y,
            _ => &mut point.x,
        }
    }
}

/// Interpreter register file for a single program run.
#[derive(Debug)]
pub struct GraphicsState<'a> {
    pub retained: RetainedGraphicsState,
    /// Unit vector (2.14) along which distances are measured.
    pub proj_vector: Point<i32>,
    pub proj_axis: CoordAxis,
    /// Projection vector used to measure distances in the original outline.
    pub dual_proj_vector: Point<i32>,
    pub dual_proj_axis: CoordAxis,
    /// Unit vector (2.14) along which points move.
    pub freedom_vector: Point<i32>,
    pub freedom_axis: CoordAxis,
    /// Dot product of the freedom and projection vectors.
    pub fdotp: i32,
    pub rp0: usize,
    pub rp1: usize,
    pub rp2: usize,
    /// Repeat count for the looping instructions; reset to 1 after use.
    pub loop_counter: u32,
    pub zp0: ZonePointer,
    pub zp1: ZonePointer,
    pub zp2: ZonePointer,
    /// Twilight and glyph zones, in that order.
    pub zones: [Zone<'a>; 2],
    /// 16.16 factor converting font units to 26.6 pixels.
    pub scale: i32,
    /// Composite glyphs have no meaningful unscaled outline; their
    /// "unscaled" points are already in pixels.
    pub is_composite: bool,
    /// Enables the subpixel hinting compatibility rules: no movement along
    /// x and no movement along y once both IUP directions have run.
    pub backward_compatibility: bool,
    pub is_pedantic: bool,
    pub did_iup_x: bool,
    pub did_iup_y: bool,
}

impl<'a> GraphicsState<'a> {
    pub fn new(retained: RetainedGraphicsState, zones: [Zone<'a>; 2], scale: i32) -> Self {
        let mut state = Self {
            retained,
            zones,
            scale,
            ..Default::default()
        };
        state.update_projection_state();
        state
    }

    /// Factor for converting unscaled points to 26.6 pixels.
    pub fn unscaled_to_pixels(&self) -> i32 {
        if self.is_composite {
            math::ONE_16_16
        } else {
            self.scale
        }
    }

    /// Restores the per-run registers to their defaults, keeping the
    /// retained state, the zones and the run configuration.
    pub fn reset(&mut self) {
        let Self {
            retained,
            zones,
            scale,
            is_composite,
            backward_compatibility,
            is_pedantic,
            ..
        } = core::mem::take(self);
        *self = Self {
            retained,
            zones,
            scale,
            is_composite,
            backward_compatibility,
            is_pedantic,
            ..Default::default()
        };
        self.update_projection_state();
    }

    /// Restores the retained state to its defaults.
    pub fn reset_retained(&mut self) {
        self.retained = RetainedGraphicsState::default();
    }

    #[inline(always)]
    pub fn zone(&self, pointer: ZonePointer) -> &Zone<'a> {
        &self.zones[pointer as usize]
    }

    #[inline(always)]
    pub fn zone_mut(&mut self, pointer: ZonePointer) -> &mut Zone<'a> {
        &mut self.zones[pointer as usize]
    }

    pub fn zp0(&self) -> &Zone<'a> {
        self.zone(self.zp0)
    }

    pub fn zp1(&self) -> &Zone<'a> {
        self.zone(self.zp1)
    }

    pub fn zp2(&self) -> &Zone<'a> {
        self.zone(self.zp2)
    }

    pub fn zp2_mut(&mut self) -> &mut Zone<'a> {
        self.zone_mut(self.zp2)
    }

    /// Rounds a distance with the active rounding state and the
    /// compensation for the distance type encoded in the low two bits of
    /// `opcode`.
    pub fn round(&self, distance: i32, opcode: u8) -> i32 {
        let compensation = self.compensation[(opcode & 3) as usize];
        self.round_state.round(distance, compensation)
    }

    /// Applies the compensation for the distance type in `opcode` without
    /// rounding. The sign of the distance never changes.
    pub fn round_none(&self, distance: i32, opcode: u8) -> i32 {
        let compensation = self.compensation[(opcode & 3) as usize];
        if distance >= 0 {
            distance.saturating_add(compensation).max(0)
        } else {
            distance.saturating_sub(compensation).min(0)
        }
    }

    /// Moves the original position of a point along the freedom vector.
    pub fn move_original(
        &mut self,
        zone: ZonePointer,
        point_ix: usize,
        distance: i32,
    ) -> Result<(), HintErrorKind> {
        let (fv, fdotp, axis) = (self.freedom_vector, self.fdotp, self.freedom_axis);
        let point = self.zone_mut(zone).original_mut(point_ix)?;
        match axis {
            CoordAxis::X => point.x = point.x.saturating_add(distance),
            CoordAxis::Y => point.y = point.y.saturating_add(distance),
            CoordAxis::Both => {
                point.x = point.x.saturating_add(math::mul_div(distance, fv.x, fdotp));
                point.y = point.y.saturating_add(math::mul_div(distance, fv.y, fdotp));
            }
        }
        Ok(())
    }

    /// Moves the current position of a point along the freedom vector and
    /// marks it as touched.
    pub fn move_point(
        &mut self,
        zone: ZonePointer,
        point_ix: usize,
        distance: i32,
    ) -> Result<(), HintErrorKind> {
        let (lock_x, lock_y) = self.movement_locks();
        let (fv, fdotp, axis) = (self.freedom_vector, self.fdotp, self.freedom_axis);
        let zone = self.zone_mut(zone);
        let (dx, dy) = match axis {
            CoordAxis::X => (Some(distance), None),
            CoordAxis::Y => (None, Some(distance)),
            CoordAxis::Both => (
                (fv.x != 0).then(|| math::mul_div(distance, fv.x, fdotp)),
                (fv.y != 0).then(|| math::mul_div(distance, fv.y, fdotp)),
            ),
        };
        if let Some(dx) = dx {
            if !lock_x {
                let point = zone.point_mut(point_ix)?;
                point.x = point.x.saturating_add(dx);
            }
            zone.touch(point_ix, CoordAxis::X)?;
        }
        if let Some(dy) = dy {
            if !lock_y {
                let point = zone.point_mut(point_ix)?;
                point.y = point.y.saturating_add(dy);
            }
            zone.touch(point_ix, CoordAxis::Y)?;
        }
        Ok(())
    }

    /// Shifts a point in the zone referenced by zp2 by a precomputed
    /// displacement.
    ///
    /// Used by the `SHP`, `SHC`, `SHZ` and `SHPIX` instructions.
    pub fn move_zp2_point(
        &mut self,
        point_ix: usize,
        dx: i32,
        dy: i32,
        do_touch: bool,
    ) -> Result<(), HintErrorKind> {
        let (lock_x, lock_y) = self.movement_locks();
        let fv = self.freedom_vector;
        let zone = self.zp2_mut();
        if fv.x != 0 {
            if !lock_x {
                let point = zone.point_mut(point_ix)?;
                point.x = point.x.saturating_add(dx);
            }
            if do_touch {
                zone.touch(point_ix, CoordAxis::X)?;
            }
        }
        if fv.y != 0 {
            if !lock_y {
                let point = zone.point_mut(point_ix)?;
                point.y = point.y.saturating_add(dy);
            }
            if do_touch {
                zone.touch(point_ix, CoordAxis::Y)?;
            }
        }
        Ok(())
    }

    /// Returns whether movement along x and y is currently suppressed by
    /// backward compatibility.
    fn movement_locks(&self) -> (bool, bool) {
        let compat = self.backward_compatibility;
        (compat, compat && self.did_iup_x && self.did_iup_y)
    }

    /// Computes how far a reference point has moved, expressed along the
    /// freedom vector.
    ///
    /// Uses rp1 in zp0 when bit 0 of `opcode` is set, otherwise rp2 in zp1.
    pub fn point_displacement(&self, opcode: u8) -> Result<PointDisplacement, HintErrorKind> {
        let (zone, point_ix) = if opcode & 1 != 0 {
            (self.zp0, self.rp1)
        } else {
            (self.zp1, self.rp2)
        };
        let zone_data = self.zone(zone);
        let distance = self.project(zone_data.point(point_ix)?, zone_data.original(point_ix)?);
        let fv = self.freedom_vector;
        Ok(PointDisplacement {
            zone,
            point_ix,
            dx: math::mul_div(distance, fv.x, self.fdotp),
            dy: math::mul_div(distance, fv.y, self.fdotp),
        })
    }
}

impl Default for GraphicsState<'_> {
    fn default() -> Self {
        let x_axis = Point::new(math::ONE_2_14, 0);
        Self {
            retained: RetainedGraphicsState::default(),
            proj_vector: x_axis,
            proj_axis: CoordAxis::X,
            dual_proj_vector: x_axis,
            dual_proj_axis: CoordAxis::X,
            freedom_vector: x_axis,
            freedom_axis: CoordAxis::X,
            fdotp: math::ONE_2_14,
            rp0: 0,
            rp1: 0,
            rp2: 0,
            loop_counter: 1,
            zp0: ZonePointer::Glyph,
            zp1: ZonePointer::Glyph,
            zp2: ZonePointer::Glyph,
            zones: [Zone::default(), Zone::default()],
            scale: 0,
            is_composite: false,
            backward_compatibility: true,
            is_pedantic: false,
            did_iup_x: false,
            did_iup_y: false,
        }
    }
}

impl Deref for GraphicsState<'_> {
    type Target = RetainedGraphicsState;

    fn deref(&self) -> &Self::Target {
        &self.retained
    }
}

impl DerefMut for GraphicsState<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.retained
    }
}

/// Movement of a reference point used by the shift instructions.
#[derive(PartialEq, Debug)]
pub struct PointDisplacement {
    pub zone: ZonePointer,
    pub point_ix: usize,
    pub dx: i32,
    pub dy: i32,
}

/// Graphics state that the control value program establishes for all
/// glyphs of a size.
///
/// Distances are in 26.6.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RetainedGraphicsState {
    pub round_state: RoundState,
    /// Engine compensation added before rounding, indexed by the distance
    /// type (gray, black, white).
    pub compensation: [i32; 4],
    /// Flip the sign of CVT distances to match the measured distance.
    pub auto_flip: bool,
    /// Largest difference between a CVT value and the measured distance for
    /// which the CVT value is used.
    pub control_value_cutin: i32,
    pub delta_base: u16,
    pub delta_shift: u16,
    /// Bit 0 disables glyph programs, bit 1 selects the default graphics
    /// state for glyph programs and bit 2 disables backward compatibility.
    pub instruct_control: u8,
    pub min_distance: i32,
    pub scan_control: bool,
    pub scan_type: i32,
    pub single_width_cutin: i32,
    pub single_width: i32,
}

impl Default for RetainedGraphicsState {
    fn default() -> Self {
        Self {
            round_state: RoundState::default(),
            compensation: [0; 4],
            auto_flip: true,
            // 17/16 pixel
            control_value_cutin: 68,
            delta_base: 9,
            delta_shift: 3,
            instruct_control: 0,
            min_distance: 64,
            scan_control: false,
            scan_type: 0,
            single_width_cutin: 0,
            single_width: 0,
        }
    }
}
