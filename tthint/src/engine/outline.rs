//! Managing outlines.
//!
//! Point movement goes through the freedom vector and distances are
//! measured along the projection vector, both handled by the graphics
//! state. Instructions that consume the loop counter always reset it to 1,
//! even when they fail.
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#managing-outlines>

use read_fonts::types::Point;

use super::{
    super::{
        graphics::{CoordAxis, PointDisplacement},
        math,
        zone::{Zone, ZonePointer},
    },
    Engine, HintErrorKind, OpResult,
};

impl Engine<'_> {
    /// Flip point.
    ///
    /// FLIPPT[] (0x80)
    ///
    /// Pops: loop points
    ///
    /// Toggles the on curve flag of glyph zone points. Points are still
    /// popped but left unchanged once both IUP instructions have run under
    /// backward compatibility.
    pub(super) fn op_flippt(&mut self) -> OpResult {
        let count = self.take_loop_counter();
        let locked = self.is_post_iup_locked();
        for _ in 0..count {
            let p = self.pop_point()?;
            if !locked {
                self.graphics.zone_mut(ZonePointer::Glyph).flip_on_curve(p)?;
            }
        }
        Ok(())
    }

    /// FLIPRGON[] (0x81): pops high, low and makes the glyph zone points in
    /// `low..=high` on curve.
    pub(super) fn op_fliprgon(&mut self) -> OpResult {
        self.set_on_curve_range(true)
    }

    /// FLIPRGOFF[] (0x82): pops high, low and makes the glyph zone points in
    /// `low..=high` off curve.
    pub(super) fn op_fliprgoff(&mut self) -> OpResult {
        self.set_on_curve_range(false)
    }

    fn set_on_curve_range(&mut self, on: bool) -> OpResult {
        let high = self.pop_point()?;
        let low = self.pop_point()?;
        if self.is_post_iup_locked() {
            return Ok(());
        }
        let zone = self.graphics.zone_mut(ZonePointer::Glyph);
        let point_count = zone.points.len();
        for p in [low, high] {
            if p >= point_count {
                return Err(HintErrorKind::InvalidPointIndex(p));
            }
        }
        if low > high {
            return Ok(());
        }
        zone.set_on_curve(low, high + 1, on)
    }

    /// Shift point by the last point.
    ///
    /// SHP\[a\] (0x32 - 0x33)
    ///
    /// a: 0: rp2 in zp1
    ///    1: rp1 in zp0
    ///
    /// Pops: loop points in zp2
    ///
    /// Shifts each point by the distance the reference point has moved
    /// from its original position.
    pub(super) fn op_shp(&mut self, opcode: u8) -> OpResult {
        let count = self.take_loop_counter();
        let PointDisplacement { dx, dy, .. } = self.graphics.point_displacement(opcode)?;
        for _ in 0..count {
            let p = self.pop_point()?;
            self.graphics.move_zp2_point(p, dx, dy, true)?;
        }
        Ok(())
    }

    /// Shift contour by the last point.
    ///
    /// SHC\[a\] (0x34 - 0x35)
    ///
    /// Pops: contour index in zp2
    ///
    /// The twilight zone is treated as a single contour covering all of its
    /// points. The reference point itself is not moved.
    pub(super) fn op_shc(&mut self, opcode: u8) -> OpResult {
        let contour_ix = self.value_stack.pop_usize()?;
        let gs = &mut self.graphics;
        let is_twilight = gs.zp2.is_twilight();
        let contour_count = if is_twilight {
            1
        } else {
            gs.zp2().contours.len()
        };
        if contour_ix >= contour_count {
            return Err(HintErrorKind::InvalidContourIndex(contour_ix));
        }
        let displacement = gs.point_displacement(opcode)?;
        let start = if contour_ix != 0 {
            gs.zp2().contour(contour_ix - 1)? as usize + 1
        } else {
            0
        };
        let end = if is_twilight {
            gs.zp2().points.len()
        } else {
            gs.zp2().contour(contour_ix)? as usize + 1
        };
        for ix in start..end {
            if displacement.zone != gs.zp2 || displacement.point_ix != ix {
                gs.move_zp2_point(ix, displacement.dx, displacement.dy, true)?;
            }
        }
        Ok(())
    }

    /// Shift zone by the last point.
    ///
    /// SHZ\[a\] (0x36 - 0x37)
    ///
    /// Pops: zone (0 or 1)
    ///
    /// The popped zone is validated but, matching established rasterizer
    /// behavior, the points of zp2 are the ones shifted. Glyph zone shifts
    /// stop at the end of the last contour and nothing is marked touched.
    pub(super) fn op_shz(&mut self, opcode: u8) -> OpResult {
        ZonePointer::try_from(self.value_stack.pop()?)?;
        let gs = &mut self.graphics;
        let displacement = gs.point_displacement(opcode)?;
        let end = if gs.zp2.is_twilight() {
            gs.zp2().points.len()
        } else {
            gs.zp2()
                .contours
                .last()
                .map(|last| *last as usize + 1)
                .unwrap_or(0)
        };
        for ix in 0..end {
            if displacement.zone != gs.zp2 || displacement.point_ix != ix {
                gs.move_zp2_point(ix, displacement.dx, displacement.dy, false)?;
            }
        }
        Ok(())
    }

    /// Shift point by a pixel amount.
    ///
    /// SHPIX[] (0x38)
    ///
    /// Pops: amount (26.6), loop points in zp2
    ///
    /// With backward compatibility enabled this behaves like DELTAP: only
    /// points already touched in y move, and only before both IUP
    /// instructions have run. Twilight points are exempt.
    pub(super) fn op_shpix(&mut self) -> OpResult {
        let count = self.take_loop_counter();
        let amount = self.value_stack.pop()?;
        let gs = &mut self.graphics;
        let fv = gs.freedom_vector;
        let dx = math::mul14(amount, fv.x);
        let dy = math::mul14(amount, fv.y);
        let in_twilight = gs.zp0.is_twilight() || gs.zp1.is_twilight() || gs.zp2.is_twilight();
        let did_iup = gs.did_iup_x && gs.did_iup_y;
        for _ in 0..count {
            let p = self.value_stack.pop_usize()?;
            if gs.backward_compatibility {
                let may_move = in_twilight
                    || (!did_iup
                        && ((gs.is_composite && fv.y != 0)
                            || gs.zp2().is_touched(p, CoordAxis::Y)?));
                if may_move {
                    gs.move_zp2_point(p, 0, dy, true)?;
                }
            } else {
                gs.move_zp2_point(p, dx, dy, true)?;
            }
        }
        Ok(())
    }

    /// Move stack indirect relative point.
    ///
    /// MSIRP\[a\] (0x3A - 0x3B)
    ///
    /// a: 1: set rp0 to the moved point
    ///
    /// Pops: distance (26.6), point in zp1
    ///
    /// Moves the point so that its distance from rp0 in zp0 is the popped
    /// value. A twilight point is first placed at the original position of
    /// rp0, displaced by the distance.
    pub(super) fn op_msirp(&mut self, opcode: u8) -> OpResult {
        let distance = self.value_stack.pop()?;
        let p = self.pop_point()?;
        let gs = &mut self.graphics;
        if gs.zp1.is_twilight() {
            let rp0_original = gs.zp0().original(gs.rp0)?;
            *gs.zone_mut(gs.zp1).original_mut(p)? = rp0_original;
            gs.move_original(gs.zp1, p, distance)?;
            let original = gs.zp1().original(p)?;
            *gs.zone_mut(gs.zp1).point_mut(p)? = original;
        }
        let current = gs.project(gs.zp1().point(p)?, gs.zp0().point(gs.rp0)?);
        gs.move_point(gs.zp1, p, distance.saturating_sub(current))?;
        gs.rp1 = gs.rp0;
        gs.rp2 = p;
        if opcode & 1 != 0 {
            gs.rp0 = p;
        }
        Ok(())
    }

    /// Move direct absolute point.
    ///
    /// MDAP\[a\] (0x2E - 0x2F)
    ///
    /// a: 1: round the position along the projection vector
    ///
    /// Pops: point in zp0
    ///
    /// Touches the point, optionally rounding it, and sets rp0 and rp1 to
    /// it.
    pub(super) fn op_mdap(&mut self, opcode: u8) -> OpResult {
        let p = self.pop_point()?;
        let gs = &mut self.graphics;
        let distance = if opcode & 1 != 0 {
            let current = gs.project(gs.zp0().point(p)?, Point::default());
            gs.round(current, 3).saturating_sub(current)
        } else {
            0
        };
        gs.move_point(gs.zp0, p, distance)?;
        gs.rp0 = p;
        gs.rp1 = p;
        Ok(())
    }

    /// Move indirect absolute point.
    ///
    /// MIAP\[a\] (0x3E - 0x3F)
    ///
    /// a: 1: apply the control value cut-in and round
    ///
    /// Pops: cvt index, point in zp0
    ///
    /// Moves the point so that its coordinate along the projection vector
    /// is the control value. A twilight point is placed along the freedom
    /// vector at that distance from the origin first.
    pub(super) fn op_miap(&mut self, opcode: u8) -> OpResult {
        let cvt_ix = self.value_stack.pop_usize()?;
        let p = self.pop_point()?;
        let mut distance = self.cvt.read(cvt_ix, self.cvt_ratio())?;
        let gs = &mut self.graphics;
        if gs.zp0.is_twilight() {
            let fv = gs.freedom_vector;
            let placed = Point::new(math::mul14(distance, fv.x), math::mul14(distance, fv.y));
            let zone = gs.zone_mut(gs.zp0);
            *zone.original_mut(p)? = placed;
            *zone.point_mut(p)? = placed;
        }
        let current = gs.project(gs.zp0().point(p)?, Point::default());
        if opcode & 1 != 0 {
            if distance.saturating_sub(current).saturating_abs() > gs.control_value_cutin {
                distance = current;
            }
            distance = gs.round(distance, 3);
        }
        gs.move_point(gs.zp0, p, distance.saturating_sub(current))?;
        gs.rp0 = p;
        gs.rp1 = p;
        Ok(())
    }

    /// Move direct relative point.
    ///
    /// MDRP\[abcde\] (0xC0 - 0xDF)
    ///
    /// a: 1: set rp0 to the moved point
    /// b: 1: keep the distance above the minimum distance
    /// c: 1: round the distance
    /// de: distance type for engine compensation
    ///
    /// Pops: point in zp1
    ///
    /// Preserves the original distance between rp0 in zp0 and the point,
    /// after applying the single width cut-in, rounding and the minimum
    /// distance.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#move-direct-relative-point>
    pub(super) fn op_mdrp(&mut self, opcode: u8) -> OpResult {
        let p = self.pop_point()?;
        let gs = &mut self.graphics;
        let rp0 = gs.rp0;
        let mut original_distance = if gs.zp0.is_twilight() || gs.zp1.is_twilight() {
            gs.dual_project(gs.zp1().original(p)?, gs.zp0().original(rp0)?)
        } else {
            let distance = gs.dual_project(gs.zp1().unscaled(p)?, gs.zp0().unscaled(rp0)?);
            math::mul(distance, gs.unscaled_to_pixels())
        };
        let single_width = gs.single_width;
        if original_distance.saturating_sub(single_width).saturating_abs() < gs.single_width_cutin {
            original_distance = if original_distance >= 0 {
                single_width
            } else {
                single_width.saturating_neg()
            };
        }
        let mut distance = if opcode & 4 != 0 {
            gs.round(original_distance, opcode)
        } else {
            gs.round_none(original_distance, opcode)
        };
        if opcode & 8 != 0 {
            distance = apply_min_distance(distance, original_distance, gs.min_distance);
        }
        let current = gs.project(gs.zp1().point(p)?, gs.zp0().point(rp0)?);
        gs.move_point(gs.zp1, p, distance.saturating_sub(current))?;
        gs.rp1 = rp0;
        gs.rp2 = p;
        if opcode & 16 != 0 {
            gs.rp0 = p;
        }
        Ok(())
    }

    /// Move indirect relative point.
    ///
    /// MIRP\[abcde\] (0xE0 - 0xFF)
    ///
    /// a: 1: set rp0 to the moved point
    /// b: 1: keep the distance above the minimum distance
    /// c: 1: apply the control value cut-in and round
    /// de: distance type for engine compensation
    ///
    /// Pops: cvt index, point in zp1
    ///
    /// Moves the point so that its distance from rp0 in zp0 is the control
    /// value. A cvt index of -1 reads as zero. The sign of the control
    /// value follows the original distance when auto flip is on, and the
    /// cut-in only applies when both points are in the same zone.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#move-indirect-relative-point>
    pub(super) fn op_mirp(&mut self, opcode: u8) -> OpResult {
        let cvt_ix = self.value_stack.pop()?;
        let p = self.pop_point()?;
        let mut cvt_distance = if cvt_ix == -1 {
            0
        } else {
            self.cvt.read(cvt_ix as u32 as usize, self.cvt_ratio())?
        };
        let gs = &mut self.graphics;
        let rp0 = gs.rp0;
        let single_width = gs.single_width;
        if cvt_distance.saturating_sub(single_width).saturating_abs() < gs.single_width_cutin {
            cvt_distance = if cvt_distance >= 0 {
                single_width
            } else {
                single_width.saturating_neg()
            };
        }
        if gs.zp1.is_twilight() {
            let fv = gs.freedom_vector;
            let base = gs.zp0().original(rp0)?;
            let placed = Point::new(
                base.x.saturating_add(math::mul14(cvt_distance, fv.x)),
                base.y.saturating_add(math::mul14(cvt_distance, fv.y)),
            );
            let zone = gs.zone_mut(gs.zp1);
            *zone.original_mut(p)? = placed;
            *zone.point_mut(p)? = placed;
        }
        let original_distance = gs.dual_project(gs.zp1().original(p)?, gs.zp0().original(rp0)?);
        let current = gs.project(gs.zp1().point(p)?, gs.zp0().point(rp0)?);
        if gs.auto_flip && (original_distance ^ cvt_distance) < 0 {
            cvt_distance = cvt_distance.saturating_neg();
        }
        let mut distance = if opcode & 4 != 0 {
            if gs.zp0 == gs.zp1
                && cvt_distance.saturating_sub(original_distance).saturating_abs() > gs.control_value_cutin
            {
                cvt_distance = original_distance;
            }
            gs.round(cvt_distance, opcode)
        } else {
            gs.round_none(cvt_distance, opcode)
        };
        if opcode & 8 != 0 {
            distance = apply_min_distance(distance, original_distance, gs.min_distance);
        }
        gs.move_point(gs.zp1, p, distance.saturating_sub(current))?;
        gs.rp1 = rp0;
        gs.rp2 = p;
        if opcode & 16 != 0 {
            gs.rp0 = p;
        }
        Ok(())
    }

    /// Align to reference point.
    ///
    /// ALIGNRP[] (0x3C)
    ///
    /// Pops: loop points in zp1
    ///
    /// Moves each point onto rp0 in zp0 along the projection vector.
    pub(super) fn op_alignrp(&mut self) -> OpResult {
        let count = self.take_loop_counter();
        for _ in 0..count {
            let p = self.pop_point()?;
            let gs = &mut self.graphics;
            let distance = gs.project(gs.zp1().point(p)?, gs.zp0().point(gs.rp0)?);
            gs.move_point(gs.zp1, p, distance.saturating_neg())?;
        }
        Ok(())
    }

    /// Align points.
    ///
    /// ALIGNPTS[] (0x27)
    ///
    /// Pops: p2 in zp0, p1 in zp1
    ///
    /// Moves both points to the midpoint of their projections.
    pub(super) fn op_alignpts(&mut self) -> OpResult {
        let p2 = self.pop_point()?;
        let p1 = self.pop_point()?;
        let gs = &mut self.graphics;
        let distance = gs.project(gs.zp0().point(p2)?, gs.zp1().point(p1)?) / 2;
        gs.move_point(gs.zp1, p1, distance)?;
        gs.move_point(gs.zp0, p2, distance.saturating_neg())
    }

    /// Move point to intersection of two lines.
    ///
    /// ISECT[] (0x0F)
    ///
    /// Pops: b1, b0 (line in zp0), a1, a0 (line in zp1), point in zp2
    ///
    /// Lines that are nearly parallel (within about 3 degrees) place the
    /// point at the average of the four end points instead. The point is
    /// touched on both axes.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#moves-point-p-to-the-intersection-of-two-lines>
    pub(super) fn op_isect(&mut self) -> OpResult {
        let b1 = self.pop_point()?;
        let b0 = self.pop_point()?;
        let a1 = self.pop_point()?;
        let a0 = self.pop_point()?;
        let p = self.pop_point()?;
        let gs = &mut self.graphics;
        let (pa0, pa1) = (gs.zp1().point(a0)?, gs.zp1().point(a1)?);
        let (pb0, pb1) = (gs.zp0().point(b0)?, gs.zp0().point(b1)?);
        let (dbx, dby) = (pb1.x.saturating_sub(pb0.x), pb1.y.saturating_sub(pb0.y));
        let (dax, day) = (pa1.x.saturating_sub(pa0.x), pa1.y.saturating_sub(pa0.y));
        let (dx, dy) = (pb0.x.saturating_sub(pa0.x), pb0.y.saturating_sub(pa0.y));
        // Cross and dot products of the two directions
        let discriminant =
            math::mul_div(dax, dby.saturating_neg(), 0x40).saturating_add(math::mul_div(day, dbx, 0x40));
        let dot_product =
            math::mul_div(dax, dbx, 0x40).saturating_add(math::mul_div(day, dby, 0x40));
        let intersection = if 19i64 * (discriminant as i64).abs() > (dot_product as i64).abs() {
            let v = math::mul_div(dx, dby.saturating_neg(), 0x40).saturating_add(math::mul_div(dy, dbx, 0x40));
            Point::new(
                pa0.x.saturating_add(math::mul_div(v, dax, discriminant)),
                pa0.y.saturating_add(math::mul_div(v, day, discriminant)),
            )
        } else {
            Point::new(
                ((pa0.x as i64 + pa1.x as i64 + pb0.x as i64 + pb1.x as i64) / 4) as i32,
                ((pa0.y as i64 + pa1.y as i64 + pb0.y as i64 + pb1.y as i64) / 4) as i32,
            )
        };
        let zone = gs.zp2_mut();
        *zone.point_mut(p)? = intersection;
        zone.touch(p, CoordAxis::Both)
    }

    /// Untouch point.
    ///
    /// UTP[] (0x29)
    ///
    /// Pops: point in zp0
    ///
    /// Clears the touched flag for each axis that the freedom vector has a
    /// component along.
    pub(super) fn op_utp(&mut self) -> OpResult {
        let p = self.pop_point()?;
        let fv = self.graphics.freedom_vector;
        let axis = match (fv.x != 0, fv.y != 0) {
            (true, true) => CoordAxis::Both,
            (true, false) => CoordAxis::X,
            (false, true) => CoordAxis::Y,
            (false, false) => return Ok(()),
        };
        let zp0 = self.graphics.zp0;
        self.graphics.zone_mut(zp0).untouch(p, axis)
    }

    /// Interpolate point by the last relative stretch.
    ///
    /// IP[] (0x39)
    ///
    /// Pops: loop points in zp2
    ///
    /// Places each point so that its relationship to rp1 (zp0) and rp2
    /// (zp1) matches the original outline. Original distances come from
    /// the unscaled outline unless a twilight zone is involved.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/tt_instructions#interpolate-point-by-the-last-relative-stretch>
    pub(super) fn op_ip(&mut self) -> OpResult {
        let count = self.take_loop_counter();
        let gs = &mut self.graphics;
        let in_twilight = gs.zp0.is_twilight() || gs.zp1.is_twilight() || gs.zp2.is_twilight();
        let (rp1, rp2) = (gs.rp1, gs.rp2);
        let original_base = original_position(gs.zp0(), rp1, in_twilight)?;
        let current_base = gs.zp0().point(rp1)?;
        let original_range = gs.dual_project(original_position(gs.zp1(), rp2, in_twilight)?, original_base);
        let current_range = gs.project(gs.zp1().point(rp2)?, current_base);
        for _ in 0..count {
            let p = self.value_stack.pop_usize()?;
            let original_distance = gs.dual_project(original_position(gs.zp2(), p, in_twilight)?, original_base);
            let current_distance = gs.project(gs.zp2().point(p)?, current_base);
            let new_distance = if original_distance == 0 {
                0
            } else if original_range != 0 {
                math::mul_div(original_distance, current_range, original_range)
            } else {
                original_distance
            };
            gs.move_point(gs.zp2, p, new_distance.saturating_sub(current_distance))?;
        }
        Ok(())
    }

    /// Interpolate untouched points through the outline.
    ///
    /// IUP\[a\] (0x30 - 0x31)
    ///
    /// a: 0: interpolate in y
    ///    1: interpolate in x
    ///
    /// Always operates on the glyph zone. With backward compatibility
    /// enabled, each direction runs at most once and further calls do
    /// nothing once both have run.
    pub(super) fn op_iup(&mut self, opcode: u8) -> OpResult {
        let axis = if opcode & 1 != 0 {
            CoordAxis::X
        } else {
            CoordAxis::Y
        };
        let gs = &mut self.graphics;
        if gs.backward_compatibility {
            if gs.did_iup_x && gs.did_iup_y {
                return Ok(());
            }
            match axis {
                CoordAxis::X => gs.did_iup_x = true,
                _ => gs.did_iup_y = true,
            }
        }
        gs.zone_mut(ZonePointer::Glyph).iup(axis)
    }

    /// Returns true if outline changes are blocked because both IUP
    /// instructions have run under backward compatibility.
    fn is_post_iup_locked(&self) -> bool {
        let gs = &self.graphics;
        gs.backward_compatibility && gs.did_iup_x && gs.did_iup_y
    }
}

/// Returns the scaled original position in a twilight zone, otherwise the
/// position in font units.
fn original_position(zone: &Zone, ix: usize, in_twilight: bool) -> Result<Point<i32>, HintErrorKind> {
    if in_twilight {
        zone.original(ix)
    } else {
        zone.unscaled(ix)
    }
}

/// Keeps `distance` at least `min_distance` away from zero, on the side
/// given by the sign of `original_distance`.
fn apply_min_distance(distance: i32, original_distance: i32, min_distance: i32) -> i32 {
    if original_distance >= 0 {
        distance.max(min_distance)
    } else {
        distance.min(min_distance.saturating_neg())
    }
}
