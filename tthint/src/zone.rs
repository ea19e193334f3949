//! Glyph zones.
//!
//! A [`GlyphZone`] owns the point buffers for an outline (or for the
//! twilight zone) and is reused across glyphs. The interpreter operates on a
//! borrowed [`Zone`] view of the active portion of those buffers.

use read_fonts::{
    tables::glyf::{PointFlags, PointMarker},
    types::Point,
};

use super::{error::HintErrorKind, error::HintingError, graphics::CoordAxis, math};

use HintErrorKind::{InvalidPointIndex, InvalidPointRange};

/// Selects either the twilight or glyph zone.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(u8)]
pub enum ZonePointer {
    Twilight = 0,
    #[default]
    Glyph = 1,
}

impl ZonePointer {
    pub fn is_twilight(self) -> bool {
        self == Self::Twilight
    }
}

impl TryFrom<i32> for ZonePointer {
    type Error = HintErrorKind;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Twilight),
            1 => Ok(Self::Glyph),
            _ => Err(HintErrorKind::InvalidZoneIndex(value)),
        }
    }
}

/// Resizable point storage for a glyph or for the twilight zone.
///
/// Capacity only ever grows. Resetting to a smaller point count keeps the
/// buffers and their stale contents; callers populate the active range
/// before use.
#[derive(Clone, Default, Debug)]
pub struct GlyphZone {
    /// Points in font units.
    unscaled: Vec<Point<i32>>,
    /// Scaled points before hinting (26.6).
    original: Vec<Point<i32>>,
    /// Scaled points modified by hinting (26.6).
    points: Vec<Point<i32>>,
    flags: Vec<PointFlags>,
    /// Index of the last point of each contour.
    contours: Vec<u16>,
    point_count: usize,
    contour_count: usize,
}

impl GlyphZone {
    /// Creates a zone with room for the given number of points and
    /// contours.
    pub fn new(max_points: usize, max_contours: usize) -> Result<Self, HintingError> {
        let mut zone = Self::default();
        zone.allocate(max_points, max_contours)?;
        Ok(zone)
    }

    /// Ensures capacity for at least `max_points` points and `max_contours`
    /// contours.
    ///
    /// Does nothing when the current capacity is sufficient.
    pub fn allocate(&mut self, max_points: usize, max_contours: usize) -> Result<(), HintingError> {
        grow(&mut self.unscaled, max_points)?;
        grow(&mut self.original, max_points)?;
        grow(&mut self.points, max_points)?;
        grow(&mut self.flags, max_points)?;
        grow(&mut self.contours, max_contours)
    }

    /// Frees all storage.
    pub fn release(&mut self) {
        *self = Self::default();
    }

    /// Sets the active point and contour counts, growing if required.
    pub fn reset(&mut self, point_count: usize, contour_count: usize) -> Result<(), HintingError> {
        self.allocate(point_count, contour_count)?;
        self.point_count = point_count;
        self.contour_count = contour_count;
        Ok(())
    }

    /// Returns the `(points, contours)` capacity.
    pub fn capacity(&self) -> (usize, usize) {
        (self.points.len(), self.contours.len())
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn contour_count(&self) -> usize {
        self.contour_count
    }

    /// Resets the zone and fills it with an outline in font units.
    ///
    /// Touch markers are cleared; `original` and `points` must be filled by
    /// a subsequent call to [`scale`](Self::scale) or by the caller.
    pub fn load(
        &mut self,
        unscaled: &[Point<i32>],
        flags: &[PointFlags],
        contours: &[u16],
    ) -> Result<(), HintingError> {
        self.reset(unscaled.len(), contours.len())?;
        self.unscaled[..unscaled.len()].copy_from_slice(unscaled);
        for (dest, src) in self.flags[..unscaled.len()]
            .iter_mut()
            .zip(flags.iter().copied().chain(core::iter::repeat(PointFlags::default())))
        {
            *dest = src;
            dest.clear_marker(PointMarker::TOUCHED);
        }
        self.contours[..contours.len()].copy_from_slice(contours);
        Ok(())
    }

    /// Fills the scaled point arrays from the unscaled points.
    pub fn scale(&mut self, scale: i32) {
        let count = self.point_count;
        for ((unscaled, original), point) in self.unscaled[..count]
            .iter()
            .zip(&mut self.original[..count])
            .zip(&mut self.points[..count])
        {
            let scaled = Point::new(math::mul(unscaled.x, scale), math::mul(unscaled.y, scale));
            *original = scaled;
            *point = scaled;
        }
    }

    /// Zeroes all active coordinates and clears the touch markers.
    pub fn clear(&mut self) {
        let count = self.point_count;
        self.unscaled[..count].fill(Point::default());
        self.original[..count].fill(Point::default());
        self.points[..count].fill(Point::default());
        self.flags[..count].fill(PointFlags::default());
    }

    /// Copies the active contents of `other` into this zone.
    pub fn copy_from(&mut self, other: &GlyphZone) -> Result<(), HintingError> {
        let (count, contours) = (other.point_count, other.contour_count);
        self.reset(count, contours)?;
        self.unscaled[..count].copy_from_slice(&other.unscaled[..count]);
        self.original[..count].copy_from_slice(&other.original[..count]);
        self.points[..count].copy_from_slice(&other.points[..count]);
        self.flags[..count].copy_from_slice(&other.flags[..count]);
        self.contours[..contours].copy_from_slice(&other.contours[..contours]);
        Ok(())
    }

    /// Discards hinting adjustments by restoring `points` from `original`.
    pub fn restore_unhinted(&mut self) {
        let count = self.point_count;
        self.points[..count].copy_from_slice(&self.original[..count]);
    }

    pub fn unscaled_mut(&mut self) -> &mut [Point<i32>] {
        &mut self.unscaled[..self.point_count]
    }

    pub fn original(&self) -> &[Point<i32>] {
        &self.original[..self.point_count]
    }

    pub fn original_mut(&mut self) -> &mut [Point<i32>] {
        &mut self.original[..self.point_count]
    }

    /// Current (hinted) points in 26.6 pixel units.
    pub fn points(&self) -> &[Point<i32>] {
        &self.points[..self.point_count]
    }

    pub fn points_mut(&mut self) -> &mut [Point<i32>] {
        &mut self.points[..self.point_count]
    }

    pub fn flags(&self) -> &[PointFlags] {
        &self.flags[..self.point_count]
    }

    pub fn contours(&self) -> &[u16] {
        &self.contours[..self.contour_count]
    }

    pub fn contours_mut(&mut self) -> &mut [u16] {
        &mut self.contours[..self.contour_count]
    }

    /// Borrows the active portion of the zone for the interpreter.
    pub fn zone(&mut self) -> Zone<'_> {
        let count = self.point_count;
        Zone {
            unscaled: &self.unscaled[..count],
            original: &mut self.original[..count],
            points: &mut self.points[..count],
            flags: &mut self.flags[..count],
            contours: &self.contours[..self.contour_count],
        }
    }
}

pub(crate) fn grow<T: Clone + Default>(buf: &mut Vec<T>, len: usize) -> Result<(), HintingError> {
    if let Some(additional) = len.checked_sub(buf.len()).filter(|n| *n > 0) {
        buf.try_reserve_exact(additional)
            .map_err(|_| HintingError::AllocationFailure)?;
        buf.resize(len, T::default());
    }
    Ok(())
}

/// Interpreter view of a zone.
#[derive(Default, Debug)]
pub struct Zone<'a> {
    /// Points in font units. Empty or zero for the twilight zone.
    pub unscaled: &'a [Point<i32>],
    pub original: &'a mut [Point<i32>],
    pub points: &'a mut [Point<i32>],
    pub flags: &'a mut [PointFlags],
    pub contours: &'a [u16],
}

impl Zone<'_> {
    pub fn point(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        self.points
            .get(index)
            .copied()
            .ok_or(InvalidPointIndex(index))
    }

    pub fn point_mut(&mut self, index: usize) -> Result<&mut Point<i32>, HintErrorKind> {
        self.points.get_mut(index).ok_or(InvalidPointIndex(index))
    }

    pub fn original(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        self.original
            .get(index)
            .copied()
            .ok_or(InvalidPointIndex(index))
    }

    pub fn original_mut(&mut self, index: usize) -> Result<&mut Point<i32>, HintErrorKind> {
        self.original.get_mut(index).ok_or(InvalidPointIndex(index))
    }

    /// Returns the point in font units, or the origin when there is no
    /// backing outline.
    pub fn unscaled(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        if index >= self.points.len() {
            return Err(InvalidPointIndex(index));
        }
        Ok(self.unscaled.get(index).copied().unwrap_or_default())
    }

    pub fn contour(&self, index: usize) -> Result<u16, HintErrorKind> {
        self.contours
            .get(index)
            .copied()
            .ok_or(HintErrorKind::InvalidContourIndex(index))
    }

    pub fn touch(&mut self, index: usize, axis: CoordAxis) -> Result<(), HintErrorKind> {
        self.flag_mut(index)?.set_marker(touched_marker(axis));
        Ok(())
    }

    pub fn untouch(&mut self, index: usize, axis: CoordAxis) -> Result<(), HintErrorKind> {
        self.flag_mut(index)?.clear_marker(touched_marker(axis));
        Ok(())
    }

    pub fn is_touched(&self, index: usize, axis: CoordAxis) -> Result<bool, HintErrorKind> {
        let flag = self.flags.get(index).ok_or(InvalidPointIndex(index))?;
        Ok(flag.has_marker(touched_marker(axis)))
    }

    pub fn flip_on_curve(&mut self, index: usize) -> Result<(), HintErrorKind> {
        self.flag_mut(index)?.flip_on_curve();
        Ok(())
    }

    /// Sets or clears the on curve flag for `start..end`.
    pub fn set_on_curve(&mut self, start: usize, end: usize, on: bool) -> Result<(), HintErrorKind> {
        let flags = self
            .flags
            .get_mut(start..end)
            .ok_or(InvalidPointRange(start, end))?;
        for flag in flags {
            if on {
                flag.set_on_curve();
            } else {
                flag.clear_on_curve();
            }
        }
        Ok(())
    }

    fn flag_mut(&mut self, index: usize) -> Result<&mut PointFlags, HintErrorKind> {
        self.flags.get_mut(index).ok_or(InvalidPointIndex(index))
    }

    /// Interpolates untouched points along one axis.
    ///
    /// Within each contour, points between two touched points are
    /// interpolated from the movement of those points; a contour with a
    /// single touched point is shifted by its movement.
    pub fn iup(&mut self, axis: CoordAxis) -> Result<(), HintErrorKind> {
        let Some(last_point) = self.points.len().checked_sub(1) else {
            return Ok(());
        };
        let mut start = 0;
        for contour_ix in 0..self.contours.len() {
            let end = (self.contour(contour_ix)? as usize).min(last_point);
            if start > end {
                continue;
            }
            let mut first_touched = start;
            while first_touched <= end && !self.is_touched(first_touched, axis)? {
                first_touched += 1;
            }
            if first_touched > end {
                start = end + 1;
                continue;
            }
            let mut prev_touched = first_touched;
            for ix in first_touched + 1..=end {
                if self.is_touched(ix, axis)? {
                    self.iup_interpolate(axis, prev_touched + 1, ix - 1, prev_touched, ix)?;
                    prev_touched = ix;
                }
            }
            if prev_touched == first_touched {
                self.iup_shift(axis, start, end, first_touched)?;
            } else {
                // Wrap around the contour from the last touched point
                self.iup_interpolate(axis, prev_touched + 1, end, prev_touched, first_touched)?;
                if first_touched > start {
                    self.iup_interpolate(axis, start, first_touched - 1, prev_touched, first_touched)?;
                }
            }
            start = end + 1;
        }
        Ok(())
    }

    /// Moves every point in `first..=last` except `reference` by the
    /// movement of `reference`.
    fn iup_shift(
        &mut self,
        axis: CoordAxis,
        first: usize,
        last: usize,
        reference: usize,
    ) -> Result<(), HintErrorKind> {
        let delta = axis
            .coord(self.point(reference)?)
            .saturating_sub(axis.coord(self.original(reference)?));
        if delta == 0 {
            return Ok(());
        }
        let points = self
            .points
            .get_mut(first..=last)
            .ok_or(InvalidPointRange(first, last + 1))?;
        for (ix, point) in (first..).zip(points) {
            if ix != reference {
                let coord = axis.coord_mut(point);
                *coord = coord.saturating_add(delta);
            }
        }
        Ok(())
    }

    /// Interpolates points in `first..=last` between the two reference
    /// points.
    fn iup_interpolate(
        &mut self,
        axis: CoordAxis,
        first: usize,
        last: usize,
        ref1: usize,
        ref2: usize,
    ) -> Result<(), HintErrorKind> {
        if first > last {
            return Ok(());
        }
        let (mut ref1, mut ref2) = (ref1, ref2);
        if axis.coord(self.unscaled(ref1)?) > axis.coord(self.unscaled(ref2)?) {
            core::mem::swap(&mut ref1, &mut ref2);
        }
        let (orus1, orus2) = (
            axis.coord(self.unscaled(ref1)?),
            axis.coord(self.unscaled(ref2)?),
        );
        let (org1, org2) = (
            axis.coord(self.original(ref1)?),
            axis.coord(self.original(ref2)?),
        );
        let (cur1, cur2) = (axis.coord(self.point(ref1)?), axis.coord(self.point(ref2)?));
        let (delta1, delta2) = (cur1.saturating_sub(org1), cur2.saturating_sub(org2));
        let scale = (cur1 != cur2 && orus1 != orus2)
            .then(|| math::div(cur2.saturating_sub(cur1), orus2.saturating_sub(orus1)));
        for ix in first..=last {
            let org = axis.coord(self.original(ix)?);
            let value = if org <= org1 {
                org.saturating_add(delta1)
            } else if org >= org2 {
                org.saturating_add(delta2)
            } else if let Some(scale) = scale {
                cur1.saturating_add(math::mul(
                    axis.coord(self.unscaled(ix)?).saturating_sub(orus1),
                    scale,
                ))
            } else {
                cur1
            };
            *axis.coord_mut(self.point_mut(ix)?) = value;
        }
        Ok(())
    }
}

fn touched_marker(axis: CoordAxis) -> PointMarker {
    match axis {
        CoordAxis::Both => PointMarker::TOUCHED,
        CoordAxis::X => PointMarker::TOUCHED_X,
        CoordAxis::Y => PointMarker::TOUCHED_Y,
    }
}
