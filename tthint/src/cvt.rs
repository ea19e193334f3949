//! Control value table and size metrics.
//!
//! Control values are stored scaled to the larger of the horizontal and
//! vertical ppem. Reads and writes during execution are corrected by a
//! ratio that depends on the current projection vector so that a single
//! table serves non-square pixels.

use read_fonts::types::{BigEndian, Point};

use super::{cow_slice::CowSlice, error::HintErrorKind, math};

/// Caller supplied rendering size.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct SizeRequest {
    pub x_ppem: u16,
    pub y_ppem: u16,
    /// Size in points (26.6). Defaults to `ppem` when absent.
    pub point_size: Option<i32>,
    /// The glyph transform contains a rotation.
    pub rotated: bool,
    /// The glyph transform scales the axes differently.
    pub stretched: bool,
}

impl SizeRequest {
    /// Creates a request for square pixels.
    pub fn new(ppem: u16) -> Self {
        Self::with_ppem(ppem, ppem)
    }

    pub fn with_ppem(x_ppem: u16, y_ppem: u16) -> Self {
        Self {
            x_ppem,
            y_ppem,
            ..Default::default()
        }
    }

    pub fn point_size(mut self, point_size: i32) -> Self {
        self.point_size = Some(point_size);
        self
    }

    pub fn rotated(mut self, rotated: bool) -> Self {
        self.rotated = rotated;
        self
    }

    pub fn stretched(mut self, stretched: bool) -> Self {
        self.stretched = stretched;
        self
    }
}

/// Scaling parameters derived from a [`SizeRequest`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SizeMetrics {
    x_ppem: u16,
    y_ppem: u16,
    ppem: u16,
    x_ratio: i32,
    y_ratio: i32,
    scale: i32,
    point_size: i32,
    rotated: bool,
    stretched: bool,
}

impl SizeMetrics {
    pub fn new(request: SizeRequest, units_per_em: u16) -> Self {
        let (x_ppem, y_ppem) = (request.x_ppem, request.y_ppem);
        let (ppem, x_ratio, y_ratio) = if x_ppem == y_ppem {
            (x_ppem, math::ONE_16_16, math::ONE_16_16)
        } else if x_ppem > y_ppem {
            (
                x_ppem,
                math::ONE_16_16,
                math::div(y_ppem as i32, x_ppem as i32),
            )
        } else {
            (
                y_ppem,
                math::div(x_ppem as i32, y_ppem as i32),
                math::ONE_16_16,
            )
        };
        let scale = math::div(ppem as i32 * 64, units_per_em.max(1) as i32);
        Self {
            x_ppem,
            y_ppem,
            ppem,
            x_ratio,
            y_ratio,
            scale,
            point_size: request.point_size.unwrap_or(ppem as i32 * 64),
            rotated: request.rotated,
            stretched: request.stretched,
        }
    }

    pub fn x_ppem(&self) -> u16 {
        self.x_ppem
    }

    pub fn y_ppem(&self) -> u16 {
        self.y_ppem
    }

    /// Larger of the horizontal and vertical ppem.
    pub fn ppem(&self) -> u16 {
        self.ppem
    }

    pub fn x_ratio(&self) -> i32 {
        self.x_ratio
    }

    pub fn y_ratio(&self) -> i32 {
        self.y_ratio
    }

    /// 16.16 factor converting font units to 26.6 pixels.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn point_size(&self) -> i32 {
        self.point_size
    }

    pub fn rotated(&self) -> bool {
        self.rotated
    }

    pub fn stretched(&self) -> bool {
        self.stretched
    }

    /// Returns the 16.16 ratio for measurements along the projection
    /// vector `proj`.
    pub fn ratio(&self, proj: Point<i32>) -> i32 {
        if self.x_ratio == self.y_ratio {
            self.x_ratio
        } else if proj.y == 0 {
            self.x_ratio
        } else if proj.x == 0 {
            self.y_ratio
        } else {
            let x = math::mul_div(proj.x, self.x_ratio, math::ONE_2_14);
            let y = math::mul_div(proj.y, self.y_ratio, math::ONE_2_14);
            math::hypot(x, y)
        }
    }

    /// Ppem along the projection vector, as measured by `MPPEM`.
    pub fn projected_ppem(&self, proj: Point<i32>) -> i32 {
        math::mul(self.ppem as i32, self.ratio(proj))
    }
}

/// Scales raw control values in font units to 26.6 pixels.
pub fn scale_cvt(raw: &[BigEndian<i16>], scale: i32, scaled: &mut [i32]) {
    for (dest, src) in scaled.iter_mut().zip(raw) {
        *dest = math::mul(src.get() as i32 * 64, scale >> 6);
    }
}

/// Control value table as seen by a running program.
///
/// Wraps a [`CowSlice`], converting out of bounds accesses to errors and
/// applying the ratio correction.
pub struct Cvt<'a>(CowSlice<'a>);

impl Cvt<'_> {
    /// Returns the raw stored value.
    pub fn get(&self, index: usize) -> Result<i32, HintErrorKind> {
        self.0.get(index).ok_or(HintErrorKind::InvalidCvtIndex(index))
    }

    pub fn set(&mut self, index: usize, value: i32) -> Result<(), HintErrorKind> {
        self.0
            .set(index, value)
            .ok_or(HintErrorKind::InvalidCvtIndex(index))
    }

    /// Reads a value in pixels along a direction with the given ratio.
    ///
    /// Used by `RCVT`, `MIRP` and `MIAP`.
    pub fn read(&self, index: usize, ratio: i32) -> Result<i32, HintErrorKind> {
        Ok(math::mul(self.get(index)?, ratio))
    }

    /// Stores a pixel value measured with the given ratio.
    ///
    /// Used by `WCVTP`.
    pub fn write_pixels(&mut self, index: usize, value: i32, ratio: i32) -> Result<(), HintErrorKind> {
        self.set(index, math::div(value, ratio))
    }

    /// Stores a value in font units. No ratio correction applies.
    ///
    /// Used by `WCVTF`.
    pub fn write_funits(&mut self, index: usize, funits: i32, scale: i32) -> Result<(), HintErrorKind> {
        self.set(index, math::mul(funits, scale))
    }

    /// Adds a pixel delta measured with the given ratio.
    ///
    /// Used by `DELTAC[123]`.
    pub fn add_delta(&mut self, index: usize, delta: i32, ratio: i32) -> Result<(), HintErrorKind> {
        let value = self.get(index)?;
        self.set(index, value.saturating_add(math::div(delta, ratio)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> From<CowSlice<'a>> for Cvt<'a> {
    fn from(value: CowSlice<'a>) -> Self {
        Self(value)
    }
}
