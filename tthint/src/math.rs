//! Fixed point math helpers for TrueType hinting.
//!
//! Values are carried as raw `i32` bits in one of three formats: 26.6 for
//! coordinates and distances, 16.16 for scale factors and ratios and 2.14
//! for unit vectors. Intermediate products are computed in 64 bits, rounded
//! half away from zero and saturated to the `i32` range.

use read_fonts::types::Point;

/// The value 1.0 in 16.16 format.
pub const ONE_16_16: i32 = 0x10000;

/// The value 1.0 in 2.14 format.
pub const ONE_2_14: i32 = 0x4000;

pub fn floor(x: i32) -> i32 {
    x & !63
}

pub fn round(x: i32) -> i32 {
    floor(x.saturating_add(32))
}

pub fn ceil(x: i32) -> i32 {
    floor(x.saturating_add(63))
}

fn floor_pad(x: i32, n: i32) -> i32 {
    x & !(n - 1)
}

pub fn round_pad(x: i32, n: i32) -> i32 {
    floor_pad(x.saturating_add(n / 2), n)
}

/// Clamps a wide intermediate and applies the accumulated sign.
#[inline(always)]
fn saturate(magnitude: i64, negative: bool) -> i32 {
    let magnitude = magnitude.min(i32::MAX as i64);
    if negative {
        -(magnitude as i32)
    } else {
        magnitude as i32
    }
}

/// Multiplies two 16.16 values (or any value by a 16.16 factor) with
/// rounding.
#[inline(always)]
pub fn mul(a: i32, b: i32) -> i32 {
    let negative = (a < 0) != (b < 0);
    let product = (a as i64).abs() * (b as i64).abs();
    saturate((product + 0x8000) >> 16, negative)
}

/// Divides two 16.16 values with rounding.
///
/// Division by zero saturates to the largest magnitude with the sign of `a`.
pub fn div(a: i32, b: i32) -> i32 {
    let negative = (a < 0) != (b < 0);
    let (a, b) = ((a as i64).abs(), (b as i64).abs());
    if b == 0 {
        return saturate(i32::MAX as i64, negative);
    }
    saturate(((a << 16) + (b >> 1)) / b, negative)
}

/// Computes `a * b / c` with rounding.
pub fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    let negative = ((a < 0) != (b < 0)) != (c < 0);
    let (a, b, c) = ((a as i64).abs(), (b as i64).abs(), (c as i64).abs());
    if c == 0 {
        return saturate(i32::MAX as i64, negative);
    }
    saturate((a * b + (c >> 1)) / c, negative)
}

/// Computes `a * b / c` with truncation.
pub fn mul_div_no_round(a: i32, b: i32, c: i32) -> i32 {
    let negative = ((a < 0) != (b < 0)) != (c < 0);
    let (a, b, c) = ((a as i64).abs(), (b as i64).abs(), (c as i64).abs());
    if c == 0 {
        return saturate(i32::MAX as i64, negative);
    }
    saturate(a * b / c, negative)
}

/// Multiplication by a 2.14 value.
pub fn mul14(a: i32, b: i32) -> i32 {
    let mut v = a as i64 * b as i64;
    v += 0x2000 + (v >> 63);
    (v >> 14).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Dot product of a vector with a 2.14 unit vector.
pub fn dot14(ax: i32, ay: i32, bx: i32, by: i32) -> i32 {
    let mut v = (ax as i64 * bx as i64).saturating_add(ay as i64 * by as i64);
    v = v.saturating_add(0x2000 + (v >> 63));
    (v >> 14).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Integer square root, rounded to nearest.
pub fn sqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    // Newton iteration starting above the root
    let mut x = 1u64 << ((64 - n.leading_zeros()).div_ceil(2));
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            break;
        }
        x = y;
    }
    if n - x * x > x {
        x + 1
    } else {
        x
    }
}

/// Length of the vector `(x, y)`, in the same units as its components.
pub fn hypot(x: i32, y: i32) -> i32 {
    let (x, y) = ((x as i64).unsigned_abs(), (y as i64).unsigned_abs());
    sqrt(x * x + y * y).min(i32::MAX as u64) as i32
}

/// Normalizes a vector to unit length in 2.14 format.
///
/// The zero vector stays zero. Axis aligned vectors are exact; other
/// vectors are computed with rounding to nearest so that the result is
/// within one unit of the true direction.
pub fn normalize14(x: i32, y: i32) -> Point<i32> {
    if x == 0 && y == 0 {
        return Point::default();
    }
    if x == 0 {
        return Point::new(0, if y < 0 { -ONE_2_14 } else { ONE_2_14 });
    }
    if y == 0 {
        return Point::new(if x < 0 { -ONE_2_14 } else { ONE_2_14 }, 0);
    }
    let (mut ux, mut uy) = ((x as i64).abs(), (y as i64).abs());
    // Bring the larger component to 30 significant bits before taking the
    // length so that small inputs keep full precision.
    let shift = (ux.max(uy) as u64).leading_zeros() as i32 - 34;
    if shift > 0 {
        ux <<= shift;
        uy <<= shift;
    } else {
        ux >>= -shift;
        uy >>= -shift;
    }
    let len = sqrt((ux * ux + uy * uy) as u64) as i64;
    let scale = |v: i64, negative: bool| {
        let n = ((v << 14) + len / 2) / len;
        if negative {
            -(n as i32)
        } else {
            n as i32
        }
    };
    Point::new(scale(ux, x < 0), scale(uy, y < 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_helpers() {
        assert_eq!(floor(100), 64);
        assert_eq!(floor(-1), -64);
        assert_eq!(round(32), 64);
        assert_eq!(round(31), 0);
        assert_eq!(round(-32), 0);
        assert_eq!(ceil(1), 64);
        assert_eq!(ceil(-63), 0);
        assert_eq!(round_pad(48, 32), 64);
    }

    #[test]
    fn mul_rounds_away_from_zero() {
        assert_eq!(mul(3 << 16, 2 << 16), 6 << 16);
        // 1 * 0.5 (in 16.16) rounds up
        assert_eq!(mul(1, 0x8000), 1);
        assert_eq!(mul(-1, 0x8000), -1);
        assert_eq!(mul(100 * 64, ONE_16_16), 100 * 64);
    }

    #[test]
    fn div_by_zero_saturates() {
        assert_eq!(div(1, 0), i32::MAX);
        assert_eq!(div(-1, 0), -i32::MAX);
        assert_eq!(div(10, 20), 0x8000);
        assert_eq!(div(ONE_16_16, ONE_16_16), ONE_16_16);
    }

    #[test]
    fn mul_div_variants() {
        assert_eq!(mul_div(10, 10, 3), 33);
        assert_eq!(mul_div(-10, 10, 4), -25);
        assert_eq!(mul_div_no_round(10, 10, 4), 25);
        assert_eq!(mul_div_no_round(-10, 10, 3), -33);
        assert_eq!(mul_div(i32::MAX, i32::MAX, 1), i32::MAX);
        assert_eq!(mul_div(5, 5, 0), i32::MAX);
    }

    #[test]
    fn two_dot_fourteen() {
        assert_eq!(mul14(64, ONE_2_14), 64);
        assert_eq!(mul14(64, -ONE_2_14), -64);
        assert_eq!(mul14(100, 0x2000), 50);
        assert_eq!(dot14(64, 64, ONE_2_14, 0), 64);
        assert_eq!(dot14(64, 64, 0x2D41, 0x2D41), 91);
    }

    #[test]
    fn square_roots() {
        assert_eq!(sqrt(0), 0);
        assert_eq!(sqrt(1), 1);
        assert_eq!(sqrt(16), 4);
        assert_eq!(sqrt(17), 4);
        assert_eq!(sqrt(21), 5);
        assert_eq!(sqrt(u32::MAX as u64 * u32::MAX as u64), u32::MAX as u64);
        assert_eq!(hypot(3, -4), 5);
        assert_eq!(hypot(ONE_16_16, 0), ONE_16_16);
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize14(0, 0), Point::new(0, 0));
        assert_eq!(normalize14(-5, 0), Point::new(-ONE_2_14, 0));
        assert_eq!(normalize14(0, 1000), Point::new(0, ONE_2_14));
        assert_eq!(normalize14(100, 100), Point::new(0x2D41, 0x2D41));
        let v = normalize14(-300, 400);
        assert_eq!(v, Point::new(-9830, 13107));
        let len = hypot(v.x, v.y);
        assert!((len - ONE_2_14).abs() <= 1);
    }
}
