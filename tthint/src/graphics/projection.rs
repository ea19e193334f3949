//! Point projection.

use super::{super::math, CoordAxis, GraphicsState, Point};

impl GraphicsState<'_> {
    /// Recomputes the cached axes and the freedom/projection dot product.
    ///
    /// Must be called whenever any of the vectors change.
    pub fn update_projection_state(&mut self) {
        let (pv, fv) = (self.proj_vector, self.freedom_vector);
        self.fdotp = if fv.x == math::ONE_2_14 {
            pv.x
        } else if fv.y == math::ONE_2_14 {
            pv.y
        } else {
            (pv.x * fv.x + pv.y * fv.y) >> 14
        };
        self.proj_axis = vector_axis(pv);
        self.dual_proj_axis = vector_axis(self.dual_proj_vector);
        self.freedom_axis = if self.fdotp == math::ONE_2_14 {
            vector_axis(fv)
        } else {
            CoordAxis::Both
        };
        // Nearly perpendicular vectors would produce huge movements
        if self.fdotp.abs() < 0x400 {
            self.fdotp = math::ONE_2_14;
        }
    }

    /// Measures the distance from `v2` to `v1` along the projection vector.
    #[inline(always)]
    pub fn project(&self, v1: Point<i32>, v2: Point<i32>) -> i32 {
        project_along(self.proj_axis, self.proj_vector, v1, v2)
    }

    /// Measures the distance from `v2` to `v1` along the dual projection
    /// vector.
    #[inline(always)]
    pub fn dual_project(&self, v1: Point<i32>, v2: Point<i32>) -> i32 {
        project_along(self.dual_proj_axis, self.dual_proj_vector, v1, v2)
    }
}

fn vector_axis(v: Point<i32>) -> CoordAxis {
    if v.x == math::ONE_2_14 {
        CoordAxis::X
    } else if v.y == math::ONE_2_14 {
        CoordAxis::Y
    } else {
        CoordAxis::Both
    }
}

#[inline(always)]
fn project_along(axis: CoordAxis, vector: Point<i32>, v1: Point<i32>, v2: Point<i32>) -> i32 {
    match axis {
        CoordAxis::X => v1.x.saturating_sub(v2.x),
        CoordAxis::Y => v1.y.saturating_sub(v2.y),
        CoordAxis::Both => math::dot14(
            v1.x.saturating_sub(v2.x),
            v1.y.saturating_sub(v2.y),
            vector.x,
            vector.y,
        ),
    }
}
