//! Projection and model-view bookkeeping shared by the backends.
//!
//! Matrices follow the fixed-function convention: a vertex `v` lands at
//! `projection * model_view * pre * v` in clip space.

use glam::{Mat4, Vec3 as GVec3, Vec4 as GVec4};

use crate::coords::Vec3;

/// Depth range of the orthographic projection.
pub const DEPTH_NEAR: f32 = -1000.0;
pub const DEPTH_FAR: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(Mat4);

impl Transform {
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    /// Orthographic view over `[0, width] x [0, height]`, origin top-left.
    #[rustfmt::skip]
    #[inline]
    pub fn orthographic(width: f32, height: f32) -> Self {
        Self(Mat4::orthographic_rh_gl(
            0.0, width,
            height, 0.0,
            DEPTH_NEAR, DEPTH_FAR,
        ))
    }

    /// `translate(trans) * scale(scale)`; absent parts are identity.
    pub fn translate_scale(trans: Option<Vec3>, scale: Option<Vec3>) -> Self {
        let mut m = Mat4::IDENTITY;
        if let Some(t) = trans {
            m *= Mat4::from_translation(t.into());
        }
        if let Some(s) = scale {
            m *= Mat4::from_scale(s.into());
        }
        Self(m)
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.0
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.0 == Mat4::IDENTITY
    }

    /// Maps a position to clip space.
    #[inline]
    pub fn project(&self, p: [f32; 3]) -> GVec4 {
        self.0 * GVec3::from(p).extend(1.0)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Transform {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn absent_translate_and_scale_is_identity() {
        assert!(Transform::translate_scale(None, None).is_identity());
    }

    #[test]
    fn translate_applies_after_scale() {
        let t = Transform::translate_scale(
            Some(Vec3::new(10.0, 20.0, 0.0)),
            Some(Vec3::new(2.0, 3.0, 1.0)),
        );
        let p = t.project([1.0, 1.0, 0.0]);
        assert_relative_eq!(p.x, 12.0);
        assert_relative_eq!(p.y, 23.0);
    }

    #[test]
    fn orthographic_maps_top_left_to_ndc_corner() {
        let ortho = Transform::orthographic(200.0, 100.0);
        let tl = ortho.project([0.0, 0.0, 0.0]);
        let br = ortho.project([200.0, 100.0, 0.0]);
        assert_relative_eq!(tl.x, -1.0);
        assert_relative_eq!(tl.y, 1.0);
        assert_relative_eq!(br.x, 1.0);
        assert_relative_eq!(br.y, -1.0);
    }
}
