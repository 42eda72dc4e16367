use super::Vec3;

/// Four `f32` components: spatial `x`, `y`, `z`, `t` or colour `r()`, `g()`,
/// `b()`, `a()` over the same storage.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub t: f32,
}

impl Vec4 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, t: f32) -> Self {
        Self { x, y, z, t }
    }

    #[inline]
    pub fn set(&mut self, x: f32, y: f32, z: f32, t: f32) {
        self.x = x;
        self.y = y;
        self.z = z;
        self.t = t;
    }

    #[inline]
    pub const fn r(self) -> f32 {
        self.x
    }

    #[inline]
    pub const fn g(self) -> f32 {
        self.y
    }

    #[inline]
    pub const fn b(self) -> f32 {
        self.z
    }

    #[inline]
    pub const fn a(self) -> f32 {
        self.t
    }

    #[inline]
    pub fn set_r(&mut self, r: f32) {
        self.x = r;
    }

    #[inline]
    pub fn set_g(&mut self, g: f32) {
        self.y = g;
    }

    #[inline]
    pub fn set_b(&mut self, b: f32) {
        self.z = b;
    }

    #[inline]
    pub fn set_a(&mut self, a: f32) {
        self.t = a;
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.t]
    }

    /// Quantizes to RGBA8, clamping each channel to `[0, 1]` first.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        self.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    #[inline]
    pub fn from_rgba8([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }
}

/// A three-component colour is fully opaque.
impl From<Vec3> for Vec4 {
    #[inline]
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z, 1.0)
    }
}

impl From<[f32; 4]> for Vec4 {
    #[inline]
    fn from([x, y, z, t]: [f32; 4]) -> Self {
        Self::new(x, y, z, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_aliases_t() {
        let mut c = Vec4::new(0.0, 0.0, 0.0, 0.5);
        assert_eq!(c.a(), 0.5);
        c.set_a(0.25);
        assert_eq!(c.t, 0.25);
    }

    #[test]
    fn vec3_widens_to_opaque() {
        let c: Vec4 = Vec3::new(1.0, 0.0, 0.0).into();
        assert_eq!(c, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn rgba8_quantization_clamps() {
        assert_eq!(Vec4::new(2.0, -1.0, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
        assert_eq!(Vec4::from_rgba8([255, 0, 0, 255]), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }
}
