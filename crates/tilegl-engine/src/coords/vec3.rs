/// Three `f32` components, read either spatially (`x`, `y`, `z`) or as a
/// colour (`r()`, `g()`, `b()`).
///
/// The colour names are accessors over the same storage; writing `r` writes `x`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Bulk assignment of all three components.
    #[inline]
    pub fn set(&mut self, x: f32, y: f32, z: f32) {
        self.x = x;
        self.y = y;
        self.z = z;
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
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vec3 {
    #[inline]
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Vec3> for glam::Vec3 {
    #[inline]
    fn from(v: Vec3) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}
