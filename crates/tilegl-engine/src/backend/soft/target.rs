use crate::coords::WindowSize;

/// Colour + depth storage of the software backend.
///
/// Colour is kept as straight-alpha `f32` RGBA so repeated blending does not
/// accumulate quantization error; `read_rgba8` quantizes on the way out.
#[derive(Debug, Clone)]
pub(crate) struct Framebuffer {
    size: WindowSize,
    colour: Vec<[f32; 4]>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub(crate) fn new(size: WindowSize) -> Self {
        Self {
            size,
            colour: vec![[0.0; 4]; size.area()],
            depth: vec![1.0; size.area()],
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> WindowSize {
        self.size
    }

    /// Reallocates for `size`; contents are discarded.
    pub(crate) fn resize(&mut self, size: WindowSize) {
        if size == self.size {
            return;
        }
        *self = Self::new(size);
    }

    pub(crate) fn clear(&mut self, colour: [f32; 4]) {
        self.colour.fill(colour);
        self.depth.fill(1.0);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.size.x as usize + x as usize
    }

    #[inline]
    pub(crate) fn colour_at(&self, x: u32, y: u32) -> [f32; 4] {
        self.colour[self.index(x, y)]
    }

    #[inline]
    pub(crate) fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    #[inline]
    pub(crate) fn write(&mut self, x: u32, y: u32, colour: [f32; 4], depth: Option<f32>) {
        let i = self.index(x, y);
        self.colour[i] = colour;
        if let Some(d) = depth {
            self.depth[i] = d;
        }
    }

    pub(crate) fn read_rgba8(&self) -> Vec<u8> {
        self.colour
            .iter()
            .flat_map(|c| c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }
}
