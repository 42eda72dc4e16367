use crate::backend::pixels::{unpack_levels, Level};
use crate::draw::MipMapOptions;

#[derive(Debug, Clone, Default)]
pub(crate) struct SoftTexture {
    pub levels: Vec<Level>,
}

impl SoftTexture {
    /// Returns `None` when `pixels` is too short for the declared extent.
    pub(crate) fn load(
        pixels: &[u8],
        width: u32,
        height: u32,
        alignment: u32,
        mip: MipMapOptions,
    ) -> Option<Self> {
        let levels = unpack_levels(pixels, width, height, alignment, mip)?;
        Some(Self { levels })
    }

    /// Nearest sample of the base level, clamped to the edge.
    ///
    /// Fragments carry no derivatives here, so lower levels are never selected.
    pub(crate) fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let Some(base) = self.levels.first() else { return [1.0; 4] };
        if base.width == 0 || base.height == 0 {
            return [1.0; 4];
        }
        let x = ((uv[0] * base.width as f32).floor().max(0.0) as u32).min(base.width - 1);
        let y = ((uv[1] * base.height as f32).floor().max(0.0) as u32).min(base.height - 1);
        base.texels[(y * base.width + x) as usize].map(|c| f32::from(c) / 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_clamps_to_edge() {
        // 2x2 checker: white on the diagonal.
        let pixels = [255, 255, 255, 255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255, 255];
        let tex = SoftTexture::load(&pixels, 2, 2, 4, MipMapOptions::None).unwrap();
        assert_eq!(tex.sample([-1.0, -1.0]), [1.0; 4]);
        assert_eq!(tex.sample([0.75, 0.25]), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(tex.sample([5.0, 5.0]), [1.0; 4]);
    }

    #[test]
    fn empty_texture_samples_white() {
        assert_eq!(SoftTexture::default().sample([0.5, 0.5]), [1.0; 4]);
    }
}
