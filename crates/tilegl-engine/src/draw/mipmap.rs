/// Mipmap policy applied by `load_texture`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum MipMapOptions {
    /// Build the full chain; sampling picks the nearest level.
    Create,
    /// Base level only.
    #[default]
    None,
    /// Build the full chain; sampling blends between levels.
    Max,
}

impl MipMapOptions {
    /// Whether a chain below the base level is generated.
    #[inline]
    pub const fn generates_chain(self) -> bool {
        matches!(self, MipMapOptions::Create | MipMapOptions::Max)
    }

    /// Number of levels stored for a `width` x `height` image.
    pub fn level_count(self, width: u32, height: u32) -> u32 {
        if !self.generates_chain() {
            return 1;
        }
        32 - width.max(height).max(1).leading_zeros()
    }
}
