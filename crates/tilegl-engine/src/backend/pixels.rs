//! CPU-side pixel handling shared by the backends: unpacking aligned RGBA8
//! rows and building mip chains.

use crate::draw::MipMapOptions;
use crate::manager::unpack_row_stride;

/// One mip level, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Level {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[u8; 4]>,
}

impl Level {
    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}

/// Reads `pixels` with rows padded to `alignment` and returns every level the
/// mip policy asks for, base first.
///
/// Returns `None` when `pixels` is too short for the declared extent.
pub(crate) fn unpack_levels(
    pixels: &[u8],
    width: u32,
    height: u32,
    alignment: u32,
    mip: MipMapOptions,
) -> Option<Vec<Level>> {
    let stride = unpack_row_stride(width, alignment);
    let row = width as usize * 4;
    let needed = if height == 0 { 0 } else { stride * (height as usize - 1) + row };
    if pixels.len() < needed {
        return None;
    }

    let mut texels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        texels.extend(
            pixels[start..start + row]
                .chunks_exact(4)
                .map(|p| [p[0], p[1], p[2], p[3]]),
        );
    }

    let mut levels = vec![Level { width, height, texels }];
    // An empty image has nothing to filter down.
    if width == 0 || height == 0 {
        return Some(levels);
    }
    for _ in 1..mip.level_count(width, height) {
        let Some(prev) = levels.last() else { break };
        let next = downsample(prev);
        levels.push(next);
    }
    Some(levels)
}

/// 2x2 box filter; odd edges reuse the last row/column.
fn downsample(src: &Level) -> Level {
    let width = (src.width / 2).max(1);
    let height = (src.height / 2).max(1);
    let at = |x: u32, y: u32| {
        let x = x.min(src.width.saturating_sub(1));
        let y = y.min(src.height.saturating_sub(1));
        src.texels[(y * src.width + x) as usize]
    };

    let mut texels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let quad = [
                at(2 * x, 2 * y),
                at(2 * x + 1, 2 * y),
                at(2 * x, 2 * y + 1),
                at(2 * x + 1, 2 * y + 1),
            ];
            texels.push(std::array::from_fn(|c| {
                let sum: u32 = quad.iter().map(|t| u32::from(t[c])).sum();
                ((sum + 2) / 4) as u8
            }));
        }
    }
    Level { width, height, texels }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| if (i % width + i / width) % 2 == 0 { [255; 4] } else { [0, 0, 0, 255] })
            .collect()
    }

    #[test]
    fn padded_rows_are_skipped() {
        // 1x2 image with 8-byte alignment: 4 texel bytes + 4 padding per row.
        let pixels = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8];
        let levels = unpack_levels(&pixels, 1, 2, 8, MipMapOptions::None).unwrap();
        assert_eq!(levels[0].texels, vec![[1, 2, 3, 4], [5, 6, 7, 8]]);
    }

    #[test]
    fn short_pixel_data_is_rejected() {
        assert!(unpack_levels(&[0; 12], 2, 2, 4, MipMapOptions::None).is_none());
    }

    #[test]
    fn empty_extent_keeps_only_the_empty_base() {
        for (w, h) in [(0, 4), (4, 0), (0, 0)] {
            let levels = unpack_levels(&[], w, h, 4, MipMapOptions::Create).unwrap();
            assert_eq!(levels.len(), 1);
            assert!(levels[0].texels.is_empty());
        }
    }

    #[test]
    fn chain_depends_on_policy() {
        let pixels = checker(8, 4);
        let none = unpack_levels(&pixels, 8, 4, 4, MipMapOptions::None).unwrap();
        let full = unpack_levels(&pixels, 8, 4, 4, MipMapOptions::Create).unwrap();
        assert_eq!(none.len(), 1);
        let dims: Vec<_> = full.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn checker_averages_to_grey() {
        let levels = unpack_levels(&checker(2, 2), 2, 2, 4, MipMapOptions::Max).unwrap();
        assert_eq!(levels[1].texels, vec![[128, 128, 128, 255]]);
        assert_eq!(levels[1].as_bytes(), &[128, 128, 128, 255]);
    }
}
