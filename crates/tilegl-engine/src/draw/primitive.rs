use std::fmt;

use bytemuck::Pod;

use crate::coords::Vec3;

use super::DrawingMode;

/// Bytes per vertex colour (RGBA8).
pub const COLOUR_WIDTH: usize = 4;
/// Bytes per texture coordinate (two `f32`).
pub const TEXCOORD_WIDTH: usize = 8;

/// One batched draw call.
///
/// Streams are borrowed byte views starting at the attribute's first byte and
/// advancing `size` bytes per vertex, so a single interleaved vertex array can
/// back all three (see [`attribute_bytes`]):
///
/// - `vertices`: `vert_size` `f32` per vertex (2 = x/y, 3 = x/y/z)
/// - `colours`: RGBA8 per vertex
/// - `texcoords`: two `f32` per vertex
///
/// The primitive owns none of the data and lives only for the `draw_primitive`
/// call that receives it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlPrimitive<'a> {
    // metadata
    pub mode: DrawingMode,
    /// Position components per vertex.
    pub vert_size: u32,
    /// Stride in bytes between consecutive vertices.
    pub size: usize,
    pub count: usize,

    // data
    pub vertices: Option<&'a [u8]>,
    pub colours: Option<&'a [u8]>,
    pub texcoords: Option<&'a [u8]>,

    // per-draw manipulations, applied on top of the controller transform
    pub pretranslate: Option<Vec3>,
    pub prescale: Option<Vec3>,

    /// Colour for this draw only; the controller's current colour is untouched.
    pub color: Option<Vec3>,
}

impl<'a> GlPrimitive<'a> {
    /// Records the shape and stream references verbatim. Nothing is copied.
    pub fn new(
        size: usize,
        count: usize,
        vert_size: u32,
        mode: DrawingMode,
        vertices: Option<&'a [u8]>,
        colours: Option<&'a [u8]>,
        texcoords: Option<&'a [u8]>,
    ) -> Self {
        Self {
            mode,
            vert_size,
            size,
            count,
            vertices,
            colours,
            texcoords,
            pretranslate: None,
            prescale: None,
            color: None,
        }
    }

    #[inline]
    pub fn with_pretranslate(mut self, trans: Vec3) -> Self {
        self.pretranslate = Some(trans);
        self
    }

    #[inline]
    pub fn with_prescale(mut self, scale: Vec3) -> Self {
        self.prescale = Some(scale);
        self
    }

    #[inline]
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = Some(color);
        self
    }

    /// Bytes one position occupies.
    #[inline]
    pub fn position_width(&self) -> usize {
        self.vert_size as usize * size_of::<f32>()
    }

    /// Checks every shape rule, reporting the first one broken.
    pub fn validate(&self) -> Result<(), PrimitiveError> {
        if !self.mode.is_valid_count(self.count) {
            return Err(PrimitiveError::InvalidCount { mode: self.mode, count: self.count });
        }
        if !(2..=3).contains(&self.vert_size) {
            return Err(PrimitiveError::VertSize(self.vert_size));
        }

        let streams = [
            ("vertices", self.vertices, self.position_width()),
            ("colours", self.colours, COLOUR_WIDTH),
            ("texcoords", self.texcoords, TEXCOORD_WIDTH),
        ];
        for (stream, data, width) in streams {
            let Some(data) = data else { continue };
            if self.count > 1 && self.size < width {
                return Err(PrimitiveError::Stride { stream, size: self.size, width });
            }
            let needed = stream_len(self.count, self.size, width);
            if data.len() < needed {
                return Err(PrimitiveError::ShortStream { stream, len: data.len(), needed });
            }
        }
        Ok(())
    }

    /// Hot-path check: asserts in debug builds, compiles away in release.
    #[inline]
    pub fn debug_validate(&self) {
        if cfg!(debug_assertions) {
            if let Err(err) = self.validate() {
                panic!("invalid primitive: {err}");
            }
        }
    }

    /// Position of vertex `i`, with `z = 0` for two-component positions.
    ///
    /// Callers must have validated the primitive and checked `vertices`.
    #[inline]
    pub fn position(&self, i: usize) -> Option<[f32; 3]> {
        let data = self.vertices?;
        let at = i * self.size;
        let x = read_f32(data, at)?;
        let y = read_f32(data, at + 4)?;
        let z = if self.vert_size >= 3 { read_f32(data, at + 8)? } else { 0.0 };
        Some([x, y, z])
    }

    #[inline]
    pub fn colour(&self, i: usize) -> Option<[u8; 4]> {
        let data = self.colours?;
        let at = i * self.size;
        let bytes = data.get(at..at + COLOUR_WIDTH)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    pub fn texcoord(&self, i: usize) -> Option<[f32; 2]> {
        let data = self.texcoords?;
        let at = i * self.size;
        Some([read_f32(data, at)?, read_f32(data, at + 4)?])
    }
}

/// Byte view of `vertices` starting `offset` bytes into the first element.
///
/// Use with `std::mem::offset_of!` to point a primitive stream at one field of
/// an interleaved vertex array.
pub fn attribute_bytes<V: Pod>(vertices: &[V], offset: usize) -> &[u8] {
    let bytes: &[u8] = bytemuck::cast_slice(vertices);
    bytes.get(offset..).unwrap_or(&[])
}

#[inline]
fn stream_len(count: usize, stride: usize, width: usize) -> usize {
    if count == 0 { 0 } else { (count - 1) * stride + width }
}

#[inline]
fn read_f32(data: &[u8], at: usize) -> Option<f32> {
    data.get(at..at + 4).map(bytemuck::pod_read_unaligned::<f32>)
}

/// A primitive shape rule that does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    InvalidCount { mode: DrawingMode, count: usize },
    VertSize(u32),
    Stride { stream: &'static str, size: usize, width: usize },
    ShortStream { stream: &'static str, len: usize, needed: usize },
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveError::InvalidCount { mode, count } => {
                write!(f, "{count} vertices do not form complete {mode:?}")
            }
            PrimitiveError::VertSize(n) => {
                write!(f, "vert_size must be 2 or 3, got {n}")
            }
            PrimitiveError::Stride { stream, size, width } => {
                write!(f, "{stream}: stride {size} is smaller than the {width}-byte attribute")
            }
            PrimitiveError::ShortStream { stream, len, needed } => {
                write!(f, "{stream}: {len} bytes supplied, {needed} needed")
            }
        }
    }
}

impl std::error::Error for PrimitiveError {}

#[cfg(test)]
mod tests {
    use std::mem::offset_of;

    use bytemuck::Zeroable;

    use super::*;

    #[repr(C)]
    #[derive(Debug, Copy, Clone, Pod, Zeroable)]
    struct TileVert {
        pos: [f32; 2],
        tex: [f32; 2],
        col: [u8; 4],
    }

    fn verts() -> Vec<TileVert> {
        (0..6)
            .map(|i| TileVert {
                pos: [i as f32, 10.0 + i as f32],
                tex: [0.5, i as f32 / 8.0],
                col: [i as u8, 0, 255, 255],
            })
            .collect()
    }

    fn interleaved(buf: &[TileVert], count: usize, mode: DrawingMode) -> GlPrimitive<'_> {
        GlPrimitive::new(
            size_of::<TileVert>(),
            count,
            2,
            mode,
            Some(attribute_bytes(buf, offset_of!(TileVert, pos))),
            Some(attribute_bytes(buf, offset_of!(TileVert, col))),
            Some(attribute_bytes(buf, offset_of!(TileVert, tex))),
        )
    }

    #[test]
    fn new_records_shape_without_overrides() {
        let buf = verts();
        let prim = interleaved(&buf, 6, DrawingMode::Triangles);
        assert_eq!(prim.count, 6);
        assert_eq!(prim.size, size_of::<TileVert>());
        assert!(prim.pretranslate.is_none() && prim.prescale.is_none() && prim.color.is_none());
        assert_eq!(prim.vertices.map(<[u8]>::as_ptr), Some(buf.as_ptr().cast::<u8>()));
    }

    #[test]
    fn interleaved_streams_decode_per_vertex() {
        let buf = verts();
        let prim = interleaved(&buf, 6, DrawingMode::Triangles);
        assert_eq!(prim.position(4), Some([4.0, 14.0, 0.0]));
        assert_eq!(prim.colour(3), Some([3, 0, 255, 255]));
        assert_eq!(prim.texcoord(2), Some([0.5, 0.25]));
    }

    #[test]
    fn valid_interleaved_primitive_passes() {
        let buf = verts();
        assert_eq!(interleaved(&buf, 6, DrawingMode::Triangles).validate(), Ok(()));
        assert_eq!(interleaved(&buf, 4, DrawingMode::Quads).validate(), Ok(()));
    }

    #[test]
    fn count_must_fit_mode() {
        let buf = verts();
        let err = interleaved(&buf, 5, DrawingMode::Triangles).validate();
        assert_eq!(
            err,
            Err(PrimitiveError::InvalidCount { mode: DrawingMode::Triangles, count: 5 })
        );
    }

    #[test]
    fn stream_shorter_than_count_is_rejected() {
        let positions = [0.0f32; 4]; // two 2D vertices
        let prim = GlPrimitive::new(
            8,
            3,
            2,
            DrawingMode::Triangles,
            Some(bytemuck::cast_slice(&positions)),
            None,
            None,
        );
        assert_eq!(
            prim.validate(),
            Err(PrimitiveError::ShortStream { stream: "vertices", len: 16, needed: 24 })
        );
    }

    #[test]
    fn absent_streams_are_not_checked() {
        let prim = GlPrimitive::new(12, 3, 3, DrawingMode::Triangles, None, None, None);
        assert_eq!(prim.validate(), Ok(()));
    }

    #[test]
    fn vert_size_must_be_two_or_three() {
        let prim = GlPrimitive::new(16, 0, 4, DrawingMode::Points, None, None, None);
        assert_eq!(prim.validate(), Err(PrimitiveError::VertSize(4)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid primitive")]
    fn debug_validate_fails_fast() {
        let prim = GlPrimitive::new(8, 7, 2, DrawingMode::Lines, None, None, None);
        prim.debug_validate();
    }

    #[test]
    fn overrides_are_optional_values() {
        let prim = GlPrimitive::new(8, 0, 2, DrawingMode::Points, None, None, None)
            .with_pretranslate(Vec3::new(1.0, 2.0, 0.0))
            .with_color(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(prim.pretranslate, Some(Vec3::new(1.0, 2.0, 0.0)));
        assert_eq!(prim.color.map(Vec3::g), Some(1.0));
        assert!(prim.prescale.is_none());
    }
}
