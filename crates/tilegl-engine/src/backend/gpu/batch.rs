//! CPU side of a GPU frame: primitives expanded into one vertex stream plus
//! per-draw uniforms, replayed in a single render pass on flush.

use bytemuck::{Pod, Zeroable};

use crate::coords::Vec4;
use crate::draw::{DrawingMode, GlPrimitive, GlState};
use crate::manager::TextureId;
use crate::transform::Transform;

use super::pipeline::PipelineKey;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuVertex {
    pub pos: [f32; 3],
    pub colour: [f32; 4],
    pub uv: [f32; 2],
}

impl GpuVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // pos
        1 => Float32x4, // colour
        2 => Float32x2  // uv
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct DrawUniforms {
    pub mvp: [[f32; 4]; 4],
    /// x: textured, y: alpha test enabled, z: alpha reference (0..=255).
    pub params: [f32; 4],
}

impl DrawUniforms {
    pub(crate) fn new(mvp: &Transform, state: &GlState, textured: bool) -> Self {
        Self {
            mvp: mvp.matrix().to_cols_array_2d(),
            params: [
                f32::from(u8::from(textured)),
                f32::from(u8::from(state.alphatest)),
                f32::from(state.alpharef),
                0.0,
            ],
        }
    }
}

/// One recorded draw: a range of the frame's vertex stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCall {
    pub key: PipelineKey,
    /// `TextureId::NONE` samples the white fallback.
    pub texture: TextureId,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub uniform_index: u32,
}

#[derive(Debug, Default)]
pub(crate) struct FrameBatch {
    /// Pending clear colour, consumed by the next flush.
    pub clear_colour: Option<Vec4>,
    pub vertices: Vec<GpuVertex>,
    pub uniforms: Vec<DrawUniforms>,
    pub calls: Vec<DrawCall>,
}

impl FrameBatch {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.clear_colour.is_none() && self.calls.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.clear_colour = None;
        self.vertices.clear();
        self.uniforms.clear();
        self.calls.clear();
    }

    /// Draws that sample `texture`.
    pub(crate) fn uses_texture(&self, texture: TextureId) -> bool {
        self.calls.iter().any(|c| c.texture == texture)
    }

    /// Appends one draw. Returns `false` when a stream was too short.
    pub(crate) fn record(
        &mut self,
        prim: &GlPrimitive<'_>,
        state: &GlState,
        mvp: &Transform,
        flat: Vec4,
        texture: TextureId,
    ) -> bool {
        let textured = state.samples_texture(prim.texcoords.is_some()) && !texture.is_none();
        let Some(expanded) = expand(prim, state, flat) else { return false };
        if expanded.is_empty() {
            return true;
        }

        let first_vertex = self.vertices.len() as u32;
        let vertex_count = expanded.len() as u32;
        self.vertices.extend(expanded);
        self.uniforms.push(DrawUniforms::new(mvp, state, textured));
        self.calls.push(DrawCall {
            key: PipelineKey::new(prim.mode, state),
            texture: if textured { texture } else { TextureId::NONE },
            first_vertex,
            vertex_count,
            uniform_index: self.uniforms.len() as u32 - 1,
        });
        true
    }
}

/// Reads a primitive into GPU vertices. Quads become two triangles each.
pub(crate) fn expand(
    prim: &GlPrimitive<'_>,
    state: &GlState,
    flat: Vec4,
) -> Option<Vec<GpuVertex>> {
    let vertex_colours = state.reads_vertex_colour(prim.colours.is_some());
    let textured = state.samples_texture(prim.texcoords.is_some());
    let flat = flat.to_array();

    let vertex = |i: usize| -> Option<GpuVertex> {
        let colour = if vertex_colours {
            Vec4::from_rgba8(prim.colour(i)?).to_array()
        } else {
            flat
        };
        let uv = if textured { prim.texcoord(i)? } else { [0.0; 2] };
        Some(GpuVertex { pos: prim.position(i)?, colour, uv })
    };

    match prim.mode {
        DrawingMode::Quads => {
            let mut out = Vec::with_capacity(prim.count / 4 * 6);
            for q in 0..prim.count / 4 {
                let base = q * 4;
                for offset in [0, 1, 2, 0, 2, 3] {
                    out.push(vertex(base + offset)?);
                }
            }
            Some(out)
        }
        _ => (0..prim.count).map(vertex).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec3;

    const QUAD: [f32; 8] = [0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];

    fn quad(colours: Option<&[u8]>) -> GlPrimitive<'_> {
        let positions = Some(bytemuck::cast_slice(&QUAD));
        GlPrimitive::new(8, 4, 2, DrawingMode::Quads, positions, colours, None)
    }

    fn arrays() -> GlState {
        GlState { array_vertex: true, ..GlState::default() }
    }

    #[test]
    fn quads_expand_to_two_triangles() {
        let verts = expand(&quad(None), &arrays(), Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();
        let xy: Vec<_> = verts.iter().map(|v| [v.pos[0], v.pos[1]]).collect();
        assert_eq!(
            xy,
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0], [4.0, 4.0], [0.0, 4.0]]
        );
        assert!(verts.iter().all(|v| v.colour == [1.0, 0.0, 0.0, 1.0] && v.pos[2] == 0.0));
    }

    #[test]
    fn vertex_colours_need_the_array_enabled() {
        let colours = [0u8, 255, 0, 255].repeat(4);
        let flat = Vec4::new(1.0, 1.0, 1.0, 1.0);

        let off = expand(&quad(Some(&colours)), &arrays(), flat).unwrap();
        assert_eq!(off[0].colour, [1.0; 4]);

        let on_state = GlState { array_colour: true, ..arrays() };
        let on = expand(&quad(Some(&colours)), &on_state, flat).unwrap();
        assert_eq!(on[0].colour, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn short_stream_fails_expansion() {
        let short = [255u8; 8];
        let state = GlState { array_colour: true, ..arrays() };
        assert!(expand(&quad(Some(&short)), &state, Vec4::default()).is_none());
    }

    #[test]
    fn batch_records_ranges_and_uniforms() {
        let mut batch = FrameBatch::default();
        let state = GlState { alphatest: true, alpharef: 64, ..arrays() };
        let mvp = Transform::translate_scale(Some(Vec3::new(1.0, 2.0, 0.0)), None);

        assert!(batch.record(&quad(None), &state, &mvp, Vec4::default(), TextureId(3)));
        let identity = Transform::IDENTITY;
        assert!(batch.record(&quad(None), &state, &identity, Vec4::default(), TextureId::NONE));

        assert_eq!(batch.vertices.len(), 12);
        assert_eq!(batch.calls[1].first_vertex, 6);
        assert_eq!(batch.calls[1].uniform_index, 1);
        // No texcoord stream, so nothing samples texture 3.
        assert!(!batch.uses_texture(TextureId(3)));
        assert_eq!(batch.uniforms[0].params, [0.0, 1.0, 64.0, 0.0]);
        assert_eq!(batch.uniforms[0].mvp[3][..2], [1.0, 2.0]);

        batch.clear();
        assert!(batch.is_empty());
    }
}
