//! Software render controller.
//!
//! Rasterizes on the CPU into an owned colour/depth target. Follows the same
//! fixed-function rules as the GPU backend (modulated texturing, alpha test,
//! source-alpha blending, less-or-equal depth) so it doubles as the reference
//! the behaviour of the abstraction is tested against.

use std::any::Any;
use std::collections::HashMap;

use anyhow::Result;

use crate::backend::TextureNames;
use crate::coords::{Vec3, Vec4, WindowSize};
use crate::draw::{AppliedState, DrawingMode, GlPrimitive, GlState, MipMapOptions};
use crate::manager::{is_valid_unpack_alignment, GlStateManager, TextureId};
use crate::transform::Transform;

mod raster;
mod target;
mod texture;

use raster::{Fragment, ScreenVertex};
use target::Framebuffer;
use texture::SoftTexture;

/// Counters since construction.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SoftStats {
    pub draw_calls: u64,
    /// Individual state fields changed by `set`.
    pub state_changes: u64,
    /// `set` calls that matched the applied state and were skipped.
    pub redundant_sets: u64,
    /// Filled triangles submitted, quads counting as two.
    pub triangles: u64,
    pub fragments_written: u64,
}

pub struct SoftStateManager {
    state: AppliedState,
    target: Framebuffer,

    projection: Transform,
    model_view: Transform,
    current_colour: Vec4,

    unpack_alignment: u32,
    names: TextureNames,
    textures: HashMap<TextureId, SoftTexture>,
    bound: TextureId,

    stats: SoftStats,
}

impl SoftStateManager {
    pub fn new(window_size: WindowSize) -> Self {
        log::info!("soft backend: {}x{} target", window_size.x, window_size.y);
        Self {
            state: AppliedState::default(),
            target: Framebuffer::new(window_size),
            projection: Transform::orthographic(window_size.x as f32, window_size.y as f32),
            model_view: Transform::IDENTITY,
            current_colour: Vec4::new(1.0, 1.0, 1.0, 1.0),
            unpack_alignment: 4,
            names: TextureNames::default(),
            textures: HashMap::new(),
            bound: TextureId::NONE,
            stats: SoftStats::default(),
        }
    }

    /// RGBA8 value of one target pixel (row 0 is the top).
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        Vec4::from(self.target.colour_at(x, y)).to_rgba8()
    }

    /// Window depth of one target pixel.
    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.target.depth_at(x, y)
    }

    #[inline]
    pub fn stats(&self) -> SoftStats {
        self.stats
    }

    #[inline]
    pub fn current_state(&self) -> GlState {
        self.state.current()
    }

    #[inline]
    pub fn current_colour(&self) -> Vec4 {
        self.current_colour
    }

    #[inline]
    pub fn bound_texture(&self) -> TextureId {
        self.bound
    }

    /// Stored mip levels of a loaded texture.
    pub fn texture_levels(&self, texture: TextureId) -> Option<usize> {
        self.textures.get(&texture).map(|t| t.levels.len())
    }

    fn to_window(&self, mvp: &Transform, p: [f32; 3]) -> (f32, f32, f32) {
        let clip = mvp.project(p);
        let w = if clip.w == 0.0 { 1.0 } else { clip.w };
        let size = self.target.size();
        let (nx, ny, nz) = (clip.x / w, clip.y / w, clip.z / w);
        (
            (nx + 1.0) * 0.5 * size.x as f32,
            (1.0 - ny) * 0.5 * size.y as f32,
            (nz + 1.0) * 0.5,
        )
    }
}

impl GlStateManager for SoftStateManager {
    fn name(&self) -> &str {
        "soft"
    }

    fn set(&mut self, state: &GlState) {
        let changes = self.state.apply(state);
        if changes.is_empty() {
            self.stats.redundant_sets += 1;
            return;
        }
        self.stats.state_changes += u64::from(changes.bits().count_ones());
        log::trace!("soft: state changes {changes:?}");
    }

    fn pixelstore_unpack_alignment(&mut self, bpp: u32) {
        debug_assert!(is_valid_unpack_alignment(bpp), "unpack alignment {bpp}");
        if !is_valid_unpack_alignment(bpp) {
            log::warn!("soft: ignoring unpack alignment {bpp}");
            return;
        }
        self.unpack_alignment = bpp;
    }

    fn reset_view_for_redraw(&mut self, x: f32, y: f32) {
        self.projection = Transform::orthographic(x, y);
        self.model_view = Transform::IDENTITY;
    }

    fn reset_view_for_resize(&mut self, window_size: WindowSize) {
        log::debug!("soft: resize to {}x{}", window_size.x, window_size.y);
        self.target.resize(window_size);
        self.reset_view_for_redraw(window_size.x as f32, window_size.y as f32);
    }

    fn set_transform(&mut self, trans: Option<Vec3>, scale: Option<Vec3>) {
        self.model_view = Transform::translate_scale(trans, scale);
    }

    fn reset_transform(&mut self) {
        self.model_view = Transform::IDENTITY;
    }

    fn set_current_color_rgba(&mut self, color: Vec4) {
        self.current_colour = color;
    }

    fn draw_primitive(&mut self, prim: &GlPrimitive<'_>) {
        prim.debug_validate();
        self.stats.draw_calls += 1;

        let state = self.state.current();
        if prim.count == 0 || !state.array_vertex || prim.vertices.is_none() {
            log::trace!("soft: draw with no vertex array skipped");
            return;
        }

        let mvp = self.projection
            * self.model_view
            * Transform::translate_scale(prim.pretranslate, prim.prescale);
        let flat = prim.color.map_or(self.current_colour, Vec4::from).to_array();
        let vertex_colours = state.reads_vertex_colour(prim.colours.is_some());
        let textured = state.samples_texture(prim.texcoords.is_some());

        let verts: Option<Vec<ScreenVertex>> = (0..prim.count)
            .map(|i| {
                let (x, y, depth) = self.to_window(&mvp, prim.position(i)?);
                let colour = if vertex_colours {
                    Vec4::from_rgba8(prim.colour(i)?).to_array()
                } else {
                    flat
                };
                let uv = if textured { prim.texcoord(i)? } else { [0.0; 2] };
                Some(ScreenVertex { x, y, depth, colour, uv })
            })
            .collect();
        let Some(verts) = verts else {
            log::error!(
                "soft: primitive streams shorter than {} vertices; draw dropped",
                prim.count
            );
            return;
        };

        let WindowSize { x: w, y: h } = self.target.size();
        let texture = if textured { self.textures.get(&self.bound) } else { None };
        let target = &mut self.target;
        let mut written = 0u64;

        let mut shade = |frag: Fragment| {
            let mut colour = frag.colour;
            if let Some(tex) = texture {
                let texel = tex.sample(frag.uv);
                colour = std::array::from_fn(|c| colour[c] * texel[c]);
            }
            if !state.passes_alpha_test(colour[3]) {
                return;
            }
            if state.depthtest && frag.depth > target.depth_at(frag.x, frag.y) {
                return;
            }
            if state.blend {
                let dst = target.colour_at(frag.x, frag.y);
                let a = colour[3];
                colour = std::array::from_fn(|c| colour[c] * a + dst[c] * (1.0 - a));
            }
            target.write(frag.x, frag.y, colour, state.depthtest.then_some(frag.depth));
            written += 1;
        };

        match prim.mode {
            DrawingMode::Points => {
                for v in &verts {
                    raster::point(v, w, h, &mut shade);
                }
            }
            DrawingMode::Lines => {
                for seg in verts.chunks_exact(2) {
                    raster::line(&seg[0], &seg[1], w, h, &mut shade);
                }
            }
            DrawingMode::Triangles => {
                for tri in verts.chunks_exact(3) {
                    raster::triangle(&tri[0], &tri[1], &tri[2], w, h, &mut shade);
                }
            }
            DrawingMode::TriangleStrip => {
                for tri in verts.windows(3) {
                    raster::triangle(&tri[0], &tri[1], &tri[2], w, h, &mut shade);
                }
            }
            DrawingMode::Quads => {
                for quad in verts.chunks_exact(4) {
                    raster::triangle(&quad[0], &quad[1], &quad[2], w, h, &mut shade);
                    raster::triangle(&quad[0], &quad[2], &quad[3], w, h, &mut shade);
                }
            }
        }

        self.stats.triangles += prim.mode.triangle_count(prim.count) as u64;
        self.stats.fragments_written += written;
    }

    fn generate_textures(&mut self, count: usize) -> Vec<TextureId> {
        let ids = self.names.generate(count);
        log::debug!("soft: generated textures {ids:?}");
        ids
    }

    fn delete_textures(&mut self, textures: &[TextureId]) {
        for id in textures {
            self.textures.remove(id);
            if *id == self.bound {
                self.bound = TextureId::NONE;
            }
        }
        self.names.delete(textures);
        log::debug!("soft: deleted textures {textures:?}");
    }

    fn bind_texture(&mut self, texture: TextureId) {
        debug_assert!(
            texture.is_none() || self.names.is_live(texture),
            "binding texture {texture:?} that is not live"
        );
        self.bound = texture;
    }

    fn load_texture(&mut self, pixels: &[u8], width: u32, height: u32, mip_opt: MipMapOptions) {
        debug_assert!(!self.bound.is_none(), "load_texture with no texture bound");
        if self.bound.is_none() {
            log::warn!("soft: load_texture with no texture bound; ignored");
            return;
        }

        match SoftTexture::load(pixels, width, height, self.unpack_alignment, mip_opt) {
            Some(tex) => {
                log::debug!(
                    "soft: texture {:?} loaded {width}x{height}, {} levels",
                    self.bound,
                    tex.levels.len()
                );
                self.textures.insert(self.bound, tex);
            }
            None => {
                debug_assert!(false, "pixel data too short for {width}x{height}");
                log::error!("soft: pixel data too short for {width}x{height}; upload dropped");
            }
        }
    }

    fn begin_frame(&mut self, clear: Vec4) {
        self.target.clear(clear.to_array());
    }

    fn end_frame(&mut self) {}

    fn target_size(&self) -> WindowSize {
        self.target.size()
    }

    fn read_pixels(&mut self) -> Result<Vec<u8>> {
        Ok(self.target.read_rgba8())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
