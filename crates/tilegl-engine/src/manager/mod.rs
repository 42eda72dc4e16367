//! Render controller contract and its process-wide handle.
//!
//! Every draw flows through one [`GlStateManager`]. Exactly one implementation
//! is live at a time; it is built by [`init`], reached through
//! [`with_manager`] and destroyed by [`shutdown`].
//!
//! State set through `set`, `set_current_color*` and `set_transform` persists
//! across calls until changed. Nothing is reset between draws, so many
//! primitives can be batched under one configuration.

use std::any::Any;

use crate::coords::{Vec3, Vec4, WindowSize};
use crate::draw::{GlPrimitive, GlState, MipMapOptions};

mod config;
mod global;

pub use config::{BackendKind, InitConfig};
pub use global::{init, init_with, is_active, lifecycle, shutdown, with_manager, Lifecycle};

/// Texture name handed out by `generate_textures`.
///
/// `TextureId(0)` is never generated; binding it unbinds the current texture.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NONE: TextureId = TextureId(0);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Backend-agnostic render controller.
///
/// Implementations must produce the same output whether or not they skip
/// redundant state changes, and must never keep a primitive's borrowed data
/// past `draw_primitive`.
pub trait GlStateManager {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    // ── state ─────────────────────────────────────────────────────────────

    /// Makes the pipeline configuration match `state`.
    fn set(&mut self, state: &GlState);

    /// Row alignment, in bytes, of pixel data passed to later `load_texture` calls.
    fn pixelstore_unpack_alignment(&mut self, bpp: u32);

    /// Reasserts an orthographic projection over `[0, x] x [0, y]` and resets
    /// the model-view transform.
    fn reset_view_for_redraw(&mut self, x: f32, y: f32);

    /// Resizes the render target to `window_size` and rebuilds the projection
    /// for it.
    fn reset_view_for_resize(&mut self, window_size: WindowSize);

    /// Transform applied to every following primitive. `None` means no
    /// translation / no scaling.
    fn set_transform(&mut self, trans: Option<Vec3>, scale: Option<Vec3>);

    fn reset_transform(&mut self);

    /// Opaque current colour.
    fn set_current_color(&mut self, color: Vec3) {
        self.set_current_color_rgba(color.into());
    }

    fn set_current_color_rgba(&mut self, color: Vec4);

    // ── drawing ───────────────────────────────────────────────────────────

    /// Draws `prim` under the applied state, transform and colour.
    ///
    /// Debug builds panic on a primitive that fails `GlPrimitive::validate`.
    fn draw_primitive(&mut self, prim: &GlPrimitive<'_>);

    // ── textures ──────────────────────────────────────────────────────────

    /// Mints `count` names not currently in use.
    fn generate_textures(&mut self, count: usize) -> Vec<TextureId>;

    /// Releases names. Using a deleted name afterwards is a contract violation.
    fn delete_textures(&mut self, textures: &[TextureId]);

    fn bind_texture(&mut self, texture: TextureId);

    /// Uploads RGBA8 `pixels` into the bound texture.
    fn load_texture(&mut self, pixels: &[u8], width: u32, height: u32, mip_opt: MipMapOptions);

    // ── frames ────────────────────────────────────────────────────────────

    /// Clears colour to `clear` and depth to the far plane.
    fn begin_frame(&mut self, clear: Vec4);

    /// Submits outstanding work.
    fn end_frame(&mut self);

    fn target_size(&self) -> WindowSize;

    /// Top-down RGBA8 rows of the render target.
    fn read_pixels(&mut self) -> anyhow::Result<Vec<u8>>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Row stride of RGBA8 pixel data under an unpack alignment.
#[inline]
pub fn unpack_row_stride(width: u32, alignment: u32) -> usize {
    let row = width as usize * 4;
    let align = alignment.max(1) as usize;
    row.div_ceil(align) * align
}

/// Whether `bpp` is an alignment the backends accept.
#[inline]
pub const fn is_valid_unpack_alignment(bpp: u32) -> bool {
    matches!(bpp, 1 | 2 | 4 | 8)
}
