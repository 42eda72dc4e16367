//! Draw descriptors.
//!
//! - `GlState`: the pipeline configuration subsequent draws run under
//! - `GlPrimitive`: one batched draw call over borrowed vertex streams
//! - `DrawingMode` / `MipMapOptions`: plain enumerations
//!
//! Descriptors are values. The controller never retains a primitive past the
//! `draw_primitive` call it was passed to.

mod mipmap;
mod mode;
mod primitive;
mod state;

pub use mipmap::MipMapOptions;
pub use mode::DrawingMode;
pub use primitive::{
    attribute_bytes, GlPrimitive, PrimitiveError, COLOUR_WIDTH, TEXCOORD_WIDTH,
};
pub use state::{GlState, StateChanges};

pub(crate) use state::AppliedState;
