//! tilegl engine crate.
//!
//! Backend-agnostic state and primitive descriptors plus the render controller
//! the tile layer draws through. Concrete backends live under [`backend`] and
//! are selected at startup by [`manager::init`].

pub mod backend;
pub mod coords;
pub mod draw;
pub mod logging;
pub mod manager;
pub mod transform;

pub use coords::{Vec3, Vec4, WindowSize};
pub use draw::{DrawingMode, GlPrimitive, GlState, MipMapOptions};
pub use manager::{GlStateManager, TextureId};
