//! Plain value types carried through the controller.
//!
//! Positions use the tile layer's logical space (origin top-left, +Y down).
//! Colours are straight (non-premultiplied) RGBA in `[0, 1]`.

mod vec3;
mod vec4;
mod window_size;

pub use vec3::Vec3;
pub use vec4::Vec4;
pub use window_size::WindowSize;
