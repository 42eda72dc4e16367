use crate::coords::WindowSize;

#[cfg(feature = "gpu")]
use crate::backend::gpu::GpuInit;

/// Which concrete controller `init` builds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// CPU rasterizer.
    Soft,
    /// wgpu, rendering into an offscreen target.
    Gpu,
}

impl BackendKind {
    /// Environment variable read by [`BackendKind::from_env`].
    pub const ENV_VAR: &'static str = "TILEGL_BACKEND";

    /// Reads `TILEGL_BACKEND` (`soft` / `gpu`), falling back to [`Default`].
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                log::warn!("{}={value:?} is not a backend; using default", Self::ENV_VAR);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "soft" | "software" | "cpu" => Some(BackendKind::Soft),
            "gpu" | "wgpu" => Some(BackendKind::Gpu),
            _ => None,
        }
    }

    /// Whether this backend was compiled in.
    pub const fn is_available(self) -> bool {
        match self {
            BackendKind::Soft => cfg!(feature = "soft"),
            BackendKind::Gpu => cfg!(feature = "gpu"),
        }
    }
}

impl Default for BackendKind {
    /// The GPU backend when compiled in, otherwise the software one.
    fn default() -> Self {
        if cfg!(feature = "gpu") { BackendKind::Gpu } else { BackendKind::Soft }
    }
}

/// Initialization parameters for the controller.
#[derive(Debug, Clone)]
pub struct InitConfig {
    pub backend: BackendKind,

    /// Initial render target size; the projection starts out covering it.
    pub window_size: WindowSize,

    #[cfg(feature = "gpu")]
    pub gpu: GpuInit,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            window_size: WindowSize::new(1280, 720),
            #[cfg(feature = "gpu")]
            gpu: GpuInit::default(),
        }
    }
}

impl InitConfig {
    #[inline]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    #[inline]
    pub fn with_window_size(mut self, window_size: WindowSize) -> Self {
        self.window_size = window_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases_case_insensitively() {
        assert_eq!(BackendKind::parse(" Soft "), Some(BackendKind::Soft));
        assert_eq!(BackendKind::parse("WGPU"), Some(BackendKind::Gpu));
        assert_eq!(BackendKind::parse("vulkan"), None);
    }
}
