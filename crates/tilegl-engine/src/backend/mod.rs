//! Concrete render controllers.
//!
//! Which backends exist is a build-time decision (`soft` / `gpu` features);
//! which one runs is picked by [`create`] from `InitConfig::backend`.

use anyhow::{bail, Result};

use crate::manager::{BackendKind, GlStateManager, InitConfig};

mod names;
mod pixels;

#[cfg(feature = "gpu")]
pub mod gpu;
#[cfg(feature = "soft")]
pub mod soft;

pub(crate) use names::TextureNames;

/// Factory behind `manager::init`.
pub fn create(config: &InitConfig) -> Result<Box<dyn GlStateManager>> {
    if !config.backend.is_available() {
        bail!("{:?} backend is not compiled into this build", config.backend);
    }

    match config.backend {
        #[cfg(feature = "soft")]
        BackendKind::Soft => Ok(Box::new(soft::SoftStateManager::new(config.window_size))),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => Ok(Box::new(gpu::GpuStateManager::new(
            config.window_size,
            config.gpu.clone(),
        )?)),
        #[allow(unreachable_patterns)]
        other => bail!("{other:?} backend is not compiled into this build"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(feature = "gpu"))]
    fn missing_backend_is_an_init_error() {
        let config = InitConfig::default().with_backend(BackendKind::Gpu);
        assert!(create(&config).is_err());
    }

    #[test]
    #[cfg(feature = "soft")]
    fn soft_backend_is_built_on_request() {
        let config = InitConfig::default().with_backend(BackendKind::Soft);
        let manager = create(&config).unwrap();
        assert_eq!(manager.name(), "soft");
        assert_eq!(manager.target_size(), config.window_size);
    }
}
