//! Renders a small tile scene headlessly and writes it to a PNG.
//!
//! Usage: `tilegl-snapshot [OUT.png]`. `TILEGL_BACKEND=soft|gpu` picks the
//! backend; a failed GPU init falls back to the software one.

#[cfg(feature = "tiles")]
mod scene;

use tilegl_engine::logging::{init_logging, LoggingConfig};

const DEFAULT_OUTPUT: &str = "tilegl-snapshot.png";

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let output = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_OUTPUT.to_owned());
    run(&output)
}

#[cfg(feature = "tiles")]
fn run(output: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    use tilegl_engine::backend::gpu::GpuStateManager;
    use tilegl_engine::manager::{self, BackendKind, InitConfig};

    let config = InitConfig::default()
        .with_backend(BackendKind::from_env())
        .with_window_size(scene::SIZE);

    if let Err(err) = manager::init(config.clone()) {
        if config.backend == BackendKind::Soft {
            return Err(err);
        }
        log::warn!("gpu init failed ({err:#}); falling back to the software backend");
        manager::init(config.with_backend(BackendKind::Soft))?;
    }

    let pixels = manager::with_manager(|m| {
        if let Some(gpu) = m.as_any().downcast_ref::<GpuStateManager>() {
            log::info!("rendering on {}", gpu.adapter_name());
        }
        scene::draw(m);
        m.read_pixels()
    })
    .context("render controller is not active")??;
    manager::shutdown();

    let image = image::RgbaImage::from_raw(scene::SIZE.x, scene::SIZE.y, pixels)
        .context("readback size does not match the target")?;
    image.save(output).with_context(|| format!("failed to write {output}"))?;
    log::info!("wrote {output}");
    Ok(())
}

#[cfg(not(feature = "tiles"))]
fn run(_output: &str) -> anyhow::Result<()> {
    log::warn!("tile rendering is not compiled in (feature `tiles`); nothing to draw");
    Ok(())
}
