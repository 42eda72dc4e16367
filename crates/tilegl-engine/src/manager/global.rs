use std::cell::RefCell;

use anyhow::Result;

use super::{GlStateManager, InitConfig};

/// Controller lifecycle: `Uninitialized -> Active -> ShutDown`, and back to
/// `Active` on a later `init`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Active,
    ShutDown,
}

struct Slot {
    lifecycle: Lifecycle,
    manager: Option<Box<dyn GlStateManager>>,
}

thread_local! {
    // The rendering thread owns the controller; other threads see their own
    // empty slot.
    static SLOT: RefCell<Slot> = const {
        RefCell::new(Slot { lifecycle: Lifecycle::Uninitialized, manager: None })
    };
}

/// Builds the backend selected by `config` and makes it the live controller.
pub fn init(config: InitConfig) -> Result<()> {
    let manager = crate::backend::create(&config)?;
    init_with(manager);
    Ok(())
}

/// Installs a caller-built controller.
///
/// Initializing over a live controller is a contract violation: debug builds
/// panic, release builds replace it.
pub fn init_with(manager: Box<dyn GlStateManager>) {
    SLOT.with_borrow_mut(|slot| {
        if slot.lifecycle == Lifecycle::Active {
            debug_assert!(false, "render controller initialized twice");
            log::warn!("replacing live render controller");
        }
        log::info!("render controller active: {}", manager.name());
        slot.manager = Some(manager);
        slot.lifecycle = Lifecycle::Active;
    });
}

/// Destroys the live controller.
pub fn shutdown() {
    let manager = SLOT.with_borrow_mut(|slot| {
        debug_assert!(
            slot.lifecycle == Lifecycle::Active,
            "render controller shut down while {:?}",
            slot.lifecycle
        );
        slot.lifecycle = Lifecycle::ShutDown;
        slot.manager.take()
    });

    // Dropped outside the borrow so backend teardown may log freely.
    if let Some(manager) = manager {
        log::info!("render controller shut down: {}", manager.name());
        drop(manager);
    }
}

pub fn lifecycle() -> Lifecycle {
    SLOT.with_borrow(|slot| slot.lifecycle)
}

#[inline]
pub fn is_active() -> bool {
    lifecycle() == Lifecycle::Active
}

/// Runs `f` against the live controller.
///
/// Calling this outside `Active` is a contract violation: debug builds panic,
/// release builds log and return `None`. Calls do not nest; a nested call
/// panics on the controller borrow.
pub fn with_manager<R>(f: impl FnOnce(&mut dyn GlStateManager) -> R) -> Option<R> {
    SLOT.with_borrow_mut(|slot| {
        let lifecycle = slot.lifecycle;
        match slot.manager.as_deref_mut() {
            Some(manager) => Some(f(manager)),
            None => {
                debug_assert!(false, "render controller used while {lifecycle:?}");
                log::error!("render controller used while {lifecycle:?}; call dropped");
                None
            }
        }
    })
}

#[cfg(all(test, feature = "soft"))]
mod tests {
    use super::*;
    use crate::backend::soft::SoftStateManager;
    use crate::coords::{Vec3, Vec4, WindowSize};
    use crate::draw::{DrawingMode, GlPrimitive, GlState};
    use crate::manager::BackendKind;

    fn soft_config() -> InitConfig {
        InitConfig::default()
            .with_backend(BackendKind::Soft)
            .with_window_size(WindowSize::new(32, 32))
    }

    #[test]
    fn lifecycle_moves_through_init_and_shutdown() {
        assert_eq!(lifecycle(), Lifecycle::Uninitialized);
        init(soft_config()).unwrap();
        assert!(is_active());
        shutdown();
        assert_eq!(lifecycle(), Lifecycle::ShutDown);

        init(soft_config()).unwrap();
        assert!(is_active());
        shutdown();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "render controller used while Uninitialized")]
    fn use_before_init_fails_fast() {
        with_manager(|m| m.reset_transform());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "render controller used while ShutDown")]
    fn use_after_shutdown_fails_fast() {
        init(soft_config()).unwrap();
        shutdown();
        with_manager(|m| m.reset_transform());
    }

    #[test]
    #[should_panic]
    fn nested_calls_are_rejected() {
        init(soft_config()).unwrap();
        with_manager(|_| with_manager(|m| m.reset_transform()));
    }

    #[test]
    fn flat_red_triangle_end_to_end() {
        init(soft_config()).unwrap();

        let positions: [f32; 6] = [2.0, 2.0, 30.0, 2.0, 2.0, 30.0];
        let pixels = with_manager(|m| {
            m.begin_frame(Vec4::new(0.0, 0.0, 0.0, 1.0));
            m.reset_view_for_redraw(32.0, 32.0);
            m.set(&GlState { array_vertex: true, array_colour: true, ..GlState::default() });
            m.set_current_color(Vec3::new(1.0, 0.0, 0.0));
            m.draw_primitive(&GlPrimitive::new(
                8,
                3,
                2,
                DrawingMode::Triangles,
                Some(bytemuck::cast_slice(&positions)),
                None,
                None,
            ));
            m.end_frame();

            let soft = m.as_any().downcast_ref::<SoftStateManager>().unwrap();
            [soft.pixel(5, 5), soft.pixel(28, 28)]
        })
        .unwrap();

        assert_eq!(pixels[0], [255, 0, 0, 255]);
        assert_eq!(pixels[1], [0, 0, 0, 255]);
        shutdown();
    }
}
