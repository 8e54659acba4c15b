mod factory;
mod headless;

pub use factory::{SurfaceCreator, SurfaceFactory};
pub use headless::HeadlessBackend;

use crate::handle::NativeHandle;
use crate::surface::Surface;

/// Which window system a backend talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Platform default when only one kind exists.
    Default,
    X11,
    Wayland,
    Gbm,
    Headless,
}

/// Capability interface of a platform surface backend.
///
/// A backend lives inside its [`Surface`] and receives it on every call, so it
/// can read the current handle or feed events back (`emit_resize`,
/// `emit_close`, `reset_native_handle`). All methods have neutral defaults.
pub trait SurfaceBackend: Send + Sync + 'static {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Default
    }

    /// Called once while the surface is being constructed.
    ///
    /// Register a handle-change listener and call `reset_native_handle` here.
    /// Leaving the handle unset means construction failed.
    fn open(&self, _surface: &Surface) {}

    fn size(&self, _surface: &Surface) -> Option<(i32, i32)> {
        None
    }

    /// Platform side of a resize request. Returns the size to announce now,
    /// or `None` if the event pump will announce it later.
    fn resize(&self, _surface: &Surface, width: i32, height: i32) -> Option<(i32, i32)> {
        Some((width, height))
    }

    /// Platform teardown for a close request. `true` announces `Close` now;
    /// `false` means the event pump calls `Surface::emit_close` later.
    fn close(&self, _surface: &Surface) -> bool {
        true
    }

    /// Pump the native message loop without blocking.
    fn process_events(&self, _surface: &Surface) {}

    fn native_handle_for_gl(&self, surface: &Surface) -> Option<NativeHandle> {
        surface.native_handle()
    }

    fn native_handle_for_vulkan(&self, surface: &Surface) -> Option<NativeHandle> {
        surface.native_handle()
    }

    /// Extra resource a context needs, e.g. the X11/Wayland display.
    fn native_resource(&self, _surface: &Surface) -> Option<NativeHandle> {
        None
    }

    /// Present hook run after the graphics context submitted a frame.
    fn submit(&self, _surface: &Surface) {}

    /// `false` defers the current render pass.
    fn acquire(&self, _surface: &Surface) -> bool {
        true
    }

    fn release(&self, _surface: &Surface) {}
}
