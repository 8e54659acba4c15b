use log::debug;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use std::sync::Arc;
use surfloop_core::{NativeHandle, Surface, SurfaceBackend, SurfaceKind};
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Handle of `window` as seen by a graphics API, if the window is mapped.
pub fn window_native_handle(window: &Window) -> Option<NativeHandle> {
    let handle = window.window_handle().ok()?;
    NativeHandle::from_raw_window_handle(&handle.as_raw())
}

fn kind_of(raw: &RawWindowHandle) -> SurfaceKind {
    match raw {
        RawWindowHandle::Xlib(_) | RawWindowHandle::Xcb(_) => SurfaceKind::X11,
        RawWindowHandle::Wayland(_) => SurfaceKind::Wayland,
        RawWindowHandle::Gbm(_) | RawWindowHandle::Drm(_) => SurfaceKind::Gbm,
        _ => SurfaceKind::Default,
    }
}

/// A winit window behind a [`Surface`].
///
/// Window events are fed in by [`crate::WinitHost`]; this side only answers
/// queries and turns surface requests into window requests.
pub struct WinitBackend {
    window: Arc<Window>,
}

impl WinitBackend {
    #[inline]
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    #[inline]
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl SurfaceBackend for WinitBackend {
    fn kind(&self) -> SurfaceKind {
        self.window
            .window_handle()
            .map(|h| kind_of(&h.as_raw()))
            .unwrap_or(SurfaceKind::Default)
    }

    fn open(&self, surface: &Surface) {
        surface.reset_native_handle(window_native_handle(&self.window));
    }

    fn size(&self, _surface: &Surface) -> Option<(i32, i32)> {
        let size = self.window.inner_size();
        Some((size.width as i32, size.height as i32))
    }

    fn resize(&self, surface: &Surface, width: i32, height: i32) -> Option<(i32, i32)> {
        let requested = PhysicalSize::new(width.max(1) as u32, height.max(1) as u32);
        let applied = self.window.request_inner_size(requested);
        if applied.is_none() {
            debug!(target: "platform.winit", "window.resize {} {}x{} deferred", surface.id(), width, height);
        }
        applied.map(|s| (s.width as i32, s.height as i32))
    }

    fn close(&self, surface: &Surface) -> bool {
        debug!(target: "platform.winit", "window.close {} id={:?}", surface.id(), self.window.id());
        self.window.set_visible(false);
        true
    }

    fn native_resource(&self, _surface: &Surface) -> Option<NativeHandle> {
        let display = self.window.display_handle().ok()?;
        NativeHandle::from_raw_display_handle(&display.as_raw())
    }

    fn submit(&self, _surface: &Surface) {
        self.window.pre_present_notify();
    }
}
