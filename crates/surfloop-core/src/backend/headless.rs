use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{SurfaceBackend, SurfaceKind};
use crate::handle::NativeHandle;
use crate::surface::Surface;

/// Offscreen backend. Also the fallback when no platform backend produced a
/// native handle.
pub struct HeadlessBackend {
    initial_handle: Option<NativeHandle>,
    size: Mutex<Option<(i32, i32)>>,
    close_via_pump: bool,
    close_pending: AtomicBool,
}

impl HeadlessBackend {
    #[inline]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            initial_handle: None,
            size: Mutex::new(Some((width, height))),
            close_via_pump: false,
            close_pending: AtomicBool::new(false),
        }
    }

    /// No handle, no size.
    #[inline]
    pub fn inert() -> Self {
        Self {
            initial_handle: None,
            size: Mutex::new(None),
            close_via_pump: false,
            close_pending: AtomicBool::new(false),
        }
    }

    /// Handle installed while the surface is constructed.
    #[inline]
    pub fn with_handle(mut self, handle: NativeHandle) -> Self {
        self.initial_handle = Some(handle);
        self
    }

    /// Deliver `Close` from `process_events` instead of from `close()`.
    #[inline]
    pub fn close_via_pump(mut self, enabled: bool) -> Self {
        self.close_via_pump = enabled;
        self
    }
}

impl SurfaceBackend for HeadlessBackend {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Headless
    }

    fn open(&self, surface: &Surface) {
        if let Some(h) = self.initial_handle {
            surface.reset_native_handle(Some(h));
        }
    }

    fn size(&self, _surface: &Surface) -> Option<(i32, i32)> {
        *self.size.lock()
    }

    fn resize(&self, _surface: &Surface, width: i32, height: i32) -> Option<(i32, i32)> {
        let mut size = self.size.lock();
        // non-positive means "keep the current size", re-announce it
        let next = match *size {
            Some(cur) if width <= 0 || height <= 0 => cur,
            _ => (width, height),
        };
        *size = Some(next);
        Some(next)
    }

    fn close(&self, _surface: &Surface) -> bool {
        if self.close_via_pump {
            self.close_pending.store(true, Ordering::Release);
            return false;
        }
        true
    }

    fn process_events(&self, surface: &Surface) {
        if self.close_pending.swap(false, Ordering::AcqRel) {
            surface.emit_close();
        }
    }
}
