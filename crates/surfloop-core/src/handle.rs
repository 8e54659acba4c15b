use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::c_void;
use std::fmt;
use std::num::NonZeroUsize;

/// Opaque, pointer-sized platform handle (window, buffer, layer, display).
///
/// "No handle" is `Option::<NativeHandle>::None`. The core never owns what it
/// points to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(NonZeroUsize);

impl NativeHandle {
    #[inline]
    pub fn from_usize(v: usize) -> Option<Self> {
        NonZeroUsize::new(v).map(Self)
    }

    #[inline]
    pub fn from_ptr<T>(ptr: *mut T) -> Option<Self> {
        Self::from_usize(ptr as usize)
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0.get()
    }

    #[inline]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.get() as *mut c_void
    }

    /// Window-ish value a graphics API would be created from.
    pub fn from_raw_window_handle(raw: &RawWindowHandle) -> Option<Self> {
        match raw {
            RawWindowHandle::Xlib(h) => Self::from_usize(h.window as usize),
            RawWindowHandle::Xcb(h) => Self::from_usize(h.window.get() as usize),
            RawWindowHandle::Wayland(h) => Self::from_ptr(h.surface.as_ptr()),
            RawWindowHandle::Win32(h) => Self::from_usize(h.hwnd.get() as usize),
            RawWindowHandle::WinRt(h) => Self::from_ptr(h.core_window.as_ptr()),
            RawWindowHandle::AndroidNdk(h) => Self::from_ptr(h.a_native_window.as_ptr()),
            RawWindowHandle::AppKit(h) => Self::from_ptr(h.ns_view.as_ptr()),
            RawWindowHandle::UiKit(h) => Self::from_ptr(h.ui_view.as_ptr()),
            RawWindowHandle::Gbm(h) => Self::from_ptr(h.gbm_surface.as_ptr()),
            RawWindowHandle::Drm(h) => Self::from_usize(h.plane as usize),
            _ => None,
        }
    }

    /// Extra resource some contexts need next to the window (X11/Wayland
    /// display, GBM device).
    pub fn from_raw_display_handle(raw: &RawDisplayHandle) -> Option<Self> {
        match raw {
            RawDisplayHandle::Xlib(h) => h.display.and_then(|d| Self::from_ptr(d.as_ptr())),
            RawDisplayHandle::Xcb(h) => h.connection.and_then(|c| Self::from_ptr(c.as_ptr())),
            RawDisplayHandle::Wayland(h) => Self::from_ptr(h.display.as_ptr()),
            RawDisplayHandle::Gbm(h) => Self::from_ptr(h.gbm_device.as_ptr()),
            _ => None,
        }
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:#x})", self.0.get())
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// `Option<NativeHandle>` for log lines.
pub(crate) struct ShowHandle(pub Option<NativeHandle>);

impl fmt::Display for ShowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(h) => write!(f, "{h}"),
            None => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raw_window_handle::{WaylandWindowHandle, XlibWindowHandle};
    use std::ptr::NonNull;

    #[test]
    fn zero_is_no_handle() {
        assert_eq!(NativeHandle::from_usize(0), None);
        assert_eq!(NativeHandle::from_ptr::<u8>(std::ptr::null_mut()), None);
        assert_eq!(NativeHandle::from_usize(0x40).map(NativeHandle::as_usize), Some(0x40));
    }

    #[test]
    fn raw_window_handles_convert() {
        let xlib = RawWindowHandle::Xlib(XlibWindowHandle::new(0x1234));
        assert_eq!(
            NativeHandle::from_raw_window_handle(&xlib),
            NativeHandle::from_usize(0x1234)
        );

        let mut slot = 7u32;
        let ptr = NonNull::from(&mut slot).cast::<c_void>();
        let wl = RawWindowHandle::Wayland(WaylandWindowHandle::new(ptr));
        assert_eq!(
            NativeHandle::from_raw_window_handle(&wl).map(NativeHandle::as_ptr),
            Some(ptr.as_ptr())
        );

        let unmapped = RawWindowHandle::Xlib(XlibWindowHandle::new(0));
        assert_eq!(NativeHandle::from_raw_window_handle(&unmapped), None);
    }

    #[test]
    fn show_handle_prints_null() {
        assert_eq!(ShowHandle(None).to_string(), "null");
        assert_eq!(ShowHandle(NativeHandle::from_usize(0x10)).to_string(), "0x10");
    }
}
