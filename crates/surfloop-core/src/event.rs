use crate::handle::NativeHandle;

/// Lifecycle event delivered from a surface to the render thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Last event a surface ever delivers.
    Close,
    Resize { width: i32, height: i32 },
    /// `after == None`: backing drawable gone. `before == None`: first acquisition.
    NativeHandle {
        before: Option<NativeHandle>,
        after: Option<NativeHandle>,
    },
}

impl SurfaceEvent {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceEvent::Close => "close",
            SurfaceEvent::Resize { .. } => "resize",
            SurfaceEvent::NativeHandle { .. } => "native_handle",
        }
    }
}
