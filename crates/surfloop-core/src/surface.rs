use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::{SurfaceBackend, SurfaceKind};
use crate::event::SurfaceEvent;
use crate::handle::{NativeHandle, ShowHandle};
use crate::sync::MpscFifo;

/// Process-unique surface id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

type HandleListener = Arc<dyn Fn(&Surface, Option<NativeHandle>) + Send + Sync>;
type EventListener = Arc<dyn Fn(&Surface) + Send + Sync>;

/// On-screen drawable: current native handle plus the ordered event stream the
/// render thread consumes.
///
/// Producers (`reset_native_handle`, `resize`, `close`) may run on any thread;
/// `pop_event` belongs to the render thread.
pub struct Surface {
    id: SurfaceId,
    handle: AtomicUsize,
    closed: AtomicBool,
    close_requested: AtomicBool,
    // serializes pushes so NativeHandle+Resize stay adjacent and nothing follows Close
    emit: Mutex<()>,
    events: MpscFifo<SurfaceEvent>,
    handle_listener: Mutex<Option<HandleListener>>,
    event_listener: Mutex<Option<EventListener>>,
    backend: Box<dyn SurfaceBackend>,
}

impl Surface {
    /// Build a surface and let the backend open it.
    pub fn new<B: SurfaceBackend>(backend: B) -> Self {
        let surface = Self {
            id: SurfaceId::next(),
            handle: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            close_requested: AtomicBool::new(false),
            emit: Mutex::new(()),
            events: MpscFifo::new(),
            handle_listener: Mutex::new(None),
            event_listener: Mutex::new(None),
            backend: Box::new(backend),
        };
        surface.backend.open(&surface);
        match surface.native_handle() {
            Some(h) => debug!(target: "surface", "surface.open {} kind={:?} handle={}", surface.id, surface.kind(), h),
            None => warn!(target: "surface", "surface.open {} kind={:?} reason='no native handle'", surface.id, surface.kind()),
        }
        surface
    }

    #[inline]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> SurfaceKind {
        self.backend.kind()
    }

    #[inline]
    pub fn native_handle(&self) -> Option<NativeHandle> {
        NativeHandle::from_usize(self.handle.load(Ordering::Acquire))
    }

    #[inline]
    pub fn native_handle_for_gl(&self) -> Option<NativeHandle> {
        self.backend.native_handle_for_gl(self)
    }

    #[inline]
    pub fn native_handle_for_vulkan(&self) -> Option<NativeHandle> {
        self.backend.native_handle_for_vulkan(self)
    }

    #[inline]
    pub fn native_resource(&self) -> Option<NativeHandle> {
        self.backend.native_resource(self)
    }

    #[inline]
    pub fn size(&self) -> Option<(i32, i32)> {
        self.backend.size(self)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Listener invoked synchronously with the previous handle whenever the
    /// handle changes, before the change is observable as an event.
    pub fn set_native_handle_listener<F>(&self, f: F)
    where
        F: Fn(&Surface, Option<NativeHandle>) + Send + Sync + 'static,
    {
        *self.handle_listener.lock() = Some(Arc::new(f));
    }

    /// Wake-up listener fired after events are enqueued.
    pub fn set_event_listener<F>(&self, f: F)
    where
        F: Fn(&Surface) + Send + Sync + 'static,
    {
        *self.event_listener.lock() = Some(Arc::new(f));
    }

    pub fn clear_event_listener(&self) {
        *self.event_listener.lock() = None;
    }

    /// Swap the native handle.
    ///
    /// Emits `NativeHandle { before, after }` and, when a handle was acquired and
    /// the backend knows its size, a `Resize` right behind it. Callers are
    /// expected to come from one logical event source at a time. A closed
    /// surface keeps its last handle and notifies nobody.
    pub fn reset_native_handle(&self, handle: Option<NativeHandle>) {
        if self.is_closed() {
            trace!(target: "surface", "surface.handle {} ignored reason='closed'", self.id);
            return;
        }
        let raw = handle.map_or(0, NativeHandle::as_usize);
        let old = NativeHandle::from_usize(self.handle.swap(raw, Ordering::AcqRel));
        if old == handle {
            return;
        }
        debug!(
            target: "surface",
            "surface.handle {} before={} after={}",
            self.id,
            ShowHandle(old),
            ShowHandle(handle)
        );

        let listener = self.handle_listener.lock().clone();
        if let Some(listener) = listener {
            listener(self, old);
        }

        let size = handle.and_then(|_| self.size());
        {
            let _emit = self.emit.lock();
            if self.is_closed() {
                return;
            }
            self.events.push(SurfaceEvent::NativeHandle { before: old, after: handle });
            if let Some((width, height)) = size {
                self.events.push(SurfaceEvent::Resize { width, height });
            }
        }
        self.notify();
    }

    /// Request a resize. The backend does the platform work and decides when
    /// the `Resize` event is announced.
    pub fn resize(&self, width: i32, height: i32) {
        if self.is_closed() {
            return;
        }
        if let Some((w, h)) = self.backend.resize(self, width, height) {
            self.emit_resize(w, h);
        }
    }

    /// Request a close. At most one `Close` is ever delivered.
    pub fn close(&self) {
        if self.is_closed() || self.close_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(target: "surface", "surface.close_request {}", self.id);
        if self.backend.close(self) {
            self.emit_close();
        }
    }

    /// Announce a size; for backend event pumps.
    pub fn emit_resize(&self, width: i32, height: i32) {
        {
            let _emit = self.emit.lock();
            if self.is_closed() {
                return;
            }
            self.events.push(SurfaceEvent::Resize { width, height });
        }
        self.notify();
    }

    /// Announce the close; for backend event pumps. `false` if already closed.
    pub fn emit_close(&self) -> bool {
        {
            let _emit = self.emit.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                return false;
            }
            self.close_requested.store(true, Ordering::Release);
            self.events.push(SurfaceEvent::Close);
        }
        debug!(target: "surface", "surface.closed {}", self.id);
        self.notify();
        true
    }

    /// Render thread only. Pumps the backend once when nothing is queued.
    pub fn pop_event(&self) -> Option<SurfaceEvent> {
        self.events.pop().or_else(|| {
            self.backend.process_events(self);
            self.events.pop()
        })
    }

    #[inline]
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    #[inline]
    pub fn process_events(&self) {
        self.backend.process_events(self);
    }

    #[inline]
    pub fn submit(&self) {
        self.backend.submit(self);
    }

    #[inline]
    pub fn acquire(&self) -> bool {
        self.backend.acquire(self)
    }

    #[inline]
    pub fn release(&self) {
        self.backend.release(self);
    }

    fn notify(&self) {
        let listener = self.event_listener.lock().clone();
        match listener {
            Some(listener) => listener(self),
            None => trace!(target: "surface", "surface.notify {} no listener", self.id),
        }
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("handle", &self.native_handle())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        trace!(target: "surface", "surface.drop {}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use std::thread;

    fn h(v: usize) -> Option<NativeHandle> {
        NativeHandle::from_usize(v)
    }

    fn drain(s: &Surface) -> Vec<SurfaceEvent> {
        std::iter::from_fn(|| s.pop_event()).collect()
    }

    #[test]
    fn open_announces_handle_then_size() {
        let s = Surface::new(HeadlessBackend::new(640, 480).with_handle(h(0x10).unwrap()));
        assert_eq!(s.native_handle(), h(0x10));
        assert_eq!(
            drain(&s),
            vec![
                SurfaceEvent::NativeHandle { before: None, after: h(0x10) },
                SurfaceEvent::Resize { width: 640, height: 480 },
            ]
        );
    }

    #[test]
    fn inert_surface_has_no_events() {
        let s = Surface::new(HeadlessBackend::inert());
        assert_eq!(s.native_handle(), None);
        assert_eq!(s.pop_event(), None);
    }

    #[test]
    fn reset_to_same_handle_is_silent() {
        let s = Surface::new(HeadlessBackend::new(1, 1));
        s.reset_native_handle(h(7));
        drain(&s);
        s.reset_native_handle(h(7));
        assert_eq!(s.pop_event(), None);
    }

    #[test]
    fn losing_handle_has_no_resize() {
        let s = Surface::new(HeadlessBackend::new(8, 8).with_handle(h(1).unwrap()));
        drain(&s);
        s.reset_native_handle(None);
        assert_eq!(drain(&s), vec![SurfaceEvent::NativeHandle { before: h(1), after: None }]);
    }

    #[test]
    fn handle_listener_sees_previous_value() {
        let s = Surface::new(HeadlessBackend::inert());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        s.set_native_handle_listener(move |surface, old| {
            sink.lock().push((old, surface.native_handle(), surface.has_pending_events()));
        });
        s.reset_native_handle(h(3));
        s.reset_native_handle(h(4));
        assert_eq!(*seen.lock(), vec![(None, h(3), false), (h(3), h(4), true)]);
    }

    #[test]
    fn nothing_after_close() {
        let s = Surface::new(HeadlessBackend::new(2, 2).with_handle(h(5).unwrap()));
        drain(&s);
        s.close();
        s.close();
        s.resize(10, 10);
        s.reset_native_handle(h(6));
        assert!(!s.emit_close());
        assert!(s.is_closed());
        assert_eq!(drain(&s), vec![SurfaceEvent::Close]);
    }

    #[test]
    fn closed_surface_keeps_its_handle() {
        let s = Surface::new(HeadlessBackend::new(2, 2).with_handle(h(5).unwrap()));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        s.set_native_handle_listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        s.close();
        s.reset_native_handle(h(6));
        s.reset_native_handle(None);
        assert_eq!(s.native_handle(), h(5));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn resize_goes_through_backend() {
        let s = Surface::new(HeadlessBackend::new(100, 50));
        s.resize(300, 200);
        s.resize(0, 0);
        assert_eq!(s.size(), Some((300, 200)));
        assert_eq!(
            drain(&s),
            vec![
                SurfaceEvent::Resize { width: 300, height: 200 },
                SurfaceEvent::Resize { width: 300, height: 200 },
            ]
        );
    }

    #[test]
    fn close_via_pump_is_deferred() {
        let s = Surface::new(HeadlessBackend::new(1, 1).close_via_pump(true));
        s.close();
        assert!(!s.is_closed());
        assert!(!s.has_pending_events());
        // pop pumps the backend once when the queue is empty
        assert_eq!(s.pop_event(), Some(SurfaceEvent::Close));
        assert!(s.is_closed());
        assert_eq!(s.pop_event(), None);
    }

    #[test]
    fn event_listener_fires_per_emit() {
        let s = Surface::new(HeadlessBackend::new(4, 4));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        s.set_event_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        s.reset_native_handle(h(9));
        s.resize(5, 5);
        s.close();
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        s.clear_event_listener();
        s.emit_resize(1, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn concurrent_resizes_stop_at_close() {
        let s = Arc::new(Surface::new(HeadlessBackend::new(1, 1)));
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let s = s.clone();
                thread::spawn(move || {
                    for n in 0..500 {
                        s.emit_resize(i, n);
                    }
                })
            })
            .collect();
        s.close();
        for w in writers {
            w.join().unwrap();
        }
        let events = drain(&s);
        assert_eq!(events.last(), Some(&SurfaceEvent::Close));
        assert_eq!(events.iter().filter(|e| **e == SurfaceEvent::Close).count(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let a = Surface::new(HeadlessBackend::inert());
        let b = Surface::new(HeadlessBackend::inert());
        assert_ne!(a.id(), b.id());
        assert!(a.id().to_string().starts_with("surface#"));
    }
}
