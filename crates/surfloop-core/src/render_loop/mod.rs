//! Render thread scheduler: one graphics context lifecycle per attached surface.

mod hooks;
mod provider;
mod state;

pub use hooks::{CloseHook, ContextHook, DrawHook, RenderHooks, ResizeHook};
pub use provider::{ContextChanges, RenderContextProvider};

use crossbeam_channel::Receiver;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::RenderLoopConfig;
use crate::error::{LoopError, LoopResult};
use crate::surface::{Surface, SurfaceId};
use crate::sync::{StopSignal, StopToken};
use crate::task_queue::TaskQueue;
use state::LoopState;

/// State reachable from any thread.
pub(crate) struct Shared<P: RenderContextProvider> {
    pub(crate) tasks: TaskQueue<LoopState<P>>,
    pub(crate) attached: Mutex<Vec<Arc<Surface>>>,
    pub(crate) stop: StopToken,
    pub(crate) config: RenderLoopConfig,
    stop_on_last_close: AtomicBool,
    running: AtomicBool,
    frame_rate: AtomicU32,
}

impl<P: RenderContextProvider> Shared<P> {
    #[inline]
    pub(crate) fn stop_on_last_close(&self) -> bool {
        self.stop_on_last_close.load(Ordering::Acquire)
    }

    /// Route the surface's wake-ups to a processing task for it.
    pub(crate) fn arm(self: &Arc<Self>, surface: &Surface) {
        let shared: Weak<Self> = Arc::downgrade(self);
        let id = surface.id();
        surface.set_event_listener(move |_| {
            if let Some(shared) = shared.upgrade() {
                shared
                    .tasks
                    .schedule(move |state: &mut LoopState<P>| state.process(id));
            }
        });
    }
}

/// Drives graphics contexts of attached surfaces on a dedicated render thread.
///
/// Lifecycle: `start` → (`add`, `update`, hooks) → `stop` → `wait_for_stopped`.
/// After `wait_for_stopped` the loop may be started again.
pub struct RenderLoop<P: RenderContextProvider> {
    shared: Arc<Shared<P>>,
    /// Loop state while no render thread holds it.
    idle: Arc<Mutex<Option<LoopState<P>>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    done: Mutex<Option<Receiver<()>>>,
}

impl<P: RenderContextProvider> RenderLoop<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, RenderLoopConfig::default())
    }

    pub fn with_config(provider: P, config: RenderLoopConfig) -> Self {
        let frame_rate = AtomicU32::new(config.frame_rate.to_bits());
        let shared = Arc::new(Shared {
            tasks: TaskQueue::new(),
            attached: Mutex::new(Vec::new()),
            stop: StopToken::new(),
            stop_on_last_close: AtomicBool::new(config.stop_on_last_close),
            running: AtomicBool::new(false),
            frame_rate,
            config,
        });
        let state = LoopState::new(provider, shared.clone());
        Self {
            shared,
            idle: Arc::new(Mutex::new(Some(state))),
            thread: Mutex::new(None),
            done: Mutex::new(None),
        }
    }

    #[inline]
    pub fn config(&self) -> &RenderLoopConfig {
        &self.shared.config
    }

    /// Start processing.
    ///
    /// With `use_thread = false` this runs the loop on the calling thread and
    /// returns once it stopped. Starting a running loop is a no-op.
    pub fn start(&self, stop_on_last_close: bool) -> LoopResult<()> {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            warn!(target: "render_loop", "render_loop.start ignored reason='already running'");
            return Ok(());
        }
        self.shared.stop.reset();
        self.shared
            .stop_on_last_close
            .store(stop_on_last_close, Ordering::Release);

        let config = &self.shared.config;
        if !config.use_thread {
            info!(target: "render_loop", "render_loop.start inline stop_on_last_close={}", stop_on_last_close);
            let state = self.idle.lock().take();
            if let Some(mut state) = state {
                state.run();
                *self.idle.lock() = Some(state);
            }
            self.shared.running.store(false, Ordering::Release);
            return Ok(());
        }

        let (signal, done) = StopSignal::pair();
        let idle = self.idle.clone();
        let spawned = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let _signal = signal;
                let state = idle.lock().take();
                if let Some(mut state) = state {
                    state.run();
                    *idle.lock() = Some(state);
                }
            });

        match spawned {
            Ok(handle) => {
                info!(
                    target: "render_loop",
                    "render_loop.start thread='{}' stop_on_last_close={}",
                    config.thread_name,
                    stop_on_last_close
                );
                *self.thread.lock() = Some(handle);
                *self.done.lock() = Some(done);
                Ok(())
            }
            Err(e) => {
                error!(target: "render_loop", "render_loop.start failed: {}", e);
                self.shared.running.store(false, Ordering::Release);
                Err(LoopError::Spawn(e))
            }
        }
    }

    /// Close every attached surface and let the loop exit once they are gone.
    pub fn stop(&self) {
        debug!(target: "render_loop", "render_loop.stop");
        self.shared.stop.request();
        let attached = self.shared.attached.lock().clone();
        for surface in &attached {
            surface.close();
        }
        // wake the consumer so it re-checks the stop condition
        self.shared.tasks.schedule(|_: &mut LoopState<P>| {});
    }

    /// Block until the render thread left its loop, pumping the attached
    /// surfaces' native events meanwhile. Returns immediately if no render
    /// thread was started.
    pub fn wait_for_stopped(&self) -> LoopResult<()> {
        let Some(handle) = self.thread.lock().take() else {
            return Ok(());
        };

        if let Some(done) = self.done.lock().take() {
            let poll = Duration::from_millis(self.shared.config.stop_poll_interval_ms.max(1));
            while !StopSignal::wait(&done, poll) {
                let attached = self.shared.attached.lock().clone();
                for surface in &attached {
                    surface.process_events();
                }
            }
        }

        let joined = handle.join();
        self.shared.running.store(false, Ordering::Release);
        match joined {
            Ok(()) => {
                info!(target: "render_loop", "render_loop.stopped");
                Ok(())
            }
            Err(_) => {
                error!(target: "render_loop", "render_loop.stopped reason='render thread panicked'");
                Err(LoopError::RenderThreadPanicked)
            }
        }
    }

    /// `false` once the render thread left its loop, even before
    /// `wait_for_stopped` joined it.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
            && self
                .thread
                .lock()
                .as_ref()
                .map_or(true, |h| !h.is_finished())
    }

    /// Schedule one processing pass (and draw) over every attached surface.
    pub fn update(&self) {
        self.shared
            .tasks
            .schedule(|state: &mut LoopState<P>| state.process_all());
    }

    /// Schedule one processing pass (and draw) for a single attached surface.
    pub fn update_surface(&self, id: SurfaceId) {
        self.shared
            .tasks
            .schedule(move |state: &mut LoopState<P>| state.process(id));
    }

    /// -1: vsync, 0: manual `update()`, >0: frames per second.
    ///
    /// Stored for backends and hosts that pace frames; the loop itself only
    /// draws on `update()` and surface events.
    pub fn set_frame_rate(&self, fps: f32) {
        debug!(target: "render_loop", "render_loop.frame_rate {}", fps);
        self.shared.frame_rate.store(fps.to_bits(), Ordering::Release);
    }

    #[inline]
    pub fn frame_rate(&self) -> f32 {
        f32::from_bits(self.shared.frame_rate.load(Ordering::Acquire))
    }

    /// Attach a surface. The loop keeps it alive until its `Close` is processed.
    pub fn add(&self, surface: Arc<Surface>) -> Weak<Surface> {
        let weak = Arc::downgrade(&surface);
        {
            let mut attached = self.shared.attached.lock();
            if attached.iter().any(|s| s.id() == surface.id()) {
                warn!(target: "render_loop", "surface.add {} reason='already attached'", surface.id());
                return weak;
            }
            attached.push(surface.clone());
        }
        debug!(target: "render_loop", "surface.add {}", surface.id());
        self.shared
            .tasks
            .schedule(move |state: &mut LoopState<P>| state.attach(surface));
        weak
    }

    #[inline]
    pub fn attached_count(&self) -> usize {
        self.shared.attached.lock().len()
    }

    pub fn on_resize<F>(&self, f: F) -> &Self
    where
        F: FnMut(&Surface, i32, i32, Option<&mut P::Context>) + Send + 'static,
    {
        self.install(move |hooks| hooks.resize = Some(Box::new(f)))
    }

    pub fn on_draw<F>(&self, f: F) -> &Self
    where
        F: FnMut(&Surface, &mut P::Context) -> bool + Send + 'static,
    {
        self.install(move |hooks| hooks.draw = Some(Box::new(f)))
    }

    pub fn on_context_created<F>(&self, f: F) -> &Self
    where
        F: FnMut(&Surface, &mut P::Context) + Send + 'static,
    {
        self.install(move |hooks| hooks.context_created = Some(Box::new(f)))
    }

    pub fn on_destroy_context<F>(&self, f: F) -> &Self
    where
        F: FnMut(&Surface, &mut P::Context) + Send + 'static,
    {
        self.install(move |hooks| hooks.destroy_context = Some(Box::new(f)))
    }

    pub fn on_close<F>(&self, f: F) -> &Self
    where
        F: FnMut(&Surface) + Send + 'static,
    {
        self.install(move |hooks| hooks.close = Some(Box::new(f)))
    }

    /// Directly while no thread owns the state, otherwise through the queue.
    fn install<F>(&self, set: F) -> &Self
    where
        F: FnOnce(&mut RenderHooks<P::Context>) + Send + 'static,
    {
        if let Some(state) = self.idle.lock().as_mut() {
            set(&mut state.hooks);
            return self;
        }
        self.shared
            .tasks
            .schedule(move |state: &mut LoopState<P>| set(&mut state.hooks));
        self
    }
}

impl<P: RenderContextProvider> Drop for RenderLoop<P> {
    fn drop(&mut self) {
        let Some(handle) = self.thread.get_mut().take() else {
            return;
        };
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        if !thread::panicking() {
            panic!("RenderLoop dropped while its render thread is alive; call stop() and wait_for_stopped() first");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::handle::NativeHandle;

    struct Nop;

    impl RenderContextProvider for Nop {
        type Context = u32;

        fn create_render_context(&mut self, _: &Surface) -> Option<u32> {
            Some(1)
        }
        fn destroy_render_context(&mut self, _: &Surface, _: u32) -> bool {
            true
        }
        fn activate_render_context(&mut self, _: &Surface, _: &mut u32) -> bool {
            true
        }
        fn submit_render_context(&mut self, _: &Surface, _: &mut u32) -> Option<ContextChanges> {
            Some(ContextChanges::empty())
        }
    }

    #[test]
    fn frame_rate_is_a_stored_hint() {
        let config = RenderLoopConfig {
            frame_rate: -1.0,
            ..RenderLoopConfig::default()
        };
        let rl = RenderLoop::with_config(Nop, config);
        assert_eq!(rl.frame_rate(), -1.0);
        rl.set_frame_rate(60.0);
        assert_eq!(rl.frame_rate(), 60.0);
    }

    #[test]
    fn hooks_install_while_idle() {
        let rl = RenderLoop::new(Nop);
        rl.on_draw(|_, _| true).on_close(|_| {});
        let idle = rl.idle.lock();
        let state = idle.as_ref().unwrap();
        assert!(state.hooks.draw.is_some());
        assert!(state.hooks.close.is_some());
        assert!(state.hooks.resize.is_none());
    }

    #[test]
    fn add_counts_once_per_surface() {
        let rl = RenderLoop::new(Nop);
        let s = Arc::new(Surface::new(
            HeadlessBackend::new(1, 1).with_handle(NativeHandle::from_usize(1).unwrap()),
        ));
        let weak = rl.add(s.clone());
        rl.add(s.clone());
        assert_eq!(rl.attached_count(), 1);
        assert!(weak.upgrade().is_some());
        assert!(!rl.is_running());
        // nothing started: dropping is fine
    }

    #[test]
    fn wait_without_start_returns() {
        let rl = RenderLoop::new(Nop);
        assert!(rl.wait_for_stopped().is_ok());
    }
}
