use log::{debug, error, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;

use super::hooks::RenderHooks;
use super::provider::{ContextChanges, RenderContextProvider};
use super::Shared;
use crate::event::SurfaceEvent;
use crate::handle::ShowHandle;
use crate::surface::{Surface, SurfaceId};

/// Lifecycle record of one attached surface.
pub(crate) struct SurfaceRecord<C> {
    pub(crate) surface: Arc<Surface>,
    /// `None`: no context. `Some`: context active.
    pub(crate) context: Option<C>,
    pub(crate) last_known_size: Option<(i32, i32)>,
}

/// How a processing pass left its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Keep,
    /// Handle lost mid-pass; events behind it wait for the next pass.
    Yield,
    /// `acquire()` declined; nothing was consumed.
    Declined,
    Remove,
}

/// Brackets a pass with `acquire`/`release`. `release` runs on every exit,
/// including a declined acquire.
struct AcquireGuard<'a> {
    surface: &'a Surface,
    acquired: bool,
}

impl<'a> AcquireGuard<'a> {
    fn acquire(surface: &'a Surface) -> Self {
        Self {
            acquired: surface.acquire(),
            surface,
        }
    }
}

impl Drop for AcquireGuard<'_> {
    fn drop(&mut self) {
        self.surface.release();
    }
}

/// Everything only the render thread touches.
pub(crate) struct LoopState<P: RenderContextProvider> {
    pub(crate) provider: P,
    pub(crate) hooks: RenderHooks<P::Context>,
    pub(crate) records: Vec<SurfaceRecord<P::Context>>,
    /// Surfaces whose last pass was declined with events still queued.
    deferred: Vec<SurfaceId>,
    pub(crate) shared: Arc<Shared<P>>,
}

impl<P: RenderContextProvider> LoopState<P> {
    pub(crate) fn new(provider: P, shared: Arc<Shared<P>>) -> Self {
        Self {
            provider,
            hooks: RenderHooks::default(),
            records: Vec::new(),
            deferred: Vec::new(),
            shared,
        }
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.shared.stop.is_requested()
            && self.shared.tasks.is_empty()
            && self.shared.attached.lock().is_empty()
    }

    /// Drain the task queue until stopped.
    pub(crate) fn run(&mut self) {
        info!(target: "render_loop", "render_loop.enter surfaces={}", self.records.len());
        let shared = self.shared.clone();
        let retry = Duration::from_millis(shared.config.acquire_retry_interval_ms.max(1));
        shared.tasks.run_with_retry(
            self,
            |state| state.should_stop(),
            |state| (!state.deferred.is_empty()).then_some(retry),
            |state| state.retry_deferred(),
        );
        info!(target: "render_loop", "render_loop.leave");
    }

    pub(crate) fn attach(&mut self, surface: Arc<Surface>) {
        if self.records.iter().any(|r| r.surface.id() == surface.id()) {
            warn!(target: "render_loop", "surface.attach {} reason='already attached'", surface.id());
            return;
        }
        debug!(target: "render_loop", "surface.attach {} handle={}", surface.id(), ShowHandle(surface.native_handle()));
        self.shared.arm(&surface);
        let id = surface.id();
        self.records.push(SurfaceRecord {
            surface,
            context: None,
            last_known_size: None,
        });
        self.process(id);
    }

    /// One pass over every record, in attach order.
    pub(crate) fn process_all(&mut self) {
        let ids: Vec<SurfaceId> = self.records.iter().map(|r| r.surface.id()).collect();
        for id in ids {
            self.process(id);
        }
    }

    fn retry_deferred(&mut self) {
        for id in std::mem::take(&mut self.deferred) {
            self.process(id);
        }
    }

    pub(crate) fn process(&mut self, id: SurfaceId) {
        self.deferred.retain(|d| *d != id);
        let Some(index) = self.records.iter().position(|r| r.surface.id() == id) else {
            trace!(target: "render_loop", "surface.process {} reason='not attached'", id);
            return;
        };

        let LoopState {
            provider,
            hooks,
            records,
            deferred,
            shared,
        } = &mut *self;
        let record = &mut records[index];

        match process_record(provider, hooks, shared, record) {
            Pass::Keep => {}
            Pass::Yield => {
                if record.surface.has_pending_events() {
                    shared.tasks.schedule(move |state: &mut LoopState<P>| state.process(id));
                }
            }
            Pass::Declined => {
                if record.surface.has_pending_events() {
                    deferred.push(id);
                }
            }
            Pass::Remove => {
                let record = records.remove(index);
                self.detach(record);
            }
        }
    }

    fn detach(&mut self, record: SurfaceRecord<P::Context>) {
        let SurfaceRecord { surface, context, .. } = record;
        debug_assert!(context.is_none());
        surface.clear_event_listener();

        let remaining = {
            let mut attached = self.shared.attached.lock();
            attached.retain(|s| s.id() != surface.id());
            attached.len()
        };
        info!(target: "render_loop", "surface.detach {} remaining={}", surface.id(), remaining);

        if remaining == 0 && self.shared.stop_on_last_close() {
            debug!(target: "render_loop", "render_loop.stop_request reason='last surface closed'");
            self.shared.stop.request();
        }
    }
}

fn process_record<P: RenderContextProvider>(
    provider: &mut P,
    hooks: &mut RenderHooks<P::Context>,
    shared: &Arc<Shared<P>>,
    record: &mut SurfaceRecord<P::Context>,
) -> Pass {
    let surface = record.surface.clone();
    let guard = AcquireGuard::acquire(&surface);
    if !guard.acquired {
        trace!(target: "render_loop", "surface.process {} reason='acquire declined'", surface.id());
        return Pass::Declined;
    }

    // context made current during this pass
    let mut current = false;

    while let Some(event) = surface.pop_event() {
        trace!(target: "render_loop", "surface.event {} {} {:?}", surface.id(), event.name(), event);
        match event {
            SurfaceEvent::NativeHandle { after, .. } => {
                if let Some(context) = record.context.take() {
                    destroy_context(provider, hooks, &surface, context);
                }
                current = false;

                if after.is_none() {
                    return Pass::Yield;
                }

                match provider.create_render_context(&surface) {
                    None => {
                        error!(
                            target: "render_loop",
                            "context.create {} handle={} failed",
                            surface.id(),
                            ShowHandle(after)
                        );
                    }
                    Some(mut context) => {
                        current = provider.activate_render_context(&surface, &mut context);
                        if !current {
                            warn!(target: "render_loop", "context.activate {} failed after create", surface.id());
                        }
                        hooks.context_created(&surface, &mut context);
                        record.context = Some(context);
                        info!(target: "render_loop", "context.create {} handle={}", surface.id(), ShowHandle(after));
                        shared.arm(&surface);
                    }
                }
            }

            SurfaceEvent::Resize { width, height } => {
                record.last_known_size = Some((width, height));
                if let Some(context) = record.context.as_mut() {
                    if !current {
                        current = provider.activate_render_context(&surface, context);
                    }
                }
                hooks.resize(&surface, width, height, record.context.as_mut());

                if shared.config.submit_after_resize {
                    if let Some(context) = record.context.as_mut() {
                        match provider.submit_render_context(&surface, context) {
                            Some(changes) => {
                                surface.submit();
                                reannounce(&surface, record.last_known_size, changes);
                            }
                            None => warn!(target: "render_loop", "context.submit {} failed after resize", surface.id()),
                        }
                    }
                }
            }

            SurfaceEvent::Close => {
                if let Some(context) = record.context.take() {
                    destroy_context(provider, hooks, &surface, context);
                }
                hooks.close(&surface);
                return Pass::Remove;
            }
        }
    }

    let Some(context) = record.context.as_mut() else {
        return Pass::Keep;
    };
    if !provider.activate_render_context(&surface, context) {
        warn!(target: "render_loop", "context.activate {} failed, frame skipped", surface.id());
        return Pass::Keep;
    }
    if !hooks.draw(&surface, context) {
        return Pass::Keep;
    }

    match provider.submit_render_context(&surface, context) {
        None => warn!(target: "render_loop", "context.submit {} failed", surface.id()),
        Some(changes) => {
            surface.submit();
            reannounce(&surface, record.last_known_size, changes);
        }
    }
    Pass::Keep
}

/// Queue a `Resize` with the current size so the resize hook sees the change.
fn reannounce(surface: &Surface, last_known_size: Option<(i32, i32)>, changes: ContextChanges) {
    if changes.is_empty() {
        return;
    }
    match surface.size().or(last_known_size) {
        Some((w, h)) => {
            debug!(target: "render_loop", "context.changed {} {:?} size={}x{}", surface.id(), changes, w, h);
            surface.emit_resize(w, h);
        }
        None => debug!(target: "render_loop", "context.changed {} {:?} size=unknown", surface.id(), changes),
    }
}

fn destroy_context<P: RenderContextProvider>(
    provider: &mut P,
    hooks: &mut RenderHooks<P::Context>,
    surface: &Surface,
    mut context: P::Context,
) {
    if hooks.destroy_context.is_some() {
        if !provider.activate_render_context(surface, &mut context) {
            warn!(target: "render_loop", "context.activate {} failed before destroy", surface.id());
        }
        hooks.destroy_context(surface, &mut context);
    }
    if provider.destroy_render_context(surface, context) {
        info!(target: "render_loop", "context.destroy {}", surface.id());
    } else {
        warn!(target: "render_loop", "context.destroy {} reported failure", surface.id());
    }
}
