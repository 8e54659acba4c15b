use crate::backend::{window_native_handle, WinitBackend};
use crate::error::{PlatformError, PlatformResult};

use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use surfloop_core::{RenderContextProvider, RenderLoop, Surface, SurfaceRegistry};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

/// winit application that routes window events into surfaces attached to a
/// render loop.
pub struct WinitHost<P: RenderContextProvider> {
    render_loop: Arc<RenderLoop<P>>,
    attributes: Vec<WindowAttributes>,
    windows: HashMap<WindowId, Arc<Window>>,
    surfaces: SurfaceRegistry<WindowId>,
    created: bool,
    closing: bool,
    error: Option<PlatformError>,
}

impl<P: RenderContextProvider> WinitHost<P> {
    pub fn new(render_loop: Arc<RenderLoop<P>>, attributes: Vec<WindowAttributes>) -> Self {
        Self {
            render_loop,
            attributes,
            windows: HashMap::new(),
            surfaces: SurfaceRegistry::new(),
            created: false,
            closing: false,
            error: None,
        }
    }

    /// First error that ended the event loop, if any.
    #[inline]
    pub fn take_error(&mut self) -> Option<PlatformError> {
        self.error.take()
    }

    #[inline]
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    fn create_windows(&mut self, event_loop: &ActiveEventLoop) -> PlatformResult<()> {
        for attrs in &self.attributes {
            let window = Arc::new(event_loop.create_window(attrs.clone())?);
            let id = window.id();
            let surface = Arc::new(Surface::new(WinitBackend::new(window.clone())));
            info!(
                target: "platform.winit",
                "window.create id={:?} {} kind={:?}",
                id,
                surface.id(),
                surface.kind()
            );
            self.surfaces.insert(id, &surface);
            self.render_loop.add(surface);
            window.request_redraw();
            self.windows.insert(id, window);
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: PlatformError) {
        error!(target: "platform.winit", "host.error {}", e);
        if self.error.is_none() {
            self.error = Some(e);
        }
        event_loop.exit();
    }
}

impl<P: RenderContextProvider> ApplicationHandler for WinitHost<P> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.created {
            self.created = true;
            if let Err(e) = self.create_windows(event_loop) {
                self.fail(event_loop, e);
            }
            return;
        }

        // back from suspension: drawables exist again
        for (id, window) in &self.windows {
            if let Some(surface) = self.surfaces.get(id) {
                surface.reset_native_handle(window_native_handle(window));
            }
            window.request_redraw();
        }
        debug!(target: "platform.winit", "host.resumed windows={}", self.windows.len());
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        for surface in self.surfaces.surfaces() {
            surface.reset_native_handle(None);
        }
        debug!(target: "platform.winit", "host.suspended windows={}", self.windows.len());
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(surface) = self.surfaces.get(&id) else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => {
                surface.emit_resize(size.width as i32, size.height as i32);
            }
            WindowEvent::CloseRequested => {
                debug!(target: "platform.winit", "window.close_requested id={:?} {}", id, surface.id());
                self.closing = true;
                surface.close();
                self.windows.remove(&id);
            }
            WindowEvent::Destroyed => {
                surface.reset_native_handle(None);
                self.surfaces.remove(&id);
                self.windows.remove(&id);
            }
            WindowEvent::RedrawRequested => {
                self.render_loop.update_surface(surface.id());
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.render_loop.is_running() {
            info!(target: "platform.winit", "host.exit reason='render loop stopped'");
            event_loop.exit();
            return;
        }
        self.surfaces.prune();

        let fps = self.render_loop.frame_rate();
        if fps != 0.0 {
            for window in self.windows.values() {
                window.request_redraw();
            }
        }

        let flow = if self.closing {
            // nothing wakes winit when the render thread finishes, poll for it
            let poll = self.render_loop.config().stop_poll_interval_ms.max(1);
            ControlFlow::WaitUntil(Instant::now() + Duration::from_millis(poll))
        } else if fps > 0.0 {
            ControlFlow::WaitUntil(Instant::now() + Duration::from_secs_f32(1.0 / fps))
        } else if fps < 0.0 {
            ControlFlow::Poll
        } else {
            ControlFlow::Wait
        };
        event_loop.set_control_flow(flow);
    }
}

/// Run `windows` on a winit event loop, rendering through `render_loop`.
///
/// Starts the render loop, exits once it stopped (by default when the last
/// window closed), then stops and joins it.
pub fn run_winit_app<P: RenderContextProvider>(
    render_loop: Arc<RenderLoop<P>>,
    windows: Vec<WindowAttributes>,
) -> PlatformResult<()> {
    if !render_loop.config().use_thread {
        return Err(PlatformError::InlineRenderLoop);
    }
    if windows.is_empty() {
        warn!(target: "platform.winit", "host.start no windows configured");
    }

    let event_loop = EventLoop::new()?;
    render_loop.start(render_loop.config().stop_on_last_close)?;

    let mut host = WinitHost::new(render_loop.clone(), windows);
    let run = event_loop.run_app(&mut host);

    render_loop.stop();
    let waited = render_loop.wait_for_stopped();

    if let Some(e) = host.take_error() {
        return Err(e);
    }
    run?;
    waited?;
    Ok(())
}
