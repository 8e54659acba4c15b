use crate::surface::Surface;

/// Size changed. The context is `None` while the surface has none.
pub type ResizeHook<C> = Box<dyn FnMut(&Surface, i32, i32, Option<&mut C>) + Send>;
/// Draw one frame; `true` asks for a submit.
pub type DrawHook<C> = Box<dyn FnMut(&Surface, &mut C) -> bool + Send>;
pub type ContextHook<C> = Box<dyn FnMut(&Surface, &mut C) + Send>;
pub type CloseHook = Box<dyn FnMut(&Surface) + Send>;

/// User callbacks. Owned by the render thread, every slot optional.
pub struct RenderHooks<C> {
    pub resize: Option<ResizeHook<C>>,
    pub draw: Option<DrawHook<C>>,
    pub context_created: Option<ContextHook<C>>,
    pub destroy_context: Option<ContextHook<C>>,
    pub close: Option<CloseHook>,
}

impl<C> RenderHooks<C> {
    pub(crate) fn resize(&mut self, surface: &Surface, width: i32, height: i32, context: Option<&mut C>) {
        if let Some(f) = self.resize.as_mut() {
            f(surface, width, height, context);
        }
    }

    /// `false` without a draw hook: nothing was drawn, nothing to submit.
    pub(crate) fn draw(&mut self, surface: &Surface, context: &mut C) -> bool {
        self.draw.as_mut().map_or(false, |f| f(surface, context))
    }

    pub(crate) fn context_created(&mut self, surface: &Surface, context: &mut C) {
        if let Some(f) = self.context_created.as_mut() {
            f(surface, context);
        }
    }

    pub(crate) fn destroy_context(&mut self, surface: &Surface, context: &mut C) {
        if let Some(f) = self.destroy_context.as_mut() {
            f(surface, context);
        }
    }

    pub(crate) fn close(&mut self, surface: &Surface) {
        if let Some(f) = self.close.as_mut() {
            f(surface);
        }
    }
}

impl<C> Default for RenderHooks<C> {
    fn default() -> Self {
        Self {
            resize: None,
            draw: None,
            context_created: None,
            destroy_context: None,
            close: None,
        }
    }
}
