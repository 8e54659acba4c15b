use bitflags::bitflags;

use crate::surface::Surface;

bitflags! {
    /// What changed on the graphics side during a submit.
    ///
    /// Any non-empty value makes the loop re-announce the surface size.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContextChanges: u32 {
        const SIZE = 1 << 0;
        const FORMAT = 1 << 1;
    }
}

/// Graphics glue between a surface and a graphics API (EGL, D3D, Vulkan...).
///
/// Every method runs on the render thread. Contexts are moved into
/// `destroy_render_context`, so a destroyed context cannot be reused.
pub trait RenderContextProvider: Send + 'static {
    type Context: Send + 'static;

    /// `None` means creation failed; the loop retries on the next handle change.
    fn create_render_context(&mut self, surface: &Surface) -> Option<Self::Context>;

    fn destroy_render_context(&mut self, surface: &Surface, context: Self::Context) -> bool;

    /// Make `context` current on the calling thread.
    fn activate_render_context(&mut self, surface: &Surface, context: &mut Self::Context) -> bool;

    /// Present the frame. `None` means the submit failed.
    fn submit_render_context(
        &mut self,
        surface: &Surface,
        context: &mut Self::Context,
    ) -> Option<ContextChanges>;
}
