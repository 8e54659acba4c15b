//! Surface event pipeline and render-context lifecycle scheduler.
//!
//! A [`Surface`] turns native window-system activity into an ordered stream of
//! [`SurfaceEvent`]s. A [`RenderLoop`] consumes those streams on one render
//! thread and creates, activates, resizes and destroys a graphics context per
//! surface through a [`RenderContextProvider`].

pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod handle;
pub mod logsys;
pub mod registry;
pub mod render_loop;
pub mod surface;
pub mod sync;
pub mod task_queue;

pub use backend::{HeadlessBackend, SurfaceBackend, SurfaceFactory, SurfaceKind};
pub use config::RenderLoopConfig;
pub use error::{LoopError, LoopResult};
pub use event::SurfaceEvent;
pub use handle::NativeHandle;
pub use registry::SurfaceRegistry;
pub use render_loop::{ContextChanges, RenderContextProvider, RenderHooks, RenderLoop};
pub use surface::{Surface, SurfaceId};
pub use task_queue::TaskQueue;
