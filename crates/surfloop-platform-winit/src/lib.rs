//! winit windows as surfloop surfaces.

mod app;
mod backend;
mod error;

pub use app::{run_winit_app, WinitHost};
pub use backend::{window_native_handle, WinitBackend};
pub use error::{PlatformError, PlatformResult};
