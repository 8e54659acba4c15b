use surfloop_core::LoopError;
use thiserror::Error;

pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Os(#[from] winit::error::OsError),

    #[error(transparent)]
    Loop(#[from] LoopError),

    #[error("render loop configured with use_thread = false cannot share the winit thread")]
    InlineRenderLoop,
}
