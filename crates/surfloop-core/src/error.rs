use thiserror::Error;

pub type LoopResult<T> = Result<T, LoopError>;

/// Errors surfaced by the render loop itself.
///
/// Backend and graphics glue failures are not errors here: they come back as
/// `bool`/`Option` and the state machine absorbs them.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("render thread panicked")]
    RenderThreadPanicked,

    #[error("config error: {0}")]
    Config(String),
}
