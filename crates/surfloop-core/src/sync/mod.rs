mod mpsc_fifo;
mod shutdown;

pub use mpsc_fifo::MpscFifo;
pub use shutdown::{StopSignal, StopToken};
