use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative stop request shared between the loop owner and the render thread.
#[derive(Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// One-shot "the render thread has left its loop" notification.
///
/// The sending half fires when dropped, so an unwinding thread still wakes
/// whoever waits on it.
pub struct StopSignal {
    tx: Sender<()>,
}

impl StopSignal {
    pub fn pair() -> (StopSignal, Receiver<()>) {
        let (tx, rx) = bounded(1);
        (StopSignal { tx }, rx)
    }

    /// `true` once signalled or once the sender is gone, `false` on timeout.
    pub fn wait(rx: &Receiver<()>, timeout: Duration) -> bool {
        match rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}

impl Drop for StopSignal {
    fn drop(&mut self) {
        let _ = self.tx.try_send(());
    }
}
