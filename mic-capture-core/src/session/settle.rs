use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use crate::models::error::CaptureError;

/// One-shot settlement for the finalize outcome of `stop`.
///
/// Finalization can conclude from more than one path (the encoder's
/// completion callback, or an immediate manual finalize when the encoder was
/// never active); whichever settles first wins and every later attempt is
/// dropped.
pub(crate) struct StopSettlement {
    rx: Receiver<Result<(), CaptureError>>,
    handle: SettleHandle,
}

#[derive(Clone)]
pub(crate) struct SettleHandle {
    settled: Arc<AtomicBool>,
    tx: Sender<Result<(), CaptureError>>,
}

impl SettleHandle {
    /// Record the outcome. Only the first call has any effect.
    pub(crate) fn settle(&self, outcome: Result<(), CaptureError>) {
        if self.settled.swap(true, Ordering::SeqCst) {
            return;
        }
        // Receiver may already be gone if the waiter timed out.
        let _ = self.tx.send(outcome);
    }
}

impl StopSettlement {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            rx,
            handle: SettleHandle {
                settled: Arc::new(AtomicBool::new(false)),
                tx,
            },
        }
    }

    pub(crate) fn handle(&self) -> SettleHandle {
        self.handle.clone()
    }

    /// Block until settled, or until `timeout` elapses.
    pub(crate) fn wait(&self, timeout: Duration) -> Result<(), CaptureError> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(_) => Err(CaptureError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_settlement_wins() {
        let settlement = StopSettlement::new();
        let handle = settlement.handle();
        handle.settle(Ok(()));
        handle.settle(Err(CaptureError::EncodingFailed("late".into())));

        assert_eq!(settlement.wait(Duration::from_millis(10)), Ok(()));
    }

    #[test]
    fn error_settlement_propagates() {
        let settlement = StopSettlement::new();
        settlement
            .handle()
            .settle(Err(CaptureError::EncodingFailed("boom".into())));

        assert_eq!(
            settlement.wait(Duration::from_millis(10)),
            Err(CaptureError::EncodingFailed("boom".into()))
        );
    }

    #[test]
    fn unsettled_wait_times_out() {
        let settlement = StopSettlement::new();
        assert_eq!(
            settlement.wait(Duration::from_millis(5)),
            Err(CaptureError::Timeout)
        );
    }

    #[test]
    fn settles_across_threads() {
        let settlement = StopSettlement::new();
        let handle = settlement.handle();
        std::thread::spawn(move || handle.settle(Ok(())));

        assert_eq!(settlement.wait(Duration::from_secs(1)), Ok(()));
    }
}
