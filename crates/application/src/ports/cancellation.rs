//! View lifetime cancellation
//!
//! A hosting view owns a [`CancellationToken`]; the loads it starts hold a
//! [`CancellationReceiver`]. Cancelling or dropping the token tears the view
//! down, and any settlement that arrives afterwards must be ignored.

use tokio::sync::watch;

/// Owner side of a view lifetime. Cancels on drop.
#[derive(Debug)]
pub struct CancellationToken {
    sender: watch::Sender<bool>,
}

impl CancellationToken {
    /// Creates a token and its receiver.
    #[must_use]
    pub fn new() -> (Self, CancellationReceiver) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, CancellationReceiver { receiver })
    }

    /// Tears the view down.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns a new receiver for this token.
    #[must_use]
    pub fn receiver(&self) -> CancellationReceiver {
        CancellationReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Drop for CancellationToken {
    fn drop(&mut self) {
        self.sender.send_replace(true);
    }
}

/// Observer side of a view lifetime.
#[derive(Debug, Clone)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
}

impl CancellationReceiver {
    /// Returns true once the view has been torn down.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    /// Completes when the view is torn down.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                return;
            }
        }
    }
}
