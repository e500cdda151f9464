//! Timed opt-in subscriptions
//!
//! Game windows (race registration, giveaway entry) collect opt-ins for
//! a fixed period. The platform layer posts events into a
//! [`SubscriptionSink`]; the game driver consumes them with
//! [`Subscription::next`] until the window closes. This replaces
//! polling the platform for reactions: the driver just awaits.

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};

/// Producer half: the platform layer posts opt-in events here
#[derive(Clone)]
pub struct SubscriptionSink<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> SubscriptionSink<T> {
    /// Post one event into the window
    ///
    /// Returns `false` once the window is gone; late posts are dropped
    /// rather than being an error.
    pub fn post(&self, event: T) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer half: yields events until the deadline passes
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    deadline: Instant,
    cancelled: bool,
}

impl<T> Subscription<T> {
    /// Wait for the next event
    ///
    /// Returns `None` when the window has closed, either by deadline or
    /// by [`cancel`](Self::cancel). Events already queued when the
    /// deadline passes are still delivered before `None`.
    pub async fn next(&mut self) -> Option<T> {
        if self.cancelled {
            return None;
        }

        tokio::select! {
            // Queued events win over an elapsed deadline.
            biased;

            event = self.rx.recv() => event,
            _ = sleep_until(self.deadline) => None,
        }
    }

    /// End the window early
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.rx.close();
    }

    /// Time left in the window
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Open a subscription window of the given length
pub fn subscription<T>(window: Duration) -> (SubscriptionSink<T>, Subscription<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        SubscriptionSink { tx },
        Subscription {
            rx,
            deadline: Instant::now() + window,
            cancelled: false,
        },
    )
}
