//! The streaming adapter between a run and its transport.
//!
//! A run produces events through an [`EventSink`]; the transport consumes
//! them from the paired receiver. The channel is bounded, so a slow client
//! applies backpressure to the run. When the receiver is dropped (client
//! disconnect), the next emit fails and the producer unwinds at that yield
//! point; in-flight worker calls are not interrupted.

use reagent_core::events::AgentEvent;
use tokio::sync::mpsc;

/// Bounded per-run event channel capacity.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The consumer side went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event stream closed by consumer")]
pub struct StreamClosed;

/// Producer handle for a run's event stream.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<AgentEvent>,
}

impl EventSink {
    /// Create a sink and its paired receiver.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<AgentEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }

    /// Emit one event, waiting for channel capacity.
    pub async fn emit(&self, event: AgentEvent) -> Result<(), StreamClosed> {
        self.tx.send(event).await.map_err(|_| StreamClosed)
    }
}
