use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::{Pump, Scheduler};
use crate::{Event, Result, Router};

/// Cloneable handle collaborators use to deliver events to a live queue.
///
/// Bus receivers, simulated peers and protocol simulators each keep a
/// clone and call [`append`](Self::append) whenever they observe
/// something. Appending never blocks.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: UnboundedSender<Event>,
}

impl EventSender {
    /// Deliver `event`.
    ///
    /// Fails with [`Error::SourceClosed`](crate::Error::SourceClosed) once
    /// the queue has been dropped.
    pub fn append(&self, event: Event) -> Result {
        self.sender.send(event)?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Scheduler that pumps the Tokio runtime while waiting.
///
/// Each pump awaits the next delivered event for at most one slice. The
/// await yields to the runtime, so collaborator tasks spawned on the same
/// runtime run in between. When something arrives, everything else already
/// delivered is drained too, and control returns to the queue.
///
/// On a `current_thread` runtime (the default for `#[tokio::test]`) this
/// gives the cooperative, single-threaded model: collaborators and test
/// code interleave only at pump points.
///
/// Once every [`EventSender`] is dropped and the buffer is drained, pumps
/// report [`Pump::Exhausted`], so a pending wait times out straight away
/// instead of sleeping until its deadline.
///
/// # Warning
///
/// The channel is unbounded. That is the right trade-off for a test run,
/// not for long-lived production traffic.
#[derive(Debug)]
pub struct LiveScheduler {
    receiver: UnboundedReceiver<Event>,
}

impl LiveScheduler {
    pub fn new() -> (Self, EventSender) {
        let (sender, receiver) = unbounded_channel();
        (Self { receiver }, EventSender { sender })
    }
}

impl Scheduler for LiveScheduler {
    async fn pump(&mut self, router: &mut Router, slice: Duration) -> Result<Pump> {
        match tokio::time::timeout(slice, self.receiver.recv()).await {
            Ok(Some(event)) => {
                router.append(event);
                while let Ok(event) = self.receiver.try_recv() {
                    router.append(event);
                }
                Ok(Pump::Progress)
            }
            // Every sender is gone and the buffer is empty.
            Ok(None) => {
                tracing::debug!("event source closed, nothing more will arrive");
                Ok(Pump::Exhausted)
            }
            Err(_) => Ok(Pump::Idle),
        }
    }
}
