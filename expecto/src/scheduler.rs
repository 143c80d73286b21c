//! Waiting strategies for the [`EventQueue`](crate::EventQueue).
//!
//! A wait in `expect`, `expect_many` or `demand` is a loop: look at the
//! [`Router`], and if nothing relevant is queued, let the scheduler run the
//! underlying event loop for a short slice so collaborators get a chance to
//! deliver. The scheduler must make progress *during* the wait, because the
//! same loop that is being waited on is the one producing the events.
//!
//! Two implementations ship with the crate:
//!
//! - [`LiveScheduler`] pumps the Tokio runtime. Collaborators run as tasks
//!   on the same (usually `current_thread`) runtime and deliver through an
//!   [`EventSender`].
//! - [`StaticScheduler`] replays a fixed list of events, one per pump, and
//!   never really waits. It exists to test matching and ordering logic
//!   deterministically.

use std::{future::Future, time::Duration};

use crate::{Result, Router};

mod fixed;
mod live;

pub use fixed::StaticScheduler;
pub use live::{EventSender, LiveScheduler};

/// Outcome of one [`Scheduler::pump`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pump {
    /// At least one event was appended to the router.
    Progress,
    /// The slice elapsed without new events.
    Idle,
    /// No event will ever be produced again. The pending wait times out
    /// without waiting for its deadline.
    Exhausted,
}

/// Drives the loop that delivers events while a wait is in progress.
///
/// # Ergonomics
///
/// `pump` returns a future but can be implemented as `async fn` directly.
///
/// ```ignore
/// impl Scheduler for MyReactor {
///     async fn pump(&mut self, router: &mut Router, slice: Duration) -> Result<Pump> {
///         for event in self.poll_for(slice) {
///             router.append(event);
///         }
///         Ok(Pump::Progress)
///     }
/// }
/// ```
pub trait Scheduler {
    /// Run the underlying loop for at most `slice`, appending every event it
    /// produced to `router`.
    ///
    /// Returning early is fine (and expected once something arrived). An
    /// error aborts the wait that called it.
    fn pump(&mut self, router: &mut Router, slice: Duration) -> impl Future<Output = Result<Pump>>;
}
