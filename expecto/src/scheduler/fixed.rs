use std::{collections::VecDeque, time::Duration};

use super::{Pump, Scheduler};
use crate::{Event, Result, Router};

/// Scheduler backed by a pre-populated list of events.
///
/// Every pump releases exactly one event into the router, as if one turn
/// of a real loop had delivered one notification. Nothing ever sleeps:
/// once the list is empty the scheduler reports [`Pump::Exhausted`] and
/// the pending wait times out on the spot. Useful for checking matching,
/// ordering and discard behaviour without timing noise.
///
/// ```rust
/// use expecto::{Config, Event, EventPattern, EventQueue};
///
/// # tokio_test_block_on(async {
/// let mut queue = EventQueue::with_events(
///     Config::default(),
///     [Event::new("dbus-signal")?.with_attr("signal", "Foo")],
/// );
/// let event = queue.expect(EventPattern::new("dbus-signal")?).await?;
/// assert_eq!(event.attr("signal").and_then(|v| v.as_str()), Some("Foo"));
/// # Ok::<(), expecto::Error>(())
/// # }).unwrap();
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Default)]
pub struct StaticScheduler {
    events: VecDeque<Event>,
}

impl StaticScheduler {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Queue one more event to be released by a later pump.
    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Number of events not yet released.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl Scheduler for StaticScheduler {
    async fn pump(&mut self, router: &mut Router, _slice: Duration) -> Result<Pump> {
        match self.events.pop_front() {
            Some(event) => {
                router.append(event);
                Ok(Pump::Progress)
            }
            None => Ok(Pump::Exhausted),
        }
    }
}
