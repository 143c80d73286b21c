#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Expecto
//!
//! An event-correlation and expectation engine for asynchronous
//! integration tests.
//!
//! A test against a live, multi-protocol service (a message-bus client
//! talking to a simulated network peer, say) sees notifications arrive
//! from several unrelated sources at independent times. Expecto collects
//! them into one [`EventQueue`] and lets the test say what it expects next.
//! A wait fails with an error when the expectation is violated, times out,
//! or when an explicitly forbidden event shows up.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use expecto::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result {
//!     let (mut queue, sender) = EventQueue::live(Config::default());
//!
//!     // A collaborator reporting what it sees on the bus.
//!     tokio::spawn(async move {
//!         let event = Event::new("dbus-signal")?.with_attr("signal", "Ready");
//!         sender.append(event)
//!     });
//!
//!     let ready = queue
//!         .expect(EventPattern::new("dbus-signal")?.with_attr("signal", "Ready"))
//!         .within(Duration::from_secs(1))
//!         .await?;
//!     println!("got {ready}");
//!     Ok(())
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Event`] | Immutable notification: a kind plus named attributes |
//! | [`EventPattern`] | What an expected or forbidden event must look like |
//! | [`Category`] | Routing group derived from a kind (`"dbus-signal"` is in `"dbus"`) |
//! | [`Router`] | Per-category FIFO queues and the forbidden set |
//! | [`EventQueue`] | `expect`, `expect_many`, `demand`, forbidden events |
//! | [`Scheduler`] | Runs the event loop while a wait is in progress |
//! | [`Config`] | Timeouts, poll slice, verbosity, cross-category order |
//!
//! ## Waiting
//!
//! - [`EventQueue::expect`] pops events from the pattern's category until
//!   one matches. Non-matching events are discarded for good.
//! - [`EventQueue::expect_many`] waits for several patterns in any order
//!   and returns the matches in pattern order.
//! - [`EventQueue::demand`] requires the very next event of the category to
//!   match.
//!
//! Each wait has one absolute deadline, the queue's timeout unless
//! `.within()` says otherwise. Events that arrive after a timeout stay
//! queued for the next wait.
//!
//! ## Ordering
//!
//! Events of one category come out in arrival order. Across categories,
//! [`CategoryOrder`] decides which available category a multi-category
//! wait drains first.
//!
//! ## Features
//!
//! - **`serde`** - `Serialize`/`Deserialize` for events, values and config,
//!   plus [`Event::to_json`]

mod config;
mod error;
mod event;
mod event_id;
mod expectation;
mod kind;
mod pattern;
mod queue;
mod router;
mod tracer;
mod value;

pub mod scheduler;

pub use config::{CategoryOrder, Config};
pub use error::Error;
pub use event::{Attributes, Event};
pub use event_id::{EventId, ShortId};
pub use expectation::{ExpectMany, Expectation};
pub use kind::{Category, Kind, SEPARATOR};
pub use pattern::{EventPattern, PatternId, Predicate};
pub use queue::EventQueue;
pub use router::Router;
pub use scheduler::{EventSender, LiveScheduler, Pump, Scheduler, StaticScheduler};
pub use value::Value;

/// Convenience alias for `Result<T, expecto::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
