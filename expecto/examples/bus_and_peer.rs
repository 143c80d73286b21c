//! Bus and Peer Example
//!
//! Drives a tiny scenario the way an integration test would: a simulated
//! message-bus client and a simulated XMPP peer run as tasks on the same
//! single-threaded runtime and report what they observe to one
//! `EventQueue`. The scenario then waits for those observations.
//!
//! # Key Concepts Demonstrated
//!
//! - Collaborators deliver through cloned `EventSender`s
//! - `demand` insists on the very next event of a category
//! - `expect` discards non-matching events on the way
//! - `expect_many` joins events from unrelated categories
//! - `forbid_events` turns an unwanted stanza into a hard failure
//!
//! Run with `RUST_LOG`-style verbosity by flipping `with_verbose(true)`.

use std::time::Duration;

use expecto::{Config, Event, EventPattern, EventQueue, EventSender, Result};
use tokio::time::sleep;

/// Stands in for a bus client: a method call, its return and a signal.
async fn bus_client(sender: EventSender) -> Result {
    sleep(Duration::from_millis(5)).await;
    sender.append(
        Event::new("dbus-method-call")?
            .with_attr("method", "RequestConnection")
            .with_attr("path", "/org/example/Connection"),
    )?;
    sleep(Duration::from_millis(5)).await;
    sender.append(
        Event::new("dbus-signal")?
            .with_attr("signal", "StatusChanged")
            .with_attr("args", vec![0, 1]),
    )?;
    sender.append(
        Event::new("dbus-return")?
            .with_attr("method", "RequestConnection")
            .with_attr("value", "/org/example/Connection/alice"),
    )
}

/// Stands in for the network side: presence, then a roster query.
async fn xmpp_peer(sender: EventSender) -> Result {
    sleep(Duration::from_millis(3)).await;
    sender.append(
        Event::new("stream-presence")?
            .with_attr("from", "bob@example.com/phone")
            .with_attr("show", "away"),
    )?;
    sleep(Duration::from_millis(4)).await;
    sender.append(
        Event::new("stream-iq")?
            .with_attr("type", "get")
            .with_attr("query_ns", "jabber:iq:roster"),
    )
}

async fn run() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::default()
        .with_default_timeout(Duration::from_secs(1))
        .with_verbose(true);
    let (mut queue, sender) = EventQueue::live(config);

    // No chat messages are allowed during connection setup.
    let no_chat = EventPattern::new("stream-message")?.with_attr("type", "chat");
    queue.forbid_events(std::slice::from_ref(&no_chat));

    tokio::spawn(bus_client(sender.clone()));
    tokio::spawn(xmpp_peer(sender));

    // The call goes out before anything else on the bus.
    queue
        .demand(EventPattern::new("dbus-method-call")?.with_attr("method", "RequestConnection"))
        .await?;

    // The StatusChanged signal in between is discarded.
    let reply = queue
        .expect(EventPattern::new("dbus-return")?.with_attr("method", "RequestConnection"))
        .await?;
    if let Some(path) = reply.attr("value") {
        println!("connection object: {path}");
    }

    let joined = queue
        .expect_many([
            EventPattern::new("stream-presence")?.with_predicate(|e| e.has_attr("show")),
            EventPattern::new("stream-iq")?.with_attr("query_ns", "jabber:iq:roster"),
        ])
        .within(Duration::from_millis(500))
        .await?;
    println!("presence: {}", joined[0]);
    println!("roster query: {}", joined[1]);

    queue.unforbid_events(&[no_chat]);
    queue.dump();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error while executing example: {e}");
    }
}
