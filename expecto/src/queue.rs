use std::{fmt, time::Duration};

use tokio::time::Instant;

use crate::{
    Category, Config, Error, Event, EventPattern, Result, Router,
    expectation::{ExpectMany, Expectation},
    scheduler::{EventSender, LiveScheduler, Pump, Scheduler, StaticScheduler},
    tracer::Tracer,
};

/// Stand-in deadline for timeouts the clock cannot represent.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Absolute deadline `timeout` from now.
///
/// A timeout too large to add to the clock (`Duration::MAX` as "wait
/// forever") is capped at [`FAR_FUTURE`].
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// The expectation engine.
///
/// An `EventQueue` collects events from every collaborator of a test and
/// lets the test wait for the ones it cares about:
///
/// - [`expect`](Self::expect) - wait for a matching event, discarding the
///   non-matching ones on the way
/// - [`expect_many`](Self::expect_many) - wait for several patterns in any
///   order
/// - [`demand`](Self::demand) - the next event in the category must match
/// - [`forbid_events`](Self::forbid_events) - fail any wait that pops a
///   matching event
///
/// A queue lives for one test. It is single-threaded: `append` and the
/// matching logic are synchronous, and the only suspension points are
/// inside the waits, where the [`Scheduler`] runs the loop that delivers
/// events.
///
/// # Example
///
/// ```ignore
/// let (mut queue, sender) = EventQueue::live(Config::default());
/// tokio::spawn(simulated_peer(sender.clone()));
///
/// queue.forbid_events(&[EventPattern::new("stream-message")?]);
/// let reply = queue
///     .expect(EventPattern::new("dbus-return")?.with_attr("method", "Connect"))
///     .within(Duration::from_secs(1))
///     .await?;
/// ```
pub struct EventQueue<S: Scheduler> {
    pub(crate) router: Router,
    pub(crate) scheduler: S,
    config: Config,
    timeout: Duration,
    pub(crate) tracer: Tracer,
}

impl<S: Scheduler> fmt::Debug for EventQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("router", &self.router)
            .field("timeout", &self.timeout)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EventQueue<LiveScheduler> {
    /// Create a queue that pumps the Tokio runtime while waiting, plus the
    /// sender collaborators deliver through.
    pub fn live(config: Config) -> (Self, EventSender) {
        let (scheduler, sender) = LiveScheduler::new();
        (Self::new(config, scheduler), sender)
    }
}

impl EventQueue<StaticScheduler> {
    /// Create a queue that replays `events`, one per pump, without waiting.
    pub fn with_events(config: Config, events: impl IntoIterator<Item = Event>) -> Self {
        Self::new(config, StaticScheduler::new(events))
    }
}

impl<S: Scheduler> EventQueue<S> {
    pub fn new(config: Config, scheduler: S) -> Self {
        Self {
            router: Router::new(),
            scheduler,
            timeout: config.default_timeout(),
            tracer: Tracer::new(config.verbose()),
            config,
        }
    }

    // ==================== Ingestion ====================

    /// Queue an event directly, bypassing the scheduler.
    pub fn append(&mut self, event: Event) {
        self.router.append(event);
    }

    // ==================== Forbidden Events ====================

    /// Make any wait fail with [`Error::ForbiddenEventOccurred`] when it
    /// pops an event matching one of `patterns`.
    ///
    /// Keep the patterns around to lift them later with
    /// [`unforbid_events`](Self::unforbid_events).
    pub fn forbid_events(&mut self, patterns: &[EventPattern]) {
        self.router.forbid(patterns);
    }

    /// Lift exactly the given patterns (clones count as the same pattern).
    pub fn unforbid_events(&mut self, patterns: &[EventPattern]) {
        self.router.unforbid(patterns);
    }

    pub fn unforbid_all(&mut self) {
        self.router.unforbid_all();
    }

    // ==================== Waiting ====================

    /// Wait until an event matching `pattern` is popped from its category.
    ///
    /// Non-matching events popped on the way are discarded for good. Fails
    /// with [`Error::Timeout`] when the deadline passes, or with
    /// [`Error::ForbiddenEventOccurred`] as soon as a forbidden event is
    /// popped, even one that would also match `pattern`.
    ///
    /// Returns an [`Expectation`]; `.within()` overrides the timeout for
    /// this call and `.await` runs it.
    pub fn expect(&mut self, pattern: EventPattern) -> Expectation<'_, S> {
        Expectation::new(self, pattern, false)
    }

    /// Like [`expect`](Self::expect) without the retry: the very next event
    /// popped from the pattern's category must match, otherwise the call
    /// fails with [`Error::UnexpectedEvent`].
    pub fn demand(&mut self, pattern: EventPattern) -> Expectation<'_, S> {
        Expectation::new(self, pattern, true)
    }

    /// Wait until every pattern has been matched, in any arrival order.
    ///
    /// The matches come back in the order of `patterns`. When one event
    /// could satisfy several outstanding patterns, the earliest pattern in
    /// the list takes it.
    pub fn expect_many<I>(&mut self, patterns: I) -> ExpectMany<'_, S>
    where
        I: IntoIterator<Item = EventPattern>,
    {
        ExpectMany::new(self, patterns.into_iter().collect())
    }

    /// Pop the next event relevant to any of `patterns`, checking it
    /// against the forbidden set.
    ///
    /// `timeout` is only reported in the error; `deadline` is what counts.
    pub(crate) async fn next_event(
        &mut self,
        patterns: &[&EventPattern],
        deadline: Instant,
        timeout: Duration,
    ) -> Result<Event> {
        let mut categories: Vec<Category> = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            if !categories.contains(pattern.category()) {
                categories.push(pattern.category().clone());
            }
        }
        self.tracer.waiting(&categories, timeout);

        loop {
            if let Some(event) = self
                .router
                .select(&categories, self.config.category_order())
                .and_then(|category| self.router.pop_next(&category))
            {
                self.tracer.popped(&event);
                if let Some(pattern) = self.router.check_forbidden(&event) {
                    self.tracer.forbidden(&event, pattern);
                    return Err(Error::ForbiddenEventOccurred {
                        pattern: pattern.to_string(),
                        event: Box::new(event),
                    });
                }
                return Ok(event);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(&categories, patterns, timeout));
            }

            let slice = self.config.poll_interval().min(remaining);
            if self.scheduler.pump(&mut self.router, slice).await? == Pump::Exhausted {
                return Err(self.timed_out(&categories, patterns, timeout));
            }
        }
    }

    fn timed_out(
        &self,
        categories: &[Category],
        patterns: &[&EventPattern],
        timeout: Duration,
    ) -> Error {
        self.tracer.timed_out(categories, timeout);
        Error::Timeout {
            timeout,
            categories: categories.iter().map(ToString::to_string).collect(),
            outstanding: patterns.iter().map(ToString::to_string).collect(),
        }
    }

    // ==================== Housekeeping ====================

    /// Discard every event already queued under `category`.
    ///
    /// Returns how many events were dropped. Events delivered afterwards
    /// are kept as usual.
    pub fn flush_past_events(&mut self, category: impl Into<Category>) -> usize {
        let category = category.into();
        let flushed = self.router.flush(&category);
        tracing::debug!(category = %category, flushed, "flushed past events");
        flushed
    }

    /// Override the timeout used by waits on this queue from now on.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// The timeout a wait uses unless `.within()` overrides it.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Events queued and not yet popped, in arrival order.
    pub fn pending(&self) -> Vec<&Event> {
        self.router.pending()
    }

    // ==================== Debugging ====================

    /// Print queued events and forbidden patterns to stdout.
    pub fn dump(&self) {
        let pending = self.router.pending();
        if pending.is_empty() {
            println!("(no events queued)");
        } else {
            println!("Queued events ({}):", pending.len());
            for (i, event) in pending.iter().enumerate() {
                println!("  {}: [{}] {}  (id: {})", i, event.category(), event, event.id().short());
            }
        }
        for pattern in self.router.forbidden() {
            println!("  forbidden: {pattern}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn signal(name: &str) -> Event {
        Event::new("dbus-signal").unwrap().with_attr("signal", name)
    }

    fn signal_pattern(name: &str) -> EventPattern {
        EventPattern::new("dbus-signal")
            .unwrap()
            .with_attr("signal", name)
    }

    fn quiet_queue(events: Vec<Event>) -> EventQueue<StaticScheduler> {
        EventQueue::with_events(Config::default(), events)
    }

    // ==================== expect ====================

    #[tokio::test]
    async fn expect_discards_until_match() {
        let mut queue = quiet_queue(vec![
            signal("Foo").with_attr("args", vec![1]),
            signal("Bar"),
        ]);

        let bar = queue.expect(signal_pattern("Bar")).await.unwrap();
        assert_eq!(bar.attr("signal"), Some(&Value::from("Bar")));

        let err = queue.expect(signal_pattern("Foo")).await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }

    #[tokio::test]
    async fn expect_uses_directly_appended_events() {
        let mut queue = quiet_queue(vec![]);
        queue.append(signal("Foo"));
        assert!(queue.expect(signal_pattern("Foo")).await.is_ok());
        assert!(queue.pending().is_empty());
    }

    #[tokio::test]
    async fn expect_only_pops_its_category() {
        let iq = Event::new("stream-iq").unwrap();
        let mut queue = quiet_queue(vec![iq.clone(), signal("Foo")]);

        queue.expect(signal_pattern("Foo")).await.unwrap();
        assert_eq!(queue.pending().len(), 1);
        let got = queue
            .expect(EventPattern::new("stream-iq").unwrap())
            .await
            .unwrap();
        assert_eq!(got.id(), iq.id());
    }

    #[tokio::test]
    async fn timeout_lists_outstanding_pattern() {
        let mut queue = quiet_queue(vec![]);
        let err = queue.expect(signal_pattern("Foo")).await.unwrap_err();
        match err {
            Error::Timeout {
                categories,
                outstanding,
                timeout,
            } => {
                assert_eq!(categories, vec!["dbus".to_string()]);
                assert_eq!(outstanding, vec!["dbus-signal signal=\"Foo\"".to_string()]);
                assert_eq!(timeout, Duration::from_secs(5));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    // ==================== demand ====================

    #[tokio::test]
    async fn demand_returns_matching_head() {
        let mut queue = quiet_queue(vec![signal("Foo")]);
        assert!(queue.demand(signal_pattern("Foo")).await.is_ok());
    }

    #[tokio::test]
    async fn demand_fails_on_first_mismatch() {
        let mut queue = quiet_queue(vec![signal("Foo"), signal("Bar")]);
        let err = queue.demand(signal_pattern("Bar")).await.unwrap_err();
        match &err {
            Error::UnexpectedEvent { expected, actual } => {
                assert_eq!(expected, "dbus-signal signal=\"Bar\"");
                assert_eq!(actual.attr("signal"), Some(&Value::from("Foo")));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
        // the mismatching event is consumed, the next one is still there
        assert!(queue.demand(signal_pattern("Bar")).await.is_ok());
    }

    #[tokio::test]
    async fn demand_checks_forbidden_first() {
        let forbidden = signal_pattern("Foo");
        let mut queue = quiet_queue(vec![signal("Foo")]);
        queue.forbid_events(&[forbidden]);
        let err = queue.demand(signal_pattern("Foo")).await.unwrap_err();
        assert!(matches!(err, Error::ForbiddenEventOccurred { .. }));
    }

    // ==================== forbid ====================

    #[tokio::test]
    async fn forbidden_takes_precedence_over_match() {
        let mut queue = quiet_queue(vec![signal("Foo")]);
        let p = signal_pattern("Foo");
        queue.forbid_events(std::slice::from_ref(&p));

        let err = queue.expect(p.clone()).await.unwrap_err();
        match err {
            Error::ForbiddenEventOccurred { event, pattern } => {
                assert_eq!(event.attr("signal"), Some(&Value::from("Foo")));
                assert_eq!(pattern, p.to_string());
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unforbid_lifts_only_given_patterns() {
        let foo = signal_pattern("Foo");
        let bar = signal_pattern("Bar");
        let mut queue = quiet_queue(vec![signal("Foo"), signal("Bar")]);
        queue.forbid_events(&[foo.clone(), bar.clone()]);
        queue.unforbid_events(&[foo.clone()]);

        assert!(queue.expect(foo).await.is_ok());
        assert!(matches!(
            queue.expect(bar).await,
            Err(Error::ForbiddenEventOccurred { .. })
        ));
    }

    #[tokio::test]
    async fn unforbid_all_clears_everything() {
        let mut queue = quiet_queue(vec![signal("Foo")]);
        queue.forbid_events(&[signal_pattern("Foo"), signal_pattern("Bar")]);
        queue.unforbid_all();
        assert!(queue.expect(signal_pattern("Foo")).await.is_ok());
    }

    // ==================== housekeeping ====================

    #[tokio::test]
    async fn flush_past_events_drops_queued_only() {
        let mut queue = quiet_queue(vec![signal("Late")]);
        queue.append(signal("Early"));
        queue.append(Event::new("stream-iq").unwrap());

        assert_eq!(queue.flush_past_events("dbus"), 1);
        assert_eq!(queue.pending().len(), 1);
        assert!(queue.expect(signal_pattern("Late")).await.is_ok());
    }

    #[test]
    fn set_timeout_overrides_config() {
        let mut queue = quiet_queue(vec![]);
        assert_eq!(queue.timeout(), Duration::from_secs(5));
        queue.set_timeout(Duration::from_millis(20));
        assert_eq!(queue.timeout(), Duration::from_millis(20));
        assert_eq!(queue.config().default_timeout(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_timeout_is_capped() {
        let before = Instant::now();
        let deadline = deadline_after(Duration::MAX);
        assert!(deadline >= before + FAR_FUTURE);
        assert_eq!(
            deadline_after(Duration::from_millis(5)).saturating_duration_since(before),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn debug_is_compact() {
        let queue = quiet_queue(vec![]);
        let s = format!("{queue:?}");
        assert!(s.starts_with("EventQueue"));
        assert!(s.contains("Router"));
    }
}
