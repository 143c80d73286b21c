use std::{fmt, future::IntoFuture, pin::Pin, time::Duration};

use crate::{
    Error, Event, EventPattern, EventQueue, Result, queue::deadline_after, scheduler::Scheduler,
};

/// A pending `expect` or `demand` call.
///
/// Created by [`EventQueue::expect`] and [`EventQueue::demand`]. Nothing
/// happens until it is awaited. The deadline is fixed when the await
/// starts and covers the whole call, however many events get discarded.
///
/// # Example
///
/// ```ignore
/// // Default timeout of the queue
/// let event = queue.expect(EventPattern::new("dbus-signal")?).await?;
///
/// // With a custom timeout
/// let event = queue
///     .demand(EventPattern::new("stream-iq")?.with_attr("type", "result"))
///     .within(Duration::from_millis(200))
///     .await?;
/// ```
pub struct Expectation<'a, S: Scheduler> {
    queue: &'a mut EventQueue<S>,
    pattern: EventPattern,
    timeout: Duration,
    strict: bool,
}

impl<'a, S: Scheduler> Expectation<'a, S> {
    pub(crate) fn new(queue: &'a mut EventQueue<S>, pattern: EventPattern, strict: bool) -> Self {
        let timeout = queue.timeout();
        Self {
            queue,
            pattern,
            timeout,
            strict,
        }
    }

    /// Override the queue's timeout for this call.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(self) -> Result<Event> {
        let deadline = deadline_after(self.timeout);

        loop {
            let event = self
                .queue
                .next_event(&[&self.pattern], deadline, self.timeout)
                .await?;

            if self.pattern.matches(&event) {
                self.queue.tracer.matched(&event, &self.pattern);
                return Ok(event);
            }
            if self.strict {
                return Err(Error::UnexpectedEvent {
                    expected: self.pattern.to_string(),
                    actual: Box::new(event),
                });
            }
            self.queue.tracer.discarded(&event);
        }
    }
}

impl<'a, S: Scheduler + 'a> IntoFuture for Expectation<'a, S> {
    type Output = Result<Event>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl<S: Scheduler> fmt::Debug for Expectation<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("pattern", &self.pattern)
            .field("timeout", &self.timeout)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

/// A pending `expect_many` call.
///
/// Created by [`EventQueue::expect_many`]. Resolves to one event per
/// pattern, in pattern order, once every pattern has been matched.
///
/// # Example
///
/// ```ignore
/// let [signal, reply]: [Event; 2] = queue
///     .expect_many([
///         EventPattern::new("dbus-signal")?.with_attr("signal", "NewChannel"),
///         EventPattern::new("stream-iq")?.with_attr("type", "result"),
///     ])
///     .within(Duration::from_secs(2))
///     .await?
///     .try_into()
///     .unwrap();
/// ```
pub struct ExpectMany<'a, S: Scheduler> {
    queue: &'a mut EventQueue<S>,
    patterns: Vec<EventPattern>,
    timeout: Duration,
}

impl<'a, S: Scheduler> ExpectMany<'a, S> {
    pub(crate) fn new(queue: &'a mut EventQueue<S>, patterns: Vec<EventPattern>) -> Self {
        let timeout = queue.timeout();
        Self {
            queue,
            patterns,
            timeout,
        }
    }

    /// Override the queue's timeout for this call.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(self) -> Result<Vec<Event>> {
        let deadline = deadline_after(self.timeout);
        let mut results: Vec<Option<Event>> = vec![None; self.patterns.len()];

        while results.iter().any(Option::is_none) {
            let outstanding: Vec<&EventPattern> = self
                .patterns
                .iter()
                .zip(&results)
                .filter(|(_, result)| result.is_none())
                .map(|(pattern, _)| pattern)
                .collect();
            let event = self
                .queue
                .next_event(&outstanding, deadline, self.timeout)
                .await?;

            // Earliest outstanding pattern wins.
            let slot = (0..self.patterns.len())
                .find(|&i| results[i].is_none() && self.patterns[i].matches(&event));
            match slot {
                Some(i) => {
                    self.queue.tracer.matched(&event, &self.patterns[i]);
                    results[i] = Some(event);
                }
                None => self.queue.tracer.discarded(&event),
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}

impl<'a, S: Scheduler + 'a> IntoFuture for ExpectMany<'a, S> {
    type Output = Result<Vec<Event>>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl<S: Scheduler> fmt::Debug for ExpectMany<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectMany")
            .field("patterns", &self.patterns)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
