use std::time::Duration;

/// Floor for [`Config::poll_interval`]; a zero slice would spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Which available category a multi-category wait drains first.
///
/// Within a category events always come out in arrival order. Across
/// categories there are two rules:
///
/// - [`Arrival`](Self::Arrival): the category whose head event arrived
///   first. Equivalent to one global arrival log filtered by category.
/// - [`FirstSeen`](Self::FirstSeen): the category that was appended to
///   first, ever, regardless of when its queued events arrived. Kept for
///   scenario scripts written against that behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CategoryOrder {
    #[default]
    Arrival,
    FirstSeen,
}

/// Construction-time configuration of an [`EventQueue`](crate::EventQueue).
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use expecto::{CategoryOrder, Config};
///
/// let config = Config::default()
///     .with_default_timeout(Duration::from_secs(2))
///     .with_poll_interval(Duration::from_millis(5))
///     .with_category_order(CategoryOrder::FirstSeen)
///     .with_verbose(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Deadline for a whole `expect`, `expect_many` or `demand` call.
    /// Default: 5s
    default_timeout: Duration,

    /// Longest slice the scheduler pumps before the queue checks its
    /// categories again. Bounds how late a timeout can fire.
    /// Default: 10ms
    poll_interval: Duration,

    /// Log every popped, matched and discarded event at `info` level
    /// instead of `trace`/`debug`.
    /// Default: false
    verbose: bool,

    /// Default: [`CategoryOrder::Arrival`]
    category_order: CategoryOrder,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            verbose: false,
            category_order: CategoryOrder::default(),
        }
    }
}

impl Config {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Set the pump slice.
    ///
    /// Smaller slices make timeouts tighter at the cost of more wakeups.
    /// A zero interval is raised to one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// The pump slice, never below one millisecond however the config was
    /// built or deserialized.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn with_category_order(mut self, order: CategoryOrder) -> Self {
        self.category_order = order;
        self
    }

    pub fn category_order(&self) -> CategoryOrder {
        self.category_order
    }
}
