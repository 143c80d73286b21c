//! Declarative event matching.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{Category, Event, Kind, Result, Value, event::Attributes};

/// Additional acceptance test evaluated after the structural match.
pub type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

static NEXT_PATTERN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an [`EventPattern`].
///
/// Allocated when a pattern is constructed and shared by its clones.
/// Forbidding and unforbidding go by this id, so a pattern kept around by
/// the test can later be lifted exactly, while another pattern with the
/// same shape stays in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternId(u64);

impl PatternId {
    fn next() -> Self {
        Self(NEXT_PATTERN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Describes what an expected (or forbidden) event must look like.
///
/// An event matches when:
/// 1. its kind equals the pattern's kind,
/// 2. every attribute named by the pattern is present on the event with an
///    equal value (extra event attributes are ignored),
/// 3. the optional predicate accepts it.
///
/// # Example
///
/// ```rust
/// use expecto::{Event, EventPattern};
///
/// let pattern = EventPattern::new("dbus-signal")?
///     .with_attr("signal", "Bar")
///     .with_predicate(|e| e.has_attr("args"));
///
/// let event = Event::new("dbus-signal")?
///     .with_attr("signal", "Bar")
///     .with_attr("args", vec![1]);
/// assert!(pattern.matches(&event));
/// # Ok::<(), expecto::Error>(())
/// ```
#[derive(Clone)]
pub struct EventPattern {
    id: PatternId,
    kind: Kind,
    attributes: Attributes,
    predicate: Option<Predicate>,
}

impl EventPattern {
    /// Create a pattern matching every event of `kind`.
    ///
    /// Fails with [`Error::InvalidKind`](crate::Error::InvalidKind) if no
    /// category can be derived from `kind`.
    pub fn new(kind: &str) -> Result<Self> {
        Ok(Self::from_kind(Kind::new(kind)?))
    }

    pub fn from_kind(kind: Kind) -> Self {
        Self {
            id: PatternId::next(),
            kind,
            attributes: Attributes::new(),
            predicate: None,
        }
    }

    /// Require `name` to be present and equal to `value`.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_attrs<I, K, V>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.attributes
            .extend(attrs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a predicate evaluated after the structural match succeeds.
    ///
    /// Replaces any predicate set earlier.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    #[inline]
    pub fn id(&self) -> PatternId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    #[inline]
    pub fn category(&self) -> &Category {
        self.kind.category()
    }

    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// Returns true if `event` satisfies this pattern.
    pub fn matches(&self, event: &Event) -> bool {
        if event.kind() != &self.kind {
            return false;
        }
        let attrs_match = self
            .attributes
            .iter()
            .all(|(name, expected)| event.attr(name) == Some(expected));
        if !attrs_match {
            return false;
        }
        self.predicate.as_ref().is_none_or(|p| p(event))
    }
}

impl fmt::Debug for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPattern")
            .field("id", &self.id)
            .field("kind", &self.kind.as_str())
            .field("attributes", &self.attributes)
            .field("predicate", &self.predicate.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}={value}")?;
        }
        if self.predicate.is_some() {
            write!(f, " <predicate>")?;
        }
        Ok(())
    }
}

impl From<Kind> for EventPattern {
    fn from(kind: Kind) -> Self {
        EventPattern::from_kind(kind)
    }
}
