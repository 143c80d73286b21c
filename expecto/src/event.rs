use std::fmt;

use indexmap::IndexMap;

use crate::{Category, EventId, Kind, Result, Value};

/// Named attributes of an event or pattern, in insertion order.
pub type Attributes = IndexMap<String, Value>;

/// An immutable record of something a collaborator observed.
///
/// Bus transports, simulated network peers and protocol simulators build
/// an `Event` at the moment a notification happens and hand it to the
/// queue. From then on it is only read: the queue stores it, hands it to
/// exactly one waiter or discards it.
///
/// # Example
///
/// ```rust
/// use expecto::Event;
///
/// let event = Event::new("dbus-signal")?
///     .with_attr("signal", "MembersChanged")
///     .with_attr("args", vec![1, 2]);
///
/// assert_eq!(event.category().as_str(), "dbus");
/// assert_eq!(event.attr("signal").and_then(|v| v.as_str()), Some("MembersChanged"));
/// # Ok::<(), expecto::Error>(())
/// ```
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    id: EventId,
    kind: Kind,
    attributes: Attributes,
}

impl Event {
    /// Create an event of the given kind with no attributes.
    ///
    /// Fails with [`Error::InvalidKind`](crate::Error::InvalidKind) if no
    /// category can be derived from `kind`.
    pub fn new(kind: &str) -> Result<Self> {
        Ok(Self::from_kind(Kind::new(kind)?))
    }

    pub fn from_kind(kind: Kind) -> Self {
        Self {
            id: EventId::random(),
            kind,
            attributes: Attributes::new(),
        }
    }

    /// Set an attribute, replacing any previous value under the same name.
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

    #[inline]
    pub fn id(&self) -> EventId {
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

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Serialize this event to a single JSON line.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id.short())
            .field("kind", &self.kind.as_str())
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn builder_sets_attributes_in_order() {
        let event = Event::new("dbus-signal")
            .unwrap()
            .with_attr("signal", "Foo")
            .with_attr("args", vec![1])
            .with_attr("path", "/a/b");

        let names: Vec<_> = event.attributes().keys().map(String::as_str).collect();
        assert_eq!(names, ["signal", "args", "path"]);
        assert_eq!(event.attr("args"), Some(&Value::from(vec![1])));
        assert!(event.has_attr("path"));
        assert!(!event.has_attr("interface"));
    }

    #[test]
    fn later_attribute_replaces_earlier() {
        let event = Event::new("stream-iq")
            .unwrap()
            .with_attrs([("type", "get"), ("type", "set")]);
        assert_eq!(event.attr("type").and_then(Value::as_str), Some("set"));
        assert_eq!(event.attributes().len(), 1);
    }

    #[test]
    fn category_is_derived_from_kind() {
        let event = Event::new("stream-presence").unwrap();
        assert_eq!(event.category(), "stream");
        assert_eq!(event.kind().as_str(), "stream-presence");
    }

    #[test]
    fn invalid_kind_fails_at_construction() {
        assert_eq!(
            Event::new("").unwrap_err(),
            Error::InvalidKind(String::new())
        );
    }

    #[test]
    fn clones_share_identity() {
        let event = Event::new("socket-connected").unwrap();
        let copy = event.clone();
        assert_eq!(event.id(), copy.id());
        assert_ne!(event.id(), Event::new("socket-connected").unwrap().id());
    }

    #[test]
    fn display_lists_attributes() {
        let event = Event::new("dbus-signal")
            .unwrap()
            .with_attr("signal", "Foo")
            .with_attr("args", vec![1]);
        assert_eq!(event.to_string(), "dbus-signal signal=\"Foo\" args=[1]");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn to_json_contains_kind_and_attributes() {
        let event = Event::new("tube-offer").unwrap().with_attr("id", 4);
        let json = event.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["kind"], "tube-offer");
        assert_eq!(parsed["attributes"]["id"], 4);
        assert_eq!(parsed["id"], event.id().to_string());
    }
}
