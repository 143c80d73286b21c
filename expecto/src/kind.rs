use std::{fmt, hash::Hash, sync::Arc};

use crate::{Error, Result};

/// Separator between an event's category and its subtype.
pub const SEPARATOR: char = '-';

/// The full type string of an event, e.g. `"dbus-signal"`.
///
/// A kind is what patterns compare against. Its [`Category`] is everything
/// before the first [`SEPARATOR`]; a kind without a separator is its own
/// category.
///
/// Construction validates the kind, so malformed kinds fail when an event
/// or pattern is built rather than when something waits for it.
///
/// ```rust
/// use expecto::Kind;
///
/// let kind = Kind::new("dbus-method-call").unwrap();
/// assert_eq!(kind.category().as_str(), "dbus");
/// assert_eq!(kind.subtype(), Some("method-call"));
/// assert!(Kind::new("-signal").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Kind {
    name: Arc<str>,
    category: Category,
}

impl Kind {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidKind(name.to_string()));
        }
        let category = match name.split_once(SEPARATOR) {
            Some((category, _)) => category,
            None => name,
        };
        if category.is_empty() {
            return Err(Error::InvalidKind(name.to_string()));
        }
        Ok(Self {
            name: Arc::from(name),
            category: Category(Arc::from(category)),
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Returns the routing category derived from this kind.
    #[inline]
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Returns the part after the first separator, if there is one.
    pub fn subtype(&self) -> Option<&str> {
        self.name.split_once(SEPARATOR).map(|(_, rest)| rest)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl TryFrom<&str> for Kind {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        Kind::new(name)
    }
}

impl TryFrom<String> for Kind {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        Kind::new(&name)
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        kind.name.to_string()
    }
}

/// Coarse routing group of an event kind (`"dbus"`, `"stream"`, `"socket"`).
///
/// Every category owns its own FIFO queue in the [`Router`](crate::Router).
/// Ordering is guaranteed within a category only.
///
/// Cheap to clone. Categories are obtained from a [`Kind`], or built
/// directly with [`Category::new`] when flushing or inspecting a queue.
#[derive(Debug, Clone, Ord, PartialOrd)]
pub struct Category(Arc<str>);

impl Category {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Category::new(name)
    }
}

impl PartialEq<str> for Category {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Category {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}
