use std::{fmt, str::FromStr};

use uuid::Uuid;

/// Identity of a single observation.
///
/// Drawn at random when a producer builds the [`Event`](crate::Event).
/// Clones of an event carry the same id, so two handles with equal ids are
/// the same observation; tests use that to check an event reached at most
/// one waiter.
///
/// Log records carry the [`short`](Self::short) form. The full form is a
/// hyphenated UUID and parses back with [`str::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EventId(Uuid);

impl EventId {
    pub(crate) fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Leading eight hex digits, enough to tell events of one test apart.
    pub fn short(&self) -> ShortId {
        ShortId((self.0.as_u128() >> 96) as u32)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        EventId(uuid)
    }
}

impl From<EventId> for Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(EventId)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// Abbreviated [`EventId`] for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortId(u32);

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
