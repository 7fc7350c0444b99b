use std::any::Any;
use std::borrow::{Borrow, Cow};
use std::fmt;
use std::sync::Arc;

/// Marker trait for payloads that can travel across the [`Bus`](crate::Bus).
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Payload: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Payload for T {}

/// Dynamically typed payload, for buses that carry heterogeneous events.
pub type AnyPayload = Arc<dyn Any + Send + Sync>;

/// Key identifying a logical channel on the bus.
///
/// Any string is a valid key; static strings are stored without allocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct EventType(Cow<'static, str>);

impl EventType {
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EventType {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&Self> for EventType {
    fn from(event_type: &Self) -> Self {
        event_type.clone()
    }
}

impl Borrow<str> for EventType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable event: the channel key it belongs to and its payload.
///
/// Subscribers receive events as `Arc<Event<P>>`, so one emission is shared
/// by every receiver without cloning the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event<P> {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    event_type: EventType,
    payload: P,
}

impl<P> Event<P> {
    pub fn new(event_type: impl Into<EventType>, payload: P) -> Self {
        Self { event_type: event_type.into(), payload }
    }

    #[must_use]
    pub const fn event_type(&self) -> &EventType {
        &self.event_type
    }

    #[must_use]
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> P {
        self.payload
    }
}
