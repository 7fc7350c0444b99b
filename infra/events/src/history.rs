//! Replay history: which channels retain events, how many, and how much of
//! that retention a subscriber asks to see again.

use crate::error::EventBusError;
use crate::event::{Event, EventType};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

const MIN_RETENTION: usize = 1;

/// Per-type retention counts, fixed at bus construction.
///
/// Every type listed here gets a replay-capable channel created eagerly, so
/// events emitted before anyone selects that type are still retained. Entries
/// are kept sorted by event type; that is also the order the eager channels
/// are created in, whatever order they were listed in.
///
/// # Examples
/// ```rust
/// use tidings_event_bus::HistorySettings;
///
/// let settings = HistorySettings::new().retain("orders:created", 16).retain("orders:failed", 1);
/// assert_eq!(settings.capacity("orders:created"), Some(16));
/// assert_eq!(settings.capacity("orders:shipped"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct HistorySettings {
    retention: BTreeMap<EventType, usize>,
}

impl HistorySettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains the last `capacity` events of `event_type`. A later call for the
    /// same type replaces the earlier capacity.
    #[must_use = "HistorySettings is a value; the updated settings must be used"]
    pub fn retain(mut self, event_type: impl Into<EventType>, capacity: usize) -> Self {
        self.retention.insert(event_type.into(), capacity);
        self
    }

    #[must_use]
    pub fn capacity(&self, event_type: &str) -> Option<usize> {
        self.retention.get(event_type).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.retention.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retention.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EventType, usize)> {
        self.retention.iter().map(|(event_type, capacity)| (event_type, *capacity))
    }

    pub(crate) fn validate(&self) -> Result<(), EventBusError> {
        if let Some((event_type, _)) = self.iter().find(|(_, capacity)| *capacity < MIN_RETENTION)
        {
            return Err(EventBusError::InvalidCapacity {
                message: format!("history capacity must be >= {MIN_RETENTION}").into(),
                context: Some(event_type.to_string().into()),
            });
        }
        Ok(())
    }
}

impl<K: Into<EventType>> FromIterator<(K, usize)> for HistorySettings {
    fn from_iter<I: IntoIterator<Item = (K, usize)>>(iter: I) -> Self {
        Self { retention: iter.into_iter().map(|(k, capacity)| (k.into(), capacity)).collect() }
    }
}

/// Options for [`Bus::select_with`](crate::Bus::select_with).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    history_length: Option<usize>,
}

impl SelectOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self { history_length: None }
    }

    /// Replays only the most recent `length` retained events on subscribe.
    #[must_use]
    pub const fn history_length(mut self, length: usize) -> Self {
        self.history_length = Some(length);
        self
    }

    pub(crate) const fn requested_history(&self) -> Option<usize> {
        self.history_length
    }
}

/// How many retained events a view hands to each new subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Replay {
    /// Plain channel, or the main stream's live-only part.
    None,
    /// Everything the channel retains.
    Full,
    /// Only the most recent `n` retained events.
    Last(usize),
}

impl Replay {
    /// Checks a requested history length against a channel's retention.
    pub(crate) fn resolve(
        requested: Option<usize>,
        retention: Option<usize>,
    ) -> Result<Self, EventBusError> {
        match (requested, retention) {
            (None, None) => Ok(Self::None),
            (None, Some(_)) => Ok(Self::Full),
            (Some(_), None) => Err(EventBusError::InvalidHistoryRequest {
                message: "channel has no configured history".into(),
                context: None,
            }),
            (Some(0), Some(_)) => Err(EventBusError::InvalidHistoryRequest {
                message: "history length must be >= 1".into(),
                context: None,
            }),
            (Some(length), Some(capacity)) if length > capacity => {
                Err(EventBusError::InvalidHistoryRequest {
                    message: format!("requested {length} events but only {capacity} are retained")
                        .into(),
                    context: None,
                })
            },
            (Some(length), Some(_)) => Ok(Self::Last(length)),
        }
    }
}

/// Fixed-capacity ring of the most recent events on one channel, each tagged
/// with its bus-wide sequence number.
#[derive(Debug)]
pub(crate) struct HistoryBuffer<P> {
    capacity: usize,
    entries: VecDeque<(u64, Arc<Event<P>>)>,
}

impl<P> HistoryBuffer<P> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self { capacity, entries: VecDeque::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn push(&mut self, sequence: u64, event: Arc<Event<P>>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((sequence, event));
    }

    /// The most recent `min(replay, len)` entries, oldest first.
    pub(crate) fn latest(
        &self,
        replay: Replay,
    ) -> impl Iterator<Item = &(u64, Arc<Event<P>>)> + '_ {
        let take = match replay {
            Replay::None => 0,
            Replay::Full => self.entries.len(),
            Replay::Last(n) => n.min(self.entries.len()),
        };
        self.entries.iter().skip(self.entries.len() - take)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(capacity: usize, count: u32) -> HistoryBuffer<u32> {
        let mut buffer = HistoryBuffer::new(capacity);
        for i in 0..count {
            buffer.push(u64::from(i), Arc::new(Event::new("tick", i)));
        }
        buffer
    }

    fn payloads(buffer: &HistoryBuffer<u32>, replay: Replay) -> Vec<u32> {
        buffer.latest(replay).map(|(_, e)| *e.payload()).collect()
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let buffer = buffer_with(3, 5);
        assert_eq!(buffer.len(), 3);
        assert_eq!(payloads(&buffer, Replay::Full), vec![2, 3, 4]);
    }

    #[test]
    fn test_partial_replay_takes_most_recent() {
        let buffer = buffer_with(3, 5);
        assert_eq!(payloads(&buffer, Replay::Last(1)), vec![4]);
        assert_eq!(payloads(&buffer, Replay::Last(2)), vec![3, 4]);
        assert_eq!(payloads(&buffer, Replay::None), Vec::<u32>::new());
    }

    #[test]
    fn test_partial_replay_on_underfilled_buffer() {
        let buffer = buffer_with(4, 1);
        assert_eq!(payloads(&buffer, Replay::Last(3)), vec![0]);
    }

    #[test]
    fn test_resolve_replay() {
        assert_eq!(Replay::resolve(None, None), Ok(Replay::None));
        assert_eq!(Replay::resolve(None, Some(2)), Ok(Replay::Full));
        assert_eq!(Replay::resolve(Some(2), Some(2)), Ok(Replay::Last(2)));
        assert!(matches!(
            Replay::resolve(Some(3), Some(2)),
            Err(EventBusError::InvalidHistoryRequest { .. })
        ));
        assert!(matches!(
            Replay::resolve(Some(0), Some(2)),
            Err(EventBusError::InvalidHistoryRequest { .. })
        ));
        assert!(matches!(
            Replay::resolve(Some(1), None),
            Err(EventBusError::InvalidHistoryRequest { .. })
        ));
    }

    #[test]
    fn test_settings_reject_zero_capacity() {
        let settings = HistorySettings::new().retain("a", 1).retain("b", 0);
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, EventBusError::InvalidCapacity { context: Some(ref c), .. } if c == "b"));
    }

    #[test]
    fn test_settings_from_iter_last_wins() {
        let settings: HistorySettings = [("a", 1), ("a", 5)].into_iter().collect();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings.capacity("a"), Some(5));
    }
}
