use crate::aggregator::Aggregator;
use crate::channel::Channel;
use crate::event::{EventType, Payload};
use crate::history::HistorySettings;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Owns every channel of a bus, keyed by event type.
///
/// Channels are created on first use and never removed.
pub(crate) struct Registry<P> {
    channels: RwLock<FxHashMap<EventType, Arc<Channel<P>>>>,
    history: HistorySettings,
    main: Arc<Aggregator<P>>,
}

impl<P: Payload> Registry<P> {
    /// Creates the registry and eagerly realizes a replay-capable channel for
    /// every type in `history`, in key order.
    pub(crate) fn new(history: HistorySettings, main: Arc<Aggregator<P>>) -> Self {
        let registry = Self { channels: RwLock::new(FxHashMap::default()), history, main };
        for (event_type, _) in registry.history.iter() {
            registry.ensure(event_type);
        }
        registry
    }

    /// Returns the channel for `key`, creating it exactly once.
    ///
    /// A newly created channel is admitted into the main stream before this
    /// returns. A cache hit never touches the aggregator.
    pub(crate) fn ensure(&self, key: &EventType) -> Arc<Channel<P>> {
        let existing = self.channels.read().get(key).cloned();
        if let Some(channel) = existing {
            return channel;
        }

        let mut channels = self.channels.write();
        let channel = channels.entry(key.clone()).or_insert_with(|| {
            self.main.admit(key.clone(), self.history.capacity(key.as_str()))
        });
        Arc::clone(channel)
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<Channel<P>>> {
        self.channels.read().get(key).cloned()
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.channels.read().contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub(crate) const fn history(&self) -> &HistorySettings {
        &self.history
    }
}

impl<P> fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("channels", &self.channels.read().len())
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}
