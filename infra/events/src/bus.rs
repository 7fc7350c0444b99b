use crate::aggregator::Aggregator;
use crate::error::{EventBusError, EventBusErrorExt};
use crate::event::{Event, EventType, Payload};
use crate::history::{HistorySettings, Replay, SelectOptions};
use crate::registry::Registry;
use crate::view::EventView;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Construction-time settings of a [`Bus`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct BusConfig {
    /// Which event types retain history, and how much.
    pub history: HistorySettings,
}

/// Builder for a [`Bus`] with replay history.
pub struct BusBuilder<P> {
    config: BusConfig,
    payload: PhantomData<fn() -> P>,
}

impl<P: Payload> BusBuilder<P> {
    #[must_use = "Replaces the history settings of the bus"]
    pub fn history(mut self, history: HistorySettings) -> Self {
        self.config.history = history;
        self
    }

    #[must_use = "Retains the last `capacity` events of `event_type`"]
    pub fn retain(mut self, event_type: impl Into<EventType>, capacity: usize) -> Self {
        self.config.history = self.config.history.retain(event_type, capacity);
        self
    }

    /// Validates the configuration and creates the bus, including every
    /// history-enabled channel.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] if any history capacity is
    /// zero.
    pub fn build(self) -> Result<Bus<P>, EventBusError> {
        Bus::from_config(self.config)
    }
}

impl<P> fmt::Debug for BusBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusBuilder").field("config", &self.config).finish()
    }
}

struct BusInner<P> {
    registry: Registry<P>,
    main: Arc<Aggregator<P>>,
}

/// In-process publish/subscribe bus keyed by [`EventType`].
///
/// Channels are created on the first [`emit`](Self::emit) or
/// [`select`](Self::select) of their type, except history-enabled ones which
/// exist from construction. The bus is a cheap handle: clones share the same
/// channels.
pub struct Bus<P> {
    inner: Arc<BusInner<P>>,
}

impl<P: Payload> Bus<P> {
    /// Creates a bus without history.
    #[must_use]
    pub fn new() -> Self {
        Self::assemble(BusConfig::default())
    }

    #[must_use]
    pub fn builder() -> BusBuilder<P> {
        BusBuilder { config: BusConfig::default(), payload: PhantomData }
    }

    /// Creates a bus that retains history for the given types.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] if any capacity is zero.
    ///
    /// # Examples
    /// ```rust
    /// use tidings_event_bus::{Bus, Event, HistorySettings};
    ///
    /// # fn main() -> Result<(), tidings_event_bus::EventBusError> {
    /// let bus = Bus::with_history(HistorySettings::new().retain("price", 2))?;
    /// bus.emit(Event::new("price", 100));
    /// bus.emit(Event::new("price", 101));
    /// bus.emit(Event::new("price", 102));
    ///
    /// let mut sub = bus.select("price").subscribe();
    /// let replayed: Vec<i32> = sub.drain().iter().map(|e| *e.payload()).collect();
    /// assert_eq!(replayed, vec![101, 102]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_history(history: HistorySettings) -> Result<Self, EventBusError> {
        Self::from_config(BusConfig { history, ..BusConfig::default() })
    }

    /// Creates a bus from a complete configuration.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidCapacity`] if any history capacity is
    /// zero.
    pub fn from_config(config: BusConfig) -> Result<Self, EventBusError> {
        config.history.validate()?;
        Ok(Self::assemble(config))
    }

    fn assemble(config: BusConfig) -> Self {
        let main = Arc::new(Aggregator::new());
        let registry = Registry::new(config.history, Arc::clone(&main));
        debug!(history_channels = registry.history().len(), "Event bus initialized");
        Self { inner: Arc::new(BusInner { registry, main }) }
    }

    /// Emits an event on its type's channel, creating the channel if needed.
    ///
    /// Every current subscriber of that channel and of the main stream has
    /// the event queued before this returns; queues are unbounded, so no
    /// subscriber misses an event however far behind it is. Returns the
    /// number of subscriptions reached.
    ///
    /// # Examples
    /// ```rust
    /// use tidings_event_bus::{Bus, Event};
    ///
    /// let bus = Bus::new();
    /// let mut sub = bus.select("ping").subscribe();
    /// assert_eq!(bus.emit(Event::new("ping", ())), 1);
    /// assert_eq!(sub.drain().len(), 1);
    /// ```
    pub fn emit(&self, event: Event<P>) -> usize {
        let channel = self.inner.registry.ensure(event.event_type());
        channel.push(Arc::new(event))
    }

    /// Read-only view of one event type. History-enabled channels replay
    /// everything they retain to each new subscriber.
    #[must_use]
    pub fn select(&self, event_type: impl Into<EventType>) -> EventView<P> {
        let channel = self.inner.registry.ensure(&event_type.into());
        let replay = if channel.retention().is_some() { Replay::Full } else { Replay::None };
        EventView::channel(channel, replay)
    }

    /// Like [`select`](Self::select), with a partial replay length.
    ///
    /// The channel is created even when the request is rejected.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidHistoryRequest`] if the history length
    /// is zero, exceeds the configured capacity, or the type has no history.
    ///
    /// # Examples
    /// ```rust
    /// use tidings_event_bus::{Bus, Event, SelectOptions};
    ///
    /// # fn main() -> Result<(), tidings_event_bus::EventBusError> {
    /// let bus = Bus::builder().retain("price", 2).build()?;
    /// bus.emit(Event::new("price", 1));
    /// bus.emit(Event::new("price", 2));
    ///
    /// let view = bus.select_with("price", SelectOptions::new().history_length(1))?;
    /// let replayed: Vec<i32> = view.subscribe().drain().iter().map(|e| *e.payload()).collect();
    /// assert_eq!(replayed, vec![2]);
    ///
    /// assert!(bus.select_with("price", SelectOptions::new().history_length(3)).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn select_with(
        &self,
        event_type: impl Into<EventType>,
        options: SelectOptions,
    ) -> Result<EventView<P>, EventBusError> {
        let event_type = event_type.into();
        let channel = self.inner.registry.ensure(&event_type);
        let replay = Replay::resolve(options.requested_history(), channel.retention())
            .context(event_type.to_string())?;
        Ok(EventView::channel(channel, replay))
    }

    /// Read-only view of every channel merged, including channels created
    /// after a subscription was taken.
    #[must_use]
    pub fn main_stream(&self) -> EventView<P> {
        EventView::main(Arc::clone(&self.inner.main))
    }

    /// Whether a channel exists for `event_type`.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.inner.registry.contains(event_type)
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Every known event type, in channel creation order.
    ///
    /// History-enabled channels are created at construction in key order
    /// (see [`HistorySettings`]), so they come first, sorted; lazily created
    /// channels follow in the order they were first used.
    #[must_use]
    pub fn event_types(&self) -> Vec<EventType> {
        self.inner.main.event_types()
    }

    /// History capacity of `event_type`, if it retains any.
    #[must_use]
    pub fn history_capacity(&self, event_type: &str) -> Option<usize> {
        self.inner.registry.get(event_type).and_then(|channel| channel.retention())
    }
}

impl<P: Payload> Default for Bus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for Bus<P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<P> fmt::Debug for Bus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("registry", &self.inner.registry)
            .field("main", &self.inner.main)
            .finish()
    }
}
