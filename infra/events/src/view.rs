use crate::aggregator::Aggregator;
use crate::channel::Channel;
use crate::event::{EventType, Payload};
use crate::history::Replay;
use crate::receiver::{EventStream, Subscription};
use std::fmt;
use std::sync::Arc;

enum Source<P> {
    Channel { channel: Arc<Channel<P>>, replay: Replay },
    Main(Arc<Aggregator<P>>),
}

impl<P> Clone for Source<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Channel { channel, replay } => {
                Self::Channel { channel: Arc::clone(channel), replay: *replay }
            },
            Self::Main(main) => Self::Main(Arc::clone(main)),
        }
    }
}

/// Read-only handle onto one channel or onto the main stream.
///
/// A view can only be subscribed to; emitting is reserved to
/// [`Bus::emit`](crate::Bus::emit). Each [`subscribe`](Self::subscribe) call
/// takes a fresh replay snapshot.
///
/// ```compile_fail
/// use tidings_event_bus::{Bus, Event};
///
/// let bus = Bus::<u8>::new();
/// bus.main_stream().emit(Event::new("tick", 1));
/// ```
pub struct EventView<P> {
    source: Source<P>,
}

impl<P: Payload> EventView<P> {
    pub(crate) fn channel(channel: Arc<Channel<P>>, replay: Replay) -> Self {
        Self { source: Source::Channel { channel, replay } }
    }

    pub(crate) fn main(main: Arc<Aggregator<P>>) -> Self {
        Self { source: Source::Main(main) }
    }

    #[must_use]
    pub fn subscribe(&self) -> Subscription<P> {
        match &self.source {
            Source::Channel { channel, replay } => channel.subscribe(*replay),
            Source::Main(main) => main.subscribe(),
        }
    }

    /// Shorthand for `subscribe().into_stream()`.
    #[must_use]
    pub fn stream(&self) -> EventStream<P> {
        self.subscribe().into_stream()
    }

    /// The selected event type; `None` for the main stream.
    #[must_use]
    pub fn event_type(&self) -> Option<&EventType> {
        match &self.source {
            Source::Channel { channel, .. } => Some(channel.key()),
            Source::Main(_) => None,
        }
    }

    /// Number of live subscriptions attached to the underlying stream.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        match &self.source {
            Source::Channel { channel, .. } => channel.subscriber_count(),
            Source::Main(main) => main.subscriber_count(),
        }
    }
}

impl<P> Clone for EventView<P> {
    fn clone(&self) -> Self {
        Self { source: self.source.clone() }
    }
}

impl<P> fmt::Debug for EventView<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Channel { channel, replay } => f
                .debug_struct("EventView")
                .field("channel", channel)
                .field("replay", replay)
                .finish(),
            Source::Main(main) => f.debug_struct("EventView").field("main", main).finish(),
        }
    }
}
