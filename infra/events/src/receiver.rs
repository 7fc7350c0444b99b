use crate::error::EventBusError;
use crate::event::{Event, EventType, Payload};
use crate::fanout::EventReceiver;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc::error::TryRecvError;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

/// A live attachment to a channel or to the main stream.
///
/// Replayed history (if any) comes first, then every event emitted after the
/// subscription was created. Live events queue up without bound until they
/// are received. Dropping the subscription detaches it.
pub struct Subscription<P> {
    event_type: Option<EventType>,
    backlog: VecDeque<Arc<Event<P>>>,
    receiver: EventReceiver<P>,
}

impl<P: Payload> Subscription<P> {
    pub(crate) fn new(
        event_type: Option<EventType>,
        backlog: VecDeque<Arc<Event<P>>>,
        receiver: EventReceiver<P>,
    ) -> Self {
        Self { event_type, backlog, receiver }
    }

    /// Receives the next event, returning `None` once the bus is gone and
    /// everything queued has been received.
    pub async fn recv(&mut self) -> Option<Arc<Event<P>>> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }
        self.receiver.recv().await
    }

    /// Receives the next event without waiting.
    ///
    /// # Errors
    /// Returns [`EventBusError::Closed`] once the bus is gone and nothing is
    /// left to deliver.
    pub fn try_recv(&mut self) -> Result<Option<Arc<Event<P>>>, EventBusError> {
        if let Some(event) = self.backlog.pop_front() {
            return Ok(Some(event));
        }

        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(EventBusError::Closed {
                message: "all senders dropped".into(),
                context: self.event_type.as_ref().map(|t| t.to_string().into()),
            }),
        }
    }

    /// Takes every event that is ready right now, in delivery order.
    pub fn drain(&mut self) -> Vec<Arc<Event<P>>> {
        let mut events = Vec::with_capacity(self.backlog.len() + self.receiver.len());
        while let Ok(Some(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Detaches from the bus. Other subscribers are unaffected.
    pub fn unsubscribe(self) {
        debug!(
            event_type = self.event_type.as_ref().map(EventType::as_str),
            main_stream = self.event_type.is_none(),
            pending = self.backlog.len() + self.receiver.len(),
            "Subscription dropped"
        );
    }

    /// The selected event type; `None` for main-stream subscriptions.
    #[must_use]
    pub const fn event_type(&self) -> Option<&EventType> {
        self.event_type.as_ref()
    }

    /// Converts the subscription into a [`Stream`] for use with stream
    /// combinators such as `merge`.
    #[must_use]
    pub fn into_stream(self) -> EventStream<P> {
        EventStream {
            event_type: self.event_type,
            backlog: self.backlog,
            inner: UnboundedReceiverStream::new(self.receiver),
        }
    }
}

impl<P> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("backlog", &self.backlog.len())
            .field("queued", &self.receiver.len())
            .finish()
    }
}

/// A [`Subscription`] adapted to [`Stream`].
///
/// Yields replayed history first, then live events. The stream ends when the
/// bus is gone and every queued event has been yielded.
pub struct EventStream<P> {
    event_type: Option<EventType>,
    backlog: VecDeque<Arc<Event<P>>>,
    inner: UnboundedReceiverStream<Arc<Event<P>>>,
}

impl<P> EventStream<P> {
    /// The selected event type; `None` for the main stream.
    #[must_use]
    pub const fn event_type(&self) -> Option<&EventType> {
        self.event_type.as_ref()
    }
}

impl<P: Payload> Stream for EventStream<P> {
    type Item = Arc<Event<P>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(event) = this.backlog.pop_front() {
            return Poll::Ready(Some(event));
        }
        Pin::new(&mut this.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.backlog.len(), None)
    }
}

impl<P> fmt::Debug for EventStream<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("event_type", &self.event_type)
            .field("backlog", &self.backlog.len())
            .finish_non_exhaustive()
    }
}
