use crate::aggregator::Outlet;
use crate::event::{Event, EventType, Payload};
use crate::fanout::Fanout;
use crate::history::{HistoryBuffer, Replay};
use crate::receiver::Subscription;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

struct ChannelState<P> {
    history: Option<HistoryBuffer<P>>,
    subscribers: Fanout<P>,
}

/// One event type's multicast unit.
///
/// The state mutex serializes pushes against subscribes, which keeps the
/// replay snapshot and the live queue disjoint and gap-free. It is held for
/// plain channels too, so the outlet sees each channel's events in push order.
pub(crate) struct Channel<P> {
    key: EventType,
    retention: Option<usize>,
    state: Mutex<ChannelState<P>>,
    outlet: Arc<Outlet<P>>,
}

impl<P: Payload> Channel<P> {
    pub(crate) fn new(key: EventType, retention: Option<usize>, outlet: Arc<Outlet<P>>) -> Self {
        trace!(event_type = %key, ?retention, "Initializing new event channel");
        Self {
            key,
            retention,
            state: Mutex::new(ChannelState {
                history: retention.map(HistoryBuffer::new),
                subscribers: Fanout::new(),
            }),
            outlet,
        }
    }

    /// Records the event, fans it out to the main stream and to this channel's
    /// subscribers. Returns how many subscriptions it reached in total.
    pub(crate) fn push(&self, event: Arc<Event<P>>) -> usize {
        let _gate = self.outlet.enter();
        let mut state = self.state.lock();

        let (sequence, merged) = self.outlet.forward(&event);
        let direct = state.subscribers.send(&event);
        if let Some(buffer) = state.history.as_mut() {
            buffer.push(sequence, event);
        }
        drop(state);

        if direct + merged == 0 {
            trace!(event_type = %self.key, sequence, "Event dropped: no active subscribers");
        } else {
            trace!(event_type = %self.key, sequence, direct, merged, "Event dispatched");
        }
        direct + merged
    }

    pub(crate) fn subscribe(&self, replay: Replay) -> Subscription<P> {
        let mut state = self.state.lock();
        let backlog: VecDeque<Arc<Event<P>>> = state
            .history
            .as_ref()
            .map(|buffer| buffer.latest(replay).map(|(_, event)| Arc::clone(event)).collect())
            .unwrap_or_default();
        let receiver = state.subscribers.attach();
        drop(state);

        Subscription::new(Some(self.key.clone()), backlog, receiver)
    }

    /// Appends the retained events selected by `replay`, with their sequence
    /// numbers. Callers must hold the outlet gate exclusively.
    pub(crate) fn snapshot_into(&self, replay: Replay, out: &mut Vec<(u64, Arc<Event<P>>)>) {
        if let Some(buffer) = self.state.lock().history.as_ref() {
            out.extend(buffer.latest(replay).cloned());
        }
    }
}

impl<P> Channel<P> {
    pub(crate) const fn key(&self) -> &EventType {
        &self.key
    }

    /// Configured history capacity; `None` for plain channels.
    pub(crate) const fn retention(&self) -> Option<usize> {
        self.retention
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.live()
    }
}

impl<P> fmt::Debug for Channel<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.try_lock();
        let buffered = state.as_ref().and_then(|s| s.history.as_ref().map(HistoryBuffer::len));
        let subscribers = state.as_ref().map(|s| s.subscribers.live());
        drop(state);
        f.debug_struct("Channel")
            .field("key", &self.key)
            .field("retention", &self.retention)
            .field("buffered", &buffered)
            .field("subscribers", &subscribers)
            .finish_non_exhaustive()
    }
}
