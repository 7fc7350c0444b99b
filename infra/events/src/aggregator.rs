use crate::channel::Channel;
use crate::event::{Event, EventType, Payload};
use crate::fanout::Fanout;
use crate::history::Replay;
use crate::receiver::Subscription;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

struct OutletState<P> {
    sequence: u64,
    subscribers: Fanout<P>,
}

/// The fan-in point every channel forwards into once admitted.
///
/// Holds no reference back to the channels, so channels can keep a handle to
/// it without creating a cycle.
pub(crate) struct Outlet<P> {
    /// Shared by emits, exclusive for main-stream subscribes.
    gate: RwLock<()>,
    state: Mutex<OutletState<P>>,
}

impl<P> Outlet<P> {
    fn new() -> Self {
        Self {
            gate: RwLock::new(()),
            state: Mutex::new(OutletState { sequence: 0, subscribers: Fanout::new() }),
        }
    }

    /// Held for the whole of a channel push; see [`Aggregator::subscribe`].
    pub(crate) fn enter(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read()
    }

    /// Stamps the event with the next bus-wide sequence number and enqueues it
    /// for every main-stream subscriber. Sequence order is delivery order.
    pub(crate) fn forward(&self, event: &Arc<Event<P>>) -> (u64, usize) {
        let mut state = self.state.lock();
        let sequence = state.sequence;
        state.sequence += 1;
        let reached = state.subscribers.send(event);
        (sequence, reached)
    }
}

/// Merges every channel of the registry into one subscribable stream.
///
/// Channels are admitted while the bus runs; admission only wires the new
/// channel to the shared outlet, so existing subscribers keep their queue
/// and see the new channel's events from its first emission on.
pub(crate) struct Aggregator<P> {
    outlet: Arc<Outlet<P>>,
    sources: RwLock<Vec<Arc<Channel<P>>>>,
}

impl<P: Payload> Aggregator<P> {
    pub(crate) fn new() -> Self {
        Self { outlet: Arc::new(Outlet::new()), sources: RwLock::new(Vec::new()) }
    }

    /// Builds a channel wired to the outlet and registers it as a source.
    ///
    /// Returns only after registration, so any event pushed to the returned
    /// channel reaches current main-stream subscribers.
    pub(crate) fn admit(&self, key: EventType, retention: Option<usize>) -> Arc<Channel<P>> {
        let channel = Arc::new(Channel::new(key, retention, Arc::clone(&self.outlet)));
        let mut sources = self.sources.write();
        sources.push(Arc::clone(&channel));
        trace!(
            event_type = %channel.key(),
            sources = sources.len(),
            "Admitted channel into main stream"
        );
        drop(sources);
        channel
    }

    /// Attaches a main-stream subscriber.
    ///
    /// The retained history of every replay-capable source is replayed first,
    /// in emission order. The gate is held exclusively while snapshotting and
    /// attaching, so no push is half-done: each event lands either in the
    /// replay or in the live queue.
    pub(crate) fn subscribe(&self) -> Subscription<P> {
        let _gate = self.outlet.gate.write();

        let mut replay: Vec<(u64, Arc<Event<P>>)> = Vec::new();
        for source in self.sources.read().iter() {
            source.snapshot_into(Replay::Full, &mut replay);
        }
        replay.sort_unstable_by_key(|(sequence, _)| *sequence);

        let receiver = self.outlet.state.lock().subscribers.attach();
        debug!(replayed = replay.len(), "Main stream subscription created");

        Subscription::new(
            None,
            replay.into_iter().map(|(_, event)| event).collect::<VecDeque<_>>(),
            receiver,
        )
    }
}

impl<P> Aggregator<P> {
    pub(crate) fn source_count(&self) -> usize {
        self.sources.read().len()
    }

    pub(crate) fn event_types(&self) -> Vec<EventType> {
        self.sources.read().iter().map(|source| source.key().clone()).collect()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.outlet.state.lock().subscribers.live()
    }
}

impl<P> fmt::Debug for Aggregator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("sources", &self.source_count())
            .field("outlet", &self.outlet)
            .finish()
    }
}

impl<P> fmt::Debug for Outlet<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.try_lock();
        let sequence = state.as_ref().map(|s| s.sequence);
        let subscribers = state.as_ref().map(|s| s.subscribers.live());
        drop(state);
        f.debug_struct("Outlet")
            .field("sequence", &sequence)
            .field("subscribers", &subscribers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_registers_source_in_order() {
        let aggregator = Aggregator::<u32>::new();
        aggregator.admit("a".into(), None);
        aggregator.admit("b".into(), Some(2));

        assert_eq!(aggregator.source_count(), 2);
        assert_eq!(aggregator.event_types(), vec![EventType::from("a"), EventType::from("b")]);
    }

    #[test]
    fn test_late_source_reaches_existing_subscriber() {
        let aggregator = Aggregator::<u32>::new();
        let a = aggregator.admit("a".into(), None);
        let mut sub = aggregator.subscribe();

        let b = aggregator.admit("b".into(), None);
        a.push(Arc::new(Event::new("a", 1)));
        b.push(Arc::new(Event::new("b", 2)));

        let got: Vec<u32> = sub.drain().iter().map(|e| *e.payload()).collect();
        assert_eq!(got, vec![1, 2]);
    }

    #[test]
    fn test_replay_is_merged_by_emission_order() {
        let aggregator = Aggregator::<u32>::new();
        let a = aggregator.admit("a".into(), Some(4));
        let b = aggregator.admit("b".into(), Some(4));

        a.push(Arc::new(Event::new("a", 1)));
        b.push(Arc::new(Event::new("b", 2)));
        a.push(Arc::new(Event::new("a", 3)));

        let mut sub = aggregator.subscribe();
        let got: Vec<u32> = sub.drain().iter().map(|e| *e.payload()).collect();
        assert_eq!(got, vec![1, 2, 3]);
    }
}
