use crate::event::Event;
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) type EventReceiver<P> = mpsc::UnboundedReceiver<Arc<Event<P>>>;

/// The attached subscribers of one channel or of the main stream, each with
/// its own unbounded queue.
///
/// A subscriber receives every event sent after it attached, however far
/// behind it is. Senders whose receiver was dropped are pruned on the next
/// send or attach.
pub(crate) struct Fanout<P> {
    senders: Vec<mpsc::UnboundedSender<Arc<Event<P>>>>,
}

impl<P> Fanout<P> {
    pub(crate) const fn new() -> Self {
        Self { senders: Vec::new() }
    }

    pub(crate) fn attach(&mut self) -> EventReceiver<P> {
        self.senders.retain(|sender| !sender.is_closed());
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders.push(sender);
        receiver
    }

    /// Enqueues `event` for every attached subscriber and returns how many it
    /// reached.
    pub(crate) fn send(&mut self, event: &Arc<Event<P>>) -> usize {
        self.senders.retain(|sender| sender.send(Arc::clone(event)).is_ok());
        self.senders.len()
    }

    pub(crate) fn live(&self) -> usize {
        self.senders.iter().filter(|sender| !sender.is_closed()).count()
    }
}
