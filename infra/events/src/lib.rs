//! # Event Bus
//!
//! An in-process, typed publish/subscribe bus with named channels, bounded
//! per-channel replay history and a merged main stream.
//!
//! ## Overview
//!
//! Producers [`emit`](Bus::emit) events keyed by an [`EventType`]. Consumers
//! either [`select`](Bus::select) one type or take the
//! [`main_stream`](Bus::main_stream), which merges every channel the bus has,
//! including channels created after the subscription was taken.
//!
//! ## Features
//!
//! * **Lazy channels**: created exactly once, on the first `emit` or `select`.
//! * **Replay history**: types listed in [`HistorySettings`] keep their last
//!   `C` events for late subscribers; [`SelectOptions::history_length`]
//!   narrows the replay to the most recent `k`.
//! * **Main stream**: one fan-in of all channels; late subscribers also get
//!   the retained history of every replay-capable channel, in emission order.
//! * **Read-only views**: only [`Bus::emit`] can push.
//! * **Lossless delivery**: `emit` never blocks or awaits; each subscription
//!   owns an unbounded `tokio::sync::mpsc` queue, so a slow consumer never
//!   misses events.
//!
//! # Example
//!
//! ```rust
//! use tidings_event_bus::{Bus, Event, EventBusError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = Bus::builder().retain("orders:created", 8).build()?;
//!
//!     bus.emit(Event::new("orders:created", 41));
//!
//!     let mut all = bus.main_stream().subscribe();
//!     let mut shipped = bus.select("orders:shipped").subscribe();
//!     bus.emit(Event::new("orders:shipped", 42));
//!
//!     assert_eq!(all.recv().await.map(|e| *e.payload()), Some(41));
//!     assert_eq!(all.recv().await.map(|e| *e.payload()), Some(42));
//!     assert_eq!(shipped.recv().await.map(|e| *e.payload()), Some(42));
//!     Ok(())
//! }
//! ```
//!
//! Views have no way to push events:
//!
//! ```compile_fail
//! use tidings_event_bus::{Bus, Event};
//!
//! let bus = Bus::<i32>::new();
//! let view = bus.select("orders:created");
//! view.emit(Event::new("orders:created", 1));
//! ```

mod aggregator;
mod bus;
mod channel;
mod error;
mod event;
mod fanout;
mod global;
mod history;
mod receiver;
mod registry;
mod view;

pub use bus::{Bus, BusBuilder, BusConfig};
pub use error::{EventBusError, EventBusErrorExt};
pub use event::{AnyPayload, Event, EventType, Payload};
pub use global::{default_bus, init_default};
pub use history::{HistorySettings, SelectOptions};
pub use receiver::{EventStream, Subscription};
pub use view::EventView;
