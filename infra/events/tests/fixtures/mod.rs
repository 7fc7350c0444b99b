#![allow(dead_code)]

use std::sync::Arc;
use tidings_event_bus::{Bus, Event, HistorySettings};
use tracing_subscriber::EnvFilter;

pub const ADD: &str = "trading_signals:add";
pub const REMOVE: &str = "trading_signals:remove";
pub const GENERIC: &str = "event";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal(pub u32);

/// Routes library logs to the test harness; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Initializes a bus with the given history, panicking on invalid settings.
/// # Panics
/// * If the history settings contain a zero capacity.
#[must_use]
pub fn bus_with_history(history: &[(&'static str, usize)]) -> Bus<Signal> {
    init_tracing();
    Bus::with_history(history.iter().copied().collect::<HistorySettings>())
        .expect("Bus setup failed")
}

#[must_use]
pub fn signal(event_type: &'static str, value: u32) -> Event<Signal> {
    Event::new(event_type, Signal(value))
}

#[must_use]
pub fn values(events: &[Arc<Event<Signal>>]) -> Vec<u32> {
    events.iter().map(|event| event.payload().0).collect()
}
