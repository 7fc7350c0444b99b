//! Process-wide default bus.
//!
//! Nothing is created implicitly: the host constructs a bus and installs it
//! once, typically right after logging is set up and before any component
//! that calls [`default_bus`] starts.

use crate::bus::Bus;
use crate::error::EventBusError;
use crate::event::AnyPayload;
use std::sync::OnceLock;
use tracing::info;

static DEFAULT_BUS: OnceLock<Bus<AnyPayload>> = OnceLock::new();

/// Installs `bus` as the process-wide default.
///
/// # Errors
/// Returns [`EventBusError::AlreadyInitialized`] if a default bus was
/// installed before; the existing bus stays in place.
pub fn init_default(bus: Bus<AnyPayload>) -> Result<&'static Bus<AnyPayload>, EventBusError> {
    let mut installed = false;
    let current = DEFAULT_BUS.get_or_init(|| {
        installed = true;
        bus
    });

    if !installed {
        return Err(EventBusError::AlreadyInitialized {
            message: "init_default called more than once".into(),
            context: None,
        });
    }

    info!(channels = current.channel_count(), "Default event bus installed");
    Ok(current)
}

/// The default bus, if [`init_default`] has run.
#[must_use]
pub fn default_bus() -> Option<&'static Bus<AnyPayload>> {
    DEFAULT_BUS.get()
}
