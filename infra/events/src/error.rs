use std::borrow::Cow;

/// Errors that can occur during event bus operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    /// A `select` asked for a replay the channel cannot serve: zero events,
    /// more events than retained, or any replay on a channel without history.
    #[error("Invalid history request{}: {message}", format_context(.context))]
    InvalidHistoryRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// History retention and live buffers must hold at least one event.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Every sender feeding the subscription is gone.
    #[error("Subscription closed{}: {message}", format_context(.context))]
    Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The process-wide default bus was initialized twice.
    #[error("Default bus already initialized{}: {message}", format_context(.context))]
    AlreadyInitialized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Attaches context to an [`EventBusError`] carried by a `Result`.
pub trait EventBusErrorExt<T> {
    /// Replaces the context of the contained error, if any.
    ///
    /// # Errors
    /// Returns the original error with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, EventBusError>;
}

impl<T> EventBusErrorExt<T> for Result<T, EventBusError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                EventBusError::InvalidHistoryRequest { context: c, .. }
                | EventBusError::InvalidCapacity { context: c, .. }
                | EventBusError::Closed { context: c, .. }
                | EventBusError::AlreadyInitialized { context: c, .. } => {
                    *c = Some(context.into());
                },
            }
            e
        })
    }
}

#[allow(clippy::ref_option)]
fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
