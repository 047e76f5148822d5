use crate::storage::SlotId;

/// Result alias that carries the custom [`LanebeatError`] type.
pub type Result<T> = std::result::Result<T, LanebeatError>;

/// Common error type for the core crate.
///
/// None of these are fatal to a running game: every operation that returns
/// one leaves the in-memory state exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum LanebeatError {
    /// The requested slot holds no recording.
    #[error("slot {0} is empty")]
    SlotEmpty(SlotId),
    /// The slot's storage unit could not be opened, read or written.
    #[error("storage for slot {slot} is unavailable: {source}")]
    StorageUnavailable {
        slot: SlotId,
        #[source]
        source: std::io::Error,
    },
    /// An append was refused because the event store is full.
    #[error("event store is full ({capacity} events)")]
    CapacityExceeded { capacity: usize },
    /// A slot number outside of the configured range.
    #[error("slot {0} does not exist")]
    InvalidSlot(u8),
    /// Configuration or input script could not be parsed.
    #[error("invalid json: {0}")]
    Config(#[from] serde_json::Error),
    /// Settings that would stall or break the game loop.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

impl LanebeatError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn storage(slot: SlotId, source: std::io::Error) -> Self {
        Self::StorageUnavailable { slot, source }
    }
}

impl From<&str> for LanebeatError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for LanebeatError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
