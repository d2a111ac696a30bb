use thiserror::Error;

use super::tab::{TabId, WindowId};

// === PlatformError ===

/// Errors returned by browser platform operations.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The tab does not exist (closed, or never existed).
    #[error("Tab not found: {0}")]
    TabNotFound(TabId),
    /// The window does not exist.
    #[error("Window not found: {0}")]
    WindowNotFound(WindowId),
    /// The browser rejected or failed the call.
    #[error("Platform call failed: {0}")]
    CallFailed(String),
    /// The connection to the browser is gone.
    #[error("Platform connection closed")]
    Disconnected,
}

impl PlatformError {
    /// Expected absence, as opposed to a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PlatformError::TabNotFound(_) | PlatformError::WindowNotFound(_)
        )
    }
}

// === StorageError ===

/// Errors related to the persistent key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Storage database error: {0}")]
    DatabaseError(String),
    /// A stored value could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    SerializationError(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

// === TrackerError ===

/// Errors surfaced by tracker and resolver operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// === ProtocolError ===

/// Errors on the native-messaging channel.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Protocol I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Frame length exceeds what the browser allows.
    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),
    /// Frame body is not a message we understand.
    #[error("Malformed message: {0}")]
    Malformed(String),
}

// === SettingsError ===

/// Errors related to host settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// A setting has a value the host cannot use.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
