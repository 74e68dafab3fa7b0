//! Unified error type for event decoding and consumer-facing commands.
//!
//! `AppError` is the single error type returned by every command handler and by
//! the wire decoder. It serializes as `{ "kind": "...", "message": "..." }` so a
//! presentation layer can programmatically distinguish error categories.

use serde::ser::SerializeStruct;

/// Application-level error.
///
/// Each variant maps to a distinct failure domain. None of them is fatal: the
/// engine keeps serving after any single failure.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An inbound event whose payload is missing or has a mistyped field.
    #[error("{0}")]
    Payload(String),

    /// An inbound event with a name the engine does not understand.
    #[error("unknown event `{0}`")]
    UnknownEvent(String),

    /// The backend channel is closed or was never opened.
    #[error("{0}")]
    Transport(String),

    /// The backend rejected or failed a command (replay, export, ...).
    #[error("{0}")]
    Command(String),

    /// Local I/O failures (reading a replay file or an event log).
    #[error("{0}")]
    Io(String),

    /// Invalid or missing user input.
    #[error("{0}")]
    InvalidInput(String),
}

impl AppError {
    /// Returns the error kind as a string matching the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Payload(_) => "Payload",
            AppError::UnknownEvent(_) => "UnknownEvent",
            AppError::Transport(_) => "Transport",
            AppError::Command(_) => "Command",
            AppError::Io(_) => "Io",
            AppError::InvalidInput(_) => "InvalidInput",
        }
    }
}

/// Custom Serialize: produces `{ "kind": "Variant", "message": "..." }`.
impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

// ---- From implementations for ergonomic error conversion ----

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Payload(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Command(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}
