//! Error types for the light streaming core.

use std::io;

use thiserror::Error;

use crate::host::LightError;
use crate::parser::ParserError;

/// Errors raised by the player, scheduler, encoders and configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// The sequence needs a protocol version the transport cannot play.
    #[error("sequence version {version} is not supported (transport supports up to {supported})")]
    UnsupportedSequenceVersion { version: u16, supported: u16 },

    /// A color was quantized before it was ever set.
    #[error("color is uninitialized")]
    UninitializedColor,

    /// Caller passed something unusable (empty list, oversized count...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Group index outside of what the device reports.
    #[error("group {group} is out of range for a device with {count} groups")]
    InvalidGroup { group: u8, count: u8 },

    /// `update_device` was called after `shutdown`.
    #[error("scheduler has been shut down")]
    SchedulerShutDown,

    /// Error reported by the transport, passed through unchanged.
    #[error(transparent)]
    Light(#[from] LightError),

    /// Payload or envelope could not be decoded.
    #[error("parser error: {0}")]
    Parser(#[from] ParserError),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration parsed but makes no sense.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for light streaming operations
pub type Result<T> = std::result::Result<T, Error>;
