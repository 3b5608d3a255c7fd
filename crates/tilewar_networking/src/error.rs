//! # Networking Error Types
//!
//! Every error here is fatal to the one message being processed and to
//! nothing else. The session logs it, surfaces it to the UI and keeps ticking.

use thiserror::Error;

use crate::protocol::MessageType;

/// Errors raised while encoding, decoding or applying a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Type code outside the known range.
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),

    /// The frame ended before a field could be read.
    #[error("message truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the field needs.
        needed: usize,
        /// Bytes left in the frame.
        remaining: usize,
    },

    /// A length field does not match what the layout requires.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Declared length.
        actual: usize,
    },

    /// A string does not fit its wire field.
    #[error("{field} too long: max {max} bytes, got {actual}")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum byte length.
        max: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// Tried to encode a server-to-client message.
    #[error("message type {0:?} is not sendable")]
    NotSendable(MessageType),

    /// Received a client-to-server message.
    #[error("message type {0:?} is not receivable")]
    NotReceivable(MessageType),

    /// System message subtype outside the closed set.
    #[error("unknown system message subtype: {0}")]
    UnknownSystemSubtype(u8),

    /// A string field is not valid UTF-8.
    #[error("{field} is not valid utf-8")]
    InvalidUtf8 {
        /// Field name.
        field: &'static str,
    },

    /// Tile byte outside the tile set.
    #[error("invalid tile code: {0}")]
    InvalidTile(u8),

    /// Phase byte outside the phase set.
    #[error("unknown game phase: {0}")]
    UnknownPhase(u8),

    /// Map header with a negative or oversized dimension.
    #[error("invalid map size: {width}x{height}")]
    InvalidMapSize {
        /// Declared width.
        width: i32,
        /// Declared height.
        height: i32,
    },

    /// Weapon kind id without an implementation.
    #[error("unknown weapon kind: {0}")]
    UnknownWeaponKind(u8),

    /// Weapon message addressed to a different weapon kind than the player carries.
    #[error("weapon kind mismatch: player carries {expected}, message is for {actual}")]
    WeaponKindMismatch {
        /// Kind of the cached weapon.
        expected: u8,
        /// Kind in the message.
        actual: u8,
    },

    /// Weapon message for a player missing from the roster.
    #[error("player not found: {0}")]
    PlayerNotFound(i16),

    /// Weapon message before any snapshot arrived.
    #[error("no snapshot received yet")]
    NoSnapshot,
}

impl ProtocolError {
    /// Builds a [`ProtocolError::Truncated`].
    #[inline]
    #[must_use]
    pub const fn truncated(needed: usize, remaining: usize) -> Self {
        Self::Truncated { needed, remaining }
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while loading a client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`crate::ClientConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
