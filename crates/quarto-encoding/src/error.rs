/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for media type lookup, validation and encoding.

use thiserror::Error;

use crate::media_type::MediaType;

/// Errors raised by the registry, validators, encoders and sinks.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// A content-type string does not map to a known [`MediaType`].
    #[error("Unsupported media type: {content_type}")]
    UnsupportedMediaType { content_type: String },

    /// Characters written do not conform to the declared media type.
    ///
    /// `position` is the zero-based character offset within the content
    /// seen by the validator or encoder that rejected it.
    #[error("Malformed {media_type} input at character {position}: {reason}")]
    MalformedInput {
        media_type: MediaType,
        position: u64,
        reason: String,
    },

    /// A write occurred on a sink that permits no output at all.
    #[error("Unexpected output: no output is allowed here")]
    UnexpectedOutput,

    /// I/O error from a host sink or a spilled capture buffer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodingError {
    /// Create a MalformedInput error.
    pub fn malformed(media_type: MediaType, position: u64, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            media_type,
            position,
            reason: reason.into(),
        }
    }
}

/// Result type for encoding operations.
pub type Result<T> = std::result::Result<T, EncodingError>;
