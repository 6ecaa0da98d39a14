/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for producer invocations.

use quarto_encoding::{EncodingError, MediaType};
use thiserror::Error;

use crate::producer::{BodyControl, LifecyclePhase};
use crate::select::OutputMode;

/// Errors raised while running a producer.
///
/// Errors from nested producers propagate through their parents unchanged.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Registry, validation, encoding or sink failure.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A filtered producer changed its type across a buffering boundary
    /// after output had already started streaming.
    #[error(
        "Incompatible buffering mode: cannot change output type from {previous_type} ({previous_mode}) to {new_type} ({new_mode})"
    )]
    IncompatibleBufferingMode {
        previous_type: MediaType,
        previous_mode: OutputMode,
        new_type: MediaType,
        new_mode: OutputMode,
    },

    /// A producer returned a body control that is not valid for the phase.
    #[error("Invalid return from {phase}: {control}")]
    InvalidLifecycleReturn {
        phase: LifecyclePhase,
        control: BodyControl,
    },

    /// Failure reported by a producer's own logic.
    #[error("Producer error: {0}")]
    Producer(String),

    /// Invalid pipeline configuration.
    #[error("Invalid pipeline configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl PipelineError {
    /// Create a Producer error.
    pub fn producer(message: impl Into<String>) -> Self {
        Self::Producer(message.into())
    }

    /// The underlying encoding error, if this is one.
    pub fn as_encoding(&self) -> Option<&EncodingError> {
        match self {
            PipelineError::Encoding(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
