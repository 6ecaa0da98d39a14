/*
 * input.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The capability a validating sink exposes about its own input.

use crate::media_type::MediaType;

/// What a sink guarantees about the characters written into it.
///
/// The two predicates point in opposite directions and are kept separate:
///
/// - [`accepts_without_extra_work`](ValidMediaInput::accepts_without_extra_work)
///   asks whether data that is already valid for `candidate` may be written
///   here as-is, because this sink's own checks will pass it.
/// - [`can_skip_validation`](ValidMediaInput::can_skip_validation) asks
///   whether this sink already enforces every rule `candidate` would, so a
///   fresh validator for `candidate` would be redundant.
pub trait ValidMediaInput {
    /// The media type this sink validates its input against.
    fn guaranteed_type(&self) -> MediaType;

    fn accepts_without_extra_work(&self, candidate: MediaType) -> bool {
        self.guaranteed_type().accepts(candidate)
    }

    fn can_skip_validation(&self, candidate: MediaType) -> bool {
        candidate.accepts(self.guaranteed_type())
    }
}

/// A copyable snapshot of a sink's [`ValidMediaInput`] capability.
///
/// Request contexts store this rather than a reference to the sink itself,
/// so the sink can stay borrowed by whoever is writing to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guarantee {
    /// Input is validated against the given type.
    Validating(MediaType),
    /// Input is discarded; behaves like a plain text validator so nested
    /// producers are never constrained.
    Discard,
}

impl ValidMediaInput for Guarantee {
    fn guaranteed_type(&self) -> MediaType {
        match self {
            Guarantee::Validating(media_type) => *media_type,
            Guarantee::Discard => MediaType::Text,
        }
    }

    fn can_skip_validation(&self, candidate: MediaType) -> bool {
        match self {
            Guarantee::Validating(media_type) => candidate.accepts(*media_type),
            Guarantee::Discard => MediaType::Text.accepts(candidate),
        }
    }
}
