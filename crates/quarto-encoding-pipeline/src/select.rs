/*
 * select.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Choosing how a producer's output reaches its container.
//!
//! An encoder always wins when one is registered, pass-through is next, and
//! a standalone validator is the fallback.

use std::fmt;

use quarto_encoding::{Guarantee, MediaEncoder, MediaType, MediaValidator, ValidMediaInput};
use tracing::debug;

/// The path chosen for one producer's output.
#[derive(Debug)]
pub enum Selection {
    /// The producer declared it writes nothing.
    NoOutput,
    /// Transcode into the container type.
    Encode(MediaEncoder),
    /// Write straight into the container, whose sink already validates
    /// with the given guarantee.
    PassThrough(Guarantee),
    /// Validate the producer's type before it reaches the container.
    Validate(MediaValidator),
}

impl Selection {
    pub fn mode(&self) -> OutputMode {
        match self {
            Selection::NoOutput => OutputMode::NoOutput,
            Selection::Encode(_) => OutputMode::Encoding,
            Selection::PassThrough(_) => OutputMode::PassThrough,
            Selection::Validate(_) => OutputMode::Validating,
        }
    }
}

/// Decide how output of `producer_type` is written into a container of
/// `container_type`.
///
/// `parent` is the guarantee of the enclosing context, if there is one;
/// an outermost producer has nothing to pass through to.
pub fn select(
    producer_type: Option<MediaType>,
    container_type: MediaType,
    parent: Option<Guarantee>,
) -> Selection {
    let Some(producer_type) = producer_type else {
        debug!(container_type = %container_type, "no output");
        return Selection::NoOutput;
    };
    if let Some(encoder) = MediaEncoder::get_instance(producer_type, container_type) {
        debug!(producer_type = %producer_type, container_type = %container_type, "using encoder");
        return Selection::Encode(encoder);
    }
    if let Some(parent) = parent.filter(|g| g.accepts_without_extra_work(producer_type)) {
        debug!(producer_type = %producer_type, parent = ?parent, "passing through to validating parent");
        return Selection::PassThrough(parent);
    }
    debug!(producer_type = %producer_type, container_type = %container_type, "using validator");
    Selection::Validate(MediaValidator::new(producer_type))
}

/// How output flows for a selection. Encoding and validating modes sit
/// behind a stateful sink, so body output is buffered through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    NoOutput,
    PassThrough,
    Encoding,
    Validating,
}

impl OutputMode {
    pub fn is_buffered(self) -> bool {
        matches!(self, OutputMode::Encoding | OutputMode::Validating)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::NoOutput => "no output",
            OutputMode::PassThrough => "pass-through",
            OutputMode::Encoding => "encoding",
            OutputMode::Validating => "validating",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_preferred() {
        let selection = select(
            Some(MediaType::Text),
            MediaType::Xhtml,
            Some(Guarantee::Validating(MediaType::Xhtml)),
        );
        assert_eq!(selection.mode(), OutputMode::Encoding);
    }

    #[test]
    fn test_pass_through_requires_parent() {
        let parent = Guarantee::Validating(MediaType::Text);
        match select(Some(MediaType::Text), MediaType::Text, Some(parent)) {
            Selection::PassThrough(g) => assert_eq!(g, parent),
            other => panic!("Expected PassThrough, got {:?}", other),
        }
        assert_eq!(
            select(Some(MediaType::Text), MediaType::Text, None).mode(),
            OutputMode::Validating
        );
    }

    #[test]
    fn test_validator_fallback() {
        // No encoder from CSS into JavaScript, and a JavaScript parent
        // does not accept CSS.
        let selection = select(
            Some(MediaType::Css),
            MediaType::JavaScript,
            Some(Guarantee::Validating(MediaType::JavaScript)),
        );
        match selection {
            Selection::Validate(v) => assert_eq!(v.media_type(), MediaType::Css),
            other => panic!("Expected Validate, got {:?}", other),
        }
    }

    #[test]
    fn test_no_output() {
        assert_eq!(
            select(None, MediaType::Xhtml, None).mode(),
            OutputMode::NoOutput
        );
    }

    #[test]
    fn test_discard_parent_passes_everything_through() {
        for media_type in MediaType::ALL {
            assert_eq!(
                select(Some(media_type), MediaType::Text, Some(Guarantee::Discard)).mode(),
                OutputMode::PassThrough
            );
        }
    }

    #[test]
    fn test_buffered_modes() {
        assert!(OutputMode::Encoding.is_buffered());
        assert!(OutputMode::Validating.is_buffered());
        assert!(!OutputMode::PassThrough.is_buffered());
        assert!(!OutputMode::NoOutput.is_buffered());
    }
}
