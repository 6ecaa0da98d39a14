/*
 * producer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The producer lifecycle surface.
//!
//! A [`Producer`] is a unit of logic that emits output of a declared media
//! type, optionally around a host-supplied [`Body`]. The driver in
//! [`crate::driver`] calls the hooks below in a fixed order determined by
//! the producer's [`Discipline`]:
//!
//! | hook | Filtered | Buffered | Discarding |
//! |---|---|---|---|
//! | `write_prefix` | yes | when output type is set | when output type is set |
//! | `configure_encoder` | per encoder | per encoder | per encoder |
//! | `start` | yes | yes | yes |
//! | body | streamed | captured | dropped |
//! | `after_body` | after each body run | after each body run | after each body run |
//! | `end` | yes | yes | yes |
//! | `write_suffix` | yes | when output type is set | when output type is set |

use std::fmt;

use quarto_encoding::{BufferResult, MediaEncoder, MediaSink, MediaType};

use crate::config::PipelineConfig;
use crate::context::EncodingHost;
use crate::error::Result;

/// How a producer's body output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discipline {
    /// Body output streams through the producer's sink as it is written.
    /// The type must be known before the body runs.
    Filtered,
    /// Body output is captured and validated against the content type;
    /// the output type is resolved only after the body has run.
    Buffered,
    /// Body output is dropped; only the producer's own output is written.
    Discarding,
}

/// What to do with the body after `start` or `after_body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyControl {
    Skip,
    Eval,
    EvalAgain,
}

impl fmt::Display for BodyControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BodyControl::Skip => "skip",
            BodyControl::Eval => "eval",
            BodyControl::EvalAgain => "eval again",
        })
    }
}

/// What the caller should do after a producer finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndControl {
    Continue,
    SkipRest,
}

/// Lifecycle steps that return a [`BodyControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Start,
    AfterBody,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecyclePhase::Start => "start",
            LifecyclePhase::AfterBody => "after body",
        })
    }
}

/// A unit of logic that emits output of a declared media type.
///
/// Every hook has a default except [`discipline`](Producer::discipline)
/// and [`content_type`](Producer::content_type).
pub trait Producer {
    fn discipline(&self) -> Discipline;

    /// For filtered producers, the type of everything written, body
    /// included; it is re-read after each body run and may change.
    /// For buffered producers, the type body output is validated against
    /// while it is captured.
    fn content_type(&self) -> MediaType;

    /// The type of the producer's own output once the body has run.
    /// `None` declares that nothing is written. Not consulted for
    /// filtered producers.
    fn output_type(&self) -> Option<MediaType> {
        Some(self.content_type())
    }

    /// Written into the container before anything else.
    fn write_prefix(&mut self, _container_type: MediaType, _out: &mut dyn MediaSink) -> Result<()> {
        Ok(())
    }

    /// Adjust a freshly selected encoder before its prefix is written.
    fn configure_encoder(&mut self, _encoder: &mut MediaEncoder) {}

    /// Must return [`BodyControl::Skip`] or [`BodyControl::Eval`].
    fn start(&mut self, _out: &mut dyn MediaSink) -> Result<BodyControl> {
        Ok(BodyControl::Eval)
    }

    /// Called after each body run with the captured body (empty unless
    /// buffered). Must return [`BodyControl::Skip`] or
    /// [`BodyControl::EvalAgain`].
    fn after_body(
        &mut self,
        _captured: &BufferResult,
        _out: &mut dyn MediaSink,
    ) -> Result<BodyControl> {
        Ok(BodyControl::Skip)
    }

    /// Write the producer's own output. The default replays the captured
    /// body, which is empty unless the producer is buffered.
    fn end(&mut self, captured: &BufferResult, out: &mut dyn MediaSink) -> Result<EndControl> {
        captured.write_to(out)?;
        Ok(EndControl::Continue)
    }

    /// Written into the container after everything else.
    fn write_suffix(&mut self, _container_type: MediaType, _out: &mut dyn MediaSink) -> Result<()> {
        Ok(())
    }

    /// Spill threshold for capture buffers.
    fn temp_file_threshold(&self, config: &PipelineConfig) -> Option<u64> {
        config.temp_file_threshold
    }
}

/// A host-supplied body fragment. May be invoked any number of times.
pub trait Body {
    fn invoke(&mut self, out: &mut dyn MediaSink, host: &mut dyn EncodingHost) -> Result<()>;

    /// Whether the body writes straight into the producer's sink. Bodies
    /// that return `false` are collected first when the sink encodes or
    /// validates, so a malformed write only fails once the body returns.
    /// Never changes the bytes produced.
    fn try_bypass_buffering(&self) -> bool {
        true
    }
}

impl<F> Body for F
where
    F: FnMut(&mut dyn MediaSink, &mut dyn EncodingHost) -> Result<()>,
{
    fn invoke(&mut self, out: &mut dyn MediaSink, host: &mut dyn EncodingHost) -> Result<()> {
        self(out, host)
    }
}

/// Wraps a body whose output is collected in full before any of it
/// reaches an encoding or validating sink.
#[derive(Debug, Clone)]
pub struct CollectedBody<B>(pub B);

impl<B: Body> Body for CollectedBody<B> {
    fn invoke(&mut self, out: &mut dyn MediaSink, host: &mut dyn EncodingHost) -> Result<()> {
        self.0.invoke(out, host)
    }

    fn try_bypass_buffering(&self) -> bool {
        false
    }
}

/// A body that writes a fixed string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBody(pub String);

impl TextBody {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Body for TextBody {
    fn invoke(&mut self, out: &mut dyn MediaSink, _host: &mut dyn EncodingHost) -> Result<()> {
        out.write_str(&self.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestScope;

    #[test]
    fn test_closure_body() {
        let mut calls = 0;
        let mut body = |out: &mut dyn MediaSink, _host: &mut dyn EncodingHost| -> Result<()> {
            calls += 1;
            out.write_str("x")?;
            Ok(())
        };
        let mut scope = RequestScope::new();
        let mut out = String::new();
        body.invoke(&mut out, &mut scope).unwrap();
        body.invoke(&mut out, &mut scope).unwrap();
        assert!(body.try_bypass_buffering());
        assert_eq!(out, "xx");
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_collected_body_opts_out_of_streaming() {
        let body = CollectedBody(TextBody::new("hi"));
        assert!(!body.try_bypass_buffering());
        let mut body = TextBody::new("hi");
        let mut out = String::new();
        body.invoke(&mut out, &mut RequestScope::new()).unwrap();
        assert_eq!(out, "hi");
    }

    struct Minimal;

    impl Producer for Minimal {
        fn discipline(&self) -> Discipline {
            Discipline::Buffered
        }

        fn content_type(&self) -> MediaType {
            MediaType::Css
        }
    }

    #[test]
    fn test_default_hooks() {
        let mut producer = Minimal;
        assert_eq!(producer.output_type(), Some(MediaType::Css));
        let mut out = String::new();
        assert_eq!(producer.start(&mut out).unwrap(), BodyControl::Eval);
        assert_eq!(
            producer
                .after_body(&BufferResult::empty(), &mut out)
                .unwrap(),
            BodyControl::Skip
        );
        assert_eq!(
            producer.temp_file_threshold(&PipelineConfig::default()),
            PipelineConfig::default().temp_file_threshold
        );
    }
}
