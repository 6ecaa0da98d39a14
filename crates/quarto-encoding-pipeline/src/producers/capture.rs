/*
 * producers/capture.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A buffered producer that keeps its body for later use.

use quarto_encoding::{BufferResult, MediaSink, MediaType};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::producer::{Discipline, EndControl, Producer};

/// Captures its body, validated as `content_type`.
///
/// By default nothing is written and the body is only kept, available from
/// [`captured`](CaptureProducer::captured) once the producer has run. With
/// [`replay_as`](CaptureProducer::replay_as) the body is also written out as
/// the given type.
#[derive(Debug, Clone)]
pub struct CaptureProducer {
    content_type: MediaType,
    replay: Option<MediaType>,
    threshold: Option<Option<u64>>,
    captured: BufferResult,
}

impl CaptureProducer {
    pub fn new(content_type: MediaType) -> Self {
        Self {
            content_type,
            replay: None,
            threshold: None,
            captured: BufferResult::empty(),
        }
    }

    pub fn replay_as(mut self, output_type: MediaType) -> Self {
        self.replay = Some(output_type);
        self
    }

    /// Override the configured spill threshold for this producer.
    pub fn with_temp_file_threshold(mut self, threshold: Option<u64>) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// The body captured by the last run.
    pub fn captured(&self) -> &BufferResult {
        &self.captured
    }

    pub fn into_captured(self) -> BufferResult {
        self.captured
    }
}

impl Producer for CaptureProducer {
    fn discipline(&self) -> Discipline {
        Discipline::Buffered
    }

    fn content_type(&self) -> MediaType {
        self.content_type
    }

    fn output_type(&self) -> Option<MediaType> {
        self.replay
    }

    fn end(&mut self, captured: &BufferResult, out: &mut dyn MediaSink) -> Result<EndControl> {
        self.captured = captured.clone();
        if self.replay.is_some() {
            captured.write_to(out)?;
        }
        Ok(EndControl::Continue)
    }

    fn temp_file_threshold(&self, config: &PipelineConfig) -> Option<u64> {
        self.threshold.unwrap_or(config.temp_file_threshold)
    }
}
