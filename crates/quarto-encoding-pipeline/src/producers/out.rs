/*
 * producers/out.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A discarding producer that writes a single value.

use quarto_encoding::{BufferResult, MediaSink, MediaType};

use crate::error::Result;
use crate::producer::{Discipline, EndControl, Producer};

/// Writes `value`, or `default` when there is no value, as the configured
/// media type (plain text unless set). Any body is run for its side
/// effects only.
#[derive(Debug, Clone)]
pub struct OutProducer {
    value: Option<String>,
    default: Option<String>,
    media_type: MediaType,
}

impl OutProducer {
    pub fn new(value: Option<String>) -> Self {
        Self {
            value,
            default: None,
            media_type: MediaType::Text,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Set the type from a registry name or content type.
    pub fn with_type(self, type_name: &str) -> Result<Self> {
        Ok(self.with_media_type(MediaType::parse(type_name)?))
    }

    /// The value that will be written.
    pub fn effective_value(&self) -> Option<&str> {
        self.value.as_deref().or(self.default.as_deref())
    }
}

impl Producer for OutProducer {
    fn discipline(&self) -> Discipline {
        Discipline::Discarding
    }

    fn content_type(&self) -> MediaType {
        self.media_type
    }

    fn end(&mut self, _captured: &BufferResult, out: &mut dyn MediaSink) -> Result<EndControl> {
        if let Some(value) = self.effective_value() {
            out.write_str(value)?;
        }
        Ok(EndControl::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestScope;
    use crate::driver::run;
    use pretty_assertions::assert_eq;

    fn render(producer: &mut OutProducer, content_type: &str) -> Result<String> {
        let mut scope = RequestScope::new().with_response_content_type(content_type);
        let mut out = String::new();
        run(producer, None, &mut scope, &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_value_escaped_for_container() {
        let mut producer = OutProducer::new(Some("Tom & \"Jerry\"".to_string()));
        assert_eq!(
            render(&mut producer, "text/html").unwrap(),
            "Tom &amp; \"Jerry\""
        );
        assert_eq!(
            render(&mut producer, "application/json").unwrap(),
            "\"Tom \\u0026 \\\"Jerry\\\"\""
        );
    }

    #[test]
    fn test_default_when_value_missing() {
        let mut producer = OutProducer::new(None).with_default("n/a");
        assert_eq!(render(&mut producer, "text/plain").unwrap(), "n/a");
        let mut producer = OutProducer::new(None);
        assert_eq!(render(&mut producer, "text/plain").unwrap(), "");
    }

    #[test]
    fn test_typed_value_is_validated() {
        let mut producer = OutProducer::new(Some("/a b".to_string()))
            .with_type("text/url")
            .unwrap();
        assert!(render(&mut producer, "text/html").is_err());

        let mut producer = OutProducer::new(Some("/a?b=1&c=2".to_string()))
            .with_type("URL")
            .unwrap();
        assert_eq!(
            render(&mut producer, "text/html").unwrap(),
            "/a?b=1&amp;c=2"
        );
    }
}
