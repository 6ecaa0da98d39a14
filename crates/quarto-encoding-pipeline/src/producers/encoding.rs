/*
 * producers/encoding.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A filtered producer whose body is of a type chosen at runtime.

use quarto_encoding::{EncoderOptions, MediaEncoder, MediaType};

use crate::error::Result;
use crate::producer::{Discipline, Producer};

/// Streams its body as the given media type, encoded or validated for
/// whatever container it ends up in.
#[derive(Debug, Clone)]
pub struct EncodingProducer {
    media_type: MediaType,
    options: EncoderOptions,
}

impl EncodingProducer {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            options: EncoderOptions::default(),
        }
    }

    /// Parse the type from a registry name (`"CSS"`) or a content type
    /// (`"text/css"`).
    pub fn from_type(type_name: &str) -> Result<Self> {
        Ok(Self::new(MediaType::parse(type_name)?))
    }

    /// Options applied to any encoder selected for this producer.
    pub fn with_options(mut self, options: EncoderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Change the type; takes effect after the next body run.
    pub fn set_media_type(&mut self, media_type: MediaType) {
        self.media_type = media_type;
    }
}

impl Producer for EncodingProducer {
    fn discipline(&self) -> Discipline {
        Discipline::Filtered
    }

    fn content_type(&self) -> MediaType {
        self.media_type
    }

    fn configure_encoder(&mut self, encoder: &mut MediaEncoder) {
        *encoder.options_mut() = self.options;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestScope;
    use crate::driver::run;
    use crate::producer::TextBody;

    #[test]
    fn test_from_type() {
        assert_eq!(
            EncodingProducer::from_type("text/css").unwrap().media_type(),
            MediaType::Css
        );
        assert_eq!(
            EncodingProducer::from_type("URL").unwrap().media_type(),
            MediaType::Url
        );
        assert!(EncodingProducer::from_type("image/png").is_err());
    }

    #[test]
    fn test_options_reach_encoder() {
        let mut producer = EncodingProducer::new(MediaType::Text).with_options(EncoderOptions {
            make_br: true,
            make_nbsp: false,
        });
        let mut scope = RequestScope::new();
        let mut out = String::new();
        let mut body = TextBody::new("a\nb");
        run(&mut producer, Some(&mut body), &mut scope, &mut out).unwrap();
        assert_eq!(out, "a<br />\nb");
    }
}
