/*
 * media_type.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The closed registry of media types known to the encoding pipeline.
//!
//! Each [`MediaType`] carries its canonical content type, the kind of
//! translation markup that may be inserted into it, and whether trailing
//! whitespace is trimmed from buffered output. Lookups are pure.

use std::fmt;
use std::str::FromStr;

use crate::error::{EncodingError, Result};

/// How translation markup may be represented inside a media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkupClass {
    /// No markup may be inserted.
    None,
    /// Plain-text markers.
    Plain,
    /// Markup elements that require a lookup table.
    Lookup,
}

/// A data format with its own rules for what "valid" means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Text,
    Xhtml,
    Html,
    XhtmlAttribute,
    JavaScript,
    Json,
    LdJson,
    Css,
    Url,
    Sh,
    MySql,
    PSql,
    TextProperties,
}

impl MediaType {
    /// Every registered media type.
    pub const ALL: [MediaType; 13] = [
        MediaType::Text,
        MediaType::Xhtml,
        MediaType::Html,
        MediaType::XhtmlAttribute,
        MediaType::JavaScript,
        MediaType::Json,
        MediaType::LdJson,
        MediaType::Css,
        MediaType::Url,
        MediaType::Sh,
        MediaType::MySql,
        MediaType::PSql,
        MediaType::TextProperties,
    ];

    /// The short, upper-case registry name.
    pub fn name(self) -> &'static str {
        match self {
            MediaType::Text => "TEXT",
            MediaType::Xhtml => "XHTML",
            MediaType::Html => "HTML",
            MediaType::XhtmlAttribute => "XHTML_ATTRIBUTE",
            MediaType::JavaScript => "JAVASCRIPT",
            MediaType::Json => "JSON",
            MediaType::LdJson => "LD_JSON",
            MediaType::Css => "CSS",
            MediaType::Url => "URL",
            MediaType::Sh => "SH",
            MediaType::MySql => "MYSQL",
            MediaType::PSql => "PSQL",
            MediaType::TextProperties => "TEXT_PROPERTIES",
        }
    }

    /// The canonical content type string.
    pub fn content_type(self) -> &'static str {
        match self {
            MediaType::Text => "text/plain",
            MediaType::Xhtml => "application/xhtml+xml",
            MediaType::Html => "text/html",
            MediaType::XhtmlAttribute => "text/x-xhtml-attribute",
            MediaType::JavaScript => "application/javascript",
            MediaType::Json => "application/json",
            MediaType::LdJson => "application/ld+json",
            MediaType::Css => "text/css",
            MediaType::Url => "text/url",
            MediaType::Sh => "text/x-sh",
            MediaType::MySql => "text/x-mysql",
            MediaType::PSql => "text/x-psql",
            MediaType::TextProperties => "text/x-java-properties",
        }
    }

    /// Additional content types that resolve to this media type.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            MediaType::JavaScript => &[
                "text/javascript",
                "application/x-javascript",
                "text/ecmascript",
                "application/ecmascript",
            ],
            _ => &[],
        }
    }

    pub fn markup_class(self) -> MarkupClass {
        match self {
            MediaType::Xhtml | MediaType::Html => MarkupClass::Lookup,
            MediaType::XhtmlAttribute | MediaType::Json | MediaType::LdJson | MediaType::Url => {
                MarkupClass::None
            }
            MediaType::Text
            | MediaType::JavaScript
            | MediaType::Css
            | MediaType::Sh
            | MediaType::MySql
            | MediaType::PSql
            | MediaType::TextProperties => MarkupClass::Plain,
        }
    }

    /// Whether trailing whitespace is dropped when buffered output of this
    /// type is finalized.
    pub fn trim_buffer(self) -> bool {
        !matches!(
            self,
            MediaType::Text
                | MediaType::Xhtml
                | MediaType::Html
                | MediaType::XhtmlAttribute
                | MediaType::TextProperties
        )
    }

    /// Look up a media type by its registry name (e.g. `"XHTML_ATTRIBUTE"`).
    pub fn by_name(name: &str) -> Option<MediaType> {
        MediaType::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Look up a media type by content type.
    ///
    /// Parameters such as `; charset=UTF-8` are ignored, as are case and
    /// surrounding whitespace.
    pub fn by_content_type(content_type: &str) -> Result<MediaType> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        MediaType::ALL
            .into_iter()
            .find(|t| t.content_type() == essence || t.aliases().contains(&essence.as_str()))
            .ok_or_else(|| EncodingError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            })
    }

    /// Resolve a type given either as a registry name or a content type.
    pub fn parse(value: &str) -> Result<MediaType> {
        let value = value.trim();
        match MediaType::by_name(value) {
            Some(media_type) => Ok(media_type),
            None => MediaType::by_content_type(value),
        }
    }

    /// Whether data already valid for `input` is also valid for `self`,
    /// so it can be written without further validation.
    pub fn accepts(self, input: MediaType) -> bool {
        if self == input {
            return true;
        }
        match self {
            // Every type restricts itself to valid characters, which is all
            // plain text requires.
            MediaType::Text => true,
            MediaType::Xhtml | MediaType::Html => matches!(
                input,
                MediaType::Xhtml | MediaType::Html | MediaType::XhtmlAttribute
            ),
            MediaType::JavaScript => matches!(input, MediaType::Json | MediaType::LdJson),
            MediaType::Json => input == MediaType::LdJson,
            _ => false,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MediaType {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self> {
        MediaType::parse(s)
    }
}
