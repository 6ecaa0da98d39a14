/*
 * validator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Streaming validation of characters against a single media type.
//!
//! A [`MediaValidator`] holds the validation state for one stretch of
//! content; [`ValidatingSink`] pairs it with the sink it forwards to. The
//! state is kept apart from the sink so a driver can keep a validator alive
//! across several phases while borrowing the downstream sink only for the
//! duration of each write.
//!
//! Validation is token level only: every type rejects characters that are
//! not valid XML 1.0 characters, and a few types add rules of their own.
//!
//! - `XHTML_ATTRIBUTE`: no raw `<`, `>` or `"`; `&` must begin a well-formed
//!   character or entity reference.
//! - `URL`: no whitespace; `%` must be followed by two hex digits.
//!
//! Rules are checked as characters arrive, so an offending write fails
//! immediately. Constructs left open at the end of content are caught by
//! [`MediaValidator::validate`].

use crate::error::{EncodingError, Result};
use crate::input::{Guarantee, ValidMediaInput};
use crate::media_type::MediaType;
use crate::sink::MediaSink;

/// Whether `c` may appear in an XML 1.0 document.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    /// After `&`.
    ReferenceStart,
    /// Inside `&name`.
    NamedReference,
    /// After `&#`.
    NumericStart,
    /// Inside `&#123`.
    Decimal,
    /// After `&#x`; true once a digit has been seen.
    Hex(bool),
    /// Hex digits still required after `%`.
    Percent(u8),
}

/// Validation state for content of one media type.
#[derive(Debug)]
pub struct MediaValidator {
    media_type: MediaType,
    state: State,
    position: u64,
    /// Trailing whitespace held back for types that trim.
    pending: String,
    validated: bool,
}

impl MediaValidator {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            state: State::Ready,
            position: 0,
            pending: String::new(),
            validated: false,
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Check a chunk of characters without forwarding them anywhere.
    pub fn check(&mut self, s: &str) -> Result<()> {
        for c in s.chars() {
            self.check_char(c)?;
        }
        Ok(())
    }

    fn check_char(&mut self, c: char) -> Result<()> {
        if !is_xml_char(c) {
            return Err(self.error(format!("invalid character U+{:04X}", c as u32)));
        }
        match self.media_type {
            MediaType::XhtmlAttribute => self.check_attribute_char(c)?,
            MediaType::Url => self.check_url_char(c)?,
            _ => {}
        }
        self.position += 1;
        Ok(())
    }

    fn check_attribute_char(&mut self, c: char) -> Result<()> {
        self.state = match (self.state, c) {
            (State::Ready, '<' | '>' | '"') => {
                return Err(self.error(format!("raw '{}' must be escaped", c)));
            }
            (State::Ready, '&') => State::ReferenceStart,
            (State::Ready, _) => State::Ready,
            (State::ReferenceStart, '#') => State::NumericStart,
            (State::ReferenceStart, c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
                State::NamedReference
            }
            (State::ReferenceStart, _) => {
                return Err(self.error("'&' must begin a character or entity reference"));
            }
            (State::NamedReference, ';') => State::Ready,
            (State::NamedReference, c)
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') =>
            {
                State::NamedReference
            }
            (State::NumericStart, 'x' | 'X') => State::Hex(false),
            (State::NumericStart, c) if c.is_ascii_digit() => State::Decimal,
            (State::Decimal, c) if c.is_ascii_digit() => State::Decimal,
            (State::Decimal, ';') => State::Ready,
            (State::Hex(_), c) if c.is_ascii_hexdigit() => State::Hex(true),
            (State::Hex(true), ';') => State::Ready,
            _ => {
                return Err(self.error(format!("invalid character '{}' in reference", c)));
            }
        };
        Ok(())
    }

    fn check_url_char(&mut self, c: char) -> Result<()> {
        self.state = match (self.state, c) {
            (State::Ready, '%') => State::Percent(2),
            (State::Ready, c) if c.is_whitespace() => {
                return Err(self.error("whitespace must be percent-encoded"));
            }
            (State::Ready, _) => State::Ready,
            (State::Percent(remaining), c) if c.is_ascii_hexdigit() => {
                if remaining == 1 {
                    State::Ready
                } else {
                    State::Percent(remaining - 1)
                }
            }
            _ => return Err(self.error("'%' must be followed by two hex digits")),
        };
        Ok(())
    }

    /// Fail if the content seen so far ends inside an open construct.
    pub fn check_complete(&self) -> Result<()> {
        match self.state {
            State::Ready => Ok(()),
            State::Percent(_) => Err(self.error("unterminated percent escape")),
            _ => Err(self.error("unterminated character reference")),
        }
    }

    /// Check `s` and forward it to `out`.
    ///
    /// For types that trim, trailing whitespace is held back until more
    /// content arrives or [`validate`](Self::validate) decides its fate.
    pub fn write_to(&mut self, s: &str, out: &mut dyn MediaSink) -> Result<()> {
        self.check(s)?;
        if !self.media_type.trim_buffer() {
            return out.write_str(s);
        }
        match s.char_indices().rev().find(|(_, c)| !c.is_whitespace()) {
            None => self.pending.push_str(s),
            Some((index, c)) => {
                let end = index + c.len_utf8();
                if !self.pending.is_empty() {
                    out.write_str(&self.pending)?;
                    self.pending.clear();
                }
                out.write_str(&s[..end])?;
                self.pending.push_str(&s[end..]);
            }
        }
        Ok(())
    }

    /// Finish validation at the end of content.
    ///
    /// Must be called exactly once. Held-back trailing whitespace is written
    /// unless `trim` is set.
    pub fn validate(&mut self, trim: bool, out: &mut dyn MediaSink) -> Result<()> {
        debug_assert!(!self.validated, "{} validator finished twice", self.media_type);
        self.validated = true;
        self.check_complete()?;
        if !self.pending.is_empty() {
            if !trim {
                out.write_str(&self.pending)?;
            }
            self.pending.clear();
        }
        Ok(())
    }

    /// Pair this validator with the sink it forwards to.
    pub fn writer<'a>(&'a mut self, inner: &'a mut dyn MediaSink) -> ValidatingSink<'a> {
        ValidatingSink {
            validator: self,
            inner,
        }
    }

    fn error(&self, reason: impl Into<String>) -> EncodingError {
        EncodingError::malformed(self.media_type, self.position, reason)
    }
}

impl ValidMediaInput for MediaValidator {
    fn guaranteed_type(&self) -> MediaType {
        self.media_type
    }
}

/// A sink that validates everything written through it.
pub struct ValidatingSink<'a> {
    validator: &'a mut MediaValidator,
    inner: &'a mut dyn MediaSink,
}

impl ValidatingSink<'_> {
    pub fn media_type(&self) -> MediaType {
        self.validator.media_type
    }
}

impl MediaSink for ValidatingSink<'_> {
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.validator.write_to(s, self.inner)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn valid_media_input(&self) -> Option<Guarantee> {
        Some(Guarantee::Validating(self.validator.media_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn validate_all(media_type: MediaType, chunks: &[&str]) -> Result<String> {
        let mut out = String::new();
        let mut validator = MediaValidator::new(media_type);
        for chunk in chunks {
            validator.write_to(chunk, &mut out)?;
        }
        validator.validate(media_type.trim_buffer(), &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_text_accepts_markup_characters() {
        assert_eq!(validate_all(MediaType::Text, &["a<b>&c"]).unwrap(), "a<b>&c");
    }

    #[test]
    fn test_rejects_invalid_xml_characters() {
        let err = validate_all(MediaType::Text, &["ok", "\u{0}"]).unwrap_err();
        match err {
            EncodingError::MalformedInput {
                media_type,
                position,
                ..
            } => {
                assert_eq!(media_type, MediaType::Text);
                assert_eq!(position, 2);
            }
            other => panic!("Expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_attribute_rejects_raw_markup() {
        assert!(validate_all(MediaType::XhtmlAttribute, &["a<b"]).is_err());
        assert!(validate_all(MediaType::XhtmlAttribute, &["say \"hi\""]).is_err());
        assert!(validate_all(MediaType::XhtmlAttribute, &["a & b"]).is_err());
    }

    #[test]
    fn test_attribute_accepts_references_split_across_writes() {
        let out = validate_all(MediaType::XhtmlAttribute, &["a &am", "p; &#6", "0; &#x3", "E;"]);
        assert_eq!(out.unwrap(), "a &amp; &#60; &#x3E;");
    }

    #[test]
    fn test_attribute_unterminated_reference_fails_at_end() {
        let mut out = String::new();
        let mut validator = MediaValidator::new(MediaType::XhtmlAttribute);
        validator.write_to("fish &amp", &mut out).unwrap();
        let err = validator.validate(false, &mut out).unwrap_err();
        assert!(err.to_string().contains("unterminated character reference"));
    }

    #[test]
    fn test_url_percent_escapes() {
        assert!(validate_all(MediaType::Url, &["/a%2", "0b?x=1&y=2"]).is_ok());
        assert!(validate_all(MediaType::Url, &["/a b"]).is_err());
        assert!(validate_all(MediaType::Url, &["/a%zz"]).is_err());
        assert!(validate_all(MediaType::Url, &["/a%2"]).is_err());
    }

    #[test]
    fn test_trailing_whitespace_trimmed_for_trimming_types() {
        let mut out = String::new();
        let mut validator = MediaValidator::new(MediaType::Css);
        validator.write_to("color: red;  ", &mut out).unwrap();
        validator.write_to("\n", &mut out).unwrap();
        assert_eq!(out, "color: red;");
        validator.write_to(" x", &mut out).unwrap();
        assert_eq!(out, "color: red;  \n x");
        validator.write_to("\n\n", &mut out).unwrap();
        validator.validate(true, &mut out).unwrap();
        assert_eq!(out, "color: red;  \n x");
    }

    #[test]
    fn test_held_whitespace_flushed_without_trim() {
        let mut out = String::new();
        let mut validator = MediaValidator::new(MediaType::JavaScript);
        validator.write_to("x = 1; ", &mut out).unwrap();
        validator.validate(false, &mut out).unwrap();
        assert_eq!(out, "x = 1; ");
    }

    #[test]
    fn test_validating_sink_reports_guarantee() {
        let mut out = String::new();
        let mut validator = MediaValidator::new(MediaType::Xhtml);
        {
            let mut sink = validator.writer(&mut out);
            sink.write_str("<p>hi</p>").unwrap();
            assert_eq!(
                sink.valid_media_input(),
                Some(Guarantee::Validating(MediaType::Xhtml))
            );
        }
        validator.validate(false, &mut out).unwrap();
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn test_validator_capability() {
        let validator = MediaValidator::new(MediaType::Json);
        assert_eq!(validator.guaranteed_type(), MediaType::Json);
        assert!(validator.accepts_without_extra_work(MediaType::LdJson));
        assert!(validator.can_skip_validation(MediaType::JavaScript));
        assert!(!validator.can_skip_validation(MediaType::LdJson));
    }
}
