/*
 * encoder/mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Streaming conversion of one media type into another.
//!
//! A [`MediaEncoder`] is created for an (input, output) pair by
//! [`MediaEncoder::get_instance`]. It frames its output with a prefix and a
//! suffix (for example a `<script>` element) and escapes everything in
//! between so the result is valid in the output type. Input characters are
//! checked against the input type as they are encoded.
//!
//! Like [`MediaValidator`](crate::MediaValidator), the encoder keeps its
//! state apart from the sink it writes to; [`EncodingSink`] pairs the two.

mod markup;
mod script;
mod url;

use tracing::trace;

use crate::error::Result;
use crate::input::{Guarantee, ValidMediaInput};
use crate::media_type::MediaType;
use crate::sink::MediaSink;
use crate::validator::MediaValidator;

/// Options that alter how plain text is rendered into markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Render each newline as `<br />` followed by the newline.
    pub make_br: bool,
    /// Render each space as a non-breaking space.
    pub make_nbsp: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// Text-like input in XHTML or HTML element content.
    TextInMarkup,
    /// Any non-markup input inside an attribute value.
    TextInAttribute,
    /// A URL in element content or an attribute value.
    UrlInMarkup,
    /// Script or JSON framed in a `<script>` element.
    ScriptInMarkup { cdata: bool },
    /// CSS framed in a `<style>` element.
    StyleInMarkup { cdata: bool },
    /// Text or URL rendered as a double-quoted script string literal.
    InScriptString,
    /// Text percent-encoded into a URL.
    TextInUrl,
}

/// Encoder state for one (input, output) pair.
#[derive(Debug)]
pub struct MediaEncoder {
    input_type: MediaType,
    output_type: MediaType,
    kind: Kind,
    options: EncoderOptions,
    input: MediaValidator,
    /// Trailing whitespace held back for input types that trim.
    pending: String,
    /// The last two raw input characters, for sequences that straddle writes.
    history: [char; 2],
}

impl MediaEncoder {
    /// The encoder converting `input` into `output`, if one is registered.
    pub fn get_instance(input: MediaType, output: MediaType) -> Option<MediaEncoder> {
        use MediaType::*;

        let kind = match (input, output) {
            (Text | Sh | MySql | PSql | TextProperties, Xhtml | Html) => Kind::TextInMarkup,
            (Text | Sh | MySql | PSql | TextProperties, XhtmlAttribute) => Kind::TextInAttribute,
            (JavaScript | Json | LdJson | Css, XhtmlAttribute) => Kind::TextInAttribute,
            (Url, Xhtml | Html | XhtmlAttribute) => Kind::UrlInMarkup,
            (JavaScript | Json | LdJson, Xhtml | Html) => Kind::ScriptInMarkup {
                cdata: output == Xhtml && input == JavaScript,
            },
            (Css, Xhtml | Html) => Kind::StyleInMarkup {
                cdata: output == Xhtml,
            },
            (Text | Url, JavaScript | Json | LdJson) => Kind::InScriptString,
            (Text, Url) => Kind::TextInUrl,
            _ => return None,
        };
        Some(MediaEncoder {
            input_type: input,
            output_type: output,
            kind,
            options: EncoderOptions::default(),
            input: MediaValidator::new(input),
            pending: String::new(),
            history: ['\0'; 2],
        })
    }

    pub fn input_type(&self) -> MediaType {
        self.input_type
    }

    pub fn output_type(&self) -> MediaType {
        self.output_type
    }

    pub fn options(&self) -> EncoderOptions {
        self.options
    }

    /// Mutable access to the options, for producers that configure the
    /// encoder before any output is written.
    pub fn options_mut(&mut self) -> &mut EncoderOptions {
        &mut self.options
    }

    /// Write the framing that opens encoded output.
    pub fn write_prefix_to(&mut self, out: &mut dyn MediaSink) -> Result<()> {
        trace!(input = %self.input_type, output = %self.output_type, "encoder prefix");
        match self.kind {
            Kind::ScriptInMarkup { cdata } => {
                out.write_str(&markup::script_open(self.input_type))?;
                if cdata {
                    out.write_str(markup::SCRIPT_CDATA_OPEN)?;
                }
                Ok(())
            }
            Kind::StyleInMarkup { cdata } => {
                out.write_str(markup::STYLE_OPEN)?;
                if cdata {
                    out.write_str(markup::STYLE_CDATA_OPEN)?;
                }
                Ok(())
            }
            Kind::InScriptString => out.write_char('"'),
            Kind::TextInMarkup | Kind::TextInAttribute | Kind::UrlInMarkup | Kind::TextInUrl => {
                Ok(())
            }
        }
    }

    /// Encode a chunk of input characters into `out`.
    pub fn encode(&mut self, s: &str, out: &mut dyn MediaSink) -> Result<()> {
        self.input.check(s)?;
        let trim = self.input_type.trim_buffer();
        let mut encoded = String::with_capacity(s.len() + self.pending.len());
        for c in s.chars() {
            if trim && c.is_whitespace() {
                self.pending.push(c);
                continue;
            }
            if !self.pending.is_empty() {
                let pending = std::mem::take(&mut self.pending);
                for w in pending.chars() {
                    self.encode_char(w, &mut encoded);
                }
            }
            self.encode_char(c, &mut encoded);
        }
        if encoded.is_empty() {
            return Ok(());
        }
        out.write_str(&encoded)
    }

    /// Write the framing that closes encoded output.
    ///
    /// Held-back trailing whitespace is encoded first unless `trim` is set.
    /// Fails if the input ended inside an open construct.
    pub fn write_suffix_to(&mut self, out: &mut dyn MediaSink, trim: bool) -> Result<()> {
        self.input.check_complete()?;
        let pending = std::mem::take(&mut self.pending);
        if !trim && !pending.is_empty() {
            let mut encoded = String::with_capacity(pending.len());
            for c in pending.chars() {
                self.encode_char(c, &mut encoded);
            }
            out.write_str(&encoded)?;
        }
        trace!(input = %self.input_type, output = %self.output_type, trim, "encoder suffix");
        match self.kind {
            Kind::ScriptInMarkup { cdata } => {
                if cdata {
                    out.write_str(markup::SCRIPT_CDATA_CLOSE)?;
                }
                out.write_str(markup::SCRIPT_CLOSE)
            }
            Kind::StyleInMarkup { cdata } => {
                if cdata {
                    out.write_str(markup::STYLE_CDATA_CLOSE)?;
                }
                out.write_str(markup::STYLE_CLOSE)
            }
            Kind::InScriptString => out.write_char('"'),
            Kind::TextInMarkup | Kind::TextInAttribute | Kind::UrlInMarkup | Kind::TextInUrl => {
                Ok(())
            }
        }
    }

    /// Pair this encoder with the sink it writes to.
    pub fn writer<'a>(&'a mut self, inner: &'a mut dyn MediaSink) -> EncodingSink<'a> {
        EncodingSink {
            encoder: self,
            inner,
        }
    }

    fn encode_char(&mut self, c: char, out: &mut String) {
        match self.kind {
            Kind::TextInMarkup => markup::text_char(c, self.options, out),
            Kind::TextInAttribute => markup::attribute_char(c, out),
            Kind::UrlInMarkup => markup::url_char(c, out),
            Kind::ScriptInMarkup { .. } => {
                let escape_markup = matches!(self.input_type, MediaType::Json | MediaType::LdJson);
                script::framed_char(c, self.history, escape_markup, out)
            }
            Kind::StyleInMarkup { .. } => script::framed_char(c, self.history, false, out),
            Kind::InScriptString => script::string_char(c, out),
            Kind::TextInUrl => url::component_char(c, out),
        }
        self.history = [self.history[1], c];
    }
}

impl ValidMediaInput for MediaEncoder {
    fn guaranteed_type(&self) -> MediaType {
        self.input_type
    }
}

/// A sink that encodes everything written through it.
pub struct EncodingSink<'a> {
    encoder: &'a mut MediaEncoder,
    inner: &'a mut dyn MediaSink,
}

impl MediaSink for EncodingSink<'_> {
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.encoder.encode(s, self.inner)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn valid_media_input(&self) -> Option<Guarantee> {
        Some(Guarantee::Validating(self.encoder.input_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode_all(input: MediaType, output: MediaType, chunks: &[&str]) -> String {
        let mut encoder = MediaEncoder::get_instance(input, output).unwrap();
        let mut out = String::new();
        encoder.write_prefix_to(&mut out).unwrap();
        for chunk in chunks {
            encoder.encode(chunk, &mut out).unwrap();
        }
        encoder.write_suffix_to(&mut out, input.trim_buffer()).unwrap();
        out
    }

    #[test]
    fn test_registry_pairs() {
        assert!(MediaEncoder::get_instance(MediaType::Text, MediaType::Xhtml).is_some());
        assert!(MediaEncoder::get_instance(MediaType::Css, MediaType::Html).is_some());
        assert!(MediaEncoder::get_instance(MediaType::Text, MediaType::Url).is_some());
        assert!(MediaEncoder::get_instance(MediaType::Xhtml, MediaType::Text).is_none());
        assert!(MediaEncoder::get_instance(MediaType::Xhtml, MediaType::Xhtml).is_none());
        assert!(MediaEncoder::get_instance(MediaType::Css, MediaType::JavaScript).is_none());
    }

    #[test]
    fn test_text_in_xhtml() {
        assert_eq!(
            encode_all(MediaType::Text, MediaType::Xhtml, &["a<b>", " & c"]),
            "a&lt;b&gt; &amp; c"
        );
    }

    #[test]
    fn test_text_in_xhtml_options() {
        let mut encoder = MediaEncoder::get_instance(MediaType::Text, MediaType::Xhtml).unwrap();
        encoder.options_mut().make_br = true;
        encoder.options_mut().make_nbsp = true;
        let mut out = String::new();
        encoder.encode("a b\nc", &mut out).unwrap();
        encoder.write_suffix_to(&mut out, false).unwrap();
        assert_eq!(out, "a&#160;b<br />\nc");
    }

    #[test]
    fn test_text_in_attribute() {
        assert_eq!(
            encode_all(MediaType::Text, MediaType::XhtmlAttribute, &["say \"hi\"\t'x'\n"]),
            "say &quot;hi&quot;&#9;&#39;x&#39;&#10;"
        );
    }

    #[test]
    fn test_script_in_xhtml_uses_cdata() {
        assert_eq!(
            encode_all(MediaType::JavaScript, MediaType::Xhtml, &["if (a<", "/b) x(\"]]", ">\");  \n"]),
            "<script type=\"application/javascript\">//<![CDATA[\n\
             if (a<\\/b) x(\"]]\\>\");\n//]]></script>"
        );
    }

    #[test]
    fn test_script_in_html() {
        assert_eq!(
            encode_all(MediaType::JavaScript, MediaType::Html, &["x = '</script>';"]),
            "<script type=\"application/javascript\">x = '<\\/script>';</script>"
        );
    }

    #[test]
    fn test_json_in_xhtml_escapes_markup_characters() {
        assert_eq!(
            encode_all(MediaType::LdJson, MediaType::Xhtml, &["{\"a\":\"<b>&\"}"]),
            "<script type=\"application/ld+json\">{\"a\":\"\\u003cb\\u003e\\u0026\"}</script>"
        );
    }

    #[test]
    fn test_style_in_xhtml() {
        assert_eq!(
            encode_all(MediaType::Css, MediaType::Xhtml, &["p { color: red; }\n"]),
            "<style type=\"text/css\">/*<![CDATA[*/p { color: red; }/*]]>*/</style>"
        );
    }

    #[test]
    fn test_text_in_javascript_string() {
        assert_eq!(
            encode_all(MediaType::Text, MediaType::JavaScript, &["He said \"</script>\"\n"]),
            "\"He said \\\"\\u003c/script\\u003e\\\"\\n\""
        );
    }

    #[test]
    fn test_text_in_url() {
        assert_eq!(
            encode_all(MediaType::Text, MediaType::Url, &["a b/ü"]),
            "a%20b%2F%C3%BC"
        );
    }

    #[test]
    fn test_url_in_attribute() {
        assert_eq!(
            encode_all(MediaType::Url, MediaType::XhtmlAttribute, &["/a?x=1&y=\"2\""]),
            "/a?x=1&amp;y=&quot;2&quot;"
        );
    }

    #[test]
    fn test_encoder_validates_input() {
        let mut encoder = MediaEncoder::get_instance(MediaType::Url, MediaType::Xhtml).unwrap();
        let mut out = String::new();
        assert!(encoder.encode("/a b", &mut out).is_err());
        assert_eq!(out, "");

        let mut encoder = MediaEncoder::get_instance(MediaType::Url, MediaType::Xhtml).unwrap();
        encoder.encode("/a%4", &mut out).unwrap();
        assert!(encoder.write_suffix_to(&mut out, true).is_err());
    }

    #[test]
    fn test_trailing_whitespace_kept_without_trim() {
        let mut encoder = MediaEncoder::get_instance(MediaType::Css, MediaType::Html).unwrap();
        let mut out = String::new();
        encoder.write_prefix_to(&mut out).unwrap();
        encoder.encode("a{}  ", &mut out).unwrap();
        encoder.write_suffix_to(&mut out, false).unwrap();
        assert_eq!(out, "<style type=\"text/css\">a{}  </style>");
    }

    #[test]
    fn test_encoding_sink_reports_input_guarantee() {
        let mut encoder = MediaEncoder::get_instance(MediaType::Text, MediaType::Html).unwrap();
        let mut out = String::new();
        let mut sink = encoder.writer(&mut out);
        sink.write_str("<").unwrap();
        assert_eq!(
            sink.valid_media_input(),
            Some(Guarantee::Validating(MediaType::Text))
        );
        assert_eq!(out, "&lt;");
    }
}
