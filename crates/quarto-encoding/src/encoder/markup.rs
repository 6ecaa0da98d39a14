/*
 * encoder/markup.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Escaping into XHTML and HTML element content and attribute values.

use crate::encoder::EncoderOptions;
use crate::media_type::MediaType;

pub(super) const SCRIPT_CDATA_OPEN: &str = "//<![CDATA[\n";
pub(super) const SCRIPT_CDATA_CLOSE: &str = "\n//]]>";
pub(super) const SCRIPT_CLOSE: &str = "</script>";

pub(super) const STYLE_OPEN: &str = "<style type=\"text/css\">";
pub(super) const STYLE_CDATA_OPEN: &str = "/*<![CDATA[*/";
pub(super) const STYLE_CDATA_CLOSE: &str = "/*]]>*/";
pub(super) const STYLE_CLOSE: &str = "</style>";

pub(super) fn script_open(input: MediaType) -> String {
    format!("<script type=\"{}\">", input.content_type())
}

pub(super) fn text_char(c: char, options: EncoderOptions, out: &mut String) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '\n' if options.make_br => out.push_str("<br />\n"),
        ' ' if options.make_nbsp => out.push_str("&#160;"),
        c => out.push(c),
    }
}

/// Attribute values also protect both quote styles and keep whitespace
/// from being normalized by the parser.
pub(super) fn attribute_char(c: char, out: &mut String) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        '\t' => out.push_str("&#9;"),
        '\n' => out.push_str("&#10;"),
        '\r' => out.push_str("&#13;"),
        c => out.push(c),
    }
}

pub(super) fn url_char(c: char, out: &mut String) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        c => out.push(c),
    }
}
