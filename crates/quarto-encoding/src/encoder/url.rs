/*
 * encoder/url.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Percent-encoding of text into a URL.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub(super) fn component_char(c: char, out: &mut String) {
    let mut buf = [0u8; 4];
    for part in utf8_percent_encode(c.encode_utf8(&mut buf), COMPONENT) {
        out.push_str(part);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreserved_pass_through() {
        let mut out = String::new();
        for c in "aZ9-_.~%&".chars() {
            component_char(c, &mut out);
        }
        assert_eq!(out, "aZ9-_.~%25%26");
    }
}
