/*
 * encoder/script.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Escaping for script and style bodies and for script string literals.

/// Escape one character of a script or style body framed in markup.
///
/// `history` holds the two raw characters preceding `c`. `</` becomes
/// `<\/` so the body cannot close its element, and `]]>` becomes `]]\>` so
/// it cannot close a CDATA section. With `escape_markup`, `<`, `>` and `&`
/// are written as unicode escapes, which is only correct for input that
/// cannot contain them outside string literals (JSON).
pub(super) fn framed_char(c: char, history: [char; 2], escape_markup: bool, out: &mut String) {
    match c {
        '<' if escape_markup => out.push_str("\\u003c"),
        '>' if escape_markup => out.push_str("\\u003e"),
        '&' if escape_markup => out.push_str("\\u0026"),
        '/' if history[1] == '<' => out.push_str("\\/"),
        '>' if history == [']', ']'] => out.push_str("\\>"),
        c => out.push(c),
    }
}

/// Escape one character inside a double-quoted script string literal.
pub(super) fn string_char(c: char, out: &mut String) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '<' => out.push_str("\\u003c"),
        '>' => out.push_str("\\u003e"),
        '&' => out.push_str("\\u0026"),
        '\u{2028}' => out.push_str("\\u2028"),
        '\u{2029}' => out.push_str("\\u2029"),
        c => out.push(c),
    }
}
