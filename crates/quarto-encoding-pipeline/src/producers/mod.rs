/*
 * producers/mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Built-in producers.

mod capture;
mod encoding;
mod out;
mod style;

pub use capture::CaptureProducer;
pub use encoding::EncodingProducer;
pub use out::OutProducer;
pub use style::StyleProducer;
