/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Media types, streaming validators and encoders for context-aware output.
//!
//! This crate holds the pieces of the encoding pipeline that know nothing
//! about request contexts or producers:
//!
//! - [`MediaType`]: the closed registry of formats and their relationships
//! - [`MediaValidator`]: token-level validation of a stream of characters
//! - [`MediaEncoder`]: escaping and framing of one type inside another
//! - [`MediaSink`]: where characters go, plus a few ready-made sinks
//! - [`BufferWriter`] / [`BufferResult`]: capture buffers
//!
//! # Example
//!
//! ```
//! use quarto_encoding::{MediaEncoder, MediaType};
//!
//! let mut encoder = MediaEncoder::get_instance(MediaType::Text, MediaType::Xhtml).unwrap();
//! let mut out = String::new();
//! encoder.write_prefix_to(&mut out).unwrap();
//! encoder.encode("a<b>", &mut out).unwrap();
//! encoder.write_suffix_to(&mut out, false).unwrap();
//! assert_eq!(out, "a&lt;b&gt;");
//! ```

pub mod buffer;
pub mod encoder;
pub mod error;
pub mod input;
pub mod media_type;
pub mod sink;
pub mod validator;

pub use buffer::{BufferResult, BufferWriter};
pub use encoder::{EncoderOptions, EncodingSink, MediaEncoder};
pub use error::{EncodingError, Result};
pub use input::{Guarantee, ValidMediaInput};
pub use media_type::{MarkupClass, MediaType};
pub use sink::{FailOnWrite, IoSink, MediaSink, NullSink};
pub use validator::{MediaValidator, ValidatingSink, is_xml_char};
