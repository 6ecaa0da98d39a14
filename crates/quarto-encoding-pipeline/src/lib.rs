/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Context-aware output for nested producers.
//!
//! Each [`Producer`] declares the media type it emits. The driver works out
//! what its container is (from the enclosing producer, or from the response
//! for the outermost one) and routes the producer's output through an
//! encoder, straight through, or through a validator, so that what reaches
//! the real sink is always valid for the outermost type while every nested
//! producer's own type is also checked.
//!
//! ```
//! use quarto_encoding_pipeline::{EncodingProducer, RequestScope, TextBody, run};
//! use quarto_encoding::MediaType;
//!
//! let mut scope = RequestScope::new().with_response_content_type("text/html");
//! let mut out = String::new();
//! let mut producer = EncodingProducer::new(MediaType::Text);
//! let mut body = TextBody::new("a<b>");
//! run(&mut producer, Some(&mut body), &mut scope, &mut out).unwrap();
//! assert_eq!(out, "a&lt;b&gt;");
//! ```
//!
//! Bodies are host callbacks and may run nested producers themselves,
//! writing into the sink they are handed:
//!
//! ```
//! use quarto_encoding::{MediaSink, MediaType};
//! use quarto_encoding_pipeline::{
//!     EncodingHost, EncodingProducer, OutProducer, RequestScope, Result, run,
//! };
//!
//! let mut scope = RequestScope::new();
//! let mut out = String::new();
//! let mut outer = EncodingProducer::new(MediaType::JavaScript);
//! let mut body = |out: &mut dyn MediaSink, host: &mut dyn EncodingHost| -> Result<()> {
//!     out.write_str("var title = ")?;
//!     run(&mut OutProducer::new(Some("<Home>".into())), None, host, out)?;
//!     out.write_str(";")?;
//!     Ok(())
//! };
//! run(&mut outer, Some(&mut body), &mut scope, &mut out).unwrap();
//! assert_eq!(
//!     out,
//!     "<script type=\"application/javascript\">//<![CDATA[\nvar title = \"\\u003cHome\\u003e\";\n//]]></script>"
//! );
//! ```

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod producer;
pub mod producers;
pub mod select;

pub use config::PipelineConfig;
pub use context::{EncodingHost, PriorContext, RequestContext, RequestScope};
pub use driver::run;
pub use error::{PipelineError, Result};
pub use producer::{
    Body, BodyControl, CollectedBody, Discipline, EndControl, LifecyclePhase, Producer, TextBody,
};
pub use producers::{CaptureProducer, EncodingProducer, OutProducer, StyleProducer};
pub use select::{OutputMode, Selection};
