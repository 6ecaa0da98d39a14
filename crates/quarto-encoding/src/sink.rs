/*
 * sink.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Character sinks.
//!
//! [`MediaSink`] is the only thing the pipeline assumes about where output
//! goes: it accepts characters, can be flushed and can be closed. Hosts
//! provide the outermost sink; validators and encoders are sinks layered on
//! top of it.

use std::fmt;
use std::io;

use crate::error::{EncodingError, Result};
use crate::input::Guarantee;

/// A destination for character output.
pub trait MediaSink {
    fn write_str(&mut self, s: &str) -> Result<()>;

    fn write_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.write_str(c.encode_utf8(&mut buf))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    /// The validation this sink performs on its input, when it performs any.
    ///
    /// Host sinks that already validate their input may report it so the
    /// outermost producer does not stack a second validator on top.
    fn valid_media_input(&self) -> Option<Guarantee> {
        None
    }

    /// Support for `write!` on any sink.
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        struct Adapter<'a, S: ?Sized> {
            sink: &'a mut S,
            error: Option<EncodingError>,
        }

        impl<S: MediaSink + ?Sized> fmt::Write for Adapter<'_, S> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.sink.write_str(s).map_err(|e| {
                    self.error = Some(e);
                    fmt::Error
                })
            }
        }

        let mut adapter = Adapter {
            sink: self,
            error: None,
        };
        match fmt::write(&mut adapter, args) {
            Ok(()) => Ok(()),
            Err(_) => Err(adapter
                .error
                .unwrap_or_else(|| io::Error::other("formatter error").into())),
        }
    }
}

impl<S: MediaSink + ?Sized> MediaSink for &mut S {
    fn write_str(&mut self, s: &str) -> Result<()> {
        (**self).write_str(s)
    }

    fn write_char(&mut self, c: char) -> Result<()> {
        (**self).write_char(c)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn valid_media_input(&self) -> Option<Guarantee> {
        (**self).valid_media_input()
    }
}

impl MediaSink for String {
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.push_str(s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> Result<()> {
        self.push(c);
        Ok(())
    }
}

/// Sink that drops everything written to it.
///
/// Stateless, so a single value may be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MediaSink for NullSink {
    fn write_str(&mut self, _s: &str) -> Result<()> {
        Ok(())
    }

    fn write_char(&mut self, _c: char) -> Result<()> {
        Ok(())
    }
}

/// Sink that fails on every write, including empty ones.
///
/// Handed to producers that declare they emit nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailOnWrite;

impl MediaSink for FailOnWrite {
    fn write_str(&mut self, _s: &str) -> Result<()> {
        Err(EncodingError::UnexpectedOutput)
    }

    fn write_char(&mut self, _c: char) -> Result<()> {
        Err(EncodingError::UnexpectedOutput)
    }
}

/// Adapts any [`io::Write`] into a sink, writing UTF-8.
#[derive(Debug)]
pub struct IoSink<W: io::Write> {
    inner: W,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> MediaSink for IoSink<W> {
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.inner.write_all(s.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_sink_and_write_macro() {
        let mut out = String::new();
        write!(out, "{}-{}", 1, "two").unwrap();
        out.write_char('!').unwrap();
        assert_eq!(out, "1-two!");
    }

    #[test]
    fn test_fail_on_write_rejects_empty_writes() {
        let mut sink = FailOnWrite;
        assert!(matches!(
            sink.write_str(""),
            Err(EncodingError::UnexpectedOutput)
        ));
        assert!(matches!(
            sink.write_char('a'),
            Err(EncodingError::UnexpectedOutput)
        ));
        assert!(sink.flush().is_ok());
        assert!(sink.close().is_ok());
    }

    #[test]
    fn test_write_macro_propagates_sink_errors() {
        let mut sink = FailOnWrite;
        let err = write!(sink, "{}", 42).unwrap_err();
        assert!(matches!(err, EncodingError::UnexpectedOutput));
    }

    #[test]
    fn test_io_sink() {
        let mut sink = IoSink::new(Vec::new());
        sink.write_str("héllo").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.into_inner(), "héllo".as_bytes());
    }

    #[test]
    fn test_null_sink_through_reference() {
        let mut null = NullSink;
        let sink: &mut dyn MediaSink = &mut null;
        sink.write_str("dropped").unwrap();
        assert!(sink.valid_media_input().is_none());
    }
}
