/*
 * buffer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Capture buffers for body output.
//!
//! A [`BufferWriter`] collects characters in memory and, once a configured
//! threshold is crossed, moves everything to an anonymous temporary file.
//! Closing it yields an immutable [`BufferResult`] that can be replayed into
//! any sink as many times as needed.

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::Result;
use crate::sink::MediaSink;

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug)]
enum Storage {
    Memory(String),
    File(BufWriter<File>),
}

/// Sink that records everything written to it.
#[derive(Debug)]
pub struct BufferWriter {
    /// Length in characters beyond which contents move to a temporary file.
    threshold: Option<u64>,
    len: u64,
    storage: Storage,
}

impl BufferWriter {
    pub fn new(threshold: Option<u64>) -> Self {
        Self {
            threshold,
            len: 0,
            storage: Storage::Memory(String::new()),
        }
    }

    /// Characters written so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether contents have moved to a temporary file.
    pub fn is_spilled(&self) -> bool {
        matches!(self.storage, Storage::File(_))
    }

    fn spill(&mut self) -> Result<()> {
        if let Storage::Memory(contents) = &self.storage {
            let mut writer = BufWriter::new(tempfile::tempfile()?);
            writer.write_all(contents.as_bytes())?;
            debug!(len = self.len, "capture buffer moved to temporary file");
            self.storage = Storage::File(writer);
        }
        Ok(())
    }

    /// Finish writing and return the captured contents.
    pub fn close(self) -> Result<BufferResult> {
        let contents = match self.storage {
            Storage::Memory(contents) => Contents::Memory(contents),
            Storage::File(writer) => {
                let mut file = writer.into_inner().map_err(|e| e.into_error())?;
                file.seek(SeekFrom::Start(0))?;
                Contents::File(Mutex::new(file))
            }
        };
        Ok(BufferResult {
            contents: Arc::new(contents),
            len: self.len,
        })
    }
}

impl MediaSink for BufferWriter {
    fn write_str(&mut self, s: &str) -> Result<()> {
        if s.is_empty() {
            return Ok(());
        }
        self.len += s.chars().count() as u64;
        match &mut self.storage {
            Storage::Memory(contents) => {
                contents.push_str(s);
                if self.threshold.is_some_and(|threshold| self.len > threshold) {
                    self.spill()?;
                }
            }
            Storage::File(writer) => writer.write_all(s.as_bytes())?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Storage::File(writer) = &mut self.storage {
            writer.flush()?;
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Contents {
    Memory(String),
    File(Mutex<File>),
}

/// The immutable contents of a closed [`BufferWriter`].
///
/// Cloning is cheap; clones share the same storage.
#[derive(Debug, Clone)]
pub struct BufferResult {
    contents: Arc<Contents>,
    len: u64,
}

impl BufferResult {
    pub fn empty() -> Self {
        Self {
            contents: Arc::new(Contents::Memory(String::new())),
            len: 0,
        }
    }

    /// Length in characters.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Replay the contents into `out`. Nothing is written when empty.
    pub fn write_to(&self, out: &mut dyn MediaSink) -> Result<()> {
        if self.len == 0 {
            return Ok(());
        }
        match &*self.contents {
            Contents::Memory(contents) => out.write_str(contents),
            Contents::File(file) => {
                let mut file = file
                    .lock()
                    .map_err(|_| io::Error::other("capture buffer lock poisoned"))?;
                file.seek(SeekFrom::Start(0))?;
                copy_utf8(&mut *file, out)
            }
        }
    }

    /// Read the contents into a string.
    pub fn read_to_string(&self) -> Result<String> {
        let mut out = String::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}

impl Default for BufferResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// Copy UTF-8 from `reader` to `out`, carrying characters split across
/// reads over to the next chunk.
fn copy_utf8(reader: &mut impl Read, out: &mut dyn MediaSink) -> Result<()> {
    let mut chunk = [0u8; READ_CHUNK];
    let mut bytes: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        match std::str::from_utf8(&bytes) {
            Ok(text) => {
                out.write_str(text)?;
                bytes.clear();
            }
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let text = std::str::from_utf8(&bytes[..valid])
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                out.write_str(text)?;
                bytes.drain(..valid);
            }
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e).into()),
        }
    }
    if !bytes.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "capture buffer ends inside a character",
        )
        .into());
    }
    Ok(())
}
