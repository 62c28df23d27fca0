//! Line source for delimited text streams.
//!
//! This module pulls physical lines from an underlying reader, applies the
//! comment-skipping and blank-line policies, delegates field splitting to
//! the [`tokenizer`](crate::tokenizer), and tracks a 1-based logical line
//! counter.

use std::io::BufRead;
use tracing::debug;

use crate::config::ReaderConfig;
use crate::tokenizer::tokenize;
use crate::{Error, Result};

/// Pull-based line parser over any buffered reader
///
/// A fully blank physical line is an end-of-stream marker, not a skip: the
/// stream terminates even if more bytes remain unread. Callers that depend
/// on this parser's historical behavior rely on it, so it is preserved
/// deliberately. Once end-of-stream is reached, [`read`](Self::read) keeps
/// returning `Ok(None)` without touching the underlying reader.
#[derive(Debug)]
pub struct DelimitedTextParser<R> {
    source: R,
    delimiter: char,
    skip_comments: bool,
    line_number: u64,
    done: bool,
}

impl<R: BufRead> DelimitedTextParser<R> {
    /// Create a parser with the default comma delimiter
    pub fn new(source: R) -> Self {
        Self::with_delimiter(source, ',')
    }

    /// Create a parser with a custom delimiter
    pub fn with_delimiter(source: R, delimiter: char) -> Self {
        Self::with_options(source, delimiter, false)
    }

    /// Create a parser with a custom delimiter and comment skipping
    pub fn with_options(source: R, delimiter: char, skip_comments: bool) -> Self {
        Self {
            source,
            delimiter,
            skip_comments,
            line_number: 0,
            done: false,
        }
    }

    /// Create a parser from reader configuration
    pub fn with_config(source: R, config: &ReaderConfig) -> Self {
        Self::with_options(source, config.delimiter, config.skip_comments)
    }

    /// 1-based logical line counter, incremented once per read attempt;
    /// comment lines discarded within an attempt are not counted again
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// The configured field delimiter
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Read the next row of fields, or `None` at end-of-stream
    ///
    /// End-of-stream is reached at EOF or at the first fully blank physical
    /// line. Re-invoking after end-of-stream is safe and idempotent.
    pub fn read(&mut self) -> Result<Option<Vec<String>>> {
        if self.done {
            return Ok(None);
        }

        self.line_number += 1;

        loop {
            let mut buffer = String::new();
            let bytes = self
                .source
                .read_line(&mut buffer)
                .map_err(|e| Error::io("failed to read line from source", e))?;

            if bytes == 0 {
                self.done = true;
                return Ok(None);
            }

            let line = strip_line_ending(&buffer);
            if line.is_empty() {
                // Blank line terminates the stream even if more data follows.
                self.done = true;
                return Ok(None);
            }

            if self.skip_comments && line.starts_with('#') {
                debug!(line_number = self.line_number, "skipping comment line");
                continue;
            }

            return Ok(Some(tokenize(line, self.delimiter)));
        }
    }
}

fn strip_line_ending(buffer: &str) -> &str {
    let line = buffer.strip_suffix('\n').unwrap_or(buffer);
    line.strip_suffix('\r').unwrap_or(line)
}
