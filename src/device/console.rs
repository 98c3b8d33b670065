//! Stream-backed console.
//!
//! Output is one line per printed value, `"<decimal> (0x<hex>)"`, with the
//! hex digits showing the two's complement bit pattern. Input is consumed as
//! whitespace-separated tokens, one per read, regardless of how they are
//! split across lines.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::interpreter::traits::{Console, ExecError};

/// Console over a buffered reader and a writer.
pub struct StreamConsole<R, W> {
    reader: R,
    writer: W,
    /// Tokens read but not yet consumed.
    pending: VecDeque<String>,
    /// Reader hit end of input.
    exhausted: bool,
}

impl<R: BufRead, W: Write> StreamConsole<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<(), ExecError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Consume the console and return the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Next input token, reading more lines as needed.
    fn next_token(&mut self) -> Result<Option<String>, ExecError> {
        while self.pending.is_empty() {
            if self.exhausted {
                return Ok(None);
            }
            // Pending output must be visible before blocking on input
            self.writer.flush()?;

            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                self.exhausted = true;
                continue;
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }
}

impl<R: BufRead, W: Write> Console for StreamConsole<R, W> {
    fn print_value(&mut self, value: i32) -> Result<(), ExecError> {
        writeln!(self.writer, "{} (0x{:x})", value, value)?;
        Ok(())
    }

    fn read_value(&mut self) -> Result<Option<i32>, ExecError> {
        match self.next_token()? {
            Some(token) => token
                .parse::<i32>()
                .map(Some)
                .map_err(|_| ExecError::InvalidInput { token }),
            None => Ok(None),
        }
    }
}
