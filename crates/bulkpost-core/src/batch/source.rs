//! Work sources. Any `IntoIterator<Item = WorkItem<P>>` works; this module
//! adds a lazy JSON-lines file reader.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use crate::model::WorkItem;

/// Reads one raw JSON payload per non-blank line, lazily, with ids
/// `line-<n>` (1-based line numbers). Payloads are not parsed here; a
/// malformed line fails at encode time as a terminal item failure.
///
/// A read error ends the iteration; retrieve it with `take_error`.
pub struct JsonLinesSource<B> {
    lines: Lines<B>,
    line_no: usize,
    error: Option<io::Error>,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<B: BufRead> JsonLinesSource<B> {
    pub fn new(reader: B) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            error: None,
        }
    }

    /// The read error that ended iteration early, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<B: BufRead> Iterator for JsonLinesSource<B> {
    type Item = WorkItem<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        loop {
            self.line_no += 1;
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    return Some(WorkItem::new(
                        format!("line-{}", self.line_no),
                        line.trim().to_string(),
                    ))
                }
                Err(e) => {
                    tracing::error!(line = self.line_no, error = %e, "input read failed");
                    self.error = Some(e);
                    return None;
                }
            }
        }
    }
}
