//! In-memory stream adapters used when wiring builtins into a pipeline.
//!
//! Builtins run synchronously and are not streams themselves, so their
//! output is captured into a [`MemWriter`] and handed to the next stage as a
//! [`MemReader`] (or fed to an external process's stdin by a background
//! thread).

use std::cell::RefCell;
use std::io::{Cursor, Read, Result as IoResult, Write};
use std::rc::Rc;

/// Memory-backed reader standing in for a builtin's stdin.
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    /// Create a MemReader that will read from the provided buffer.
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    /// An already-exhausted reader, for stages whose upstream produced
    /// nothing (e.g. its stdout was redirected to a file).
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

/// Memory-backed writer capturing a builtin's stdout.
///
/// The buffer is shared through an `Rc` handle so the executor can read the
/// captured bytes back after the builtin (which borrowed the writer) has
/// finished. Capture happens on the executor's own thread only.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Create a writer together with the handle used to collect the bytes
    /// once the command is done.
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
