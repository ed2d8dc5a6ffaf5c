//! Binary record serialization.
//!
//! A dataset is a bare concatenation of [`RECORD_SIZE`]-byte records, each
//! three little-endian `f64` values. There is no header and no padding, so
//! the record count is the file size divided by 24.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::CodecError;
use crate::record::{PhaseRecord, RECORD_SIZE};

/// Number of whole records in `len` bytes, or `None` if `len` is not a
/// multiple of the record size.
#[inline]
pub fn record_count(len: u64) -> Option<u64> {
    if len % RECORD_SIZE as u64 == 0 {
        Some(len / RECORD_SIZE as u64)
    } else {
        None
    }
}

/// Writes `records` in order and flushes the writer.
///
/// Returns the number of bytes written.
pub fn write_records<W: Write>(writer: W, records: &[PhaseRecord]) -> Result<u64, CodecError> {
    let mut writer = BufWriter::new(writer);
    for record in records {
        writer.write_all(&record.to_le_bytes())?;
    }
    writer.flush()?;
    Ok((records.len() * RECORD_SIZE) as u64)
}

/// Reads every record until end of input.
///
/// # Errors
///
/// Returns `CodecError::TrailingBytes` if the input stops inside a record.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<PhaseRecord>, CodecError> {
    RecordReader::new(reader).collect()
}

/// Reads the first `count` records of the file at `path`.
///
/// # Errors
///
/// Returns `CodecError::Truncated` if the file holds fewer records. The
/// size check happens before anything is allocated.
pub fn read_head(path: &Path, count: u64) -> Result<Vec<PhaseRecord>, CodecError> {
    let file = File::open(path)?;
    let available = file.metadata()?.len() / RECORD_SIZE as u64;
    if available < count {
        return Err(CodecError::Truncated {
            expected: count,
            found: available,
        });
    }

    let mut reader = RecordReader::new(BufReader::new(file));
    let mut records = Vec::with_capacity(count as usize);

    while (records.len() as u64) < count {
        match reader.next() {
            Some(record) => records.push(record?),
            None => {
                return Err(CodecError::Truncated {
                    expected: count,
                    found: records.len() as u64,
                })
            }
        }
    }
    Ok(records)
}

/// Streaming iterator over the records of a reader.
///
/// Yields `Err(CodecError::TrailingBytes)` once if the input ends in the
/// middle of a record, then stops.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Wraps `inner`. Buffering is the caller's choice.
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    /// Fills `buf` as far as the input allows, returning the bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<PhaseRecord, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = [0u8; RECORD_SIZE];
        match self.fill(&mut buf) {
            Ok(RECORD_SIZE) => Some(Ok(PhaseRecord::from_le_bytes(&buf))),
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(trailing) => {
                self.done = true;
                Some(Err(CodecError::TrailingBytes { trailing }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(CodecError::Io(e)))
            }
        }
    }
}
