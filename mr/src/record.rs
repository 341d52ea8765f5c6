//! Line-delimited JSON records shared by bucket files and reduce outputs.
//!
//! Every record is a standalone JSON object followed by `\n`, so files can be
//! appended to and read back one record at a time without any container.

use std::io::{self, BufRead, BufReader, Read, Write};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

pub fn write_record<W: Write>(writer: &mut W, record: &KeyValue) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")
}

/// Why a [`RecordReader`] stopped yielding records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// Every line decoded and the stream ended on a newline.
    Clean,
    /// The last line has no newline: the writer was cut off mid-record.
    Truncated { records: usize },
    /// A complete line did not decode as a record.
    Malformed { records: usize, reason: String },
}

impl StreamEnd {
    pub fn is_clean(&self) -> bool {
        matches!(self, StreamEnd::Clean)
    }
}

/// Decodes records one line at a time.
///
/// A line that fails to decode ends the stream instead of failing the read;
/// [`RecordReader::end`] tells a clean end apart from a damaged one. Only I/O
/// errors are yielded as `Err`.
pub struct RecordReader<R> {
    inner: BufReader<R>,
    line: Vec<u8>,
    records: usize,
    end: Option<StreamEnd>,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        RecordReader {
            inner: BufReader::new(reader),
            line: Vec::new(),
            records: 0,
            end: None,
        }
    }

    /// Records decoded so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// `None` until the iterator is exhausted.
    pub fn end(&self) -> Option<&StreamEnd> {
        self.end.as_ref()
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = io::Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.is_some() {
            return None;
        }

        self.line.clear();
        match self.inner.read_until(b'\n', &mut self.line) {
            Ok(0) => {
                self.end = Some(StreamEnd::Clean);
                None
            }
            Ok(_) => {
                if self.line.last() != Some(&b'\n') {
                    self.end = Some(StreamEnd::Truncated {
                        records: self.records,
                    });
                    return None;
                }
                match serde_json::from_slice::<KeyValue>(&self.line) {
                    Ok(record) => {
                        self.records += 1;
                        Some(Ok(record))
                    }
                    Err(e) => {
                        self.end = Some(StreamEnd::Malformed {
                            records: self.records,
                            reason: e.to_string(),
                        });
                        None
                    }
                }
            }
            Err(e) => Some(Err(e)),
        }
    }
}
