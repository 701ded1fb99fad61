//! Dialect-aware row reading.
//!
//! [`RowReader`] turns a raw byte stream into a lazy, finite, forward-only
//! sequence of [`RawRow`] values, decoding each cell through the dialect's
//! encoding. Header handling and data-row numbering live here: when the
//! document has a header row it is consumed before numbering starts, so the
//! first *data* row is always row 1.
//!
//! Parse and decode failures are structural: the reader yields a single
//! [`ImportError::Structural`] and then fuses, so no further rows are
//! attempted past the malformed point.

use std::io::Read;

use crate::{error::ImportError, io_utils::Dialect};

/// An ordered sequence of raw cells plus its 1-based data-row position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }
}

pub struct RowReader<R: Read> {
    reader: csv::Reader<R>,
    encoding: &'static encoding_rs::Encoding,
    header_pending: bool,
    next_number: usize,
    fused: bool,
}

impl<R: Read> RowReader<R> {
    pub fn new(input: R, dialect: &Dialect, has_headers: bool) -> Self {
        Self {
            reader: crate::io_utils::open_csv_reader(input, dialect),
            encoding: dialect.encoding,
            header_pending: has_headers,
            next_number: 1,
            fused: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<csv::ByteRecord>, ImportError> {
        let mut record = csv::ByteRecord::new();
        match self.reader.read_byte_record(&mut record) {
            Ok(true) => Ok(Some(record)),
            Ok(false) => Ok(None),
            Err(err) => Err(ImportError::Structural(err.to_string())),
        }
    }

    fn next_row(&mut self) -> Result<Option<RawRow>, ImportError> {
        if self.header_pending {
            self.header_pending = false;
            if self.read_record()?.is_none() {
                return Ok(None);
            }
        }
        let Some(record) = self.read_record()? else {
            return Ok(None);
        };
        let cells = crate::io_utils::decode_record(&record, self.encoding)
            .map_err(|err| ImportError::Structural(err.to_string()))?;
        let number = self.next_number;
        self.next_number += 1;
        Ok(Some(RawRow { number, cells }))
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<RawRow, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.fused = true;
                None
            }
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}
