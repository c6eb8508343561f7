//! NEM12 interval meter data.
//!
//! A NEM12 file is a sequence of comma-separated records keyed by their first field:
//! `100` file header, `200` NMI data details, `300` interval data, `900` end of data.
//! A `200` record sets the NMI and interval length for the `300` records after it, so
//! a file can only be parsed in parallel along `200` boundaries.

pub mod chunker;
pub mod error;
pub mod ingest;
pub mod record_parser;

pub use chunker::{split_into_chunks, Chunk};
pub use error::Nem12Error;
pub use ingest::{ingest_chunks, IngestError};
pub use record_parser::{parse_chunk, IntervalLength, ParseContext};

/// Record type, from the first field of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    FileHeader,
    NmiDetails,
    IntervalData,
    EndOfData,
    Other,
}

impl RecordType {
    pub fn from_indicator(field: &str) -> Self {
        match field {
            "100" => Self::FileHeader,
            "200" => Self::NmiDetails,
            "300" => Self::IntervalData,
            "900" => Self::EndOfData,
            _ => Self::Other,
        }
    }

    /// Classify a raw line without tokenizing the rest of it.
    pub fn of_line(line: &str) -> Self {
        Self::from_indicator(line.split(',').next().unwrap_or(""))
    }
}
