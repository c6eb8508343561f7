#[derive(thiserror::Error, Debug)]
pub enum Nem12Error {
    #[error("error reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid 200 record: not enough fields. record: {record}")]
    MalformedHeader { record: String },
    #[error("invalid interval length '{value}', must be one of 5, 15 or 30. record: {record}")]
    InvalidIntervalLength { value: String, record: String },
    #[error("invalid 300 record: not enough fields. record: {record}")]
    MalformedDataRecord { record: String },
    #[error("300 record before any 200 record. record: {record}")]
    DataBeforeHeader { record: String },
    #[error("invalid date '{value}': {source}. record: {record}")]
    InvalidDate {
        value: String,
        record: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("interval timestamp out of range for date '{value}'. record: {record}")]
    TimestampOutOfRange { value: String, record: String },
    #[error("invalid number of intervals: {expected}. record: {record}")]
    IntervalCountMismatch { expected: usize, record: String },
    #[error("invalid consumption value '{value}': {source}. record: {record}")]
    InvalidConsumptionValue {
        value: String,
        record: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}
