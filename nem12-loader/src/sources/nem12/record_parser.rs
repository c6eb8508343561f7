use csv::StringRecord;
use meter_client::domain::MeterReading;
use time::{macros::format_description, Date, Duration, OffsetDateTime};

use super::{Nem12Error, RecordType};

const MINUTES_PER_DAY: u32 = 1440;
/// A `300` record carries the quality method after its values, then up to four
/// more trailing fields (reason code, reason description, update and MSATS load
/// datetimes).
const MIN_TRAILING_FIELDS: usize = 1;
const MAX_TRAILING_FIELDS: usize = 5;

/// Interval length declared by a `200` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalLength {
    Five,
    Fifteen,
    Thirty,
}

impl IntervalLength {
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        match minutes {
            5 => Some(Self::Five),
            15 => Some(Self::Fifteen),
            30 => Some(Self::Thirty),
            _ => None,
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Fifteen => 15,
            Self::Thirty => 30,
        }
    }

    /// Number of interval values in one `300` record.
    pub fn slots(self) -> usize {
        (MINUTES_PER_DAY / self.minutes()) as usize
    }
}

/// State carried from a `200` record to the `300` records after it.
///
/// Owned by a single [`parse_chunk`] call.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    pub nmi: String,
    pub interval: Option<IntervalLength>,
}

fn record_text(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}

impl ParseContext {
    fn apply_nmi_details(&mut self, record: &StringRecord) -> Result<(), Nem12Error> {
        if record.len() < 9 {
            return Err(Nem12Error::MalformedHeader {
                record: record_text(record),
            });
        }

        let raw = &record[8];
        let interval = raw
            .parse::<i64>()
            .ok()
            .and_then(IntervalLength::from_minutes)
            .ok_or_else(|| Nem12Error::InvalidIntervalLength {
                value: raw.to_string(),
                record: record_text(record),
            })?;

        self.nmi = record[1].to_string();
        self.interval = Some(interval);
        Ok(())
    }

    fn read_interval_data(
        &self,
        record: &StringRecord,
        out: &mut Vec<MeterReading>,
    ) -> Result<(), Nem12Error> {
        if record.len() < 3 {
            return Err(Nem12Error::MalformedDataRecord {
                record: record_text(record),
            });
        }

        let interval = self.interval.ok_or_else(|| Nem12Error::DataBeforeHeader {
            record: record_text(record),
        })?;

        let raw_date = &record[1];
        let date = Date::parse(raw_date, format_description!("[year][month][day]")).map_err(
            |source| Nem12Error::InvalidDate {
                value: raw_date.to_string(),
                record: record_text(record),
                source,
            },
        )?;

        let slots = interval.slots();
        let expected = (slots + 2 + MIN_TRAILING_FIELDS)..=(slots + 2 + MAX_TRAILING_FIELDS);
        if !expected.contains(&record.len()) {
            return Err(Nem12Error::IntervalCountMismatch {
                expected: slots,
                record: record_text(record),
            });
        }

        // Values are labelled by the end of their interval.
        let step = Duration::minutes(interval.minutes().into());
        let out_of_range = || Nem12Error::TimestampOutOfRange {
            value: raw_date.to_string(),
            record: record_text(record),
        };
        let first_end: OffsetDateTime = date
            .midnight()
            .assume_utc()
            .checked_add(step)
            .ok_or_else(out_of_range)?;

        out.reserve(slots);
        for (i, value) in record.iter().skip(2).take(slots).enumerate() {
            if value.is_empty() {
                continue;
            }
            let consumption: f64 =
                value
                    .parse()
                    .map_err(|source| Nem12Error::InvalidConsumptionValue {
                        value: value.to_string(),
                        record: record_text(record),
                        source,
                    })?;

            let timestamp = first_end
                .checked_add(step * i as u32)
                .ok_or_else(out_of_range)?;

            out.push(MeterReading {
                nmi: self.nmi.clone(),
                timestamp,
                consumption,
            });
        }

        Ok(())
    }
}

/// Parse one chunk into readings, in line order.
///
/// The first bad record fails the whole chunk; nothing parsed before it is kept.
pub fn parse_chunk<S: AsRef<str>>(chunk: &[S]) -> Result<Vec<MeterReading>, Nem12Error> {
    let mut text = String::with_capacity(chunk.iter().map(|l| l.as_ref().len() + 1).sum());
    for line in chunk {
        text.push_str(line.as_ref());
        text.push('\n');
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut ctx = ParseContext::default();
    let mut readings = Vec::new();
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        if record.is_empty() {
            continue;
        }

        match RecordType::from_indicator(&record[0]) {
            RecordType::NmiDetails => ctx.apply_nmi_details(&record)?,
            RecordType::IntervalData => ctx.read_interval_data(&record, &mut readings)?,
            RecordType::FileHeader | RecordType::EndOfData | RecordType::Other => {}
        }
    }

    Ok(readings)
}
