use time::OffsetDateTime;

/// One interval of consumption for a single NMI.
///
/// `timestamp` is the *end* of the interval the consumption accrued over.
/// `(nmi, timestamp)` is the idempotency key of the `meter_readings` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeterReading {
    pub nmi: String,
    pub timestamp: OffsetDateTime,
    pub consumption: f64,
}
