use meter_client::domain::MeterReading;
use tokio::task::{JoinError, JoinHandle};

use super::{parse_chunk, Chunk, Nem12Error};

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("chunk {chunk}: {source}")]
    Parse {
        chunk: usize,
        #[source]
        source: Nem12Error,
    },
    #[error("chunk {chunk}: parser task failed: {source}")]
    Join {
        chunk: usize,
        #[source]
        source: JoinError,
    },
}

/// Parse every chunk on its own blocking task and concatenate the results in chunk order.
///
/// All chunks run to completion. If any failed, the error of the lowest-index failing
/// chunk is returned and every parsed reading is dropped.
pub async fn ingest_chunks(chunks: Vec<Chunk>) -> Result<Vec<MeterReading>, IngestError> {
    let handles: Vec<JoinHandle<Result<Vec<MeterReading>, Nem12Error>>> = chunks
        .into_iter()
        .map(|chunk| tokio::task::spawn_blocking(move || parse_chunk(&chunk)))
        .collect();

    let mut parsed = Vec::with_capacity(handles.len());
    let mut first_error: Option<IngestError> = None;

    for (chunk, handle) in handles.into_iter().enumerate() {
        let outcome = match handle.await {
            Ok(Ok(readings)) => Ok(readings),
            Ok(Err(source)) => Err(IngestError::Parse { chunk, source }),
            Err(source) => Err(IngestError::Join { chunk, source }),
        };

        match outcome {
            Ok(readings) => parsed.push(readings),
            Err(e) => {
                tracing::warn!(chunk, error = %e, "NEM12 chunk failed to parse");
                metrics::counter!("nem12_chunk_parse_errors_total").increment(1);
                // Handles are awaited in chunk order, so the first error seen has the lowest index.
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    let readings: Vec<MeterReading> = parsed.into_iter().flatten().collect();
    metrics::counter!("nem12_readings_parsed_total").increment(readings.len() as u64);
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::nem12::split_into_chunks;
    use time::macros::datetime;

    fn group(nmi: &str, interval: &str, day: &str, value: f64) -> Vec<String> {
        let slots = 1440 / interval.parse::<usize>().unwrap_or(30);
        let values = vec![value.to_string(); slots].join(",");
        vec![
            format!("200,{nmi},E1E2,1,E1,N1,01009,kWh,{interval},20050610"),
            format!("300,{day},{values},A,,,20050310121004,20050310182204"),
        ]
    }

    fn file(groups: Vec<Vec<String>>) -> Vec<String> {
        let mut lines = vec!["100,NEM12,200506081149,UNITEDDP,NEMMCO".to_string()];
        lines.extend(groups.into_iter().flatten());
        lines.push("900".to_string());
        lines
    }

    #[tokio::test]
    async fn readings_keep_file_order_across_chunks() {
        let lines = file(vec![
            group("NMI0", "30", "20050301", 1.0),
            group("NMI1", "30", "20050301", 2.0),
            group("NMI2", "15", "20050302", 3.0),
        ]);

        let chunks = split_into_chunks(lines.clone(), 3);
        assert_eq!(chunks.len(), 3);
        let parallel = ingest_chunks(chunks).await.unwrap();
        let sequential = parse_chunk(&lines).unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 48 + 48 + 96);
        assert_eq!(parallel[0].nmi, "NMI0");
        assert_eq!(parallel[0].timestamp, datetime!(2005-03-01 00:30:00 UTC));
        assert_eq!(parallel[48].nmi, "NMI1");
        assert_eq!(parallel[96].nmi, "NMI2");
        assert_eq!(parallel[96].timestamp, datetime!(2005-03-02 00:15:00 UTC));
    }

    #[tokio::test]
    async fn multiple_nmis_yield_all_readings() {
        let lines = file(vec![
            group("NEM1201009", "30", "20050301", 0.0),
            group("NEM1201010", "30", "20050301", 0.0),
        ]);

        let readings = ingest_chunks(split_into_chunks(lines, 8)).await.unwrap();

        assert_eq!(readings.len(), 96);
        assert_eq!(readings[0].timestamp, datetime!(2005-03-01 00:30:00 UTC));
    }

    #[tokio::test]
    async fn lowest_failing_chunk_wins() {
        let lines = file(vec![
            group("NMI0", "30", "20050301", 1.0),
            group("NMI1", "10", "20050301", 1.0),
            group("NMI2", "30", "2005030X", 1.0),
        ]);

        let err = ingest_chunks(split_into_chunks(lines, 8)).await.unwrap_err();

        match err {
            IngestError::Parse { chunk, source } => {
                assert_eq!(chunk, 2);
                assert!(matches!(source, Nem12Error::InvalidIntervalLength { .. }));
                assert!(source.to_string().contains("must be one of 5, 15 or 30"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn no_chunks_no_readings() {
        assert!(ingest_chunks(Vec::new()).await.unwrap().is_empty());
    }
}
