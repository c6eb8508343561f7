use std::sync::Arc;

use meter_client::db::{insert_batch_statement, LiteralError};
use meter_client::domain::MeterReading;
use tokio::task::JoinError;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("batch {batch}: {source}")]
    Literal {
        batch: usize,
        #[source]
        source: LiteralError,
    },
    #[error("batch {batch}: render task failed: {source}")]
    Join {
        batch: usize,
        #[source]
        source: JoinError,
    },
}

/// Render `readings` as idempotent multi-row inserts, one statement per batch of
/// at most `batch_size` readings (`0` means [`DEFAULT_BATCH_SIZE`]).
///
/// Statements are returned in reading order. Batches render concurrently; on
/// failure the error of the lowest-index failing batch is returned.
pub async fn generate_insert_statements(
    readings: impl Into<Arc<[MeterReading]>>,
    batch_size: usize,
) -> Result<Vec<String>, RenderError> {
    let readings: Arc<[MeterReading]> = readings.into();
    let batch_size = if batch_size == 0 { DEFAULT_BATCH_SIZE } else { batch_size };
    let batches = readings.len().div_ceil(batch_size);

    let handles: Vec<_> = (0..batches)
        .map(|batch| {
            let readings = Arc::clone(&readings);
            tokio::task::spawn_blocking(move || {
                let start = batch * batch_size;
                let end = (start + batch_size).min(readings.len());
                insert_batch_statement(&readings[start..end]).render()
            })
        })
        .collect();

    let mut statements = Vec::with_capacity(batches);
    let mut first_error: Option<RenderError> = None;

    for (batch, handle) in handles.into_iter().enumerate() {
        let err = match handle.await {
            Ok(Ok(sql)) => {
                statements.push(sql);
                continue;
            }
            Ok(Err(source)) => RenderError::Literal { batch, source },
            Err(source) => RenderError::Join { batch, source },
        };
        tracing::warn!(batch, error = %err, "failed to render insert statement");
        if first_error.is_none() {
            first_error = Some(err);
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    metrics::counter!("sql_statements_rendered_total").increment(statements.len() as u64);
    tracing::info!(
        readings = readings.len(),
        batch_size,
        statements = statements.len(),
        "rendered insert statements"
    );
    Ok(statements)
}
