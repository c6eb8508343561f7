use std::{path::PathBuf, time::SystemTime};

use futures::StreamExt;
use meter_client::domain::MeterReading;

use crate::pipeline::{Envelope, PipelineError, Sink};
use crate::sinks::{sql_statements::generate_insert_statements, statement_files::write_statement_files};

/// Renders the whole reading stream to `statement_<N>.sql` files.
///
/// Unlike a database sink this cannot flush as it goes: statement numbering has to
/// cover the full run, and an upstream error must leave no new statements behind.
pub struct SqlFileSink {
    output_dir: PathBuf,
    batch_size: usize,
    workers: usize,
}

impl SqlFileSink {
    pub fn new<P: Into<PathBuf>>(output_dir: P, batch_size: usize, workers: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            batch_size,
            workers: workers.max(1),
        }
    }
}

#[async_trait::async_trait]
impl Sink<MeterReading> for SqlFileSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<MeterReading>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut readings = Vec::new();
        let mut earliest: Option<SystemTime> = None;

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    tracing::error!(error = %e, "error in upstream pipeline for SqlFileSink");
                    return Err(e);
                }
            };
            earliest = Some(earliest.map_or(env.received_at, |t| t.min(env.received_at)));
            readings.push(env.payload);
        }

        let statements = generate_insert_statements(readings, self.batch_size).await?;
        write_statement_files(statements, &self.output_dir, self.workers).await?;

        if let Some(min_received) = earliest {
            if let Ok(dur) = SystemTime::now().duration_since(min_received) {
                metrics::histogram!("ingest_end_to_end_latency_seconds").record(dur.as_secs_f64());
            }
        }

        Ok(())
    }
}
