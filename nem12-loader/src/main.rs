use anyhow::{bail, Result};
use meter_client::domain::MeterReading;
use nem12_loader::{
    config::AppConfig,
    observability,
    pipeline::{Pipeline, PipelineError},
    sinks::SqlFileSink,
    sources::{validate_csv_path, Nem12FileSource},
};
use std::{env, path::PathBuf, process::ExitCode, time::Instant};

/// Convert a NEM12 file into `statement_<N>.sql` insert files.
///
/// Usage:
///   nem12-loader <file.csv> [output_dir]
#[tokio::main]
async fn main() -> ExitCode {
    observability::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "nem12-loader failed");
            let code = e.downcast_ref::<PipelineError>().map_or(1, PipelineError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run() -> Result<()> {
    let started = Instant::now();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: nem12-loader <file.csv> [output_dir]");
    }
    let file_path = PathBuf::from(&args[1]);
    validate_csv_path(&file_path).map_err(PipelineError::from)?;

    let mut cfg = AppConfig::load()?;
    if let Some(dir) = args.get(2) {
        cfg.output.dir = PathBuf::from(dir);
    }

    let pipeline: Pipeline<_, MeterReading, _> = Pipeline::new(
        Nem12FileSource::new(&file_path, cfg.ingest.chunk_count),
        SqlFileSink::new(&cfg.output.dir, cfg.output.batch_size, cfg.output.workers),
    );
    pipeline.run().await?;

    tracing::info!(
        output_dir = %cfg.output.dir.display(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "done"
    );

    Ok(())
}
