use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use futures::Stream;
use meter_client::domain::MeterReading;

use crate::pipeline::{Envelope, PipelineError, Source};
use crate::sources::nem12::{ingest_chunks, split_into_chunks};

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("CSV file name is required")]
    MissingInput,
    #[error("file must have .csv extension: {}", .0.display())]
    NotCsv(PathBuf),
    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),
}

/// Check that `path` names an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<(), InputError> {
    if path.as_os_str().is_empty() {
        return Err(InputError::MissingInput);
    }
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return Err(InputError::NotCsv(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    Ok(())
}

/// NEM12 file source for `MeterReading`.
///
/// The whole file is read into memory, split into chunks along `200` records and
/// parsed in parallel. Readings are yielded in file order once every chunk has
/// parsed; a parse failure is yielded as the only item.
pub struct Nem12FileSource {
    path: PathBuf,
    chunk_count: usize,
}

impl Nem12FileSource {
    pub fn new<P: Into<PathBuf>>(path: P, chunk_count: usize) -> Self {
        Self {
            path: path.into(),
            chunk_count: chunk_count.max(1),
        }
    }
}

/// Read, split and parse a NEM12 file.
pub async fn load_readings(path: &Path, chunk_count: usize) -> Result<Vec<MeterReading>, PipelineError> {
    let started = Instant::now();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::Source(format!("failed to read NEM12 file {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "read NEM12 file");

    let chunks = split_into_chunks(contents.lines(), chunk_count);
    tracing::debug!(
        chunks = chunks.len(),
        largest = chunks.iter().map(Vec::len).max().unwrap_or(0),
        "split NEM12 file into chunks"
    );

    let readings = ingest_chunks(chunks).await?;
    tracing::info!(
        readings = readings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "parsed NEM12 file"
    );

    Ok(readings)
}

#[async_trait::async_trait]
impl Source<MeterReading> for Nem12FileSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Envelope<MeterReading>, PipelineError>> + Send>> {
        let path = self.path.clone();
        let chunk_count = self.chunk_count;
        let s = async_stream::try_stream! {
            let readings = load_readings(&path, chunk_count).await?;
            for reading in readings {
                yield Envelope::now(reading);
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;

    const FILE: &str = "100,NEM12,200506081149,UNITEDDP,NEMMCO
200,NEM1201009,E1E2,1,E1,N1,01009,kWh,30,20050610
300,20050301,0,0,0,0,0,0,0,0,0,0,0,0,0.461,0.810,0.568,1.234,1.353,1.507,1.344,1.773,0.848,1.271,0.895,1.327,1.013,1.793,0.988,0.985,0.876,0.555,0.760,0.938,0.566,0.512,0.970,0.760,0.731,0.615,0.886,0.531,0.774,0.712,0.598,0.670,0.587,0.657,0.345,0.231,A,,,20050310121004,20050310182204
900
";

    fn temp_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn validate_csv_path_checks_extension_and_existence() {
        let file = temp_csv(FILE);
        assert!(validate_csv_path(file.path()).is_ok());

        assert!(matches!(validate_csv_path(Path::new("")), Err(InputError::MissingInput)));
        assert!(matches!(
            validate_csv_path(Path::new("readings.txt")),
            Err(InputError::NotCsv(_))
        ));
        assert!(matches!(
            validate_csv_path(Path::new("/definitely/not/here.csv")),
            Err(InputError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn source_streams_readings_in_file_order() {
        let file = temp_csv(FILE);
        let source = Nem12FileSource::new(file.path(), 4);

        let readings: Vec<_> = source
            .stream()
            .await
            .map(|item| item.map(|env| env.payload))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(readings.len(), 48);
        assert_eq!(readings[0].nmi, "NEM1201009");
        assert_eq!(readings[12].consumption, 0.461);
    }

    #[tokio::test]
    async fn parse_failure_is_the_only_item() {
        let file = temp_csv(&FILE.replace(",30,", ",10,"));
        let source = Nem12FileSource::new(file.path(), 4);

        let items: Vec<_> = source.stream().await.collect().await;

        assert_eq!(items.len(), 1);
        let err = items.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(err, PipelineError::Ingest(_)));
        assert!(err.to_string().contains("must be one of 5, 15 or 30"));
    }

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let err = load_readings(Path::new("/definitely/not/here.csv"), 2).await.unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }
}
