use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::sinks::DEFAULT_BATCH_SIZE;

const DEFAULT_CONFIG_PATH: &str = "nem12-loader.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Target number of chunks the input is split into for parallel parsing.
    pub chunk_count: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_count: num_cpus::get(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Readings per statement; 0 falls back to the default.
    pub batch_size: usize,
    /// Concurrent statement file writers.
    pub workers: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            batch_size: DEFAULT_BATCH_SIZE,
            workers: num_cpus::get(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ingest: IngestConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load from `NEM12_LOADER_CONFIG`, else `nem12-loader.toml` if present, else defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var("NEM12_LOADER_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [output]
            dir = "sql"
            batch_size = 500
            "#,
        )
        .unwrap();

        assert_eq!(cfg.output.dir, PathBuf::from("sql"));
        assert_eq!(cfg.output.batch_size, 500);
        assert_eq!(cfg.output.workers, num_cpus::get());
        assert_eq!(cfg.ingest.chunk_count, num_cpus::get());
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.output.dir, PathBuf::from("output"));
        assert_eq!(cfg.output.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nem12-loader.toml");
        fs::write(&path, "[ingest]\nchunk_count = 3\n").unwrap();

        let cfg = AppConfig::from_file(&path).unwrap();
        assert_eq!(cfg.ingest.chunk_count, 3);
        assert!(AppConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
