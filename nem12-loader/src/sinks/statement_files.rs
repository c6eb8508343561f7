use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    sync::{mpsc, Mutex},
    task::JoinError,
};

const FILE_PREFIX: &str = "statement_";
const FILE_SUFFIX: &str = ".sql";

#[derive(thiserror::Error, Debug)]
pub enum EmitError {
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to clear existing statement files in {}: {source}", .path.display())]
    ClearStale {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {}: {source}", .path.display())]
    Write {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("statement writer task failed: {0}")]
    Join(#[from] JoinError),
}

/// `statement_<index + 1>.sql`
pub fn statement_file_name(index: usize) -> String {
    format!("{FILE_PREFIX}{}{FILE_SUFFIX}", index + 1)
}

fn is_statement_file_name(name: &str) -> bool {
    name.strip_prefix(FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Remove every `statement_<N>.sql` file directly inside `dir`.
async fn clear_existing_statement_files(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(is_statement_file_name) {
            tokio::fs::remove_file(entry.path()).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Write statement `i` to `dir/statement_<i + 1>.sql`, terminated with `;`.
///
/// Stale statement files are removed before any worker starts. `workers` tasks pull
/// indices from a shared queue; a failed write stops that worker only. Files written
/// before a failure are left on disk. The lowest-index write failure is returned.
pub async fn write_statement_files(
    statements: impl Into<Arc<[String]>>,
    dir: &Path,
    workers: usize,
) -> Result<(), EmitError> {
    let statements: Arc<[String]> = statements.into();

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| EmitError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

    let removed = clear_existing_statement_files(dir)
        .await
        .map_err(|source| EmitError::ClearStale {
            path: dir.to_path_buf(),
            source,
        })?;
    if removed > 0 {
        tracing::debug!(removed, dir = %dir.display(), "removed stale statement files");
    }

    let (tx, rx) = mpsc::channel::<usize>(statements.len().max(1));
    for index in 0..statements.len() {
        if tx.send(index).await.is_err() {
            break;
        }
    }
    drop(tx);
    let queue = Arc::new(Mutex::new(rx));

    let mut joins = Vec::with_capacity(workers.max(1));
    for _ in 0..workers.max(1) {
        let queue = Arc::clone(&queue);
        let statements = Arc::clone(&statements);
        let dir = dir.to_path_buf();

        joins.push(tokio::spawn(async move {
            loop {
                let next = queue.lock().await.recv().await;
                let Some(index) = next else {
                    return Ok(());
                };

                let path = dir.join(statement_file_name(index));
                let mut body = String::with_capacity(statements[index].len() + 1);
                body.push_str(&statements[index]);
                body.push(';');

                if let Err(source) = tokio::fs::write(&path, body).await {
                    tracing::error!(error = %source, path = %path.display(), "statement file write failed");
                    return Err(EmitError::Write { index, path, source });
                }
                metrics::counter!("sql_statement_files_written_total").increment(1);
            }
        }));
    }

    let mut first_error: Option<EmitError> = None;
    for j in joins {
        let err = match j.await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(e) => EmitError::Join(e),
        };
        first_error = match (first_error, err) {
            (None, err) => Some(err),
            (Some(EmitError::Write { index: a, .. }), err @ EmitError::Write { index: b, .. }) if b < a => {
                Some(err)
            }
            (kept, _) => kept,
        };
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    tracing::info!(files = statements.len(), dir = %dir.display(), "wrote statement files");
    Ok(())
}
