use std::{pin::Pin, time::SystemTime};

use futures::Stream;

use crate::sinks::{statement_files::EmitError, sql_statements::RenderError};
use crate::sources::{nem12::IngestError, nem12_file::InputError};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn now(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl PipelineError {
    /// Process exit status for this failure; each stage gets its own.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Input(_) => 2,
            Self::Ingest(_) => 3,
            Self::Render(_) => 4,
            Self::Emit(_) => 5,
            Self::Source(_) => 1,
        }
    }
}

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(
        &self,
    ) -> Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub sink: K,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            _marker: std::marker::PhantomData,
        }
    }

    pub async fn run(self) -> Result<(), PipelineError> {
        let stream = self.source.stream().await;
        self.sink.run(stream).await
    }
}
