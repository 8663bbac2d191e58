//! Async worker for running allocations concurrently

use crate::{AllocationRequest, AllocationResult, Pipeline, PipelineError};
use roster_domain::traits::{CohortSource, RunSink};
use std::fmt::Display;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

type StoreOpener<S> = dyn Fn() -> Result<S, String> + Send + Sync;

/// Runs pipeline allocations on tokio's blocking thread pool
///
/// Each run opens its own store handle through `open`, so concurrent runs
/// never share a connection. The pipeline itself is shared read-only.
///
/// # Examples
///
/// ```no_run
/// use roster_pipeline::{AllocationRequest, Pipeline, PipelineWorker};
/// use roster_store::SqliteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let worker = PipelineWorker::new(Pipeline::default_config(), || {
///         SqliteStore::new("roster.db").map_err(|e| e.to_string())
///     });
///
///     let results = worker
///         .allocate_many(vec![
///             AllocationRequest::new("2024", 4),
///             AllocationRequest::new("2025", 5),
///         ])
///         .await;
///     for result in results {
///         println!("{}", result?.run_id);
///     }
///     Ok(())
/// }
/// ```
pub struct PipelineWorker<S> {
    pipeline: Arc<Pipeline>,
    open: Arc<StoreOpener<S>>,
}

impl<S> PipelineWorker<S>
where
    S: CohortSource + RunSink + 'static,
    <S as CohortSource>::Error: Display,
    <S as RunSink>::Error: Display,
{
    /// Create a worker from a pipeline and a store factory
    pub fn new<F>(pipeline: Pipeline, open: F) -> Self
    where
        F: Fn() -> Result<S, String> + Send + Sync + 'static,
    {
        Self {
            pipeline: Arc::new(pipeline),
            open: Arc::new(open),
        }
    }

    /// Shared pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run one allocation on a blocking thread
    pub async fn allocate(
        &self,
        request: AllocationRequest,
    ) -> Result<AllocationResult, PipelineError> {
        join(self.spawn(request)).await
    }

    /// Run several allocations in parallel
    ///
    /// Results come back in request order. One failing run does not affect
    /// the others.
    pub async fn allocate_many(
        &self,
        requests: Vec<AllocationRequest>,
    ) -> Vec<Result<AllocationResult, PipelineError>> {
        info!(runs = requests.len(), "Starting concurrent allocations");
        let handles: Vec<_> = requests.into_iter().map(|r| self.spawn(r)).collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(join(handle).await);
        }
        results
    }

    fn spawn(
        &self,
        request: AllocationRequest,
    ) -> JoinHandle<Result<AllocationResult, PipelineError>> {
        let pipeline = Arc::clone(&self.pipeline);
        let open = Arc::clone(&self.open);
        tokio::task::spawn_blocking(move || {
            debug!(cohort = %request.cohort, k = request.group_count, "Worker picked up request");
            let mut store = open().map_err(PipelineError::Persistence)?;
            pipeline.allocate(&mut store, &request)
        })
    }
}

async fn join(
    handle: JoinHandle<Result<AllocationResult, PipelineError>>,
) -> Result<AllocationResult, PipelineError> {
    handle
        .await
        .map_err(|e| PipelineError::Worker(format!("Task join error: {}", e)))?
}
