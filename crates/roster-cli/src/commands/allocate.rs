//! Allocate command implementation.

use crate::cli::AllocateArgs;
use crate::commands::open_store;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use roster_pipeline::{AllocationRequest, Pipeline, PipelineWorker};
use roster_store::SqliteStore;
use tracing::info;

/// Execute the allocate command.
///
/// Several cohorts run in parallel, each on its own store connection.
pub async fn execute_allocate(
    args: AllocateArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let mut pipeline_config = config.pipeline.clone();
    if let Some(budget) = args.time_budget {
        pipeline_config.allocator.time_budget_secs = budget;
    }
    if let Some(seed) = args.seed {
        pipeline_config.allocator.seed = seed;
    }
    let pipeline = Pipeline::new(pipeline_config)?;

    // Creates the schema once before workers open their own connections
    drop(open_store(config)?);

    let requests: Vec<AllocationRequest> = args
        .cohorts
        .iter()
        .map(|cohort| {
            let request = AllocationRequest::new(cohort, args.groups);
            match args.policy {
                Some(policy) => request.with_policy(policy.into()),
                None => request,
            }
        })
        .collect();

    let database = config.database.clone();
    let worker = PipelineWorker::new(pipeline, move || {
        SqliteStore::new(&database).map_err(|e| e.to_string())
    });
    let results = worker.allocate_many(requests).await;

    let several = args.cohorts.len() > 1;
    let mut completed = Vec::new();
    let mut first_error = None;
    for (cohort, result) in args.cohorts.iter().zip(results) {
        match result {
            Ok(result) => {
                for message in result.diagnostics.messages() {
                    eprintln!("{}", formatter.warning(&format!("{}: {}", cohort, message)));
                }
                info!(cohort = %cohort, run_id = %result.run_id, "Allocation stored");
                completed.push(result);
            }
            Err(e) => {
                if several {
                    eprintln!("{}", formatter.error(&format!("{}: {}", cohort, e)));
                }
                first_error.get_or_insert(e);
            }
        }
    }

    if !completed.is_empty() {
        println!("{}", formatter.format_allocations(&completed)?);
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
