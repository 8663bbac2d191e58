//! Runs command implementation.

use crate::cli::RunsArgs;
use crate::commands::open_store;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use roster_pipeline::Pipeline;

/// Execute the runs command.
pub fn execute_runs(args: RunsArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let pipeline = Pipeline::new(config.pipeline.clone())?;
    let store = open_store(config)?;

    let mut runs = pipeline.runs(&store, args.cohort.as_deref())?;
    if let Some(limit) = args.limit {
        runs.truncate(limit);
    }

    println!("{}", formatter.format_runs(&runs)?);
    Ok(())
}
