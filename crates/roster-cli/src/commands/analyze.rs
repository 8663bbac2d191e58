//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::commands::{open_store, parse_run_id};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use roster_pipeline::Pipeline;

/// Execute the analyze command.
pub fn execute_analyze(args: AnalyzeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let run_id = args.run.as_deref().map(parse_run_id).transpose()?;

    let pipeline = Pipeline::new(config.pipeline.clone())?;
    let store = open_store(config)?;
    let analysis = pipeline.analyze(&store, run_id)?;

    println!("{}", formatter.format_analysis(&analysis)?);
    Ok(())
}
