//! Show command implementation.

use crate::cli::ShowArgs;
use crate::commands::{open_store, parse_run_id};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use roster_pipeline::Pipeline;

/// Execute the show command.
pub fn execute_show(args: ShowArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let run_id = parse_run_id(&args.run)?;

    let pipeline = Pipeline::new(config.pipeline.clone())?;
    let store = open_store(config)?;
    let record = pipeline.load(&store, run_id)?;

    println!("{}", formatter.format_record(&record)?);
    Ok(())
}
