//! Reallocate command implementation.

use crate::cli::ReallocateArgs;
use crate::commands::{open_store, parse_run_id};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use roster_domain::{GroupId, MemberId};
use roster_pipeline::Pipeline;

/// Execute the reallocate command.
pub fn execute_reallocate(
    args: ReallocateArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let run_id = parse_run_id(&args.run)?;
    let member: MemberId = args.member.parse().map_err(CliError::InvalidInput)?;
    let from = parse_group(&args.from)?;
    let to = parse_group(&args.to)?;

    let pipeline = Pipeline::new(config.pipeline.clone())?;
    let mut store = open_store(config)?;
    let result = pipeline.reallocate(&mut store, run_id, member, from, to)?;

    println!("{}", formatter.format_reallocation(&result)?);
    Ok(())
}

/// Parse a group label such as `2`, `Group 2` or `Classroom_2`.
fn parse_group(input: &str) -> Result<GroupId> {
    GroupId::parse(input)
        .ok_or_else(|| CliError::InvalidInput(format!("Invalid group '{}'", input)))
}
