//! Command implementations.

pub mod allocate;
pub mod analyze;
pub mod import;
pub mod reallocate;
pub mod runs;
pub mod show;

pub use self::allocate::execute_allocate;
pub use self::analyze::execute_analyze;
pub use self::import::execute_import;
pub use self::reallocate::execute_reallocate;
pub use self::runs::execute_runs;
pub use self::show::execute_show;

use crate::config::Config;
use crate::error::{CliError, Result};
use roster_domain::RunId;
use roster_store::SqliteStore;
use std::fs;

/// Open the configured database, creating its directory on first use.
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    if let Some(parent) = config.database.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(SqliteStore::new(&config.database)?)
}

/// Parse a run id argument.
pub fn parse_run_id(input: &str) -> Result<RunId> {
    RunId::from_string(input.trim())
        .map_err(|e| CliError::InvalidInput(format!("Invalid run ID '{}': {}", input, e)))
}
