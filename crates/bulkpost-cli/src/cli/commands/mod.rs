//! CLI command handlers, one per file.

mod config;
mod results;
mod run;

pub use config::run_config;
pub use results::run_results;
pub use run::{run_batch, RunOverrides};
