//! `bulkpost config` – print the effective configuration.

use anyhow::Result;
use bulkpost_core::config::{self, BulkConfig};

pub fn run_config(cfg: &BulkConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    if let Err(e) = cfg.validate() {
        println!("# warning: {e}");
    }
    Ok(())
}
