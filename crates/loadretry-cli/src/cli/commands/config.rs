//! `loadretry config` – show config path and effective values.

use anyhow::Result;
use loadretry_core::config::{self, LoadRetryConfig};

pub fn run_config(cfg: &LoadRetryConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", cfg.to_toml()?);
    Ok(())
}
