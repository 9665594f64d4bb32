//! Workflow init step.
//!
//! Init writes a config stub; credentials are filled in by hand or supplied
//! through the environment.
use crate::cli::InitArgs;
use crate::config::{self, ENV_REWRITE_API_KEY, ENV_STORE_KEY, ENV_STORE_SECRET};
use anyhow::Result;
use std::path::Path;

/// Run the init step, creating a config stub at `config_path`.
pub fn run_init(args: &InitArgs, config_path: &Path) -> Result<()> {
    config::write_config_stub(config_path, args.force)?;
    println!("wrote {}", config_path.display());
    println!(
        "next: set store.base_url, then fill credentials in the file or export \
         {ENV_STORE_KEY}, {ENV_STORE_SECRET}, and {ENV_REWRITE_API_KEY}"
    );
    Ok(())
}
