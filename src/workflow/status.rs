//! Workflow status step.
//!
//! Status reads only local state, so it works before credentials are set.
use crate::cli::StatusArgs;
use crate::config;
use crate::ledger::{ErrorLogEntry, StateStore};
use crate::operator::print_json;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub pages_file: PathBuf,
    pub processed_pages: Vec<u32>,
    pub products_file: PathBuf,
    pub processed_products: Vec<u64>,
    pub log_file: PathBuf,
    pub error_count: usize,
    pub recent_errors: Vec<ErrorLogEntry>,
}

/// Build a status summary from the state files named by the config.
pub fn status_summary(config_path: &Path, recent: usize) -> Result<StatusSummary> {
    let config = config::read_config(config_path)?;
    let paths = config.state_paths(config::config_dir(config_path));
    let state = StateStore::load(&paths)?;
    let entries = state.log.entries()?;
    let skip = entries.len().saturating_sub(recent);
    Ok(StatusSummary {
        pages_file: state.pages.path().to_path_buf(),
        processed_pages: state.pages.ids().to_vec(),
        products_file: state.products.path().to_path_buf(),
        processed_products: state.products.ids().to_vec(),
        log_file: state.log.path().to_path_buf(),
        error_count: entries.len(),
        recent_errors: entries.into_iter().skip(skip).collect(),
    })
}

pub fn run_status(args: &StatusArgs, config_path: &Path) -> Result<()> {
    let summary = status_summary(config_path, args.recent)?;
    if args.json {
        return print_json(&summary);
    }
    println!(
        "pages processed: {} ({})",
        summary.processed_pages.len(),
        join_ids(&summary.processed_pages)
    );
    println!(
        "products optimized: {} ({})",
        summary.processed_products.len(),
        join_ids(&summary.processed_products)
    );
    println!("errors logged: {}", summary.error_count);
    for entry in &summary.recent_errors {
        println!("  {}  {}", entry.timestamp, entry.message);
    }
    Ok(())
}

fn join_ids<T: ToString>(ids: &[T]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
