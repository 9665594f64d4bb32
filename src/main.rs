//! `lopt`: SEO rewriting for store product listings.
//!
//! Pulls one page of products from the store, sends each title and
//! description to a generative-language service, and writes the rewrite back
//! after keeping a draft backup. Processed pages and products are tracked in
//! JSON ledgers so repeated runs do not redo work.
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod ledger;
mod operator;
mod prompt;
mod rewrite;
mod store;
#[cfg(test)]
mod test_support;
mod workflow;

use cli::{Command, RootArgs};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let config_path = args.config.as_path();
    match &args.command {
        Command::Init(init) => workflow::run_init(init, config_path),
        Command::Pages(pages) => workflow::run_pages(pages, config_path),
        Command::Run(run) => workflow::run_run(run, config_path),
        Command::Product(product) => workflow::run_product(product, config_path),
        Command::Status(status) => workflow::run_status(status, config_path),
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects info over warn.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
