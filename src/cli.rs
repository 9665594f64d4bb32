//! CLI argument parsing for the listing optimizer.
//!
//! The CLI is thin: it selects a page, product, or model and hands off to the
//! workflow, which stays usable without any terminal attached.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "lopt.json";

/// Root CLI entrypoint for the optimizer.
#[derive(Parser, Debug)]
#[command(
    name = "lopt",
    version,
    about = "SEO rewriting for store product listings",
    after_help = "Commands:\n  init                    Write a config stub (lopt.json)\n  pages                   List product pages and whether they were processed\n  run --page <N>          Optimize every product on one page\n  product --id <ID>       Optimize a single product\n  status                  Summarize processed pages, products, and logged errors\n\nExamples:\n  lopt init\n  lopt pages\n  lopt run --page 3 --model gemini-1.5-flash\n  lopt product --id 4182 --json\n  lopt status",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Path to the JSON config file
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "LOPT_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Emit info-level diagnostics on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Pages(PagesArgs),
    Run(RunArgs),
    Product(ProductArgs),
    Status(StatusArgs),
}

/// Init command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write a config stub")]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "List product pages and their processed state")]
pub struct PagesArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Run command inputs for the page-level driver.
#[derive(Parser, Debug)]
#[command(about = "Optimize every product on one page")]
pub struct RunArgs {
    /// 1-based product page number
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Model identifier from the configured allow-list (defaults to the first)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Emit the page report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Product command inputs for a manual single-product rerun.
#[derive(Parser, Debug)]
#[command(about = "Optimize a single product by ID")]
pub struct ProductArgs {
    /// Store product ID
    #[arg(long, value_name = "ID")]
    pub id: u64,

    /// Model identifier from the configured allow-list (defaults to the first)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Emit the product outcome as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Summarize processed pages, products, and logged errors")]
pub struct StatusArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Number of recent error-log entries to show
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub recent: usize,
}
