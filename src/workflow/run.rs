//! `lopt run` and `lopt product` entry points.
//!
//! Both resolve the model against the allow-list before any external call,
//! then hand off to the optimizer with a terminal notice sink.
use super::context::OptimizerContext;
use super::report::ProductReport;
use crate::cli::{ProductArgs, RunArgs};
use crate::operator::{page_summary, print_json, product_summary, TerminalNotices};
use crate::store::{Catalog, MAX_PAGE_SIZE};
use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// Optimize every product on one page.
pub fn run_run(args: &RunArgs, config_path: &Path) -> Result<()> {
    let mut ctx = OptimizerContext::load(config_path)?;
    let model = ctx.config.select_model(args.model.as_deref())?;

    // Already-processed pages short-circuit inside the optimizer without
    // touching the store, so only bound-check pages that will actually run.
    if !ctx.state.pages.contains(args.page) {
        let total_pages = ctx
            .store
            .count_pages(MAX_PAGE_SIZE)
            .context("could not retrieve the products list")?;
        if args.page > total_pages {
            return Err(anyhow!(
                "page {} is out of range (store has {total_pages} product pages)",
                args.page
            ));
        }
    }

    let mut notices = TerminalNotices::stderr();
    let report = ctx.optimizer(&model, &mut notices).process_page(args.page)?;

    if args.json {
        return print_json(&report);
    }
    for product in &report.products {
        println!("{}", product_summary(product.product_id, &product.outcome));
    }
    println!("{}", page_summary(&report));
    Ok(())
}

/// Optimize a single product, e.g. to retry one that failed earlier.
pub fn run_product(args: &ProductArgs, config_path: &Path) -> Result<()> {
    let mut ctx = OptimizerContext::load(config_path)?;
    let model = ctx.config.select_model(args.model.as_deref())?;

    let mut notices = TerminalNotices::stderr();
    let outcome = ctx.optimizer(&model, &mut notices).process_product(args.id);

    if args.json {
        return print_json(&ProductReport {
            product_id: args.id,
            outcome,
        });
    }
    println!("{}", product_summary(args.id, &outcome));
    Ok(())
}
