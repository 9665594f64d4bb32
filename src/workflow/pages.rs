//! Page listing for choosing what to run next.
use super::context::OptimizerContext;
use crate::cli::PagesArgs;
use crate::operator::print_json;
use crate::store::{Catalog, MAX_PAGE_SIZE};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct PageListing {
    pub total_pages: u32,
    pub pages: Vec<PageEntry>,
}

#[derive(Debug, Serialize)]
pub struct PageEntry {
    pub page: u32,
    pub processed: bool,
}

pub fn run_pages(args: &PagesArgs, config_path: &Path) -> Result<()> {
    let ctx = OptimizerContext::load(config_path)?;
    let total_pages = ctx
        .store
        .count_pages(MAX_PAGE_SIZE)
        .context("could not retrieve the products list")?;
    let listing = PageListing {
        total_pages,
        pages: (1..=total_pages)
            .map(|page| PageEntry {
                page,
                processed: ctx.state.pages.contains(page),
            })
            .collect(),
    };

    if args.json {
        return print_json(&listing);
    }
    if listing.total_pages == 0 {
        println!("store reports no published product pages");
        return Ok(());
    }
    for entry in &listing.pages {
        let mark = if entry.processed { "processed" } else { "pending" };
        println!("page {:>4}  {mark}", entry.page);
    }
    let done = listing.pages.iter().filter(|entry| entry.processed).count();
    println!("{done}/{} pages processed", listing.total_pages);
    Ok(())
}
