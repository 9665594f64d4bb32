//! Per-product pipeline and page-level driver.
//!
//! For each product not yet in the processed set:
//! duplicate -> fetch -> rename duplicate -> rewrite -> validate -> update -> record.
//! Failures are contained per product; a page is recorded once every listed
//! product has been attempted, whatever the individual outcomes.
use super::report::{
    FailureKind, Notice, NoticeLevel, NoticeSink, PageReport, PageStatus, ProductOutcome,
    ProductReport,
};
use crate::ledger::StateStore;
use crate::prompt::build_prompt;
use crate::rewrite::{RewriteError, RewriteResult, Rewriter};
use crate::store::{Catalog, ProductPatch, MAX_PAGE_SIZE};
use anyhow::{Context, Result};

/// Everything one optimization run needs, borrowed from the caller.
pub struct Optimizer<'a> {
    pub catalog: &'a dyn Catalog,
    pub rewriter: &'a dyn Rewriter,
    pub model: &'a str,
    pub state: &'a mut StateStore,
    pub notices: &'a mut dyn NoticeSink,
}

struct StepFailure {
    kind: FailureKind,
    error: String,
    duplicate_id: Option<u64>,
}

impl StepFailure {
    fn new(kind: FailureKind, error: impl Into<String>, duplicate_id: Option<u64>) -> Self {
        Self {
            kind,
            error: error.into(),
            duplicate_id,
        }
    }

    /// Map a store error for `kind`, keeping the full context chain.
    fn from_store(
        kind: FailureKind,
        duplicate_id: Option<u64>,
    ) -> impl FnOnce(anyhow::Error) -> Self {
        move |err| Self::new(kind, format!("{err:#}"), duplicate_id)
    }
}

impl Optimizer<'_> {
    /// Run the pipeline over every product on `page`, then record the page.
    ///
    /// Only persisting the page ledger can fail this call; product-level
    /// failures are reported in the returned [`PageReport`].
    pub fn process_page(&mut self, page: u32) -> Result<PageReport> {
        if self.state.pages.contains(page) {
            self.notify(
                NoticeLevel::Warning,
                format!("Product page {page} was already processed"),
            );
            return Ok(PageReport {
                page,
                status: PageStatus::AlreadyProcessed,
                products: Vec::new(),
            });
        }

        let products = match self.catalog.list_products(page, MAX_PAGE_SIZE) {
            Ok(products) => products,
            Err(err) => {
                let error = format!("{err:#}");
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not retrieve products on page {page}: {error}"),
                );
                return Ok(PageReport {
                    page,
                    status: PageStatus::ListingFailed { error },
                    products: Vec::new(),
                });
            }
        };
        if products.is_empty() {
            self.notify(
                NoticeLevel::Warning,
                format!("Product page {page} has no published products"),
            );
            return Ok(PageReport {
                page,
                status: PageStatus::Empty,
                products: Vec::new(),
            });
        }

        tracing::info!(page, count = products.len(), "processing page");
        let mut reports = Vec::with_capacity(products.len());
        for product in &products {
            let outcome = self.process_product(product.id);
            reports.push(ProductReport {
                product_id: product.id,
                outcome,
            });
        }

        self.state
            .pages
            .record(page)
            .with_context(|| format!("record processed page {page}"))?;
        self.notify(
            NoticeLevel::Success,
            format!("Product page {page} processed"),
        );
        Ok(PageReport {
            page,
            status: PageStatus::Processed,
            products: reports,
        })
    }

    /// Run the pipeline for one product ID, honoring the processed set.
    pub fn process_product(&mut self, product_id: u64) -> ProductOutcome {
        if self.state.products.contains(product_id) {
            self.notify(
                NoticeLevel::Warning,
                format!("Product {product_id} is already processed"),
            );
            return ProductOutcome::AlreadyProcessed;
        }

        match self.optimize_product(product_id) {
            Ok(outcome) => outcome,
            Err(failure) => {
                self.notify(
                    NoticeLevel::Error,
                    format!(
                        "Optimizing product {product_id} failed at {} step: {}",
                        failure.kind, failure.error
                    ),
                );
                self.log_error(product_id, failure.kind, &failure.error);
                ProductOutcome::Failed {
                    kind: failure.kind,
                    error: failure.error,
                    duplicate_id: failure.duplicate_id,
                }
            }
        }
    }

    fn optimize_product(&mut self, product_id: u64) -> Result<ProductOutcome, StepFailure> {
        self.notify(
            NoticeLevel::Info,
            format!(
                "Optimizing title and description of product {product_id} with {}",
                self.model
            ),
        );

        let duplicate = self
            .catalog
            .duplicate_product(product_id)
            .map_err(StepFailure::from_store(FailureKind::Duplicate, None))?;
        let duplicate_id = Some(duplicate.id);
        self.notify(
            NoticeLevel::Success,
            format!("Product {product_id} duplicated as draft {}", duplicate.id),
        );

        let product = self
            .catalog
            .get_product(product_id)
            .map_err(StepFailure::from_store(FailureKind::Fetch, duplicate_id))?;

        let rename_error = self.rename_duplicate(product_id, duplicate.id, &product.name);

        let prompt = build_prompt(&product.name, &product.description);
        let value = self
            .rewriter
            .optimize(self.model, &prompt)
            .map_err(|err| {
                let kind = match err {
                    RewriteError::Transport(_) => FailureKind::Rewrite,
                    RewriteError::Parse(_) => FailureKind::Parse,
                };
                StepFailure::new(kind, err.to_string(), duplicate_id)
            })?;
        let rewritten = RewriteResult::from_value(&value)
            .map_err(|err| StepFailure::new(FailureKind::Schema, err, duplicate_id))?;

        let patch = ProductPatch {
            name: Some(rewritten.name.clone()),
            description: Some(rewritten.description),
        };
        self.catalog
            .update_product(product_id, &patch)
            .map_err(StepFailure::from_store(FailureKind::Update, duplicate_id))?;

        self.state
            .products
            .record(product_id)
            .map_err(StepFailure::from_store(FailureKind::Ledger, duplicate_id))?;

        let edit_link = self.catalog.edit_link(product_id);
        self.notices.notice(
            Notice::new(
                NoticeLevel::Success,
                format!("SEO optimization of product {product_id} succeeded"),
            )
            .with_link(edit_link.clone()),
        );
        Ok(ProductOutcome::Optimized {
            duplicate_id: duplicate.id,
            name: rewritten.name,
            edit_link,
            rename_error,
        })
    }

    /// Retitle the backup to `"{id} -- {title}"`. Best-effort: a failure is
    /// surfaced and logged but the pipeline carries on.
    fn rename_duplicate(
        &mut self,
        product_id: u64,
        duplicate_id: u64,
        title: &str,
    ) -> Option<String> {
        let patch = ProductPatch::rename(format!("{product_id} -- {title}"));
        match self.catalog.update_product(duplicate_id, &patch) {
            Ok(_) => {
                self.notify(
                    NoticeLevel::Success,
                    format!("Draft {duplicate_id} retitled to reference product {product_id}"),
                );
                None
            }
            Err(err) => {
                let error = format!("draft {duplicate_id}: {err:#}");
                tracing::warn!(product_id, duplicate_id, "rename of duplicate failed");
                self.notify(
                    NoticeLevel::Warning,
                    format!(
                        "Could not retitle draft {duplicate_id} of product {product_id}; \
                         continuing"
                    ),
                );
                self.log_error(product_id, FailureKind::Rename, &error);
                Some(error)
            }
        }
    }

    fn log_error(&mut self, product_id: u64, kind: FailureKind, error: &str) {
        let message = format!("{product_id} >> {kind} failed: {error}");
        if let Err(err) = self.state.log.append(&message) {
            let detail = format!("{err:#}");
            tracing::warn!(product_id, error = %detail, "could not write error log");
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.notice(Notice::new(level, message));
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
