//! Terminal rendering for notices and reports.
//!
//! Notices stream to stderr as they arrive so long pages show progress;
//! machine-readable reports go to stdout.
use crate::workflow::report::{
    Notice, NoticeLevel, NoticeSink, PageReport, PageStatus, ProductOutcome,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// Writes each notice as a tagged line.
pub struct TerminalNotices<W: Write> {
    out: W,
}

impl TerminalNotices<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> TerminalNotices<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NoticeSink for TerminalNotices<W> {
    fn notice(&mut self, notice: Notice) {
        let mut line = format!("{} {}", level_tag(notice.level), notice.message);
        if let Some(link) = &notice.link {
            line.push_str(&format!("\n       edit: {link}"));
        }
        if let Err(err) = writeln!(self.out, "{line}") {
            tracing::warn!(error = %err, "could not write notice");
        }
    }
}

fn level_tag(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "[info] ",
        NoticeLevel::Success => "[ok]   ",
        NoticeLevel::Warning => "[warn] ",
        NoticeLevel::Error => "[error]",
    }
}

/// One-line page summary for the end of a run.
pub fn page_summary(report: &PageReport) -> String {
    match &report.status {
        PageStatus::AlreadyProcessed => {
            format!("page {}: already processed, nothing to do", report.page)
        }
        PageStatus::ListingFailed { error } => {
            format!("page {}: listing failed ({error}); not recorded", report.page)
        }
        PageStatus::Empty => format!("page {}: no published products; not recorded", report.page),
        PageStatus::Processed => {
            let tally = report.tally();
            format!(
                "page {}: {} optimized, {} skipped, {} failed; page recorded",
                report.page, tally.optimized, tally.skipped, tally.failed
            )
        }
    }
}

pub fn product_summary(product_id: u64, outcome: &ProductOutcome) -> String {
    match outcome {
        ProductOutcome::AlreadyProcessed => format!("product {product_id}: already processed"),
        ProductOutcome::Optimized {
            duplicate_id,
            edit_link,
            rename_error,
            ..
        } => {
            let mut text = format!(
                "product {product_id}: optimized (backup draft {duplicate_id}) {edit_link}"
            );
            if rename_error.is_some() {
                text.push_str("; backup draft was not retitled");
            }
            text
        }
        ProductOutcome::Failed { kind, error, .. } => {
            format!("product {product_id}: {kind} failed: {error}")
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize report")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::report::{FailureKind, ProductReport};

    #[test]
    fn notices_render_with_level_tags_and_links() {
        let mut sink = TerminalNotices::new(Vec::new());
        sink.notice(Notice::new(NoticeLevel::Warning, "Product 5 is already processed"));
        sink.notice(
            Notice::new(NoticeLevel::Success, "SEO optimization of product 6 succeeded")
                .with_link("https://shop.example/wp-admin/post.php?post=6&action=edit"),
        );
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "[warn]  Product 5 is already processed\n\
             [ok]    SEO optimization of product 6 succeeded\n       \
             edit: https://shop.example/wp-admin/post.php?post=6&action=edit\n"
        );
    }

    #[test]
    fn page_summary_counts_outcomes() {
        let report = PageReport {
            page: 2,
            status: PageStatus::Processed,
            products: vec![
                ProductReport {
                    product_id: 1,
                    outcome: ProductOutcome::AlreadyProcessed,
                },
                ProductReport {
                    product_id: 2,
                    outcome: ProductOutcome::Failed {
                        kind: FailureKind::Update,
                        error: "HTTP 500".to_string(),
                        duplicate_id: Some(9),
                    },
                },
            ],
        };
        assert_eq!(
            page_summary(&report),
            "page 2: 0 optimized, 1 skipped, 1 failed; page recorded"
        );
        assert_eq!(
            product_summary(2, &report.products[1].outcome),
            "product 2: update failed: HTTP 500"
        );
    }

    #[test]
    fn report_json_flattens_tags() {
        let report = PageReport {
            page: 1,
            status: PageStatus::Processed,
            products: vec![ProductReport {
                product_id: 101,
                outcome: ProductOutcome::Failed {
                    kind: FailureKind::Schema,
                    error: "missing".to_string(),
                    duplicate_id: None,
                },
            }],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "page": 1,
                "status": "processed",
                "products": [
                    { "product_id": 101, "outcome": "failed", "kind": "schema", "error": "missing" }
                ]
            })
        );
    }
}
