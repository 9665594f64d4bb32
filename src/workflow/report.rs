//! Structured results and operator notices emitted by the optimizer.
//!
//! The optimizer never prints. It pushes [`Notice`]s into a [`NoticeSink`]
//! as it goes and returns a report the caller can render or serialize.
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One progress message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Receives notices as the workflow progresses.
pub trait NoticeSink {
    fn notice(&mut self, notice: Notice);
}

impl NoticeSink for Vec<Notice> {
    fn notice(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// Step of the per-product pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Backup duplicate could not be created.
    Duplicate,
    /// Original product details could not be fetched.
    Fetch,
    /// Backup duplicate could not be retitled. Best-effort: never aborts.
    Rename,
    /// Rewrite service unreachable or returned no text.
    Rewrite,
    /// Rewrite text was not valid JSON.
    Parse,
    /// Rewrite JSON lacked `name` or `description`.
    Schema,
    /// Original product could not be updated.
    Update,
    /// Product ledger could not be persisted after a successful update.
    Ledger,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::Fetch => write!(f, "fetch"),
            Self::Rename => write!(f, "rename"),
            Self::Rewrite => write!(f, "rewrite"),
            Self::Parse => write!(f, "parse"),
            Self::Schema => write!(f, "schema"),
            Self::Update => write!(f, "update"),
            Self::Ledger => write!(f, "ledger"),
        }
    }
}

/// Result of running the pipeline for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProductOutcome {
    /// Product ID was already in the processed set; nothing was called.
    AlreadyProcessed,
    Optimized {
        duplicate_id: u64,
        name: String,
        edit_link: String,
        /// Set when retitling the backup duplicate failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        rename_error: Option<String>,
    },
    Failed {
        kind: FailureKind,
        error: String,
        /// Backup left behind as a draft, if one was created.
        #[serde(skip_serializing_if = "Option::is_none")]
        duplicate_id: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductReport {
    pub product_id: u64,
    #[serde(flatten)]
    pub outcome: ProductOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    /// Page number was already in the processed set; no store calls were made.
    AlreadyProcessed,
    /// Listing the page failed; nothing was recorded.
    ListingFailed { error: String },
    /// Listing succeeded but returned no products; nothing was recorded.
    Empty,
    /// Every listed product went through the pipeline and the page was recorded.
    Processed,
}

/// Result of the page-level driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub page: u32,
    #[serde(flatten)]
    pub status: PageStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<ProductReport>,
}

/// Per-outcome counts for a page summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageTally {
    pub optimized: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PageReport {
    pub fn tally(&self) -> PageTally {
        let mut tally = PageTally::default();
        for product in &self.products {
            match product.outcome {
                ProductOutcome::AlreadyProcessed => tally.skipped += 1,
                ProductOutcome::Optimized { .. } => tally.optimized += 1,
                ProductOutcome::Failed { .. } => tally.failed += 1,
            }
        }
        tally
    }
}
