//! Processed-page and processed-product ledgers plus the JSON error log.
//!
//! Each ledger is a flat JSON document (`{"page_ids": [...]}` or
//! `{"product_ids": [...]}`) loaded fully into memory and rewritten in full
//! after every insertion. Entries are never removed. A missing file is an
//! empty ledger; a malformed one is an error.
use crate::config::StatePaths;
use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// On-disk document shape for a ledger of integer IDs.
pub trait LedgerDoc: Serialize + DeserializeOwned {
    type Id: Copy + Ord + std::fmt::Debug + std::fmt::Display;

    const LABEL: &'static str;

    fn from_ids(ids: Vec<Self::Id>) -> Self;
    fn into_ids(self) -> Vec<Self::Id>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagesDoc {
    pub page_ids: Vec<u32>,
}

impl LedgerDoc for PagesDoc {
    type Id = u32;
    const LABEL: &'static str = "pages";

    fn from_ids(ids: Vec<u32>) -> Self {
        Self { page_ids: ids }
    }

    fn into_ids(self) -> Vec<u32> {
        self.page_ids
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductsDoc {
    pub product_ids: Vec<u64>,
}

impl LedgerDoc for ProductsDoc {
    type Id = u64;
    const LABEL: &'static str = "products";

    fn from_ids(ids: Vec<u64>) -> Self {
        Self { product_ids: ids }
    }

    fn into_ids(self) -> Vec<u64> {
        self.product_ids
    }
}

/// An append-only set of processed IDs backed by one JSON file.
#[derive(Debug)]
pub struct Ledger<D: LedgerDoc> {
    path: PathBuf,
    order: Vec<D::Id>,
    members: BTreeSet<D::Id>,
}

pub type PageLedger = Ledger<PagesDoc>;
pub type ProductLedger = Ledger<ProductsDoc>;

impl<D: LedgerDoc> Ledger<D> {
    /// Load the ledger at `path`, collapsing duplicate IDs in file order.
    pub fn load(path: &Path) -> Result<Self> {
        let mut ledger = Self {
            path: path.to_path_buf(),
            order: Vec::new(),
            members: BTreeSet::new(),
        };
        let Some(doc) = read_json_optional::<D>(path)
            .with_context(|| format!("load {} ledger", D::LABEL))?
        else {
            return Ok(ledger);
        };
        for id in doc.into_ids() {
            if ledger.members.insert(id) {
                ledger.order.push(id);
            }
        }
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: D::Id) -> bool {
        self.members.contains(&id)
    }

    /// IDs in the order they were first recorded.
    pub fn ids(&self) -> &[D::Id] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Record `id` and persist the whole ledger. Returns false if it was
    /// already present, in which case nothing is written. The in-memory set
    /// only changes once the file has been replaced.
    pub fn record(&mut self, id: D::Id) -> Result<bool> {
        if self.members.contains(&id) {
            return Ok(false);
        }
        let mut ids = self.order.clone();
        ids.push(id);
        write_json_atomic(&self.path, &D::from_ids(ids))
            .with_context(|| format!("persist {} ledger after recording {id}", D::LABEL))?;
        self.members.insert(id);
        self.order.push(id);
        Ok(true)
    }
}

/// One entry of the JSON error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: String,
    pub message: String,
}

/// Append-only error log stored as a JSON array.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in append order.
    pub fn entries(&self) -> Result<Vec<ErrorLogEntry>> {
        let entries = read_json_optional::<Vec<ErrorLogEntry>>(&self.path)
            .context("load error log")?
            .unwrap_or_default();
        Ok(entries)
    }

    /// Append a message stamped with the current local time.
    pub fn append(&self, message: &str) -> Result<ErrorLogEntry> {
        let entry = ErrorLogEntry {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            message: message.to_string(),
        };
        let mut entries = self.entries()?;
        entries.push(entry.clone());
        write_json_atomic(&self.path, &entries).context("persist error log")?;
        Ok(entry)
    }
}

/// The two processed sets plus the error log, loaded together at startup.
#[derive(Debug)]
pub struct StateStore {
    pub pages: PageLedger,
    pub products: ProductLedger,
    pub log: ErrorLog,
}

impl StateStore {
    pub fn load(paths: &StatePaths) -> Result<Self> {
        Ok(Self {
            pages: PageLedger::load(&paths.pages)?,
            products: ProductLedger::load(&paths.products)?,
            log: ErrorLog::new(paths.log.clone()),
        })
    }
}

fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(value))
}

/// Pretty-print with 4-space indentation and swap the file in atomically.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    value
        .serialize(&mut serializer)
        .with_context(|| format!("serialize {}", path.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(&bytes)
        .with_context(|| format!("write {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
