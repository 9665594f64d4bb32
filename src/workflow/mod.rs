//! Workflow orchestration for the listing optimizer.
//!
//! `pipeline` holds the interface-agnostic optimizer; the remaining modules
//! are thin command entry points that load context and render results.
mod context;
mod init;
mod pages;
mod pipeline;
pub(crate) mod report;
mod run;
mod status;

pub use init::run_init;
pub use pages::run_pages;
pub use run::{run_product, run_run};
pub use status::run_status;
