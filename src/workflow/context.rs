use super::pipeline::Optimizer;
use super::report::NoticeSink;
use crate::config::{self, AppConfig};
use crate::ledger::StateStore;
use crate::rewrite::GeminiClient;
use crate::store::StoreClient;
use anyhow::Result;
use std::path::Path;

/// Config, persisted state, and live clients for one CLI invocation.
pub(crate) struct OptimizerContext {
    pub(crate) config: AppConfig,
    pub(crate) state: StateStore,
    pub(crate) store: StoreClient,
    pub(crate) rewriter: GeminiClient,
}

impl OptimizerContext {
    pub(crate) fn load(config_path: &Path) -> Result<Self> {
        let config = config::load_config(config_path)?;
        let paths = config.state_paths(config::config_dir(config_path));
        let state = StateStore::load(&paths)?;
        let store = StoreClient::new(&config.store);
        let rewriter = GeminiClient::new(&config.rewrite);
        tracing::debug!(
            pages = state.pages.len(),
            products = state.products.len(),
            "loaded processed state"
        );
        Ok(Self {
            config,
            state,
            store,
            rewriter,
        })
    }

    pub(crate) fn optimizer<'a>(
        &'a mut self,
        model: &'a str,
        notices: &'a mut dyn NoticeSink,
    ) -> Optimizer<'a> {
        Optimizer {
            catalog: &self.store,
            rewriter: &self.rewriter,
            model,
            state: &mut self.state,
            notices,
        }
    }
}
