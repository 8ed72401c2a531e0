use std::path::PathBuf;
use std::sync::Arc;

use completion_client::{Completion, OpenAiClient};
use missionfit_core::config::Config;
use missionfit_core::plan::PlanGenerator;
use missionfit_core::store::{self, TaskStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub store: Arc<dyn TaskStore>,
    pub planner: PlanGenerator,
}

impl AppState {
    pub fn new(root: PathBuf, store: Arc<dyn TaskStore>, client: Arc<dyn Completion>) -> Self {
        Self {
            root,
            store,
            planner: PlanGenerator::new(client),
        }
    }

    /// Open the configured task store and completion client for `root`.
    pub fn from_config(root: PathBuf, config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn TaskStore> = Arc::from(store::open(config, &root)?);
        let client = OpenAiClient::new(config.completion.client_settings())?;
        if client.settings().api_key.is_none() {
            tracing::warn!(
                "{} is not set; /api/motivate and /api/mealprep will return degraded results",
                config.completion.api_key_env
            );
        }
        Ok(Self::new(root, store, Arc::new(client)))
    }
}
