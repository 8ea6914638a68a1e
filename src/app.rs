use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;

use crate::{
    api,
    classification::LexiconSet,
    config::Config,
    observability::Telemetry,
    pipeline::PipelineOrchestrator,
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    pipeline: Arc<PipelineOrchestrator>,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn pipeline(&self) -> Arc<PipelineOrchestrator> {
        Arc::clone(&self.registry.pipeline)
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        self.registry.config.request_timeout()
    }
}

impl ComponentRegistry {
    /// Loads the lexicon and the bias model and wires them into a ready pipeline.
    ///
    /// Model loading reads weights from disk; call this before the server starts
    /// accepting requests.
    ///
    /// # Errors
    /// Fails if telemetry cannot be initialized, the lexicon is missing or
    /// malformed, or the model artifact cannot be loaded.
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new()?;
        let lexicons =
            LexiconSet::load(config.lexicon_path()).context("failed to load keyword lexicon")?;
        let pipeline = PipelineOrchestrator::initialize(&lexicons, &config.model_settings())
            .with_context(|| {
                format!(
                    "failed to initialize headline pipeline from {}",
                    config.model_path().display()
                )
            })?
            .with_metrics(telemetry.metrics_arc());

        Ok(Self {
            config,
            telemetry,
            pipeline: Arc::new(pipeline),
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn pipeline(&self) -> Arc<PipelineOrchestrator> {
        Arc::clone(&self.pipeline)
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}
