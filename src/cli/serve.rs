// src/cli/serve.rs — `tripkoi serve`: run the HTTP API

use crate::api::{self, ApiState};
use crate::core::orchestrator::Orchestrator;
use crate::infra::config::Config;
use crate::infra::errors::TripKoiError;

pub async fn run_serve(host: Option<String>, port: Option<u16>, config: &Config) -> anyhow::Result<()> {
    let mut api_config = config.api.clone();
    if let Some(host) = host {
        api_config.host = host;
    }
    if let Some(port) = port {
        api_config.port = port;
    }

    // Without a key the server still answers health and weather checks.
    let state = match Orchestrator::from_config(config) {
        Ok(orchestrator) => ApiState::new(orchestrator),
        Err(TripKoiError::NoProvider) => {
            tracing::warn!("{}", TripKoiError::NoProvider);
            ApiState::default()
        }
        Err(e) => return Err(e.into()),
    };

    eprintln!(
        "[serve] http://{}:{}/api/v1 (models: {})",
        api_config.host,
        api_config.port,
        std::iter::once(config.models.primary.as_str())
            .chain(config.models.fallback.as_deref())
            .collect::<Vec<_>>()
            .join(" → ")
    );
    api::start_server(&api_config, state).await
}
