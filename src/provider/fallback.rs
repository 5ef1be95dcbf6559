// src/provider/fallback.rs — Primary/fallback model chain

use std::sync::Arc;

use super::{ChatRequest, ChatResponse, ModelProvider, ModelRef};
use crate::infra::config::ModelsConfig;
use crate::infra::errors::TripKoiError;

/// Ordered list of models tried for one generation call.
///
/// Holds no mutable state, so a single chain can serve concurrent requests.
pub struct FallbackChain {
    candidates: Vec<ModelRef>,
    providers: Vec<Arc<dyn ModelProvider>>,
}

impl FallbackChain {
    pub fn new(candidates: Vec<ModelRef>, providers: Vec<Arc<dyn ModelProvider>>) -> Self {
        Self {
            candidates,
            providers,
        }
    }

    /// Chain for a primary model and an optional fallback on the same provider.
    pub fn pair(
        provider: Arc<dyn ModelProvider>,
        primary: ModelRef,
        fallback: Option<ModelRef>,
    ) -> Self {
        let candidates = std::iter::once(primary).chain(fallback).collect();
        Self::new(candidates, vec![provider])
    }

    /// Chain described by the `[models]` config section.
    pub fn from_config(
        models: &ModelsConfig,
        provider: Arc<dyn ModelProvider>,
    ) -> Result<Self, TripKoiError> {
        let parse = |s: &str| {
            ModelRef::parse(s).ok_or_else(|| {
                TripKoiError::Config(format!("invalid model '{s}', expected provider/model"))
            })
        };
        let primary = parse(&models.primary)?;
        let fallback = models
            .fallback
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse)
            .transpose()?;
        Ok(Self::pair(provider, primary, fallback))
    }

    pub fn candidates(&self) -> &[ModelRef] {
        &self.candidates
    }

    /// Send the request to each candidate in order until one answers.
    ///
    /// Any backend failure moves on to the next candidate. Returns the model
    /// that produced the response alongside it.
    pub async fn chat(
        &self,
        mut request: ChatRequest,
    ) -> Result<(ModelRef, ChatResponse), TripKoiError> {
        let mut last_error: Option<TripKoiError> = None;

        for candidate in &self.candidates {
            let Some(provider) = self.providers.iter().find(|p| p.id() == candidate.provider)
            else {
                tracing::warn!(provider = %candidate.provider, "No provider registered for model");
                continue;
            };

            request.model = candidate.model.clone();
            match provider.chat(request.clone()).await {
                Ok(response) => return Ok((candidate.clone(), response)),
                Err(e) => {
                    tracing::warn!(
                        provider = %candidate.provider,
                        model = %candidate.model,
                        "Model failed, trying fallback: {}",
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(TripKoiError::AllModelsFailed {
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no usable model configured".into()),
        })
    }
}
