//! First LLM pass: pull dated author predictions out of a monthly archive.
//!
//! The archive text is appended to [`EXTRACTION_INSTRUCTIONS`] and the model
//! answers with `{"predictions": [...]}`. Each element gets its provenance
//! (`url`, `publish_date`) attached, and anything whose date bounds the model
//! could not resolve is dropped before the result is cached.
//!
//! Failures (unreadable page, API error, unparseable reply) degrade to an
//! empty list and are not cached, so the next run tries again.

use crate::api::AskAsync;
use crate::archive::ArchiveSite;
use crate::cache::{ContentCache, Namespace, fingerprint};
use crate::fetcher::{Fetcher, ReadService};
use crate::models::{ExtractionResponse, PredictionRecord};
use crate::prompts::EXTRACTION_INSTRUCTIONS;
use crate::utils::{looks_truncated, truncate_for_log};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};

pub struct Extractor<'a, S, A> {
    fetcher: &'a Fetcher<S>,
    cache: ContentCache,
    model: A,
    site: &'a ArchiveSite,
}

impl<'a, S, A> Extractor<'a, S, A>
where
    S: ReadService,
    A: AskAsync<Response = String>,
{
    pub fn new(fetcher: &'a Fetcher<S>, cache: ContentCache, model: A, site: &'a ArchiveSite) -> Self {
        Self {
            fetcher,
            cache,
            model,
            site,
        }
    }

    /// Predictions with resolved date bounds found in the archive at `url`.
    #[instrument(level = "info", skip(self))]
    pub async fn extract(&self, url: &str) -> Vec<PredictionRecord> {
        let Some(content) = self.fetcher.fetch(url).await else {
            debug!("No content for archive; nothing to extract");
            return Vec::new();
        };
        if content.is_empty() {
            debug!("Archive text is empty; nothing to extract");
            return Vec::new();
        }

        let key = fingerprint(url);
        match self
            .cache
            .get_json::<Vec<PredictionRecord>>(Namespace::Predictions, &key)
            .await
        {
            Ok(Some(cached)) => {
                debug!(count = cached.len(), "Using cached predictions");
                return cached;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Prediction cache unreadable; re-extracting"),
        }

        let publish_date = self.site.publish_date(url);
        let predictions = match self.ask_for_predictions(&content).await {
            Ok(response) => response.predictions,
            Err(e) => {
                error!(error = %e, "Error extracting predictions");
                return Vec::new();
            }
        };

        let total = predictions.len();
        let kept: Vec<PredictionRecord> = predictions
            .into_iter()
            .map(|mut prediction| {
                prediction.url = url.to_string();
                prediction.publish_date = publish_date.clone();
                prediction
            })
            .filter(PredictionRecord::has_resolved_bounds)
            .collect();

        info!(
            candidates = total,
            kept = kept.len(),
            %publish_date,
            "Extracted predictions"
        );

        if let Err(e) = self.cache.put_json(Namespace::Predictions, &key, &kept).await {
            warn!(error = %e, "Failed to cache extracted predictions");
        }
        kept
    }

    /// Ask the model, re-asking once if the reply looks cut off.
    async fn ask_for_predictions(&self, content: &str) -> Result<ExtractionResponse, Box<dyn Error>> {
        let prompt = format!("{EXTRACTION_INSTRUCTIONS}{content}");

        let reply = self.model.ask(&prompt).await?;
        match serde_json::from_str::<ExtractionResponse>(&reply) {
            Ok(parsed) => Ok(parsed),
            Err(e) if looks_truncated(&e) => {
                warn!(error = %e, "EOF while parsing; re-asking once");
                let retry = self.model.ask(&prompt).await?;
                serde_json::from_str(&retry).map_err(|e| {
                    warn!(response_preview = %truncate_for_log(&retry, 300), "Re-ask also non-conforming");
                    e.into()
                })
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&reply, 300),
                    "Model returned non-conforming JSON"
                );
                Err(e.into())
            }
        }
    }
}
