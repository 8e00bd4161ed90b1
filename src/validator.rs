//! Second LLM pass: confirm an extracted prediction against its source.
//!
//! The validation prompt restates the four acceptance criteria (authorship,
//! genuineness, explicit time frame, personal judgment rather than official
//! plan) together with the candidate and the full archive text, and asks for
//! a bare Yes/No.

use crate::api::AskAsync;
use crate::cache::{ContentCache, Namespace, fingerprint_json};
use crate::fetcher::{Fetcher, ReadService};
use crate::models::PredictionRecord;
use crate::prompts::validation_prompt;
use crate::utils::truncate_for_log;
use tracing::{debug, error, info, instrument, warn};

/// True if the model's reply contains an affirmative anywhere.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().to_lowercase().contains("yes")
}

pub struct Validator<'a, S, A> {
    fetcher: &'a Fetcher<S>,
    cache: ContentCache,
    model: A,
}

impl<'a, S, A> Validator<'a, S, A>
where
    S: ReadService,
    A: AskAsync<Response = String>,
{
    pub fn new(fetcher: &'a Fetcher<S>, cache: ContentCache, model: A) -> Self {
        Self {
            fetcher,
            cache,
            model,
        }
    }

    /// Whether `record` holds up against the text it was extracted from.
    ///
    /// Unreadable sources and failed requests count as rejection; only real
    /// verdicts are cached.
    #[instrument(level = "info", skip_all, fields(url = %record.url))]
    pub async fn validate(&self, record: &PredictionRecord) -> bool {
        let Some(content) = self
            .fetcher
            .fetch(&record.url)
            .await
            .filter(|text| !text.is_empty())
        else {
            debug!("Source unavailable; rejecting");
            return false;
        };

        let key = match fingerprint_json(record) {
            Ok(key) => key,
            Err(e) => {
                error!(error = %e, "Could not fingerprint prediction");
                return false;
            }
        };

        match self.cache.get_json::<bool>(Namespace::Validation, &key).await {
            Ok(Some(verdict)) => {
                debug!(verdict, "Using cached verdict");
                return verdict;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Validation cache unreadable; asking again"),
        }

        let answer = match self.model.ask(&validation_prompt(record, &content)).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "Error validating prediction");
                return false;
            }
        };

        let verdict = is_affirmative(&answer);
        info!(
            verdict,
            answer = %truncate_for_log(answer.trim(), 40),
            "Validated prediction"
        );

        if let Err(e) = self.cache.put_json(Namespace::Validation, &key, &verdict).await {
            warn!(error = %e, "Failed to cache verdict");
        }
        verdict
    }
}
