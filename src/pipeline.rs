//! Pipeline driver: archive listing → extraction → validation → output.
//!
//! Everything runs one step at a time. Months are processed in the order the
//! archive index lists them, predictions in the order they were extracted,
//! so the output is deterministic for deterministic upstream answers.

use crate::api::AskAsync;
use crate::archive::{ArchiveSite, list_months};
use crate::extractor::Extractor;
use crate::fetcher::{Fetcher, ReadService};
use crate::models::PredictionRecord;
use crate::outputs::json;
use crate::validator::Validator;
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub months: usize,
    pub candidates: usize,
    pub validated: usize,
}

/// Extract from every month in order and concatenate the results.
#[instrument(level = "info", skip_all, fields(months = months.len()))]
pub async fn collect_predictions<S, A>(
    extractor: &Extractor<'_, S, A>,
    months: &[String],
) -> Vec<PredictionRecord>
where
    S: ReadService,
    A: AskAsync<Response = String>,
{
    stream::iter(months)
        .then(|month| extractor.extract(month))
        .concat()
        .await
}

/// Keep only the candidates the validator accepts, preserving order.
#[instrument(level = "info", skip_all, fields(candidates = candidates.len()))]
pub async fn keep_validated<S, A>(
    validator: &Validator<'_, S, A>,
    candidates: Vec<PredictionRecord>,
) -> Vec<PredictionRecord>
where
    S: ReadService,
    A: AskAsync<Response = String>,
{
    stream::iter(candidates)
        .filter_map(|prediction| async move {
            validator.validate(&prediction).await.then_some(prediction)
        })
        .collect()
        .await
}

/// Run the whole pipeline and overwrite `output` with the validated list.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub async fn run<S, E, V>(
    fetcher: &Fetcher<S>,
    site: &ArchiveSite,
    extractor: &Extractor<'_, S, E>,
    validator: &Validator<'_, S, V>,
    output: &Path,
) -> Result<RunSummary, Box<dyn Error>>
where
    S: ReadService,
    E: AskAsync<Response = String>,
    V: AskAsync<Response = String>,
{
    let months = list_months(fetcher, site).await;

    let candidates = collect_predictions(extractor, &months).await;
    let candidate_count = candidates.len();
    info!(count = candidate_count, "Collected candidate predictions");

    let validated = keep_validated(validator, candidates).await;
    info!(
        candidates = candidate_count,
        validated = validated.len(),
        "Validation complete"
    );

    json::write_predictions(&validated, output).await?;

    Ok(RunSummary {
        months: months.len(),
        candidates: candidate_count,
        validated: validated.len(),
    })
}
