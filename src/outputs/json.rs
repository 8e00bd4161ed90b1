//! JSON output for validated predictions.
//!
//! The whole validated list is written as one pretty-printed JSON array,
//! replacing whatever a previous run left at the same path. Non-ASCII text in
//! quotes is written verbatim, not escaped.

use crate::models::PredictionRecord;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `predictions` to `path`, creating the parent directory if needed.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = predictions.len()))]
pub async fn write_predictions(
    predictions: &[PredictionRecord],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(predictions)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote validated predictions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quote: &str) -> PredictionRecord {
        PredictionRecord {
            paraphrased_prediction: "Tourism will reopen in poorer countries.".to_string(),
            exact_quote: quote.to_string(),
            datetime_lower_bound: "2021-10-01".to_string(),
            datetime_upper_bound: "2021-12-31".to_string(),
            url: "https://marginalrevolution.com/marginalrevolution/2020/05".to_string(),
            publish_date: "2020-05-01".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_creates_parent_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("validated_predictions.json");
        let predictions = vec![record("They won’t be able to prove they are safe")];

        write_predictions(&predictions, &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("won’t"));
        let parsed: Vec<PredictionRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, predictions);
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validated_predictions.json");

        write_predictions(&[record("a"), record("b")], &path).await.unwrap();
        write_predictions(&[], &path).await.unwrap();

        let parsed: Vec<PredictionRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }
}
