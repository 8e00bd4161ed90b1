//! Data models for extracted predictions.
//!
//! This module defines the structures that flow through the pipeline:
//! - [`PredictionRecord`]: A single dated prediction attributed to the blog author
//! - [`ExtractionResponse`]: The JSON envelope the extraction model replies with
//!
//! Field names match the JSON schema requested in the extraction prompt, so the
//! same struct deserializes model output, fills the cache, and is written to the
//! final output file.

use serde::{Deserialize, Serialize};

/// Sentinel used by the model (and by publish-date inference) for a date that
/// could not be resolved.
pub const UNSPECIFIED: &str = "unspecified";

fn unspecified() -> String {
    UNSPECIFIED.to_string()
}

/// A forward-looking prediction made by the author of a blog post.
///
/// The first four fields come from the extraction model. `url` and
/// `publish_date` are provenance attached after extraction; they default to
/// empty/`unspecified` so a raw model element deserializes without them.
///
/// # JSON Schema
///
/// ```json
/// {
///   "paraphrased_prediction": "By July 2021, most of the U.S. pandemic will be over.",
///   "exact_quote": "Most of the U.S. pandemic will be over by July, ...",
///   "datetime_lower_bound": "2021-07-01",
///   "datetime_upper_bound": "2021-07-31",
///   "url": "https://marginalrevolution.com/marginalrevolution/2021/01",
///   "publish_date": "2021-01-01"
/// }
/// ```
///
/// Field order is significant: the validation cache key is a hash of the
/// compact serialization of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PredictionRecord {
    /// Free-text restatement of the prediction.
    #[serde(default)]
    pub paraphrased_prediction: String,
    /// Verbatim passage from the source text containing the prediction.
    #[serde(default)]
    pub exact_quote: String,
    /// When the prediction starts being relevant (`YYYY-MM-DD` or `unspecified`).
    #[serde(default = "unspecified")]
    pub datetime_lower_bound: String,
    /// When the prediction stops being relevant (`YYYY-MM-DD` or `unspecified`).
    #[serde(default = "unspecified")]
    pub datetime_upper_bound: String,
    /// The archive URL the prediction was extracted from.
    #[serde(default)]
    pub url: String,
    /// First day of the archive month (`YYYY-MM-01`) or `unspecified`.
    #[serde(default = "unspecified")]
    pub publish_date: String,
}

impl PredictionRecord {
    /// True when both date bounds were resolved by the model.
    pub fn has_resolved_bounds(&self) -> bool {
        self.datetime_lower_bound != UNSPECIFIED && self.datetime_upper_bound != UNSPECIFIED
    }
}

/// The JSON object the extraction model is asked to return.
///
/// A reply without a `predictions` key is read as "no predictions", which is
/// the expected answer for most posts.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub predictions: Vec<PredictionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PredictionRecord {
        PredictionRecord {
            paraphrased_prediction: "By July 2021, most of the U.S. pandemic will be over.".to_string(),
            exact_quote: "Most of the U.S. pandemic will be over by July".to_string(),
            datetime_lower_bound: "2021-07-01".to_string(),
            datetime_upper_bound: "2021-07-31".to_string(),
            url: "https://marginalrevolution.com/marginalrevolution/2021/01".to_string(),
            publish_date: "2021-01-01".to_string(),
        }
    }

    #[test]
    fn test_serialization_field_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        let lower = json.find("datetime_lower_bound").unwrap();
        let upper = json.find("datetime_upper_bound").unwrap();
        let url = json.find("\"url\"").unwrap();
        let publish = json.find("publish_date").unwrap();
        assert!(json.starts_with("{\"paraphrased_prediction\""));
        assert!(lower < upper && upper < url && url < publish);
    }

    #[test]
    fn test_model_element_without_provenance() {
        let raw = r#"{
            "paraphrased_prediction": "Rates will fall in 2025.",
            "exact_quote": "rates will fall next year",
            "datetime_lower_bound": "2025-01-01",
            "datetime_upper_bound": "2025-12-31"
        }"#;
        let record: PredictionRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.url, "");
        assert_eq!(record.publish_date, UNSPECIFIED);
        assert!(record.has_resolved_bounds());
    }

    #[test]
    fn test_missing_bound_is_unspecified() {
        let raw = r#"{"paraphrased_prediction": "x", "exact_quote": "y", "datetime_lower_bound": "2025-01-01"}"#;
        let record: PredictionRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.datetime_upper_bound, UNSPECIFIED);
        assert!(!record.has_resolved_bounds());
    }

    #[test]
    fn test_extraction_response_without_array() {
        let parsed: ExtractionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.predictions.is_empty());
    }
}
