//! LLM API interaction with exponential backoff retry logic.
//!
//! This module provides the interface used by the extraction and validation
//! passes to talk to an OpenAI-compatible LLM API through `awful_aj`.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`AskFnWrapper`]: Wraps the `awful_aj` library's `ask` function
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//! - [`chat_template`]: Builds an `awful_aj` [`ChatTemplate`] from an embedded system prompt
//! - [`extraction_template`] / [`validation_template`]: The two passes' templates
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Retries here only cover transport and API errors. A reply that arrives but
//! does not say what we expected is handled by the caller.

use crate::prompts::{EXTRACTION_SYSTEM_PROMPT, VALIDATION_SYSTEM_PROMPT};
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use serde_yaml::{Mapping, Value};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implementors of this trait can send text to an LLM and receive a response.
/// This abstraction allows for different LLM backends or decorators (like retry logic).
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

impl<T: AskAsync> AskAsync for &T {
    type Response = T::Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        (**self).ask(text).await
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// ```ignore
    /// let client = AskFnWrapper { config: &config, template: &template };
    /// let retry_client = RetryAsk::new(client, 5, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Wrapper around `awful_aj::api::ask` that implements [`AskAsync`].
///
/// Each pass (extraction, validation) gets its own wrapper because the
/// template carries that pass's system prompt.
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    /// Reference to the LLM configuration (API keys, endpoints, model settings).
    pub config: &'a AwfulJadeConfig,
    /// Reference to the chat template defining the conversation structure.
    pub template: &'a ChatTemplate,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        let dt = t0.elapsed();

        if let Err(e) = &res {
            warn!(elapsed_ms = dt.as_millis(), error = %e, "API call failed");
        }
        res
    }
}

/// Wrap a configured model in the standard backoff policy.
pub fn with_backoff<'a>(
    config: &'a AwfulJadeConfig,
    template: &'a ChatTemplate,
) -> RetryAsk<AskFnWrapper<'a>> {
    RetryAsk::new(AskFnWrapper { config, template }, 5, StdDuration::from_secs(1))
}

/// Build a [`ChatTemplate`] around an embedded system prompt.
///
/// The template goes through the same YAML shape `awful_aj` reads from its
/// template directory, so embedded prompts and on-disk templates stay
/// interchangeable. A `response_format` constrains the reply to one JSON
/// object.
pub fn chat_template(
    system_prompt: &str,
    response_format: Option<Value>,
) -> Result<ChatTemplate, Box<dyn Error>> {
    Ok(serde_yaml::from_value(Value::Mapping(template_doc(
        system_prompt,
        response_format,
    )))?)
}

fn template_doc(system_prompt: &str, response_format: Option<Value>) -> Mapping {
    let mut doc = Mapping::new();
    doc.insert("system_prompt".into(), system_prompt.into());
    doc.insert("messages".into(), Value::Sequence(Vec::new()));
    if let Some(format) = response_format {
        doc.insert("response_format".into(), format);
    }
    doc
}

/// JSON object format for extraction replies: `{"predictions": [...]}`.
///
/// Not strict: records may carry extra keys, which are ignored on parse.
pub fn predictions_format() -> Result<Value, Box<dyn Error>> {
    let record = serde_json::json!({
        "type": "object",
        "properties": {
            "paraphrased_prediction": { "type": "string" },
            "exact_quote": { "type": "string" },
            "datetime_lower_bound": { "type": "string" },
            "datetime_upper_bound": { "type": "string" },
        },
        "required": [
            "paraphrased_prediction",
            "exact_quote",
            "datetime_lower_bound",
            "datetime_upper_bound",
        ],
    });
    let format = serde_json::json!({
        "name": "predictions",
        "description": "Dated predictions made by the post author",
        "strict": false,
        "schema": {
            "type": "object",
            "properties": {
                "predictions": { "type": "array", "items": record },
            },
            "required": ["predictions"],
        },
    });
    Ok(serde_yaml::to_value(format)?)
}

/// Template for the extraction pass; replies are a single JSON object.
pub fn extraction_template() -> Result<ChatTemplate, Box<dyn Error>> {
    chat_template(EXTRACTION_SYSTEM_PROMPT, Some(predictions_format()?))
}

/// Template for the validation pass; replies are a bare `Yes` / `No`.
pub fn validation_template() -> Result<ChatTemplate, Box<dyn Error>> {
    chat_template(VALIDATION_SYSTEM_PROMPT, None)
}
