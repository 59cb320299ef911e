//! HTTP client for the chat completions endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::AdvisoryConfig;
use crate::report::ReportInput;

/// At most this many historical incidents are included in a prompt, however
/// many the caller gathered.
const MAX_PROMPT_INCIDENTS: usize = 20;

/// Truncation limit for incident descriptions inside prompts.
const MAX_DESCRIPTION_CHARS: usize = 400;

/// The incident fields the advisory prompt needs. Built by the caller from
/// full incident rows.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentDigest {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub service_name: String,
    pub severity: String,
    pub status: String,
}

/// Parsed advisory output: which historical incidents look similar and why.
///
/// `similarity_reasons` is keyed by incident id in string form, matching the
/// JSON object the model returns.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimilarFindings {
    #[serde(default)]
    pub similar_incident_ids: Vec<i64>,
    #[serde(default)]
    pub similarity_reasons: BTreeMap<String, String>,
    #[serde(default)]
    pub recommendation_text: Option<String>,
}

/// Errors from the advisory layer.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("advisory request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code.
    #[error("advisory endpoint error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed advisory response: {0}")]
    Malformed(String),
}

/// Client for a single chat completions endpoint.
pub struct AdvisoryClient {
    client: reqwest::Client,
    config: AdvisoryConfig,
}

impl AdvisoryClient {
    /// Create a client with a bounded request timeout from the config.
    pub fn new(config: AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Ask the model which of the historical incidents resemble the current
    /// one. An empty history short-circuits to empty findings without a call.
    pub async fn find_similar(
        &self,
        current: &IncidentDigest,
        history: &[IncidentDigest],
    ) -> Result<SimilarFindings, AdvisoryError> {
        if history.is_empty() {
            return Ok(SimilarFindings::default());
        }

        let prompt = build_similarity_prompt(current, history);
        let content = self
            .chat(
                "You are an incident analyst for a banking platform. \
                 Respond with a single JSON object with keys \
                 similar_incident_ids (array of integers), \
                 similarity_reasons (object mapping incident id to reason), \
                 and recommendation_text (string). No prose outside the JSON.",
                &prompt,
            )
            .await?;

        let stripped = strip_code_fence(&content);
        serde_json::from_str(stripped)
            .map_err(|e| AdvisoryError::Malformed(format!("similarity JSON: {e}")))
    }

    /// Ask the model to draft an HTML report narrative. Callers fall back to
    /// [`crate::fallback_report`] when this errors.
    pub async fn draft_report(&self, input: &ReportInput) -> Result<String, AdvisoryError> {
        let prompt = input.to_prompt();
        let content = self
            .chat(
                "You are an incident analyst writing a management report for a \
                 banking platform. Respond with a self-contained HTML fragment, \
                 no markdown and no code fences.",
                &prompt,
            )
            .await?;
        Ok(strip_code_fence(&content).to_string())
    }

    /// Send one chat completion request and return the first choice's content.
    async fn chat(&self, system: &str, user: &str) -> Result<String, AdvisoryError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": 0.2,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AdvisoryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AdvisoryError::Malformed("missing choices[0].message.content".into()))
    }
}

/// Render the similarity prompt, capping the history at
/// [`MAX_PROMPT_INCIDENTS`] entries and truncating long descriptions.
fn build_similarity_prompt(current: &IncidentDigest, history: &[IncidentDigest]) -> String {
    let mut prompt = String::new();
    prompt.push_str("Current incident:\n");
    push_digest(&mut prompt, current);
    prompt.push_str("\nResolved historical incidents from the same bank:\n");
    for digest in history.iter().take(MAX_PROMPT_INCIDENTS) {
        push_digest(&mut prompt, digest);
    }
    prompt.push_str(
        "\nIdentify which historical incidents are similar to the current one \
         and what their resolutions suggest.",
    );
    prompt
}

fn push_digest(prompt: &mut String, digest: &IncidentDigest) {
    prompt.push_str(&format!(
        "- id={} [{} / {}] service={} title={} description={}\n",
        digest.id,
        digest.severity,
        digest.status,
        digest.service_name,
        digest.title,
        truncate_chars(&digest.description, MAX_DESCRIPTION_CHARS),
    ));
}

/// Truncate on a character boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Strip a surrounding markdown code fence, with or without a language tag.
/// Models wrap JSON in fences despite instructions not to.
fn strip_code_fence(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop the language tag line (e.g. "json").
    match rest.split_once('\n') {
        Some((first, body)) if first.trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            body.trim()
        }
        _ => rest.trim(),
    }
}
