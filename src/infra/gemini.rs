//! Thin asynchronous client for the Gemini `generateContent` API.
//!
//! - Builds the valuation prompt from item metadata.
//! - Extracts the first text candidate and strips code fences / type labels.
//! - Timeouts belong to the HTTP client; there is no retry.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::CandidateSource;
use crate::domain::ItemMetadata;
use crate::util::version::user_agent;

const MAX_PROMPT_IMAGES: usize = 3;

#[derive(Debug, Error)]
pub enum GeminiClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("no text candidate in response: {0}")]
    MissingText(String),
    #[error("failed to parse JSON from model output: {source}")]
    UnparseableCandidate {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Connection settings for the collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct GeminiSettings {
    pub api_key: String,
    /// Full `generateContent` URL, without the key.
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: Url,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self, GeminiClientError> {
        let mut endpoint = Url::parse(&settings.endpoint)?;
        endpoint.query_pairs_mut().append_pair("key", &settings.api_key);
        let http = Client::builder()
            .user_agent(user_agent())
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// Sends one prompt and returns the raw text of the first candidate.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiClientError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        info!(
            host = self.endpoint.host_str().unwrap_or("?"),
            path = self.endpoint.path(),
            "requesting collaborator valuation"
        );
        let response = self.http.post(self.endpoint.clone()).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response.json().await?;
        first_candidate_text(&raw).ok_or_else(|| GeminiClientError::MissingText(raw.to_string()))
    }

    pub async fn request_valuation(
        &self,
        metadata: &ItemMetadata,
    ) -> Result<Value, GeminiClientError> {
        let text = self.generate(&valuation_prompt(metadata)).await?;
        debug!(%text, "collaborator replied");
        parse_candidate(&text)
    }
}

impl CandidateSource for GeminiClient {
    type Error = GeminiClientError;

    async fn fetch_candidate(&self, metadata: &ItemMetadata) -> Result<Value, Self::Error> {
        self.request_valuation(metadata).await
    }
}

pub fn valuation_prompt(metadata: &ItemMetadata) -> String {
    let mut prompt = String::from(
        "You are an expert used-goods valuation assistant for a college barter marketplace.\n",
    );
    let image_count = metadata
        .images
        .as_ref()
        .map(|images| images.len().min(MAX_PROMPT_IMAGES))
        .unwrap_or(0);
    if image_count > 0 {
        prompt.push_str(&format!("{image_count} image(s) provided.\n"));
    }
    if let Some(link) = &metadata.product_link {
        prompt.push_str(&format!("Product link: {link}.\n"));
    }
    let metadata_json = serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string());
    prompt.push_str(&format!("Input metadata as JSON: {metadata_json}.\n"));
    prompt.push_str("Return valid JSON only, following this exact schema:\n\n");
    prompt.push_str(
        r#"{"value": <float>, "confidence": <float>, "breakdown": {"basePrice": <float>, "ageFactor": <float>, "conditionFactor": <float>, "brandFactor": <float>, "accessoryValue": <float>}, "explanation": "<short human explanation 1-3 sentences>"}"#,
    );
    prompt.push_str(
        "\nCompute value = round(basePrice * ageFactor * conditionFactor * brandFactor + accessoryValue, 2). ",
    );
    prompt.push_str("If you cannot determine basePrice, return basePrice=null and confidence=0.0.");
    prompt
}

/// Strips markdown code fences (with or without a `json` tag) and one
/// leading `json` type label, then trims.
pub fn clean_candidate_text(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(index) = rest.find("```") {
        cleaned.push_str(&rest[..index]);
        rest = &rest[index + 3..];
        if has_json_label(rest) {
            rest = &rest[4..];
        }
    }
    cleaned.push_str(rest);

    let trimmed = cleaned.trim();
    let unlabeled = if has_json_label(trimmed) {
        &trimmed[4..]
    } else {
        trimmed
    };
    unlabeled.trim().to_string()
}

pub fn parse_candidate(raw: &str) -> Result<Value, GeminiClientError> {
    let cleaned = clean_candidate_text(raw);
    serde_json::from_str(&cleaned)
        .map_err(|source| GeminiClientError::UnparseableCandidate { raw: cleaned, source })
}

fn has_json_label(text: &str) -> bool {
    text.get(..4)
        .is_some_and(|label| label.eq_ignore_ascii_case("json"))
}

fn first_candidate_text(raw: &Value) -> Option<String> {
    let response: GenerateResponse = serde_json::from_value(raw.clone()).ok()?;
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
        .filter(|text| !text.is_empty())
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<CandidateDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    #[serde(default)]
    content: Option<ContentDto>,
}

#[derive(Debug, Deserialize)]
struct ContentDto {
    #[serde(default)]
    parts: Vec<PartDto>,
}

#[derive(Debug, Deserialize)]
struct PartDto {
    #[serde(default)]
    text: Option<String>,
}
