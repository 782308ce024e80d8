//! Complaint classifier backed by the Gemini REST API.
//!
//! Calls `generateContent` directly. Classification failures never surface
//! as `Err`: the result carries the `FALLO_GEMINI` sentinel plus a detail
//! string, so batch runs continue past individual rows and report failures
//! at the end.

use crate::truncate_body;
use once_cell::sync::Lazy;
use opticore_core::Result;
use opticore_core::complaint::{SENTIMENT_SENTINEL, normalize_sentiment};
use opticore_core::config::ClassifierConfig;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Instruction sent with every complaint; the model must answer with bare JSON.
const SYSTEM_PROMPT: &str = "Eres un analista de reclamos. Devuelve SOLO JSON con campos: \
{'Sentimiento':'positivo|neutral|negativo','Clasificacion':'producto|entrega|servicio|otros'}.";

// Models wrap the JSON in a markdown fence despite the instructions.
static JSON_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("fence regex"));

/// A classified complaint: sentiment plus free-form category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Classification {
    #[serde(rename = "Sentimiento", default)]
    pub sentimiento: String,
    #[serde(rename = "Clasificacion", default = "default_category")]
    pub clasificacion: String,
}

fn default_category() -> String {
    "otros".to_string()
}

impl Classification {
    /// The classification applied to blank input: nothing to analyze.
    pub fn neutral() -> Self {
        Self {
            sentimiento: "neutral".to_string(),
            clasificacion: "otros".to_string(),
        }
    }

    /// Sentinel-filled classification marking a failed call.
    pub fn failure() -> Self {
        Self {
            sentimiento: SENTIMENT_SENTINEL.to_string(),
            clasificacion: SENTIMENT_SENTINEL.to_string(),
        }
    }

    /// True when either field carries the failure sentinel. Such rows must
    /// not be persisted.
    pub fn failed(&self) -> bool {
        self.sentimiento == SENTIMENT_SENTINEL || self.clasificacion == SENTIMENT_SENTINEL
    }

    /// Folds sentiment synonyms onto the canonical labels, keeping the
    /// sentinel intact.
    pub fn normalized(mut self) -> Self {
        self.sentimiento = normalize_sentiment(&self.sentimiento);
        self
    }
}

/// Client for the Gemini classification endpoint.
#[derive(Clone)]
pub struct GeminiClassifier {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClassifier {
    /// Creates a new classifier with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Loads configuration from the environment (`GEMINI_API_KEY`, `MODEL_ID`).
    pub fn try_from_env() -> Result<Self> {
        let config = ClassifierConfig::from_env()?;
        Ok(Self::new(config.api_key, config.model))
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.api_key.clone(), config.model.clone())
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Classifies one complaint. Blank text short-circuits to
    /// `neutral`/`otros` without a network call. Failures come back as the
    /// sentinel classification plus a human-readable detail, never as `Err`.
    pub async fn classify(&self, text: &str) -> (Classification, Option<String>) {
        let text = text.trim();
        if text.is_empty() {
            return (Classification::neutral(), None);
        }

        match self.request_classification(text).await {
            Ok(classification) => (classification.normalized(), None),
            Err(detail) => {
                warn!(detail = %detail, "classification failed, marking row with sentinel");
                (Classification::failure(), Some(detail))
            }
        }
    }

    /// Classifies a batch sequentially, one result per input, continuing
    /// past individual failures.
    pub async fn classify_batch(&self, texts: &[String]) -> Vec<(Classification, Option<String>)> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify(text).await);
        }
        results
    }

    async fn request_classification(
        &self,
        text: &str,
    ) -> std::result::Result<Classification, String> {
        let prompt = format!("{SYSTEM_PROMPT}\n\nTexto:\n{text}\n\nDevuelve solo JSON válido.");
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            // Temperature 0 keeps the labels as stable as the model allows.
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| format!("Gemini request failed: {err}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Gemini error body".to_string());
            return Err(format!(
                "Gemini HTTP {status}: {}",
                truncate_body(&body, 200)
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| format!("failed to parse Gemini response: {err}"))?;

        let raw = extract_text_response(parsed)
            .ok_or_else(|| "Gemini returned no text in the response candidates".to_string())?;

        parse_classification(&raw)
            .map_err(|err| format!("{err}. Raw response: {}", truncate_body(&raw, 200)))
    }
}

/// Parses the model's answer, tolerating a ```json fence around the object.
fn parse_classification(raw: &str) -> std::result::Result<Classification, String> {
    let json_text = JSON_FENCE_RE
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);
    serde_json::from_str(json_text).map_err(|err| format!("Gemini returned invalid JSON: {err}"))
}

fn extract_text_response(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().find_map(|part| part.text))
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_is_parsed() {
        let parsed =
            parse_classification(r#"{"Sentimiento":"negativo","Clasificacion":"entrega"}"#)
                .unwrap();
        assert_eq!(parsed.sentimiento, "negativo");
        assert_eq!(parsed.clasificacion, "entrega");
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"Sentimiento\":\"Buena\",\"Clasificacion\":\"producto\"}\n```";
        let parsed = parse_classification(raw).unwrap().normalized();
        assert_eq!(parsed.sentimiento, "positivo");
        assert_eq!(parsed.clasificacion, "producto");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed = parse_classification(r#"{"Sentimiento":"positivo"}"#).unwrap();
        assert_eq!(parsed.clasificacion, "otros");
        let parsed = parse_classification("{}").unwrap().normalized();
        assert_eq!(parsed.sentimiento, "neutral");
    }

    #[test]
    fn prose_around_json_is_an_error() {
        assert!(parse_classification("Claro, aquí está tu análisis").is_err());
    }

    #[test]
    fn sentinel_classification_is_detected_and_survives_normalization() {
        let failure = Classification::failure();
        assert!(failure.failed());
        assert!(failure.normalized().failed());
        assert!(!Classification::neutral().failed());
    }

    #[tokio::test]
    async fn blank_text_short_circuits_to_neutral() {
        // Bogus key and unroutable model name: proof that no call is made.
        let classifier = GeminiClassifier::new("invalid-key", "no-such-model");
        let (classification, detail) = classifier.classify("   \n ").await;
        assert_eq!(classification, Classification::neutral());
        assert!(detail.is_none());
    }

    fn candidate(text: &str) -> Candidate {
        Candidate {
            content: Some(CandidateContent {
                parts: Some(vec![CandidatePart {
                    text: Some(text.to_string()),
                }]),
            }),
        }
    }

    #[test]
    fn response_text_extraction_takes_the_first_candidate() {
        let response = GenerateContentResponse {
            candidates: Some(vec![
                candidate("{\"Sentimiento\":\"neutral\"}"),
                candidate("{\"Sentimiento\":\"negativo\"}"),
            ]),
        };
        assert_eq!(
            extract_text_response(response).as_deref(),
            Some("{\"Sentimiento\":\"neutral\"}")
        );
        assert_eq!(
            extract_text_response(GenerateContentResponse { candidates: None }),
            None
        );
    }
}
