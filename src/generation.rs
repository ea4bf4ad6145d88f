// Text generation against the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{
    Credential, GEMINI_API_KEY, GenerationSettings, SecretStore, resolve_credential_from_env,
};
use crate::http_client::{self, ApiError};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Credential,
    base_url: String,
    model: String,
    max_output_tokens: Option<u32>,
}

impl GeminiClient {
    pub fn new(api_key: Credential, settings: &GenerationSettings) -> Result<Self, ApiError> {
        let client = http_client::build_client(settings.timeout_secs)?;
        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_output_tokens: settings.max_output_tokens,
        })
    }

    /// Builds a client when a key can be resolved; `None` means generation
    /// is unavailable and callers must report the missing credential.
    pub fn from_settings(
        settings: &GenerationSettings,
        secrets: &SecretStore,
    ) -> Result<Option<Self>, ApiError> {
        match resolve_credential_from_env(GEMINI_API_KEY, secrets) {
            Some(key) => Self::new(key, settings).map(Some),
            None => {
                tracing::warn!("{GEMINI_API_KEY} not found in environment or secret store");
                Ok(None)
            }
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: self
                .max_output_tokens
                .map(|max_output_tokens| GenerationConfig { max_output_tokens }),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        tracing::debug!(model = %self.model, chars = prompt.len(), "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let body: GenerateResponse = http_client::decode_json(response).await?;
        body.into_text().ok_or(ApiError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Goal: "},{"text":"read ch. 1"}]}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().as_deref(), Some("Goal: read ch. 1"));
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let body: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(body.into_text().is_none());
    }
}
