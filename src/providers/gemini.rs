use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;

use crate::config::GenerationConfig;
use crate::error::AnalyzerError;
use crate::llm_manager::LLMProvider;

/// Gemini API provider implementation
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f32>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationSettings>,
}

#[derive(Debug, Serialize)]
struct GenerationSettings {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetails {
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
}

impl GeminiProvider {
    /// Create a provider, reading the API key from the configured variable.
    pub fn from_env(config: &GenerationConfig) -> Result<Self, AnalyzerError> {
        let api_key = env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnalyzerError::MissingCredential { var: config.api_key_env.clone() })?;
        Self::with_api_key(api_key, config)
    }

    pub fn with_api_key(api_key: String, config: &GenerationConfig) -> Result<Self, AnalyzerError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AnalyzerError::UpstreamFailure(anyhow!(e).context("Failed to build HTTP client")))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            temperature: config.temperature,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model.trim_start_matches("models/")
        )
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_prompt(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt.to_string()) }],
            }],
            generation_config: self.temperature.map(|temperature| GenerationSettings { temperature }),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = response.status();
        let response_text = response.text().await.context("Failed to read Gemini response")?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<GeminiError>(&response_text) {
                return Err(anyhow!(
                    "Gemini API error: {} (status: {}, code: {})",
                    error_response.error.message,
                    error_response.error.status.as_deref().unwrap_or("UNKNOWN"),
                    error_response.error.code.unwrap_or(status.as_u16())
                ));
            } else {
                return Err(anyhow!(
                    "Gemini API error (status {}): {}",
                    status,
                    response_text
                ));
            }
        }

        let gemini_response: GenerateContentResponse =
            serde_json::from_str(&response_text).context("Failed to parse Gemini response")?;

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                "Gemini token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.total_token_count
            );
        }

        let Some(candidate) = gemini_response.candidates.into_iter().next() else {
            return Ok(String::new());
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                warn!("Gemini finished with reason {}. Response may be incomplete.", reason);
            }
        }

        let content = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> GenerationConfig {
        GenerationConfig {
            model: "gemini-2.5-flash".to_string(),
            base_url: format!("{}/v1beta/", server.uri()),
            api_key_env: "REQ_ANALYZER_TEST_UNSET_KEY".to_string(),
            temperature: Some(0.2),
            request_timeout_secs: Some(5),
        }
    }

    #[tokio::test]
    async fn test_reply_text_is_concatenated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Evaluate this"}]}],
                "generationConfig": {"temperature": 0.2}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Here: "}, {"text": "{\"clarity_score\": 90}"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_api_key("test-key".to_string(), &config_for(&server)).unwrap();
        let reply = provider.send_prompt("Evaluate this").await.unwrap();
        assert_eq!(reply, "Here: {\"clarity_score\": 90}");
    }

    #[tokio::test]
    async fn test_no_candidates_gives_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_api_key("k".to_string(), &config_for(&server)).unwrap();
        assert_eq!(provider.send_prompt("p").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_candidate_without_content_gives_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_api_key("k".to_string(), &config_for(&server)).unwrap();
        assert_eq!(provider.send_prompt("p").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_api_key("k".to_string(), &config_for(&server)).unwrap();
        let err = provider.send_prompt("p").await.unwrap_err().to_string();
        assert!(err.contains("Resource has been exhausted"));
        assert!(err.contains("RESOURCE_EXHAUSTED"));
    }

    #[tokio::test]
    async fn test_unstructured_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_api_key("k".to_string(), &config_for(&server)).unwrap();
        let err = provider.send_prompt("p").await.unwrap_err().to_string();
        assert!(err.contains("502"));
        assert!(err.contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_temperature_is_omitted_when_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.temperature = None;
        let provider = GeminiProvider::with_api_key("k".to_string(), &config).unwrap();
        provider.send_prompt("p").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_missing_credential() {
        let config = GenerationConfig {
            api_key_env: "REQ_ANALYZER_TEST_UNSET_KEY".to_string(),
            ..GenerationConfig::default()
        };
        match GeminiProvider::from_env(&config) {
            Err(AnalyzerError::MissingCredential { var }) => {
                assert_eq!(var, "REQ_ANALYZER_TEST_UNSET_KEY")
            }
            _ => panic!("expected MissingCredential"),
        }
    }

    #[test]
    fn test_endpoint_normalizes_slashes_and_prefix() {
        let config = GenerationConfig {
            model: "models/gemini-2.5-pro".to_string(),
            base_url: "https://example.test/v1beta".to_string(),
            ..GenerationConfig::default()
        };
        let provider = GeminiProvider::with_api_key("k".to_string(), &config).unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }
}
