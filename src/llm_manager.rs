use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};

use crate::error::AnalyzerError;

/// Trait representing an LLM provider.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Name of the provider.
    fn name(&self) -> &str;

    /// Send a prompt to the provider and return the reply text.
    ///
    /// One request per call: no retries, no streaming.
    async fn send_prompt(&self, prompt: &str) -> Result<String>;

    /// Model name of the provider.
    fn model_name(&self) -> &str {
        "Unknown"
    }
}

/// Owns the provider a run talks to and classifies its failures.
pub struct LLMManager {
    provider: Box<dyn LLMProvider>,
}

impl LLMManager {
    pub fn new(provider: Box<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Get the active provider.
    pub fn provider(&self) -> &dyn LLMProvider {
        &*self.provider
    }

    /// Send a prompt and return the raw reply.
    pub async fn send_prompt(&self, prompt: &str) -> Result<String, AnalyzerError> {
        info!(
            "Sending {} byte prompt to {} ({})",
            prompt.len(),
            self.provider.name(),
            self.provider.model_name()
        );

        let reply = self
            .provider
            .send_prompt(prompt)
            .await
            .map_err(AnalyzerError::UpstreamFailure)?;

        if reply.trim().is_empty() {
            warn!("{} returned no text", self.provider.name());
        } else {
            info!("Received {} byte reply", reply.len());
        }
        Ok(reply)
    }
}
