//! OpenAI-compatible persona capability
//!
//! Works against any chat-completions endpoint (OpenAI, Azure, local
//! vLLM/llama.cpp deployments) by overriding the API base URL.

use crate::capability::{PersonaCapability, PersonaContext};
use crate::error::{CapabilityError, Result};
use crate::persona::Persona;
use advisor_core::{Action, PersonaOpinion};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI-compatible capability
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL, overridable for OpenAI-compatible deployments
    pub api_base: String,
    /// Model identifier
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    /// Create a config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read the API key from `OPENAI_API_KEY`, and optionally the base URL
    /// from `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            CapabilityError::Configuration(
                "OPENAI_API_KEY environment variable not set".to_string(),
            )
        })?;
        let api_base =
            std::env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Ok(Self {
            api_base,
            ..Self::new(api_key)
        })
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Live persona capability backed by a chat-completions API
pub struct OpenAiCapability {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiCapability {
    /// Create a capability with the given configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a capability from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Send one user prompt to the chat-completions endpoint and return
    /// the raw response text
    ///
    /// Exposed for callers that layer their own response format on top of
    /// the same endpoint, such as the meta-analysis narrator.
    pub async fn complete(&self, prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: 0.7,
        };

        let url = format!("{}/chat/completions", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Api(format!("{status}: {body}")));
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::MalformedResponse("no choices".to_string()))?;
        Ok(choice.message.content)
    }
}

#[async_trait]
impl PersonaCapability for OpenAiCapability {
    async fn deliberate(&self, persona: &Persona, ctx: &PersonaContext) -> Result<PersonaOpinion> {
        let prompt = ctx.render_prompt(persona);
        debug!(persona = %persona.name, model = %self.config.model, "requesting persona opinion");
        let text = self.complete(prompt).await?;
        let (decision, confidence, reasoning) = parse_decision(&text)?;
        Ok(PersonaOpinion::new(
            persona.name.clone(),
            decision,
            confidence,
            reasoning,
        ))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Parse a `Decision / Confidence / Reasoning` response into a triple
///
/// Tolerates markdown emphasis around the labels and bracketed values; the
/// reasoning spans everything after its label.
pub fn parse_decision(text: &str) -> Result<(Action, f64, String)> {
    let mut decision: Option<Action> = None;
    let mut confidence: Option<f64> = None;
    let mut reasoning_lines: Vec<String> = Vec::new();
    let mut in_reasoning = false;

    for line in text.lines() {
        let stripped = line.trim().trim_matches('*').trim();
        if let Some(rest) = strip_label(stripped, "Decision:") {
            decision = Action::parse(rest.trim_matches(['[', ']']));
            in_reasoning = false;
        } else if let Some(rest) = strip_label(stripped, "Confidence:") {
            confidence = rest.trim_matches(['[', ']']).parse::<f64>().ok();
            in_reasoning = false;
        } else if let Some(rest) = strip_label(stripped, "Reasoning:") {
            reasoning_lines.push(rest.trim().to_string());
            in_reasoning = true;
        } else if in_reasoning && !stripped.is_empty() {
            reasoning_lines.push(stripped.to_string());
        }
    }

    let decision = decision
        .ok_or_else(|| CapabilityError::MalformedResponse("no parseable decision".to_string()))?;
    let confidence = confidence
        .ok_or_else(|| CapabilityError::MalformedResponse("no parseable confidence".to_string()))?;
    Ok((decision, confidence, reasoning_lines.join(" ")))
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    // get() keeps multibyte text near the label boundary from slicing
    // inside a character.
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim().trim_matches('*').trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_response() {
        let text = "Decision: Buy\nConfidence: 0.85\nReasoning: Strong fundamentals and momentum.";
        let (decision, confidence, reasoning) = parse_decision(text).unwrap();
        assert_eq!(decision, Action::Buy);
        assert!((confidence - 0.85).abs() < 1e-12);
        assert_eq!(reasoning, "Strong fundamentals and momentum.");
    }

    #[test]
    fn test_parse_bracketed_and_multiline() {
        let text = "Decision: [Hold]\nConfidence: [0.6]\nReasoning: Mixed signals.\nVolatility is elevated.";
        let (decision, confidence, reasoning) = parse_decision(text).unwrap();
        assert_eq!(decision, Action::Hold);
        assert!((confidence - 0.6).abs() < 1e-12);
        assert_eq!(reasoning, "Mixed signals. Volatility is elevated.");
    }

    #[test]
    fn test_parse_markdown_labels() {
        let text = "**Decision:** sell\n**Confidence:** 0.7\n**Reasoning:** Overvalued.";
        let (decision, _, _) = parse_decision(text).unwrap();
        assert_eq!(decision, Action::Sell);
    }

    #[test]
    fn test_parse_survives_multibyte_prefix_lines() {
        let text = "ab伟大的决定: Buy\nDecision: Buy\nConfidence: 0.8\nReasoning: ok";
        let (decision, confidence, _) = parse_decision(text).unwrap();
        assert_eq!(decision, Action::Buy);
        assert!((confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = parse_decision("I think you should buy.").unwrap_err();
        assert!(matches!(err, CapabilityError::MalformedResponse(_)));
    }
}
