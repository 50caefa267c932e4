use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ChatConfig;
use crate::errors::{AppError, AppResult};

pub const SYSTEM_PROMPT: &str = "You are a helpful and creative assistant.";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Service de complétion de texte (API compatible OpenAI)
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, prompt: &ChatPrompt) -> AppResult<String>;
}

pub struct OpenRouterClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl OpenRouterClient {
    pub fn new(client: reqwest::Client, config: &ChatConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatCompleter for OpenRouterClient {
    async fn complete(&self, prompt: &ChatPrompt) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("OPENROUTER_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&json!({
                "model": prompt.model,
                "messages": [
                    { "role": "system", "content": prompt.system },
                    { "role": "user", "content": prompt.user },
                ],
                "max_tokens": prompt.max_tokens,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Chat API returned {}: {}", status, body)));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream("Chat API returned no content".to_string()))
    }
}

pub struct ChatService;

impl ChatService {
    /// Construit la requête avec le modèle et la limite configurés
    pub fn build_prompt(config: &ChatConfig, user_prompt: &str) -> ChatPrompt {
        ChatPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user: user_prompt.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    /// Le prompt du corps JSON a priorité sur celui du chemin
    #[tracing::instrument(skip_all)]
    pub async fn ask(
        completer: &dyn ChatCompleter,
        config: &ChatConfig,
        body_prompt: Option<&str>,
        path_prompt: Option<&str>,
    ) -> AppResult<String> {
        let prompt = body_prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or_else(|| path_prompt.map(str::trim).filter(|p| !p.is_empty()))
            .ok_or_else(|| AppError::Validation("Prompt is required".to_string()))?;

        let content = completer.complete(&Self::build_prompt(config, prompt)).await?;
        tracing::debug!(prompt_len = prompt.len(), content_len = content.len(), "Chat completed");
        Ok(content)
    }
}
