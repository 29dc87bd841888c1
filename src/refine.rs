//! Transcript refinement through an OpenAI-compatible chat endpoint.
//!
//! Refinement is the one optional stage of the pipeline: the collaborator
//! reports its failures as a `Refinement` error, and the orchestrator
//! responds by keeping the raw transcript instead of aborting.

use crate::config::RefineSettings;
use crate::error::{Result, VidmarkError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default timeout for refinement requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Text refinement collaborator.
#[async_trait]
pub trait Refiner: Send + Sync {
    /// Refine a raw transcript. Errors are non-fatal to the pipeline.
    async fn refine(&self, text: &str) -> Result<String>;
}

/// Refiner calling a chat completions endpoint (LM Studio, llama.cpp server,
/// or the real OpenAI API).
pub struct ChatRefiner {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    role_prompt: String,
    prompt_template: String,
}

impl ChatRefiner {
    pub fn new(settings: &RefineSettings) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        let config = OpenAIConfig::new().with_api_base(&settings.api_base);
        let client = Client::with_config(config).with_http_client(http_client);

        Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            role_prompt: settings.role_prompt.clone(),
            prompt_template: settings.prompt_template.clone(),
        }
    }
}

#[async_trait]
impl Refiner for ChatRefiner {
    #[instrument(skip_all, fields(chars = text.len()))]
    async fn refine(&self, text: &str) -> Result<String> {
        debug!("Refining transcript with model '{}'", self.model);

        let user_message = self.prompt_template.replace("{text}", text);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(self.role_prompt.as_str())
                    .build()
                    .map_err(|e| VidmarkError::Refinement(format!("bad request: {e}")))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_message)
                    .build()
                    .map_err(|e| VidmarkError::Refinement(format!("bad request: {e}")))?
                    .into(),
            ])
            .build()
            .map_err(|e| VidmarkError::Refinement(format!("bad request: {e}")))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VidmarkError::Refinement(format!("chat endpoint error: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                VidmarkError::Refinement("chat response carried no message content".into())
            })?;

        debug!("Refined transcript is {} characters", content.len());
        Ok(content)
    }
}
