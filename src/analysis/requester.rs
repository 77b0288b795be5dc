//! OpenAI-compatible analyzer.

use super::{parse_report, AnalysisReport, Analyzer};
use crate::config::{AnalysisSettings, Prompts};
use crate::error::{GleanError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Build the two-message analysis request for a transcript.
pub fn build_request(
    settings: &AnalysisSettings,
    prompts: &Prompts,
    transcript_text: &str,
) -> Result<CreateChatCompletionRequest> {
    let mut vars = HashMap::new();
    vars.insert("transcript".to_string(), transcript_text.to_string());
    let user_prompt = prompts.render_with_custom(&prompts.analysis.user, &vars);

    let messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(prompts.analysis.system.clone())
            .build()
            .map_err(|e| GleanError::Internal(e.to_string()))?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(user_prompt)
            .build()
            .map_err(|e| GleanError::Internal(e.to_string()))?
            .into(),
    ];

    CreateChatCompletionRequestArgs::default()
        .model(&settings.model)
        .messages(messages)
        .temperature(settings.temperature)
        .response_format(ResponseFormat::JsonObject)
        .build()
        .map_err(|e| GleanError::Internal(e.to_string()))
}

/// Analyzer backed by a chat completion endpoint.
pub struct OpenAiAnalyzer {
    /// `None` when no API key is configured.
    client: Option<Client<OpenAIConfig>>,
    settings: AnalysisSettings,
    prompts: Prompts,
}

impl OpenAiAnalyzer {
    /// Create an analyzer, reading the API key from the configured environment variable.
    pub fn new(settings: AnalysisSettings, prompts: Prompts) -> Result<Self> {
        let api_key = settings.api_key();
        Self::with_api_key(settings, prompts, api_key.as_deref())
    }

    /// Create an analyzer with an explicit API key.
    pub fn with_api_key(
        settings: AnalysisSettings,
        prompts: Prompts,
        api_key: Option<&str>,
    ) -> Result<Self> {
        let client = match api_key {
            Some(key) => Some(create_client(&settings, key)?),
            None => None,
        };

        Ok(Self {
            client,
            settings,
            prompts,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    #[instrument(skip(self, transcript_text), fields(chars = transcript_text.len(), model = %self.settings.model))]
    async fn analyze(&self, transcript_text: &str) -> Result<AnalysisReport> {
        let client = self.client.as_ref().ok_or_else(|| {
            GleanError::ProviderUnconfigured(format!(
                "{} is not set. Add your API key to the environment.",
                self.settings.api_key_env
            ))
        })?;

        let request = build_request(&self.settings, &self.prompts, transcript_text)?;

        info!("Requesting analysis");
        let response = client
            .chat()
            .create(request)
            .await
            .map_err(provider_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| GleanError::ResponseParse("empty response from provider".to_string()))?;

        debug!("Received {} characters of analysis", content.len());
        parse_report(content)
    }
}

/// Prefer the provider's own error message when the body carried one.
fn provider_error(err: OpenAIError) -> GleanError {
    match err {
        OpenAIError::ApiError(api) if !api.message.trim().is_empty() => {
            GleanError::Provider(api.message)
        }
        OpenAIError::Reqwest(e) if e.is_timeout() => {
            GleanError::Provider("request to AI provider timed out".to_string())
        }
        other => {
            debug!("Provider call failed: {}", other);
            GleanError::Provider("request to AI provider failed".to_string())
        }
    }
}
