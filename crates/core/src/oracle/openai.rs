use super::{Oracle, OracleError, OracleMessage, OracleRequest, ResponseMode, Role};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, ResponseFormat,
    },
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const MAX_COMPLETION_TOKENS: u32 = 2048;

/// An implementation of `Oracle` for any OpenAI-compatible chat completion API.
pub struct OpenAICompatibleOracle {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAICompatibleOracle {
    /// Creates a new oracle for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-4o").
    /// * `timeout` - Upper bound for a single round-trip.
    pub fn new(config: OpenAIConfig, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            timeout,
        }
    }
}

fn to_chat_message(message: &OracleMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.clone();
    Ok(match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

#[async_trait]
impl Oracle for OpenAICompatibleOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        let messages = request
            .messages
            .iter()
            .map(to_chat_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .max_completion_tokens(MAX_COMPLETION_TOKENS);
        if request.mode == ResponseMode::StructuredJson {
            args.response_format(ResponseFormat::JsonObject);
        }
        let chat_request = args.build()?;

        debug!(model = %self.model, mode = ?request.mode, "Sending oracle request");
        let response: CreateChatCompletionResponse =
            tokio::time::timeout(self.timeout, self.client.chat().create(chat_request))
                .await
                .map_err(|_| OracleError::Timeout(self.timeout))??;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(OracleError::EmptyResponse)
    }
}
