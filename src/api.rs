//! # API Module
//!
//! Text generation against an OpenAI-compatible chat endpoint.
//!
//! Ollama exposes one at `http://localhost:11434/v1`, so the same client works
//! for local models and hosted ones. The pipeline only sees the [`Generator`]
//! trait: a prompt goes in, a string comes out.
//!
//! # Example
//!
//! ```no_run
//! use ollama_cli_agent::api::{ChatGenerator, Generator};
//! use ollama_cli_agent::config::AgentConfig;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = ChatGenerator::new(&AgentConfig::default());
//! let answer = generator.invoke("Question: Why is the sky blue?\n\nAnswer:").await?;
//! println!("{answer}");
//! # Ok(()) }
//! ```

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::ModelError;

/// Prompt → completion capability.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Creates a new OpenAI-compatible API client from configuration.
fn create_client(config: &AgentConfig) -> Client<OpenAIConfig> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());
    debug!("Client created with config: {:?}", openai_config);
    Client::with_config(openai_config)
}

/// [`Generator`] that sends the prompt as a single user message.
pub struct ChatGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatGenerator {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: create_client(config),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let message = ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
            name: None,
        });

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(vec![message])
            .build()?;

        debug!("Sending request: {:?}", request);
        let response = self.client.chat().create(request).await?;

        let mut response_string = String::new();
        for chat_choice in response.choices {
            if let Some(content) = chat_choice.message.content {
                response_string.push_str(&content);
            }
        }

        if response_string.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(response_string)
    }
}
