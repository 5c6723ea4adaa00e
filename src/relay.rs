use crate::cli::Args;
use crate::llm::{ GenerationParams, LlmConfig, LlmType };
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::models::chat::{ ChatResponse, ContextTurn };

use log::{ debug, info };
use std::error::Error;
use std::sync::Arc;

/// Reply used when the provider answers without any content.
pub const NO_REPLY_FALLBACK: &str = "No response generated.";

/// Stateless relay between the client-held context and the LLM provider.
#[derive(Clone)]
pub struct ChatRelay {
    chat_client: Arc<dyn ChatClient>,
}

impl ChatRelay {
    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let chat_llm_type: LlmType = args.chat_llm_type
            .parse()
            .map_err(|e| format!("Invalid chat LLM type: {}", e))?;
        let chat_api_key = if !args.chat_api_key.is_empty() {
            Some(args.chat_api_key.clone())
        } else {
            None
        };
        let chat_config = LlmConfig {
            llm_type: chat_llm_type,
            api_key: chat_api_key,
            base_url: args.chat_base_url.clone(),
            params: GenerationParams {
                model: args.chat_model.clone(),
                max_tokens: args.chat_max_tokens,
                temperature: args.chat_temperature,
            },
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            chat_config.llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        Ok(Self::with_client(chat_client))
    }

    pub fn with_client(chat_client: Arc<dyn ChatClient>) -> Self {
        Self { chat_client }
    }

    /// Appends the user turn, forwards the sequence, and returns the reply
    /// with the context extended by both new turns.
    pub async fn relay(
        &self,
        message: &str,
        context: Vec<ContextTurn>
    ) -> Result<ChatResponse, Box<dyn Error + Send + Sync>> {
        let mut turns = context;
        turns.push(ContextTurn::user(message));
        debug!("Relaying message with {} prior turns", turns.len() - 1);

        let completion = self.chat_client.complete(&turns).await?;
        let reply = if completion.response.is_empty() {
            NO_REPLY_FALLBACK.to_string()
        } else {
            completion.response
        };

        turns.push(ContextTurn::assistant(reply.clone()));
        Ok(ChatResponse { reply, context: turns })
    }
}
