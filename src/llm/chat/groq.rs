use async_trait::async_trait;
use log::warn;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use std::error::Error as StdError;

use super::{http_chat_completion, ChatClient, CompletionResponse};
use crate::llm::{GenerationParams, LlmConfig};
use crate::models::chat::ContextTurn;

const GROQ_DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqChatClient {
    http: HttpClient,
    params: GenerationParams,
    base_url: String,
}

impl GroqChatClient {
    pub fn new(
        api_key: Option<String>,
        params: GenerationParams,
        base_url: Option<String>,
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_url = base_url.unwrap_or_else(|| GROQ_DEFAULT_BASE_URL.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", key))
                        .map_err(|e| format!("Invalid API key format: {}", e))?
                );
            }
            None => {
                // Startup still succeeds; the provider rejects each call instead.
                warn!("No Groq API key configured. Chat requests will fail until GROQ_API_KEY is set.");
            }
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            params,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Self::new(
            config.api_key.clone(),
            config.params.clone(),
            config.base_url.clone(),
        )
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(
        &self,
        messages: &[ContextTurn]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        http_chat_completion(&self.http, &self.base_url, &self.params, messages).await
    }

    fn get_model(&self) -> String {
        self.params.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
