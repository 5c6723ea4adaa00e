use async_trait::async_trait;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use std::error::Error as StdError;

use super::{http_chat_completion, ChatClient, CompletionResponse};
use crate::llm::{GenerationParams, LlmConfig};
use crate::models::chat::ContextTurn;

pub struct OpenAIChatClient {
    http: HttpClient,
    params: GenerationParams,
    base_url: String,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        params: GenerationParams,
        base_url: Option<String>,
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self { http, params, base_url: api_url })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "OpenAI API key is required".to_string())?;

        Self::new(api_key, config.params.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
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
