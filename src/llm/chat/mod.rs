pub mod openai;
pub mod groq;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::sync::Arc;
use super::{ GenerationParams, LlmConfig, LlmType };
use self::openai::OpenAIChatClient;
use self::groq::GroqChatClient;
use crate::models::chat::ContextTurn;
use log::debug;
use reqwest;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the full ordered turn sequence and returns the assistant reply.
    /// An empty `response` means the provider produced no content.
    async fn complete(
        &self,
        messages: &[ContextTurn]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: Vec<CompletionMessage<'a>>,
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionChoiceMessage>,
}

#[derive(Deserialize)]
struct CompletionChoiceMessage {
    content: Option<String>,
}

/// Shared body of the OpenAI-compatible `/chat/completions` call used by every adapter.
pub async fn http_chat_completion(
    http: &reqwest::Client,
    base_url: &str,
    params: &GenerationParams,
    messages: &[ContextTurn],
) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

    let req = CompletionRequest {
        messages: messages
            .iter()
            .map(|turn| CompletionMessage { role: turn.role.as_str(), content: &turn.content })
            .collect(),
        model: &params.model,
        max_tokens: params.max_tokens,
        temperature: params.temperature,
    };

    debug!("POST {} with {} turns (model {})", url, messages.len(), params.model);

    let resp = http.post(&url)
        .json(&req)
        .send()
        .await?
        .error_for_status()?
        .json::<CompletionReply>()
        .await?;

    let content = resp.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default();

    Ok(CompletionResponse { response: content })
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Groq => {
            let specific_client = GroqChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_json, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    #[tokio::test]
    async fn sends_turns_in_order_with_fixed_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_json(json!({
                "messages": [
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "hi" },
                    { "role": "user", "content": "how are you" }
                ],
                "model": "llama3-8b-8192",
                "max_tokens": 500,
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "fine" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let turns = vec![
            ContextTurn::user("hello"),
            ContextTurn::assistant("hi"),
            ContextTurn::user("how are you"),
        ];
        let http = reqwest::Client::new();
        let resp = http_chat_completion(&http, &server.uri(), &GenerationParams::default(), &turns)
            .await
            .unwrap();
        assert_eq!(resp.response, "fine");
    }

    #[tokio::test]
    async fn missing_choices_yield_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let resp = http_chat_completion(
            &http,
            &server.uri(),
            &GenerationParams::default(),
            &[ContextTurn::user("hello")]
        ).await.unwrap();
        assert!(resp.response.is_empty());
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let result = http_chat_completion(
            &http,
            &server.uri(),
            &GenerationParams::default(),
            &[ContextTurn::user("hello")]
        ).await;
        assert!(result.is_err());
    }
}
