use crate::models::chat::{ ChatRequest, ChatResponse, ContextTurn, ErrorResponse };
use crate::models::upload::UploadResponse;
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{ Form, Part };
use reqwest::{ Client as HttpClient, Response };
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to reach relay: {0}")]
    Network(#[from] reqwest::Error),
    #[error("relay returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("a chat request is already in flight")]
    Busy,
    #[error("speech capture already in progress")]
    CaptureInProgress,
    #[error("invalid relay URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Operations the chat window needs from the relay backend.
#[async_trait]
pub trait RelayApi: Send + Sync {
    async fn chat(
        &self,
        message: &str,
        context: Vec<ContextTurn>
    ) -> Result<ChatResponse, ClientError>;

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, ClientError>;
}

pub struct RelayClient {
    http: HttpClient,
    base_url: Url,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http: HttpClient::new(), base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(route)?)
    }

    /// Turns a non-2xx reply into `ClientError::Status`, keeping the relay's `{error}` text.
    async fn check(resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = match resp.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP error! status: {}", status.as_u16()),
        };
        Err(ClientError::Status { status: status.as_u16(), message })
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn chat(
        &self,
        message: &str,
        context: Vec<ContextTurn>
    ) -> Result<ChatResponse, ClientError> {
        let url = self.endpoint("chat")?;
        debug!("POST {} ({} context turns)", url, context.len());
        let req = ChatRequest {
            message: Some(message.to_string()),
            context: Some(context),
        };
        let resp = self.http.post(url).json(&req).send().await?;
        Ok(Self::check(resp).await?.json::<ChatResponse>().await?)
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, ClientError> {
        let url = self.endpoint("upload")?;
        debug!("POST {} ({} bytes)", url, bytes.len());
        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));
        let resp = self.http.post(url).multipart(form).send().await?;
        Ok(Self::check(resp).await?.json::<UploadResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_json, body_string_contains, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    #[tokio::test]
    async fn chat_posts_message_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({
                "message": "again",
                "context": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reply": "ok",
                "context": [
                    { "role": "user", "content": "hello" },
                    { "role": "user", "content": "again" },
                    { "role": "assistant", "content": "ok" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RelayClient::new(&server.uri()).unwrap();
        let resp = client.chat("again", vec![ContextTurn::user("hello")]).await.unwrap();
        assert_eq!(resp.reply, "ok");
        assert_eq!(resp.context.len(), 3);
    }

    #[tokio::test]
    async fn server_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "provider down" })))
            .mount(&server)
            .await;

        let client = RelayClient::new(&server.uri()).unwrap();
        match client.chat("hello", Vec::new()).await {
            Err(ClientError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "provider down");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn upload_sends_file_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(body_string_contains("filename=\"notes.txt\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "File notes.txt uploaded successfully."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RelayClient::new(&server.uri()).unwrap();
        let resp = client.upload("notes.txt", b"abc".to_vec()).await.unwrap();
        assert!(resp.message.contains("notes.txt"));
    }

    #[test]
    fn base_path_is_preserved() {
        let client = RelayClient::new("http://localhost:5000/api").unwrap();
        assert_eq!(client.endpoint("chat").unwrap().as_str(), "http://localhost:5000/api/chat");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(RelayClient::new("not a url"), Err(ClientError::InvalidUrl(_))));
    }
}
