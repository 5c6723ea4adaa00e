use crate::cli::Args;
use crate::models::chat::{ ChatRequest, ChatResponse, ErrorResponse };
use crate::models::upload::UploadResponse;
use crate::relay::ChatRelay;
use crate::upload::UploadStore;
use std::error::Error;
use std::net::SocketAddr;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ DefaultBodyLimit, Multipart, State },
    extract::multipart::{ MultipartError, MultipartRejection },
    extract::rejection::JsonRejection,
    response::{ IntoResponse, Response },
    http::{ header::CONTENT_TYPE, HeaderValue, Method, StatusCode },
};
use thiserror::Error as ThisError;
use tower_http::cors::{ AllowOrigin, CorsLayer };
use log::{ info, warn, error };

pub const LIVENESS_TEXT: &str = "Voice Chatbot Backend";

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("Message is required")]
    MissingMessage,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Failed to get response from the language model provider. Check your API key.")]
    Provider,
    #[error("No file uploaded.")]
    MissingFile,
    #[error("Invalid upload: {message}")]
    InvalidUpload {
        status: StatusCode,
        message: String,
    },
    #[error("Failed to store uploaded file.")]
    Storage,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingMessage
            | ApiError::InvalidBody(_)
            | ApiError::MissingFile => StatusCode::BAD_REQUEST,
            ApiError::InvalidUpload { status, .. } => *status,
            ApiError::Provider | ApiError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidUpload { status: e.status(), message: e.body_text() }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::InvalidUpload { status: e.status(), message: e.body_text() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub relay: ChatRelay,
    pub uploads: UploadStore,
}

pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, Box<dyn Error + Send + Sync>> {
    let origins = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(|o| {
            if o == "*" {
                return Err("Wildcard CORS origin '*' cannot be combined with credentials".to_string());
            }
            HeaderValue::from_str(o).map_err(|e| format!("Invalid CORS origin '{}': {}", o, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true))
}

pub fn router(state: AppState, args: &Args) -> Result<Router, Box<dyn Error + Send + Sync>> {
    let cors = cors_layer(&args.cors_origins)?;

    Ok(Router::new()
        .route("/", get(root_handler))
        .route("/chat", post(chat_handler))
        .route(
            "/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(args.max_upload_bytes))
        )
        .layer(cors)
        .with_state(state))
}

pub async fn start_http_server(
    addr: &str,
    state: AppState,
    args: Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(state, &args)?;

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("TLS enabled without cert/key".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("HTTPS server listening on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            e
        })?;
        info!("HTTP server listening on: http://{}", addr);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn root_handler() -> &'static str {
    LIVENESS_TEXT
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let message = match req.message {
        Some(m) if !m.is_empty() => m,
        _ => {
            warn!("Rejected chat request without a message");
            return Err(ApiError::MissingMessage);
        }
    };
    let context = req.context.unwrap_or_default();

    match state.relay.relay(&message, context).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            error!("LLM provider error: {}", e);
            Err(ApiError::Provider)
        }
    }
}

async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };

        let bytes = field.bytes().await?;
        let stored = state.uploads.save(&original_name, &bytes).await.map_err(|e| {
            error!("Failed to write upload '{}': {}", original_name, e);
            ApiError::Storage
        })?;
        info!("Uploaded '{}' ({} bytes) to {}", original_name, bytes.len(), stored.display());

        return Ok(Json(UploadResponse::for_file(&original_name)));
    }

    Err(ApiError::MissingFile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ContextTurn;
    use crate::relay::tests::ScriptedClient;
    use axum::body::{ to_bytes, Body };
    use axum::http::Request;
    use clap::Parser;
    use serde_json::{ json, Value };
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "voicechatboundary";

    async fn app_with(client: Arc<ScriptedClient>, dir: &std::path::Path) -> Router {
        app_with_args(client, dir, &["voice-chatbot"]).await
    }

    async fn app_with_args(
        client: Arc<ScriptedClient>,
        dir: &std::path::Path,
        argv: &[&str],
    ) -> Router {
        let state = AppState {
            relay: ChatRelay::with_client(client),
            uploads: UploadStore::open(dir).await.unwrap(),
        };
        let args = Args::parse_from(argv);
        router(state, &args).unwrap()
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match filename {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn liveness_returns_text() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_with(ScriptedClient::replying("x"), tmp.path()).await;

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], LIVENESS_TEXT.as_bytes());
    }

    #[tokio::test]
    async fn chat_returns_reply_and_extended_context() {
        let tmp = tempfile::tempdir().unwrap();
        let client = ScriptedClient::replying("hi there");
        let app = app_with(client.clone(), tmp.path()).await;

        let resp = app.oneshot(chat_request(json!({ "message": "hello" }))).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            json!({
                "reply": "hi there",
                "context": [
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "hi there" }
                ]
            })
        );
        assert_eq!(client.calls.lock().unwrap()[0], vec![ContextTurn::user("hello")]);
    }

    #[tokio::test]
    async fn chat_without_message_is_rejected_before_the_provider() {
        let tmp = tempfile::tempdir().unwrap();
        let client = ScriptedClient::replying("unused");
        let app = app_with(client.clone(), tmp.path()).await;

        for body in [json!({}), json!({ "message": "" }), json!({ "context": [] })] {
            let resp = app.clone().oneshot(chat_request(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(resp).await, json!({ "error": "Message is required" }));
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let tmp = tempfile::tempdir().unwrap();
        let client = ScriptedClient::replying("unused");
        let app = app_with(client.clone(), tmp.path()).await;

        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await["error"].is_string());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_generic_server_error() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_with(ScriptedClient::failing(), tmp.path()).await;

        let resp = app.oneshot(chat_request(json!({ "message": "hello" }))).await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        let error = body["error"].as_str().unwrap();
        assert!(!error.contains("401"));
        assert!(body.get("context").is_none());
    }

    #[tokio::test]
    async fn upload_stores_file_and_echoes_original_name() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_with(ScriptedClient::replying("x"), tmp.path()).await;

        let resp = app
            .oneshot(multipart_request(&[
                ("note", None, "ignored"),
                ("file", Some("my report.txt"), "hello world"),
            ]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert!(body["message"].as_str().unwrap().contains("my report.txt"));

        let stored: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(stored.len(), 1);
        let path = stored[0].as_ref().unwrap().path();
        assert!(path.to_string_lossy().ends_with("-my report.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello world");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_with(ScriptedClient::replying("x"), tmp.path()).await;

        let resp = app
            .oneshot(multipart_request(&[("note", None, "just text")]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await, json!({ "error": "No file uploaded." }));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn upload_with_empty_filename_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_with(ScriptedClient::replying("x"), tmp.path()).await;

        let resp = app
            .oneshot(multipart_request(&[("file", Some(""), "nameless")]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await, json!({ "error": "No file uploaded." }));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_payload_too_large() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_with_args(
            ScriptedClient::replying("x"),
            tmp.path(),
            &["voice-chatbot", "--max-upload-bytes", "100"]
        ).await;

        let big = "x".repeat(1000);
        let resp = app
            .oneshot(multipart_request(&[("file", Some("big.bin"), &big)]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(json_body(resp).await["error"].is_string());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn cors_allows_only_configured_origins() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app_with(ScriptedClient::replying("x"), tmp.path()).await;

        let preflight = |origin: &str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/chat")
                .header("origin", origin)
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app.clone().oneshot(preflight("http://localhost:3000")).await.unwrap();
        assert_eq!(
            allowed.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            allowed.headers().get("access-control-allow-credentials").unwrap(),
            "true"
        );

        let denied = app.oneshot(preflight("http://evil.test")).await.unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[test]
    fn invalid_origin_is_a_config_error() {
        assert!(cors_layer(&["http://ok.test".to_string(), "bad\norigin".to_string()]).is_err());
    }

    #[test]
    fn wildcard_origin_is_a_config_error() {
        assert!(cors_layer(&["*".to_string()]).is_err());
        assert!(cors_layer(&["http://ok.test".to_string(), " * ".to_string()]).is_err());
    }
}
