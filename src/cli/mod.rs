use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (groq, openai)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "groq")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., https://api.groq.com/openai/v1)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider.
    #[arg(long, env = "GROQ_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name sent with every chat completion.
    #[arg(long, env = "CHAT_MODEL", default_value = "llama3-8b-8192")]
    pub chat_model: String,

    /// Upper bound on tokens generated per reply.
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "500")]
    pub chat_max_tokens: u32,

    /// Sampling temperature for chat completion.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub chat_temperature: f32,

    // --- Upload Args ---
    /// Directory uploaded files are written to. Created on startup if missing.
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: String,

    /// Maximum request body size accepted by the upload endpoint, in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "10485760")]
    pub max_upload_bytes: usize,

    // --- General App Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:5000")]
    pub server_addr: String,

    /// Browser origins allowed to call the relay (comma separated).
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000,http://127.0.0.1:3000"
    )]
    pub cors_origins: Vec<String>,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

/// Settings for the terminal chat client.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal client for the voice chatbot relay", long_about = None)]
pub struct ClientArgs {
    /// Base URL of the relay backend.
    #[arg(long, env = "VOICE_CHAT_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_relay_contract() {
        let args = Args::parse_from(["voice-chatbot"]);
        assert_eq!(args.chat_model, "llama3-8b-8192");
        assert_eq!(args.chat_max_tokens, 500);
        assert!((args.chat_temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(
            args.cors_origins,
            vec!["http://localhost:3000".to_string(), "http://127.0.0.1:3000".to_string()]
        );
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let args = Args::parse_from([
            "voice-chatbot",
            "--cors-origins",
            "http://a.test,http://b.test",
        ]);
        assert_eq!(args.cors_origins.len(), 2);
        assert_eq!(args.cors_origins[1], "http://b.test");
    }
}
