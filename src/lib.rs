pub mod models;
pub mod server;
pub mod llm;
pub mod cli;
pub mod relay;
pub mod upload;
pub mod client;

use cli::Args;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model);
    info!("Max Tokens: {}", args.chat_max_tokens);
    info!("Temperature: {}", args.chat_temperature);
    info!("Upload Directory: {}", args.upload_dir);
    info!("Max Upload Bytes: {}", args.max_upload_bytes);
    info!("CORS Origins: {}", args.cors_origins.join(", "));
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let server = Server::new(args).await?;
    server.run().await?;

    Ok(())
}
