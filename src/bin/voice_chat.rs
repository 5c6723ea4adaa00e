use async_trait::async_trait;
use clap::Parser;
use dotenv::dotenv;
use std::error::Error;
use std::path::Path;
use tokio::io::{ AsyncBufReadExt, BufReader };
use voice_chatbot::cli::ClientArgs;
use voice_chatbot::client::api::RelayClient;
use voice_chatbot::client::format::{ format_message_text, FormattedLine };
use voice_chatbot::client::speech::{ RecognitionConfig, Recognizer, Synthesizer, Utterance, Voice };
use voice_chatbot::client::state::{ Message, Sender };
use voice_chatbot::client::ChatController;

/// A terminal has no speech recogniser.
struct NoRecognizer;

#[async_trait]
impl Recognizer for NoRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn request_microphone(&mut self) -> bool {
        false
    }

    fn start(&mut self, _config: &RecognitionConfig) -> Result<(), String> {
        Err("speech recognition is unavailable in a terminal".to_string())
    }

    fn abort(&mut self) {}
}

/// A terminal has no speech synthesiser either.
struct NoSynthesizer;

impl Synthesizer for NoSynthesizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&mut self, _utterance: Utterance) -> Result<(), String> {
        Err("speech synthesis is unavailable in a terminal".to_string())
    }

    fn cancel(&mut self) {}
}

fn render(message: &Message) {
    match message.sender {
        Sender::User => {}
        Sender::System => println!("  [{}]", message.text),
        Sender::Bot => {
            for line in format_message_text(&message.text) {
                match line {
                    FormattedLine::Spacer => println!(),
                    FormattedLine::ListItem { marker, content } => println!("    {} {}", marker, content),
                    FormattedLine::Header(text) => println!("  {}", text),
                    FormattedLine::Paragraph { text, indent } => {
                        println!("  {}{}", " ".repeat(indent), text)
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = ClientArgs::parse();

    let relay = RelayClient::new(&args.api_url)?;
    let mut controller = ChatController::new(relay, NoRecognizer, NoSynthesizer);

    println!("Connected to {}. Commands: /new /dark /voice /upload <path> /quit", args.api_url);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "/quit" => break,
            "/new" => {
                controller.new_chat();
                shown = 0;
                println!("  [New chat]");
            }
            "/dark" => {
                let on = controller.toggle_dark_mode();
                println!("  [Dark mode {}]", if on { "on" } else { "off" });
            }
            "/voice" => {
                let on = controller.toggle_voice();
                println!("  [Voice output {}]", if on { "on" } else { "off" });
            }
            _ if line.starts_with("/upload ") => {
                let path = Path::new(line.trim_start_matches("/upload ").trim());
                match tokio::fs::read(path).await {
                    Ok(bytes) => {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| path.display().to_string());
                        controller.upload_file(&name, bytes).await;
                    }
                    Err(e) => println!("  [Cannot read {}: {}]", path.display(), e),
                }
            }
            _ => {
                if let Err(e) = controller.send_typed(line).await {
                    println!("  [{}]", e);
                }
            }
        }

        let messages = controller.session().messages();
        for message in &messages[shown.min(messages.len())..] {
            render(message);
        }
        shown = messages.len();
    }

    Ok(())
}
