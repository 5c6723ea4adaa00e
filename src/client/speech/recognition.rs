use async_trait::async_trait;
use log::{ debug, info, warn };
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    pub lang: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            continuous: false,
            interim_results: true,
            max_alternatives: 3,
        }
    }
}

/// One recogniser result; `alternatives[0]` is the best guess.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub alternatives: Vec<String>,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(transcript: &str) -> Self {
        Self { alternatives: vec![transcript.to_string()], is_final: false }
    }

    pub fn final_result(transcript: &str) -> Self {
        Self { alternatives: vec![transcript.to_string()], is_final: true }
    }

    fn transcript(&self) -> &str {
        self.alternatives.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Network,
    Aborted,
    Other(String),
}

impl RecognitionError {
    /// Maps the platform's error code (`"no-speech"`, `"not-allowed"`, ...).
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => RecognitionError::NoSpeech,
            "audio-capture" => RecognitionError::AudioCapture,
            "not-allowed" => RecognitionError::NotAllowed,
            "network" => RecognitionError::Network,
            "aborted" => RecognitionError::Aborted,
            other => RecognitionError::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            RecognitionError::NoSpeech => "no-speech",
            RecognitionError::AudioCapture => "audio-capture",
            RecognitionError::NotAllowed => "not-allowed",
            RecognitionError::Network => "network",
            RecognitionError::Aborted => "aborted",
            RecognitionError::Other(code) => code,
        }
    }

    /// Inline chat text shown for this failure.
    pub fn user_message(&self) -> String {
        match self {
            RecognitionError::NoSpeech =>
                "🎤 No speech detected. Try speaking louder, closer to the microphone, or in a quieter environment.".to_string(),
            RecognitionError::AudioCapture =>
                "❌ Microphone error. Please check your microphone connection.".to_string(),
            RecognitionError::NotAllowed =>
                "❌ Microphone access denied. Please allow microphone access.".to_string(),
            RecognitionError::Network =>
                "🌐 Network error. Please check your internet connection.".to_string(),
            RecognitionError::Aborted => "⏹️ Speech recognition was stopped.".to_string(),
            RecognitionError::Other(code) =>
                format!("❌ Speech recognition error: {}. Please try again.", code),
        }
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Callbacks delivered by the platform recogniser.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Start,
    SpeechStart,
    SpeechEnd,
    Result { result_index: usize, results: Vec<RecognitionResult> },
    Error(RecognitionError),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Started,
    SpeechDetected,
    SpeechEnded,
    /// Partial text to mirror into the input box.
    Interim(String),
    /// Final transcript; submit it as a chat message.
    Transcript(String),
    Failed(RecognitionError),
    /// Session closed with neither a transcript nor an error.
    EndedWithoutResult,
    /// Session closed after its outcome was already reported.
    Ended,
    Ignored,
}

/// Platform speech recogniser (the browser's SpeechRecognition object).
#[async_trait]
pub trait Recognizer: Send {
    fn is_supported(&self) -> bool;

    /// Asks for microphone access and releases it immediately.
    async fn request_microphone(&mut self) -> bool;

    fn start(&mut self, config: &RecognitionConfig) -> Result<(), String>;

    fn abort(&mut self);
}

/// Single-session capture state machine over [`RecognitionEvent`]s.
#[derive(Debug)]
pub struct SpeechCapture {
    config: RecognitionConfig,
    state: CaptureState,
    /// Sessions settled by a result or error whose trailing `End` has not
    /// arrived yet. Those `End`s are silent, even once a new session is open.
    pending_ends: usize,
}

impl Default for SpeechCapture {
    fn default() -> Self {
        Self::new(RecognitionConfig::default())
    }
}

impl SpeechCapture {
    pub fn new(config: RecognitionConfig) -> Self {
        Self { config, state: CaptureState::Idle, pending_ends: 0 }
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    /// Opens a capture session. Only one may be active at a time.
    pub fn begin(&mut self) -> Result<(), CaptureBusy> {
        if self.is_listening() {
            return Err(CaptureBusy);
        }
        self.state = CaptureState::Listening;
        Ok(())
    }

    /// Drops the session without an outcome (the recogniser failed to start).
    pub fn reset(&mut self) {
        self.state = CaptureState::Idle;
    }

    pub fn handle(&mut self, event: RecognitionEvent) -> CaptureOutcome {
        if matches!(event, RecognitionEvent::End) && self.pending_ends > 0 {
            self.pending_ends -= 1;
            return CaptureOutcome::Ended;
        }
        if !self.is_listening() {
            return CaptureOutcome::Ignored;
        }

        match event {
            RecognitionEvent::Start => {
                info!("Speech recognition started");
                CaptureOutcome::Started
            }
            RecognitionEvent::SpeechStart => CaptureOutcome::SpeechDetected,
            RecognitionEvent::SpeechEnd => CaptureOutcome::SpeechEnded,
            RecognitionEvent::Result { result_index, results } => {
                let mut final_text = String::new();
                let mut interim_text = String::new();
                for result in results.iter().skip(result_index) {
                    if result.is_final {
                        final_text.push_str(result.transcript());
                    } else {
                        interim_text.push_str(result.transcript());
                    }
                }
                debug!("Final: '{}' Interim: '{}'", final_text, interim_text);

                let transcript = final_text.trim();
                if !transcript.is_empty() {
                    self.state = CaptureState::Idle;
                    self.pending_ends += 1;
                    CaptureOutcome::Transcript(transcript.to_string())
                } else if !interim_text.is_empty() {
                    CaptureOutcome::Interim(format!("{}{}", final_text, interim_text))
                } else {
                    CaptureOutcome::Ignored
                }
            }
            RecognitionEvent::Error(err) => {
                warn!("Speech recognition error: {}", err);
                self.state = CaptureState::Idle;
                self.pending_ends += 1;
                CaptureOutcome::Failed(err)
            }
            RecognitionEvent::End => {
                info!("Speech recognition ended without a result");
                self.state = CaptureState::Idle;
                CaptureOutcome::EndedWithoutResult
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureBusy;

impl fmt::Display for CaptureBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("speech capture already in progress")
    }
}

impl std::error::Error for CaptureBusy {}
