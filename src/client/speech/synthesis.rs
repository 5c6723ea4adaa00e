use crate::client::state::MessageId;
use log::{ debug, info, warn };
use thiserror::Error;

pub const SPEECH_PITCH: f32 = 1.0;
pub const SPEECH_RATE: f32 = 0.9;
pub const SPEECH_VOLUME: f32 = 0.8;

/// Name fragments of voices that read replies best.
const PREFERRED_VOICE_HINTS: [&str; 5] = ["female", "zira", "hazel", "samantha", "karen"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
    pub gender: Option<String>,
}

impl Voice {
    pub fn new(name: &str, lang: &str) -> Self {
        Self { name: name.to_string(), lang: lang.to_string(), gender: None }
    }

    fn is_english(&self) -> bool {
        self.lang.starts_with("en")
    }

    fn is_preferred(&self) -> bool {
        let name = self.name.to_lowercase();
        PREFERRED_VOICE_HINTS.iter().any(|hint| name.contains(hint))
            || self.gender.as_deref() == Some("female")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<Voice>,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: &str, voice: Option<Voice>) -> Self {
        Self {
            text: text.to_string(),
            voice,
            pitch: SPEECH_PITCH,
            rate: SPEECH_RATE,
            volume: SPEECH_VOLUME,
        }
    }
}

/// English preferred voice, then any English voice, then the first one.
pub fn select_voice(voices: &[Voice]) -> Option<&Voice> {
    voices
        .iter()
        .find(|v| v.is_english() && v.is_preferred())
        .or_else(|| voices.iter().find(|v| v.is_english()))
        .or_else(|| voices.first())
}

/// Platform speech synthesiser (the browser's speechSynthesis object).
pub trait Synthesizer: Send {
    fn is_supported(&self) -> bool;
    fn voices(&self) -> Vec<Voice>;
    fn speak(&mut self, utterance: Utterance) -> Result<(), String>;
    fn cancel(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    Ended(Option<MessageId>),
    Error { message: Option<MessageId>, error: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum PlaybackError {
    #[error("speech synthesis is not supported")]
    Unsupported,
    #[error("no message with id {0}")]
    UnknownMessage(MessageId),
    #[error("speech synthesis failed: {0}")]
    Failed(String),
}

/// Speaks one utterance at a time and remembers which message it belongs to.
pub struct SpeechPlayback<S> {
    synth: S,
    speaking: Option<MessageId>,
}

impl<S: Synthesizer> SpeechPlayback<S> {
    pub fn new(synth: S) -> Self {
        Self { synth, speaking: None }
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn speaking(&self) -> Option<MessageId> {
        self.speaking
    }

    /// Cancels whatever is playing and speaks `text`.
    pub fn speak(&mut self, text: &str, message: Option<MessageId>) -> Result<(), PlaybackError> {
        if !self.synth.is_supported() {
            warn!("Speech synthesis not supported");
            return Err(PlaybackError::Unsupported);
        }
        self.stop();

        let voices = self.synth.voices();
        let voice = select_voice(&voices).cloned();
        match &voice {
            Some(v) => debug!("Selected voice: {}", v.name),
            None => debug!("No voices reported, using platform default"),
        }

        self.synth
            .speak(Utterance::new(text, voice))
            .map_err(PlaybackError::Failed)?;
        self.speaking = message;
        info!("Speaking message {:?}", message);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.synth.cancel();
        self.speaking = None;
    }

    /// Clears tracking when the utterance for `message` ends or fails.
    pub fn handle_event(&mut self, event: &SynthesisEvent) {
        let message = match event {
            SynthesisEvent::Ended(message) => message,
            SynthesisEvent::Error { message, error } => {
                warn!("Speech synthesis error: {}", error);
                message
            }
        };
        if self.speaking == *message {
            self.speaking = None;
        }
    }
}
