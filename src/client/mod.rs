pub mod api;
pub mod format;
pub mod speech;
pub mod state;

use self::api::{ ClientError, RelayApi };
use self::speech::{
    CaptureOutcome,
    PlaybackError,
    RecognitionError,
    RecognitionEvent,
    Recognizer,
    SpeechCapture,
    SpeechPlayback,
    SynthesisEvent,
    Synthesizer,
};
use self::state::{ ChatSession, InputOrigin, MessageId, PermissionState };
use log::{ info, warn };

pub const CONNECT_ERROR_TEXT: &str =
    "Error: Failed to connect to server. Make sure the backend is running.";
pub const UPLOAD_ERROR_TEXT: &str = "Error: Failed to upload file.";
pub const LISTENING_NOTICE: &str = "🎤 Listening... Speak clearly and loudly!";
pub const SPEECH_DETECTED_NOTICE: &str = "🔊 Speech detected! Keep talking...";
pub const CAPTURE_TIPS: &str =
    "💡 Tips: Speak clearly, avoid background noise, speak within 5 seconds of clicking the microphone.";
pub const MIC_GRANTED_TEXT: &str = "✅ Microphone access granted! You can now use voice input.";
pub const MIC_DENIED_TEXT: &str =
    "❌ Microphone access denied. Please allow microphone access in your browser settings.";
pub const RECOGNITION_UNSUPPORTED_TEXT: &str =
    "Speech recognition not supported. Please use Chrome, Edge, or Safari.";
pub const RECOGNITION_START_FAILED_TEXT: &str =
    "Failed to start speech recognition. Please try refreshing the page.";
pub const SPEECH_TEST_PHRASE: &str =
    "Hello! This is a test of the speech output. If you can hear this, voice output is working correctly.";
pub const SYNTHESIS_UNSUPPORTED_TEXT: &str = "❌ Speech output not supported in this browser.";
pub const SYNTHESIS_ERROR_TEXT: &str = "❌ Speech output error. Please try again.";

/// The chat window: session state plus the relay and platform speech APIs.
pub struct ChatController<R, Rec, S> {
    relay: R,
    session: ChatSession,
    capture: SpeechCapture,
    recognizer: Rec,
    playback: SpeechPlayback<S>,
}

impl<R, Rec, S> ChatController<R, Rec, S>
    where R: RelayApi, Rec: Recognizer, S: Synthesizer
{
    pub fn new(relay: R, recognizer: Rec, synth: S) -> Self {
        Self {
            relay,
            session: ChatSession::new(),
            capture: SpeechCapture::default(),
            recognizer,
            playback: SpeechPlayback::new(synth),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn capture(&self) -> &SpeechCapture {
        &self.capture
    }

    pub fn playback(&self) -> &SpeechPlayback<S> {
        &self.playback
    }

    pub fn set_draft(&mut self, text: &str) {
        self.session.set_draft(text);
    }

    /// Sends the current draft as typed input.
    pub async fn send_draft(&mut self) -> Result<(), ClientError> {
        let draft = self.session.draft().to_string();
        self.send_typed(&draft).await
    }

    pub async fn send_typed(&mut self, input: &str) -> Result<(), ClientError> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(());
        }
        if !self.session.can_send() {
            return Err(ClientError::Busy);
        }
        self.session.push_user(text);
        self.session.take_draft();
        self.session.set_last_origin(InputOrigin::Typed);
        self.exchange(text).await;
        Ok(())
    }

    async fn send_voice(&mut self, transcript: String) -> Result<(), ClientError> {
        if !self.session.can_send() {
            // Keep the words so the user can resend once the reply lands.
            self.session.set_draft(transcript);
            return Err(ClientError::Busy);
        }
        self.session.push_user(transcript.as_str());
        self.session.take_draft();
        self.session.set_last_origin(InputOrigin::Voice);
        self.exchange(&transcript).await;
        Ok(())
    }

    async fn exchange(&mut self, message: &str) {
        self.session.set_connecting(true);
        let result = self.relay.chat(message, self.session.context().to_vec()).await;

        match result {
            Ok(resp) => {
                let id = self.session.push_bot(resp.reply.as_str());
                self.session.set_context(resp.context);

                if self.session.voice_enabled() && self.session.last_input_was_voice() {
                    if let Err(e) = self.playback.speak(&resp.reply, Some(id)) {
                        warn!("Auto speech skipped: {}", e);
                    }
                }
            }
            Err(ClientError::Status { status, message }) => {
                warn!("Relay rejected chat request ({}): {}", status, message);
                self.session.push_bot(format!("Error: {}", message));
            }
            Err(e) => {
                warn!("Chat error: {}", e);
                self.session.push_bot(CONNECT_ERROR_TEXT);
            }
        }

        self.session.set_last_origin(InputOrigin::Typed);
        self.session.set_connecting(false);
    }

    pub async fn test_microphone(&mut self) -> bool {
        let granted = self.recognizer.request_microphone().await;
        if granted {
            self.session.set_microphone(PermissionState::Granted);
            self.session.push_bot(MIC_GRANTED_TEXT);
        } else {
            self.session.set_microphone(PermissionState::Denied);
            self.session.push_bot(MIC_DENIED_TEXT);
        }
        granted
    }

    pub async fn start_listening(&mut self) -> Result<(), ClientError> {
        if self.capture.is_listening() {
            return Err(ClientError::CaptureInProgress);
        }

        if !self.recognizer.request_microphone().await {
            self.session.set_microphone(PermissionState::Denied);
            self.session.push_bot(MIC_DENIED_TEXT);
            return Ok(());
        }
        self.session.set_microphone(PermissionState::Granted);

        if !self.recognizer.is_supported() {
            self.session.push_bot(RECOGNITION_UNSUPPORTED_TEXT);
            return Ok(());
        }

        self.capture.begin().map_err(|_| ClientError::CaptureInProgress)?;
        if let Err(e) = self.recognizer.start(self.capture.config()) {
            warn!("Failed to create speech recognition: {}", e);
            self.capture.reset();
            self.session.push_bot(RECOGNITION_START_FAILED_TEXT);
        }
        Ok(())
    }

    pub fn stop_listening(&mut self) {
        if self.capture.is_listening() {
            self.recognizer.abort();
        }
    }

    pub async fn handle_recognition_event(
        &mut self,
        event: RecognitionEvent
    ) -> Result<(), ClientError> {
        match self.capture.handle(event) {
            CaptureOutcome::Started => {
                self.session.show_notice(LISTENING_NOTICE);
            }
            CaptureOutcome::SpeechDetected => {
                self.session.show_notice(SPEECH_DETECTED_NOTICE);
            }
            CaptureOutcome::SpeechEnded | CaptureOutcome::Ended => {
                self.session.dismiss_notice();
            }
            CaptureOutcome::Interim(text) => {
                self.session.set_draft(text);
            }
            CaptureOutcome::Transcript(text) => {
                self.session.dismiss_notice();
                info!("Processing final transcript: {}", text);
                return self.send_voice(text).await;
            }
            CaptureOutcome::Failed(err) => {
                self.session.dismiss_notice();
                if err == RecognitionError::NotAllowed {
                    self.session.set_microphone(PermissionState::Denied);
                }
                self.session.push_bot(err.user_message());
            }
            CaptureOutcome::EndedWithoutResult => {
                self.session.dismiss_notice();
                self.session.push_system(CAPTURE_TIPS);
            }
            CaptureOutcome::Ignored => {}
        }
        Ok(())
    }

    /// Explicit playback of one reply. Not gated by the voice toggle.
    pub fn play_message(&mut self, id: MessageId) -> Result<(), PlaybackError> {
        let text = self.session
            .message(id)
            .map(|m| m.text.clone())
            .ok_or(PlaybackError::UnknownMessage(id))?;
        self.playback.speak(&text, Some(id))
    }

    pub fn stop_speaking(&mut self) {
        self.playback.stop();
    }

    pub fn test_speech_output(&mut self) {
        self.session.push_bot(format!("Testing speech output: \"{}\"", SPEECH_TEST_PHRASE));
        if !self.session.voice_enabled() {
            info!("Voice output disabled");
            return;
        }
        match self.playback.speak(SPEECH_TEST_PHRASE, None) {
            Ok(()) => {}
            Err(PlaybackError::Unsupported) => {
                self.session.push_system(SYNTHESIS_UNSUPPORTED_TEXT);
            }
            Err(e) => {
                warn!("{}", e);
                self.session.push_system(SYNTHESIS_ERROR_TEXT);
            }
        }
    }

    pub fn handle_synthesis_event(&mut self, event: SynthesisEvent) {
        self.playback.handle_event(&event);
        if let SynthesisEvent::Error { message: None, .. } = event {
            self.session.push_system(SYNTHESIS_ERROR_TEXT);
        }
    }

    pub async fn upload_file(&mut self, filename: &str, bytes: Vec<u8>) {
        match self.relay.upload(filename, bytes).await {
            Ok(resp) => {
                self.session.push_bot(resp.message);
            }
            Err(e) => {
                warn!("Upload error: {}", e);
                self.session.push_bot(UPLOAD_ERROR_TEXT);
            }
        }
    }

    pub fn new_chat(&mut self) {
        self.playback.stop();
        self.session.new_chat();
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.session.toggle_dark_mode()
    }

    /// Turning voice output off also silences the current utterance.
    pub fn toggle_voice(&mut self) -> bool {
        let enabled = self.session.toggle_voice();
        if !enabled {
            self.playback.stop();
        }
        enabled
    }
}
