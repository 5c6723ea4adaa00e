pub mod recognition;
pub mod synthesis;

pub use recognition::{
    CaptureOutcome,
    CaptureState,
    RecognitionConfig,
    RecognitionError,
    RecognitionEvent,
    RecognitionResult,
    Recognizer,
    SpeechCapture,
};
pub use synthesis::{ PlaybackError, SpeechPlayback, SynthesisEvent, Synthesizer, Utterance, Voice };
