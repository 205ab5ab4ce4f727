//! Injected speech capabilities: capture (speech-to-text input) and output
//! (text-to-speech playback).

pub mod capture;
pub mod output;

pub use capture::{CaptureDevice, CaptureEvent, CaptureSink, TypedCapture, UnavailableCapture};
pub use output::{speech_duration, SpeechCompletion, SpeechOutput, TerminalSpeaker};
