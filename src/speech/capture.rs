//! Speech capture capability
//!
//! A capture device is injected into the voice controller. Its callbacks
//! (result, error, end) are delivered through a [`CaptureSink`] that tags
//! each event with the session ticket of the capture that produced it.

use crate::voice::state::{SessionTicket, VoiceSignal};
use crate::{CodeAiError, Result};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Callback events from a capture device
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Recognized text (may be empty)
    Result(String),
    /// The recognition engine failed, e.g. no speech detected
    Error(String),
    /// The engine stopped listening
    End,
}

/// Delivers device callbacks for one capture back to the voice controller.
#[derive(Clone, Debug)]
pub struct CaptureSink {
    ticket: SessionTicket,
    tx: UnboundedSender<VoiceSignal>,
}

impl CaptureSink {
    pub fn new(ticket: SessionTicket, tx: UnboundedSender<VoiceSignal>) -> Self {
        Self { ticket, tx }
    }

    pub fn ticket(&self) -> SessionTicket {
        self.ticket
    }

    pub fn result(&self, text: impl Into<String>) {
        self.emit(CaptureEvent::Result(text.into()));
    }

    pub fn error(&self, cause: impl Into<String>) {
        self.emit(CaptureEvent::Error(cause.into()));
    }

    pub fn end(&self) {
        self.emit(CaptureEvent::End);
    }

    fn emit(&self, event: CaptureEvent) {
        let signal = VoiceSignal::Capture {
            ticket: self.ticket,
            event,
        };
        if self.tx.send(signal).is_err() {
            debug!("capture event dropped: voice session closed");
        }
    }
}

/// The speech-to-text input source.
pub trait CaptureDevice: Send + Sync {
    /// Whether the device exists at all. Checked before every `start`.
    fn is_available(&self) -> bool;

    /// Begin listening; callbacks go to `sink`.
    fn start(&self, sink: CaptureSink) -> Result<()>;

    /// Stop listening early
    fn stop(&self);
}

/// Stand-in for platforms without speech recognition.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCapture;

impl CaptureDevice for UnavailableCapture {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&self, _sink: CaptureSink) -> Result<()> {
        Err(CodeAiError::CaptureUnsupported)
    }

    fn stop(&self) {}
}

/// Capture device fed by typed text.
///
/// Used by the terminal front-end: while listening, the next line the user
/// enters is delivered as the recognized utterance.
#[derive(Debug, Default)]
pub struct TypedCapture {
    active: Mutex<Option<CaptureSink>>,
}

impl TypedCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Deliver `text` as the result of the active capture, then end it.
    ///
    /// Returns `false` when no capture is active.
    pub fn deliver(&self, text: &str) -> bool {
        let Some(sink) = self.active.lock().take() else {
            return false;
        };
        sink.result(text);
        sink.end();
        true
    }

    /// Report a recognition failure for the active capture.
    pub fn fail(&self, cause: &str) -> bool {
        let Some(sink) = self.active.lock().take() else {
            return false;
        };
        sink.error(cause);
        sink.end();
        true
    }
}

impl CaptureDevice for TypedCapture {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&self, sink: CaptureSink) -> Result<()> {
        let mut active = self.active.lock();
        if active.is_some() {
            warn!("typed capture restarted while a capture was active");
        }
        *active = Some(sink);
        Ok(())
    }

    fn stop(&self) {
        if let Some(sink) = self.active.lock().take() {
            sink.end();
        }
    }
}
