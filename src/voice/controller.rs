//! Spoken-conversation workflow
//!
//! Drives the capture → gateway → speech cycle as explicit transitions.
//! Every capture cycle gets a fresh generation; device callbacks, gateway
//! resolutions and speech completions carry a [`SessionTicket`] and are
//! dropped when their generation is no longer current. That is how a stop,
//! a reset or a torn-down page turns late arrivals into no-ops.
//!
//! The controller does not perform the gateway call. `on_capture_event`
//! returns a [`GatewayCall`] and the caller hands the outcome back to
//! `resolve`.

use crate::integration::config::VoiceConfig;
use crate::llm::{prompts, GatewayCall, GatewayError};
use crate::messages::{ConversationTurn, Speaker, TranscriptStore};
use crate::speech::{CaptureDevice, CaptureEvent, CaptureSink, SpeechCompletion, SpeechOutput};
use crate::voice::state::{SessionTicket, VoiceSessionState, VoiceSignal};
use crate::{CodeAiError, Result};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub struct VoiceSessionController {
    config: VoiceConfig,
    capture: Arc<dyn CaptureDevice>,
    speech: Option<Arc<dyn SpeechOutput>>,
    signals: UnboundedSender<VoiceSignal>,
    transcript: TranscriptStore,
    state: VoiceSessionState,
    generation: u64,
    notice: Option<String>,
    notice_fresh: bool,
}

impl VoiceSessionController {
    /// Create a controller.
    ///
    /// `signals` is where device callbacks and speech completions are sent;
    /// the owner of the matching receiver feeds them back through
    /// [`handle_signal`](Self::handle_signal).
    pub fn new(
        config: VoiceConfig,
        capture: Arc<dyn CaptureDevice>,
        speech: Option<Arc<dyn SpeechOutput>>,
        signals: UnboundedSender<VoiceSignal>,
    ) -> Self {
        Self {
            config,
            capture,
            speech,
            signals,
            transcript: TranscriptStore::new(),
            state: VoiceSessionState::Idle,
            generation: 0,
            notice: None,
            notice_fresh: false,
        }
    }

    pub fn state(&self) -> VoiceSessionState {
        self.state
    }

    /// Read handle on the transcript
    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    /// Last display-only error (capture unsupported, recognition failure)
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// The notice set since the last call, if any
    pub fn take_fresh_notice(&mut self) -> Option<String> {
        if std::mem::take(&mut self.notice_fresh) {
            self.notice.clone()
        } else {
            None
        }
    }

    fn set_notice(&mut self, notice: String) {
        self.notice = Some(notice);
        self.notice_fresh = true;
    }

    pub fn current_ticket(&self) -> SessionTicket {
        SessionTicket {
            generation: self.generation,
        }
    }

    fn is_current(&self, ticket: SessionTicket) -> bool {
        ticket.generation == self.generation
    }

    fn transition(&mut self, next: VoiceSessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, generation = self.generation, "voice state");
            self.state = next;
        }
    }

    /// Begin a capture cycle.
    ///
    /// Returns `Ok(None)` when a cycle is already running. Fails with
    /// [`CodeAiError::CaptureUnsupported`] when the device is absent; state
    /// and transcript are left untouched in that case.
    pub fn start_capture(&mut self) -> Result<Option<SessionTicket>> {
        if !self.state.is_idle() {
            debug!(state = %self.state, "start_capture ignored: session busy");
            return Ok(None);
        }

        if !self.capture.is_available() {
            warn!("speech capture requested but no capture device is available");
            let err = CodeAiError::CaptureUnsupported;
            self.set_notice(err.user_message());
            return Err(err);
        }

        self.generation += 1;
        let ticket = self.current_ticket();

        if self.config.reset_transcript_on_capture {
            self.transcript.clear();
        }
        self.notice = None;
        self.notice_fresh = false;
        self.transition(VoiceSessionState::Listening);

        if let Err(e) = self.capture.start(CaptureSink::new(ticket, self.signals.clone())) {
            warn!("capture device failed to start: {}", e);
            self.generation += 1;
            self.set_notice(e.user_message());
            self.transition(VoiceSessionState::Idle);
            return Err(e);
        }

        info!(generation = ticket.generation, "capture started");
        Ok(Some(ticket))
    }

    /// User-initiated early stop. Only meaningful while listening.
    pub fn stop_capture(&mut self) -> bool {
        if !self.state.is_listening() {
            debug!(state = %self.state, "stop_capture ignored");
            return false;
        }

        self.capture.stop();
        // Anything the device still reports for this capture is stale.
        self.generation += 1;
        self.transition(VoiceSessionState::Idle);
        info!("capture stopped by user");
        true
    }

    /// Route a signal from the capture device or speech output.
    pub fn handle_signal(&mut self, signal: VoiceSignal) -> Option<GatewayCall<SessionTicket>> {
        match signal {
            VoiceSignal::Capture { ticket, event } => self.on_capture_event(ticket, event),
            VoiceSignal::SpeechFinished { ticket } => {
                self.on_speech_finished(ticket);
                None
            }
        }
    }

    /// Apply a capture callback.
    ///
    /// A recognized result appends the user turn and yields the gateway call
    /// to perform.
    pub fn on_capture_event(
        &mut self,
        ticket: SessionTicket,
        event: CaptureEvent,
    ) -> Option<GatewayCall<SessionTicket>> {
        if !self.is_current(ticket) || !self.state.is_listening() {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                state = %self.state,
                ?event,
                "discarding capture event"
            );
            return None;
        }

        match event {
            CaptureEvent::Result(text) => {
                let turn = self.transcript.append(Speaker::User, text);
                debug!(sequence = turn.sequence, "user turn appended");
                self.transition(VoiceSessionState::AwaitingResponse);
                Some(GatewayCall {
                    ticket,
                    prompt: prompts::voice_prompt(&turn.text),
                })
            }
            CaptureEvent::Error(cause) => {
                warn!(%cause, "speech recognition error");
                self.set_notice(cause);
                self.generation += 1;
                self.transition(VoiceSessionState::Idle);
                None
            }
            CaptureEvent::End => {
                debug!("capture ended without a result");
                self.generation += 1;
                self.transition(VoiceSessionState::Idle);
                None
            }
        }
    }

    /// Apply the gateway outcome for `ticket`.
    ///
    /// Success and failure both append an assistant turn and are both
    /// spoken. Returns the appended turn, or `None` for stale tickets.
    pub fn resolve(
        &mut self,
        ticket: SessionTicket,
        outcome: std::result::Result<String, GatewayError>,
    ) -> Option<ConversationTurn> {
        if !self.is_current(ticket) || !self.state.is_awaiting_response() {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                state = %self.state,
                "discarding stale voice resolution"
            );
            return None;
        }

        let reply = match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "voice gateway call failed");
                prompts::voice_apology(&e.to_string())
            }
        };

        let turn = self.transcript.append(Speaker::Assistant, reply);
        self.transition(VoiceSessionState::Speaking);
        self.speak(ticket, &turn.text);
        Some(turn)
    }

    fn speak(&mut self, ticket: SessionTicket, text: &str) {
        // No speech output at all is text-only mode and stays quiet.
        let Some(speech) = self.speech.clone() else {
            self.transition(VoiceSessionState::Idle);
            return;
        };
        if !speech.is_available() {
            let err = CodeAiError::SpeechUnavailable;
            warn!("speech output present but unavailable");
            self.set_notice(err.user_message());
            self.transition(VoiceSessionState::Idle);
            return;
        }

        let completion = SpeechCompletion::new(ticket, self.signals.clone());
        if let Err(e) = speech.speak(text, completion) {
            warn!("speech output failed: {}", e);
            self.set_notice(e.user_message());
            self.transition(VoiceSessionState::Idle);
        }
    }

    /// Speech output finished the reply for `ticket`.
    pub fn on_speech_finished(&mut self, ticket: SessionTicket) -> bool {
        if !self.is_current(ticket) || !self.state.is_speaking() {
            debug!(generation = ticket.generation, "discarding stale speech completion");
            return false;
        }
        self.transition(VoiceSessionState::Idle);
        true
    }

    /// Tear the session down: stop the device, silence speech, forget the
    /// transcript and invalidate every outstanding ticket.
    pub fn reset(&mut self) {
        match self.state {
            VoiceSessionState::Listening => self.capture.stop(),
            VoiceSessionState::Speaking => {
                if let Some(speech) = &self.speech {
                    speech.cancel();
                }
            }
            _ => {}
        }
        self.generation += 1;
        self.transcript.clear();
        self.notice = None;
        self.notice_fresh = false;
        self.transition(VoiceSessionState::Idle);
        info!("voice session reset");
    }
}
