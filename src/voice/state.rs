//! Voice session states and the tagged signals that drive them

use crate::speech::capture::CaptureEvent;
use serde::Serialize;
use std::fmt;

/// Where the voice conversation currently is.
///
/// The states form one cycle:
/// `Idle -> Listening -> AwaitingResponse -> Speaking -> Idle`, with
/// `Listening -> Idle` on stop, capture error or a capture that ended
/// without a result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum VoiceSessionState {
    /// Ready for the next capture
    #[default]
    Idle,
    /// Capture device is recording
    Listening,
    /// Utterance sent to the gateway, waiting for the reply
    AwaitingResponse,
    /// Reply is being spoken
    Speaking,
}

impl VoiceSessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, VoiceSessionState::Idle)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, VoiceSessionState::Listening)
    }

    pub fn is_awaiting_response(&self) -> bool {
        matches!(self, VoiceSessionState::AwaitingResponse)
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, VoiceSessionState::Speaking)
    }

    /// Status line under the microphone button
    pub fn status_text(&self) -> &'static str {
        match self {
            VoiceSessionState::Idle => "Tap to speak",
            VoiceSessionState::Listening => "Listening...",
            VoiceSessionState::AwaitingResponse => "Processing...",
            VoiceSessionState::Speaking => "Speaking...",
        }
    }

    /// The microphone button is disabled while a reply is pending
    pub fn accepts_toggle(&self) -> bool {
        !self.is_awaiting_response()
    }
}

impl fmt::Display for VoiceSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceSessionState::Idle => write!(f, "Idle"),
            VoiceSessionState::Listening => write!(f, "Listening"),
            VoiceSessionState::AwaitingResponse => write!(f, "AwaitingResponse"),
            VoiceSessionState::Speaking => write!(f, "Speaking"),
        }
    }
}

/// Tags every device callback and gateway call with the capture cycle that
/// started it. A signal whose generation no longer matches is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionTicket {
    pub generation: u64,
}

/// Asynchronous inputs from the injected capabilities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceSignal {
    /// The capture device reported something
    Capture {
        ticket: SessionTicket,
        event: CaptureEvent,
    },
    /// The speech output finished the utterance for `ticket`
    SpeechFinished { ticket: SessionTicket },
}

impl VoiceSignal {
    pub fn ticket(&self) -> SessionTicket {
        match self {
            VoiceSignal::Capture { ticket, .. } => *ticket,
            VoiceSignal::SpeechFinished { ticket } => *ticket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(VoiceSessionState::Idle.status_text(), "Tap to speak");
        assert_eq!(VoiceSessionState::Listening.status_text(), "Listening...");
        assert_eq!(
            VoiceSessionState::AwaitingResponse.status_text(),
            "Processing..."
        );
    }

    #[test]
    fn test_toggle_disabled_while_awaiting() {
        assert!(VoiceSessionState::Idle.accepts_toggle());
        assert!(VoiceSessionState::Listening.accepts_toggle());
        assert!(!VoiceSessionState::AwaitingResponse.accepts_toggle());
    }

    #[test]
    fn test_signal_ticket() {
        let ticket = SessionTicket { generation: 3 };
        let signal = VoiceSignal::Capture {
            ticket,
            event: CaptureEvent::End,
        };
        assert_eq!(signal.ticket(), ticket);
    }
}
