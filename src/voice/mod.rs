pub mod controller;
pub mod state;

pub use controller::VoiceSessionController;
pub use state::{SessionTicket, VoiceSessionState, VoiceSignal};
