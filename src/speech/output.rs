//! Speech output capability and a terminal-backed speaker
//!
//! `speak` is fire-and-forget and last-call-wins: a new utterance cancels
//! the one in progress. The speaker reports the end of an utterance through
//! its [`SpeechCompletion`]; a cancelled utterance never completes.

use crate::voice::state::{SessionTicket, VoiceSignal};
use crate::{CodeAiError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::io::Write;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

/// Reports that an utterance finished playing.
#[derive(Debug)]
pub struct SpeechCompletion {
    ticket: SessionTicket,
    tx: UnboundedSender<VoiceSignal>,
}

impl SpeechCompletion {
    pub fn new(ticket: SessionTicket, tx: UnboundedSender<VoiceSignal>) -> Self {
        Self { ticket, tx }
    }

    pub fn ticket(&self) -> SessionTicket {
        self.ticket
    }

    pub fn finish(self) {
        let signal = VoiceSignal::SpeechFinished {
            ticket: self.ticket,
        };
        if self.tx.send(signal).is_err() {
            debug!("speech completion dropped: voice session closed");
        }
    }
}

/// Text-to-speech playback of assistant replies.
pub trait SpeechOutput: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Start speaking `text`, cancelling any utterance in progress.
    fn speak(&self, text: &str, completion: SpeechCompletion) -> Result<()>;

    /// Stop the utterance in progress, if any
    fn cancel(&self);
}

/// How long an utterance of `text` takes at `words_per_minute`.
pub fn speech_duration(text: &str, words_per_minute: u32) -> Duration {
    let words = text.split_whitespace().count() as u64;
    Duration::from_millis(words * 60_000 / u64::from(words_per_minute.max(1)))
}

/// Prefix written before each spoken line
pub const SPOKEN_PREFIX: &str = "(speaking) ";

enum SpeakerCommand {
    Speak {
        text: String,
        completion: SpeechCompletion,
    },
    Cancel,
    Shutdown,
}

/// Speaks by printing the utterance and holding for its spoken duration.
///
/// Runs on a worker thread so the voice loop never blocks on playback.
pub struct TerminalSpeaker {
    command_tx: Sender<SpeakerCommand>,
    worker: Option<JoinHandle<()>>,
}

impl TerminalSpeaker {
    /// Speaker writing to stdout
    pub fn new(words_per_minute: u32) -> Self {
        Self::with_writer(words_per_minute, std::io::stdout())
    }

    /// Speaker writing to an arbitrary sink
    pub fn with_writer<W: Write + Send + 'static>(words_per_minute: u32, writer: W) -> Self {
        let (command_tx, command_rx) = bounded(16);
        let worker = thread::spawn(move || {
            run_worker(command_rx, writer, words_per_minute);
        });

        Self {
            command_tx,
            worker: Some(worker),
        }
    }
}

fn run_worker<W: Write>(command_rx: Receiver<SpeakerCommand>, mut out: W, words_per_minute: u32) {
    info!(words_per_minute, "terminal speaker started");
    let mut pending: Option<SpeakerCommand> = None;

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => match command_rx.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        match command {
            SpeakerCommand::Speak { text, completion } => {
                if let Err(e) = writeln!(out, "{SPOKEN_PREFIX}{text}").and_then(|_| out.flush()) {
                    error!("speaker write failed: {}", e);
                }

                match command_rx.recv_timeout(speech_duration(&text, words_per_minute)) {
                    Ok(next) => {
                        debug!("utterance interrupted");
                        pending = Some(next);
                    }
                    Err(RecvTimeoutError::Timeout) => completion.finish(),
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            SpeakerCommand::Cancel => {}
            SpeakerCommand::Shutdown => break,
        }
    }

    info!("terminal speaker stopped");
}

impl SpeechOutput for TerminalSpeaker {
    fn speak(&self, text: &str, completion: SpeechCompletion) -> Result<()> {
        self.command_tx
            .send(SpeakerCommand::Speak {
                text: text.to_string(),
                completion,
            })
            .map_err(|e| CodeAiError::SpeechError(format!("speaker worker gone: {}", e)))
    }

    fn cancel(&self) {
        let _ = self.command_tx.send(SpeakerCommand::Cancel);
    }
}

impl Drop for TerminalSpeaker {
    fn drop(&mut self) {
        let _ = self.command_tx.send(SpeakerCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
