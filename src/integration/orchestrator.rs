//! Orchestrator for the tool and voice workflows
//!
//! One task owns both controllers and processes one input at a time:
//! presentation commands, capture/speech signals and gateway resolutions.
//! Gateway calls are the only work that suspends; each is spawned with the
//! ticket of the transition that issued it, and its outcome comes back as an
//! ordinary input. Controllers drop outcomes whose ticket is stale.

use crate::integration::config::AppConfig;
use crate::llm::{invoke_with_timeout, GatewayCall, GatewayError, GeminiGateway, ModelGateway};
use crate::messages::TranscriptStore;
use crate::speech::{CaptureDevice, SpeechOutput, UnavailableCapture};
use crate::state::{AppCommand, AppEvent, AppState, SharedAppState, ToolView};
use crate::tools::{ToolKind, ToolRequestController, ToolTicket};
use crate::voice::{SessionTicket, VoiceSessionController, VoiceSignal};
use crate::{CodeAiError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

type Outcome = std::result::Result<String, GatewayError>;

/// A finished gateway call, routed back to the controller that issued it
#[derive(Debug)]
enum Resolution {
    Tool { ticket: ToolTicket, outcome: Outcome },
    Voice { ticket: SessionTicket, outcome: Outcome },
}

/// Handle for driving the orchestrator from presentation or tests
pub struct OrchestratorHandle {
    command_tx: UnboundedSender<AppCommand>,
    event_rx: UnboundedReceiver<AppEvent>,
    state: SharedAppState,
    transcript: TranscriptStore,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: AppCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| CodeAiError::ChannelError(format!("Failed to send command: {}", e)))
    }

    pub fn select_tool(&self, kind: ToolKind) -> Result<()> {
        self.send_command(AppCommand::SelectTool(kind))
    }

    pub fn submit(&self, source_text: impl Into<String>, language: impl Into<String>) -> Result<()> {
        self.send_command(AppCommand::Submit {
            source_text: source_text.into(),
            language: language.into(),
        })
    }

    pub fn start_capture(&self) -> Result<()> {
        self.send_command(AppCommand::StartCapture)
    }

    pub fn stop_capture(&self) -> Result<()> {
        self.send_command(AppCommand::StopCapture)
    }

    pub fn reset_tool(&self) -> Result<()> {
        self.send_command(AppCommand::ResetTool)
    }

    pub fn reset_voice(&self) -> Result<()> {
        self.send_command(AppCommand::ResetVoice)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send_command(AppCommand::Shutdown)
    }

    /// Extra sender for code that outlives a borrow of the handle
    pub fn command_sender(&self) -> UnboundedSender<AppCommand> {
        self.command_tx.clone()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&mut self) -> Option<AppEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait for the next event; `None` once the orchestrator is gone
    pub async fn recv_event(&mut self) -> Option<AppEvent> {
        self.event_rx.recv().await
    }

    /// Shared application state
    pub fn state(&self) -> &SharedAppState {
        &self.state
    }

    /// Read handle on the voice transcript
    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }
}

pub struct Orchestrator {
    gateway: Arc<dyn ModelGateway>,
    gateway_timeout: Option<Duration>,
    tool: ToolRequestController,
    voice: VoiceSessionController,
    state: SharedAppState,
    command_rx: UnboundedReceiver<AppCommand>,
    signal_rx: UnboundedReceiver<VoiceSignal>,
    resolution_tx: UnboundedSender<Resolution>,
    resolution_rx: UnboundedReceiver<Resolution>,
    event_tx: UnboundedSender<AppEvent>,
}

impl Orchestrator {
    /// Create an orchestrator and the handle that controls it.
    ///
    /// Nothing runs until [`run`](Self::run) is awaited.
    pub fn new(
        config: AppConfig,
        gateway: Arc<dyn ModelGateway>,
        capture: Arc<dyn CaptureDevice>,
        speech: Option<Arc<dyn SpeechOutput>>,
    ) -> (Self, OrchestratorHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (resolution_tx, resolution_rx) = mpsc::unbounded_channel();

        let speech = speech.filter(|_| config.voice.speak_responses);
        let tool = ToolRequestController::with_default_language(config.tools.default_language.clone());
        let voice = VoiceSessionController::new(config.voice.clone(), capture, speech, signal_tx);

        let state = SharedAppState::new();
        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            state: state.clone(),
            transcript: voice.transcript().clone(),
        };

        let orchestrator = Self {
            gateway,
            gateway_timeout: config.gateway_timeout(),
            tool,
            voice,
            state,
            command_rx,
            signal_rx,
            resolution_tx,
            resolution_rx,
            event_tx,
        };
        orchestrator.publish();

        (orchestrator, handle)
    }

    /// Process inputs until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!(gateway = self.gateway.name(), "orchestrator started");
        while self.step().await {}
        info!("orchestrator stopped");
    }

    /// Wait for and process exactly one input. Returns `false` on shutdown.
    pub async fn step(&mut self) -> bool {
        tokio::select! {
            command = self.command_rx.recv() => match command {
                Some(command) => self.tracked(|this| this.handle_command(command)),
                None => {
                    info!("command channel closed");
                    self.voice.reset();
                    false
                }
            },
            Some(signal) = self.signal_rx.recv() => self.tracked(|this| {
                this.handle_signal(signal);
                true
            }),
            Some(resolution) = self.resolution_rx.recv() => self.tracked(|this| {
                this.handle_resolution(resolution);
                true
            }),
        }
    }

    /// Run `f`, then emit events for whatever it changed and publish state.
    fn tracked(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        let voice_before = self.voice.state();
        let turns_before = self.voice.transcript().len();

        let keep_running = f(self);

        let turns = self.voice.transcript().all();
        if turns.len() > turns_before {
            for turn in &turns[turns_before..] {
                self.emit(AppEvent::TurnAppended(turn.clone()));
            }
        }
        if self.voice.state() != voice_before {
            self.emit(AppEvent::VoiceStateChanged(self.voice.state()));
        }
        if let Some(notice) = self.voice.take_fresh_notice() {
            self.emit(AppEvent::Notice(notice));
        }
        self.publish();
        self.emit(AppEvent::StateChanged);

        if !keep_running {
            self.emit(AppEvent::Shutdown);
        }
        keep_running
    }

    fn handle_command(&mut self, command: AppCommand) -> bool {
        debug!(?command, "command");
        match command {
            AppCommand::SelectTool(kind) => self.tool.select_tool(kind),
            AppCommand::Submit {
                source_text,
                language,
            } => {
                if let Some(call) = self.tool.submit(&source_text, &language) {
                    self.spawn_call(call, |ticket, outcome| Resolution::Tool { ticket, outcome });
                }
            }
            AppCommand::StartCapture => {
                // Unsupported devices surface as a notice; nothing else to do.
                let _ = self.voice.start_capture();
            }
            AppCommand::StopCapture => {
                self.voice.stop_capture();
            }
            AppCommand::ResetTool => self.tool.reset(),
            AppCommand::ResetVoice => self.voice.reset(),
            AppCommand::Shutdown => {
                info!("shutdown requested");
                self.voice.reset();
                return false;
            }
        }
        true
    }

    fn handle_signal(&mut self, signal: VoiceSignal) {
        if let Some(call) = self.voice.handle_signal(signal) {
            self.spawn_call(call, |ticket, outcome| Resolution::Voice { ticket, outcome });
        }
    }

    fn handle_resolution(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Tool { ticket, outcome } => {
                if self.tool.resolve(ticket, outcome) {
                    if let Some(result) = self.tool.result().cloned() {
                        self.emit(AppEvent::ToolCompleted(result));
                    }
                }
            }
            Resolution::Voice { ticket, outcome } => {
                self.voice.resolve(ticket, outcome);
            }
        }
    }

    fn spawn_call<T>(&self, call: GatewayCall<T>, route: fn(T, Outcome) -> Resolution)
    where
        T: Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let resolution_tx = self.resolution_tx.clone();
        let timeout = self.gateway_timeout;

        tokio::spawn(async move {
            let outcome = invoke_with_timeout(gateway.as_ref(), &call.prompt, timeout).await;
            if resolution_tx.send(route(call.ticket, outcome)).is_err() {
                debug!("gateway resolution dropped: orchestrator gone");
            }
        });
    }

    fn publish(&self) {
        self.state.replace(AppState {
            tool: ToolView {
                kind: self.tool.kind(),
                input: self.tool.input().to_string(),
                language: self.tool.language().to_string(),
                status: self.tool.state().clone(),
            },
            voice: self.voice.state(),
            transcript: self.voice.transcript().all(),
            notice: self.voice.notice().map(str::to_string),
        });
    }

    fn emit(&self, event: AppEvent) {
        // Presentation may have gone away; the loop keeps its own state.
        let _ = self.event_tx.send(event);
    }
}

/// Builder for creating an orchestrator
pub struct OrchestratorBuilder {
    config: AppConfig,
    gateway: Option<Arc<dyn ModelGateway>>,
    capture: Arc<dyn CaptureDevice>,
    speech: Option<Arc<dyn SpeechOutput>>,
}

impl OrchestratorBuilder {
    /// Create a new builder with default configuration and no devices
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            gateway: None,
            capture: Arc::new(UnavailableCapture),
            speech: None,
        }
    }

    /// Set the complete configuration
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific gateway instead of the configured Gemini transport
    pub fn with_gateway(mut self, gateway: Arc<dyn ModelGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_capture(mut self, capture: Arc<dyn CaptureDevice>) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechOutput>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Result<(Orchestrator, OrchestratorHandle)> {
        self.config.validate()?;
        let gateway = match self.gateway {
            Some(gateway) => gateway,
            None => Arc::new(GeminiGateway::new(self.config.gateway.clone())),
        };
        Ok(Orchestrator::new(self.config, gateway, self.capture, self.speech))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
