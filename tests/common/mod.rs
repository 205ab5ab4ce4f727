//! Test doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use codeai::integration::{AppConfig, OrchestratorBuilder, OrchestratorHandle};
use codeai::llm::{GatewayError, ModelGateway};
use codeai::speech::{CaptureDevice, CaptureSink, SpeechCompletion, SpeechOutput};
use codeai::state::AppEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Gateway answering from a queue; `Ok("ok")` once the queue is empty.
///
/// When gated, every call waits for one [`release`](Self::release).
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
    gate: Option<Notify>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, err: GatewayError) -> Self {
        self.replies.lock().push_back(Err(err));
        self
    }

    /// Let one waiting (or the next) call through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.replies.lock().pop_front();
        next.unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Capture device driven by the test.
///
/// Keeps the sink of the latest capture even after `stop`, so tests can
/// play a device that reports late.
#[derive(Default)]
pub struct ManualCapture {
    sink: Mutex<Option<CaptureSink>>,
    starts: Mutex<usize>,
    stops: Mutex<usize>,
}

impl ManualCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn sink(&self) -> CaptureSink {
        self.sink.lock().clone().expect("capture was never started")
    }

    pub fn say(&self, text: &str) {
        self.sink().result(text);
    }

    pub fn fail(&self, cause: &str) {
        self.sink().error(cause);
    }

    pub fn end(&self) {
        self.sink().end();
    }

    pub fn starts(&self) -> usize {
        *self.starts.lock()
    }

    pub fn stops(&self) -> usize {
        *self.stops.lock()
    }
}

impl CaptureDevice for ManualCapture {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&self, sink: CaptureSink) -> codeai::Result<()> {
        *self.starts.lock() += 1;
        *self.sink.lock() = Some(sink);
        Ok(())
    }

    fn stop(&self) {
        *self.stops.lock() += 1;
    }
}

/// Speech output that records utterances and finishes them on demand
#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
    pending: Mutex<Vec<SpeechCompletion>>,
    cancels: Mutex<usize>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn cancels(&self) -> usize {
        *self.cancels.lock()
    }

    /// Report every outstanding utterance as finished
    pub fn finish_all(&self) {
        for completion in self.pending.lock().drain(..) {
            completion.finish();
        }
    }
}

impl SpeechOutput for RecordingSpeaker {
    fn speak(&self, text: &str, completion: SpeechCompletion) -> codeai::Result<()> {
        self.spoken.lock().push(text.to_string());
        self.pending.lock().push(completion);
        Ok(())
    }

    fn cancel(&self) {
        *self.cancels.lock() += 1;
    }
}

/// Config that never touches the environment-derived API key
pub fn test_config() -> AppConfig {
    AppConfig::default()
}

/// Build and spawn an orchestrator; the handle drives it.
pub fn spawn(
    config: AppConfig,
    gateway: Arc<ScriptedGateway>,
    capture: Option<Arc<ManualCapture>>,
    speech: Option<Arc<RecordingSpeaker>>,
) -> OrchestratorHandle {
    let mut builder = OrchestratorBuilder::new()
        .with_config(config)
        .with_gateway(gateway);
    if let Some(capture) = capture {
        builder = builder.with_capture(capture);
    }
    if let Some(speech) = speech {
        builder = builder.with_speech(speech);
    }
    let (orchestrator, handle) = builder.build().expect("valid test config");
    tokio::spawn(orchestrator.run());
    handle
}

/// Receive events until one matches `pred`; returns everything received.
pub async fn wait_for(
    handle: &mut OrchestratorHandle,
    pred: impl Fn(&AppEvent) -> bool,
) -> Vec<AppEvent> {
    let mut seen = Vec::new();
    let result = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = handle.recv_event().await {
            let done = pred(&event);
            seen.push(event);
            if done {
                return;
            }
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for event; saw {seen:?}");
    seen
}

/// Wait until the orchestrator has processed `n` more inputs
pub async fn settle(handle: &mut OrchestratorHandle, n: usize) {
    for _ in 0..n {
        wait_for(handle, |e| *e == AppEvent::StateChanged).await;
    }
}
