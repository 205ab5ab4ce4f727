use anyhow::{Context, Result};
use clap::Parser;
use codeai::integration::{AppConfig, OrchestratorBuilder, OrchestratorHandle};
use codeai::messages::ConversationTurn;
use codeai::speech::{TerminalSpeaker, TypedCapture, UnavailableCapture};
use codeai::state::AppEvent;
use codeai::tools::{is_supported_language, supported_languages, ToolKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terminal front-end for the CodeAI code tools and voice assistant
#[derive(Parser, Debug)]
#[command(name = "codeai", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model id, overrides the configuration
    #[arg(short, long)]
    model: Option<String>,

    /// Bound every model call
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print replies instead of speaking them
    #[arg(long)]
    no_speech: bool,

    /// Run without a capture device
    #[arg(long)]
    no_capture: bool,
}

const HELP: &str = "\
commands:
  /tools              list the code tools
  /tool <name>        switch tool (generate, explain, debug, optimize)
  /lang <language>    set the source language (any name is accepted)
  /langs              list supported languages
  /run                run the active tool on the lines typed so far
  /listen             start a voice turn; the next line is the utterance
  /stop               stop listening
  /transcript         print the conversation
  /export [path]      write the conversation as JSON
  /reset              clear tool and voice state
  /quit               exit";

/// Front-end state that never leaves this task
struct Session {
    handle: OrchestratorHandle,
    capture: Arc<TypedCapture>,
    language: String,
    buffer: Vec<String>,
}

impl Session {
    /// Returns `false` when the user asked to quit.
    fn handle_line(&mut self, line: String) -> Result<bool> {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            if self.capture.is_listening() {
                self.capture.deliver(trimmed);
            } else {
                self.buffer.push(line);
            }
            return Ok(true);
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "help" => println!("{HELP}"),
            "tools" => {
                let active = self.handle.state().snapshot().tool.kind;
                for kind in ToolKind::ALL {
                    let marker = if kind == active { "*" } else { " " };
                    println!("{marker} {:<16} {}", kind.label(), kind.placeholder());
                }
            }
            "tool" => match ToolKind::parse(arg) {
                Some(kind) => {
                    self.buffer.clear();
                    self.handle.select_tool(kind)?;
                    println!("{} | {}", kind.run_label(), kind.placeholder());
                }
                None => println!("unknown tool: {arg}"),
            },
            "lang" => {
                if arg.is_empty() {
                    println!("language: {}", self.language);
                } else {
                    self.language = arg.to_string();
                    println!("language: {}", self.language);
                    if let Some(note) = highlight_note(arg) {
                        println!("{note}");
                    }
                }
            }
            "langs" => println!("{}", supported_languages().collect::<Vec<_>>().join(", ")),
            "run" => {
                let source = self.buffer.join("\n");
                if source.trim().is_empty() {
                    println!("nothing to run: type some input first");
                } else {
                    self.buffer.clear();
                    self.handle.submit(source, self.language.clone())?;
                }
            }
            "listen" => self.handle.start_capture()?,
            "stop" => self.handle.stop_capture()?,
            "transcript" => {
                for turn in self.handle.transcript().all() {
                    print_turn(&turn);
                }
            }
            "export" => {
                let json = self.handle.transcript().to_json()?;
                if arg.is_empty() {
                    println!("{json}");
                } else {
                    std::fs::write(arg, json).with_context(|| format!("writing {arg}"))?;
                    println!("transcript written to {arg}");
                }
            }
            "reset" => {
                self.buffer.clear();
                self.handle.reset_tool()?;
                self.handle.reset_voice()?;
            }
            "quit" | "exit" => return Ok(false),
            _ => println!("unknown command: /{name} (try /help)"),
        }
        Ok(true)
    }

    fn handle_event(&self, event: AppEvent) {
        match event {
            AppEvent::ToolCompleted(result) => {
                let state = self.handle.state().snapshot();
                println!("--- {} [{}] ---", state.tool.kind.label(), state.tool.highlighter());
                println!("{}", result.display_text());
            }
            AppEvent::TurnAppended(turn) => print_turn(&turn),
            AppEvent::VoiceStateChanged(state) => println!("[{}]", state.status_text()),
            AppEvent::Notice(notice) => println!("! {notice}"),
            AppEvent::StateChanged | AppEvent::Shutdown => {}
        }
    }
}

/// Languages outside the picker are passed through but render as plain text
fn highlight_note(language: &str) -> Option<String> {
    (!is_supported_language(language))
        .then(|| format!("note: {language} is not in /langs and will not be syntax-highlighted"))
}

fn print_turn(turn: &ConversationTurn) {
    println!("{}: {}", turn.speaker.label(), turn.text);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codeai=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::resolve(args.config.as_deref()).context("loading configuration")?;
    if let Some(model) = args.model {
        config.gateway.model = model;
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_gateway_timeout(Duration::from_secs(secs));
    }
    if args.no_speech {
        config = config.without_speech();
    }

    info!(model = %config.gateway.model, "Starting CodeAI");

    let capture = Arc::new(TypedCapture::new());
    let mut builder = OrchestratorBuilder::new().with_config(config.clone());
    builder = if args.no_capture {
        builder.with_capture(Arc::new(UnavailableCapture))
    } else {
        builder.with_capture(capture.clone())
    };
    if config.voice.speak_responses {
        builder = builder.with_speech(Arc::new(TerminalSpeaker::new(config.voice.words_per_minute)));
    }

    let (orchestrator, handle) = builder.build().context("building orchestrator")?;
    let worker = tokio::spawn(orchestrator.run());

    let mut session = Session {
        handle,
        capture,
        language: config.tools.default_language.clone(),
        buffer: Vec::new(),
    };

    println!("CodeAI ({}). Type /help for commands.", config.gateway.model);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !session.handle_line(line)? {
                        break;
                    }
                }
                None => break,
            },
            event = session.handle.recv_event() => match event {
                Some(AppEvent::Shutdown) | None => break,
                Some(event) => session.handle_event(event),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if session.handle.shutdown().is_err() {
        warn!("orchestrator already stopped");
    }
    worker.await.context("orchestrator task panicked")?;

    Ok(())
}
