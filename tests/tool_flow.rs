//! End-to-end tool requests through the orchestrator

mod common;

use codeai::llm::prompts::TOOL_FAILURE_PREFIX;
use codeai::llm::GatewayError;
use codeai::state::AppEvent;
use codeai::tools::{ToolKind, ToolResult, ToolState};
use common::{settle, spawn, test_config, wait_for, ScriptedGateway};
use std::sync::Arc;
use std::time::Duration;

fn completed(event: &AppEvent) -> bool {
    matches!(event, AppEvent::ToolCompleted(_))
}

#[tokio::test]
async fn test_blank_submit_sends_nothing() {
    let gateway = Arc::new(ScriptedGateway::new());
    let mut handle = spawn(test_config(), gateway.clone(), None, None);

    handle.submit("", "JavaScript").unwrap();
    handle.submit("  \n ", "JavaScript").unwrap();
    settle(&mut handle, 2).await;

    assert_eq!(gateway.calls(), 0);
    let state = handle.state().snapshot();
    assert_eq!(state.tool.status, ToolState::Idle);
    assert!(state.tool.result().is_none());
}

#[tokio::test]
async fn test_explain_success() {
    let gateway = Arc::new(ScriptedGateway::new().reply("This prints hi."));
    let mut handle = spawn(test_config(), gateway.clone(), None, None);

    handle.select_tool(ToolKind::Explain).unwrap();
    handle.submit("print('hi')", "Python").unwrap();
    let events = wait_for(&mut handle, completed).await;
    settle(&mut handle, 1).await;

    assert_eq!(
        events.last(),
        Some(&AppEvent::ToolCompleted(ToolResult::Success(
            "This prints hi.".to_string()
        )))
    );

    let prompts = gateway.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("Explain the following Python code snippet"));
    assert!(prompts[0].contains("```Python\nprint('hi')\n```"));

    let state = handle.state().snapshot();
    assert_eq!(state.tool.kind, ToolKind::Explain);
    assert_eq!(state.tool.input, "print('hi')");
    assert_eq!(state.tool.highlighter(), "python");
}

#[tokio::test]
async fn test_double_submit_is_single_flight() {
    let gateway = Arc::new(ScriptedGateway::gated().reply("const x = 1;"));
    let mut handle = spawn(test_config(), gateway.clone(), None, None);

    handle.submit("a counter", "JavaScript").unwrap();
    handle.submit("a counter", "JavaScript").unwrap();
    settle(&mut handle, 2).await;
    assert!(handle.state().tool_status().is_submitting());

    gateway.release();
    wait_for(&mut handle, completed).await;
    settle(&mut handle, 1).await;

    assert_eq!(gateway.calls(), 1);
    assert_eq!(
        handle.state().tool_status(),
        ToolState::Done(ToolResult::Success("const x = 1;".to_string()))
    );
}

#[tokio::test]
async fn test_gateway_failure_is_shown() {
    let gateway = Arc::new(
        ScriptedGateway::new().fail(GatewayError::Request("HTTP 500: backend unavailable".into())),
    );
    let mut handle = spawn(test_config(), gateway, None, None);

    handle.select_tool(ToolKind::Debug).unwrap();
    handle.submit("let x = ;", "Rust").unwrap();
    let events = wait_for(&mut handle, completed).await;

    let Some(AppEvent::ToolCompleted(result)) = events.last() else {
        panic!("expected a tool result, got {events:?}");
    };
    assert!(!result.is_success());
    let text = result.display_text();
    assert!(text.starts_with(TOOL_FAILURE_PREFIX));
    assert!(text.contains("backend unavailable"));
}

#[tokio::test]
async fn test_new_result_replaces_previous() {
    let gateway = Arc::new(ScriptedGateway::new().reply("first").reply("second"));
    let mut handle = spawn(test_config(), gateway, None, None);

    handle.submit("one", "Go").unwrap();
    wait_for(&mut handle, completed).await;
    handle.submit("two", "Go").unwrap();
    wait_for(&mut handle, completed).await;
    settle(&mut handle, 1).await;

    assert_eq!(
        handle.state().tool_status(),
        ToolState::Done(ToolResult::Success("second".to_string()))
    );
    assert_eq!(handle.state().snapshot().tool.input, "two");
}

#[tokio::test]
async fn test_select_tool_discards_outstanding_request() {
    let gateway = Arc::new(ScriptedGateway::gated().reply("stale"));
    let mut handle = spawn(test_config(), gateway.clone(), None, None);

    handle.submit("a parser", "Rust").unwrap();
    settle(&mut handle, 1).await;
    handle.select_tool(ToolKind::Optimize).unwrap();
    settle(&mut handle, 1).await;

    gateway.release();
    let events = wait_for(&mut handle, |e| *e == AppEvent::StateChanged).await;
    assert!(!events.iter().any(completed));

    let state = handle.state().snapshot();
    assert_eq!(state.tool.kind, ToolKind::Optimize);
    assert_eq!(state.tool.input, "");
    assert_eq!(state.tool.status, ToolState::Idle);
}

#[tokio::test]
async fn test_reset_tool_discards_outstanding_request() {
    let gateway = Arc::new(ScriptedGateway::gated().reply("stale"));
    let mut handle = spawn(test_config(), gateway.clone(), None, None);

    handle.submit("sort a list", "Python").unwrap();
    settle(&mut handle, 1).await;
    handle.reset_tool().unwrap();
    settle(&mut handle, 1).await;

    gateway.release();
    let events = wait_for(&mut handle, |e| *e == AppEvent::StateChanged).await;
    assert!(!events.iter().any(completed));
    assert_eq!(handle.state().tool_status(), ToolState::Idle);
}

#[tokio::test]
async fn test_timeout_becomes_failure() {
    let gateway = Arc::new(ScriptedGateway::gated());
    let config = test_config().with_gateway_timeout(Duration::from_millis(50));
    let mut handle = spawn(config, gateway, None, None);

    handle.submit("hang forever", "C").unwrap();
    let events = wait_for(&mut handle, completed).await;

    let Some(AppEvent::ToolCompleted(ToolResult::Failure(message))) = events.last() else {
        panic!("expected a failure, got {events:?}");
    };
    assert!(message.contains("timed out"));
}

#[tokio::test]
async fn test_free_text_language_is_passed_through() {
    let gateway = Arc::new(ScriptedGateway::new().reply("const std = @import(\"std\");"));
    let mut handle = spawn(test_config(), gateway.clone(), None, None);

    handle.submit("hello world", "Zig").unwrap();
    let events = wait_for(&mut handle, completed).await;
    settle(&mut handle, 1).await;

    assert!(matches!(events.last(), Some(AppEvent::ToolCompleted(r)) if r.is_success()));
    assert!(gateway.prompts()[0].contains("in Zig for the following task: hello world."));

    let state = handle.state().snapshot();
    assert_eq!(state.tool.language, "Zig");
    assert_eq!(state.tool.highlighter(), "text");
}
