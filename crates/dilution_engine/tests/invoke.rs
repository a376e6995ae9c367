mod common;

use std::time::Duration;

use common::{init_logging, RecordingDelay, ScriptedClient};
use dilution_engine::{ChatRequest, InvokeError, RetryingInvoker, RetrySettings};

fn request() -> ChatRequest {
    ChatRequest {
        model: "gpt-3.5-turbo".to_string(),
        system_prompt: "system".to_string(),
        user_input: "user".to_string(),
        temperature: 0.7,
        max_output_tokens: 500,
    }
}

fn settings(max_attempts: u32) -> RetrySettings {
    RetrySettings {
        max_attempts,
        delay: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn transient_failures_then_success_returns_text() {
    init_logging();
    let client = ScriptedClient::new(vec![
        Err(InvokeError::RateLimited("slow down".into())),
        Err(InvokeError::Api("bad gateway".into())),
        Ok("ResearchBot Alpha Analysis:\n1. Done.".into()),
    ]);
    let delay = RecordingDelay::default();
    let invoker = RetryingInvoker::new(&client, &delay, settings(3));

    let response = invoker.invoke(&request()).await;
    assert_eq!(response.as_deref(), Some("ResearchBot Alpha Analysis:\n1. Done."));
    assert_eq!(client.calls(), 3);
    assert_eq!(delay.waits(), vec![Duration::from_secs(5); 2]);
}

#[tokio::test]
async fn exhausted_retries_yield_no_response() {
    init_logging();
    let client = ScriptedClient::new(vec![
        Err(InvokeError::RateLimited("1".into())),
        Err(InvokeError::RateLimited("2".into())),
        Err(InvokeError::RateLimited("3".into())),
        Ok("never reached".into()),
    ]);
    let delay = RecordingDelay::default();
    let invoker = RetryingInvoker::new(&client, &delay, settings(3));

    assert_eq!(invoker.invoke(&request()).await, None);
    assert_eq!(client.calls(), 3);
    assert_eq!(delay.waits().len(), 2);
}

#[tokio::test]
async fn fatal_error_is_not_retried() {
    init_logging();
    let client = ScriptedClient::new(vec![
        Err(InvokeError::Fatal("completion response has no content".into())),
        Ok("never reached".into()),
    ]);
    let delay = RecordingDelay::default();
    let invoker = RetryingInvoker::new(&client, &delay, settings(3));

    assert_eq!(invoker.invoke(&request()).await, None);
    assert_eq!(client.calls(), 1);
    assert!(delay.waits().is_empty());
}

#[tokio::test]
async fn zero_retry_budget_never_calls_model() {
    init_logging();
    let client = ScriptedClient::new(vec![Ok("unused".into())]);
    let delay = RecordingDelay::default();
    let invoker = RetryingInvoker::new(&client, &delay, settings(0));

    assert_eq!(invoker.invoke(&request()).await, None);
    assert_eq!(client.calls(), 0);
}
