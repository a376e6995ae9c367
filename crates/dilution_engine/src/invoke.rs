use std::time::Duration;

use dilution_core::{step, AttemptOutcome, RetryAction, RetryState};
use dilution_logging::{dilution_debug, dilution_error, dilution_warn};

use crate::client::{ChatRequest, InvokeError, ModelClient};

/// Pause between attempts. Injected so tests can skip the wait.
#[async_trait::async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait::async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Drives a [`ModelClient`] through the retry state machine.
pub struct RetryingInvoker<'a> {
    client: &'a dyn ModelClient,
    delay: &'a dyn Delay,
    settings: RetrySettings,
}

impl<'a> RetryingInvoker<'a> {
    pub fn new(client: &'a dyn ModelClient, delay: &'a dyn Delay, settings: RetrySettings) -> Self {
        Self {
            client,
            delay,
            settings,
        }
    }

    /// Returns the response text, or `None` once retries are exhausted or a
    /// non-retryable error occurs.
    pub async fn invoke(&self, request: &ChatRequest) -> Option<String> {
        let max = self.settings.max_attempts;
        let (mut state, mut action) = RetryState::begin(max);
        if state.is_terminal() {
            dilution_error!("Retry budget is zero; model was not called");
            return None;
        }

        while !state.is_terminal() {
            if action == RetryAction::WaitThenAttempt {
                self.delay.wait(self.settings.delay).await;
            }
            dilution_debug!("Calling {} ({:?})", request.model, state);
            let result = self.client.complete(request).await;
            let outcome = match &result {
                Ok(_) => AttemptOutcome::Success,
                Err(err) => err.outcome(),
            };
            (state, action) = step(state, outcome, max);

            match result {
                Ok(text) => return Some(text),
                Err(err) => self.report_failure(&err, state),
            }
        }
        None
    }

    fn report_failure(&self, err: &InvokeError, state: RetryState) {
        let max = self.settings.max_attempts;
        match (err.outcome(), state) {
            (AttemptOutcome::Transient, RetryState::Retrying { attempt }) => dilution_warn!(
                "{}. Retrying in {:?}... (Attempt {}/{})",
                err,
                self.settings.delay,
                attempt,
                max
            ),
            (AttemptOutcome::Transient, _) => {
                dilution_error!("{}. Max retries ({}) reached.", err, max)
            }
            _ => dilution_error!("Model call failed without retry: {}", err),
        }
    }
}
