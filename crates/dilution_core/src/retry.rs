/// Where a retried model call currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// No attempt has failed yet.
    Pending,
    /// `attempt` transient failures so far; another attempt follows a delay.
    Retrying { attempt: u32 },
    Succeeded,
    Failed,
}

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// Rate limiting or a provider-side error worth retrying.
    Transient,
    /// Anything else; never retried.
    Fatal,
}

/// What the caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Attempt,
    WaitThenAttempt,
    Finish,
}

impl RetryState {
    /// Initial state and action for a call allowed `max_attempts` attempts.
    pub fn begin(max_attempts: u32) -> (RetryState, RetryAction) {
        if max_attempts == 0 {
            (RetryState::Failed, RetryAction::Finish)
        } else {
            (RetryState::Pending, RetryAction::Attempt)
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RetryState::Succeeded | RetryState::Failed)
    }
}

/// Pure transition: applies an attempt's outcome to the state.
pub fn step(state: RetryState, outcome: AttemptOutcome, max_attempts: u32) -> (RetryState, RetryAction) {
    let failed_so_far = match state {
        RetryState::Pending => 0,
        RetryState::Retrying { attempt } => attempt,
        RetryState::Succeeded | RetryState::Failed => return (state, RetryAction::Finish),
    };

    match outcome {
        AttemptOutcome::Success => (RetryState::Succeeded, RetryAction::Finish),
        AttemptOutcome::Fatal => (RetryState::Failed, RetryAction::Finish),
        AttemptOutcome::Transient => {
            let attempt = failed_so_far + 1;
            if attempt >= max_attempts {
                (RetryState::Failed, RetryAction::Finish)
            } else {
                (RetryState::Retrying { attempt }, RetryAction::WaitThenAttempt)
            }
        }
    }
}
