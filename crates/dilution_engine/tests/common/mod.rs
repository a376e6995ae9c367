#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use std::time::Duration;

use dilution_engine::{ChatRequest, Delay, InvokeError, ModelClient};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(dilution_logging::initialize_for_tests);
}

/// Replays a fixed list of results, then keeps failing with a fatal error.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, InvokeError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<String, InvokeError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, InvokeError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InvokeError::Fatal("script exhausted".into())))
    }
}

/// Records requested waits without sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
