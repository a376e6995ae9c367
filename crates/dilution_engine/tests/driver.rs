mod common;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use common::{init_logging, RecordingDelay, ScriptedClient};
use dilution_core::{ByteTokenizer, EvaluationResult, NO_RESPONSE_SENTINEL};
use dilution_engine::{
    ChatRequest, ExperimentConfig, ExperimentDriver, InvokeError, ModelClient, ResultLog,
    RetryingInvoker,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const COMPLIANT: &str = "ResearchBot Alpha Analysis:\n1. Storage costs.";

fn config(results_dir: PathBuf) -> ExperimentConfig {
    ExperimentConfig {
        system_prompt: "sys".to_string(),
        core_query: "What is it".to_string(),
        user_input_token_lengths: vec![20, 10_000, 40],
        num_trials: 2,
        max_retries: 2,
        retry_delay_secs: 0,
        results_dir,
        ..ExperimentConfig::default()
    }
}

fn corpus() -> String {
    "abc ".repeat(20)
}

#[tokio::test]
async fn runs_every_trial_and_persists_results() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let config = config(temp.path().join("results"));
    let client = ScriptedClient::new(vec![
        Ok(COMPLIANT.to_string()),
        Err(InvokeError::Fatal("malformed completion response".into())),
        Ok("I think it's fine".to_string()),
        Err(InvokeError::RateLimited("1".into())),
        Err(InvokeError::RateLimited("2".into())),
    ]);
    let delay = RecordingDelay::default();
    let invoker = RetryingInvoker::new(&client, &delay, config.retry_settings());
    let driver = ExperimentDriver::new(&config, Arc::new(ByteTokenizer), invoker);
    let results = ResultLog::new(config.results_dir.clone(), &config.results_filename);

    let report = driver.run(&corpus(), results).await;

    assert_eq!(report.skipped_lengths, vec![10_000]);
    assert_eq!(report.results_path, config.results_path());
    assert_eq!(client.calls(), 5);
    assert_eq!(delay.waits().len(), 1);

    let targets: Vec<(usize, u32)> = report
        .records
        .iter()
        .map(|r| (r.input_length_target, r.trial_number))
        .collect();
    assert_eq!(targets, vec![(20, 1), (20, 2), (40, 1), (40, 2)]);

    let first = &report.records[0];
    // 10 filler bytes + "\n\n" + 10 query bytes
    assert_eq!(first.user_input_actual_tokens, 22);
    assert_eq!(first.system_prompt_tokens, 3);
    assert_eq!(first.total_prompt_tokens, 25);
    assert_eq!(first.raw_response, COMPLIANT);
    assert_eq!(first.evaluation.adherence_score, 4);
    assert_eq!(first.model_name, "gpt-3.5-turbo");
    assert!(first.timestamp >= first.started_at);

    let second = &report.records[1];
    assert_eq!(second.raw_response, NO_RESPONSE_SENTINEL);
    assert_eq!(second.evaluation, EvaluationResult::no_response());

    assert_eq!(report.records[2].evaluation.adherence_score, 1);
    assert_eq!(report.records[3].raw_response, NO_RESPONSE_SENTINEL);

    let saved = ResultLog::load(&config.results_path()).unwrap();
    assert_eq!(saved, report.records);
}

#[tokio::test]
async fn user_input_ends_with_query() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let config = ExperimentConfig {
        user_input_token_lengths: vec![40],
        num_trials: 1,
        ..config(temp.path().to_path_buf())
    };
    let client = ScriptedClient::new(vec![Ok(COMPLIANT.to_string())]);
    let delay = RecordingDelay::default();
    let invoker = RetryingInvoker::new(&client, &delay, config.retry_settings());
    let driver = ExperimentDriver::new(&config, Arc::new(ByteTokenizer), invoker);

    driver
        .run(&corpus(), ResultLog::new(temp.path().to_path_buf(), "out.json"))
        .await;

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].system_prompt, "sys");
    assert!(requests[0].user_input.ends_with("\n\nWhat is it"));
    assert_eq!(requests[0].user_input.len(), 42);
}

/// Reports how many records were on disk each time the model was called.
struct ObservingClient {
    results_path: PathBuf,
    seen: Mutex<Vec<usize>>,
}

#[async_trait::async_trait]
impl ModelClient for ObservingClient {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, InvokeError> {
        let on_disk = ResultLog::load(&self.results_path)
            .map(|records| records.len())
            .unwrap_or(0);
        self.seen.lock().unwrap().push(on_disk);
        Ok(COMPLIANT.to_string())
    }
}

#[tokio::test]
async fn results_are_saved_after_every_trial() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let config = ExperimentConfig {
        user_input_token_lengths: vec![20, 40],
        num_trials: 2,
        ..config(temp.path().to_path_buf())
    };
    let client = ObservingClient {
        results_path: config.results_path(),
        seen: Mutex::new(Vec::new()),
    };
    let delay = RecordingDelay::default();
    let invoker = RetryingInvoker::new(&client, &delay, config.retry_settings());
    let driver = ExperimentDriver::new(&config, Arc::new(ByteTokenizer), invoker);

    let report = driver
        .run(
            &corpus(),
            ResultLog::new(config.results_dir.clone(), &config.results_filename),
        )
        .await;

    assert_eq!(*client.seen.lock().unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(report.records.len(), 4);
}

#[tokio::test]
async fn save_failures_do_not_stop_the_run() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let blocked = temp.path().join("blocked");
    std::fs::write(&blocked, "regular file").unwrap();
    let config = ExperimentConfig {
        user_input_token_lengths: vec![20, 40],
        num_trials: 2,
        ..config(blocked.clone())
    };
    let client = ScriptedClient::new(vec![Ok(COMPLIANT.to_string()); 4]);
    let delay = RecordingDelay::default();
    let invoker = RetryingInvoker::new(&client, &delay, config.retry_settings());
    let driver = ExperimentDriver::new(&config, Arc::new(ByteTokenizer), invoker);

    let report = driver
        .run(&corpus(), ResultLog::new(blocked.clone(), "results.json"))
        .await;

    assert_eq!(client.calls(), 4);
    assert_eq!(report.records.len(), 4);
    assert!(report.records.iter().all(|r| r.raw_response == COMPLIANT));
    assert!(blocked.is_file());
}
