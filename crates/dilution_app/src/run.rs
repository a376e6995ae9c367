use std::path::Path;

use dilution_core::TokenizerCache;
use dilution_engine::{
    ensure_output_dir, load_filler_corpus, CorpusError, ExperimentDriver, InvokeError,
    OpenAiChatClient, PersistError, ResultLog, RetryingInvoker, RunReport, TokioDelay,
};
use dilution_logging::dilution_info;
use thiserror::Error;

use crate::settings::{self, ConfigError};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("OpenAI API key not found. Set the OPENAI_API_KEY environment variable.")]
    MissingCredential,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to load filler text: {0}")]
    Corpus(#[from] CorpusError),
    #[error("cannot use results directory: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to build model client: {0}")]
    Client(#[from] InvokeError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Pre-flight checks, then the full experiment. Any error returned here means
/// no trial ran.
pub fn run(config_path: Option<&Path>, api_key: Option<String>) -> Result<RunReport, AppError> {
    let api_key = require_api_key(api_key)?;
    let config = settings::load(config_path)?;

    dilution_info!("Starting Attention Dilution Experiment...");
    // A run whose results can never be written is refused up front; failures
    // after this point are logged per save and the run continues.
    ensure_output_dir(&config.results_dir)?;
    let corpus = load_filler_corpus(&config.filler_text_path)?;

    let mut tokenizers = TokenizerCache::new();
    let tokenizer = tokenizers.get(&config.model_name);
    let client = OpenAiChatClient::new(api_key, config.client_settings())?;
    let delay = TokioDelay;
    let invoker = RetryingInvoker::new(&client, &delay, config.retry_settings());
    let driver = ExperimentDriver::new(&config, tokenizer, invoker);
    let results = ResultLog::new(config.results_dir.clone(), config.results_filename.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;
    Ok(runtime.block_on(driver.run(&corpus, results)))
}

fn require_api_key(value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(AppError::MissingCredential),
    }
}
