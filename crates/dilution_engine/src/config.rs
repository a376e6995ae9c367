use std::path::PathBuf;
use std::time::Duration;

use dilution_core::Rubric;
use serde::{Deserialize, Serialize};

use crate::client::{ChatRequest, ClientSettings};
use crate::invoke::RetrySettings;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"
You are 'ResearchBot Alpha'. Your primary function is to process the user's text and follow instructions precisely. Your responses must adhere strictly to the following rules:
1.  **Start Phrase:** Every response MUST begin with the exact phrase: "ResearchBot Alpha Analysis:". No variations allowed.
2.  **Output Format:** Present findings as a numbered list (e.g., "1. Finding one."). Do not use bullet points (*, -) or any other format.
3.  **Tone and Style:** Maintain a strictly formal and objective tone. Avoid any informal language, contractions, or expressions of opinion/emotion. Your persona is that of a detached analytical engine.
4.  **Negative Constraint:** Absolutely DO NOT use the word "significant" or any of its variations (significantly, significance). Find synonyms if needed (e.g., substantial, considerable, noteworthy, important).
5.  **Conciseness:** Keep explanations brief and to the point. Focus on direct answers to the user's request based *only* on the provided text.
6.  **Handling Missing Info:** If the text doesn't contain information to fulfill a request, state "Information not found in provided text." Do not speculate.

Adhere to all these rules consistently in your output. Process the user text that follows.
"#;

pub const DEFAULT_CORE_QUERY: &str = "Based on the provided text, identify the main challenges discussed regarding renewable energy adoption.";

/// Everything an experiment run needs. Every field has a default, so a config
/// file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub model_name: String,
    pub system_prompt: String,
    pub core_query: String,
    pub filler_text_path: PathBuf,
    pub user_input_token_lengths: Vec<usize>,
    pub num_trials: u32,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub results_dir: PathBuf,
    pub results_filename: String,
    pub expected_start_phrase: String,
    pub forbidden_words: Vec<String>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        let rubric = Rubric::default();
        Self {
            model_name: "gpt-3.5-turbo".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            core_query: DEFAULT_CORE_QUERY.to_string(),
            filler_text_path: PathBuf::from("data/filler_text.txt"),
            user_input_token_lengths: vec![500, 2000, 8000],
            num_trials: 3,
            temperature: 0.7,
            max_output_tokens: 500,
            max_retries: 3,
            retry_delay_secs: 5,
            results_dir: PathBuf::from("results"),
            results_filename: "experiment_results.json".to_string(),
            expected_start_phrase: rubric.expected_prefix,
            forbidden_words: rubric.forbidden_words,
            api_base_url: ClientSettings::default().base_url,
            request_timeout_secs: 120,
        }
    }
}

impl ExperimentConfig {
    pub fn rubric(&self) -> Rubric {
        Rubric {
            expected_prefix: self.expected_start_phrase.clone(),
            forbidden_words: self.forbidden_words.clone(),
        }
    }

    pub fn retry_settings(&self) -> RetrySettings {
        RetrySettings {
            max_attempts: self.max_retries,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..ClientSettings::default()
        }
    }

    pub fn results_path(&self) -> PathBuf {
        self.results_dir.join(&self.results_filename)
    }

    pub fn chat_request(&self, user_input: String) -> ChatRequest {
        ChatRequest {
            model: self.model_name.clone(),
            system_prompt: self.system_prompt.clone(),
            user_input,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}
