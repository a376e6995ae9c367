use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use dilution_core::{build_user_input, count_tokens, summarize, Evaluator, Tokenizer, TrialRecord};
use dilution_logging::{
    clear_trial_context, dilution_debug, dilution_error, dilution_info, dilution_warn,
    set_trial_context,
};

use crate::config::ExperimentConfig;
use crate::invoke::RetryingInvoker;
use crate::results::ResultLog;

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub records: Vec<TrialRecord>,
    /// Target lengths larger than corpus + query, which were not run.
    pub skipped_lengths: Vec<usize>,
    pub results_path: PathBuf,
}

/// Runs every configured length for the configured number of trials, one
/// trial at a time, saving the result log after each.
pub struct ExperimentDriver<'a> {
    config: &'a ExperimentConfig,
    tokenizer: Arc<dyn Tokenizer>,
    evaluator: Evaluator,
    invoker: RetryingInvoker<'a>,
}

struct TrialContext {
    length: usize,
    trial: u32,
    system_prompt_tokens: usize,
    current_run: usize,
    total_runs: usize,
}

impl<'a> ExperimentDriver<'a> {
    pub fn new(
        config: &'a ExperimentConfig,
        tokenizer: Arc<dyn Tokenizer>,
        invoker: RetryingInvoker<'a>,
    ) -> Self {
        Self {
            config,
            tokenizer,
            evaluator: Evaluator::new(config.rubric()),
            invoker,
        }
    }

    pub async fn run(&self, corpus: &str, mut results: ResultLog) -> RunReport {
        let tokenizer = self.tokenizer.as_ref();
        let corpus_tokens = count_tokens(tokenizer, corpus);
        let query_tokens = count_tokens(tokenizer, &self.config.core_query);
        let system_prompt_tokens = count_tokens(tokenizer, &self.config.system_prompt);
        dilution_info!(
            "Loaded filler text: {} tokens ({} tokenizer)",
            corpus_tokens,
            tokenizer.name()
        );

        let (runnable, skipped_lengths): (Vec<usize>, Vec<usize>) = self
            .config
            .user_input_token_lengths
            .iter()
            .copied()
            .partition(|&length| length <= corpus_tokens + query_tokens);
        for length in &skipped_lengths {
            dilution_warn!(
                "Target length {} is greater than available filler text + query ({}). Skipping this length.",
                length,
                corpus_tokens + query_tokens
            );
        }

        let num_trials = self.config.num_trials;
        let total_runs = runnable.len() * num_trials as usize;
        let mut current_run = 0;

        for &length in &runnable {
            dilution_info!("--- Testing User Input Length: {} tokens ---", length);
            for trial in 1..=num_trials {
                current_run += 1;
                set_trial_context(length, trial);
                let ctx = TrialContext {
                    length,
                    trial,
                    system_prompt_tokens,
                    current_run,
                    total_runs,
                };
                let record = self.run_trial(corpus, &ctx).await;
                results.push(record);
                if let Err(err) = results.save() {
                    dilution_error!("Error saving results incrementally: {}", err);
                }
                clear_trial_context();
            }
        }

        let results_path = results.path();
        dilution_info!(
            "Experiment finished. Saving final results to {}",
            results_path.display()
        );
        match results.save() {
            Ok(path) => dilution_info!("Results saved to {}", path.display()),
            Err(err) => dilution_error!("Error saving final results: {}", err),
        }

        for summary in summarize(results.records()) {
            dilution_info!(
                "length {:>6}: mean adherence {:.2}/{} over {} trials ({} responses, mean input {:.1} tokens)",
                summary.input_length_target,
                summary.mean_adherence,
                summary.total_possible_score,
                summary.trials,
                summary.responses,
                summary.mean_actual_tokens
            );
        }

        RunReport {
            records: results.into_records(),
            skipped_lengths,
            results_path,
        }
    }

    async fn run_trial(&self, corpus: &str, ctx: &TrialContext) -> TrialRecord {
        let started_at = Utc::now();
        dilution_info!(
            "Running Trial {}/{} for {} tokens ({}/{})",
            ctx.trial,
            self.config.num_trials,
            ctx.length,
            ctx.current_run,
            ctx.total_runs
        );

        let composed = build_user_input(
            self.tokenizer.as_ref(),
            corpus,
            &self.config.core_query,
            ctx.length,
        );
        for warning in &composed.warnings {
            dilution_warn!("{}", warning);
        }
        let input_warnings = composed.warnings.iter().map(ToString::to_string).collect();
        let actual_tokens = composed.token_count;
        dilution_debug!(
            "Token breakdown: target {}, query {}, filler budget {}, final {}",
            ctx.length,
            composed.query_tokens,
            ctx.length.saturating_sub(composed.query_tokens),
            actual_tokens
        );
        let total_prompt_tokens = ctx.system_prompt_tokens + actual_tokens;
        dilution_info!(
            "Generated user input: {} tokens. Total prompt tokens (system + user): {}",
            actual_tokens,
            total_prompt_tokens
        );

        let request = self.config.chat_request(composed.text);
        let response = self.invoker.invoke(&request).await;
        let evaluation = self.evaluator.evaluate(response.as_deref());
        match &response {
            Some(_) => dilution_info!(
                "Evaluation Score: {}/{}",
                evaluation.adherence_score,
                evaluation.total_possible_score
            ),
            None => dilution_warn!("Failed to get LLM response for this trial."),
        }

        let finished_at = Utc::now();
        TrialRecord {
            input_length_target: ctx.length,
            trial_number: ctx.trial,
            model_name: self.config.model_name.clone(),
            system_prompt_tokens: ctx.system_prompt_tokens,
            user_input_actual_tokens: actual_tokens,
            total_prompt_tokens,
            started_at,
            timestamp: finished_at,
            duration_seconds: TrialRecord::rounded_duration(started_at, finished_at),
            raw_response: TrialRecord::response_or_sentinel(response.as_deref()),
            evaluation,
            input_warnings,
        }
    }
}
