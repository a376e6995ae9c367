use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluate::EvaluationResult;

/// Stored in place of the response text when the model returned nothing.
pub const NO_RESPONSE_SENTINEL: &str = "ERROR: No response received";

/// Everything recorded about one trial. Serialized as one object of the results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub input_length_target: usize,
    pub trial_number: u32,
    pub model_name: String,
    pub system_prompt_tokens: usize,
    pub user_input_actual_tokens: usize,
    pub total_prompt_tokens: usize,
    pub started_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub raw_response: String,
    pub evaluation: EvaluationResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_warnings: Vec<String>,
}

impl TrialRecord {
    /// Response text, or the sentinel when the invocation failed.
    pub fn response_or_sentinel(response: Option<&str>) -> String {
        response.unwrap_or(NO_RESPONSE_SENTINEL).to_string()
    }

    /// Wall-clock seconds between start and finish, rounded to hundredths.
    pub fn rounded_duration(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> f64 {
        let millis = (finished_at - started_at).num_milliseconds().max(0);
        (millis as f64 / 10.0).round() / 100.0
    }
}

/// Aggregate over all trials of one target length.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthSummary {
    pub input_length_target: usize,
    pub trials: usize,
    pub responses: usize,
    pub mean_adherence: f64,
    pub total_possible_score: u32,
    pub mean_actual_tokens: f64,
}

/// Per-length summaries in ascending target order.
pub fn summarize(records: &[TrialRecord]) -> Vec<LengthSummary> {
    let mut grouped: BTreeMap<usize, Vec<&TrialRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.input_length_target)
            .or_default()
            .push(record);
    }

    grouped
        .into_iter()
        .map(|(target, group)| {
            let trials = group.len();
            let score: u32 = group.iter().map(|r| r.evaluation.adherence_score).sum();
            let tokens: usize = group.iter().map(|r| r.user_input_actual_tokens).sum();
            LengthSummary {
                input_length_target: target,
                trials,
                responses: group
                    .iter()
                    .filter(|r| r.evaluation.response_received)
                    .count(),
                mean_adherence: f64::from(score) / trials as f64,
                total_possible_score: group
                    .iter()
                    .map(|r| r.evaluation.total_possible_score)
                    .max()
                    .unwrap_or(0),
                mean_actual_tokens: tokens as f64 / trials as f64,
            }
        })
        .collect()
}
