use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of rubric checks; also the possible score of every evaluation.
pub const CHECK_COUNT: u32 = 4;

/// Phrases that mark a response as informal. Matched as lowercase substrings,
/// so this is a coarse signal rather than real tone analysis.
pub const INFORMAL_MARKERS: [&str; 8] = [
    "i think",
    "i feel",
    "don't",
    "can't",
    "it's",
    "you know",
    "actually",
    "just",
];

static NUMBERED_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").expect("numbered list pattern"));

/// Rules from the system prompt that can be checked mechanically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub expected_prefix: String,
    pub forbidden_words: Vec<String>,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            expected_prefix: "ResearchBot Alpha Analysis:".to_string(),
            forbidden_words: vec![
                "significant".to_string(),
                "significantly".to_string(),
                "significance".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub response_received: bool,
    pub starts_with_phrase: bool,
    pub uses_numbered_list: bool,
    pub avoids_forbidden_words: bool,
    pub formal_tone_check: bool,
    pub adherence_score: u32,
    pub total_possible_score: u32,
}

impl EvaluationResult {
    /// Result recorded when the model produced nothing to score.
    pub fn no_response() -> Self {
        Self {
            response_received: false,
            starts_with_phrase: false,
            uses_numbered_list: false,
            avoids_forbidden_words: false,
            formal_tone_check: false,
            adherence_score: 0,
            total_possible_score: CHECK_COUNT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    rubric: Rubric,
    forbidden_lower: Vec<String>,
}

impl Evaluator {
    pub fn new(rubric: Rubric) -> Self {
        let forbidden_lower = rubric
            .forbidden_words
            .iter()
            .map(|word| word.to_lowercase())
            .collect();
        Self {
            rubric,
            forbidden_lower,
        }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn evaluate(&self, response: Option<&str>) -> EvaluationResult {
        let Some(text) = response else {
            return EvaluationResult::no_response();
        };
        let lower = text.to_lowercase();

        let starts_with_phrase = text.starts_with(&self.rubric.expected_prefix);
        let uses_numbered_list = NUMBERED_LIST.is_match(text);
        // Substring match: "insignificant" trips "significant" too.
        let avoids_forbidden_words = !self
            .forbidden_lower
            .iter()
            .any(|word| lower.contains(word.as_str()));
        let formal_tone_check = !INFORMAL_MARKERS
            .iter()
            .any(|marker| lower.contains(marker));

        let adherence_score = [
            starts_with_phrase,
            uses_numbered_list,
            avoids_forbidden_words,
            formal_tone_check,
        ]
        .into_iter()
        .map(u32::from)
        .sum();

        EvaluationResult {
            response_received: true,
            starts_with_phrase,
            uses_numbered_list,
            avoids_forbidden_words,
            formal_tone_check,
            adherence_score,
            total_possible_score: CHECK_COUNT,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Rubric::default())
    }
}
