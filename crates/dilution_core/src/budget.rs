use std::borrow::Cow;
use std::fmt;

use crate::tokenizer::Tokenizer;

/// Placed between the filler segment and the query.
pub const SEPARATOR: &str = "\n\n";

/// Allowed distance between the composed input's token count and its target
/// before a drift warning is raised. Heuristic, not a precision guarantee.
pub const TOKEN_TOLERANCE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputWarning {
    /// The query alone needs more tokens than the target; the input is the query
    /// truncated to the target.
    QueryTooLong { query_tokens: usize, target: usize },
    /// The composed input landed outside [`TOKEN_TOLERANCE`] of the target.
    TokenDrift { actual: usize, target: usize },
}

impl fmt::Display for InputWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputWarning::QueryTooLong {
                query_tokens,
                target,
            } => write!(
                f,
                "core query ({query_tokens} tokens) is longer than target total user tokens ({target}); using query only"
            ),
            InputWarning::TokenDrift { actual, target } => write!(
                f,
                "generated user input token count ({actual}) differs from target ({target}) by more than {TOKEN_TOLERANCE}"
            ),
        }
    }
}

/// User input assembled for one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedInput {
    pub text: String,
    pub token_count: usize,
    pub query_tokens: usize,
    pub warnings: Vec<InputWarning>,
}

pub fn count_tokens(tokenizer: &dyn Tokenizer, text: &str) -> usize {
    tokenizer.count(text)
}

/// Cuts `text` down to at most `max_tokens` tokens.
///
/// Text already within budget is returned untouched. Otherwise the first
/// `max_tokens` tokens are decoded; since decoding can merge or split tokens,
/// the result is re-encoded once and cut again if it grew past the budget.
/// The result may end up a few tokens short.
pub fn truncate_to_tokens<'a>(
    tokenizer: &dyn Tokenizer,
    text: &'a str,
    max_tokens: usize,
) -> Cow<'a, str> {
    if max_tokens == 0 {
        return Cow::Borrowed("");
    }

    let tokens = tokenizer.encode(text);
    if tokens.len() <= max_tokens {
        return Cow::Borrowed(text);
    }

    let truncated = tokenizer.decode(&tokens[..max_tokens]);
    let reencoded = tokenizer.encode(&truncated);
    if reencoded.len() > max_tokens {
        return Cow::Owned(tokenizer.decode(&reencoded[..max_tokens]));
    }
    Cow::Owned(truncated)
}

/// Builds `filler + SEPARATOR + query` sized to `target_total_tokens`.
///
/// The query is kept whole whenever filler alone can absorb the budget.
pub fn build_user_input(
    tokenizer: &dyn Tokenizer,
    filler_corpus: &str,
    query: &str,
    target_total_tokens: usize,
) -> ComposedInput {
    let query_tokens = count_tokens(tokenizer, query);
    let mut warnings = Vec::new();

    let text = match target_total_tokens.checked_sub(query_tokens) {
        None => {
            warnings.push(InputWarning::QueryTooLong {
                query_tokens,
                target: target_total_tokens,
            });
            truncate_to_tokens(tokenizer, query, target_total_tokens).into_owned()
        }
        Some(required_filler_tokens) => {
            let filler = truncate_to_tokens(tokenizer, filler_corpus, required_filler_tokens);
            let mut text = String::with_capacity(filler.len() + SEPARATOR.len() + query.len());
            text.push_str(&filler);
            text.push_str(SEPARATOR);
            text.push_str(query);
            text
        }
    };

    let token_count = count_tokens(tokenizer, &text);
    if token_count.abs_diff(target_total_tokens) > TOKEN_TOLERANCE {
        warnings.push(InputWarning::TokenDrift {
            actual: token_count,
            target: target_total_tokens,
        });
    }

    ComposedInput {
        text,
        token_count,
        query_tokens,
        warnings,
    }
}
