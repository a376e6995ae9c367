//! Dilution core: tokenizer adapter, token-budgeted input builder, response rubric
//! and the retry state machine. No IO lives here.
mod budget;
mod evaluate;
mod record;
mod retry;
mod tokenizer;

pub use budget::{
    build_user_input, count_tokens, truncate_to_tokens, ComposedInput, InputWarning, SEPARATOR,
    TOKEN_TOLERANCE,
};
pub use evaluate::{EvaluationResult, Evaluator, Rubric, CHECK_COUNT, INFORMAL_MARKERS};
pub use record::{summarize, LengthSummary, TrialRecord, NO_RESPONSE_SENTINEL};
pub use retry::{step, AttemptOutcome, RetryAction, RetryState};
pub use tokenizer::{
    ByteTokenizer, TiktokenTokenizer, TokenId, Tokenizer, TokenizerCache, FALLBACK_ENCODING,
};
