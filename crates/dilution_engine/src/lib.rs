//! Dilution engine: corpus loading, model invocation, result persistence and the
//! experiment driver.
mod client;
mod config;
mod corpus;
mod driver;
mod invoke;
mod persist;
mod results;

pub use client::{ChatRequest, ClientSettings, InvokeError, ModelClient, OpenAiChatClient};
pub use config::{ExperimentConfig, DEFAULT_CORE_QUERY, DEFAULT_SYSTEM_PROMPT};
pub use corpus::{load_filler_corpus, CorpusError};
pub use driver::{ExperimentDriver, RunReport};
pub use invoke::{Delay, RetryingInvoker, RetrySettings, TokioDelay};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use results::ResultLog;
