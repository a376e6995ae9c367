use std::collections::HashMap;
use std::sync::Arc;

use dilution_logging::{dilution_error, dilution_info, dilution_warn};
use tiktoken_rs::CoreBPE;

pub type TokenId = u32;

/// Encoding used when a model name has no exact tokenizer mapping.
pub const FALLBACK_ENCODING: &str = "cl100k_base";

/// A BPE token slice can end inside a multi-byte character; at most this many
/// trailing tokens are dropped while looking for a decodable prefix.
const MAX_PARTIAL_TOKENS: usize = 4;

pub trait Tokenizer: Send + Sync {
    /// Model or encoding name this tokenizer was resolved from.
    fn name(&self) -> &str;

    fn encode(&self, text: &str) -> Vec<TokenId>;

    /// Decodes `tokens` back to text. Never fails: trailing tokens that do not
    /// form complete UTF-8 are dropped, so the result may cover fewer tokens.
    fn decode(&self, tokens: &[TokenId]) -> String;

    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            0
        } else {
            self.encode(text).len()
        }
    }
}

/// tiktoken BPE encoding.
pub struct TiktokenTokenizer {
    name: String,
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    pub fn new(name: impl Into<String>, bpe: CoreBPE) -> Self {
        Self {
            name: name.into(),
            bpe,
        }
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Vec<TokenId> {
        // Filler text may legitimately contain strings like "<|endoftext|>".
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[TokenId]) -> String {
        let floor = tokens.len().saturating_sub(MAX_PARTIAL_TOKENS);
        let mut end = tokens.len();
        while end > floor {
            match self.bpe.decode(tokens[..end].to_vec()) {
                Ok(text) => return text,
                Err(_) => end -= 1,
            }
        }
        if end == 0 {
            return String::new();
        }
        dilution_warn!(
            "Could not decode {} tokens with {}; returning empty text",
            tokens.len(),
            self.name
        );
        String::new()
    }
}

/// One token per UTF-8 byte. Last resort when no BPE tables can be loaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByteTokenizer;

impl Tokenizer for ByteTokenizer {
    fn name(&self) -> &str {
        "bytes"
    }

    fn encode(&self, text: &str) -> Vec<TokenId> {
        text.bytes().map(TokenId::from).collect()
    }

    fn decode(&self, tokens: &[TokenId]) -> String {
        let bytes: Vec<u8> = tokens
            .iter()
            .map(|&token| u8::try_from(token).unwrap_or(b'?'))
            .collect();
        match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(err) => String::from_utf8_lossy(&bytes[..err.valid_up_to()]).into_owned(),
        }
    }
}

/// Tokenizers keyed by model name. Entries are created on first use and kept
/// for the lifetime of the cache.
#[derive(Default)]
pub struct TokenizerCache {
    entries: HashMap<String, Arc<dyn Tokenizer>>,
}

impl TokenizerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, model_name: &str) -> Arc<dyn Tokenizer> {
        if let Some(tokenizer) = self.entries.get(model_name) {
            return Arc::clone(tokenizer);
        }
        let tokenizer = load_tokenizer(model_name);
        self.entries
            .insert(model_name.to_string(), Arc::clone(&tokenizer));
        tokenizer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn load_tokenizer(model_name: &str) -> Arc<dyn Tokenizer> {
    dilution_info!("Loading tokenizer for model: {}", model_name);
    match tiktoken_rs::get_bpe_from_model(model_name) {
        Ok(bpe) => Arc::new(TiktokenTokenizer::new(model_name, bpe)),
        Err(_) => {
            dilution_warn!(
                "No exact tokenizer found for model '{}'. Falling back to '{}'.",
                model_name,
                FALLBACK_ENCODING
            );
            match tiktoken_rs::cl100k_base() {
                Ok(bpe) => Arc::new(TiktokenTokenizer::new(FALLBACK_ENCODING, bpe)),
                Err(err) => {
                    dilution_error!(
                        "Failed to load '{}' ({}); counting UTF-8 bytes instead",
                        FALLBACK_ENCODING,
                        err
                    );
                    Arc::new(ByteTokenizer)
                }
            }
        }
    }
}
