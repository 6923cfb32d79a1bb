//! Custom error types for the agent system
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Errors raised by tool execution. Each variant stays distinguishable so
/// callers can report which precondition or upstream system failed instead
/// of a generic message.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Wallet not connected (required by {tool})")]
    WalletNotConnected { tool: String },

    #[error("No recipient address resolved for {tool}")]
    RecipientNotFound { tool: String },

    #[error("Missing or zero amount for {tool} (got: {raw:?})")]
    MissingAmount { tool: String, raw: String },

    #[error("Chain RPC error: {0}")]
    Chain(#[from] ChainError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Encryption failed: {0}")]
    Encryption(#[from] ConfidentialError),
}

/// Chain RPC / signer collaborator errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Price / liquidity oracle errors
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed oracle response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Confidential-compute collaborator errors
#[derive(Error, Debug)]
pub enum ConfidentialError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed encryption response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// LLM collaborator errors. The router converts these into error-shaped
/// Decisions; they never cross the router boundary.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM API error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("LLM request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("LLM backend error: {0}")]
    Backend(String),

    #[error("LLM queue error: {0}")]
    Queue(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LlmError {
    /// True when the collaborator could not be reached at all, as opposed
    /// to reached-but-failed. Unreachable routes through the local keyword
    /// fallback instead of surfacing an error Decision.
    pub fn is_unreachable(&self) -> bool {
        match self {
            LlmError::Network(e) => e.is_connect(),
            _ => false,
        }
    }
}
