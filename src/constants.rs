//! Application-wide constants and magic numbers
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make the codebase easier to tune.

/// Decision log persistence constants
pub mod storage {
    /// Default file name for the durable decision log
    pub const DEFAULT_LOG_FILE: &str = "agentchain_activity_log.json";

    /// Schema version written into the persisted envelope
    pub const SCHEMA_VERSION: u32 = 1;
}

/// LLM routing constants
pub mod llm {
    /// Default caller-enforced routing timeout. Local inference is slow,
    /// so anything under 30s produces spurious timeouts.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default queue depth for pending routing requests
    pub const DEFAULT_QUEUE_SIZE: usize = 16;

    /// Default number of concurrent in-flight LLM calls
    pub const DEFAULT_MAX_CONCURRENT: usize = 1;
}

/// Chain and unit constants
pub mod chain {
    /// Gas used by a plain value transfer
    pub const TRANSFER_GAS: u128 = 21_000;

    /// Wei per one native token (18 decimals)
    pub const WEI_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

    /// Wei per gwei
    pub const WEI_PER_GWEI: u128 = 1_000_000_000;

    /// 4-byte selector for `logConfidentialDecision(bytes)` on the
    /// decision-logger contract (keccak-256 of the Solidity signature)
    pub const LOG_CONFIDENTIAL_SELECTOR: [u8; 4] = [0xe1, 0xaf, 0xe4, 0x1f];
}

/// Simulation mode constants
pub mod simulation {
    /// Marker prepended to every simulated result
    pub const MARKER: &str = "[SIMULATION]";

    /// Confirmation hint appended to every simulated result
    pub const CONFIRM_HINT: &str = "Switch to LIVE to confirm.";
}

/// Confidential-compute constants
pub mod confidential {
    /// How many hex characters of a ciphertext to show before truncating
    pub const CIPHERTEXT_PREVIEW_LEN: usize = 32;
}

/// Logging event names for structured logging
pub mod events {
    pub const PROMPT_ROUTED: &str = "prompt_routed";
    pub const ROUTING_FALLBACK: &str = "routing_fallback";
    pub const ROUTING_FAILED: &str = "routing_failed";
    pub const TOOL_EXECUTED: &str = "tool_executed";
    pub const TOOL_REVERTED: &str = "tool_reverted";
    pub const TOOL_UNIMPLEMENTED: &str = "tool_unimplemented";
    pub const LOG_PERSIST_FAILED: &str = "log_persist_failed";
}
