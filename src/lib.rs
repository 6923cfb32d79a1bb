//! AgentChain - blockchain AI agent core
//!
//! This library provides the tool-dispatch layer of the agent: a static
//! tool registry, an LLM-backed intent router with a deterministic
//! fallback, a persistent decision log, and the executor that carries
//! approved decisions out against the chain, the price oracle and the
//! confidential-compute service.

pub mod chain;
pub mod config;
pub mod confidential;
pub mod constants;
pub mod decision_log;
pub mod error;
pub mod executor;
pub mod llm;
pub mod oracle;
pub mod registry;
pub mod router;
pub mod session;

// Re-export commonly used types
pub use config::AppConfig;
pub use decision_log::{DecisionLog, LogEntry, LogStatus, Visibility};
pub use error::{ChainError, ConfidentialError, ExecError, LlmError, OracleError};
pub use executor::{ExecCall, ExecOptions, ToolExecutor};
pub use registry::{Tool, ToolKind, ToolRegistry};
pub use router::{Decision, IntentRouter, RouteContext};
pub use session::{AgentSession, RoutedTurn};

#[cfg(test)]
mod decision_log_tests;
