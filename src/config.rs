use serde::Deserialize;
use std::fs;

use crate::constants;

#[derive(Clone, Debug, Deserialize)]
pub struct LlmConfig {
    /// "ollama" (duck-typed HTTP backend) or "openai" (OpenAI-compatible API)
    #[serde(default = "default_llm_backend")]
    pub backend: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_queue_size")]
    pub queue_size: usize,
    #[serde(default = "default_llm_max_concurrent")]
    pub max_concurrent: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    #[serde(default = "default_network_name")]
    pub network_name: String,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
    /// Node-managed signing account. None means no wallet is connected and
    /// value-moving tools fail their precondition check.
    pub signer_address: Option<String>,
    /// Address of the deployed decision-logger contract
    pub logger_contract: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_coinbase_url")]
    pub coinbase_url: String,
    #[serde(default = "default_dexscreener_url")]
    pub dexscreener_url: String,
    #[serde(default = "default_price_cache_secs")]
    pub price_cache_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConfidentialConfig {
    pub base_url: String,
    #[serde(default = "default_dapp_address")]
    pub dapp_address: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogStoreConfig {
    #[serde(default = "default_log_path")]
    pub path: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    /// Start value-moving tools in simulation mode unless told otherwise
    #[serde(default = "default_simulate")]
    pub simulate_default: bool,

    pub llm: LlmConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    pub confidential: ConfidentialConfig,
    #[serde(default)]
    pub log: LogStoreConfig,
}

impl AppConfig {
    pub fn load() -> Self {
        let config_path = "config.yaml";
        let content = fs::read_to_string(config_path).expect("Failed to read config.yaml");

        // Strip BOM if present
        let content = content.strip_prefix("\u{feff}").unwrap_or(&content);

        let config: AppConfig = serde_yaml::from_str(content).expect("Failed to parse config.yaml");
        config
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            coinbase_url: default_coinbase_url(),
            dexscreener_url: default_dexscreener_url(),
            price_cache_secs: default_price_cache_secs(),
        }
    }
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

fn default_llm_backend() -> String {
    "ollama".to_string()
}

fn default_llm_timeout() -> u64 {
    constants::llm::DEFAULT_TIMEOUT_SECS
}

fn default_llm_queue_size() -> usize {
    constants::llm::DEFAULT_QUEUE_SIZE
}

fn default_llm_max_concurrent() -> usize {
    constants::llm::DEFAULT_MAX_CONCURRENT
}

fn default_network_name() -> String {
    "Shardeum EVM".to_string()
}

fn default_explorer_url() -> String {
    "https://explorer-sphinx.shardeum.org".to_string()
}

fn default_coinbase_url() -> String {
    "https://api.coinbase.com".to_string()
}

fn default_dexscreener_url() -> String {
    "https://api.dexscreener.com".to_string()
}

fn default_price_cache_secs() -> u64 {
    15
}

fn default_dapp_address() -> String {
    "0x0000000000000000000000000000000000000000".to_string()
}

fn default_log_path() -> String {
    constants::storage::DEFAULT_LOG_FILE.to_string()
}

fn default_agent_name() -> String {
    "System".to_string()
}

fn default_simulate() -> bool {
    true
}
