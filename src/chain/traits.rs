use async_trait::async_trait;

use crate::error::ChainError;

use super::types::{NetworkInfo, TxReceipt};

pub type ChainResult<T> = Result<T, ChainError>;

/// Chain RPC / signer collaborator. The default implementation speaks
/// JSON-RPC against a node that manages the signing account; tests supply
/// in-memory fakes.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Connected signing account, if any. None means value-moving tools
    /// must fail their precondition check before any external call.
    fn signer_address(&self) -> Option<String>;

    async fn network(&self) -> ChainResult<NetworkInfo>;

    /// Balance in wei.
    async fn balance_of(&self, address: &str) -> ChainResult<u128>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> ChainResult<u128>;

    async fn transaction_receipt(&self, hash: &str) -> ChainResult<Option<TxReceipt>>;

    /// Plain value transfer with arbitrary calldata; returns the tx hash.
    async fn send_transfer(&self, to: &str, value_wei: u128, data: &[u8]) -> ChainResult<String>;

    /// Single transaction that records the encrypted payload on the
    /// decision-logger contract and moves `value_wei` along with it.
    async fn log_confidential(&self, ciphertext: &[u8], value_wei: u128) -> ChainResult<String>;
}
