//! JSON-RPC implementation of [`ChainClient`].

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ChainConfig;
use crate::constants::chain::LOG_CONFIDENTIAL_SELECTOR;
use crate::error::ChainError;

use super::traits::{ChainClient, ChainResult};
use super::types::{hex_encode, parse_hex_quantity, parse_hex_u64, NetworkInfo, TxReceipt};

#[derive(Clone)]
pub struct JsonRpcChain {
    client: Client,
    rpc_url: String,
    network_name: String,
    signer: Option<String>,
    logger_contract: String,
}

impl JsonRpcChain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            client: Client::new(),
            rpc_url: config.rpc_url,
            network_name: config.network_name,
            signer: config.signer_address,
            logger_contract: config.logger_contract,
        }
    }

    async fn call(&self, method: &str, params: Value) -> ChainResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": uuid::Uuid::new_v4().to_string(),
            "method": method,
            "params": params,
        });

        debug!("[CHAIN] {} -> {}", method, self.rpc_url);

        let resp = self.client.post(&self.rpc_url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ChainError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| ChainError::Decode(format!("{} (body: {})", e, text)))?;

        if let Some(err) = raw.get("error") {
            let code = err.get("code").and_then(|v| v.as_i64()).unwrap_or(0);
            let message = err
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown RPC error")
                .to_string();
            return Err(ChainError::Rpc { code, message });
        }

        raw.get("result")
            .cloned()
            .ok_or_else(|| ChainError::Decode(format!("missing result field (body: {})", text)))
    }

    async fn call_for_quantity(&self, method: &str, params: Value) -> ChainResult<u128> {
        let result = self.call(method, params).await?;
        result
            .as_str()
            .and_then(parse_hex_quantity)
            .ok_or_else(|| ChainError::Decode(format!("{}: non-quantity result {}", method, result)))
    }

    fn require_signer(&self) -> ChainResult<&str> {
        self.signer.as_deref().ok_or(ChainError::Rpc {
            code: -32000,
            message: "no signing account configured".to_string(),
        })
    }
}

/// ABI-encode `logConfidentialDecision(bytes)` calldata.
pub fn encode_log_confidential(ciphertext: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 64 + ciphertext.len().div_ceil(32) * 32);
    data.extend_from_slice(&LOG_CONFIDENTIAL_SELECTOR);

    // head: offset of the dynamic bytes argument
    let mut offset = [0u8; 32];
    offset[31] = 0x20;
    data.extend_from_slice(&offset);

    // tail: length + right-padded payload
    let mut len = [0u8; 32];
    len[16..].copy_from_slice(&(ciphertext.len() as u128).to_be_bytes());
    data.extend_from_slice(&len);
    data.extend_from_slice(ciphertext);
    let rem = ciphertext.len() % 32;
    if rem != 0 {
        data.extend_from_slice(&vec![0u8; 32 - rem]);
    }
    data
}

#[async_trait]
impl ChainClient for JsonRpcChain {
    fn signer_address(&self) -> Option<String> {
        self.signer.clone()
    }

    async fn network(&self) -> ChainResult<NetworkInfo> {
        let chain_id = self.call_for_quantity("eth_chainId", json!([])).await?;
        Ok(NetworkInfo {
            name: self.network_name.clone(),
            chain_id: chain_id as u64,
        })
    }

    async fn balance_of(&self, address: &str) -> ChainResult<u128> {
        self.call_for_quantity("eth_getBalance", json!([address, "latest"]))
            .await
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.call_for_quantity("eth_gasPrice", json!([])).await
    }

    async fn transaction_receipt(&self, hash: &str) -> ChainResult<Option<TxReceipt>> {
        let result = self.call("eth_getTransactionReceipt", json!([hash])).await?;
        if result.is_null() {
            return Ok(None);
        }
        let success = result
            .get("status")
            .and_then(|v| v.as_str())
            .and_then(parse_hex_quantity)
            .map(|s| s == 1)
            .unwrap_or(false);
        let block_number = result
            .get("blockNumber")
            .and_then(|v| v.as_str())
            .and_then(parse_hex_u64)
            .unwrap_or(0);
        Ok(Some(TxReceipt {
            success,
            block_number,
        }))
    }

    async fn send_transfer(&self, to: &str, value_wei: u128, data: &[u8]) -> ChainResult<String> {
        let from = self.require_signer()?.to_string();
        let tx = json!({
            "from": from,
            "to": to,
            "value": format!("{:#x}", value_wei),
            "data": hex_encode(data),
        });
        let result = self.call("eth_sendTransaction", json!([tx])).await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ChainError::Decode(format!("non-string tx hash: {}", result)))
    }

    async fn log_confidential(&self, ciphertext: &[u8], value_wei: u128) -> ChainResult<String> {
        let from = self.require_signer()?.to_string();
        let calldata = encode_log_confidential(ciphertext);
        let tx = json!({
            "from": from,
            "to": self.logger_contract,
            "value": format!("{:#x}", value_wei),
            "data": hex_encode(&calldata),
        });
        let result = self.call("eth_sendTransaction", json!([tx])).await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ChainError::Decode(format!("non-string tx hash: {}", result)))
    }
}
