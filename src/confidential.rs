//! Confidential-compute collaborator: encrypts values before they touch
//! the chain. Values are pre-normalized to a supported numeric width;
//! arbitrary text (the router's reasoning) is folded into a bounded
//! integer first.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::ConfidentialConfig;
use crate::error::ConfidentialError;

pub type ConfidentialResult<T> = Result<T, ConfidentialError>;

/// Encrypted-handle widths supported by the collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Uint256,
    Address,
}

impl HandleType {
    /// Map a user-facing type name to a handle type; unknown names fall
    /// back to uint32 like the reference integration.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bool" => HandleType::Bool,
            "uint8" => HandleType::Uint8,
            "uint16" => HandleType::Uint16,
            "uint32" => HandleType::Uint32,
            "uint64" => HandleType::Uint64,
            "uint128" => HandleType::Uint128,
            "uint256" => HandleType::Uint256,
            "address" => HandleType::Address,
            _ => HandleType::Uint32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HandleType::Bool => "ebool",
            HandleType::Uint8 => "euint8",
            HandleType::Uint16 => "euint16",
            HandleType::Uint32 => "euint32",
            HandleType::Uint64 => "euint64",
            HandleType::Uint128 => "euint128",
            HandleType::Uint256 => "euint256",
            HandleType::Address => "euint160",
        }
    }

    /// Bit width of the integer payload.
    fn bits(&self) -> u32 {
        match self {
            HandleType::Bool => 1,
            HandleType::Uint8 => 8,
            HandleType::Uint16 => 16,
            HandleType::Uint32 => 32,
            HandleType::Uint64 => 64,
            HandleType::Uint128 => 128,
            HandleType::Uint256 => 256,
            HandleType::Address => 160,
        }
    }
}

/// Normalize a raw value to a decimal integer string within the handle
/// width. Numeric text keeps its leading integer; anything else is folded
/// byte-by-byte so reasoning strings still produce a stable payload.
pub fn normalize_value(raw: &str, handle: HandleType) -> String {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    let value: u128 = if !digits.is_empty() {
        digits.parse().unwrap_or_else(|_| fold_text(raw))
    } else {
        fold_text(raw)
    };

    clamp_to_width(value, handle).to_string()
}

fn fold_text(raw: &str) -> u128 {
    raw.bytes()
        .fold(0u128, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u128))
}

fn clamp_to_width(value: u128, handle: HandleType) -> u128 {
    let bits = handle.bits();
    if bits >= 128 {
        return value;
    }
    value & ((1u128 << bits) - 1)
}

#[async_trait]
pub trait ConfidentialClient: Send + Sync {
    /// Encrypt a pre-normalized decimal value, returning the ciphertext
    /// bytes for on-chain logging.
    async fn encrypt(
        &self,
        value: &str,
        handle: HandleType,
        account_address: Option<&str>,
        dapp_address: &str,
    ) -> ConfidentialResult<Vec<u8>>;
}

/// HTTP client for the encryption endpoint.
#[derive(Clone)]
pub struct LightningClient {
    client: Client,
    base_url: String,
}

impl LightningClient {
    pub fn new(config: &ConfidentialConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
        }
    }
}

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[async_trait]
impl ConfidentialClient for LightningClient {
    async fn encrypt(
        &self,
        value: &str,
        handle: HandleType,
        account_address: Option<&str>,
        dapp_address: &str,
    ) -> ConfidentialResult<Vec<u8>> {
        let url = format!("{}/encrypt", self.base_url);
        let body = json!({
            "value": value,
            "handleType": handle.as_str(),
            "accountAddress": account_address.unwrap_or(ZERO_ADDRESS),
            "dappAddress": dapp_address,
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ConfidentialError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| ConfidentialError::Decode(format!("{} (body: {})", e, text)))?;
        let ciphertext = raw
            .get("ciphertext")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ConfidentialError::Decode(format!("missing ciphertext field (body: {})", text))
            })?;

        decode_hex(ciphertext)
            .ok_or_else(|| ConfidentialError::Decode(format!("bad ciphertext hex: {}", ciphertext)))
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() % 2 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}
