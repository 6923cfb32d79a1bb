//! Chain-side value types and unit conversion helpers.

use crate::constants::chain::{WEI_PER_GWEI, WEI_PER_TOKEN};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkInfo {
    pub name: String,
    pub chain_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub success: bool,
    pub block_number: u64,
}

/// Strip everything except digits and the decimal point from a free-text
/// amount. "1,000 SHM" -> "1000". The result may still be empty or zero;
/// value-moving tools treat that as an error, never as a default.
pub fn sanitize_amount(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Parse a decimal token amount into wei. Fractions beyond 18 decimals are
/// truncated. Returns None for anything that is not a plain decimal number.
pub fn parse_token_amount(s: &str) -> Option<u128> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let mut parts = s.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next().unwrap_or("");

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };

    let mut frac_wei: u128 = 0;
    if !frac.is_empty() {
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let digits: String = frac.chars().take(18).collect();
        let padded = format!("{:0<18}", digits);
        frac_wei = padded.parse().ok()?;
    }

    whole
        .checked_mul(WEI_PER_TOKEN)
        .and_then(|w| w.checked_add(frac_wei))
}

/// Format wei as a decimal token string with trailing zeros trimmed,
/// keeping at least one fractional digit ("1.5", "0.0").
pub fn format_token_amount(wei: u128) -> String {
    let whole = wei / WEI_PER_TOKEN;
    let frac = wei % WEI_PER_TOKEN;
    if frac == 0 {
        return format!("{}.0", whole);
    }
    let frac_str = format!("{:018}", frac);
    let trimmed = frac_str.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

/// Format a wei gas price in gwei.
pub fn format_gwei(wei: u128) -> String {
    let whole = wei / WEI_PER_GWEI;
    let frac = wei % WEI_PER_GWEI;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:09}", frac);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

pub fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Parse a 0x-prefixed hex quantity (as returned by eth_* calls).
pub fn parse_hex_quantity(s: &str) -> Option<u128> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, 16).ok()
}

pub fn parse_hex_u64(s: &str) -> Option<u64> {
    parse_hex_quantity(s).and_then(|v| u64::try_from(v).ok())
}

/// Loose shape check for an EVM address lifted out of free text.
pub fn looks_like_address(s: &str) -> bool {
    s.len() >= 4 && s.starts_with("0x") && s[2..].chars().any(|c| c.is_ascii_alphanumeric())
}
