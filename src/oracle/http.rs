//! HTTP adapter for the price/liquidity oracle (Coinbase price endpoints +
//! DexScreener pool search), with a short-TTL per-symbol price cache.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::OracleConfig;
use crate::error::OracleError;

use super::{MarketOracle, OracleResult, PoolStats, PriceQuote};

#[derive(Clone)]
pub struct HttpOracle {
    client: Client,
    coinbase_url: String,
    dexscreener_url: String,
    price_cache: DashMap<String, (Instant, PriceQuote)>,
    cache_ttl: Duration,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            client: Client::new(),
            coinbase_url: config.coinbase_url,
            dexscreener_url: config.dexscreener_url,
            price_cache: DashMap::new(),
            cache_ttl: Duration::from_secs(config.price_cache_secs),
        }
    }

    async fn fetch_price_field(&self, symbol: &str, side: &str) -> OracleResult<String> {
        let url = format!("{}/v2/prices/{}-USD/{}", self.coinbase_url, symbol, side);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(OracleError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| OracleError::Decode(format!("{} (body: {})", e, text)))?;
        raw.pointer("/data/amount")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| OracleError::Decode(format!("missing data.amount (body: {})", text)))
    }
}

#[async_trait]
impl MarketOracle for HttpOracle {
    async fn price_quote(&self, symbol: &str) -> OracleResult<PriceQuote> {
        let symbol = symbol.to_uppercase();

        if let Some(entry) = self.price_cache.get(&symbol) {
            let (fetched, quote) = entry.value();
            if fetched.elapsed() < self.cache_ttl {
                debug!("[ORACLE] Price cache hit for {}", symbol);
                return Ok(quote.clone());
            }
        }

        // Spot, buy and sell fetched concurrently for comprehensive context
        let (spot, buy, sell) = tokio::try_join!(
            self.fetch_price_field(&symbol, "spot"),
            self.fetch_price_field(&symbol, "buy"),
            self.fetch_price_field(&symbol, "sell"),
        )?;

        let quote = PriceQuote {
            symbol: symbol.clone(),
            spot,
            buy,
            sell,
        };
        self.price_cache
            .insert(symbol, (Instant::now(), quote.clone()));
        Ok(quote)
    }

    async fn pool_liquidity(&self, query: &str) -> OracleResult<Option<PoolStats>> {
        let url = format!(
            "{}/latest/dex/search?q={}",
            self.dexscreener_url,
            query.to_uppercase()
        );
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            // No data for this query is a normal, handled case.
            debug!("[ORACLE] DEX search for {} returned {}", query, status);
            return Ok(None);
        }
        let text = resp.text().await?;
        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| OracleError::Decode(format!("{} (body: {})", e, text)))?;

        let pairs = match raw.get("pairs").and_then(|v| v.as_array()) {
            Some(pairs) if !pairs.is_empty() => pairs,
            _ => return Ok(None),
        };
        let top = &pairs[0];

        Ok(Some(PoolStats {
            dex: str_at(top, "/dexId"),
            base: str_at(top, "/baseToken/symbol"),
            quote: str_at(top, "/quoteToken/symbol"),
            liquidity_usd: top
                .pointer("/liquidity/usd")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
            price_usd: str_at(top, "/priceUsd"),
            volume_h24: top
                .pointer("/volume/h24")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
            url: str_at(top, "/url"),
        }))
    }
}

fn str_at(v: &Value, pointer: &str) -> String {
    v.pointer(pointer)
        .and_then(|s| s.as_str())
        .unwrap_or("unknown")
        .to_string()
}
