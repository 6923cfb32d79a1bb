pub mod http;

use async_trait::async_trait;

use crate::error::OracleError;

pub use http::HttpOracle;

pub type OracleResult<T> = Result<T, OracleError>;

/// Spot/buy/sell prices for a symbol, quoted in USD.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub spot: String,
    pub buy: String,
    pub sell: String,
}

/// Top pool stats for a liquidity search.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolStats {
    pub dex: String,
    pub base: String,
    pub quote: String,
    pub liquidity_usd: f64,
    pub price_usd: String,
    pub volume_h24: f64,
    pub url: String,
}

/// Price / liquidity oracle collaborator. Absence of data for a query is a
/// normal `Ok(None)`, not an error.
#[async_trait]
pub trait MarketOracle: Send + Sync {
    async fn price_quote(&self, symbol: &str) -> OracleResult<PriceQuote>;

    async fn pool_liquidity(&self, query: &str) -> OracleResult<Option<PoolStats>>;
}
