use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use swarm_cache_common::address::normalize_address;
use swarm_cache_common::cache::{CacheKey, HotCache, TTL_INDEXER};
use swarm_cache_common::error::{GatewayError, Result};

/// Wraps the third-party indexer for ERC-20 portfolios and NFT collections
/// (spec §4.6), grounded on `original_source/app/services/moralis_service.py`'s
/// `_make_request`/`get_user_token_portfolio`/`get_user_nfts`, re-expressed
/// with an explicit error taxonomy instead of the source's single generic
/// `Exception`.
pub struct PortfolioGateway {
    client: Client,
    base_url: String,
    api_key: String,
    hot_cache: Arc<HotCache>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub logo: Option<String>,
    pub decimals: u32,
    pub balance_wei: String,
    pub balance: f64,
    pub usd_price: Option<f64>,
    pub usd_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Erc20Portfolio {
    pub wallet: String,
    pub chain: String,
    pub tokens: Vec<TokenEntry>,
    pub total_tokens: usize,
    pub total_usd_value: f64,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftEntry {
    pub token_id: String,
    pub name: Option<String>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftCollection {
    pub contract_address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub contract_type: Option<String>,
    pub nfts: Vec<NftEntry>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub portfolio_refreshed: bool,
    pub nfts_refreshed: bool,
}

impl PortfolioGateway {
    pub fn new(base_url: String, api_key: String, hot_cache: Arc<HotCache>) -> Self {
        PortfolioGateway { client: Client::new(), base_url, api_key, hot_cache }
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|err| GatewayError::UpstreamError(format!("transport error calling {path}: {err}")))?;

        match response.status() {
            StatusCode::OK => response
                .json::<Value>()
                .await
                .map_err(|err| GatewayError::UpstreamError(format!("invalid JSON from {path}: {err}"))),
            StatusCode::TOO_MANY_REQUESTS => Err(GatewayError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
            status => Err(GatewayError::UpstreamError(format!("{path} returned {status}"))),
        }
    }

    pub async fn erc20_portfolio(&self, wallet: &str, chain: &str) -> Result<Erc20Portfolio> {
        let wallet = normalize_address(wallet)?;
        let key = CacheKey::new("portfolio", format!("{wallet}:{chain}"));
        if let Some(cached) = self.hot_cache.get(&key) {
            if let Ok(portfolio) = serde_json::from_value::<Erc20Portfolio>(cached) {
                return Ok(portfolio);
            }
        }

        let raw = self
            .get_json(&format!("/{wallet}/erc20"), &[
                ("chain", chain.to_string()),
                ("format", "decimal".to_string()),
                ("exclude_spam", "true".to_string()),
                ("exclude_unverified_contracts", "true".to_string()),
            ])
            .await?;

        let entries = raw.as_array().cloned().unwrap_or_default();
        let mut tokens = Vec::with_capacity(entries.len());
        let mut total_usd_value = 0.0;

        for entry in entries {
            let address = entry.get("token_address").and_then(Value::as_str).unwrap_or_default().to_lowercase();
            let decimals: u32 = entry.get("decimals").and_then(Value::as_u64).unwrap_or(18) as u32;
            let balance_wei = entry.get("balance").and_then(Value::as_str).unwrap_or("0").to_string();
            let balance_raw: f64 = balance_wei.parse().unwrap_or(0.0);
            if balance_raw == 0.0 {
                continue;
            }
            let balance = balance_raw / 10f64.powi(decimals as i32);
            let usd_price = entry.get("usd_price").and_then(Value::as_f64);
            let usd_value = usd_price.map(|p| p * balance);
            if let Some(v) = usd_value {
                total_usd_value += v;
            }

            tokens.push(TokenEntry {
                address,
                name: entry.get("name").and_then(Value::as_str).unwrap_or("Unknown Token").to_string(),
                symbol: entry.get("symbol").and_then(Value::as_str).unwrap_or("UNKNOWN").to_string(),
                logo: entry.get("logo").and_then(Value::as_str).map(str::to_string),
                decimals,
                balance_wei,
                balance,
                usd_price,
                usd_value,
            });
        }

        tokens.sort_by(|a, b| b.usd_value.unwrap_or(0.0).partial_cmp(&a.usd_value.unwrap_or(0.0)).unwrap_or(std::cmp::Ordering::Equal));

        let portfolio = Erc20Portfolio {
            wallet: wallet.clone(),
            chain: chain.to_string(),
            total_tokens: tokens.len(),
            total_usd_value,
            tokens,
            last_updated: chrono::Utc::now(),
        };

        self.hot_cache.put(key, json!(portfolio), TTL_INDEXER);
        Ok(portfolio)
    }

    pub async fn nft_collections(&self, wallet: &str, chain: &str) -> Result<Vec<NftCollection>> {
        let wallet = normalize_address(wallet)?;
        let key = CacheKey::new("nft_collections", format!("{wallet}:{chain}"));
        if let Some(cached) = self.hot_cache.get(&key) {
            if let Ok(collections) = serde_json::from_value::<Vec<NftCollection>>(cached) {
                return Ok(collections);
            }
        }

        let raw = self
            .get_json(&format!("/{wallet}/nft"), &[
                ("chain", chain.to_string()),
                ("format", "decimal".to_string()),
                ("exclude_spam", "true".to_string()),
            ])
            .await?;

        let entries = raw
            .get("result")
            .and_then(Value::as_array)
            .cloned()
            .or_else(|| raw.as_array().cloned())
            .unwrap_or_default();

        let mut by_contract: std::collections::BTreeMap<String, NftCollection> = std::collections::BTreeMap::new();

        for entry in entries {
            let contract_address = entry.get("token_address").and_then(Value::as_str).unwrap_or_default().to_lowercase();
            let metadata = entry
                .get("metadata")
                .and_then(Value::as_str)
                .map(|s| serde_json::from_str(s).unwrap_or_else(|_| json!({})))
                .unwrap_or_else(|| json!({}));

            let nft = NftEntry {
                token_id: entry.get("token_id").and_then(Value::as_str).unwrap_or_default().to_string(),
                name: entry.get("name").and_then(Value::as_str).map(str::to_string),
                metadata,
            };

            let collection = by_contract.entry(contract_address.clone()).or_insert_with(|| NftCollection {
                contract_address: contract_address.clone(),
                name: entry.get("name").and_then(Value::as_str).map(str::to_string),
                symbol: entry.get("symbol").and_then(Value::as_str).map(str::to_string),
                contract_type: entry.get("contract_type").and_then(Value::as_str).map(str::to_string),
                nfts: Vec::new(),
                total_count: 0,
            });
            collection.nfts.push(nft);
            collection.total_count += 1;
        }

        let collections: Vec<NftCollection> = by_contract.into_values().collect();
        self.hot_cache.put(key, json!(collections), TTL_INDEXER);
        Ok(collections)
    }

    /// Lightweight reachability probe for `/healthz` (spec §7 indexer
    /// status): a bare GET against the indexer base URL with a short
    /// timeout, treating any non-5xx response as reachable.
    pub async fn ping(&self) -> bool {
        match self.client.get(&self.base_url).timeout(std::time::Duration::from_secs(3)).send().await {
            Ok(response) => response.status().as_u16() < 500,
            Err(_) => false,
        }
    }

    /// Purges this wallet's Hot Cache entries before re-issuing both calls
    /// (spec §4.6); each kind's success/failure is reported independently.
    pub async fn refresh(&self, wallet: &str, chain: &str) -> RefreshReport {
        let Ok(wallet_key) = normalize_address(wallet) else {
            return RefreshReport { portfolio_refreshed: false, nfts_refreshed: false };
        };
        self.hot_cache.purge_matching("portfolio", &wallet_key);
        self.hot_cache.purge_matching("nft_collections", &wallet_key);

        let portfolio_refreshed = self.erc20_portfolio(wallet, chain).await.is_ok();
        let nfts_refreshed = self.nft_collections(wallet, chain).await.is_ok();

        RefreshReport { portfolio_refreshed, nfts_refreshed }
    }
}

