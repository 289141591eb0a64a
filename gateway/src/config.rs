use std::env;

use anyhow::{Context, Result};

/// Process configuration loaded from the environment (spec §6). Follows the
/// teacher's own priority-chain idiom for resolving secrets (env var, then
/// file path) seen in `wallet/src/main.rs`'s `get_password`, generalized to
/// RSA key loading (spec §9 redesign note: accept a PEM path or a
/// base64-encoded PEM directly).
pub struct Config {
    pub bind_address: String,
    pub http_workers: usize,
    pub rpc_endpoints: Vec<String>,
    pub hero_contract: String,
    pub weapon_contract: String,
    pub land_contract: String,
    pub database_url: String,
    pub indexer_base_url: String,
    pub indexer_api_key: String,
    pub score_key: Option<RsaKeySource>,
    pub info_key: Option<RsaKeySource>,
    pub hot_cache_capacity: usize,
}

#[derive(Debug, Clone)]
pub enum RsaKeySource {
    Path(String),
    Base64Pem(String),
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            http_workers: env::var("HTTP_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            rpc_endpoints: env::var("RPC_ENDPOINTS")
                .context("RPC_ENDPOINTS must be set (comma-separated list)")?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            hero_contract: env::var("HERO_CONTRACT_ADDRESS").context("HERO_CONTRACT_ADDRESS must be set")?,
            weapon_contract: env::var("WEAPON_CONTRACT_ADDRESS").context("WEAPON_CONTRACT_ADDRESS must be set")?,
            land_contract: env::var("LAND_CONTRACT_ADDRESS").context("LAND_CONTRACT_ADDRESS must be set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            indexer_base_url: env::var("INDEXER_BASE_URL").unwrap_or_else(|_| "https://deep-index.moralis.io/api/v2.2".to_string()),
            indexer_api_key: env::var("INDEXER_API_KEY").unwrap_or_default(),
            score_key: Self::key_source("SCORE_PRIVATE_KEY_PATH", "SCORE_PRIVATE_KEY_BASE64"),
            info_key: Self::key_source("INFO_PRIVATE_KEY_PATH", "INFO_PRIVATE_KEY_BASE64"),
            hot_cache_capacity: env::var("HOT_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100_000),
        })
    }

    fn key_source(path_var: &str, b64_var: &str) -> Option<RsaKeySource> {
        if let Ok(path) = env::var(path_var) {
            if !path.trim().is_empty() {
                return Some(RsaKeySource::Path(path));
            }
        }
        if let Ok(b64) = env::var(b64_var) {
            if !b64.trim().is_empty() {
                return Some(RsaKeySource::Base64Pem(b64));
            }
        }
        None
    }

    /// The score subsystem is fatal-at-startup if either key is missing;
    /// every other subsystem must keep running without it (spec §6, §9).
    pub fn score_subsystem_ready(&self) -> bool {
        self.score_key.is_some() && self.info_key.is_some()
    }
}
