use std::sync::Arc;

use serde_json::json;
use sqlx::{PgPool, Row};
use swarm_cache_common::cache::{CacheKey, HotCache, TTL_IMMUTABLE};
use swarm_cache_common::catalog::{CardClass, CharacterEntry, WeaponMappingEntry};

/// Read-only static catalog tables (spec §3, §4.5): characters,
/// weapon_mappings, contracts. These rows never change once inserted, so
/// lookups are read-through cached in the Hot Cache under `TTL_IMMUTABLE`
/// rather than re-queried on every enrichment pass (spec §4.5 step 5).
pub struct CatalogStore {
    pool: PgPool,
    hot_cache: Arc<HotCache>,
}

impl CatalogStore {
    pub fn new(pool: PgPool, hot_cache: Arc<HotCache>) -> Self {
        CatalogStore { pool, hot_cache }
    }

    pub async fn character(&self, season_card_id: i64) -> anyhow::Result<Option<CharacterEntry>> {
        let key = CacheKey::new("catalog_character", season_card_id.to_string());
        if let Some(cached) = self.hot_cache.get(&key) {
            return Ok(serde_json::from_value(cached)?);
        }

        let row = sqlx::query("SELECT season_card_id, title, fraction, class FROM characters WHERE season_card_id = $1")
            .bind(season_card_id)
            .fetch_optional(&self.pool)
            .await?;

        let entry = row.map(|r| {
            let class_str: String = r.get("class");
            CharacterEntry {
                season_card_id: r.get::<i64, _>("season_card_id") as u64,
                title: r.get("title"),
                fraction: r.get("fraction"),
                class: CardClass::parse_catalog_value(&class_str).unwrap_or(CardClass::Specialist),
            }
        });

        self.hot_cache.put(key, json!(entry), TTL_IMMUTABLE);
        Ok(entry)
    }

    pub async fn weapon_mapping(&self, tier: i64, weapon_type: i64, subtype: i64, category: i64) -> anyhow::Result<Option<WeaponMappingEntry>> {
        let key = CacheKey::new("catalog_weapon_mapping", format!("{tier}:{weapon_type}:{subtype}:{category}"));
        if let Some(cached) = self.hot_cache.get(&key) {
            return Ok(serde_json::from_value(cached)?);
        }

        let row = sqlx::query(
            "SELECT tier, weapon_type, subtype, category, weapon_name FROM weapon_mappings \
             WHERE tier = $1 AND weapon_type = $2 AND subtype = $3 AND category = $4",
        )
        .bind(tier)
        .bind(weapon_type)
        .bind(subtype)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        let entry = row.map(|r| WeaponMappingEntry {
            tier: r.get::<i64, _>("tier") as u64,
            weapon_type: r.get::<i64, _>("weapon_type") as u64,
            subtype: r.get::<i64, _>("subtype") as u64,
            category: r.get::<i64, _>("category") as u64,
            weapon_name: r.get("weapon_name"),
        });

        self.hot_cache.put(key, json!(entry), TTL_IMMUTABLE);
        Ok(entry)
    }

    /// Resolves a contract's live address by logical name (`hero`, `weapon`,
    /// `land`), used at startup to let the `contracts` table override the
    /// environment-configured address (spec §3 Contract address row).
    pub async fn active_contract_address(&self, logical_name: &str) -> anyhow::Result<Option<String>> {
        let key = CacheKey::new("catalog_contract", logical_name.to_string());
        if let Some(cached) = self.hot_cache.get(&key) {
            return Ok(serde_json::from_value(cached)?);
        }

        let row = sqlx::query("SELECT address FROM contracts WHERE logical_name = $1 AND active = TRUE")
            .bind(logical_name)
            .fetch_optional(&self.pool)
            .await?;
        let address: Option<String> = row.map(|r| r.get("address"));

        self.hot_cache.put(key, json!(address), TTL_IMMUTABLE);
        Ok(address)
    }
}
