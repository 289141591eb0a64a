use std::sync::Arc;

use serde_json::json;
use swarm_cache_common::address::normalize_address;
use swarm_cache_common::cache::{CacheKey, HotCache, TTL_BALANCE, TTL_OWNERSHIP};
use swarm_cache_common::chain::{ContractGateway, TokenInfo};
use swarm_cache_common::error::Result;
use swarm_cache_common::model::{
    land_metadata, HeroTokenRow, TokenKind, WeaponTokenRow, LAND_TICKET_IDS,
};

use crate::db::{CatalogStore, PersistentTokenCache};
use crate::enrichment::views::{
    derive_boosts, EnhancedPlayerData, HeroMetadata, HeroReward, HeroSlimEntry, HeroSlimMetadata,
    HeroUnityEntry, HeroUnityEnvelope, LandEntry, RewardTokenBalance, WeaponMetadata, WeaponSlimEntry,
    WeaponUnityEntry,
};

/// Maximum concurrent per-id contract calls per request (spec §5).
const FAN_OUT_CHUNK: usize = 12;

/// Logical `contracts` table names for the ERC-20 reward tokens (spec §3).
const REWARD_TOKEN_LOGICAL_NAMES: [&str; 2] = ["moh", "medallc"];

/// Outcome of an explicit per-wallet cache refresh (spec §4.6, extended to
/// heroes/weapons alongside the Portfolio Gateway's own refresh).
pub struct EnrichmentRefreshReport {
    pub heroes_refreshed: bool,
    pub weapons_refreshed: bool,
}

/// Central algorithm shared by every enrichment kind (spec §4.5): fresh
/// ownership, cache lookup, fan-out for misses, best-effort upsert, catalog
/// join, render.
pub struct EnrichmentEngine {
    gateway: Arc<ContractGateway>,
    hot_cache: Arc<HotCache>,
    persistent: Arc<PersistentTokenCache>,
    catalog: Arc<CatalogStore>,
    hero_contract_address: String,
    weapon_contract_address: String,
    land_contract_address: String,
}

impl EnrichmentEngine {
    pub fn new(
        gateway: Arc<ContractGateway>,
        hot_cache: Arc<HotCache>,
        persistent: Arc<PersistentTokenCache>,
        catalog: Arc<CatalogStore>,
        hero_contract_address: String,
        weapon_contract_address: String,
        land_contract_address: String,
    ) -> Self {
        EnrichmentEngine {
            gateway,
            hot_cache,
            persistent,
            catalog,
            hero_contract_address,
            weapon_contract_address,
            land_contract_address,
        }
    }

    async fn owned_ids(&self, kind: TokenKind, wallet: &str) -> Result<Vec<u64>> {
        let wallet = normalize_address(wallet)?;
        let key = CacheKey::new("ownership", format!("{}:{}", kind.as_str(), wallet));
        if let Some(cached) = self.hot_cache.get(&key) {
            if let Ok(ids) = serde_json::from_value::<Vec<u64>>(cached) {
                return Ok(ids);
            }
        }
        let ids = self.gateway.owned_token_ids(kind, &wallet).await?;
        self.hot_cache.put(key, json!(ids), TTL_OWNERSHIP);
        Ok(ids)
    }

    /// Steps 2-4 of spec §4.5 for heroes: cache lookup, fan-out for misses,
    /// best-effort upsert. Per-token failures are dropped and logged, never
    /// fail the whole request.
    async fn resolve_heroes(&self, ids: &[u64], wallet: &str) -> Vec<HeroTokenRow> {
        let ids_i64: Vec<i64> = ids.iter().map(|id| *id as i64).collect();
        let (hits, missing) = match self.persistent.lookup_many_heroes(&ids_i64).await {
            Ok(result) => result,
            Err(err) => {
                log::warn!("heroes persistent cache read failed, treating all as missing: {err}");
                (Vec::new(), ids.to_vec())
            }
        };

        let mut fresh = Vec::new();
        for chunk in missing.chunks(FAN_OUT_CHUNK) {
            let futs = chunk.iter().map(|&id| self.fetch_hero(id, wallet));
            for result in futures::future::join_all(futs).await {
                if let Some(row) = result {
                    fresh.push(row);
                }
            }
        }

        if !fresh.is_empty() {
            if let Err(err) = self.persistent.upsert_heroes(&fresh).await {
                log::warn!("heroes persistent cache write failed (non-fatal): {err}");
                self.persistent
                    .log_error("heroes", None, "upsert_failed", &err.to_string(), Some(wallet))
                    .await;
            }
        }

        let mut by_id: std::collections::HashMap<u64, HeroTokenRow> =
            hits.into_iter().chain(fresh).map(|r| (r.bc_id, r)).collect();

        ids.iter().filter_map(|id| by_id.remove(id)).collect()
    }

    async fn fetch_hero(&self, id: u64, wallet: &str) -> Option<HeroTokenRow> {
        let attribs = self.gateway.get_attribs(TokenKind::Heroes, id).await;
        let info = match self.gateway.get_token_info(TokenKind::Heroes, id).await {
            Ok(info) => info,
            Err(err) => {
                self.persistent
                    .log_error("heroes", Some(id as i64), "get_token_info_failed", &err.to_string(), Some(wallet))
                    .await;
                return None;
            }
        };
        let TokenInfo::Hero { season_card_id, serial_number } = info else {
            return None;
        };
        Some(HeroTokenRow {
            bc_id: id,
            sec: attribs.a,
            ano: attribs.b,
            inn: attribs.c,
            season_card_id,
            serial_number,
            last_updated: chrono::Utc::now(),
            is_valid: true,
        })
    }

    async fn resolve_weapons(&self, ids: &[u64], wallet: &str) -> Vec<WeaponTokenRow> {
        let ids_i64: Vec<i64> = ids.iter().map(|id| *id as i64).collect();
        let (hits, missing) = match self.persistent.lookup_many_weapons(&ids_i64).await {
            Ok(result) => result,
            Err(err) => {
                log::warn!("weapons persistent cache read failed, treating all as missing: {err}");
                (Vec::new(), ids.to_vec())
            }
        };

        let mut fresh = Vec::new();
        for chunk in missing.chunks(FAN_OUT_CHUNK) {
            let futs = chunk.iter().map(|&id| self.fetch_weapon(id, wallet));
            for result in futures::future::join_all(futs).await {
                if let Some(row) = result {
                    fresh.push(row);
                }
            }
        }

        if !fresh.is_empty() {
            if let Err(err) = self.persistent.upsert_weapons(&fresh).await {
                log::warn!("weapons persistent cache write failed (non-fatal): {err}");
                self.persistent
                    .log_error("weapons", None, "upsert_failed", &err.to_string(), Some(wallet))
                    .await;
            }
        }

        let mut by_id: std::collections::HashMap<u64, WeaponTokenRow> =
            hits.into_iter().chain(fresh).map(|r| (r.bc_id, r)).collect();

        ids.iter().filter_map(|id| by_id.remove(id)).collect()
    }

    async fn fetch_weapon(&self, id: u64, wallet: &str) -> Option<WeaponTokenRow> {
        let attribs = self.gateway.get_attribs(TokenKind::Weapons, id).await;
        let info = match self.gateway.get_token_info(TokenKind::Weapons, id).await {
            Ok(info) => info,
            Err(err) => {
                self.persistent
                    .log_error("weapons", Some(id as i64), "get_token_info_failed", &err.to_string(), Some(wallet))
                    .await;
                return None;
            }
        };
        let TokenInfo::Weapon { tier, weapon_type, subtype, category, serial_number } = info else {
            return None;
        };
        Some(WeaponTokenRow {
            bc_id: id,
            security: attribs.a,
            anonymity: attribs.b,
            innovation: attribs.c,
            weapon_tier: tier,
            weapon_type,
            weapon_subtype: subtype,
            category,
            serial_number,
            last_updated: chrono::Utc::now(),
            is_valid: true,
        })
    }

    async fn render_hero(&self, row: &HeroTokenRow, wallet: &str) -> HeroUnityEntry {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "render_hero: bc_id={} season_id={} card_season_collection_id={}",
                row.bc_id,
                row.season_id(),
                row.card_season_collection_id(),
            );
        }
        let (title, fraction, class) = match self.catalog.character(row.season_card_id as i64).await {
            Ok(Some(entry)) => (entry.title, entry.fraction, entry.class),
            _ => swarm_cache_common::catalog::character_fallback(row.bc_id),
        };
        HeroUnityEntry {
            id: row.bc_id,
            bc_id: row.bc_id,
            title,
            fraction,
            owner: wallet.to_string(),
            card_class: format!("{class:?}").to_ascii_uppercase(),
            reward: HeroReward { power: row.serial_number },
            metadata: HeroMetadata {
                sec: row.sec,
                ano: row.ano,
                inn: row.inn,
                revolution: row.is_revolution(),
                season_card_id: row.season_card_id,
            },
        }
    }

    async fn render_weapon(&self, row: &WeaponTokenRow, wallet: &str) -> WeaponUnityEntry {
        let weapon_name = match self
            .catalog
            .weapon_mapping(row.weapon_tier as i64, row.weapon_type as i64, row.weapon_subtype as i64, row.category as i64)
            .await
        {
            Ok(Some(entry)) => entry.weapon_name,
            _ => swarm_cache_common::catalog::weapon_name_fallback(row.weapon_tier, row.weapon_type, row.category),
        };
        WeaponUnityEntry {
            id: row.bc_id,
            bc_id: row.bc_id,
            owner_address: wallet.to_string(),
            contract_address: self.weapon_contract_address.clone(),
            weapon_name,
            security: row.security,
            anonymity: row.anonymity,
            innovation: row.innovation,
            minted: true,
            burned: false,
            metadata: WeaponMetadata {
                weapon_tier: row.weapon_tier,
                weapon_type: row.weapon_type,
                weapon_subtype: row.weapon_subtype,
                category: row.category,
                serial_number: row.serial_number,
            },
        }
    }

    pub async fn heroes(&self, wallet: &str) -> Result<HeroUnityEnvelope> {
        let wallet = normalize_address(wallet)?;
        let ids = self.owned_ids(TokenKind::Heroes, &wallet).await?;
        let rows = self.resolve_heroes(&ids, &wallet).await;
        let results = futures::future::join_all(rows.iter().map(|row| self.render_hero(row, &wallet))).await;
        let count = results.len();
        Ok(HeroUnityEnvelope { results, count, next: None })
    }

    pub async fn heroes_slim(&self, wallet: &str) -> Result<Vec<HeroSlimEntry>> {
        let wallet = normalize_address(wallet)?;
        let ids = self.owned_ids(TokenKind::Heroes, &wallet).await?;
        let rows = self.resolve_heroes(&ids, &wallet).await;
        Ok(rows
            .into_iter()
            .map(|row| HeroSlimEntry {
                bc_id: row.bc_id,
                metadata: HeroSlimMetadata { sec: row.sec, ano: row.ano, inn: row.inn, season_card_id: row.season_card_id },
            })
            .collect())
    }

    pub async fn weapons(&self, wallet: &str) -> Result<Vec<WeaponUnityEntry>> {
        let wallet = normalize_address(wallet)?;
        let ids = self.owned_ids(TokenKind::Weapons, &wallet).await?;
        let rows = self.resolve_weapons(&ids, &wallet).await;
        let results = futures::future::join_all(rows.iter().map(|row| self.render_weapon(row, &wallet))).await;
        Ok(results)
    }

    pub async fn weapons_slim(&self, wallet: &str) -> Result<Vec<WeaponSlimEntry>> {
        let weapons = self.weapons(wallet).await?;
        Ok(weapons
            .into_iter()
            .map(|w| WeaponSlimEntry { bc_id: w.bc_id, weapon_name: w.weapon_name, security: w.security, anonymity: w.anonymity, innovation: w.innovation })
            .collect())
    }

    /// Land tickets are never persistently cached (spec §4.5): ownership and
    /// balance are conflated under ERC-1155. On gateway failure returns
    /// static metadata with `balance = -1` per entry instead of caching.
    pub async fn lands(&self, wallet: &str) -> Result<Vec<LandEntry>> {
        let wallet = normalize_address(wallet)?;
        let key = CacheKey::new("land_balance", wallet.clone());
        let balances = if let Some(cached) = self.hot_cache.get(&key) {
            serde_json::from_value::<Vec<i64>>(cached).ok()
        } else {
            None
        };

        let balances = match balances {
            Some(b) => b,
            None => match self
                .gateway
                .erc1155_balance_of_batch(&self.land_contract_address, &wallet, &LAND_TICKET_IDS)
                .await
            {
                Ok(b) => {
                    let signed: Vec<i64> = b.iter().map(|v| *v as i64).collect();
                    self.hot_cache.put(key, json!(signed), TTL_BALANCE);
                    signed
                }
                Err(err) => {
                    log::warn!("erc1155 balanceOfBatch failed for lands: {err}");
                    vec![-1; LAND_TICKET_IDS.len()]
                }
            },
        };

        Ok(LAND_TICKET_IDS
            .iter()
            .zip(balances.iter())
            .filter_map(|(&id, &balance)| {
                land_metadata(id).map(|meta| LandEntry {
                    id: meta.id,
                    token_id: meta.id,
                    name: meta.name.to_string(),
                    rarity: meta.rarity.to_string(),
                    plots: meta.plots,
                    image: meta.image.to_string(),
                    balance,
                    contract_address: self.land_contract_address.clone(),
                    nft_type: "land",
                })
            })
            .collect())
    }

    pub async fn enhanced_player_data(&self, wallet: &str) -> Result<EnhancedPlayerData> {
        let (heroes, weapons, lands, reward_balances) = tokio::join!(
            self.heroes(wallet),
            self.weapons(wallet),
            self.lands(wallet),
            self.reward_balances(wallet),
        );
        let heroes = heroes?.results;
        let weapons = weapons?;
        let lands = lands?;

        let land_ticket_count: u64 = lands.iter().map(|l| if l.balance > 0 { l.balance as u64 } else { 0 }).sum();
        let (damage_mult, fire_rate, score_mult, health, total_power) = derive_boosts(&heroes, &weapons, land_ticket_count);

        Ok(EnhancedPlayerData {
            hero_count: heroes.len(),
            weapon_count: weapons.len(),
            land_ticket_count,
            damage_mult,
            fire_rate,
            score_mult,
            health,
            total_power,
            heroes,
            weapons,
            lands,
            reward_balances,
        })
    }

    /// ERC-20 reward token balances for `moh`/`medallc` (spec §4.2
    /// `erc20BalanceOf`, §3 `contracts`). A token with no active contract
    /// row or a failed balance call is silently dropped from the result
    /// rather than failing the whole enhanced-player-data request.
    async fn reward_balances(&self, wallet: &str) -> Vec<RewardTokenBalance> {
        let mut balances = Vec::with_capacity(REWARD_TOKEN_LOGICAL_NAMES.len());
        for logical_name in REWARD_TOKEN_LOGICAL_NAMES {
            let address = match self.catalog.active_contract_address(logical_name).await {
                Ok(Some(address)) => address,
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("reward contract lookup failed for {logical_name}: {err}");
                    continue;
                }
            };

            let key = CacheKey::new("erc20_balance", format!("{address}:{wallet}"));
            let cached = self.hot_cache.get(&key).and_then(|v| serde_json::from_value::<u64>(v).ok());

            let balance = match cached {
                Some(balance) => balance,
                None => match self.gateway.erc20_balance_of(&address, wallet).await {
                    Ok(balance) => {
                        self.hot_cache.put(key, json!(balance), TTL_BALANCE);
                        balance
                    }
                    Err(err) => {
                        log::warn!("erc20 balanceOf failed for {logical_name} ({address}): {err}");
                        continue;
                    }
                },
            };

            balances.push(RewardTokenBalance { logical_name: logical_name.to_string(), contract_address: address, balance });
        }
        balances
    }

    /// Explicit per-wallet refresh (spec §4.6), extended to heroes/weapons:
    /// drops the cached ownership lists and flips the wallet's owned rows to
    /// `is_valid = false` so the next enrichment call re-fetches them from
    /// chain instead of serving stale persistent-cache rows.
    pub async fn refresh(&self, wallet: &str) -> EnrichmentRefreshReport {
        let wallet = match normalize_address(wallet) {
            Ok(wallet) => wallet,
            Err(_) => return EnrichmentRefreshReport { heroes_refreshed: false, weapons_refreshed: false },
        };
        self.hot_cache.purge_matching("ownership", &wallet);
        self.hot_cache.purge_matching("land_balance", &wallet);

        let heroes_refreshed = self.invalidate_owned(TokenKind::Heroes, &wallet).await;
        let weapons_refreshed = self.invalidate_owned(TokenKind::Weapons, &wallet).await;

        EnrichmentRefreshReport { heroes_refreshed, weapons_refreshed }
    }

    async fn invalidate_owned(&self, kind: TokenKind, wallet: &str) -> bool {
        let ids = match self.gateway.owned_token_ids(kind, wallet).await {
            Ok(ids) => ids,
            Err(err) => {
                log::warn!("{} ownership refresh failed for {wallet}: {err}", kind.as_str());
                return false;
            }
        };
        let ids_i64: Vec<i64> = ids.iter().map(|id| *id as i64).collect();
        let result = match kind {
            TokenKind::Heroes => self.persistent.invalidate_heroes(Some(&ids_i64)).await,
            TokenKind::Weapons => self.persistent.invalidate_weapons(Some(&ids_i64)).await,
        };
        if let Err(err) = result {
            log::warn!("{} cache invalidation failed for {wallet}: {err}", kind.as_str());
            return false;
        }
        true
    }
}
