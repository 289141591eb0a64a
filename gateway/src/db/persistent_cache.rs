use sqlx::{PgPool, Row};
use swarm_cache_common::model::{HeroTokenRow, WeaponTokenRow};

/// Durable, shared-across-replicas token cache (spec §4.4). A hit implies
/// the row is usable; `is_valid = false` rows are treated as absent by
/// every consumer, mirroring the batched `IN`-clause lookup in the
/// pre-distillation `token_cache_service.py`, expressed with Postgres'
/// `= ANY($1)` instead of hand-built placeholder strings. Uses the runtime
/// query builder rather than the `query!` macro since this workspace is
/// built without a live database to check queries against at compile time.
pub struct PersistentTokenCache {
    pool: PgPool,
}

impl PersistentTokenCache {
    pub fn new(pool: PgPool) -> Self {
        PersistentTokenCache { pool }
    }

    pub async fn lookup_many_heroes(&self, ids: &[i64]) -> anyhow::Result<(Vec<HeroTokenRow>, Vec<u64>)> {
        if ids.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let rows = sqlx::query(
            r#"
            SELECT bc_id, sec, ano, inn, season_card_id, serial_number, last_updated, is_valid
            FROM heroes_token_cache
            WHERE bc_id = ANY($1) AND is_valid = TRUE
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let hits: Vec<HeroTokenRow> = rows
            .into_iter()
            .map(|r| HeroTokenRow {
                bc_id: r.get::<i64, _>("bc_id") as u64,
                sec: r.get::<i64, _>("sec") as u64,
                ano: r.get::<i64, _>("ano") as u64,
                inn: r.get::<i64, _>("inn") as u64,
                season_card_id: r.get::<i64, _>("season_card_id") as u64,
                serial_number: r.get::<i64, _>("serial_number") as u64,
                last_updated: r.get("last_updated"),
                is_valid: r.get("is_valid"),
            })
            .collect();

        let hit_ids: std::collections::HashSet<u64> = hits.iter().map(|r| r.bc_id).collect();
        let missing = ids
            .iter()
            .map(|id| *id as u64)
            .filter(|id| !hit_ids.contains(id))
            .collect();

        Ok((hits, missing))
    }

    pub async fn lookup_many_weapons(&self, ids: &[i64]) -> anyhow::Result<(Vec<WeaponTokenRow>, Vec<u64>)> {
        if ids.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let rows = sqlx::query(
            r#"
            SELECT bc_id, security, anonymity, innovation, weapon_tier, weapon_type,
                   weapon_subtype, category, serial_number, last_updated, is_valid
            FROM weapons_token_cache
            WHERE bc_id = ANY($1) AND is_valid = TRUE
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let hits: Vec<WeaponTokenRow> = rows
            .into_iter()
            .map(|r| WeaponTokenRow {
                bc_id: r.get::<i64, _>("bc_id") as u64,
                security: r.get::<i64, _>("security") as u64,
                anonymity: r.get::<i64, _>("anonymity") as u64,
                innovation: r.get::<i64, _>("innovation") as u64,
                weapon_tier: r.get::<i64, _>("weapon_tier") as u64,
                weapon_type: r.get::<i64, _>("weapon_type") as u64,
                weapon_subtype: r.get::<i64, _>("weapon_subtype") as u64,
                category: r.get::<i64, _>("category") as u64,
                serial_number: r.get::<i64, _>("serial_number") as u64,
                last_updated: r.get("last_updated"),
                is_valid: r.get("is_valid"),
            })
            .collect();

        let hit_ids: std::collections::HashSet<u64> = hits.iter().map(|r| r.bc_id).collect();
        let missing = ids
            .iter()
            .map(|id| *id as u64)
            .filter(|id| !hit_ids.contains(id))
            .collect();

        Ok((hits, missing))
    }

    /// Single transaction upsert; conflict on `bc_id` overwrites fields and
    /// sets `is_valid = true` (spec §4.4). Idempotent: concurrent upserts of
    /// the same immutable tuple race benignly (testable property 10).
    pub async fn upsert_heroes(&self, rows: &[HeroTokenRow]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO heroes_token_cache (bc_id, sec, ano, inn, season_card_id, serial_number, last_updated, is_valid)
                VALUES ($1, $2, $3, $4, $5, $6, now(), TRUE)
                ON CONFLICT (bc_id) DO UPDATE SET
                    sec = EXCLUDED.sec,
                    ano = EXCLUDED.ano,
                    inn = EXCLUDED.inn,
                    season_card_id = EXCLUDED.season_card_id,
                    serial_number = EXCLUDED.serial_number,
                    last_updated = now(),
                    is_valid = TRUE
                "#,
            )
            .bind(row.bc_id as i64)
            .bind(row.sec as i64)
            .bind(row.ano as i64)
            .bind(row.inn as i64)
            .bind(row.season_card_id as i64)
            .bind(row.serial_number as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn upsert_weapons(&self, rows: &[WeaponTokenRow]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO weapons_token_cache
                    (bc_id, security, anonymity, innovation, weapon_tier, weapon_type, weapon_subtype, category, serial_number, last_updated, is_valid)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), TRUE)
                ON CONFLICT (bc_id) DO UPDATE SET
                    security = EXCLUDED.security,
                    anonymity = EXCLUDED.anonymity,
                    innovation = EXCLUDED.innovation,
                    weapon_tier = EXCLUDED.weapon_tier,
                    weapon_type = EXCLUDED.weapon_type,
                    weapon_subtype = EXCLUDED.weapon_subtype,
                    category = EXCLUDED.category,
                    serial_number = EXCLUDED.serial_number,
                    last_updated = now(),
                    is_valid = TRUE
                "#,
            )
            .bind(row.bc_id as i64)
            .bind(row.security as i64)
            .bind(row.anonymity as i64)
            .bind(row.innovation as i64)
            .bind(row.weapon_tier as i64)
            .bind(row.weapon_type as i64)
            .bind(row.weapon_subtype as i64)
            .bind(row.category as i64)
            .bind(row.serial_number as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn invalidate_heroes(&self, ids: Option<&[i64]>) -> anyhow::Result<()> {
        match ids {
            Some(ids) => {
                sqlx::query("UPDATE heroes_token_cache SET is_valid = FALSE WHERE bc_id = ANY($1)")
                    .bind(ids)
                    .execute(&self.pool)
                    .await?;
            }
            None => {
                sqlx::query("UPDATE heroes_token_cache SET is_valid = FALSE").execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    pub async fn invalidate_weapons(&self, ids: Option<&[i64]>) -> anyhow::Result<()> {
        match ids {
            Some(ids) => {
                sqlx::query("UPDATE weapons_token_cache SET is_valid = FALSE WHERE bc_id = ANY($1)")
                    .bind(ids)
                    .execute(&self.pool)
                    .await?;
            }
            None => {
                sqlx::query("UPDATE weapons_token_cache SET is_valid = FALSE").execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    /// Write-only ring into the cache error log (spec §4.4). Never fails
    /// the caller's request; logging failures here are themselves logged.
    pub async fn log_error(&self, contract_kind: &str, token_id: Option<i64>, error_type: &str, message: &str, wallet: Option<&str>) {
        let message: String = message.chars().take(1000).collect();
        let result = sqlx::query(
            r#"
            INSERT INTO cache_errors (contract_kind, token_id, error_type, message, wallet)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(contract_kind)
        .bind(token_id)
        .bind(error_type)
        .bind(message)
        .bind(wallet)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            log::error!("failed to write cache_errors row: {err}");
        }
    }
}
