use serde_json::Value;
use sqlx::{PgPool, Row};
use swarm_cache_common::error::{GatewayError, Result};
use swarm_cache_common::score::{hash32, DecryptedSubmission, RawScoreEnvelope};

use crate::score_intake::decrypt::ScoreDecryptor;

#[derive(Debug, Clone, serde::Serialize)]
pub struct SubmitOutcome {
    pub validated: bool,
    pub calculated_score: i64,
    pub player_address: String,
    pub blacklisted: bool,
}

/// One pipeline per request: decrypt, recompute score, anti-cheat gate,
/// atomic persist (spec §4.7). RSA key material is loaded once at startup
/// and held immutable; no cross-request sharing beyond the DB pool and key
/// handles (spec §5).
pub struct ScoreIntake {
    pool: PgPool,
    decryptor: ScoreDecryptor,
}

impl ScoreIntake {
    pub fn new(pool: PgPool, decryptor: ScoreDecryptor) -> Self {
        ScoreIntake { pool, decryptor }
    }

    pub async fn submit(&self, envelope: RawScoreEnvelope, raw_payload: Value) -> Result<SubmitOutcome> {
        // Step 1: decrypt. Failures are rejected 4xx-shaped but the raw
        // ciphertext is still archived for forensic review (spec §7).
        let decrypted = match self.decryptor.decrypt(&envelope) {
            Ok(d) => d,
            Err(err) => {
                self.archive_raw_only(&envelope, &raw_payload).await;
                return Err(err);
            }
        };

        // Step 3: score recomputation (spec §4.7 step 3).
        let calculated_score = hash32(decrypted.raw_score as u32) as i64;

        // Step 4: anti-cheat gate.
        let blacklisted = self.is_blacklisted(&decrypted.player_address).await?;
        let rules_pass = Self::rule_checks_pass(&decrypted);
        let validated = !blacklisted && rules_pass;

        // Step 5: atomic persist (raw + processed + player_stats trigger).
        self.persist(&envelope, &raw_payload, &decrypted, calculated_score, validated).await?;

        Ok(SubmitOutcome { validated, calculated_score, player_address: decrypted.player_address, blacklisted })
    }

    async fn is_blacklisted(&self, player_address: &str) -> Result<bool> {
        let row = sqlx::query("SELECT active FROM blacklist WHERE player_address = $1 AND active = TRUE")
            .bind(player_address)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| GatewayError::PersistentCacheReadError(err.into()))?;
        Ok(row.is_some())
    }

    /// Additional rule-level checks beyond the blacklist (spec §4.7 step 4):
    /// duration positive, kills cannot exceed spawns, monotonic implied
    /// counters. Failures mark `validated = false` but the record is still
    /// persisted for offline review.
    fn rule_checks_pass(d: &DecryptedSubmission) -> bool {
        d.duration_seconds > 0
            && d.enemies_killed <= d.enemies_spawned
            && d.enemies_killed_while_killing_spree <= d.enemies_killed
            && d.max_killing_spree >= 0
    }

    async fn persist(
        &self,
        envelope: &RawScoreEnvelope,
        raw_payload: &Value,
        decrypted: &DecryptedSubmission,
        calculated_score: i64,
        validated: bool,
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| GatewayError::PersistentCacheWriteError(err.into()))?;

        let raw_id: i64 = sqlx::query(
            r#"
            INSERT INTO score_submissions_raw
                (hash_ct, address_ct, delta_ct, parameter1_ct, parameter2_ct, parameter3_ct, parameter4_ct,
                 parameter5_ct, parameter6_ct, parameter7_ct, parameter8_ct, parameter9_ct, parameter10_ct,
                 parameter11_ct, parameter12_ct, parameter13_ct, parameter14_ct, parameter15_ct, raw_payload)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19)
            RETURNING id
            "#,
        )
        .bind(&envelope.hash)
        .bind(&envelope.address)
        .bind(&envelope.delta)
        .bind(&envelope.parameter1)
        .bind(&envelope.parameter2)
        .bind(&envelope.parameter3)
        .bind(&envelope.parameter4)
        .bind(&envelope.parameter5)
        .bind(&envelope.parameter6)
        .bind(&envelope.parameter7)
        .bind(&envelope.parameter8)
        .bind(&envelope.parameter9)
        .bind(&envelope.parameter10)
        .bind(&envelope.parameter11)
        .bind(&envelope.parameter12)
        .bind(&envelope.parameter13)
        .bind(&envelope.parameter14)
        .bind(&envelope.parameter15)
        .bind(raw_payload)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| GatewayError::PersistentCacheWriteError(err.into()))?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO score_submissions_processed
                (raw_id, player_address, final_score, calculated_score, duration_seconds, enemies_spawned,
                 enemies_killed, waves_completed, travel_distance, perks_collected, coins_collected,
                 shields_collected, killing_spree_mult, killing_spree_duration, max_killing_spree,
                 attack_speed, max_score_per_enemy, max_score_per_enemy_scaled, ability_use_count,
                 enemies_killed_while_killing_spree, nft_boost_snapshot, validated)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22)
            "#,
        )
        .bind(raw_id)
        .bind(&decrypted.player_address)
        .bind(decrypted.raw_score)
        .bind(calculated_score)
        .bind(decrypted.duration_seconds)
        .bind(decrypted.enemies_spawned)
        .bind(decrypted.enemies_killed)
        .bind(decrypted.waves_completed)
        .bind(decrypted.travel_distance)
        .bind(decrypted.perks_collected)
        .bind(decrypted.coins_collected)
        .bind(decrypted.shields_collected)
        .bind(decrypted.killing_spree_mult)
        .bind(decrypted.killing_spree_duration)
        .bind(decrypted.max_killing_spree)
        .bind(decrypted.attack_speed)
        .bind(decrypted.max_score_per_enemy)
        .bind(decrypted.max_score_per_enemy_scaled)
        .bind(decrypted.ability_use_count)
        .bind(decrypted.enemies_killed_while_killing_spree)
        .bind(serde_json::json!({}))
        .bind(validated)
        .execute(&mut *tx)
        .await
        .map_err(|err| GatewayError::PersistentCacheWriteError(err.into()))?;

        tx.commit().await.map_err(|err| GatewayError::PersistentCacheWriteError(err.into()))?;
        Ok(())
    }

    /// Archives the raw ciphertext alone when decryption fails, so a
    /// rejected submission is still available for forensic review
    /// (spec §7: `DecryptFailure` -> reject, but raw ciphertext archived).
    async fn archive_raw_only(&self, envelope: &RawScoreEnvelope, raw_payload: &Value) {
        let result = sqlx::query(
            r#"
            INSERT INTO score_submissions_raw
                (hash_ct, address_ct, delta_ct, parameter1_ct, parameter2_ct, parameter3_ct, parameter4_ct,
                 parameter5_ct, parameter6_ct, parameter7_ct, parameter8_ct, parameter9_ct, parameter10_ct,
                 parameter11_ct, parameter12_ct, parameter13_ct, parameter14_ct, parameter15_ct, raw_payload)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19)
            "#,
        )
        .bind(&envelope.hash)
        .bind(&envelope.address)
        .bind(&envelope.delta)
        .bind(&envelope.parameter1)
        .bind(&envelope.parameter2)
        .bind(&envelope.parameter3)
        .bind(&envelope.parameter4)
        .bind(&envelope.parameter5)
        .bind(&envelope.parameter6)
        .bind(&envelope.parameter7)
        .bind(&envelope.parameter8)
        .bind(&envelope.parameter9)
        .bind(&envelope.parameter10)
        .bind(&envelope.parameter11)
        .bind(&envelope.parameter12)
        .bind(&envelope.parameter13)
        .bind(&envelope.parameter14)
        .bind(&envelope.parameter15)
        .bind(raw_payload)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            log::error!("failed to archive raw score submission after decrypt failure: {err}");
        }
    }
}
