use serde::{Deserialize, Serialize};

/// Triple-fold multiplicative XOR hash used to recompute the authoritative
/// leaderboard score from the raw submitted score (spec §4.7 step 3).
/// The constant `0x119DE1F3` must not be altered; testable property 7 locks
/// it down with fixed vectors.
pub fn hash32(x: u32) -> u32 {
    const MULT: u32 = 0x119D_E1F3;
    let y1 = ((x >> 16) ^ x).wrapping_mul(MULT);
    let y2 = ((y1 >> 16) ^ y1).wrapping_mul(MULT);
    (y2 >> 16) ^ y2
}

/// The 17 ciphertext fields of a raw score submission, in the fixed order
/// defined by spec §4.7.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScoreEnvelope {
    pub hash: String,
    pub address: String,
    pub delta: String,
    pub parameter1: String,
    pub parameter2: String,
    pub parameter3: String,
    pub parameter4: String,
    pub parameter5: String,
    pub parameter6: String,
    pub parameter7: String,
    pub parameter8: String,
    pub parameter9: String,
    pub parameter10: String,
    pub parameter11: String,
    pub parameter12: String,
    pub parameter13: String,
    pub parameter14: String,
    pub parameter15: String,
}

impl RawScoreEnvelope {
    /// The envelope's 17 ciphertext fields, paired with which RSA key
    /// decrypts them, in submission order. Grounded on the field-by-field
    /// mapping table in spec §4.7 step 2, used in place of the source's
    /// dynamic string-concatenation field dispatch (spec §9 redesign note).
    pub fn fields(&self) -> [(&'static str, KeyKind, &str); 18] {
        [
            ("hash", KeyKind::Score, self.hash.as_str()),
            ("address", KeyKind::Score, self.address.as_str()),
            ("delta", KeyKind::Info, self.delta.as_str()),
            ("parameter1", KeyKind::Info, self.parameter1.as_str()),
            ("parameter2", KeyKind::Info, self.parameter2.as_str()),
            ("parameter3", KeyKind::Info, self.parameter3.as_str()),
            ("parameter4", KeyKind::Info, self.parameter4.as_str()),
            ("parameter5", KeyKind::Info, self.parameter5.as_str()),
            ("parameter6", KeyKind::Info, self.parameter6.as_str()),
            ("parameter7", KeyKind::Info, self.parameter7.as_str()),
            ("parameter8", KeyKind::Info, self.parameter8.as_str()),
            ("parameter9", KeyKind::Info, self.parameter9.as_str()),
            ("parameter10", KeyKind::Info, self.parameter10.as_str()),
            ("parameter11", KeyKind::Info, self.parameter11.as_str()),
            ("parameter12", KeyKind::Info, self.parameter12.as_str()),
            ("parameter13", KeyKind::Info, self.parameter13.as_str()),
            ("parameter14", KeyKind::Info, self.parameter14.as_str()),
            ("parameter15", KeyKind::Info, self.parameter15.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Score,
    Info,
}

/// Decrypted, typed plaintext fields before score recomputation
/// (spec §4.7 step 2).
#[derive(Debug, Clone)]
pub struct DecryptedSubmission {
    pub raw_score: i64,
    pub player_address: String,
    pub duration_seconds: i64,
    pub enemies_spawned: i64,
    pub enemies_killed: i64,
    pub waves_completed: i64,
    pub travel_distance: i64,
    pub perks_collected: i64,
    pub coins_collected: i64,
    pub shields_collected: i64,
    pub killing_spree_mult: i64,
    pub killing_spree_duration: i64,
    pub max_killing_spree: i64,
    pub attack_speed_raw: i64,
    pub attack_speed: f64,
    pub max_score_per_enemy: i64,
    pub max_score_per_enemy_scaled: i64,
    pub ability_use_count: i64,
    pub enemies_killed_while_killing_spree: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash32_fixed_vectors() {
        assert_eq!(hash32(0), 0);
        assert_eq!(hash32(1), 0x6351_B7A7);
    }

    proptest! {
        #[test]
        fn hash32_matches_reference_formula(x in any::<u32>()) {
            const MULT: u32 = 0x119D_E1F3;
            let y1 = ((x >> 16) ^ x).wrapping_mul(MULT);
            let y2 = ((y1 >> 16) ^ y1).wrapping_mul(MULT);
            let expected = (y2 >> 16) ^ y2;
            prop_assert_eq!(hash32(x), expected);
        }
    }
}
