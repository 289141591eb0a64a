use serde::{Deserialize, Serialize};

/// Which logical token family a call concerns. Mirrors the `heroes`/`weapons`
/// split used throughout the persistent cache and the contract gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Heroes,
    Weapons,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Heroes => "heroes",
            TokenKind::Weapons => "weapons",
        }
    }
}

/// Raw on-chain attribute triple as returned by `getAttribs`.
#[derive(Debug, Clone, Copy)]
pub struct AttribTriple {
    pub a: u64,
    pub b: u64,
    pub c: u64,
}

/// Neutral defaults substituted when a contract's `getAttribs` response is
/// short or malformed (spec §4.2; Open Question 3 in DESIGN.md).
impl AttribTriple {
    pub fn neutral_default(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Heroes => AttribTriple { a: 50, b: 50, c: 50 },
            TokenKind::Weapons => AttribTriple { a: 60, b: 60, c: 60 },
        }
    }
}

/// A hero token row as stored in the persistent token cache (spec §3).
#[derive(Debug, Clone)]
pub struct HeroTokenRow {
    pub bc_id: u64,
    pub sec: u64,
    pub ano: u64,
    pub inn: u64,
    pub season_card_id: u64,
    pub serial_number: u64,
    pub last_updated: chrono::DateTime<chrono::Utc>,
    pub is_valid: bool,
}

impl HeroTokenRow {
    pub fn card_type(&self) -> u64 {
        self.season_card_id / 1000
    }

    pub fn season_id(&self) -> u64 {
        (self.season_card_id % 1000) / 10
    }

    pub fn card_season_collection_id(&self) -> u64 {
        self.season_card_id % 10
    }

    pub fn is_revolution(&self) -> bool {
        self.card_type() == 2
    }
}

/// A weapon token row as stored in the persistent token cache (spec §3).
#[derive(Debug, Clone)]
pub struct WeaponTokenRow {
    pub bc_id: u64,
    pub security: u64,
    pub anonymity: u64,
    pub innovation: u64,
    pub weapon_tier: u64,
    pub weapon_type: u64,
    pub weapon_subtype: u64,
    pub category: u64,
    pub serial_number: u64,
    pub last_updated: chrono::DateTime<chrono::Utc>,
    pub is_valid: bool,
}

/// Fixed land ticket ids and their static metadata (spec §4.5, §6).
#[derive(Debug, Clone, Serialize)]
pub struct LandMetadata {
    pub id: u64,
    pub name: &'static str,
    pub rarity: &'static str,
    pub plots: u64,
    pub image: &'static str,
}

pub const LAND_TICKET_IDS: [u64; 3] = [1, 2, 3];

pub fn land_metadata(id: u64) -> Option<LandMetadata> {
    match id {
        1 => Some(LandMetadata { id, name: "Common Land", rarity: "Common", plots: 1, image: "/land1.png" }),
        2 => Some(LandMetadata { id, name: "Rare Land", rarity: "Rare", plots: 3, image: "/land2.png" }),
        3 => Some(LandMetadata { id, name: "Legendary Land", rarity: "Legendary", plots: 7, image: "/land3.png" }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_card_id_decomposition_round_trips() {
        for s in 0u64..10_000 {
            let card_type = s / 1000;
            let season_id = (s % 1000) / 10;
            let collection_id = s % 10;
            assert_eq!(s, 1000 * card_type + 10 * season_id + collection_id);
        }
    }

    #[test]
    fn revolution_iff_card_type_two() {
        let row = HeroTokenRow {
            bc_id: 1,
            sec: 1,
            ano: 1,
            inn: 1,
            season_card_id: 2015,
            serial_number: 1,
            last_updated: chrono::Utc::now(),
            is_valid: true,
        };
        assert_eq!(row.card_type(), 2);
        assert!(row.is_revolution());
    }
}
