use serde::{Deserialize, Serialize};

/// Character class, read-only enum validated against the catalog's 5-element
/// set (spec §3, testable property 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardClass {
    Harvester,
    Warmonger,
    Defender,
    Specialist,
    Revolutionist,
}

impl CardClass {
    pub fn parse_catalog_value(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "HARVESTER" => Some(CardClass::Harvester),
            "WARMONGER" => Some(CardClass::Warmonger),
            "DEFENDER" => Some(CardClass::Defender),
            "SPECIALIST" => Some(CardClass::Specialist),
            "REVOLUTIONIST" => Some(CardClass::Revolutionist),
            _ => None,
        }
    }
}

/// A row from the `characters` catalog table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub season_card_id: u64,
    pub title: String,
    pub fraction: String,
    pub class: CardClass,
}

/// Deterministic fallback used when `season_card_id` has no catalog row
/// (spec §3, testable property 4).
pub fn character_fallback(bc_id: u64) -> (String, String, CardClass) {
    (format!("Hero #{bc_id}"), "Neutral".to_string(), CardClass::Specialist)
}

/// A row from the `weapon_mappings` catalog table, keyed by
/// (tier, type, subtype, category).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponMappingEntry {
    pub tier: u64,
    pub weapon_type: u64,
    pub subtype: u64,
    pub category: u64,
    pub weapon_name: String,
}

/// Deterministic fallback weapon name when no mapping row exists (spec §3,
/// testable property 5): middle word depends on `weapon_type`
/// (1 -> Sword, 2 -> Gun, otherwise Weapon).
pub fn weapon_name_fallback(tier: u64, weapon_type: u64, category: u64) -> String {
    let middle = match weapon_type {
        1 => "Sword",
        2 => "Gun",
        _ => "Weapon",
    };
    format!("T{tier} {middle} #{category}")
}

/// A row from the `contracts` catalog table: logical name -> address.
#[derive(Debug, Clone)]
pub struct ContractEntry {
    pub logical_name: String,
    pub address: String,
    pub kind: ContractKind,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Erc721Enumerable,
    Erc1155,
    Erc20,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weapon_name_fallback_picks_sword_gun_weapon() {
        assert_eq!(weapon_name_fallback(3, 1, 7), "T3 Sword #7");
        assert_eq!(weapon_name_fallback(3, 2, 7), "T3 Gun #7");
        assert_eq!(weapon_name_fallback(3, 9, 7), "T3 Weapon #7");
    }

    #[test]
    fn character_fallback_is_neutral_specialist() {
        let (title, fraction, class) = character_fallback(42);
        assert_eq!(title, "Hero #42");
        assert_eq!(fraction, "Neutral");
        assert_eq!(class, CardClass::Specialist);
    }

    #[test]
    fn card_class_parses_case_insensitively() {
        assert_eq!(CardClass::parse_catalog_value("harvester"), Some(CardClass::Harvester));
        assert_eq!(CardClass::parse_catalog_value("bogus"), None);
    }
}
