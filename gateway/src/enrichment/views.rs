use serde::Serialize;

/// Hero Unity view metadata block (spec §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct HeroMetadata {
    pub sec: u64,
    pub ano: u64,
    pub inn: u64,
    pub revolution: bool,
    pub season_card_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeroReward {
    pub power: u64,
}

/// Full Unity hero entry (spec §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct HeroUnityEntry {
    pub id: u64,
    pub bc_id: u64,
    pub title: String,
    pub fraction: String,
    pub owner: String,
    pub card_class: String,
    pub reward: HeroReward,
    pub metadata: HeroMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeroUnityEnvelope {
    pub results: Vec<HeroUnityEntry>,
    pub count: usize,
    pub next: Option<String>,
}

/// Hero ProfilePage-slim view (spec §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct HeroSlimMetadata {
    pub sec: u64,
    pub ano: u64,
    pub inn: u64,
    pub season_card_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeroSlimEntry {
    pub bc_id: u64,
    pub metadata: HeroSlimMetadata,
}

/// Full Unity weapon entry (spec §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct WeaponMetadata {
    pub weapon_tier: u64,
    pub weapon_type: u64,
    pub weapon_subtype: u64,
    pub category: u64,
    pub serial_number: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponUnityEntry {
    pub id: u64,
    pub bc_id: u64,
    pub owner_address: String,
    pub contract_address: String,
    pub weapon_name: String,
    pub security: u64,
    pub anonymity: u64,
    pub innovation: u64,
    pub minted: bool,
    pub burned: bool,
    pub metadata: WeaponMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponSlimEntry {
    pub bc_id: u64,
    pub weapon_name: String,
    pub security: u64,
    pub anonymity: u64,
    pub innovation: u64,
}

/// Land ticket entry (spec §6). `balance = -1` is the out-of-band error
/// signal used when the chain call fails (spec §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct LandEntry {
    pub id: u64,
    pub token_id: u64,
    pub name: String,
    pub rarity: String,
    pub plots: u64,
    pub image: String,
    pub balance: i64,
    pub contract_address: String,
    pub nft_type: &'static str,
}

/// ERC-20 reward token balance (spec §4.2 `erc20BalanceOf`, §3 `contracts`
/// logical names `moh`/`medallc`) [ADDED] — named in the chain interface but
/// dropped by the distillation's view list; folded into enhanced player data
/// since it is itself a composed, per-wallet view.
#[derive(Debug, Clone, Serialize)]
pub struct RewardTokenBalance {
    pub logical_name: String,
    pub contract_address: String,
    pub balance: u64,
}

/// Enhanced player data view (spec §4.5): combined heroes/weapons/lands plus
/// derived boosts.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedPlayerData {
    pub heroes: Vec<HeroUnityEntry>,
    pub weapons: Vec<WeaponUnityEntry>,
    pub lands: Vec<LandEntry>,
    pub reward_balances: Vec<RewardTokenBalance>,
    pub hero_count: usize,
    pub weapon_count: usize,
    pub land_ticket_count: u64,
    pub damage_mult: u64,
    pub fire_rate: u64,
    pub score_mult: u64,
    pub health: u64,
    pub total_power: u64,
}

/// Derived boosts (spec §4.5): every multiplier is capped, health and
/// total_power are unbounded sums.
pub fn derive_boosts(
    heroes: &[HeroUnityEntry],
    weapons: &[WeaponUnityEntry],
    land_tickets: u64,
) -> (u64, u64, u64, u64, u64) {
    let damage_mult = (5 * heroes.len() as u64).min(50);
    let fire_rate = (3 * weapons.len() as u64).min(30);
    let score_mult = (2 * land_tickets).min(20);
    let health = 25 * heroes.len() as u64 + 15 * weapons.len() as u64 + 10 * land_tickets;
    let total_power: u64 = heroes.iter().map(|h| h.metadata.sec + h.metadata.ano + h.metadata.inn).sum::<u64>()
        + weapons.iter().map(|w| w.security + w.anonymity + w.innovation).sum::<u64>();
    (damage_mult, fire_rate, score_mult, health, total_power)
}
