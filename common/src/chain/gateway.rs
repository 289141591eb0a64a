use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address as AlloyAddress;
use log::{log_enabled, trace, warn};

use crate::address::normalize_address;
use crate::chain::abi::{IErc1155Land, IErc20Reward, IHeroToken, IWeaponToken};
use crate::chain::pool::RpcPool;
use crate::error::{GatewayError, Result};
use crate::model::{AttribTriple, TokenKind};

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Typed wrapper over the RPC pool, one method per remote contract call
/// (spec §4.2), following the same shape as the teacher's `DaemonAPI`:
/// one method per operation, `trace!` gated by `log_enabled!`, validated
/// inputs, `Result<T>` return.
pub struct ContractGateway {
    pool: Arc<RpcPool>,
    hero_contract: AlloyAddress,
    weapon_contract: AlloyAddress,
}

impl ContractGateway {
    pub fn new(pool: Arc<RpcPool>, hero_contract: &str, weapon_contract: &str) -> anyhow::Result<Self> {
        Ok(ContractGateway {
            pool,
            hero_contract: AlloyAddress::from_str(hero_contract)?,
            weapon_contract: AlloyAddress::from_str(weapon_contract)?,
        })
    }

    fn contract_for(&self, kind: TokenKind) -> AlloyAddress {
        match kind {
            TokenKind::Heroes => self.hero_contract,
            TokenKind::Weapons => self.weapon_contract,
        }
    }

    /// Authoritative owned token ids, in chain order. Never cached
    /// persistently (ownership changes) — spec §4.2.
    pub async fn owned_token_ids(&self, kind: TokenKind, owner: &str) -> Result<Vec<u64>> {
        if log_enabled!(log::Level::Trace) {
            trace!("owned_token_ids: {} {owner}", kind.as_str());
        }
        let owner = normalize_address(owner)?;
        let owner_addr = AlloyAddress::from_str(&owner)
            .map_err(|_| GatewayError::InvalidAddress(owner.clone()))?;

        self.with_retry(|provider| async move {
            let ids = match kind {
                TokenKind::Heroes => {
                    let c = IHeroToken::new(self.contract_for(kind), provider);
                    c.tokensOfOwner(owner_addr).call().await.map_err(ContractCallError::from)?.into_iter().map(|id| id.to::<u64>()).collect()
                }
                TokenKind::Weapons => {
                    let c = IWeaponToken::new(self.contract_for(kind), provider);
                    c.tokensOfOwner(owner_addr).call().await.map_err(ContractCallError::from)?.into_iter().map(|id| id.to::<u64>()).collect()
                }
            };
            Ok(ids)
        }).await
    }

    /// Immutable attribute triple for a token. Substitutes neutral defaults
    /// and logs a soft warning on malformed response instead of failing the
    /// call (spec §4.2, DESIGN.md Open Question 3).
    pub async fn get_attribs(&self, kind: TokenKind, id: u64) -> AttribTriple {
        if log_enabled!(log::Level::Trace) {
            trace!("get_attribs: {} {id}", kind.as_str());
        }
        let token_id = alloy_primitives::U256::from(id);
        let result = self.with_retry(|provider| async move {
            match kind {
                TokenKind::Heroes => {
                    let c = IHeroToken::new(self.contract_for(kind), provider);
                    let r = c.getAttribs(token_id).call().await.map_err(ContractCallError::from)?;
                    Ok(AttribTriple { a: r.sec.to::<u64>(), b: r.ano.to::<u64>(), c: r.inn.to::<u64>() })
                }
                TokenKind::Weapons => {
                    let c = IWeaponToken::new(self.contract_for(kind), provider);
                    let r = c.getAttribs(token_id).call().await.map_err(ContractCallError::from)?;
                    Ok(AttribTriple { a: r.security.to::<u64>(), b: r.anonymity.to::<u64>(), c: r.innovation.to::<u64>() })
                }
            }
        }).await;

        match result {
            Ok(triple) => triple,
            Err(err) => {
                warn!("getAttribs({}, {id}) malformed or failed, using neutral defaults: {err}", kind.as_str());
                AttribTriple::neutral_default(kind)
            }
        }
    }

    /// Typed token info record: (season_card_id, serial_number) for heroes,
    /// (tier, type, subtype, category, serial_number) for weapons.
    pub async fn get_token_info(&self, kind: TokenKind, id: u64) -> Result<TokenInfo> {
        if log_enabled!(log::Level::Trace) {
            trace!("get_token_info: {} {id}", kind.as_str());
        }
        let token_id = alloy_primitives::U256::from(id);
        self.with_retry(|provider| async move {
            match kind {
                TokenKind::Heroes => {
                    let c = IHeroToken::new(self.contract_for(kind), provider);
                    let r = c.getTokenInfo(token_id).call().await.map_err(ContractCallError::from)?;
                    Ok(TokenInfo::Hero { season_card_id: r.seasonCardId.to::<u64>(), serial_number: r.serialNumber.to::<u64>() })
                }
                TokenKind::Weapons => {
                    let c = IWeaponToken::new(self.contract_for(kind), provider);
                    let r = c.getTokenInfo(token_id).call().await.map_err(ContractCallError::from)?;
                    Ok(TokenInfo::Weapon {
                        tier: r.tier.to::<u64>(),
                        weapon_type: r.weaponType.to::<u64>(),
                        subtype: r.subtype.to::<u64>(),
                        category: r.category.to::<u64>(),
                        serial_number: r.serialNumber.to::<u64>(),
                    })
                }
            }
        }).await
    }

    pub async fn erc1155_balance_of_batch(&self, contract: &str, owner: &str, ids: &[u64]) -> Result<Vec<u64>> {
        if log_enabled!(log::Level::Trace) {
            trace!("erc1155_balance_of_batch: {contract} {owner} {ids:?}");
        }
        let owner = normalize_address(owner)?;
        let owner_addr = AlloyAddress::from_str(&owner).map_err(|_| GatewayError::InvalidAddress(owner.clone()))?;
        let contract_addr = AlloyAddress::from_str(contract).map_err(|_| GatewayError::InvalidAddress(contract.to_string()))?;
        let ids_u256: Vec<_> = ids.iter().map(|id| alloy_primitives::U256::from(*id)).collect();
        let owners: Vec<_> = ids.iter().map(|_| owner_addr).collect();

        self.with_retry(|provider| {
            let ids_u256 = ids_u256.clone();
            let owners = owners.clone();
            async move {
                let c = IErc1155Land::new(contract_addr, provider);
                let balances = c.balanceOfBatch(owners, ids_u256).call().await.map_err(ContractCallError::from)?;
                Ok(balances.into_iter().map(|b| b.to::<u64>()).collect())
            }
        }).await
    }

    pub async fn erc20_balance_of(&self, token: &str, owner: &str) -> Result<u64> {
        if log_enabled!(log::Level::Trace) {
            trace!("erc20_balance_of: {token} {owner}");
        }
        let owner = normalize_address(owner)?;
        let owner_addr = AlloyAddress::from_str(&owner).map_err(|_| GatewayError::InvalidAddress(owner.clone()))?;
        let token_addr = AlloyAddress::from_str(token).map_err(|_| GatewayError::InvalidAddress(token.to_string()))?;

        self.with_retry(|provider| async move {
            let c = IErc20Reward::new(token_addr, provider);
            let bal = c.balanceOf(owner_addr).call().await.map_err(ContractCallError::from)?;
            Ok(bal.to::<u64>())
        }).await
    }

    /// Retries up to `RETRY_ATTEMPTS` across possibly different endpoints
    /// with a short backoff (spec §4.2). A revert is a contract-level
    /// failure, not a transport hiccup, and is surfaced on the first
    /// attempt; only transport/node errors consume the retry budget.
    async fn with_retry<F, Fut, T>(&self, mut call: F) -> Result<T>
    where
        F: FnMut(&alloy_provider::RootProvider) -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, ContractCallError>>,
    {
        let mut last_err = None;
        for attempt in 0..RETRY_ATTEMPTS {
            let (idx, provider) = self.pool.acquire().await?;
            match call(provider).await {
                Ok(value) => return Ok(value),
                Err(ContractCallError::Reverted(err)) => {
                    warn!("contract call reverted, not retrying: {err}");
                    return Err(GatewayError::ContractCallFailed(err));
                }
                Err(ContractCallError::Transport(err)) => {
                    warn!("contract call attempt {attempt} failed: {err}");
                    self.pool.mark_unhealthy(idx);
                    last_err = Some(err);
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
        Err(GatewayError::ContractCallFailed(last_err.unwrap_or_else(|| anyhow::anyhow!("unknown error"))))
    }
}

/// Distinguishes a contract revert from a transport/node-level failure
/// (spec §4.2: "Retries cover transport and generic node errors but not
/// contract reverts"). `alloy_contract::Error::TransportError` wraps a
/// JSON-RPC error payload; a revert surfaces there with an "execution
/// reverted" message rather than as a connection/timeout failure.
enum ContractCallError {
    Reverted(anyhow::Error),
    Transport(anyhow::Error),
}

impl From<alloy_contract::Error> for ContractCallError {
    fn from(err: alloy_contract::Error) -> Self {
        let is_revert = match &err {
            alloy_contract::Error::TransportError(rpc_err) => rpc_err
                .as_error_resp()
                .map(|resp| resp.message.to_ascii_lowercase().contains("revert"))
                .unwrap_or(false),
            _ => false,
        };
        if is_revert {
            ContractCallError::Reverted(err.into())
        } else {
            ContractCallError::Transport(err.into())
        }
    }
}

#[derive(Debug, Clone)]
pub enum TokenInfo {
    Hero { season_card_id: u64, serial_number: u64 },
    Weapon { tier: u64, weapon_type: u64, subtype: u64, category: u64, serial_number: u64 },
}
