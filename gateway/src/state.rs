use std::sync::Arc;

use sqlx::PgPool;
use swarm_cache_common::cache::HotCache;
use swarm_cache_common::chain::{ContractGateway, RpcPool};

use crate::db::{CatalogStore, PersistentTokenCache};
use crate::enrichment::EnrichmentEngine;
use crate::portfolio::PortfolioGateway;
use crate::score_intake::ScoreIntake;

/// Root object holding every subsystem, passed by reference into request
/// handlers. Replaces global singletons with explicit constructor
/// injection (spec §9 redesign note).
pub struct AppState {
    pub enrichment: EnrichmentEngine,
    pub portfolio: Arc<PortfolioGateway>,
    pub score_intake: Option<Arc<ScoreIntake>>,
    pub pool: PgPool,
    pub rpc_pool: Arc<RpcPool>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rpc_pool: Arc<RpcPool>,
        gateway: Arc<ContractGateway>,
        hot_cache: Arc<HotCache>,
        persistent: Arc<PersistentTokenCache>,
        catalog: Arc<CatalogStore>,
        portfolio: Arc<PortfolioGateway>,
        score_intake: Option<Arc<ScoreIntake>>,
        pool: PgPool,
        hero_contract: String,
        weapon_contract: String,
        land_contract: String,
    ) -> Self {
        let enrichment = EnrichmentEngine::new(gateway, hot_cache, persistent, catalog, hero_contract, weapon_contract, land_contract);
        AppState { enrichment, portfolio, score_intake, pool, rpc_pool }
    }
}
