mod api;
mod config;
mod db;
mod enrichment;
mod portfolio;
mod score_intake;
mod state;

use std::sync::Arc;

use actix_web::dev::Service;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use swarm_cache_common::cache::HotCache;
use swarm_cache_common::chain::{ContractGateway, RpcPool};

use crate::config::Config;
use crate::db::{CatalogStore, PersistentTokenCache};
use crate::portfolio::PortfolioGateway;
use crate::score_intake::{ScoreDecryptor, ScoreIntake};
use crate::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    if config.bind_address.starts_with("0.0.0.0") {
        log::warn!("binding to 0.0.0.0: the gateway will be reachable from every interface");
    }

    let rpc_pool = Arc::new(RpcPool::new(config.rpc_endpoints.clone())?);
    let gateway = Arc::new(ContractGateway::new(Arc::clone(&rpc_pool), &config.hero_contract, &config.weapon_contract)?);
    let hot_cache = Arc::new(HotCache::new(config.hot_cache_capacity));

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let persistent = Arc::new(PersistentTokenCache::new(pool.clone()));
    let catalog = Arc::new(CatalogStore::new(pool.clone(), Arc::clone(&hot_cache)));
    let portfolio = Arc::new(PortfolioGateway::new(config.indexer_base_url.clone(), config.indexer_api_key.clone(), Arc::clone(&hot_cache)));

    let score_intake = if config.score_subsystem_ready() {
        let score_key = config.score_key.as_ref().expect("checked by score_subsystem_ready");
        let info_key = config.info_key.as_ref().expect("checked by score_subsystem_ready");
        let decryptor = ScoreDecryptor::load(score_key, info_key)?;
        Some(Arc::new(ScoreIntake::new(pool.clone(), decryptor)))
    } else {
        log::warn!("score subsystem disabled: SCORE_PRIVATE_KEY/INFO_PRIVATE_KEY not configured");
        None
    };

    let bind_address = config.bind_address.clone();
    let http_workers = config.http_workers;
    let hero_contract = config.hero_contract.clone();
    let weapon_contract = config.weapon_contract.clone();
    let land_contract = config.land_contract.clone();

    let server = HttpServer::new(move || {
        let app_state = AppState::new(
            Arc::clone(&rpc_pool),
            Arc::clone(&gateway),
            Arc::clone(&hot_cache),
            Arc::clone(&persistent),
            Arc::clone(&catalog),
            portfolio.clone(),
            score_intake.clone(),
            pool.clone(),
            hero_contract.clone(),
            weapon_contract.clone(),
            land_contract.clone(),
        );
        let usage_pool = pool.clone();
        App::new()
            .app_data(web::Data::new(app_state))
            .wrap_fn(move |req, srv| {
                let usage_pool = usage_pool.clone();
                let route = req.path().to_string();
                let wallet = api::usage::wallet_from_query(req.query_string());
                let started = std::time::Instant::now();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    let status = res.status().as_u16() as i32;
                    let latency_ms = started.elapsed().as_millis() as i64;
                    api::usage::record(usage_pool, wallet, route, status, latency_ms);
                    Ok(res)
                }
            })
            .configure(api::configure)
    })
    .workers(http_workers)
    .bind(&bind_address)?
    .run();

    log::info!("swarm-cache-gateway listening on {bind_address}");
    server.await?;
    Ok(())
}
