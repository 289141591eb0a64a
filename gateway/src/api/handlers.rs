use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use swarm_cache_common::score::RawScoreEnvelope;

use crate::api::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddressQuery {
    pub address: String,
}

#[derive(Deserialize)]
pub struct AddressChainQuery {
    pub address: String,
    #[serde(default = "default_chain")]
    pub chain: String,
}

fn default_chain() -> String {
    "polygon".to_string()
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    error: Option<String>,
    data: T,
}

fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope { success: true, error: None, data })
}

#[get("/heroes")]
pub async fn heroes(state: web::Data<AppState>, query: web::Query<AddressQuery>) -> Result<impl Responder, ApiError> {
    let envelope = state.enrichment.heroes(&query.address).await?;
    Ok(ok(envelope))
}

#[get("/heroes/slim")]
pub async fn heroes_slim(state: web::Data<AppState>, query: web::Query<AddressQuery>) -> Result<impl Responder, ApiError> {
    let entries = state.enrichment.heroes_slim(&query.address).await?;
    Ok(ok(entries))
}

#[get("/weapons")]
pub async fn weapons(state: web::Data<AppState>, query: web::Query<AddressQuery>) -> Result<impl Responder, ApiError> {
    let entries = state.enrichment.weapons(&query.address).await?;
    Ok(ok(entries))
}

#[get("/weapons/slim")]
pub async fn weapons_slim(state: web::Data<AppState>, query: web::Query<AddressQuery>) -> Result<impl Responder, ApiError> {
    let entries = state.enrichment.weapons_slim(&query.address).await?;
    Ok(ok(entries))
}

#[get("/lands")]
pub async fn lands(state: web::Data<AppState>, query: web::Query<AddressQuery>) -> Result<impl Responder, ApiError> {
    let entries = state.enrichment.lands(&query.address).await?;
    Ok(ok(entries))
}

#[get("/enhanced-player-data")]
pub async fn enhanced_player_data(state: web::Data<AppState>, query: web::Query<AddressChainQuery>) -> Result<impl Responder, ApiError> {
    let data = state.enrichment.enhanced_player_data(&query.address).await?;
    Ok(ok(data))
}

#[get("/portfolio")]
pub async fn portfolio(state: web::Data<AppState>, query: web::Query<AddressChainQuery>) -> Result<impl Responder, ApiError> {
    let portfolio = state.portfolio.erc20_portfolio(&query.address, &query.chain).await?;
    Ok(ok(portfolio))
}

#[get("/nfts/{address}")]
pub async fn nfts(state: web::Data<AppState>, path: web::Path<String>, query: web::Query<ChainOnlyQuery>) -> Result<impl Responder, ApiError> {
    let collections = state.portfolio.nft_collections(&path.into_inner(), &query.chain).await?;
    Ok(ok(collections))
}

#[derive(Deserialize)]
pub struct ChainOnlyQuery {
    #[serde(default = "default_chain")]
    pub chain: String,
}

#[post("/portfolio/refresh")]
pub async fn portfolio_refresh(state: web::Data<AppState>, query: web::Query<AddressChainQuery>) -> impl Responder {
    let portfolio_report = state.portfolio.refresh(&query.address, &query.chain).await;
    let enrichment_report = state.enrichment.refresh(&query.address).await;
    ok(json!({
        "portfolio_refreshed": portfolio_report.portfolio_refreshed,
        "nfts_refreshed": portfolio_report.nfts_refreshed,
        "heroes_refreshed": enrichment_report.heroes_refreshed,
        "weapons_refreshed": enrichment_report.weapons_refreshed,
    }))
}

#[post("/score")]
pub async fn score_submit(state: web::Data<AppState>, body: web::Json<RawScoreEnvelope>) -> Result<impl Responder, ApiError> {
    let Some(score_intake) = &state.score_intake else {
        return Err(swarm_cache_common::error::GatewayError::ServiceUnavailable(
            "score subsystem is not configured".to_string(),
        )
        .into());
    };

    let raw_payload = serde_json::to_value(&body.0).unwrap_or(json!({}));
    let outcome = score_intake.submit(body.into_inner(), raw_payload).await?;
    Ok(ok(outcome))
}

#[get("/timestamp")]
pub async fn timestamp() -> impl Responder {
    let now = chrono::Utc::now();
    ok(json!({
        "epoch_seconds": now.timestamp(),
        "iso8601": now.to_rfc3339(),
    }))
}

#[get("/blacklist")]
pub async fn blacklist(state: web::Data<AppState>, query: web::Query<AddressQuery>) -> Result<impl Responder, ApiError> {
    let address = swarm_cache_common::address::normalize_address(&query.address)?;
    let row = sqlx::query_as::<_, (String, Option<String>, bool)>(
        "SELECT reason, evidence::text, active FROM blacklist WHERE player_address = $1",
    )
    .bind(address)
    .fetch_optional(&state.pool)
    .await
    .map_err(|err| swarm_cache_common::error::GatewayError::PersistentCacheReadError(err.into()))?;

    Ok(ok(row.map(|(reason, evidence, active)| json!({
        "reason": reason,
        "evidence": evidence,
        "active": active,
    }))))
}

#[get("/healthz")]
pub async fn healthz(state: web::Data<AppState>) -> impl Responder {
    let rpc_ok = state.rpc_pool.acquire().await.is_ok();
    let db_ok = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();
    let score_ok = state.score_intake.is_some();
    let indexer_ok = state.portfolio.ping().await;

    ok(json!({
        "rpc_pool": if rpc_ok { "healthy" } else { "unhealthy" },
        "database": if db_ok { "healthy" } else { "unhealthy" },
        "score_subsystem": if score_ok { "ready" } else { "disabled" },
        "indexer": if indexer_ok { "healthy" } else { "unhealthy" },
    }))
}
