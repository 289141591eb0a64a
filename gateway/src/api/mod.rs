pub mod error;
pub mod handlers;
pub mod usage;

use actix_web::web;

/// Registers every route named in the gateway's REST surface. Mirrors the
/// teacher's `daemon/src/rpc/mod.rs` bootstrap, which wires its JSON-RPC
/// dispatch table in one place rather than scattering `App::route` calls.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::healthz)
        .service(handlers::heroes)
        .service(handlers::heroes_slim)
        .service(handlers::weapons)
        .service(handlers::weapons_slim)
        .service(handlers::lands)
        .service(handlers::enhanced_player_data)
        .service(handlers::portfolio)
        .service(handlers::nfts)
        .service(handlers::portfolio_refresh)
        .service(handlers::score_submit)
        .service(handlers::timestamp)
        .service(handlers::blacklist);
}
