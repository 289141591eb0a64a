use sqlx::PgPool;

/// Fire-and-forget `api_usage` writer (migrations/0001_init.sql): every
/// request is logged best-effort, never blocking or failing the response
/// on the caller's behalf.
pub fn record(pool: PgPool, wallet: Option<String>, route: String, status: i32, latency_ms: i64) {
    tokio::spawn(async move {
        let result = sqlx::query(
            "INSERT INTO api_usage (wallet, route, status, latency_ms) VALUES ($1, $2, $3, $4)",
        )
        .bind(wallet)
        .bind(route)
        .bind(status)
        .bind(latency_ms)
        .execute(&pool)
        .await;

        if let Err(err) = result {
            log::warn!("failed to record api_usage row: {err}");
        }
    });
}

/// Best-effort `address` extraction from a raw query string. Wallet
/// addresses are plain hex and need no percent-decoding, so this avoids
/// pulling in a URL-decoding dependency just for an optional log column.
pub fn wallet_from_query(query_string: &str) -> Option<String> {
    query_string.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "address" && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_address_from_query_string() {
        assert_eq!(wallet_from_query("address=0xabc&chain=polygon"), Some("0xabc".to_string()));
        assert_eq!(wallet_from_query("chain=polygon&address=0xabc"), Some("0xabc".to_string()));
        assert_eq!(wallet_from_query("chain=polygon"), None);
        assert_eq!(wallet_from_query(""), None);
    }
}
