//! Live tests for `TrustedAccountCache` using `#[sqlx::test]` databases and
//! wiremock list sources.

use chrono::{Duration, Utc};
use rugwatch_trust::{TrustError, TrustListClient, TrustedAccountCache};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn list_server(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn cache_for(pool: sqlx::PgPool, server: &MockServer, ttl_hours: i64) -> TrustedAccountCache {
    let client = TrustListClient::new(&server.uri(), 10).expect("client construction");
    TrustedAccountCache::new(pool, client, ttl_hours)
}

#[sqlx::test(migrations = "../../migrations")]
async fn refresh_replaces_persisted_set(pool: sqlx::PgPool) {
    let server = list_server("@alice\n# curated list\n\nBOB\n").await;
    let cache = cache_for(pool.clone(), &server, 24);

    let count = cache.refresh().await.expect("refresh should succeed");
    assert_eq!(count, 2);

    let set = cache.get().await.expect("get should succeed");
    assert_eq!(
        set.handles(),
        &["alice".to_string(), "bob".to_string()]
    );
    assert!(set.refreshed_at().is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn refresh_failure_keeps_previous_set(pool: sqlx::PgPool) {
    let good = list_server("@alice\nbob\n").await;
    let cache = cache_for(pool.clone(), &good, 24);
    cache.refresh().await.expect("initial refresh");

    // Same database, but the source now returns 500s.
    let bad = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&bad)
        .await;
    let failing = cache_for(pool.clone(), &bad, 24);

    let result = failing.refresh().await;
    assert!(matches!(result, Err(TrustError::Http(_))));

    let set = failing.get().await.expect("get should succeed");
    assert_eq!(
        set.handles(),
        &["alice".to_string(), "bob".to_string()],
        "previous set must survive a failed refresh"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_list_is_a_refresh_failure(pool: sqlx::PgPool) {
    let good = list_server("@alice\n").await;
    let cache = cache_for(pool.clone(), &good, 24);
    cache.refresh().await.expect("initial refresh");

    let empty = list_server("# nothing but comments\n").await;
    let cache = cache_for(pool.clone(), &empty, 24);

    let result = cache.refresh().await;
    assert!(matches!(result, Err(TrustError::EmptyList)));

    let set = cache.get().await.expect("get should succeed");
    assert_eq!(set.handles(), &["alice".to_string()]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_refreshes_when_never_populated(pool: sqlx::PgPool) {
    let server = list_server("@carol\n").await;
    let cache = cache_for(pool, &server, 24);

    // No explicit refresh: get() must treat the empty cache as stale.
    let set = cache.get().await.expect("get should succeed");
    assert_eq!(set.handles(), &["carol".to_string()]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_falls_back_silently_when_refresh_fails(pool: sqlx::PgPool) {
    let good = list_server("@alice\n").await;
    let cache = cache_for(pool.clone(), &good, 24);
    cache.refresh().await.expect("initial refresh");

    // Age the stored stamp past the TTL, then point at a dead source.
    let old = Utc::now() - Duration::hours(48);
    sqlx::query("UPDATE trusted_accounts SET refreshed_at = $1")
        .bind(old)
        .execute(&pool)
        .await
        .expect("age refresh stamp");

    let bad = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&bad)
        .await;
    let stale_cache = cache_for(pool, &bad, 24);

    let set = stale_cache
        .get()
        .await
        .expect("get must not surface refresh failure");
    assert_eq!(
        set.handles(),
        &["alice".to_string()],
        "stale set must be served when refresh fails"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_on_empty_cache_with_dead_source_returns_empty_set(pool: sqlx::PgPool) {
    let bad = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&bad)
        .await;
    let cache = cache_for(pool, &bad, 24);

    let set = cache.get().await.expect("get should still succeed");
    assert!(set.is_empty());
    assert!(set.refreshed_at().is_none());
}
