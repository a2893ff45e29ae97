//! End-to-end refresh cycles against a wiremock Vault.

mod common;

use common::{
    mount_kv1_secret, mount_kv2_secret, mount_vault_error, RecordingFactory, Workspace, TEST_TOKEN,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use token_fetcher::secrets::{KvVersion, SecretPayload, SecretsError};
use token_fetcher::{FetcherError, PropertiesFormat, RefreshCycle, TokenHandler, Trigger};
use wiremock::MockServer;

fn vault_handler(ws: &Workspace, server: &MockServer, destination: &str) -> TokenHandler {
    TokenHandler::from_config(ws.refresh_config(&server.uri(), KvVersion::V2, destination)).unwrap()
}

#[tokio::test]
async fn test_kv2_secret_written_as_json() {
    let server = MockServer::start().await;
    let data = json!({"username": "app", "password": "s3cr3t"});
    mount_kv2_secret(&server, "secret", "app/db", TEST_TOKEN, data).await;

    let ws = Workspace::new();
    let handler = vault_handler(&ws, &server, "creds.json");

    let report = handler.try_refresh().await.unwrap();

    assert_eq!(report.keys, 2);
    assert_eq!(
        ws.read("creds.json").unwrap(),
        "{\n  \"password\": \"s3cr3t\",\n  \"username\": \"app\"\n}\n"
    );
}

#[tokio::test]
async fn test_kv1_secret_written_as_yaml() {
    let server = MockServer::start().await;
    let data = json!({"host": "db.internal", "pool": 4});
    mount_kv1_secret(&server, "kv", "app/db", TEST_TOKEN, data).await;

    let ws = Workspace::new();
    let mut config = ws.refresh_config(&server.uri(), KvVersion::V1, "creds.yaml");
    config.vault.mount_path = "kv".to_string();
    let handler = TokenHandler::from_config(config).unwrap();

    handler.try_refresh().await.unwrap();

    assert_eq!(ws.read("creds.yaml").unwrap(), "host: db.internal\npool: 4\n");
}

#[tokio::test]
async fn test_repeated_refresh_is_byte_identical() {
    let server = MockServer::start().await;
    let data = json!({"b": "2", "a": "1", "c": {"nested": true}});
    mount_kv2_secret(&server, "secret", "app/db", TEST_TOKEN, data).await;

    let ws = Workspace::new();
    let handler = vault_handler(&ws, &server, "creds.json");

    handler.try_refresh().await.unwrap();
    let first = std::fs::read(ws.path("creds.json")).unwrap();
    handler.try_refresh().await.unwrap();
    let second = std::fs::read(ws.path("creds.json")).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_permission_denied_keeps_previous_file() {
    let server = MockServer::start().await;
    mount_vault_error(&server, "/v1/secret/data/app/db", 403, &["permission denied"]).await;

    let ws = Workspace::new();
    std::fs::write(ws.path("creds.json"), "{\"password\":\"previous\"}\n").unwrap();
    let handler = vault_handler(&ws, &server, "creds.json");

    let err = handler.try_refresh().await.unwrap_err();

    assert!(matches!(err, FetcherError::Secrets(SecretsError::AuthenticationFailed { .. })));
    assert!(!err.is_fatal());
    assert_eq!(ws.read("creds.json").unwrap(), "{\"password\":\"previous\"}\n");

    // the next cycle still runs
    handler.refresh(Trigger::Schedule).await;
    assert_eq!(ws.read("creds.json").unwrap(), "{\"password\":\"previous\"}\n");
}

#[tokio::test]
async fn test_missing_secret_is_not_found() {
    let server = MockServer::start().await;
    mount_vault_error(&server, "/v1/secret/data/app/db", 404, &[]).await;

    let ws = Workspace::new();
    let handler = vault_handler(&ws, &server, "creds.json");

    let err = handler.try_refresh().await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
    assert!(ws.read("creds.json").is_none());
}

#[tokio::test]
async fn test_rotated_token_is_used_by_next_cycle() {
    let server = MockServer::start().await;
    mount_kv2_secret(&server, "secret", "app/db", "s.rotated", json!({"password": "fresh"})).await;

    let ws = Workspace::new();
    let handler = vault_handler(&ws, &server, "creds.json");

    // the old token is not accepted by the mock
    assert!(handler.try_refresh().await.is_err());

    ws.rotate_token("s.rotated\n");
    handler.try_refresh().await.unwrap();
    assert_eq!(ws.read("creds.json").unwrap(), "{\n  \"password\": \"fresh\"\n}\n");
}

#[tokio::test]
async fn test_unreachable_vault_is_connection_failure() {
    let ws = Workspace::new();
    // nothing listens on port 9 on a test host
    let handler = TokenHandler::from_config(ws.refresh_config(
        "http://127.0.0.1:9",
        KvVersion::V2,
        "creds.json",
    ))
    .unwrap();

    let err = handler.try_refresh().await.unwrap_err();
    assert_eq!(err.kind(), "connection_failed");
    assert!(ws.read("creds.json").is_none());
}

#[tokio::test]
async fn test_missing_ca_path_aborts_cycle_only() {
    let ws = Workspace::new();
    let mut config = ws.refresh_config("https://vault.invalid:8200", KvVersion::V2, "creds.json");
    config.vault.ca_path = ws.path("missing-ca.pem");
    let handler = TokenHandler::from_config(config).unwrap();

    let err = handler.try_refresh().await.unwrap_err();
    assert_eq!(err.kind(), "client_config");
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_malformed_ca_bundle_aborts_cycle_before_fetch() {
    let server = MockServer::start().await;
    mount_kv2_secret(&server, "secret", "app/db", TEST_TOKEN, json!({"password": "new"})).await;

    let ws = Workspace::new();
    std::fs::write(ws.path("ca.pem"), "this is not a certificate").unwrap();
    std::fs::write(ws.path("creds.json"), "{\"password\":\"previous\"}\n").unwrap();
    let mut config = ws.refresh_config(&server.uri(), KvVersion::V2, "creds.json");
    config.vault.ca_path = ws.path("ca.pem");
    let handler = TokenHandler::from_config(config).unwrap();

    let err = handler.try_refresh().await.unwrap_err();

    assert_eq!(err.kind(), "client_config");
    assert!(!err.is_fatal());
    assert_eq!(ws.read("creds.json").unwrap(), "{\"password\":\"previous\"}\n");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_reader_never_sees_partial_file() {
    let small = SecretPayload::new().with_entry("password", "old");
    let large: SecretPayload =
        (0..2000).map(|i| (format!("key_{:04}", i), json!("x".repeat(64)))).collect();
    let small_bytes = PropertiesFormat::Json.encode(&small).unwrap();
    let large_bytes = PropertiesFormat::Json.encode(&large).unwrap();

    let ws = Workspace::new();
    let factory = RecordingFactory::new(small);
    let config = ws.refresh_config("https://vault.invalid:8200", KvVersion::V2, "creds.json");
    let destination = config.destination.path.clone();
    let handler = TokenHandler::new(Arc::new(config), factory.clone());

    handler.try_refresh().await.unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), small_bytes);
    factory.set_payload(large);

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let done = Arc::clone(&done);
        let destination = destination.clone();
        let (small_bytes, large_bytes) = (small_bytes.clone(), large_bytes.clone());
        std::thread::spawn(move || {
            let (mut reads, mut partial) = (0usize, 0usize);
            while !done.load(Ordering::SeqCst) {
                if let Ok(bytes) = std::fs::read(&destination) {
                    reads += 1;
                    if bytes != small_bytes && bytes != large_bytes {
                        partial += 1;
                    }
                }
            }
            (reads, partial)
        })
    };

    for _ in 0..20 {
        handler.try_refresh().await.unwrap();
    }
    done.store(true, Ordering::SeqCst);

    let (reads, partial) = reader.join().unwrap();
    assert!(reads > 0);
    assert_eq!(partial, 0, "reader saw {} partial writes out of {} reads", partial, reads);
    assert_eq!(std::fs::read(&destination).unwrap(), large_bytes);
    assert_eq!(factory.cycles(), 21);
}
