//! Common test utilities for all integration tests.
//!
//! Provides a temporary workspace (token file, CA directory, destination),
//! wiremock stand-ins for the Vault KV endpoints, and an in-memory
//! `ClientFactory` that counts cycles.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use token_fetcher::config::{DestinationConfig, RefreshConfig};
use token_fetcher::secrets::{
    self, BearerToken, ClientFactory, KvVersion, SecretPayload, SecretStoreClient, VaultSettings,
};
use token_fetcher::{CronSchedule, PropertiesFormat};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "s.integration-token";

/// Scratch directory holding the token file, an empty CA directory and the
/// destination file.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir(dir.path().join("ca")).expect("create ca dir");
        let workspace = Self { dir };
        workspace.write_token(&format!("{}\n", TEST_TOKEN));
        workspace
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.path().join("token")
    }

    pub fn ca_dir(&self) -> PathBuf {
        self.dir.path().join("ca")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_token(&self, token: &str) {
        std::fs::write(self.token_path(), token).expect("write token");
    }

    /// Rotate the token the way agents do: write a sibling, rename it over.
    pub fn rotate_token(&self, token: &str) {
        let staged = self.path(".token.staged");
        std::fs::write(&staged, token).expect("stage token");
        std::fs::rename(&staged, self.token_path()).expect("rename token");
    }

    pub fn read(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.path(name)).ok()
    }

    /// Refresh configuration pointing at `vault_uri` and writing `destination`.
    pub fn refresh_config(
        &self,
        vault_uri: &str,
        kv_version: KvVersion,
        destination: &str,
    ) -> RefreshConfig {
        let destination = self.path(destination);
        RefreshConfig {
            vault: VaultSettings {
                address: vault_uri.to_string(),
                ca_path: self.ca_dir(),
                kv_version,
                timeout: Some(Duration::from_secs(5)),
                ..Default::default()
            },
            token_path: self.token_path(),
            secret_path: "app/db".to_string(),
            destination: DestinationConfig {
                format: PropertiesFormat::resolve(None, &destination).expect("format"),
                path: destination,
                mode: Some(0o600),
            },
            schedule: CronSchedule::parse("@yearly").expect("schedule"),
            watch_debounce: Duration::from_millis(250),
        }
    }
}

/// Envelope every Vault read response is wrapped in.
fn vault_envelope(data: Value) -> Value {
    json!({
        "request_id": "6a4b1a0e-0000-4000-8000-000000000000",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": data,
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Serve `data` at `GET /v1/{mount}/data/{secret}` for requests carrying `token`.
pub async fn mount_kv2_secret(
    server: &MockServer,
    mount: &str,
    secret: &str,
    token: &str,
    data: Value,
) {
    let body = vault_envelope(json!({
        "data": data,
        "metadata": {
            "created_time": "2024-05-01T10:00:00.000000Z",
            "custom_metadata": null,
            "deletion_time": "",
            "destroyed": false,
            "version": 3
        }
    }));

    Mock::given(method("GET"))
        .and(path(format!("/v1/{}/data/{}", mount, secret)))
        .and(header("X-Vault-Token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve `data` at `GET /v1/{mount}/{secret}` for requests carrying `token`.
pub async fn mount_kv1_secret(
    server: &MockServer,
    mount: &str,
    secret: &str,
    token: &str,
    data: Value,
) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/{}/{}", mount, secret)))
        .and(header("X-Vault-Token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(vault_envelope(data)))
        .mount(server)
        .await;
}

/// Answer `GET route` with a Vault error body.
pub async fn mount_vault_error(server: &MockServer, route: &str, status: u16, errors: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "errors": errors })))
        .mount(server)
        .await;
}

/// Client factory returning a fixed payload and recording every token it
/// was asked to authenticate with.
pub struct RecordingFactory {
    payload: Mutex<SecretPayload>,
    tokens: Mutex<Vec<String>>,
    cycles: AtomicUsize,
}

impl RecordingFactory {
    pub fn new(payload: SecretPayload) -> Arc<Self> {
        Arc::new(Self {
            payload: Mutex::new(payload),
            tokens: Mutex::new(Vec::new()),
            cycles: AtomicUsize::new(0),
        })
    }

    pub fn set_payload(&self, payload: SecretPayload) {
        *self.payload.lock().unwrap() = payload;
    }

    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

struct StaticStore {
    payload: SecretPayload,
}

#[async_trait]
impl SecretStoreClient for StaticStore {
    async fn read_secret(&self, _path: &str) -> secrets::Result<SecretPayload> {
        Ok(self.payload.clone())
    }
}

impl ClientFactory for RecordingFactory {
    fn create_client(&self, token: &BearerToken) -> secrets::Result<Box<dyn SecretStoreClient>> {
        self.cycles.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.expose_secret().to_string());
        Ok(Box::new(StaticStore { payload: self.payload.lock().unwrap().clone() }))
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
