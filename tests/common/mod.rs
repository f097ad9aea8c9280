//! Shared harness: an app rooted in a temporary directory with its own
//! intro/outro, public and views directories and an in-memory session store.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use affapp_backend::config::Config;
use affapp_backend::create_app;
use affapp_backend::session::MemoryStore;
use affapp_backend::state::AppState;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "test-session-secret";

pub struct TestApp {
    pub router: Router,
    pub root: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("response body should be UTF-8")
    }
}

pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    let dir = |name: &str| root.join(name).to_string_lossy().into_owned();
    config.system_config.intro_dir = dir("audio/intro");
    config.system_config.outro_dir = dir("audio/outro");
    config.system_config.public_dir = dir("public");
    config.system_config.views_dir = dir("views");
    config.session_config.database_url = "memory://".to_string();
    config.session_config.session_secret = SECRET.to_string();
    config
}

fn populate(root: &Path, intro: &[&str], outro: &[&str]) {
    for (sub, files) in [("audio/intro", intro), ("audio/outro", outro)] {
        let dir = root.join(sub);
        fs::create_dir_all(&dir).unwrap();
        for name in files {
            fs::write(dir.join(name), b"ID3").unwrap();
        }
    }
    fs::create_dir_all(root.join("public")).unwrap();
    fs::create_dir_all(root.join("views")).unwrap();
    fs::write(
        root.join("views/index.html"),
        "<h1>Welcome</h1><p>Views: {{ session.views }}</p><p>User: {{ session.user }}</p>",
    )
    .unwrap();
}

impl TestApp {
    pub fn new(intro: &[&str], outro: &[&str]) -> Self {
        Self::with_config(intro, outro, |_| {})
    }

    /// Like [`TestApp::new`], letting the caller adjust the config first.
    /// The config is used as is, without validation.
    pub fn with_config(intro: &[&str], outro: &[&str], adjust: impl FnOnce(&mut Config)) -> Self {
        let root = tempfile::tempdir().unwrap();
        populate(root.path(), intro, outro);
        let mut config = test_config(root.path());
        adjust(&mut config);
        let state = AppState::with_store(config, Arc::new(MemoryStore::new()));
        Self { router: create_app(state), root }
    }

    pub fn intro_dir(&self) -> std::path::PathBuf {
        self.root.path().join("audio/intro")
    }

    pub fn outro_dir(&self) -> std::path::PathBuf {
        self.root.path().join("audio/outro")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("failed to make request");
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        TestResponse { status, headers, body }
    }

    pub async fn post_json(&self, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }
}
