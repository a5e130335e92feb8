//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use device_relay::config::{QueueMode, RelayConfig};
use device_relay::http::HttpServer;
use device_relay::lifecycle::Shutdown;
use device_relay::StaticAllowList;
use tokio::sync::mpsc;

pub const KEY: &str = "test-key";

/// A relay running on an ephemeral port over a scratch root directory.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub root: tempfile::TempDir,
    pub allow_list_tx: mpsc::UnboundedSender<StaticAllowList>,
    shutdown: Shutdown,
}

impl TestRelay {
    pub async fn start(mode: QueueMode) -> Self {
        Self::start_with(|config| config.queue.mode = mode).await
    }

    pub async fn start_with(tweak: impl FnOnce(&mut RelayConfig)) -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut config = RelayConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config.storage.root_dir = root.path().to_path_buf();
        config.auth.keys = vec![KEY.into()];
        tweak(&mut config);
        std::fs::create_dir_all(config.storage.queries_path()).unwrap();

        let allow_list = StaticAllowList::from_config(&config.auth).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let (allow_list_tx, allow_list_rx) = mpsc::unbounded_channel();
        let server = HttpServer::new(config, allow_list);
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, allow_list_rx, server_shutdown).await;
        });

        Self {
            addr,
            root,
            allow_list_tx,
            shutdown,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn queries(&self) -> PathBuf {
        self.root.path().join("queries")
    }

    /// Drop a document into the root directory.
    pub fn put_document(&self, name: &str, body: &str) {
        std::fs::write(self.root().join(name), body).unwrap();
    }

    /// Play the controller: publish an action response.
    pub fn put_response(&self, action_id: u32, request_id: u32, body: &str) -> PathBuf {
        let path = self
            .queries()
            .join(format!("actionResponse_{:05}_{:08}.xml", action_id, request_id));
        std::fs::write(&path, body).unwrap();
        path
    }

    pub fn set_debug(&self, on: bool) {
        let sentinel = self.queries().join("DEBUG.flg");
        if on {
            std::fs::write(sentinel, "").unwrap();
        } else {
            let _ = std::fs::remove_file(sentinel);
        }
    }

    pub async fn get(&self, query: &str) -> (String, String) {
        let res = client()
            .get(format!("{}?{}", self.url(), query))
            .send()
            .await
            .expect("relay unreachable");
        split(res).await
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Content type and body text of a relay reply.
pub async fn split(res: reqwest::Response) -> (String, String) {
    assert_eq!(res.status(), 200, "the relay always answers 200");
    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    (content_type, res.text().await.unwrap())
}
