//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;

use weblet::config::{SiteConfig, WebletConfig};
use weblet::{HttpServer, Shutdown, SiteBuilder};

/// A server running on an ephemeral port over a temporary site directory.
pub struct TestSite {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    dir: TempDir,
}

impl TestSite {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for TestSite {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// A temporary site directory with a `pages/` tree.
pub fn site_dir(pages: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (relative, content) in pages {
        let path = dir.path().join("pages").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

/// Site rooted at `dir`, with WebSocket entrypoints at `/ws` and `/live`.
pub fn site_config(dir: &TempDir) -> SiteConfig {
    SiteConfig {
        base_dir: dir.path().to_path_buf(),
        websocket_paths: vec!["/ws".to_string(), "/live".to_string()],
        ..SiteConfig::default()
    }
}

/// Build the site with `configure` and serve it on 127.0.0.1:0.
pub async fn start_site<F>(pages: &[(&str, &str)], configure: F) -> TestSite
where
    F: FnOnce(SiteBuilder) -> SiteBuilder,
{
    let dir = site_dir(pages);
    let site = configure(SiteBuilder::new(site_config(&dir))).build().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(WebletConfig::default(), Arc::new(site));
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestSite { addr, shutdown, dir }
}
