//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route table from program units and the pages tree
//! - Build the packet table from packet units
//! - Check the WebSocket entrypoints against the compiled routes
//! - Freeze everything into one immutable [`Site`]
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Programs and packets are registered by the embedding application;
//!   only pages are discovered on disk

use std::sync::Arc;

use thiserror::Error;

use crate::config::SiteConfig;
use crate::packets::{PacketDispatcher, PacketError, PacketTable, PacketTableBuilder, PacketUnit};
use crate::routing::{Method, ProgramUnit, RouteError, RouteTable, RouteTableBuilder};
use crate::templates::{PagesRenderer, Renderer};

/// Anything that stops a site from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("route configuration error: {0}")]
    Route(#[from] RouteError),

    #[error("packet configuration error: {0}")]
    Packet(#[from] PacketError),

    #[error("websocket path {0} collides with a GET route")]
    WebSocketCollision(String),
}

/// Everything dispatch needs, built once and shared read-only.
pub struct Site {
    routes: RouteTable,
    packets: Arc<PacketTable>,
    renderer: Arc<dyn Renderer>,
    websocket_paths: Vec<String>,
}

impl Site {
    pub fn builder(config: SiteConfig) -> SiteBuilder {
        SiteBuilder::new(config)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn packets(&self) -> &PacketTable {
        &self.packets
    }

    pub fn packet_dispatcher(&self) -> PacketDispatcher {
        PacketDispatcher::new(self.packets.clone())
    }

    pub fn renderer(&self) -> Arc<dyn Renderer> {
        self.renderer.clone()
    }

    /// Paths the WebSocket endpoint is mounted at. Empty when disabled.
    pub fn websocket_paths(&self) -> &[String] {
        &self.websocket_paths
    }
}

/// Collects units and builds a [`Site`].
pub struct SiteBuilder {
    config: SiteConfig,
    programs: Vec<ProgramUnit>,
    packets: Vec<PacketUnit>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl SiteBuilder {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            programs: Vec::new(),
            packets: Vec::new(),
            renderer: None,
        }
    }

    pub fn program(mut self, unit: ProgramUnit) -> Self {
        self.programs.push(unit);
        self
    }

    pub fn packets(mut self, unit: PacketUnit) -> Self {
        self.packets.push(unit);
        self
    }

    /// Use a custom renderer instead of the pages directory renderer.
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn build(self) -> Result<Site, StartupError> {
        let pages_root = self.config.pages_root();

        let mut routes = RouteTableBuilder::new(self.config.private_prefix.clone())
            .with_extensions(self.config.template_extensions.iter().cloned());
        for unit in self.programs {
            routes.add_unit(unit)?;
        }
        let pages = routes.scan_pages(&pages_root)?;
        let routes = routes.build()?;

        let websocket_paths = self.config.websocket_paths;
        if let Some(path) = websocket_paths.iter().find(|path| routes.get(Method::Get, path).is_some()) {
            return Err(StartupError::WebSocketCollision(path.clone()));
        }

        let mut packets = PacketTableBuilder::new(self.config.private_prefix.clone());
        for unit in self.packets {
            packets.add_unit(unit)?;
        }
        let packets = packets.build();

        let renderer: Arc<dyn Renderer> = match self.renderer {
            Some(renderer) => renderer,
            None => Arc::new(PagesRenderer::new(pages_root.clone())),
        };

        tracing::info!(
            routes = routes.len(),
            pages,
            packets = packets.len(),
            pages_root = %pages_root.display(),
            websocket = ?websocket_paths,
            "Site loaded"
        );

        Ok(Site {
            routes,
            packets: Arc::new(packets),
            renderer,
            websocket_paths,
        })
    }
}
