//! weblet: serve a convention-based site.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http::server ──▶ http::dispatch            │
//!                              │   (axum router)    (bind args, run program)  │
//!                              │        │                   │                 │
//!                              │        │                   ▼                 │
//!     Client Response          │        │            templates::Renderer      │
//!     ◀────────────────────────┼────────┘                                     │
//!                              │                                              │
//!     WebSocket frames         │   http::websocket ──▶ packets::dispatch      │
//!     ◀───────────────────────▶│   (read loop)         (parse, validate, run) │
//!                              │                                              │
//!                              │   lifecycle::Site: RouteTable + PacketTable  │
//!                              │   built once at startup from config + units  │
//!                              └──────────────────────────────────────────────┘
//! ```
//!
//! The binary serves pages only; programs and packets are compiled in by
//! applications that embed the library.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use weblet::config::load_config;
use weblet::lifecycle::wait_for_signal;
use weblet::observability::init_logging;
use weblet::{HttpServer, Shutdown, Site};

#[derive(Parser)]
#[command(name = "weblet")]
#[command(about = "Serve a convention-based site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site and serve it until interrupted
    Serve {
        #[arg(short, long, default_value = "weblet.toml")]
        config: PathBuf,
    },
    /// Print the compiled route table
    Routes {
        #[arg(short, long, default_value = "weblet.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(config).await,
        Commands::Routes { config } => {
            let config = load_config(&config)?;
            let site = Site::builder(config.site).build()?;
            print!("{}", site.routes());
            Ok(())
        }
    }
}

async fn serve(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&path)?;
    init_logging(&config.observability)?;

    tracing::info!(
        config = %path.display(),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let site = Arc::new(Site::builder(config.site.clone()).build()?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, site);
    let mut task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        signal = wait_for_signal() => {
            signal?;
            shutdown.trigger();
            task.await??;
        }
        result = &mut task => result??,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
