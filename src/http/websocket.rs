//! WebSocket endpoint.
//!
//! # Responsibilities
//! - Complete the upgrade handshake
//! - Feed each text frame to the packet dispatcher, in arrival order
//! - End the session on a close frame or a transport error
//!
//! # Data Flow
//! ```text
//! Client ──text frame──→ read loop ──→ PacketDispatcher::handle_message
//!        ←──text frame── TextFrames sink ←──┘
//! ```
//!
//! # Design Decisions
//! - One task per connection; a slow handler holds back later messages
//! - Binary, ping and pong frames are ignored
//! - The server never initiates the close

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::sink::Sink;

use crate::lifecycle::Site;
use crate::packets::PacketDispatcher;

/// Upgrade handler mounted at the configured WebSocket path.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(site): State<Arc<Site>>) -> Response {
    let dispatcher = site.packet_dispatcher();
    ws.on_upgrade(move |socket| serve_connection(socket, dispatcher))
}

/// Read loop for one upgraded connection.
pub async fn serve_connection(mut socket: WebSocket, dispatcher: PacketDispatcher) {
    tracing::debug!("WebSocket connection opened");

    while let Some(frame) = socket.recv().await {
        let message = match frame {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, "WebSocket transport error");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                let mut frames = TextFrames(&mut socket);
                if let Err(err) = dispatcher.handle_message(&mut frames, text.as_str()).await {
                    tracing::debug!(error = %err, "Failed to send WebSocket reply");
                    break;
                }
            }
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    tracing::debug!("WebSocket connection closed");
}

/// Adapts a socket into a sink of text frames.
struct TextFrames<'a>(&'a mut WebSocket);

impl Sink<String> for TextFrames<'_> {
    type Error = axum::Error;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut *self.0).poll_ready(cx)
    }

    fn start_send(mut self: Pin<&mut Self>, item: String) -> Result<(), Self::Error> {
        Pin::new(&mut *self.0).start_send(Message::Text(item.into()))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut *self.0).poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut *self.0).poll_close(cx)
    }
}
