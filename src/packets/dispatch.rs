//! Per-message packet dispatch.
//!
//! Every failure before invocation is answered on the same connection with
//! `{"error": "<message>"}` and the connection stays usable.

use std::sync::Arc;

use futures_util::sink::{Sink, SinkExt};
use futures_util::stream::StreamExt;
use serde_json::{json, Value};

use crate::handler::HandlerError;
use crate::packets::{Envelope, Packet, PacketHandler, PacketTable};

/// Runs inbound text messages against a [`PacketTable`].
#[derive(Debug, Clone)]
pub struct PacketDispatcher {
    packets: Arc<PacketTable>,
}

impl PacketDispatcher {
    pub fn new(packets: Arc<PacketTable>) -> Self {
        Self { packets }
    }

    pub fn packets(&self) -> &PacketTable {
        &self.packets
    }

    /// Process one text message, writing every reply to `sink`.
    ///
    /// Only a failing sink is reported back; the caller should stop reading
    /// from the connection in that case.
    pub async fn handle_message<S>(&self, sink: &mut S, message: &str) -> Result<(), S::Error>
    where
        S: Sink<String> + Unpin,
    {
        let envelope = match Envelope::parse(message) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::debug!(error = %err, "Rejected malformed packet");
                return send_error(sink, err.to_string()).await;
            }
        };

        let Some(packet) = self.packets.get(&envelope.name) else {
            tracing::debug!(packet = %envelope.name, "Unknown packet");
            return send_error(sink, format!("the packet name {} is not valid", envelope.name)).await;
        };

        let args = match packet.schema().validate(&envelope.arguments) {
            Ok(args) => args,
            Err(errors) => {
                tracing::debug!(packet = %packet.path(), error = %errors, "Packet arguments rejected");
                return send_error(sink, errors.to_string()).await;
            }
        };

        tracing::trace!(packet = %packet.path(), "Invoking packet");

        match packet.handler() {
            PacketHandler::Single(handler) => match handler(args).await {
                Ok(value) => send_object(sink, value).await,
                Err(err) => handler_failed(sink, packet, err).await,
            },
            PacketHandler::Stream(handler) => {
                let mut replies = handler(args);
                while let Some(item) = replies.next().await {
                    match item {
                        Ok(value) => send_object(sink, value).await?,
                        Err(err) => return handler_failed(sink, packet, err).await,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Only dictionaries become frames; any other result is dropped.
async fn send_object<S>(sink: &mut S, value: Value) -> Result<(), S::Error>
where
    S: Sink<String> + Unpin,
{
    match value {
        Value::Object(_) => sink.send(value.to_string()).await,
        other => {
            tracing::trace!(kind = crate::handler::json_type(&other), "Dropping non-dictionary result");
            Ok(())
        }
    }
}

async fn send_error<S>(sink: &mut S, message: String) -> Result<(), S::Error>
where
    S: Sink<String> + Unpin,
{
    sink.send(json!({ "error": message }).to_string()).await
}

async fn handler_failed<S>(sink: &mut S, packet: &Packet, err: HandlerError) -> Result<(), S::Error>
where
    S: Sink<String> + Unpin,
{
    tracing::error!(packet = %packet.path(), error = %err, "Packet handler failed");
    send_error(sink, format!("the packet {} failed to complete", packet.path())).await
}
