//! Packet handlers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::handler::{BoxFuture, HandlerError, HandlerResult};
use crate::packets::{PacketArgs, Schema};

type SingleFn = Arc<dyn Fn(PacketArgs) -> BoxFuture<HandlerResult<Value>> + Send + Sync>;
type StreamFn = Arc<dyn Fn(PacketArgs) -> BoxStream<'static, HandlerResult<Value>> + Send + Sync>;

/// How a packet produces its replies.
#[derive(Clone)]
pub enum PacketHandler {
    /// Runs once; a dictionary result becomes one reply.
    Single(SingleFn),
    /// Yields any number of results; each dictionary becomes a reply.
    Stream(StreamFn),
}

impl PacketHandler {
    pub fn single<F, Fut, R>(f: F) -> Self
    where
        F: Fn(PacketArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
        R: Serialize,
    {
        PacketHandler::Single(Arc::new(move |args: PacketArgs| {
            let fut = f(args);
            let boxed: BoxFuture<HandlerResult<Value>> =
                Box::pin(async move {
                    let result = fut.await?;
                    Ok::<Value, HandlerError>(serde_json::to_value(result)?)
                });
            boxed
        }))
    }

    pub fn stream<F, S, R>(f: F) -> Self
    where
        F: Fn(PacketArgs) -> S + Send + Sync + 'static,
        S: Stream<Item = HandlerResult<R>> + Send + 'static,
        R: Serialize,
    {
        PacketHandler::Stream(Arc::new(move |args: PacketArgs| {
            f(args)
                .map(|item| item.and_then(|result| Ok(serde_json::to_value(result)?)))
                .boxed()
        }))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, PacketHandler::Stream(_))
    }
}

impl fmt::Debug for PacketHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PacketHandler::Single(_) => "Single",
            PacketHandler::Stream(_) => "Stream",
        })
    }
}

/// A named WebSocket handler with its argument schema.
#[derive(Debug, Clone)]
pub struct Packet {
    path: String,
    handler: PacketHandler,
    schema: Schema,
}

impl Packet {
    pub fn new(path: impl Into<String>, schema: Schema, handler: PacketHandler) -> Self {
        Self {
            path: path.into(),
            handler,
            schema,
        }
    }

    /// Dot-separated packet name.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &PacketHandler {
        &self.handler
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.handler.is_stream() { "stream" } else { "single" };
        let fields: Vec<&str> = self.schema.names().collect();
        write!(f, "{}({}) [{kind}]", self.path, fields.join(", "))
    }
}
