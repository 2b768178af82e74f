//! WebSocket packets.
//!
//! # Responsibilities
//! - Hold the immutable table of named packet handlers
//! - Validate inbound arguments against each packet's schema
//! - Drive one connection's messages through parse, resolve, validate,
//!   invoke and reply
//!
//! # Design Decisions
//! - Packet names are dot-separated paths derived from the unit path, with
//!   `index` segments collapsed
//! - Schemas are declared next to the handler instead of being inferred
//! - The dispatcher writes to any `Sink<String>` so it can be driven without
//!   a socket
//!
//! # Data Flow
//! ```text
//! text frame -> Envelope::parse -> PacketTable::get -> Schema::validate
//!            -> PacketHandler (single | stream) -> JSON object frames
//! ```

pub mod dispatch;
pub mod envelope;
pub mod packet;
pub mod schema;
pub mod table;

use thiserror::Error;

pub use dispatch::PacketDispatcher;
pub use envelope::{Envelope, EnvelopeError};
pub use packet::{Packet, PacketHandler};
pub use schema::{FieldError, FieldType, PacketArgs, Schema, ValidationErrors};
pub use table::{packet_path, PacketTable, PacketTableBuilder, PacketUnit};

/// Load-time packet configuration errors.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("packet `{0}` is defined more than once")]
    Duplicate(String),

    #[error("invalid packet name `{name}` in {unit}: names must be non-empty and contain no '.'")]
    InvalidName { unit: String, name: String },
}
