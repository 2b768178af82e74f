//! Packet table construction.
//!
//! # Responsibilities
//! - Turn packet units into dot-separated packet names
//! - Skip private units and private handler names
//! - Reject two handlers claiming the same name

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::{Component, Path, PathBuf};

use futures_util::stream::Stream;
use serde::Serialize;

use crate::handler::HandlerResult;
use crate::packets::{Packet, PacketArgs, PacketError, PacketHandler, Schema};
use crate::routing::path::{is_private, INDEX_STEM};

/// One packet file: its path under the packets root and the handlers it
/// defines.
#[derive(Debug, Clone)]
pub struct PacketUnit {
    path: PathBuf,
    handlers: Vec<(String, Schema, PacketHandler)>,
}

impl PacketUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handlers: Vec::new(),
        }
    }

    /// Define a handler that answers once.
    pub fn single<F, Fut, R>(self, name: impl Into<String>, schema: Schema, f: F) -> Self
    where
        F: Fn(PacketArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
        R: Serialize,
    {
        self.handler(name, schema, PacketHandler::single(f))
    }

    /// Define a handler that streams replies.
    pub fn stream<F, S, R>(self, name: impl Into<String>, schema: Schema, f: F) -> Self
    where
        F: Fn(PacketArgs) -> S + Send + Sync + 'static,
        S: Stream<Item = HandlerResult<R>> + Send + 'static,
        R: Serialize,
    {
        self.handler(name, schema, PacketHandler::stream(f))
    }

    pub fn handler(mut self, name: impl Into<String>, schema: Schema, handler: PacketHandler) -> Self {
        self.handlers.push((name.into(), schema, handler));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Packet name for handler `name` in the unit at `relative`.
///
/// `index` directories and an `index` stem add nothing to the name.
pub fn packet_path(relative: &Path, name: &str) -> String {
    let mut parts: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .filter(|part| part != INDEX_STEM)
        .collect();

    if let Some(stem) = relative.file_stem() {
        let stem = stem.to_string_lossy();
        if stem != INDEX_STEM {
            parts.push(stem.into_owned());
        }
    }

    parts.push(name.to_string());
    parts.join(".")
}

/// Immutable set of packets, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct PacketTable {
    packets: BTreeMap<String, Packet>,
}

impl PacketTable {
    pub fn get(&self, path: &str) -> Option<&Packet> {
        self.packets.get(path)
    }

    /// Packets sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.packets.values()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

impl fmt::Display for PacketTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for packet in self.packets.values() {
            writeln!(f, "{packet}")?;
        }
        Ok(())
    }
}

/// Collects packet units into a [`PacketTable`].
#[derive(Debug)]
pub struct PacketTableBuilder {
    private_prefix: String,
    packets: BTreeMap<String, Packet>,
}

impl PacketTableBuilder {
    pub fn new(private_prefix: impl Into<String>) -> Self {
        Self {
            private_prefix: private_prefix.into(),
            packets: BTreeMap::new(),
        }
    }

    pub fn add_unit(&mut self, unit: PacketUnit) -> Result<(), PacketError> {
        if is_private(&unit.path, &self.private_prefix) {
            tracing::debug!(unit = %unit.path.display(), "Skipping private packet unit");
            return Ok(());
        }

        for (name, schema, handler) in unit.handlers {
            if name.is_empty() || name.contains('.') {
                return Err(PacketError::InvalidName {
                    unit: unit.path.display().to_string(),
                    name,
                });
            }
            if name.starts_with(self.private_prefix.as_str()) {
                tracing::debug!(unit = %unit.path.display(), name = %name, "Skipping private packet");
                continue;
            }

            let path = packet_path(&unit.path, &name);
            if self.packets.contains_key(&path) {
                return Err(PacketError::Duplicate(path));
            }

            tracing::debug!(packet = %path, stream = handler.is_stream(), "Registering packet");
            self.packets.insert(path.clone(), Packet::new(path, schema, handler));
        }
        Ok(())
    }

    pub fn build(self) -> PacketTable {
        PacketTable {
            packets: self.packets,
        }
    }
}
