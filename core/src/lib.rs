//! # Tether Core
//! A networked shared-object synchronization engine: a registry of
//! named-field objects kept consistent across participants — one
//! authoritative original per object plus any number of mirrors —
//! synchronized by per-step field diffs over an external transport.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

mod driver;
mod error;
mod message;
mod node;
mod object;
mod object_id;
mod transport;
mod value;

pub use driver::StepDriver;
pub use error::NodeError;
pub use message::SyncMessage;
pub use node::{NodeConfig, NodeEvent, SyncNode};
pub use object::{BeforeSyncHook, FieldHandler, FieldHandlerId, HookId, SyncObject};
pub use object_id::{ObjectId, ObjectIdGenerator};
pub use transport::{link_pair, LinkTransport, NullTransport, Transport};
pub use value::{FromValue, Quat, Value, Vec3};
