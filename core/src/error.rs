use thiserror::Error;

use crate::ObjectId;

/// Errors that can occur during node registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The id does not resolve to a live object in this node
    #[error("No object registered under id {id}")]
    UnknownObject { id: ObjectId },
}
