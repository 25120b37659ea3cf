//! Error types for navigation graph and controller operations.

use thiserror::Error;

use crate::types::DestinationId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("navigation graph has not been set")]
    GraphNotSet,

    #[error("destination {0} is not part of the navigation graph")]
    UnknownDestination(DestinationId),

    #[error("destination {0} is not on the back stack")]
    NotOnBackStack(DestinationId),

    #[error("duplicate destination id {0}")]
    DuplicateDestination(DestinationId),

    #[error("navigation graph has no destinations")]
    EmptyGraph,

    #[error("navigation graph has no start destination")]
    NoStartDestination,
}
