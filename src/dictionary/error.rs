//! Dictionary error types

use thiserror::Error;
use uuid::Uuid;

use crate::catalog::DescriptorType;
use crate::error::ErrorCategory;

/// Dictionary lookup and mutation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DictionaryError {
    /// Object looked up by id does not exist
    #[error("{kind} {id} does not exist")]
    ObjectNotFound { kind: DescriptorType, id: Uuid },

    /// Object looked up by name does not exist
    #[error("{kind} '{name}' does not exist")]
    NameNotFound { kind: DescriptorType, name: String },

    /// An object another catalog row points at is missing
    #[error(
        "Catalog inconsistency: {kind} {id} missing from {} ({context})",
        .kind.system_catalog()
    )]
    CatalogInconsistency {
        kind: DescriptorType,
        id: Uuid,
        context: String,
    },

    /// Object already exists
    #[error("{kind} '{name}' already exists")]
    DuplicateDescriptor { kind: DescriptorType, name: String },

    /// Failure in the storage collaborator
    #[error("Storage error: {0}")]
    Storage(String),

    /// Finder bytes could not be decoded
    #[error("Finder error: {0}")]
    Finder(String),
}

impl DictionaryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DictionaryError::CatalogInconsistency { .. } => ErrorCategory::CatalogInconsistency,
            _ => ErrorCategory::CatalogAccess,
        }
    }
}

impl From<bincode::Error> for DictionaryError {
    fn from(e: bincode::Error) -> Self {
        DictionaryError::Finder(e.to_string())
    }
}

/// Result type for dictionary operations
pub type DictionaryResult<T> = Result<T, DictionaryError>;
