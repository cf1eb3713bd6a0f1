//! Dependency error types

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use super::{DependableClass, InvalidationAction};
use crate::dictionary::DictionaryError;
use crate::error::ErrorCategory;

/// One dependent that could not be invalidated
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidationFailure {
    pub dependent_id: Uuid,
    pub dependent_name: String,
    pub error: Box<DependencyError>,
}

impl fmt::Display for InvalidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.dependent_name, self.dependent_id, self.error)
    }
}

/// Dependency recording and invalidation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DependencyError {
    /// A dependent refused the action on its provider
    #[error("Operation '{action}' cannot be performed on {provider_class} '{provider_name}' because {dependent_class} '{dependent_name}' is dependent on it")]
    Restrict {
        action: InvalidationAction,
        provider_class: DependableClass,
        provider_name: String,
        dependent_class: DependableClass,
        dependent_name: String,
    },

    /// Some dependents failed; the ones listed were left as they were
    #[error("{action} on '{provider_name}' failed to invalidate {} dependent(s): {}", .failures.len(), join_failures(.failures))]
    InvalidationFailed {
        provider_name: String,
        action: InvalidationAction,
        failures: Vec<InvalidationFailure>,
    },

    /// Dictionary error
    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),
}

fn join_failures(failures: &[InvalidationFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl DependencyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DependencyError::Restrict { .. } => ErrorCategory::DependencyRestrict,
            DependencyError::InvalidationFailed { .. } => {
                ErrorCategory::AggregateInvalidationFailure
            }
            DependencyError::Dictionary(e) => e.category(),
        }
    }

    /// Failures of an aggregate error; empty for other errors
    pub fn failures(&self) -> &[InvalidationFailure] {
        match self {
            DependencyError::InvalidationFailed { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Result type for dependency operations
pub type DependencyResult<T> = Result<T, DependencyError>;
