//! Error categories shared by the dictionary, dependency and authorization layers
//!
//! Each module defines its own error enum (see `dictionary::error`,
//! `depend::error`, `auth::error`). Callers that need to decide how to react
//! (abort the statement, report a capability gap, roll back the transaction)
//! look at the category instead of matching every variant.

use std::fmt;

/// Broad classification of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Principal lacks a privilege or ownership. Statement aborts, not retried.
    AuthorizationDenied,
    /// An expected catalog object is missing. Indicates corruption, not retried.
    CatalogInconsistency,
    /// Permission or object type combination that is not supported yet
    UnimplementedFeature,
    /// One or more dependents failed to invalidate
    AggregateInvalidationFailure,
    /// A dependent vetoed the action on its provider
    DependencyRestrict,
    /// The dictionary collaborator failed or an object could not be found
    CatalogAccess,
    /// A configuration property could not be parsed
    Configuration,
}

impl ErrorCategory {
    /// Whether the error is a user-visible permission failure
    pub fn is_denial(&self) -> bool {
        matches!(self, ErrorCategory::AuthorizationDenied)
    }

    /// Whether the current operation must be treated as fatal
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorCategory::CatalogInconsistency | ErrorCategory::AggregateInvalidationFailure
        )
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::AuthorizationDenied => "authorization denied",
            ErrorCategory::CatalogInconsistency => "catalog inconsistency",
            ErrorCategory::UnimplementedFeature => "unimplemented feature",
            ErrorCategory::AggregateInvalidationFailure => "invalidation failure",
            ErrorCategory::DependencyRestrict => "dependency restrict",
            ErrorCategory::CatalogAccess => "catalog access",
            ErrorCategory::Configuration => "configuration",
        };
        f.write_str(s)
    }
}
