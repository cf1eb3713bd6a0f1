//! Authorization error types

use thiserror::Error;

use crate::depend::DependencyError;
use crate::dictionary::DictionaryError;
use crate::error::ErrorCategory;
use crate::permission::{GenericObjectType, Privilege};

/// Authorization and privilege administration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("User '{principal}' does not have {privilege} permission on table '{table}'")]
    TablePermissionDenied {
        principal: String,
        privilege: Privilege,
        table: String,
    },

    /// Names the first required column that no grant covers
    #[error("User '{principal}' does not have {privilege} permission on column '{column}' of table '{table}'")]
    ColumnPermissionDenied {
        principal: String,
        privilege: Privilege,
        column: String,
        table: String,
    },

    #[error("User '{principal}' does not have EXECUTE permission on routine '{routine}'")]
    RoutinePermissionDenied { principal: String, routine: String },

    #[error("User '{principal}' does not have {privilege} permission on {object_type} '{object}'")]
    GenericPermissionDenied {
        principal: String,
        privilege: String,
        object_type: GenericObjectType,
        object: String,
    },

    #[error("User '{principal}' can not perform the operation in schema '{schema}'")]
    SchemaOwnerRequired { principal: String, schema: String },

    #[error("User '{principal}' does not have permission to create schema '{schema}'")]
    SchemaCreateDenied { principal: String, schema: String },

    #[error("User '{principal}' can not perform {operation} on role '{role}'")]
    RoleOperationDenied {
        principal: String,
        operation: String,
        role: String,
    },

    #[error("Granting role '{role}' to '{grantee}' would create a cycle")]
    RoleCycle { role: String, grantee: String },

    #[error("Role '{0}' does not exist")]
    RoleNotFound(String),

    #[error("Role '{0}' already exists")]
    RoleExists(String),

    #[error("{privilege} permission on {object_type} is not implemented")]
    Unimplemented {
        privilege: String,
        object_type: GenericObjectType,
    },

    #[error("Invalid value '{value}' for property {key}")]
    InvalidProperty { key: String, value: String },

    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("Dependency error: {0}")]
    Dependency(#[from] DependencyError),
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::TablePermissionDenied { .. }
            | AuthError::ColumnPermissionDenied { .. }
            | AuthError::RoutinePermissionDenied { .. }
            | AuthError::GenericPermissionDenied { .. }
            | AuthError::SchemaOwnerRequired { .. }
            | AuthError::SchemaCreateDenied { .. }
            | AuthError::RoleOperationDenied { .. }
            | AuthError::RoleCycle { .. } => ErrorCategory::AuthorizationDenied,
            AuthError::RoleNotFound(_) | AuthError::RoleExists(_) => ErrorCategory::CatalogAccess,
            AuthError::Unimplemented { .. } => ErrorCategory::UnimplementedFeature,
            AuthError::InvalidProperty { .. } => ErrorCategory::Configuration,
            AuthError::Dictionary(e) => e.category(),
            AuthError::Dependency(e) => e.category(),
        }
    }
}

/// Result type for authorization operations
pub type AuthResult<T> = Result<T, AuthError>;
