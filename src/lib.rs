//! roodict - data dictionary dependency tracking and SQL authorization
//!
//! Features:
//! - Dependency graph between compiled objects and the catalog objects they
//!   were compiled against, with cascade/restrict invalidation on DDL
//! - SQL standard permission checks over table, column, schema, routine,
//!   generic and role grants
//! - Role grant closure, forward and inverse
//! - Constraint descriptors and constraint firing decisions
//!
//! Persistent storage is behind the `DataDictionary` trait; `MemoryDictionary`
//! is an in-memory implementation.

pub mod auth;
pub mod catalog;
pub mod constraint;
pub mod depend;
pub mod dictionary;
pub mod error;
pub mod permission;
pub mod role;

pub use auth::{AuthError, AuthorizationConfig, Authorizer, PrivilegeAdmin, SessionContext};
pub use depend::{DependencyError, DependencyManager, InvalidationAction};
pub use dictionary::{DataDictionary, DictionaryError, MemoryDictionary};
pub use error::ErrorCategory;
