//! Dependency tracking
//!
//! Compiled objects (views, triggers, constraints, stored and live prepared
//! statements) record which catalog objects they were compiled against. When
//! DDL changes one of those providers, every dependent is told, and either
//! recompiles, is dropped along with the change, or vetoes it.
//!
//! Edges with both endpoints persistent are stored in SYSDEPENDS through the
//! dictionary. Edges with a non-persistent endpoint (a live prepared
//! statement) are kept in memory by the `DependencyManager`.

pub mod action;
pub mod error;
pub mod finder;
pub mod manager;
pub mod objects;
pub mod statement;

pub use action::{Disposition, InvalidationAction};
pub use error::{DependencyError, DependencyResult, InvalidationFailure};
pub use finder::{DependableClass, DependableFinder, DependableObject, FINDER_FORMAT_VERSION};
pub use manager::{DependencyManager, InvalidationReport};
pub use statement::CompiledStatement;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ColumnSet;
use crate::dictionary::DataDictionary;

/// Anything that can be an endpoint of a dependency
pub trait Dependable {
    fn object_id(&self) -> Uuid;

    fn dependable_finder(&self) -> DependableFinder;

    /// Name used in diagnostics
    fn object_name(&self) -> String;

    fn class_type(&self) -> DependableClass {
        self.dependable_finder().class()
    }

    fn is_persistent(&self) -> bool {
        self.dependable_finder().is_persistent()
    }
}

/// An object other objects may depend on
pub trait Provider: Dependable {
    /// Columns a change to this provider is limited to; `None` for all
    fn provider_columns(&self) -> Option<&ColumnSet> {
        None
    }
}

/// An object that can be invalidated by a change to one of its providers
pub trait Dependent: Dependable + Send + Sync {
    fn is_valid(&self) -> bool;

    /// First phase: veto the action with `DependencyError::Restrict`, or accept
    fn prepare_to_invalidate(
        &self,
        provider: &ProviderInfo,
        action: InvalidationAction,
        cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()>;

    /// Second phase: recompile, drop, or mark invalid
    fn make_invalid(
        &self,
        action: InvalidationAction,
        cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()>;
}

/// A dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub dependent_id: Uuid,
    pub dependent_finder: DependableFinder,
    pub provider_id: Uuid,
    pub provider_finder: DependableFinder,
}

impl Dependency {
    pub fn new<D, P>(dependent: &D, provider: &P) -> Self
    where
        D: Dependable + ?Sized,
        P: Dependable + ?Sized,
    {
        Self {
            dependent_id: dependent.object_id(),
            dependent_finder: dependent.dependable_finder(),
            provider_id: provider.object_id(),
            provider_finder: provider.dependable_finder(),
        }
    }

    /// Whether the edge goes to SYSDEPENDS
    pub fn is_stored(&self) -> bool {
        self.dependent_finder.is_persistent() && self.provider_finder.is_persistent()
    }
}

/// Provider side of an edge, as seen by a dependent during invalidation
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderInfo {
    pub id: Uuid,
    pub finder: DependableFinder,
    pub name: String,
    /// Columns of the change that this edge actually depends on
    pub affected_columns: Option<ColumnSet>,
}

impl ProviderInfo {
    pub fn from_provider<P: Provider + ?Sized>(provider: &P) -> Self {
        Self {
            id: provider.object_id(),
            finder: provider.dependable_finder(),
            name: provider.object_name(),
            affected_columns: provider.provider_columns().cloned(),
        }
    }

    pub fn class_type(&self) -> DependableClass {
        self.finder.class()
    }
}

/// What a dependent may use while invalidating itself
pub struct InvalidationContext<'a> {
    pub dictionary: &'a dyn DataDictionary,
    pub manager: &'a DependencyManager,
}
