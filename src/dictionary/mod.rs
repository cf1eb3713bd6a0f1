//! Data dictionary collaborator
//!
//! `DataDictionary` is the lookup and mutation surface the dependency and
//! authorization layers consume. The persistent implementation lives with the
//! storage engine; `MemoryDictionary` is an arena-backed implementation that
//! keeps every descriptor in maps keyed by UUID.
//!
//! All methods take `&self` and are fallible. Lookups return `Ok(None)` for a
//! missing object; callers decide whether that is an error.

pub mod error;
pub mod memory;

pub use error::{DictionaryError, DictionaryResult};
pub use memory::MemoryDictionary;

use uuid::Uuid;

use crate::catalog::{
    AliasDescriptor, FileInfoDescriptor, IndexDescriptor, SchemaDescriptor, SequenceDescriptor,
    SpsDescriptor, TableDescriptor, TriggerDescriptor, ViewDescriptor,
};
use crate::constraint::{ConstraintDescriptor, ConstraintDescriptorList};
use crate::depend::Dependency;
use crate::permission::{GenericObjectType, PermissionKind, PermissionsDescriptor, Privilege};

/// Outcome of merging a grant into, or subtracting a revoke from, the
/// permission catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionChange {
    /// New row stored
    Inserted,
    /// Existing row changed by this many privileges or columns
    Updated { changed: usize },
    /// Existing row already held (or never held) what was asked
    Unchanged,
    /// Revoke left the row empty and it was deleted
    Deleted,
    /// Revoke of a row that does not exist
    NotFound,
}

impl PermissionChange {
    /// Whether dependents of the row have to be invalidated after a revoke
    pub fn revoked_something(&self) -> bool {
        matches!(
            self,
            PermissionChange::Deleted | PermissionChange::Updated { .. }
        )
    }
}

/// Catalog lookup and mutation service
pub trait DataDictionary: Send + Sync {
    // Object lookups

    fn schema_descriptor(&self, id: Uuid) -> DictionaryResult<Option<SchemaDescriptor>>;

    fn schema_by_name(&self, name: &str) -> DictionaryResult<Option<SchemaDescriptor>>;

    fn table_descriptor(&self, id: Uuid) -> DictionaryResult<Option<TableDescriptor>>;

    fn table_by_name(
        &self,
        schema_id: Uuid,
        name: &str,
    ) -> DictionaryResult<Option<TableDescriptor>>;

    fn index_descriptor(&self, id: Uuid) -> DictionaryResult<Option<IndexDescriptor>>;

    fn constraint_descriptor(&self, id: Uuid) -> DictionaryResult<Option<ConstraintDescriptor>>;

    fn constraints_for_table(&self, table_id: Uuid) -> DictionaryResult<ConstraintDescriptorList>;

    fn view_descriptor(&self, id: Uuid) -> DictionaryResult<Option<ViewDescriptor>>;

    fn trigger_descriptor(&self, id: Uuid) -> DictionaryResult<Option<TriggerDescriptor>>;

    fn sps_descriptor(&self, id: Uuid) -> DictionaryResult<Option<SpsDescriptor>>;

    fn sequence_descriptor(&self, id: Uuid) -> DictionaryResult<Option<SequenceDescriptor>>;

    fn alias_descriptor(&self, id: Uuid) -> DictionaryResult<Option<AliasDescriptor>>;

    fn file_descriptor(&self, id: Uuid) -> DictionaryResult<Option<FileInfoDescriptor>>;

    // Permission lookups

    fn permission_descriptor(&self, id: Uuid) -> DictionaryResult<Option<PermissionsDescriptor>>;

    fn table_permissions(
        &self,
        table_id: Uuid,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>>;

    fn column_permissions(
        &self,
        table_id: Uuid,
        privilege: Privilege,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>>;

    fn schema_permissions(
        &self,
        schema_id: Uuid,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>>;

    fn routine_permissions(
        &self,
        routine_id: Uuid,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>>;

    fn generic_permissions(
        &self,
        object_id: Uuid,
        object_type: GenericObjectType,
        privilege: &str,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>>;

    /// Every permission row on an object, any grantee
    fn permissions_on_object(&self, object_id: Uuid) -> DictionaryResult<Vec<PermissionsDescriptor>>;

    // Roles

    /// CREATE ROLE row
    fn role_definition(&self, role_name: &str) -> DictionaryResult<Option<PermissionsDescriptor>>;

    /// GRANT `role_name` TO `grantee` row
    fn role_grant(
        &self,
        role_name: &str,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>>;

    /// Grants of a role to anyone, definitions excluded
    fn role_grants_of_role(&self, role_name: &str) -> DictionaryResult<Vec<PermissionsDescriptor>>;

    /// Role grants whose grantee is `grantee`, definitions excluded
    fn role_grants_to_grantee(&self, grantee: &str) -> DictionaryResult<Vec<PermissionsDescriptor>>;

    /// Store a role definition or role grant
    fn add_role_grant(&self, mut role: PermissionsDescriptor) -> DictionaryResult<PermissionChange> {
        if !matches!(role.kind(), PermissionKind::Role { .. }) {
            return Err(DictionaryError::Storage(format!(
                "not a role row: {:?}",
                role.kind()
            )));
        }
        self.add_remove_permissions_descriptor(true, &mut role)
    }

    /// Drop a role: its definition, grants of it, and everything granted to it.
    /// Returns the number of rows removed.
    fn drop_role_descriptor(&self, role_name: &str) -> DictionaryResult<usize>;

    /// Remove one role grant
    fn drop_role_grant(&self, role_name: &str, grantee: &str) -> DictionaryResult<bool>;

    // Permission mutation

    /// Merge a grant into (or subtract a revoke from) the row with the same
    /// key. On return `perm` carries the id of the stored row, so the caller
    /// can invalidate its dependents.
    fn add_remove_permissions_descriptor(
        &self,
        grant: bool,
        perm: &mut PermissionsDescriptor,
    ) -> DictionaryResult<PermissionChange>;

    // Stored dependencies (SYSDEPENDS)

    /// Store an edge. Returns false when an identical edge already exists.
    fn add_stored_dependency(&self, dep: &Dependency) -> DictionaryResult<bool>;

    fn drop_stored_dependency(&self, dep: &Dependency) -> DictionaryResult<bool>;

    /// Drop every stored edge of a dependent. Returns the number dropped.
    fn drop_dependents_stored_dependencies(&self, dependent_id: Uuid) -> DictionaryResult<usize>;

    fn stored_dependencies_for_dependent(
        &self,
        dependent_id: Uuid,
    ) -> DictionaryResult<Vec<Dependency>>;

    fn stored_dependencies_for_provider(&self, provider_id: Uuid)
        -> DictionaryResult<Vec<Dependency>>;

    fn all_stored_dependencies(&self) -> DictionaryResult<Vec<Dependency>>;

    // Dependent-side mutations used by invalidation

    /// Mark a stored prepared statement for recompilation
    fn invalidate_stored_statement(&self, id: Uuid) -> DictionaryResult<()>;

    fn drop_view_descriptor(&self, id: Uuid) -> DictionaryResult<()>;

    fn drop_trigger_descriptor(&self, id: Uuid) -> DictionaryResult<()>;

    fn drop_constraint_descriptor(&self, id: Uuid) -> DictionaryResult<()>;
}
