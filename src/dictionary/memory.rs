//! In-memory dictionary
//!
//! Arena of descriptors keyed by UUID, guarded by one `RwLock`. Every method
//! takes the lock for the duration of a single call and never calls back out,
//! so callers may freely interleave lookups with dependency dispatch.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{DataDictionary, DictionaryError, DictionaryResult, PermissionChange};
use crate::catalog::{
    AliasDescriptor, DescriptorType, FileInfoDescriptor, IndexDescriptor, SchemaDescriptor,
    SequenceDescriptor, SpsDescriptor, TableDescriptor, TableType, TriggerDescriptor,
    TupleDescriptor, ViewDescriptor,
};
use crate::constraint::{ConstraintDescriptor, ConstraintDescriptorList, ConstraintKind};
use crate::depend::Dependency;
use crate::permission::{
    GenericObjectType, PermissionKey, PermissionKind, PermissionsDescriptor, Privilege,
    RevokeOutcome,
};

#[derive(Default)]
struct DictionaryState {
    schemas: HashMap<Uuid, SchemaDescriptor>,
    tables: HashMap<Uuid, TableDescriptor>,
    indexes: HashMap<Uuid, IndexDescriptor>,
    constraints: HashMap<Uuid, ConstraintDescriptor>,
    views: HashMap<Uuid, ViewDescriptor>,
    triggers: HashMap<Uuid, TriggerDescriptor>,
    statements: HashMap<Uuid, SpsDescriptor>,
    sequences: HashMap<Uuid, SequenceDescriptor>,
    aliases: HashMap<Uuid, AliasDescriptor>,
    files: HashMap<Uuid, FileInfoDescriptor>,
    permissions: HashMap<Uuid, PermissionsDescriptor>,
    permission_keys: HashMap<PermissionKey, Uuid>,
    dependencies: Vec<Dependency>,
}

impl DictionaryState {
    fn permission_by_key(&self, key: &PermissionKey) -> Option<PermissionsDescriptor> {
        self.permission_keys
            .get(key)
            .and_then(|id| self.permissions.get(id))
            .cloned()
    }

    fn remove_permission(&mut self, id: Uuid) -> Option<PermissionsDescriptor> {
        let perm = self.permissions.remove(&id)?;
        self.permission_keys.remove(&perm.key());
        Some(perm)
    }

    fn role_rows<F>(&self, pred: F) -> Vec<PermissionsDescriptor>
    where
        F: Fn(&PermissionsDescriptor, &str, bool) -> bool,
    {
        self.permissions
            .values()
            .filter(|p| match p.kind() {
                PermissionKind::Role {
                    role_name, is_def, ..
                } => pred(p, role_name, *is_def),
                _ => false,
            })
            .cloned()
            .collect()
    }
}

/// Arena-backed `DataDictionary`
#[derive(Default)]
pub struct MemoryDictionary {
    state: RwLock<DictionaryState>,
}

impl MemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schema(&self, schema: SchemaDescriptor) -> DictionaryResult<()> {
        let mut state = self.state.write();
        if state.schemas.values().any(|s| s.name == schema.name) {
            return Err(DictionaryError::DuplicateDescriptor {
                kind: DescriptorType::Schema,
                name: schema.name,
            });
        }
        state.schemas.insert(schema.uuid, schema);
        Ok(())
    }

    pub fn add_table(&self, table: TableDescriptor) -> DictionaryResult<()> {
        let mut state = self.state.write();
        if state
            .tables
            .values()
            .any(|t| t.schema_id == table.schema_id && t.name == table.name)
        {
            return Err(DictionaryError::DuplicateDescriptor {
                kind: DescriptorType::Table,
                name: table.name,
            });
        }
        state.tables.insert(table.uuid, table);
        Ok(())
    }

    /// Drop a table together with its indexes, constraints and triggers
    pub fn drop_table(&self, id: Uuid) -> DictionaryResult<TableDescriptor> {
        let mut state = self.state.write();
        let table = state.tables.remove(&id).ok_or(DictionaryError::ObjectNotFound {
            kind: DescriptorType::Table,
            id,
        })?;
        state.indexes.retain(|_, i| i.table_id != id);
        state.constraints.retain(|_, c| c.table_id != id);
        state.triggers.retain(|_, t| t.table_id != id);
        Ok(table)
    }

    pub fn add_index(&self, index: IndexDescriptor) -> DictionaryResult<()> {
        self.state.write().indexes.insert(index.uuid, index);
        Ok(())
    }

    pub fn drop_index(&self, id: Uuid) -> DictionaryResult<IndexDescriptor> {
        self.state
            .write()
            .indexes
            .remove(&id)
            .ok_or(DictionaryError::ObjectNotFound {
                kind: DescriptorType::Index,
                id,
            })
    }

    /// Store a constraint. A foreign key bumps the reference count of the key
    /// it references.
    pub fn add_constraint(&self, cd: ConstraintDescriptor) -> DictionaryResult<()> {
        let mut state = self.state.write();
        if let ConstraintKind::ForeignKey(fk) = &cd.kind {
            let target = state
                .constraints
                .get_mut(&fk.referenced_constraint_id)
                .ok_or(DictionaryError::ObjectNotFound {
                    kind: DescriptorType::Constraint,
                    id: fk.referenced_constraint_id,
                })?;
            target.adjust_reference_count(true);
        }
        state.constraints.insert(cd.uuid, cd);
        Ok(())
    }

    /// Store a view together with its SYSTABLES row
    pub fn add_view(&self, view: ViewDescriptor) -> DictionaryResult<()> {
        let mut table = TableDescriptor::new(view.name.clone(), view.schema_id)
            .table_type(TableType::View);
        table.uuid = view.uuid;
        let mut state = self.state.write();
        state.tables.insert(table.uuid, table);
        state.views.insert(view.uuid, view);
        Ok(())
    }

    pub fn add_trigger(&self, trigger: TriggerDescriptor) -> DictionaryResult<()> {
        self.state.write().triggers.insert(trigger.uuid, trigger);
        Ok(())
    }

    pub fn add_statement(&self, sps: SpsDescriptor) -> DictionaryResult<()> {
        self.state.write().statements.insert(sps.uuid, sps);
        Ok(())
    }

    pub fn add_sequence(&self, seq: SequenceDescriptor) -> DictionaryResult<()> {
        self.state.write().sequences.insert(seq.uuid, seq);
        Ok(())
    }

    pub fn add_alias(&self, alias: AliasDescriptor) -> DictionaryResult<()> {
        self.state.write().aliases.insert(alias.uuid, alias);
        Ok(())
    }

    pub fn add_file(&self, file: FileInfoDescriptor) -> DictionaryResult<()> {
        self.state.write().files.insert(file.uuid, file);
        Ok(())
    }

    /// Number of stored permission rows, role rows included
    pub fn permission_count(&self) -> usize {
        self.state.read().permissions.len()
    }
}

impl DataDictionary for MemoryDictionary {
    fn schema_descriptor(&self, id: Uuid) -> DictionaryResult<Option<SchemaDescriptor>> {
        Ok(self.state.read().schemas.get(&id).cloned())
    }

    fn schema_by_name(&self, name: &str) -> DictionaryResult<Option<SchemaDescriptor>> {
        Ok(self
            .state
            .read()
            .schemas
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    fn table_descriptor(&self, id: Uuid) -> DictionaryResult<Option<TableDescriptor>> {
        Ok(self.state.read().tables.get(&id).cloned())
    }

    fn table_by_name(
        &self,
        schema_id: Uuid,
        name: &str,
    ) -> DictionaryResult<Option<TableDescriptor>> {
        Ok(self
            .state
            .read()
            .tables
            .values()
            .find(|t| t.schema_id == schema_id && t.name == name)
            .cloned())
    }

    fn index_descriptor(&self, id: Uuid) -> DictionaryResult<Option<IndexDescriptor>> {
        Ok(self.state.read().indexes.get(&id).cloned())
    }

    fn constraint_descriptor(&self, id: Uuid) -> DictionaryResult<Option<ConstraintDescriptor>> {
        Ok(self.state.read().constraints.get(&id).cloned())
    }

    fn constraints_for_table(&self, table_id: Uuid) -> DictionaryResult<ConstraintDescriptorList> {
        Ok(self
            .state
            .read()
            .constraints
            .values()
            .filter(|c| c.table_id == table_id)
            .cloned()
            .collect())
    }

    fn view_descriptor(&self, id: Uuid) -> DictionaryResult<Option<ViewDescriptor>> {
        Ok(self.state.read().views.get(&id).cloned())
    }

    fn trigger_descriptor(&self, id: Uuid) -> DictionaryResult<Option<TriggerDescriptor>> {
        Ok(self.state.read().triggers.get(&id).cloned())
    }

    fn sps_descriptor(&self, id: Uuid) -> DictionaryResult<Option<SpsDescriptor>> {
        Ok(self.state.read().statements.get(&id).cloned())
    }

    fn sequence_descriptor(&self, id: Uuid) -> DictionaryResult<Option<SequenceDescriptor>> {
        Ok(self.state.read().sequences.get(&id).cloned())
    }

    fn alias_descriptor(&self, id: Uuid) -> DictionaryResult<Option<AliasDescriptor>> {
        Ok(self.state.read().aliases.get(&id).cloned())
    }

    fn file_descriptor(&self, id: Uuid) -> DictionaryResult<Option<FileInfoDescriptor>> {
        Ok(self.state.read().files.get(&id).cloned())
    }

    fn permission_descriptor(&self, id: Uuid) -> DictionaryResult<Option<PermissionsDescriptor>> {
        Ok(self.state.read().permissions.get(&id).cloned())
    }

    fn table_permissions(
        &self,
        table_id: Uuid,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>> {
        let key = PermissionKey::Table {
            grantee: grantee.to_string(),
            table_id,
        };
        Ok(self.state.read().permission_by_key(&key))
    }

    fn column_permissions(
        &self,
        table_id: Uuid,
        privilege: Privilege,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>> {
        let key = PermissionKey::Column {
            grantee: grantee.to_string(),
            table_id,
            privilege,
        };
        Ok(self.state.read().permission_by_key(&key))
    }

    fn schema_permissions(
        &self,
        schema_id: Uuid,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>> {
        let key = PermissionKey::Schema {
            grantee: grantee.to_string(),
            schema_id,
        };
        Ok(self.state.read().permission_by_key(&key))
    }

    fn routine_permissions(
        &self,
        routine_id: Uuid,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>> {
        let key = PermissionKey::Routine {
            grantee: grantee.to_string(),
            routine_id,
        };
        Ok(self.state.read().permission_by_key(&key))
    }

    fn generic_permissions(
        &self,
        object_id: Uuid,
        object_type: GenericObjectType,
        privilege: &str,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>> {
        let key = PermissionKey::Generic {
            grantee: grantee.to_string(),
            object_id,
            object_type,
            privilege: privilege.to_string(),
        };
        Ok(self.state.read().permission_by_key(&key))
    }

    fn permissions_on_object(&self, object_id: Uuid) -> DictionaryResult<Vec<PermissionsDescriptor>> {
        Ok(self
            .state
            .read()
            .permissions
            .values()
            .filter(|p| p.object_id() == Some(object_id))
            .cloned()
            .collect())
    }

    fn role_definition(&self, role_name: &str) -> DictionaryResult<Option<PermissionsDescriptor>> {
        Ok(self
            .state
            .read()
            .role_rows(|_, name, is_def| is_def && name == role_name)
            .into_iter()
            .next())
    }

    fn role_grant(
        &self,
        role_name: &str,
        grantee: &str,
    ) -> DictionaryResult<Option<PermissionsDescriptor>> {
        let key = PermissionKey::Role {
            grantee: grantee.to_string(),
            role_name: role_name.to_string(),
            is_def: false,
        };
        Ok(self.state.read().permission_by_key(&key))
    }

    fn role_grants_of_role(&self, role_name: &str) -> DictionaryResult<Vec<PermissionsDescriptor>> {
        Ok(self
            .state
            .read()
            .role_rows(|_, name, is_def| !is_def && name == role_name))
    }

    fn role_grants_to_grantee(&self, grantee: &str) -> DictionaryResult<Vec<PermissionsDescriptor>> {
        Ok(self
            .state
            .read()
            .role_rows(|p, _, is_def| !is_def && p.grantee() == grantee))
    }

    fn drop_role_descriptor(&self, role_name: &str) -> DictionaryResult<usize> {
        let mut state = self.state.write();
        let doomed: Vec<Uuid> = state
            .permissions
            .values()
            .filter(|p| p.role_name() == Some(role_name) || p.grantee() == role_name)
            .map(|p| p.id())
            .collect();
        if !doomed
            .iter()
            .filter_map(|id| state.permissions.get(id))
            .any(|p| p.is_role_definition() && p.role_name() == Some(role_name))
        {
            return Err(DictionaryError::NameNotFound {
                kind: DescriptorType::Role,
                name: role_name.to_string(),
            });
        }
        for id in &doomed {
            state.remove_permission(*id);
        }
        debug!(role = role_name, rows = doomed.len(), "dropped role rows");
        Ok(doomed.len())
    }

    fn drop_role_grant(&self, role_name: &str, grantee: &str) -> DictionaryResult<bool> {
        let key = PermissionKey::Role {
            grantee: grantee.to_string(),
            role_name: role_name.to_string(),
            is_def: false,
        };
        let mut state = self.state.write();
        match state.permission_keys.get(&key).copied() {
            Some(id) => Ok(state.remove_permission(id).is_some()),
            None => Ok(false),
        }
    }

    fn add_remove_permissions_descriptor(
        &self,
        grant: bool,
        perm: &mut PermissionsDescriptor,
    ) -> DictionaryResult<PermissionChange> {
        let key = perm.key();
        let mut state = self.state.write();
        let existing = state.permission_keys.get(&key).copied();

        let Some(id) = existing else {
            if !grant {
                return Ok(PermissionChange::NotFound);
            }
            if perm.id().is_nil() {
                perm.set_uuid(Uuid::new_v4());
            }
            state.permission_keys.insert(key, perm.id());
            state.permissions.insert(perm.id(), perm.clone());
            return Ok(PermissionChange::Inserted);
        };

        perm.set_uuid(id);
        let row = state
            .permissions
            .get_mut(&id)
            .ok_or_else(|| DictionaryError::CatalogInconsistency {
                kind: perm.descriptor_type(),
                id,
                context: "permission key index points at a missing row".to_string(),
            })?;

        let change = if grant {
            match row.or_permissions(perm) {
                0 => PermissionChange::Unchanged,
                changed => PermissionChange::Updated { changed },
            }
        } else {
            match row.remove_permissions(perm) {
                RevokeOutcome::Empty => {
                    state.remove_permission(id);
                    PermissionChange::Deleted
                }
                RevokeOutcome::Changed(0) => PermissionChange::Unchanged,
                RevokeOutcome::Changed(changed) => PermissionChange::Updated { changed },
            }
        };
        Ok(change)
    }

    fn add_stored_dependency(&self, dep: &Dependency) -> DictionaryResult<bool> {
        let mut state = self.state.write();
        if state.dependencies.contains(dep) {
            return Ok(false);
        }
        state.dependencies.push(dep.clone());
        Ok(true)
    }

    fn drop_stored_dependency(&self, dep: &Dependency) -> DictionaryResult<bool> {
        let mut state = self.state.write();
        let before = state.dependencies.len();
        state.dependencies.retain(|d| d != dep);
        Ok(state.dependencies.len() != before)
    }

    fn drop_dependents_stored_dependencies(&self, dependent_id: Uuid) -> DictionaryResult<usize> {
        let mut state = self.state.write();
        let before = state.dependencies.len();
        state
            .dependencies
            .retain(|d| d.dependent_id != dependent_id);
        Ok(before - state.dependencies.len())
    }

    fn stored_dependencies_for_dependent(
        &self,
        dependent_id: Uuid,
    ) -> DictionaryResult<Vec<Dependency>> {
        Ok(self
            .state
            .read()
            .dependencies
            .iter()
            .filter(|d| d.dependent_id == dependent_id)
            .cloned()
            .collect())
    }

    fn stored_dependencies_for_provider(
        &self,
        provider_id: Uuid,
    ) -> DictionaryResult<Vec<Dependency>> {
        Ok(self
            .state
            .read()
            .dependencies
            .iter()
            .filter(|d| d.provider_id == provider_id)
            .cloned()
            .collect())
    }

    fn all_stored_dependencies(&self) -> DictionaryResult<Vec<Dependency>> {
        Ok(self.state.read().dependencies.clone())
    }

    fn invalidate_stored_statement(&self, id: Uuid) -> DictionaryResult<()> {
        let mut state = self.state.write();
        let sps = state
            .statements
            .get_mut(&id)
            .ok_or(DictionaryError::ObjectNotFound {
                kind: DescriptorType::StoredStatement,
                id,
            })?;
        sps.valid = false;
        Ok(())
    }

    fn drop_view_descriptor(&self, id: Uuid) -> DictionaryResult<()> {
        let mut state = self.state.write();
        state.views.remove(&id).ok_or(DictionaryError::ObjectNotFound {
            kind: DescriptorType::View,
            id,
        })?;
        state.tables.remove(&id);
        Ok(())
    }

    fn drop_trigger_descriptor(&self, id: Uuid) -> DictionaryResult<()> {
        let mut state = self.state.write();
        let trigger = state
            .triggers
            .remove(&id)
            .ok_or(DictionaryError::ObjectNotFound {
                kind: DescriptorType::Trigger,
                id,
            })?;
        state.statements.remove(&trigger.action_sps_id);
        Ok(())
    }

    fn drop_constraint_descriptor(&self, id: Uuid) -> DictionaryResult<()> {
        let mut state = self.state.write();
        let cd = state
            .constraints
            .remove(&id)
            .ok_or(DictionaryError::ObjectNotFound {
                kind: DescriptorType::Constraint,
                id,
            })?;
        if let ConstraintKind::ForeignKey(fk) = &cd.kind {
            if let Some(target) = state.constraints.get_mut(&fk.referenced_constraint_id) {
                target.adjust_reference_count(false);
            }
        }
        Ok(())
    }
}
