//! Dependency capabilities of catalog descriptors
//!
//! Views, triggers and constraints react to a provider change by its
//! disposition: ignore it, get dropped with it (cascade), or refuse it
//! (restrict). Stored prepared statements are only marked for recompilation.

use uuid::Uuid;

use super::{
    Dependable, DependableClass, DependableFinder, DependencyError, DependencyResult, Dependent,
    Disposition, InvalidationAction, InvalidationContext, Provider, ProviderInfo,
};
use crate::catalog::{
    AliasDescriptor, ColumnSet, FileInfoDescriptor, IndexDescriptor, SchemaDescriptor,
    SequenceDescriptor, SpsDescriptor, TableDescriptor, TriggerDescriptor, TupleDescriptor,
    ViewDescriptor,
};
use crate::constraint::ConstraintDescriptor;
use crate::permission::{PermissionKind, PermissionsDescriptor, RequiredPermDescriptor};

macro_rules! plain_provider {
    ($ty:ty, $finder:expr) => {
        impl Dependable for $ty {
            fn object_id(&self) -> Uuid {
                self.uuid
            }

            fn dependable_finder(&self) -> DependableFinder {
                $finder
            }

            fn object_name(&self) -> String {
                self.name.clone()
            }
        }

        impl Provider for $ty {}
    };
}

plain_provider!(IndexDescriptor, DependableFinder::Index);
plain_provider!(SchemaDescriptor, DependableFinder::Schema);
plain_provider!(SequenceDescriptor, DependableFinder::Sequence);
plain_provider!(AliasDescriptor, DependableFinder::Alias);
plain_provider!(FileInfoDescriptor, DependableFinder::File);
plain_provider!(ViewDescriptor, DependableFinder::View);
plain_provider!(TriggerDescriptor, DependableFinder::Trigger);
plain_provider!(SpsDescriptor, DependableFinder::StoredStatement);
plain_provider!(ConstraintDescriptor, DependableFinder::Constraint);

impl Dependable for TableDescriptor {
    fn object_id(&self) -> Uuid {
        self.uuid
    }

    fn dependable_finder(&self) -> DependableFinder {
        match self.referenced_columns() {
            Some(columns) => DependableFinder::Columns {
                columns: columns.clone(),
            },
            None => DependableFinder::Table,
        }
    }

    fn object_name(&self) -> String {
        self.name.clone()
    }
}

impl Provider for TableDescriptor {
    fn provider_columns(&self) -> Option<&ColumnSet> {
        self.referenced_columns()
    }
}

impl Dependable for PermissionsDescriptor {
    fn object_id(&self) -> Uuid {
        self.id()
    }

    fn dependable_finder(&self) -> DependableFinder {
        match self.kind() {
            PermissionKind::Role { is_def: true, .. } => DependableFinder::RoleDefinition,
            PermissionKind::Role { .. } => DependableFinder::RoleGrant,
            PermissionKind::Column { columns, .. } => DependableFinder::Permission {
                columns: Some(columns.clone()),
            },
            _ => DependableFinder::Permission { columns: None },
        }
    }

    fn object_name(&self) -> String {
        self.descriptor_name()
    }
}

impl Provider for PermissionsDescriptor {
    fn provider_columns(&self) -> Option<&ColumnSet> {
        match self.kind() {
            PermissionKind::Column { columns, .. } => Some(columns),
            _ => None,
        }
    }
}

impl Dependable for RequiredPermDescriptor {
    fn object_id(&self) -> Uuid {
        self.permission_id
    }

    fn dependable_finder(&self) -> DependableFinder {
        DependableFinder::Permission {
            columns: self.columns.clone(),
        }
    }

    fn object_name(&self) -> String {
        self.name().to_string()
    }
}

impl Provider for RequiredPermDescriptor {
    fn provider_columns(&self) -> Option<&ColumnSet> {
        self.columns.as_ref()
    }
}

fn restrict(
    provider: &ProviderInfo,
    action: InvalidationAction,
    dependent_class: DependableClass,
    dependent_name: &str,
) -> DependencyResult<()> {
    if action.disposition() == Disposition::Restrict {
        return Err(DependencyError::Restrict {
            action,
            provider_class: provider.class_type(),
            provider_name: provider.name.clone(),
            dependent_class,
            dependent_name: dependent_name.to_string(),
        });
    }
    Ok(())
}

/// Action raised against the dependents of an object dropped by cascade
fn cascaded(action: InvalidationAction, drop: InvalidationAction) -> InvalidationAction {
    match action {
        InvalidationAction::RevokePrivilege | InvalidationAction::RevokeRole => action,
        _ => drop,
    }
}

impl Dependent for ViewDescriptor {
    fn is_valid(&self) -> bool {
        true
    }

    fn prepare_to_invalidate(
        &self,
        provider: &ProviderInfo,
        action: InvalidationAction,
        _cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        restrict(provider, action, DependableClass::View, &self.name)
    }

    fn make_invalid(
        &self,
        action: InvalidationAction,
        cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        if action.disposition() != Disposition::Cascade {
            return Ok(());
        }
        cx.manager
            .invalidate_for(self, cascaded(action, InvalidationAction::DropViewCascade))?;
        cx.dictionary.drop_view_descriptor(self.uuid)?;
        cx.manager.clear_dependencies(self)?;
        Ok(())
    }
}

impl Dependent for ConstraintDescriptor {
    fn is_valid(&self) -> bool {
        true
    }

    fn prepare_to_invalidate(
        &self,
        provider: &ProviderInfo,
        action: InvalidationAction,
        _cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        restrict(provider, action, DependableClass::Constraint, &self.name)
    }

    fn make_invalid(
        &self,
        action: InvalidationAction,
        cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        if action.disposition() != Disposition::Cascade {
            return Ok(());
        }
        cx.manager
            .invalidate_for(self, cascaded(action, InvalidationAction::DropConstraint))?;
        cx.dictionary.drop_constraint_descriptor(self.uuid)?;
        cx.manager.clear_dependencies(self)?;
        Ok(())
    }
}

impl Dependent for TriggerDescriptor {
    fn is_valid(&self) -> bool {
        true
    }

    fn prepare_to_invalidate(
        &self,
        provider: &ProviderInfo,
        action: InvalidationAction,
        _cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        restrict(provider, action, DependableClass::Trigger, &self.name)
    }

    /// Cascade drops the trigger; anything else recompiles its action
    fn make_invalid(
        &self,
        action: InvalidationAction,
        cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        match action.disposition() {
            Disposition::Cascade => {
                cx.manager
                    .invalidate_for(self, cascaded(action, InvalidationAction::DropTrigger))?;
                cx.dictionary.drop_trigger_descriptor(self.uuid)?;
                cx.manager.clear_dependencies(self)?;
            }
            Disposition::Ignore => cx.dictionary.invalidate_stored_statement(self.action_sps_id)?,
            Disposition::Restrict => {}
        }
        Ok(())
    }
}

impl Dependent for SpsDescriptor {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn prepare_to_invalidate(
        &self,
        _provider: &ProviderInfo,
        _action: InvalidationAction,
        _cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        Ok(())
    }

    fn make_invalid(
        &self,
        _action: InvalidationAction,
        cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        cx.dictionary.invalidate_stored_statement(self.uuid)?;
        Ok(())
    }
}
