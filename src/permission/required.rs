//! Permission requirements recorded by compiled operators

use uuid::Uuid;

use super::descriptor::{PermissionKind, PermissionsDescriptor};
use super::privileges::Privilege;
use crate::catalog::{ColumnSet, DescriptorType, TupleDescriptor};

/// The permission row a view, trigger or constraint relied on when it was
/// compiled, narrowed to the columns it actually used
///
/// Never stored as a catalog row of its own. It is the provider side of the
/// operator's dependency on the permission, and its column set is what a
/// column revoke is intersected with.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredPermDescriptor {
    /// Id of the stored permission row
    pub permission_id: Uuid,
    pub permission_type: DescriptorType,
    pub privilege: Option<Privilege>,
    /// Columns required; `None` for non-column permissions
    pub columns: Option<ColumnSet>,
    name: String,
}

impl RequiredPermDescriptor {
    /// Requirement satisfied by `perm`, restricted to `columns` for column rows
    ///
    /// An empty column list depends on every column the row grants.
    pub fn new(perm: &PermissionsDescriptor, columns: Option<ColumnSet>) -> Self {
        let (privilege, columns) = match perm.kind() {
            PermissionKind::Column {
                privilege,
                columns: granted,
                ..
            } => {
                // An empty requirement (COUNT(*)) leans on the whole row
                let required = match columns {
                    Some(cols) if !cols.is_empty() => cols.intersection(granted),
                    _ => granted.clone(),
                };
                (Some(*privilege), Some(required))
            }
            PermissionKind::Routine { .. } => (Some(Privilege::Execute), None),
            PermissionKind::Generic { privilege, .. } => (Privilege::parse(privilege), None),
            _ => (None, None),
        };
        Self {
            permission_id: perm.id(),
            permission_type: perm.descriptor_type(),
            privilege,
            columns,
            name: perm.descriptor_name(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_requirement_narrowed_to_granted() {
        let mut perm = PermissionsDescriptor::column(
            Uuid::new_v4(),
            Privilege::Select,
            ColumnSet::from_positions([1, 2, 3]),
            "bob",
            "alice",
        );
        let id = Uuid::new_v4();
        perm.set_uuid(id);
        let req = RequiredPermDescriptor::new(&perm, Some(ColumnSet::from_positions([2, 7])));
        assert_eq!(req.permission_id, id);
        assert_eq!(req.permission_type, DescriptorType::ColumnPermission);
        assert_eq!(req.privilege, Some(Privilege::Select));
        assert_eq!(req.columns, Some(ColumnSet::from_positions([2])));
    }

    #[test]
    fn test_empty_column_requirement_takes_granted_columns() {
        let perm = PermissionsDescriptor::column(
            Uuid::new_v4(),
            Privilege::Select,
            ColumnSet::from_positions([1, 3]),
            "bob",
            "alice",
        );
        let req = RequiredPermDescriptor::new(&perm, Some(ColumnSet::new()));
        assert_eq!(req.columns, Some(ColumnSet::from_positions([1, 3])));
    }

    #[test]
    fn test_routine_requirement() {
        let perm = PermissionsDescriptor::routine(Uuid::new_v4(), "bob", "alice");
        let req = RequiredPermDescriptor::new(&perm, None);
        assert_eq!(req.privilege, Some(Privilege::Execute));
        assert!(req.columns.is_none());
        assert!(req.name().contains("EXECUTE"));
    }
}
