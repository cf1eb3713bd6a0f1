//! Permission rows
//!
//! One closed enum covers every permission catalog: table, column, schema,
//! routine, generic (sequence/type/aggregate USAGE) and role rows. Equality and
//! hashing use the key subset only, so a new grant can find "the same row" and
//! merge into it even when the privilege payload differs.

use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

use super::privileges::{Privilege, PrivilegeSet};
use crate::catalog::{ColumnSet, DescriptorType, TupleDescriptor, UniqueTupleDescriptor};

/// Authorization id standing for every user
pub const PUBLIC: &str = "PUBLIC";

/// Object type tag of a generic permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericObjectType {
    Sequence,
    UserDefinedType,
    Aggregate,
}

impl GenericObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenericObjectType::Sequence => "SEQUENCE",
            GenericObjectType::UserDefinedType => "TYPE",
            GenericObjectType::Aggregate => "AGGREGATE",
        }
    }

    /// Parse a stored object type tag
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SEQUENCE" => Some(GenericObjectType::Sequence),
            "TYPE" => Some(GenericObjectType::UserDefinedType),
            "AGGREGATE" => Some(GenericObjectType::Aggregate),
            _ => None,
        }
    }
}

impl fmt::Display for GenericObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant payload of a permission row
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionKind {
    Table {
        table_id: Uuid,
        privileges: PrivilegeSet,
    },
    Column {
        table_id: Uuid,
        /// SELECT, UPDATE or REFERENCES
        privilege: Privilege,
        columns: ColumnSet,
        grantable: bool,
    },
    Schema {
        schema_id: Uuid,
        privileges: PrivilegeSet,
    },
    /// EXECUTE on a procedure or function
    Routine { routine_id: Uuid, grantable: bool },
    Generic {
        object_id: Uuid,
        object_type: GenericObjectType,
        privilege: String,
        grantable: bool,
    },
    Role {
        role_name: String,
        with_admin_option: bool,
        /// Definition row (CREATE ROLE) rather than a grant
        is_def: bool,
    },
}

/// Key subset of a permission row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionKey {
    Table {
        grantee: String,
        table_id: Uuid,
    },
    Column {
        grantee: String,
        table_id: Uuid,
        privilege: Privilege,
    },
    Schema {
        grantee: String,
        schema_id: Uuid,
    },
    Routine {
        grantee: String,
        routine_id: Uuid,
    },
    Generic {
        grantee: String,
        object_id: Uuid,
        object_type: GenericObjectType,
        privilege: String,
    },
    Role {
        grantee: String,
        role_name: String,
        is_def: bool,
    },
}

/// Result of subtracting a revoke from a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// Nothing remains; the row should be deleted
    Empty,
    /// Row still holds privileges; this many were removed
    Changed(usize),
}

/// A permission catalog row
#[derive(Debug, Clone)]
pub struct PermissionsDescriptor {
    uuid: Uuid,
    grantee: String,
    grantor: String,
    kind: PermissionKind,
}

impl PermissionsDescriptor {
    /// Create a row. The id stays nil until the dictionary stores it.
    pub fn new(grantee: impl Into<String>, grantor: impl Into<String>, kind: PermissionKind) -> Self {
        Self {
            uuid: Uuid::nil(),
            grantee: grantee.into(),
            grantor: grantor.into(),
            kind,
        }
    }

    pub fn table(
        table_id: Uuid,
        privileges: PrivilegeSet,
        grantee: impl Into<String>,
        grantor: impl Into<String>,
    ) -> Self {
        Self::new(grantee, grantor, PermissionKind::Table { table_id, privileges })
    }

    pub fn column(
        table_id: Uuid,
        privilege: Privilege,
        columns: ColumnSet,
        grantee: impl Into<String>,
        grantor: impl Into<String>,
    ) -> Self {
        debug_assert!(privilege.is_column_privilege());
        Self::new(
            grantee,
            grantor,
            PermissionKind::Column {
                table_id,
                privilege,
                columns,
                grantable: false,
            },
        )
    }

    pub fn schema(
        schema_id: Uuid,
        privileges: PrivilegeSet,
        grantee: impl Into<String>,
        grantor: impl Into<String>,
    ) -> Self {
        Self::new(grantee, grantor, PermissionKind::Schema { schema_id, privileges })
    }

    pub fn routine(routine_id: Uuid, grantee: impl Into<String>, grantor: impl Into<String>) -> Self {
        Self::new(
            grantee,
            grantor,
            PermissionKind::Routine {
                routine_id,
                grantable: false,
            },
        )
    }

    pub fn generic(
        object_id: Uuid,
        object_type: GenericObjectType,
        privilege: impl Into<String>,
        grantee: impl Into<String>,
        grantor: impl Into<String>,
    ) -> Self {
        Self::new(
            grantee,
            grantor,
            PermissionKind::Generic {
                object_id,
                object_type,
                privilege: privilege.into().to_ascii_uppercase(),
                grantable: false,
            },
        )
    }

    /// CREATE ROLE row. The creator is recorded as grantee.
    pub fn role_definition(role_name: impl Into<String>, creator: impl Into<String>) -> Self {
        Self::new(
            creator,
            crate::role::SYSTEM_GRANTOR,
            PermissionKind::Role {
                role_name: role_name.into(),
                with_admin_option: true,
                is_def: true,
            },
        )
    }

    /// GRANT role TO grantee row
    pub fn role_grant(
        role_name: impl Into<String>,
        grantee: impl Into<String>,
        grantor: impl Into<String>,
    ) -> Self {
        Self::new(
            grantee,
            grantor,
            PermissionKind::Role {
                role_name: role_name.into(),
                with_admin_option: false,
                is_def: false,
            },
        )
    }

    /// Mark the row grantable (WITH GRANT OPTION / WITH ADMIN OPTION)
    #[must_use]
    pub fn grantable(mut self) -> Self {
        match &mut self.kind {
            PermissionKind::Table { privileges, .. } | PermissionKind::Schema { privileges, .. } => {
                for p in privileges.privileges() {
                    privileges.set(p, super::privileges::Grant::Grantable);
                }
            }
            PermissionKind::Column { grantable, .. }
            | PermissionKind::Routine { grantable, .. }
            | PermissionKind::Generic { grantable, .. } => *grantable = true,
            PermissionKind::Role {
                with_admin_option, ..
            } => *with_admin_option = true,
        }
        self
    }

    /// Id; nil until stored
    pub fn id(&self) -> Uuid {
        self.uuid
    }

    /// Late binding of the id, done by the dictionary on insert
    pub fn set_uuid(&mut self, uuid: Uuid) {
        self.uuid = uuid;
    }

    pub fn grantee(&self) -> &str {
        &self.grantee
    }

    /// Re-target the row, used when probing for PUBLIC or role grants
    pub fn set_grantee(&mut self, grantee: impl Into<String>) {
        self.grantee = grantee.into();
    }

    pub fn grantor(&self) -> &str {
        &self.grantor
    }

    pub fn kind(&self) -> &PermissionKind {
        &self.kind
    }

    /// Set the admin option of a role row; no effect on other rows
    pub fn set_with_admin_option(&mut self, admin: bool) {
        if let PermissionKind::Role {
            with_admin_option, ..
        } = &mut self.kind
        {
            *with_admin_option = admin;
        }
    }

    /// Role name of a role row
    pub fn role_name(&self) -> Option<&str> {
        match &self.kind {
            PermissionKind::Role { role_name, .. } => Some(role_name),
            _ => None,
        }
    }

    /// Whether this is a CREATE ROLE row
    pub fn is_role_definition(&self) -> bool {
        matches!(self.kind, PermissionKind::Role { is_def: true, .. })
    }

    /// Id of the object the permission is on, for object rows
    pub fn object_id(&self) -> Option<Uuid> {
        match &self.kind {
            PermissionKind::Table { table_id, .. } | PermissionKind::Column { table_id, .. } => {
                Some(*table_id)
            }
            PermissionKind::Schema { schema_id, .. } => Some(*schema_id),
            PermissionKind::Routine { routine_id, .. } => Some(*routine_id),
            PermissionKind::Generic { object_id, .. } => Some(*object_id),
            PermissionKind::Role { .. } => None,
        }
    }

    /// Key subset used for equality and dictionary lookups
    pub fn key(&self) -> PermissionKey {
        let grantee = self.grantee.clone();
        match &self.kind {
            PermissionKind::Table { table_id, .. } => PermissionKey::Table {
                grantee,
                table_id: *table_id,
            },
            PermissionKind::Column {
                table_id,
                privilege,
                ..
            } => PermissionKey::Column {
                grantee,
                table_id: *table_id,
                privilege: *privilege,
            },
            PermissionKind::Schema { schema_id, .. } => PermissionKey::Schema {
                grantee,
                schema_id: *schema_id,
            },
            PermissionKind::Routine { routine_id, .. } => PermissionKey::Routine {
                grantee,
                routine_id: *routine_id,
            },
            PermissionKind::Generic {
                object_id,
                object_type,
                privilege,
                ..
            } => PermissionKey::Generic {
                grantee,
                object_id: *object_id,
                object_type: *object_type,
                privilege: privilege.clone(),
            },
            PermissionKind::Role {
                role_name, is_def, ..
            } => PermissionKey::Role {
                grantee,
                role_name: role_name.clone(),
                is_def: *is_def,
            },
        }
    }

    /// Full structural comparison, ignoring the id
    pub fn same_contents(&self, other: &PermissionsDescriptor) -> bool {
        self.grantee == other.grantee && self.grantor == other.grantor && self.kind == other.kind
    }

    /// Union a new grant into this row. Returns the number of privileges or
    /// columns that were not already held. Rows with different keys are left
    /// untouched.
    pub fn or_permissions(&mut self, other: &PermissionsDescriptor) -> usize {
        if self.key() != other.key() {
            debug_assert!(false, "or_permissions on rows with different keys");
            return 0;
        }
        match (&mut self.kind, &other.kind) {
            (
                PermissionKind::Table { privileges, .. },
                PermissionKind::Table {
                    privileges: added, ..
                },
            )
            | (
                PermissionKind::Schema { privileges, .. },
                PermissionKind::Schema {
                    privileges: added, ..
                },
            ) => privileges.union_with(added),
            (
                PermissionKind::Column {
                    columns, grantable, ..
                },
                PermissionKind::Column {
                    columns: added,
                    grantable: added_grantable,
                    ..
                },
            ) => {
                let upgraded = !*grantable && *added_grantable;
                *grantable |= *added_grantable;
                columns.union_with(added) + usize::from(upgraded)
            }
            (
                PermissionKind::Routine { grantable, .. },
                PermissionKind::Routine {
                    grantable: added, ..
                },
            )
            | (
                PermissionKind::Generic { grantable, .. },
                PermissionKind::Generic {
                    grantable: added, ..
                },
            )
            | (
                PermissionKind::Role {
                    with_admin_option: grantable,
                    ..
                },
                PermissionKind::Role {
                    with_admin_option: added,
                    ..
                },
            ) => {
                let upgraded = !*grantable && *added;
                *grantable |= *added;
                usize::from(upgraded)
            }
            _ => 0,
        }
    }

    /// Subtract a revoke from this row
    ///
    /// Routine, generic and role rows carry a single privilege, so a revoke
    /// always empties them.
    pub fn remove_permissions(&mut self, other: &PermissionsDescriptor) -> RevokeOutcome {
        if self.key() != other.key() {
            debug_assert!(false, "remove_permissions on rows with different keys");
            return RevokeOutcome::Changed(0);
        }
        match (&mut self.kind, &other.kind) {
            (
                PermissionKind::Table { privileges, .. },
                PermissionKind::Table {
                    privileges: revoked,
                    ..
                },
            )
            | (
                PermissionKind::Schema { privileges, .. },
                PermissionKind::Schema {
                    privileges: revoked,
                    ..
                },
            ) => {
                let removed = privileges.subtract(revoked);
                if privileges.is_empty() {
                    RevokeOutcome::Empty
                } else {
                    RevokeOutcome::Changed(removed)
                }
            }
            (
                PermissionKind::Column { columns, .. },
                PermissionKind::Column {
                    columns: revoked, ..
                },
            ) => {
                let removed = columns.subtract(revoked);
                if columns.is_empty() {
                    RevokeOutcome::Empty
                } else {
                    RevokeOutcome::Changed(removed)
                }
            }
            _ => RevokeOutcome::Empty,
        }
    }
}

impl PartialEq for PermissionsDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PermissionsDescriptor {}

impl Hash for PermissionsDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl TupleDescriptor for PermissionsDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        match self.kind {
            PermissionKind::Table { .. } => DescriptorType::TablePermission,
            PermissionKind::Column { .. } => DescriptorType::ColumnPermission,
            PermissionKind::Schema { .. } => DescriptorType::SchemaPermission,
            PermissionKind::Routine { .. } => DescriptorType::RoutinePermission,
            PermissionKind::Generic { .. } => DescriptorType::GenericPermission,
            PermissionKind::Role { .. } => DescriptorType::Role,
        }
    }

    fn descriptor_name(&self) -> String {
        match &self.kind {
            PermissionKind::Table { table_id, .. } => {
                format!("table privilege on {} to {}", table_id, self.grantee)
            }
            PermissionKind::Column {
                table_id,
                privilege,
                columns,
                ..
            } => format!(
                "{} privilege on {} columns {} to {}",
                privilege, table_id, columns, self.grantee
            ),
            PermissionKind::Schema { schema_id, .. } => {
                format!("schema privilege on {} to {}", schema_id, self.grantee)
            }
            PermissionKind::Routine { routine_id, .. } => {
                format!("EXECUTE privilege on {} to {}", routine_id, self.grantee)
            }
            PermissionKind::Generic {
                object_id,
                object_type,
                privilege,
                ..
            } => format!(
                "{} privilege on {} {} to {}",
                privilege, object_type, object_id, self.grantee
            ),
            PermissionKind::Role { role_name, .. } => role_name.clone(),
        }
    }
}

impl UniqueTupleDescriptor for PermissionsDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::privileges::Grant;

    #[test]
    fn test_key_equality_ignores_payload() {
        let table = Uuid::new_v4();
        let a = PermissionsDescriptor::column(
            table,
            Privilege::Select,
            ColumnSet::from_positions([1, 3]),
            "bob",
            "alice",
        );
        let b = PermissionsDescriptor::column(
            table,
            Privilege::Select,
            ColumnSet::from_positions([4]),
            "bob",
            "carol",
        );
        let c = PermissionsDescriptor::column(
            table,
            Privilege::Update,
            ColumnSet::from_positions([4]),
            "bob",
            "carol",
        );
        assert_eq!(a, b);
        assert!(!a.same_contents(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn test_column_merge_counts_new_columns() {
        let table = Uuid::new_v4();
        let mut row = PermissionsDescriptor::column(
            table,
            Privilege::Select,
            ColumnSet::from_positions([1, 3]),
            "bob",
            "alice",
        );
        let grant = PermissionsDescriptor::column(
            table,
            Privilege::Select,
            ColumnSet::from_positions([3, 4]),
            "bob",
            "alice",
        );
        assert_eq!(row.or_permissions(&grant), 1);
        assert_eq!(row.or_permissions(&grant), 0);
        match row.kind() {
            PermissionKind::Column { columns, .. } => {
                assert_eq!(columns, &ColumnSet::from_positions([1, 3, 4]))
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_or_then_remove_restores_row() {
        let table = Uuid::new_v4();
        let original = PermissionsDescriptor::table(
            table,
            PrivilegeSet::of(&[Privilege::Select]),
            "bob",
            "alice",
        );
        let grant = PermissionsDescriptor::table(
            table,
            PrivilegeSet::of(&[Privilege::Insert, Privilege::Delete]),
            "bob",
            "alice",
        );
        let mut row = original.clone();
        assert_eq!(row.or_permissions(&grant), 2);
        assert_eq!(row.remove_permissions(&grant), RevokeOutcome::Changed(2));
        assert!(row.same_contents(&original));
        assert_eq!(row.remove_permissions(&grant), RevokeOutcome::Changed(0));
        assert_eq!(row.remove_permissions(&original), RevokeOutcome::Empty);
    }

    #[test]
    fn test_column_revoke_empties_row() {
        let table = Uuid::new_v4();
        let mut row = PermissionsDescriptor::column(
            table,
            Privilege::Update,
            ColumnSet::from_positions([2]),
            "bob",
            "alice",
        );
        let revoke = row.clone();
        assert_eq!(row.remove_permissions(&revoke), RevokeOutcome::Empty);
    }

    #[test]
    fn test_single_privilege_rows_always_empty_on_revoke() {
        let seq = Uuid::new_v4();
        let mut row =
            PermissionsDescriptor::generic(seq, GenericObjectType::Sequence, "USAGE", "bob", "alice");
        let revoke = row.clone();
        assert_eq!(row.remove_permissions(&revoke), RevokeOutcome::Empty);

        let mut grant = PermissionsDescriptor::role_grant("r1", "bob", "alice");
        let revoke = grant.clone();
        assert_eq!(grant.remove_permissions(&revoke), RevokeOutcome::Empty);
    }

    #[test]
    fn test_column_grant_option_upgrade_counts() {
        let table = Uuid::new_v4();
        let cols = ColumnSet::from_positions([1, 2]);
        let mut row =
            PermissionsDescriptor::column(table, Privilege::Select, cols.clone(), "bob", "alice");
        let with_option =
            PermissionsDescriptor::column(table, Privilege::Select, cols, "bob", "alice")
                .grantable();
        assert_eq!(row.or_permissions(&with_option), 1);
        assert_eq!(row.or_permissions(&with_option), 0);
        assert!(matches!(
            row.kind(),
            PermissionKind::Column {
                grantable: true,
                ..
            }
        ));
    }

    #[test]
    fn test_admin_option_upgrade() {
        let mut row = PermissionsDescriptor::role_grant("r1", "bob", "alice");
        let admin = PermissionsDescriptor::role_grant("r1", "bob", "alice").grantable();
        assert_eq!(row.or_permissions(&admin), 1);
        assert_eq!(row.or_permissions(&admin), 0);
        row.set_with_admin_option(false);
        assert!(matches!(
            row.kind(),
            PermissionKind::Role {
                with_admin_option: false,
                ..
            }
        ));
    }

    #[test]
    fn test_grantable_table_row() {
        let row = PermissionsDescriptor::table(
            Uuid::new_v4(),
            PrivilegeSet::of(&[Privilege::Select]),
            "bob",
            "alice",
        )
        .grantable();
        match row.kind() {
            PermissionKind::Table { privileges, .. } => {
                assert_eq!(privileges.get(Privilege::Select), Grant::Grantable)
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_descriptor_types() {
        let def = PermissionsDescriptor::role_definition("r1", "dbo");
        assert!(def.is_role_definition());
        assert_eq!(def.descriptor_type(), DescriptorType::Role);
        assert_eq!(def.descriptor_name(), "r1");
        assert_eq!(def.role_name(), Some("r1"));
        assert!(def.object_id().is_none());
        assert!(def.id().is_nil());
    }
}
