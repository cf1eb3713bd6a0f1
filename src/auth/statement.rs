//! Statement permissions and the authorizer
//!
//! Compilation produces a list of `StatementPermission`s. `Authorizer::authorize`
//! checks them against the session user; `store_dependencies_on_privileges`
//! records which permission rows and role definitions a persistent object
//! (view, trigger, constraint) was compiled under, so that a later revoke
//! invalidates it.
//!
//! A requirement is met by, in order: ownership of the object's schema, a
//! grant to the user, a grant to PUBLIC, or a grant to any role in the closure
//! of the session's current role.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::config::AuthorizationConfig;
use super::error::{AuthError, AuthResult};
use super::session::SessionContext;
use crate::catalog::{
    AliasDescriptor, ColumnSet, DescriptorType, TableDescriptor, UniqueSqlObjectDescriptor,
};
use crate::depend::{Dependable, DependencyManager, Dependent};
use crate::dictionary::{DataDictionary, DictionaryError};
use crate::permission::{
    GenericObjectType, PermissionKind, PermissionsDescriptor, Privilege, RequiredPermDescriptor,
    PUBLIC,
};
use crate::role::RoleClosureIterator;

/// A privilege a statement needs
#[derive(Debug, Clone, PartialEq)]
pub enum StatementPermission {
    Table {
        table_id: Uuid,
        privilege: Privilege,
    },
    /// Column privilege. An empty column set with SELECT is met by any
    /// column grant (e.g. `SELECT COUNT(*)`).
    Column {
        table_id: Uuid,
        privilege: Privilege,
        columns: ColumnSet,
    },
    /// CREATE, MODIFY or DROP in a schema. `authorization_id` is the owner
    /// named by CREATE SCHEMA ... AUTHORIZATION.
    Schema {
        schema_name: String,
        authorization_id: Option<String>,
        privilege: Privilege,
    },
    /// EXECUTE on a procedure or function
    Routine { routine_id: Uuid },
    Generic {
        object_id: Uuid,
        object_type: GenericObjectType,
        privilege: String,
    },
    /// CREATE ROLE / DROP ROLE
    Role {
        role_name: String,
        privilege: Privilege,
    },
}

/// What a permission check may consult
pub struct AuthorizationContext<'a> {
    pub dictionary: &'a dyn DataDictionary,
    pub dependencies: &'a DependencyManager,
    pub session: &'a SessionContext,
    pub config: &'a AuthorizationConfig,
    /// Statement being compiled. A privilege found through a role records a
    /// dependency of this statement on the current role's definition.
    pub dependent: Option<&'a Arc<dyn Dependent>>,
}

impl AuthorizationContext<'_> {
    /// The session's current role, if it is still granted to the session user
    /// or PUBLIC
    pub fn current_role(&self) -> AuthResult<Option<String>> {
        let Some(role) = self.session.current_role.as_deref() else {
            return Ok(None);
        };
        if self.dictionary.role_definition(role)?.is_none() {
            warn!(role, connection = self.session.connection_id, "current role no longer exists");
            return Ok(None);
        }
        let user = self.session.authorization_id.as_str();
        if self.config.is_database_owner(user)
            || self.dictionary.role_grant(role, user)?.is_some()
            || self.dictionary.role_grant(role, PUBLIC)?.is_some()
        {
            return Ok(Some(role.to_string()));
        }
        warn!(
            role,
            user,
            connection = self.session.connection_id,
            txn = ?self.session.current_txn,
            "current role no longer granted, ignoring it"
        );
        Ok(None)
    }

    /// Walk the closure of the current role until `holds` accepts a role
    ///
    /// On success the statement being compiled is made dependent on the
    /// current role's definition.
    fn through_roles<F>(&self, mut holds: F) -> AuthResult<bool>
    where
        F: FnMut(&str) -> AuthResult<bool>,
    {
        let Some(current) = self.current_role()? else {
            return Ok(false);
        };
        for role in RoleClosureIterator::inverse(self.dictionary, current.as_str()) {
            let role = role?;
            if holds(&role)? {
                debug!(role = %role, current = %current, "privilege found through role");
                self.record_role_dependency(&current)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn record_role_dependency(&self, role: &str) -> AuthResult<()> {
        let Some(dependent) = self.dependent else {
            return Ok(());
        };
        if let Some(definition) = self.dictionary.role_definition(role)? {
            self.dependencies.add_dependency(dependent, &definition)?;
        }
        Ok(())
    }
}

/// Progress towards meeting one requirement from several grant rows
struct Coverage {
    /// Columns still uncovered; `None` for non-column requirements
    remaining: Option<ColumnSet>,
    met: bool,
}

impl Coverage {
    fn new(perm: &StatementPermission) -> Self {
        Self {
            remaining: perm.columns().cloned(),
            met: false,
        }
    }

    /// Apply a row. Returns whether it contributed anything.
    fn take(&mut self, row: &PermissionsDescriptor) -> bool {
        if self.met {
            return false;
        }
        match (row.kind(), self.remaining.as_mut()) {
            (PermissionKind::Column { columns, .. }, Some(remaining)) => {
                if remaining.is_empty() {
                    self.met = !columns.is_empty();
                    return self.met;
                }
                if !remaining.intersects(columns) {
                    return false;
                }
                remaining.subtract(columns);
                self.met = remaining.is_empty();
                true
            }
            _ => {
                self.met = true;
                true
            }
        }
    }
}

impl StatementPermission {
    /// Columns required, for column permissions
    pub fn columns(&self) -> Option<&ColumnSet> {
        match self {
            StatementPermission::Column { columns, .. } => Some(columns),
            _ => None,
        }
    }

    /// Check that `principal` holds this permission
    ///
    /// With `for_grant` the grant must carry the grant option. The database
    /// owner is not special-cased here except for role administration; the
    /// `Authorizer` short-circuits it.
    pub fn check(
        &self,
        principal: &str,
        for_grant: bool,
        cx: &AuthorizationContext<'_>,
    ) -> AuthResult<()> {
        match self {
            StatementPermission::Schema {
                schema_name,
                authorization_id,
                privilege,
            } => self.check_schema(principal, schema_name, authorization_id.as_deref(), *privilege, cx),
            StatementPermission::Role {
                role_name,
                privilege,
            } => {
                if cx.config.is_database_owner(principal) {
                    return Ok(());
                }
                Err(AuthError::RoleOperationDenied {
                    principal: principal.to_string(),
                    operation: format!("{} ROLE", privilege),
                    role: role_name.clone(),
                })
            }
            _ => self.check_object(principal, for_grant, cx),
        }
    }

    fn check_schema(
        &self,
        principal: &str,
        schema_name: &str,
        authorization_id: Option<&str>,
        privilege: Privilege,
        cx: &AuthorizationContext<'_>,
    ) -> AuthResult<()> {
        debug_assert!(privilege.is_schema_privilege());
        if privilege == Privilege::Create {
            // Only your own schema, owned by yourself
            if schema_name != principal || authorization_id.is_some_and(|a| a != principal) {
                return Err(AuthError::SchemaCreateDenied {
                    principal: principal.to_string(),
                    schema: schema_name.to_string(),
                });
            }
            return Ok(());
        }
        match cx.dictionary.schema_by_name(schema_name)? {
            // Not created yet
            None => Ok(()),
            Some(schema) if schema.is_owned_by(principal) => Ok(()),
            Some(_) => Err(AuthError::SchemaOwnerRequired {
                principal: principal.to_string(),
                schema: schema_name.to_string(),
            }),
        }
    }

    fn check_object(
        &self,
        principal: &str,
        for_grant: bool,
        cx: &AuthorizationContext<'_>,
    ) -> AuthResult<()> {
        self.ensure_supported()?;
        let dd = cx.dictionary;
        if self.owner(dd)?.as_deref() == Some(principal) {
            return Ok(());
        }

        let mut coverage = Coverage::new(self);
        for grantee in [principal, PUBLIC] {
            for row in self.rows_for(grantee, for_grant, dd)? {
                coverage.take(&row);
            }
        }
        if !coverage.met {
            cx.through_roles(|role| {
                for row in self.rows_for(role, for_grant, dd)? {
                    coverage.take(&row);
                }
                Ok(coverage.met)
            })?;
        }
        if coverage.met {
            return Ok(());
        }
        Err(self.denied(principal, &coverage, dd)?)
    }

    /// Generic permissions exist only for USAGE
    fn ensure_supported(&self) -> AuthResult<()> {
        if let StatementPermission::Generic {
            object_type,
            privilege,
            ..
        } = self
        {
            if !privilege.eq_ignore_ascii_case(Privilege::Usage.to_str()) {
                return Err(AuthError::Unimplemented {
                    privilege: privilege.clone(),
                    object_type: *object_type,
                });
            }
        }
        Ok(())
    }

    fn load_table(table_id: Uuid, dd: &dyn DataDictionary) -> AuthResult<TableDescriptor> {
        Ok(dd
            .table_descriptor(table_id)?
            .ok_or(DictionaryError::ObjectNotFound {
                kind: DescriptorType::Table,
                id: table_id,
            })?)
    }

    /// Owner of the schema holding the object; `None` for role permissions
    /// and for schemas not created yet
    fn owner(&self, dd: &dyn DataDictionary) -> AuthResult<Option<String>> {
        let schema = match self {
            StatementPermission::Table { table_id, .. }
            | StatementPermission::Column { table_id, .. } => {
                Self::load_table(*table_id, dd)?.schema_descriptor(dd)?
            }
            StatementPermission::Routine { routine_id } => {
                self.alias(*routine_id, dd)?.schema_descriptor(dd)?
            }
            StatementPermission::Generic {
                object_id,
                object_type: GenericObjectType::Sequence,
                ..
            } => dd
                .sequence_descriptor(*object_id)?
                .ok_or(DictionaryError::ObjectNotFound {
                    kind: DescriptorType::Sequence,
                    id: *object_id,
                })?
                .schema_descriptor(dd)?,
            StatementPermission::Generic { object_id, .. } => {
                self.alias(*object_id, dd)?.schema_descriptor(dd)?
            }
            StatementPermission::Schema { schema_name, .. } => {
                return Ok(dd.schema_by_name(schema_name)?.map(|s| s.authorization_id))
            }
            StatementPermission::Role { .. } => return Ok(None),
        };
        Ok(Some(schema.authorization_id))
    }

    fn alias(
        &self,
        id: Uuid,
        dd: &dyn DataDictionary,
    ) -> AuthResult<AliasDescriptor> {
        Ok(dd.alias_descriptor(id)?.ok_or(DictionaryError::ObjectNotFound {
            kind: DescriptorType::Alias,
            id,
        })?)
    }

    /// Rows held by exactly `grantee` that contribute to this requirement
    fn rows_for(
        &self,
        grantee: &str,
        for_grant: bool,
        dd: &dyn DataDictionary,
    ) -> AuthResult<Vec<PermissionsDescriptor>> {
        let row = match self {
            StatementPermission::Table {
                table_id,
                privilege,
            } => table_row(dd, *table_id, *privilege, grantee, for_grant)?,
            StatementPermission::Column {
                table_id,
                privilege,
                columns,
            } => match table_row(dd, *table_id, *privilege, grantee, for_grant)? {
                Some(row) => Some(row),
                None => dd
                    .column_permissions(*table_id, *privilege, grantee)?
                    .filter(|row| match row.kind() {
                        PermissionKind::Column {
                            columns: granted,
                            grantable,
                            ..
                        } => {
                            (!for_grant || *grantable)
                                && if columns.is_empty() {
                                    !granted.is_empty()
                                } else {
                                    granted.intersects(columns)
                                }
                        }
                        _ => false,
                    }),
            },
            StatementPermission::Schema {
                schema_name,
                privilege,
                ..
            } => match dd.schema_by_name(schema_name)? {
                Some(schema) => dd
                    .schema_permissions(schema.uuid, grantee)?
                    .filter(|row| match row.kind() {
                        PermissionKind::Schema { privileges, .. } => {
                            privileges.allows(*privilege, for_grant)
                        }
                        _ => false,
                    }),
                None => None,
            },
            StatementPermission::Routine { routine_id } => dd
                .routine_permissions(*routine_id, grantee)?
                .filter(|row| !for_grant || grantable(row)),
            StatementPermission::Generic {
                object_id,
                object_type,
                privilege,
            } => dd
                .generic_permissions(
                    *object_id,
                    *object_type,
                    &privilege.to_ascii_uppercase(),
                    grantee,
                )?
                .filter(|row| !for_grant || grantable(row)),
            StatementPermission::Role { .. } => None,
        };
        Ok(row.into_iter().collect())
    }

    /// Whether `perm` is the kind of row that could satisfy this requirement
    pub fn is_correct_permission(&self, perm: &PermissionsDescriptor) -> bool {
        match (self, perm.kind()) {
            (
                StatementPermission::Table {
                    table_id,
                    privilege,
                },
                PermissionKind::Table {
                    table_id: id,
                    privileges,
                },
            ) => table_id == id && privileges.allows(*privilege, false),
            (
                StatementPermission::Column {
                    table_id,
                    privilege,
                    ..
                },
                PermissionKind::Column {
                    table_id: id,
                    privilege: p,
                    ..
                },
            ) => table_id == id && privilege == p,
            (
                StatementPermission::Routine { routine_id },
                PermissionKind::Routine { routine_id: id, .. },
            ) => routine_id == id,
            (
                StatementPermission::Generic {
                    object_id,
                    object_type,
                    privilege,
                },
                PermissionKind::Generic {
                    object_id: id,
                    object_type: ty,
                    privilege: p,
                    ..
                },
            ) => object_id == id && object_type == ty && privilege.eq_ignore_ascii_case(p),
            (
                StatementPermission::Role { role_name, .. },
                PermissionKind::Role {
                    role_name: name,
                    is_def: true,
                    ..
                },
            ) => role_name == name,
            _ => false,
        }
    }

    /// The stored grant that satisfies this requirement for `grantee`,
    /// falling back to PUBLIC
    pub fn permission_descriptor(
        &self,
        grantee: &str,
        dd: &dyn DataDictionary,
    ) -> AuthResult<Option<PermissionsDescriptor>> {
        for who in [grantee, PUBLIC] {
            if let Some(row) = self.rows_for(who, false, dd)?.into_iter().next() {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn denied(
        &self,
        principal: &str,
        coverage: &Coverage,
        dd: &dyn DataDictionary,
    ) -> AuthResult<AuthError> {
        let principal = principal.to_string();
        let err = match self {
            StatementPermission::Table {
                table_id,
                privilege,
            } => AuthError::TablePermissionDenied {
                principal,
                privilege: *privilege,
                table: Self::load_table(*table_id, dd)?.qualified_name(dd)?,
            },
            StatementPermission::Column {
                table_id,
                privilege,
                ..
            } => {
                let table = Self::load_table(*table_id, dd)?;
                let first = coverage
                    .remaining
                    .as_ref()
                    .and_then(|cols| cols.iter().next());
                match first {
                    Some(position) => AuthError::ColumnPermissionDenied {
                        principal,
                        privilege: *privilege,
                        column: table
                            .column_at(position)
                            .map(|c| c.name.clone())
                            .unwrap_or_else(|| position.to_string()),
                        table: table.qualified_name(dd)?,
                    },
                    None => AuthError::TablePermissionDenied {
                        principal,
                        privilege: *privilege,
                        table: table.qualified_name(dd)?,
                    },
                }
            }
            StatementPermission::Routine { routine_id } => AuthError::RoutinePermissionDenied {
                principal,
                routine: self.alias(*routine_id, dd)?.qualified_name(dd)?,
            },
            StatementPermission::Generic {
                object_id,
                object_type,
                privilege,
            } => {
                let object = match object_type {
                    GenericObjectType::Sequence => match dd.sequence_descriptor(*object_id)? {
                        Some(seq) => seq.qualified_name(dd)?,
                        None => object_id.to_string(),
                    },
                    _ => self.alias(*object_id, dd)?.qualified_name(dd)?,
                };
                AuthError::GenericPermissionDenied {
                    principal,
                    privilege: privilege.clone(),
                    object_type: *object_type,
                    object,
                }
            }
            StatementPermission::Schema { schema_name, .. } => AuthError::SchemaOwnerRequired {
                principal,
                schema: schema_name.clone(),
            },
            StatementPermission::Role {
                role_name,
                privilege,
            } => AuthError::RoleOperationDenied {
                principal,
                operation: format!("{} ROLE", privilege),
                role: role_name.clone(),
            },
        };
        Ok(err)
    }
}

fn table_row(
    dd: &dyn DataDictionary,
    table_id: Uuid,
    privilege: Privilege,
    grantee: &str,
    for_grant: bool,
) -> AuthResult<Option<PermissionsDescriptor>> {
    Ok(dd
        .table_permissions(table_id, grantee)?
        .filter(|row| match row.kind() {
            PermissionKind::Table { privileges, .. } => privileges.allows(privilege, for_grant),
            _ => false,
        }))
}

fn grantable(row: &PermissionsDescriptor) -> bool {
    matches!(
        row.kind(),
        PermissionKind::Routine {
            grantable: true,
            ..
        } | PermissionKind::Generic {
            grantable: true,
            ..
        }
    )
}

/// Checks statement permissions for sessions
pub struct Authorizer {
    dependencies: Arc<DependencyManager>,
    config: AuthorizationConfig,
}

impl Authorizer {
    pub fn new(dependencies: Arc<DependencyManager>, config: AuthorizationConfig) -> Self {
        Self {
            dependencies,
            config,
        }
    }

    pub fn config(&self) -> &AuthorizationConfig {
        &self.config
    }

    pub fn context<'a>(
        &'a self,
        session: &'a SessionContext,
        dependent: Option<&'a Arc<dyn Dependent>>,
    ) -> AuthorizationContext<'a> {
        AuthorizationContext {
            dictionary: self.dependencies.dictionary(),
            dependencies: &self.dependencies,
            session,
            config: &self.config,
            dependent,
        }
    }

    fn bypasses(&self, session: &SessionContext) -> bool {
        !self.config.sql_authorization || self.config.is_database_owner(&session.authorization_id)
    }

    /// Check every requirement in order; the first failure is returned
    ///
    /// `dependent` is the statement being compiled, if any.
    pub fn authorize(
        &self,
        session: &SessionContext,
        required: &[StatementPermission],
        for_grant: bool,
        dependent: Option<&Arc<dyn Dependent>>,
    ) -> AuthResult<()> {
        if self.bypasses(session) {
            return Ok(());
        }
        let cx = self.context(session, dependent);
        for perm in required {
            if let Err(e) = perm.check(&session.authorization_id, for_grant, &cx) {
                debug!(
                    user = %session.authorization_id,
                    connection = session.connection_id,
                    error = %e,
                    "permission check failed"
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Record that a persistent object depends on the grants it was compiled
    /// under
    ///
    /// For each requirement not met by ownership, the rows that meet it (user
    /// first, then PUBLIC, then roles) become providers through a
    /// `RequiredPermDescriptor`. Use of a role adds a dependency on the
    /// current role's definition. Returns the number of new edges.
    pub fn store_dependencies_on_privileges(
        &self,
        session: &SessionContext,
        dependent: &Arc<dyn Dependent>,
        required: &[StatementPermission],
    ) -> AuthResult<usize> {
        if self.bypasses(session) {
            return Ok(0);
        }
        let cx = self.context(session, Some(dependent));
        let dd = cx.dictionary;
        let user = session.authorization_id.as_str();
        let mut added = 0;

        for perm in required {
            if matches!(
                perm,
                StatementPermission::Schema { .. } | StatementPermission::Role { .. }
            ) {
                continue;
            }
            if perm.owner(dd)?.as_deref() == Some(user) {
                continue;
            }

            let mut coverage = Coverage::new(perm);
            for grantee in [user, PUBLIC] {
                for row in perm.rows_for(grantee, false, dd)? {
                    if coverage.take(&row) {
                        added += self.depend_on_row(dependent, perm, &row)?;
                    }
                }
            }
            if coverage.met {
                continue;
            }

            let Some(current) = cx.current_role()? else {
                warn!(dependent = %dependent.object_name(), "requirement not met by any grant");
                continue;
            };
            for role in RoleClosureIterator::inverse(dd, current.as_str()) {
                let role = role?;
                for row in perm.rows_for(&role, false, dd)? {
                    if coverage.take(&row) {
                        added += self.depend_on_row(dependent, perm, &row)?;
                    }
                }
                if coverage.met {
                    break;
                }
            }
            if let Some(definition) = dd.role_definition(&current)? {
                if self.dependencies.add_dependency(dependent, &definition)? {
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    fn depend_on_row(
        &self,
        dependent: &Arc<dyn Dependent>,
        perm: &StatementPermission,
        row: &PermissionsDescriptor,
    ) -> AuthResult<usize> {
        let required = RequiredPermDescriptor::new(row, perm.columns().cloned());
        Ok(usize::from(self.dependencies.add_dependency(dependent, &required)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDescriptor, DataType, SchemaDescriptor};
    use crate::dictionary::MemoryDictionary;
    use crate::permission::PrivilegeSet;

    struct Fixture {
        dd: Arc<MemoryDictionary>,
        authorizer: Authorizer,
        table: TableDescriptor,
    }

    fn fixture() -> Fixture {
        let dd = Arc::new(MemoryDictionary::new());
        let schema = SchemaDescriptor::new("ALICE", "alice");
        let table = TableDescriptor::new("T", schema.uuid)
            .column(ColumnDescriptor::new("C1", DataType::Int))
            .column(ColumnDescriptor::new("C2", DataType::Int))
            .column(ColumnDescriptor::new("C3", DataType::Int));
        dd.add_schema(schema).unwrap();
        dd.add_table(table.clone()).unwrap();
        let manager = Arc::new(DependencyManager::new(dd.clone()));
        let authorizer = Authorizer::new(manager, AuthorizationConfig::new("dbo"));
        Fixture {
            dd,
            authorizer,
            table,
        }
    }

    fn select(table: &TableDescriptor) -> StatementPermission {
        StatementPermission::Table {
            table_id: table.uuid,
            privilege: Privilege::Select,
        }
    }

    #[test]
    fn test_owner_and_dbo_pass() {
        let f = fixture();
        let perm = [select(&f.table)];
        f.authorizer
            .authorize(&SessionContext::new(1, "alice"), &perm, false, None)
            .unwrap();
        f.authorizer
            .authorize(&SessionContext::new(1, "dbo"), &perm, false, None)
            .unwrap();
        let err = f
            .authorizer
            .authorize(&SessionContext::new(1, "bob"), &perm, false, None)
            .unwrap_err();
        assert!(matches!(err, AuthError::TablePermissionDenied { .. }));
        assert!(err.to_string().contains("ALICE.T"));
    }

    #[test]
    fn test_disabled_authorization_passes() {
        let mut f = fixture();
        f.authorizer.config = f.authorizer.config.clone().with_sql_authorization(false);
        f.authorizer
            .authorize(&SessionContext::new(1, "bob"), &[select(&f.table)], false, None)
            .unwrap();
    }

    #[test]
    fn test_public_grant_and_grant_option() {
        let f = fixture();
        let mut grant = PermissionsDescriptor::table(
            f.table.uuid,
            PrivilegeSet::of(&[Privilege::Select]),
            PUBLIC,
            "alice",
        );
        f.dd.add_remove_permissions_descriptor(true, &mut grant).unwrap();

        let bob = SessionContext::new(1, "bob");
        f.authorizer
            .authorize(&bob, &[select(&f.table)], false, None)
            .unwrap();
        assert!(f
            .authorizer
            .authorize(&bob, &[select(&f.table)], true, None)
            .is_err());
    }

    #[test]
    fn test_column_union_names_first_missing_column() {
        let f = fixture();
        let mut public = PermissionsDescriptor::column(
            f.table.uuid,
            Privilege::Select,
            ColumnSet::from_positions([1]),
            PUBLIC,
            "alice",
        );
        let mut bob = PermissionsDescriptor::column(
            f.table.uuid,
            Privilege::Select,
            ColumnSet::from_positions([2]),
            "bob",
            "alice",
        );
        f.dd.add_remove_permissions_descriptor(true, &mut public).unwrap();
        f.dd.add_remove_permissions_descriptor(true, &mut bob).unwrap();

        let session = SessionContext::new(1, "bob");
        let need = |cols: &[usize]| StatementPermission::Column {
            table_id: f.table.uuid,
            privilege: Privilege::Select,
            columns: ColumnSet::from_positions(cols.iter().copied()),
        };
        f.authorizer
            .authorize(&session, &[need(&[1, 2])], false, None)
            .unwrap();
        f.authorizer
            .authorize(&session, &[need(&[])], false, None)
            .unwrap();
        match f
            .authorizer
            .authorize(&session, &[need(&[1, 2, 3])], false, None)
        {
            Err(AuthError::ColumnPermissionDenied { column, .. }) => assert_eq!(column, "C3"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_schema_rules() {
        let f = fixture();
        let cx_session = SessionContext::new(1, "bob");
        let cx = f.authorizer.context(&cx_session, None);

        let create_own = StatementPermission::Schema {
            schema_name: "bob".to_string(),
            authorization_id: None,
            privilege: Privilege::Create,
        };
        create_own.check("bob", false, &cx).unwrap();

        let create_for_other = StatementPermission::Schema {
            schema_name: "bob".to_string(),
            authorization_id: Some("carol".to_string()),
            privilege: Privilege::Create,
        };
        assert!(matches!(
            create_for_other.check("bob", false, &cx),
            Err(AuthError::SchemaCreateDenied { .. })
        ));

        let drop_alice = StatementPermission::Schema {
            schema_name: "ALICE".to_string(),
            authorization_id: None,
            privilege: Privilege::Drop,
        };
        assert!(matches!(
            drop_alice.check("bob", false, &cx),
            Err(AuthError::SchemaOwnerRequired { .. })
        ));
        drop_alice.check("alice", false, &cx).unwrap();

        let modify_missing = StatementPermission::Schema {
            schema_name: "NOPE".to_string(),
            authorization_id: None,
            privilege: Privilege::Modify,
        };
        modify_missing.check("bob", false, &cx).unwrap();
    }

    #[test]
    fn test_generic_non_usage_is_unimplemented() {
        let f = fixture();
        let session = SessionContext::new(1, "bob");
        let perm = StatementPermission::Generic {
            object_id: Uuid::new_v4(),
            object_type: GenericObjectType::Sequence,
            privilege: "SELECT".to_string(),
        };
        let err = f
            .authorizer
            .authorize(&session, &[perm], false, None)
            .unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::UnimplementedFeature);
    }

    #[test]
    fn test_role_permission_reserved_to_owner() {
        let f = fixture();
        let session = SessionContext::new(1, "bob");
        let cx = f.authorizer.context(&session, None);
        let perm = StatementPermission::Role {
            role_name: "r1".to_string(),
            privilege: Privilege::Create,
        };
        assert!(matches!(
            perm.check("bob", false, &cx),
            Err(AuthError::RoleOperationDenied { .. })
        ));
        perm.check("dbo", false, &cx).unwrap();
    }

    #[test]
    fn test_is_correct_permission() {
        let f = fixture();
        let row = PermissionsDescriptor::column(
            f.table.uuid,
            Privilege::Update,
            ColumnSet::from_positions([1]),
            "bob",
            "alice",
        );
        let update = StatementPermission::Column {
            table_id: f.table.uuid,
            privilege: Privilege::Update,
            columns: ColumnSet::from_positions([2]),
        };
        assert!(update.is_correct_permission(&row));
        assert!(!select(&f.table).is_correct_permission(&row));

        let seq = Uuid::new_v4();
        let usage = StatementPermission::Generic {
            object_id: seq,
            object_type: GenericObjectType::Sequence,
            privilege: "USAGE".to_string(),
        };
        let generic =
            PermissionsDescriptor::generic(seq, GenericObjectType::Sequence, "USAGE", "bob", "alice");
        assert!(usage.is_correct_permission(&generic));
        let other_type = PermissionsDescriptor::generic(
            seq,
            GenericObjectType::Aggregate,
            "USAGE",
            "bob",
            "alice",
        );
        assert!(!usage.is_correct_permission(&other_type));
    }
}
