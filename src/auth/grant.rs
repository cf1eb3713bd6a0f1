//! GRANT, REVOKE and role DDL
//!
//! Merges grants into the permission catalogs and, on revoke, invalidates the
//! objects that were compiled under the lost privilege. Revoking or dropping a
//! role invalidates dependents of every role in its forward closure, since all
//! of them lose whatever the revoked role conferred.

use std::sync::Arc;

use tracing::info;

use super::error::{AuthError, AuthResult};
use crate::depend::{DependencyManager, InvalidationAction};
use crate::dictionary::{DataDictionary, PermissionChange};
use crate::permission::{PermissionKind, PermissionsDescriptor};
use crate::role::{closure_contains, ClosureDirection, RoleClosureIterator};

/// Privilege and role administration
pub struct PrivilegeAdmin {
    dependencies: Arc<DependencyManager>,
}

impl PrivilegeAdmin {
    pub fn new(dependencies: Arc<DependencyManager>) -> Self {
        Self { dependencies }
    }

    fn dictionary(&self) -> &dyn DataDictionary {
        self.dependencies.dictionary()
    }

    /// Merge a grant into the stored row for the same grantee and object
    pub fn grant_permission(&self, mut perm: PermissionsDescriptor) -> AuthResult<PermissionChange> {
        debug_assert!(!matches!(perm.kind(), PermissionKind::Role { .. }));
        let change = self
            .dictionary()
            .add_remove_permissions_descriptor(true, &mut perm)?;
        info!(
            grantee = perm.grantee(),
            grantor = perm.grantor(),
            permission = %perm.id(),
            ?change,
            "grant"
        );
        Ok(change)
    }

    /// Subtract a revoke from the stored row and invalidate its dependents
    ///
    /// A column revoke only reaches dependents whose required columns
    /// intersect the revoked ones.
    pub fn revoke_permission(&self, mut perm: PermissionsDescriptor) -> AuthResult<PermissionChange> {
        debug_assert!(!matches!(perm.kind(), PermissionKind::Role { .. }));
        let change = self
            .dictionary()
            .add_remove_permissions_descriptor(false, &mut perm)?;
        info!(
            grantee = perm.grantee(),
            permission = %perm.id(),
            ?change,
            "revoke"
        );
        if change.revoked_something() {
            self.dependencies
                .invalidate_for(&perm, InvalidationAction::RevokePrivilege)?;
        }
        Ok(change)
    }

    /// CREATE ROLE
    pub fn create_role(&self, role: &str, creator: &str) -> AuthResult<()> {
        let dd = self.dictionary();
        if dd.role_definition(role)?.is_some() {
            return Err(AuthError::RoleExists(role.to_string()));
        }
        dd.add_role_grant(PermissionsDescriptor::role_definition(role, creator))?;
        info!(role, creator, "role created");
        Ok(())
    }

    /// GRANT role TO grantee
    ///
    /// A grantee that is itself a role must not already reach `role`
    /// through its grants, or the grant graph would get a cycle. Re-granting
    /// with admin option upgrades the existing grant.
    pub fn grant_role(
        &self,
        role: &str,
        grantee: &str,
        grantor: &str,
        with_admin_option: bool,
    ) -> AuthResult<PermissionChange> {
        let dd = self.dictionary();
        if dd.role_definition(role)?.is_none() {
            return Err(AuthError::RoleNotFound(role.to_string()));
        }
        if dd.role_definition(grantee)?.is_some()
            && closure_contains(dd, grantee, role, ClosureDirection::Forward)?
        {
            return Err(AuthError::RoleCycle {
                role: role.to_string(),
                grantee: grantee.to_string(),
            });
        }

        let mut grant = PermissionsDescriptor::role_grant(role, grantee, grantor);
        grant.set_with_admin_option(with_admin_option);
        let change = dd.add_role_grant(grant)?;
        info!(role, grantee, grantor, with_admin_option, ?change, "role granted");
        Ok(change)
    }

    /// REVOKE role FROM grantee. Returns false when there was no such grant.
    pub fn revoke_role(&self, role: &str, grantee: &str) -> AuthResult<bool> {
        let dd = self.dictionary();
        if dd.role_definition(role)?.is_none() {
            return Err(AuthError::RoleNotFound(role.to_string()));
        }
        // Closure taken before the edge disappears
        let affected = self.forward_definitions(role)?;
        if !dd.drop_role_grant(role, grantee)? {
            return Ok(false);
        }
        info!(role, grantee, "role revoked");
        self.invalidate_roles(&affected)?;
        Ok(true)
    }

    /// DROP ROLE: the definition, every grant of it and every grant to it
    pub fn drop_role(&self, role: &str) -> AuthResult<usize> {
        let dd = self.dictionary();
        if dd.role_definition(role)?.is_none() {
            return Err(AuthError::RoleNotFound(role.to_string()));
        }
        let affected = self.forward_definitions(role)?;
        let removed = dd.drop_role_descriptor(role)?;
        info!(role, rows = removed, "role dropped");
        self.invalidate_roles(&affected)?;
        Ok(removed)
    }

    /// Definitions of `role` and every role it is granted to
    fn forward_definitions(&self, role: &str) -> AuthResult<Vec<PermissionsDescriptor>> {
        let dd = self.dictionary();
        let mut definitions = Vec::new();
        for name in RoleClosureIterator::forward(dd, role) {
            if let Some(definition) = dd.role_definition(&name?)? {
                definitions.push(definition);
            }
        }
        Ok(definitions)
    }

    fn invalidate_roles(&self, definitions: &[PermissionsDescriptor]) -> AuthResult<()> {
        for definition in definitions {
            self.dependencies
                .invalidate_for(definition, InvalidationAction::RevokeRole)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::MemoryDictionary;

    fn admin() -> (Arc<MemoryDictionary>, PrivilegeAdmin) {
        let dd = Arc::new(MemoryDictionary::new());
        let manager = Arc::new(DependencyManager::new(dd.clone()));
        (dd, PrivilegeAdmin::new(manager))
    }

    #[test]
    fn test_create_role_twice() {
        let (_, admin) = admin();
        admin.create_role("r1", "dbo").unwrap();
        assert!(matches!(
            admin.create_role("r1", "dbo"),
            Err(AuthError::RoleExists(_))
        ));
    }

    #[test]
    fn test_grant_role_refuses_cycle() {
        let (_, admin) = admin();
        for r in ["a", "b", "c"] {
            admin.create_role(r, "dbo").unwrap();
        }
        admin.grant_role("a", "b", "dbo", false).unwrap();
        admin.grant_role("b", "c", "dbo", false).unwrap();
        assert!(matches!(
            admin.grant_role("c", "a", "dbo", false),
            Err(AuthError::RoleCycle { .. })
        ));
        assert!(matches!(
            admin.grant_role("a", "a", "dbo", false),
            Err(AuthError::RoleCycle { .. })
        ));
        // Users are not part of the graph
        admin.grant_role("c", "bob", "dbo", false).unwrap();
    }

    #[test]
    fn test_admin_option_upgrade() {
        let (dd, admin) = admin();
        admin.create_role("r1", "dbo").unwrap();
        assert_eq!(
            admin.grant_role("r1", "bob", "dbo", false).unwrap(),
            PermissionChange::Inserted
        );
        assert!(matches!(
            admin.grant_role("r1", "bob", "dbo", true).unwrap(),
            PermissionChange::Updated { .. }
        ));
        let row = dd.role_grant("r1", "bob").unwrap().unwrap();
        assert!(matches!(
            row.kind(),
            PermissionKind::Role {
                with_admin_option: true,
                ..
            }
        ));
    }

    #[test]
    fn test_revoke_and_drop_unknown_role() {
        let (_, admin) = admin();
        assert!(matches!(
            admin.revoke_role("nope", "bob"),
            Err(AuthError::RoleNotFound(_))
        ));
        assert!(matches!(admin.drop_role("nope"), Err(AuthError::RoleNotFound(_))));

        admin.create_role("r1", "dbo").unwrap();
        assert!(!admin.revoke_role("r1", "bob").unwrap());
        assert_eq!(admin.drop_role("r1").unwrap(), 1);
    }
}
