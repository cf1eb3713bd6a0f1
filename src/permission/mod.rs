//! Permission rows and privilege sets

pub mod descriptor;
pub mod privileges;
pub mod required;

pub use descriptor::{
    GenericObjectType, PermissionKey, PermissionKind, PermissionsDescriptor, RevokeOutcome,
    PUBLIC,
};
pub use privileges::{Grant, Privilege, PrivilegeSet};
pub use required::RequiredPermDescriptor;
