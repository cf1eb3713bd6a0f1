//! System catalog names
//!
//! Dictionary rows are persisted in system tables owned by the storage layer.
//! This crate never encodes rows itself, but it names the catalogs in
//! diagnostics and dependency dumps.

use super::DescriptorType;

pub const SYS_SCHEMAS: &str = "SYS.SYSSCHEMAS";
pub const SYS_TABLES: &str = "SYS.SYSTABLES";
pub const SYS_COLUMNS: &str = "SYS.SYSCOLUMNS";
pub const SYS_CONGLOMERATES: &str = "SYS.SYSCONGLOMERATES";
pub const SYS_CONSTRAINTS: &str = "SYS.SYSCONSTRAINTS";
pub const SYS_TRIGGERS: &str = "SYS.SYSTRIGGERS";
pub const SYS_STATEMENTS: &str = "SYS.SYSSTATEMENTS";
pub const SYS_SEQUENCES: &str = "SYS.SYSSEQUENCES";
pub const SYS_ALIASES: &str = "SYS.SYSALIASES";
pub const SYS_FILES: &str = "SYS.SYSFILES";
pub const SYS_DEPENDS: &str = "SYS.SYSDEPENDS";
pub const SYS_TABLEPERMS: &str = "SYS.SYSTABLEPERMS";
pub const SYS_COLPERMS: &str = "SYS.SYSCOLPERMS";
pub const SYS_SCHEMAPERMS: &str = "SYS.SYSSCHEMAPERMS";
pub const SYS_ROUTINEPERMS: &str = "SYS.SYSROUTINEPERMS";
pub const SYS_PERMS: &str = "SYS.SYSPERMS";
pub const SYS_ROLES: &str = "SYS.SYSROLES";

/// Catalog that stores rows of the given descriptor type
pub fn catalog_for(kind: DescriptorType) -> &'static str {
    match kind {
        DescriptorType::Schema => SYS_SCHEMAS,
        DescriptorType::Table | DescriptorType::View => SYS_TABLES,
        DescriptorType::Column => SYS_COLUMNS,
        DescriptorType::Index => SYS_CONGLOMERATES,
        DescriptorType::Constraint => SYS_CONSTRAINTS,
        DescriptorType::Trigger => SYS_TRIGGERS,
        DescriptorType::StoredStatement => SYS_STATEMENTS,
        DescriptorType::Sequence => SYS_SEQUENCES,
        DescriptorType::Alias => SYS_ALIASES,
        DescriptorType::File => SYS_FILES,
        DescriptorType::TablePermission => SYS_TABLEPERMS,
        DescriptorType::ColumnPermission => SYS_COLPERMS,
        DescriptorType::SchemaPermission => SYS_SCHEMAPERMS,
        DescriptorType::RoutinePermission => SYS_ROUTINEPERMS,
        DescriptorType::GenericPermission => SYS_PERMS,
        DescriptorType::Role => SYS_ROLES,
        DescriptorType::Dependency => SYS_DEPENDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_mapping() {
        assert_eq!(catalog_for(DescriptorType::View), SYS_TABLES);
        assert_eq!(catalog_for(DescriptorType::Role), SYS_ROLES);
        assert_eq!(catalog_for(DescriptorType::Dependency), SYS_DEPENDS);
        assert_eq!(catalog_for(DescriptorType::ColumnPermission), SYS_COLPERMS);
    }
}
