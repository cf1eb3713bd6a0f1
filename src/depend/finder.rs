//! Dependable finders
//!
//! A finder is the persisted half of a dependency endpoint: together with the
//! object id it is enough to look the object up again after a restart. Table
//! providers narrowed to some columns, and column permission requirements,
//! carry their column set in the finder.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{
    AliasDescriptor, ColumnSet, FileInfoDescriptor, IndexDescriptor, SchemaDescriptor,
    SequenceDescriptor, SpsDescriptor, TableDescriptor, TriggerDescriptor, ViewDescriptor,
};
use crate::constraint::ConstraintDescriptor;
use crate::dictionary::{DataDictionary, DictionaryError, DictionaryResult};
use crate::permission::PermissionsDescriptor;

use super::{Dependable, Dependent, Provider};

/// Format version written in front of every encoded finder
pub const FINDER_FORMAT_VERSION: u8 = 1;

/// Class tag of a dependable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependableClass {
    Table,
    ColumnsInTable,
    View,
    Constraint,
    Index,
    Schema,
    Sequence,
    Alias,
    File,
    StoredStatement,
    Trigger,
    Permission,
    RoleDefinition,
    RoleGrant,
    CompiledStatement,
}

impl DependableClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependableClass::Table => "Table",
            DependableClass::ColumnsInTable => "ColumnsInTable",
            DependableClass::View => "View",
            DependableClass::Constraint => "Constraint",
            DependableClass::Index => "Conglomerate",
            DependableClass::Schema => "Schema",
            DependableClass::Sequence => "Sequence",
            DependableClass::Alias => "Alias",
            DependableClass::File => "File",
            DependableClass::StoredStatement => "StoredPreparedStatement",
            DependableClass::Trigger => "Trigger",
            DependableClass::Permission => "Permission",
            DependableClass::RoleDefinition => "RoleDefinition",
            DependableClass::RoleGrant => "RoleGrant",
            DependableClass::CompiledStatement => "PreparedStatement",
        }
    }
}

impl fmt::Display for DependableClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Re-resolvable reference to a dependable object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependableFinder {
    Table,
    /// Table provider narrowed to some columns
    Columns { columns: ColumnSet },
    View,
    Constraint,
    Index,
    Schema,
    Sequence,
    Alias,
    File,
    StoredStatement,
    Trigger,
    /// Permission row, narrowed to the required columns for column rows
    Permission { columns: Option<ColumnSet> },
    RoleDefinition,
    RoleGrant,
    /// Live prepared statement; never stored, never found in the dictionary
    CompiledStatement,
}

/// An object resolved through a finder
#[derive(Debug, Clone)]
pub enum DependableObject {
    Table(TableDescriptor),
    View(ViewDescriptor),
    Constraint(ConstraintDescriptor),
    Index(IndexDescriptor),
    Schema(SchemaDescriptor),
    Sequence(SequenceDescriptor),
    Alias(AliasDescriptor),
    File(FileInfoDescriptor),
    StoredStatement(SpsDescriptor),
    Trigger(TriggerDescriptor),
    Permission(PermissionsDescriptor),
}

impl DependableFinder {
    pub fn class(&self) -> DependableClass {
        match self {
            DependableFinder::Table => DependableClass::Table,
            DependableFinder::Columns { .. } => DependableClass::ColumnsInTable,
            DependableFinder::View => DependableClass::View,
            DependableFinder::Constraint => DependableClass::Constraint,
            DependableFinder::Index => DependableClass::Index,
            DependableFinder::Schema => DependableClass::Schema,
            DependableFinder::Sequence => DependableClass::Sequence,
            DependableFinder::Alias => DependableClass::Alias,
            DependableFinder::File => DependableClass::File,
            DependableFinder::StoredStatement => DependableClass::StoredStatement,
            DependableFinder::Trigger => DependableClass::Trigger,
            DependableFinder::Permission { .. } => DependableClass::Permission,
            DependableFinder::RoleDefinition => DependableClass::RoleDefinition,
            DependableFinder::RoleGrant => DependableClass::RoleGrant,
            DependableFinder::CompiledStatement => DependableClass::CompiledStatement,
        }
    }

    /// Whether objects found by this finder live in the catalog
    pub fn is_persistent(&self) -> bool {
        !matches!(self, DependableFinder::CompiledStatement)
    }

    /// Column set the endpoint is narrowed to, if any
    pub fn columns(&self) -> Option<&ColumnSet> {
        match self {
            DependableFinder::Columns { columns } => Some(columns),
            DependableFinder::Permission { columns } => columns.as_ref(),
            _ => None,
        }
    }

    /// Look the object up again. `Ok(None)` when it no longer exists.
    pub fn resolve(
        &self,
        dd: &dyn DataDictionary,
        id: Uuid,
    ) -> DictionaryResult<Option<DependableObject>> {
        let found = match self {
            DependableFinder::Table => dd.table_descriptor(id)?.map(DependableObject::Table),
            DependableFinder::Columns { columns } => dd.table_descriptor(id)?.map(|mut td| {
                td.set_referenced_columns(Some(columns.clone()));
                DependableObject::Table(td)
            }),
            DependableFinder::View => dd.view_descriptor(id)?.map(DependableObject::View),
            DependableFinder::Constraint => dd
                .constraint_descriptor(id)?
                .map(DependableObject::Constraint),
            DependableFinder::Index => dd.index_descriptor(id)?.map(DependableObject::Index),
            DependableFinder::Schema => dd.schema_descriptor(id)?.map(DependableObject::Schema),
            DependableFinder::Sequence => dd
                .sequence_descriptor(id)?
                .map(DependableObject::Sequence),
            DependableFinder::Alias => dd.alias_descriptor(id)?.map(DependableObject::Alias),
            DependableFinder::File => dd.file_descriptor(id)?.map(DependableObject::File),
            DependableFinder::StoredStatement => dd
                .sps_descriptor(id)?
                .map(DependableObject::StoredStatement),
            DependableFinder::Trigger => dd.trigger_descriptor(id)?.map(DependableObject::Trigger),
            DependableFinder::Permission { .. }
            | DependableFinder::RoleDefinition
            | DependableFinder::RoleGrant => dd
                .permission_descriptor(id)?
                .map(DependableObject::Permission),
            DependableFinder::CompiledStatement => None,
        };
        Ok(found)
    }

    /// Encode as a version byte followed by the bincode body
    pub fn to_bytes(&self) -> DictionaryResult<Vec<u8>> {
        let mut bytes = vec![FINDER_FORMAT_VERSION];
        bytes.extend(bincode::serialize(self)?);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> DictionaryResult<Self> {
        match bytes.split_first() {
            Some((&FINDER_FORMAT_VERSION, body)) => Ok(bincode::deserialize(body)?),
            Some((version, _)) => Err(DictionaryError::Finder(format!(
                "unsupported finder format version {}",
                version
            ))),
            None => Err(DictionaryError::Finder("empty finder".to_string())),
        }
    }
}

impl DependableObject {
    /// Provider view of the object
    pub fn as_provider(&self) -> &dyn Provider {
        match self {
            DependableObject::Table(d) => d,
            DependableObject::View(d) => d,
            DependableObject::Constraint(d) => d,
            DependableObject::Index(d) => d,
            DependableObject::Schema(d) => d,
            DependableObject::Sequence(d) => d,
            DependableObject::Alias(d) => d,
            DependableObject::File(d) => d,
            DependableObject::StoredStatement(d) => d,
            DependableObject::Trigger(d) => d,
            DependableObject::Permission(d) => d,
        }
    }

    /// Dependent view of the object, for kinds that can be invalidated
    pub fn into_dependent(self) -> Option<Box<dyn Dependent>> {
        match self {
            DependableObject::View(d) => Some(Box::new(d)),
            DependableObject::Constraint(d) => Some(Box::new(d)),
            DependableObject::StoredStatement(d) => Some(Box::new(d)),
            DependableObject::Trigger(d) => Some(Box::new(d)),
            _ => None,
        }
    }

    pub fn object_name(&self) -> String {
        self.as_provider().object_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::MemoryDictionary;

    #[test]
    fn test_bytes_roundtrip_with_columns() {
        let finder = DependableFinder::Columns {
            columns: ColumnSet::from_positions([2, 70]),
        };
        let bytes = finder.to_bytes().unwrap();
        assert_eq!(bytes[0], FINDER_FORMAT_VERSION);
        assert_eq!(DependableFinder::from_bytes(&bytes).unwrap(), finder);
    }

    #[test]
    fn test_bad_version_rejected() {
        let mut bytes = DependableFinder::View.to_bytes().unwrap();
        bytes[0] = 99;
        assert!(matches!(
            DependableFinder::from_bytes(&bytes),
            Err(DictionaryError::Finder(_))
        ));
        assert!(DependableFinder::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_resolve_narrows_table() {
        let dd = MemoryDictionary::new();
        let schema = SchemaDescriptor::new("APP", "alice");
        let table = TableDescriptor::new("T", schema.uuid);
        let id = table.uuid;
        dd.add_table(table).unwrap();

        let finder = DependableFinder::Columns {
            columns: ColumnSet::from_positions([1]),
        };
        match finder.resolve(&dd, id).unwrap() {
            Some(DependableObject::Table(td)) => {
                assert_eq!(td.referenced_columns(), Some(&ColumnSet::from_positions([1])))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(DependableFinder::View.resolve(&dd, id).unwrap().is_none());
        assert!(DependableFinder::CompiledStatement
            .resolve(&dd, id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_classes() {
        assert_eq!(
            DependableFinder::Permission { columns: None }.class(),
            DependableClass::Permission
        );
        assert!(!DependableFinder::CompiledStatement.is_persistent());
        assert!(DependableFinder::RoleDefinition.is_persistent());
        assert_eq!(DependableClass::Index.to_string(), "Conglomerate");
    }
}
