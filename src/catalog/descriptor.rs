//! Descriptor capabilities
//!
//! Every catalog row is a descriptor. The traits here are the capabilities the
//! rest of the crate relies on for diagnostics and identity. There is no
//! default for `descriptor_type`/`descriptor_name`: a descriptor that does not
//! provide them does not compile.

use std::fmt;

use uuid::Uuid;

use super::system_tables;
use super::SchemaDescriptor;
use crate::dictionary::{DataDictionary, DictionaryError, DictionaryResult};

/// Kind of catalog row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Schema,
    Table,
    View,
    Column,
    Index,
    Constraint,
    Trigger,
    StoredStatement,
    Sequence,
    Alias,
    File,
    TablePermission,
    ColumnPermission,
    SchemaPermission,
    RoutinePermission,
    GenericPermission,
    Role,
    Dependency,
}

impl DescriptorType {
    /// SQL-facing name used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorType::Schema => "SCHEMA",
            DescriptorType::Table => "TABLE",
            DescriptorType::View => "VIEW",
            DescriptorType::Column => "COLUMN",
            DescriptorType::Index => "INDEX",
            DescriptorType::Constraint => "CONSTRAINT",
            DescriptorType::Trigger => "TRIGGER",
            DescriptorType::StoredStatement => "STATEMENT",
            DescriptorType::Sequence => "SEQUENCE",
            DescriptorType::Alias => "ROUTINE",
            DescriptorType::File => "JAR",
            DescriptorType::TablePermission => "TABLE PRIVILEGE",
            DescriptorType::ColumnPermission => "COLUMN PRIVILEGE",
            DescriptorType::SchemaPermission => "SCHEMA PRIVILEGE",
            DescriptorType::RoutinePermission => "ROUTINE PRIVILEGE",
            DescriptorType::GenericPermission => "USAGE PRIVILEGE",
            DescriptorType::Role => "ROLE",
            DescriptorType::Dependency => "DEPENDENCY",
        }
    }

    /// System catalog holding rows of this kind
    pub fn system_catalog(&self) -> &'static str {
        system_tables::catalog_for(*self)
    }
}

impl fmt::Display for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base capability of every catalog row
pub trait TupleDescriptor {
    /// Type tag used by diagnostics
    fn descriptor_type(&self) -> DescriptorType;

    /// Display name used by diagnostics
    fn descriptor_name(&self) -> String;
}

/// Descriptor with a stable identity
pub trait UniqueTupleDescriptor: TupleDescriptor {
    fn uuid(&self) -> Uuid;
}

/// Descriptor living in a schema under a name unique within it
pub trait UniqueSqlObjectDescriptor: UniqueTupleDescriptor {
    /// Unqualified SQL name
    fn name(&self) -> &str;

    /// Id of the containing schema
    fn schema_id(&self) -> Uuid;

    /// Resolve the containing schema through the dictionary
    fn schema_descriptor(&self, dd: &dyn DataDictionary) -> DictionaryResult<SchemaDescriptor> {
        dd.schema_descriptor(self.schema_id())?
            .ok_or_else(|| DictionaryError::ObjectNotFound {
                kind: DescriptorType::Schema,
                id: self.schema_id(),
            })
    }

    /// `SCHEMA.NAME`, resolving the schema name
    fn qualified_name(&self, dd: &dyn DataDictionary) -> DictionaryResult<String> {
        let schema = self.schema_descriptor(dd)?;
        Ok(format!("{}.{}", schema.name, self.name()))
    }
}
