//! Catalog - descriptors for dictionary rows
//!
//! Descriptors are plain values owned by the dictionary. Other components keep
//! only UUIDs and re-resolve through `DataDictionary`, so dropping an object
//! can never leave a dangling reference behind.
//!
//! This module holds the objects that everything else builds on: schemas,
//! tables and their columns, conglomerates (indexes), plus the compiled or
//! routine objects in [`objects`]. Constraints and permissions have their own
//! modules.

pub mod column_set;
pub mod descriptor;
pub mod objects;
pub mod system_tables;

use std::fmt;

use uuid::Uuid;

pub use column_set::{ColumnSet, ModifiedColumns};
pub use descriptor::{
    DescriptorType, TupleDescriptor, UniqueSqlObjectDescriptor, UniqueTupleDescriptor,
};
pub use objects::{
    AliasDescriptor, AliasType, FileInfoDescriptor, SequenceDescriptor, SpsDescriptor,
    TriggerDescriptor, TriggerEvent, ViewDescriptor,
};

/// SQL data types supported by the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// Boolean (true/false)
    Boolean,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    BigInt,
    /// 64-bit floating point
    Double,
    /// Variable-length string with max length
    Varchar(u32),
    /// Binary data
    Blob,
    /// Timestamp (date and time)
    Timestamp,
    /// User-defined type, by alias id
    UserDefined(Uuid),
}

impl DataType {
    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::SmallInt | DataType::Int | DataType::BigInt | DataType::Double
        )
    }

    /// Check if this type is an integer
    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::SmallInt | DataType::Int | DataType::BigInt)
    }

    /// Alias id of a user-defined type
    pub fn user_type_id(&self) -> Option<Uuid> {
        match self {
            DataType::UserDefined(id) => Some(*id),
            _ => None,
        }
    }
}

/// Kind of DML statement, used for constraint and trigger firing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementType {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatementType::Insert => "INSERT",
            StatementType::Update => "UPDATE",
            StatementType::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Schema descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub uuid: Uuid,
    /// Schema name
    pub name: String,
    /// Owner
    pub authorization_id: String,
}

impl SchemaDescriptor {
    /// Create a new schema descriptor with a fresh id
    pub fn new(name: impl Into<String>, authorization_id: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            authorization_id: authorization_id.into(),
        }
    }

    /// Whether `authorization_id` owns this schema
    pub fn is_owned_by(&self, authorization_id: &str) -> bool {
        self.authorization_id == authorization_id
    }
}

impl TupleDescriptor for SchemaDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::Schema
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for SchemaDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

/// Column descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// 1-based position in the table
    pub position: usize,
    /// Data type
    pub data_type: DataType,
    /// Whether NULL values are allowed
    pub nullable: bool,
    /// Default value expression (as string)
    pub default: Option<String>,
}

impl ColumnDescriptor {
    /// Create a new column descriptor. The position is assigned by the table.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            position: 0,
            data_type,
            nullable: true,
            default: None,
        }
    }

    /// Set nullable
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set default value
    #[must_use]
    pub fn default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Kind of table row in SYSTABLES
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    BaseTable,
    View,
    System,
}

/// Table descriptor
///
/// `referenced_columns` is not persisted. It is set on the instance used as a
/// provider to narrow a dependency (or an invalidation) to some columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    pub uuid: Uuid,
    /// Table name
    pub name: String,
    /// Containing schema
    pub schema_id: Uuid,
    pub table_type: TableType,
    /// Column descriptors, in position order
    pub columns: Vec<ColumnDescriptor>,
    referenced_columns: Option<ColumnSet>,
}

impl TableDescriptor {
    /// Create a new base table descriptor
    pub fn new(name: impl Into<String>, schema_id: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            schema_id,
            table_type: TableType::BaseTable,
            columns: Vec::new(),
            referenced_columns: None,
        }
    }

    /// Set the table type
    #[must_use]
    pub fn table_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    /// Add a column, assigning the next position
    #[must_use]
    pub fn column(mut self, mut col: ColumnDescriptor) -> Self {
        col.position = self.columns.len() + 1;
        self.columns.push(col);
        self
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column by 1-based position
    pub fn column_at(&self, position: usize) -> Option<&ColumnDescriptor> {
        position
            .checked_sub(1)
            .and_then(|idx| self.columns.get(idx))
    }

    /// Column set for the named columns, skipping unknown names
    pub fn column_set<'a, I>(&self, names: I) -> ColumnSet
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|n| self.get_column(n).map(|c| c.position))
            .collect()
    }

    /// Columns this instance narrows a dependency to, if any
    pub fn referenced_columns(&self) -> Option<&ColumnSet> {
        self.referenced_columns.as_ref()
    }

    /// Narrow (or widen with `None`) the provider view of this table
    pub fn set_referenced_columns(&mut self, columns: Option<ColumnSet>) {
        self.referenced_columns = columns;
    }

    /// Copy of this descriptor narrowed to some columns
    #[must_use]
    pub fn with_referenced_columns(mut self, columns: ColumnSet) -> Self {
        self.referenced_columns = Some(columns);
        self
    }
}

impl TupleDescriptor for TableDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        match self.table_type {
            TableType::View => DescriptorType::View,
            _ => DescriptorType::Table,
        }
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for TableDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for TableDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema_id(&self) -> Uuid {
        self.schema_id
    }
}

/// Conglomerate (index) descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptor {
    pub uuid: Uuid,
    /// Storage-level conglomerate number
    pub conglomerate_number: u64,
    /// Index name
    pub name: String,
    /// Table this index belongs to
    pub table_id: Uuid,
    /// Containing schema
    pub schema_id: Uuid,
    /// 1-based key column positions, in key order
    pub columns: Vec<usize>,
    /// Whether this is a unique index
    pub unique: bool,
    /// Whether the index backs a constraint
    pub backs_constraint: bool,
}

impl IndexDescriptor {
    /// Create a new index descriptor
    pub fn new(
        name: impl Into<String>,
        table: &TableDescriptor,
        conglomerate_number: u64,
        columns: Vec<usize>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            conglomerate_number,
            name: name.into(),
            table_id: table.uuid,
            schema_id: table.schema_id,
            columns,
            unique: false,
            backs_constraint: false,
        }
    }

    /// Set unique
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as the backing index of a constraint
    #[must_use]
    pub fn backing_constraint(mut self) -> Self {
        self.backs_constraint = true;
        self
    }

    /// Key columns as a set
    pub fn column_set(&self) -> ColumnSet {
        self.columns.iter().copied().collect()
    }
}

impl TupleDescriptor for IndexDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::Index
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for IndexDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for IndexDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema_id(&self) -> Uuid {
        self.schema_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_columns_positions() {
        let schema = SchemaDescriptor::new("APP", "alice");
        let table = TableDescriptor::new("T1", schema.uuid)
            .column(ColumnDescriptor::new("ID", DataType::Int).nullable(false))
            .column(ColumnDescriptor::new("NAME", DataType::Varchar(100)))
            .column(ColumnDescriptor::new("CREATED", DataType::Timestamp).default("CURRENT_TIMESTAMP"));

        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.get_column("NAME").map(|c| c.position), Some(2));
        assert_eq!(table.column_at(1).map(|c| c.name.as_str()), Some("ID"));
        assert!(table.column_at(0).is_none());
        assert!(table.column_at(4).is_none());
        assert_eq!(
            table.column_set(["ID", "CREATED", "MISSING"]),
            ColumnSet::from_positions([1, 3])
        );
        assert!(!table.get_column("ID").is_some_and(|c| c.nullable));
    }

    #[test]
    fn test_descriptor_tags() {
        let schema = SchemaDescriptor::new("APP", "alice");
        let table = TableDescriptor::new("T1", schema.uuid);
        let view = TableDescriptor::new("V1", schema.uuid).table_type(TableType::View);
        assert_eq!(table.descriptor_type(), DescriptorType::Table);
        assert_eq!(view.descriptor_type(), DescriptorType::View);
        assert_eq!(schema.descriptor_type().to_string(), "SCHEMA");
        assert!(schema.is_owned_by("alice"));
        assert!(!schema.is_owned_by("bob"));
    }

    #[test]
    fn test_referenced_columns_narrowing() {
        let schema = SchemaDescriptor::new("APP", "alice");
        let mut table = TableDescriptor::new("T1", schema.uuid);
        assert!(table.referenced_columns().is_none());
        table.set_referenced_columns(Some(ColumnSet::from_positions([2])));
        assert_eq!(
            table.referenced_columns(),
            Some(&ColumnSet::from_positions([2]))
        );
        table.set_referenced_columns(None);
        assert!(table.referenced_columns().is_none());
    }

    #[test]
    fn test_data_type_helpers() {
        assert!(DataType::Int.is_numeric());
        assert!(DataType::BigInt.is_integer());
        assert!(DataType::Double.is_numeric());
        assert!(!DataType::Double.is_integer());
        assert!(!DataType::Boolean.is_numeric());
        let id = Uuid::new_v4();
        assert_eq!(DataType::UserDefined(id).user_type_id(), Some(id));
        assert_eq!(DataType::Blob.user_type_id(), None);
    }
}
