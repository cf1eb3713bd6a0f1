//! Constraint descriptors
//!
//! A constraint is one descriptor with a closed kind: CHECK, PRIMARY KEY,
//! UNIQUE or FOREIGN KEY. Key-family kinds always carry a backing index id;
//! CHECK never does, and the type makes the other combinations unrepresentable.
//!
//! The backing index is resolved lazily through the dictionary and memoised on
//! the descriptor instance.

use std::sync::OnceLock;

use uuid::Uuid;

use crate::catalog::{
    ColumnSet, DescriptorType, IndexDescriptor, ModifiedColumns, StatementType, TupleDescriptor,
    UniqueSqlObjectDescriptor, UniqueTupleDescriptor,
};
use crate::dictionary::{DataDictionary, DictionaryError, DictionaryResult};

/// Referential action of a foreign key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// CHECK payload
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConstraint {
    /// Source text of the check expression
    pub source: String,
    /// Columns the expression reads
    pub referenced_columns: ColumnSet,
}

/// PRIMARY KEY / UNIQUE payload
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedKey {
    /// Backing index id
    pub index_id: Uuid,
    /// Key columns
    pub columns: ColumnSet,
    /// Number of foreign keys referencing this key
    pub reference_count: usize,
}

/// FOREIGN KEY payload
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    /// Backing index id
    pub index_id: Uuid,
    /// Referencing columns
    pub columns: ColumnSet,
    /// Primary key or unique constraint this key references
    pub referenced_constraint_id: Uuid,
    pub delete_rule: ReferentialAction,
    pub update_rule: ReferentialAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    Check(CheckConstraint),
    PrimaryKey(ReferencedKey),
    Unique(ReferencedKey),
    ForeignKey(ForeignKey),
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Check(_) => "CHECK",
            ConstraintKind::PrimaryKey(_) => "PRIMARY KEY",
            ConstraintKind::Unique(_) => "UNIQUE",
            ConstraintKind::ForeignKey(_) => "FOREIGN KEY",
        }
    }
}

/// Constraint descriptor
#[derive(Debug, Clone)]
pub struct ConstraintDescriptor {
    pub uuid: Uuid,
    pub name: String,
    /// Table the constraint is defined on
    pub table_id: Uuid,
    pub schema_id: Uuid,
    pub enabled: bool,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub kind: ConstraintKind,
    backing_index: OnceLock<IndexDescriptor>,
}

impl ConstraintDescriptor {
    pub fn new(
        name: impl Into<String>,
        table_id: Uuid,
        schema_id: Uuid,
        kind: ConstraintKind,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            table_id,
            schema_id,
            enabled: true,
            deferrable: false,
            initially_deferred: false,
            kind,
            backing_index: OnceLock::new(),
        }
    }

    pub fn check(
        name: impl Into<String>,
        table_id: Uuid,
        schema_id: Uuid,
        source: impl Into<String>,
        referenced_columns: ColumnSet,
    ) -> Self {
        Self::new(
            name,
            table_id,
            schema_id,
            ConstraintKind::Check(CheckConstraint {
                source: source.into(),
                referenced_columns,
            }),
        )
    }

    pub fn primary_key(name: impl Into<String>, index: &IndexDescriptor) -> Self {
        Self::new(
            name,
            index.table_id,
            index.schema_id,
            ConstraintKind::PrimaryKey(ReferencedKey {
                index_id: index.uuid,
                columns: index.column_set(),
                reference_count: 0,
            }),
        )
    }

    pub fn unique(name: impl Into<String>, index: &IndexDescriptor) -> Self {
        Self::new(
            name,
            index.table_id,
            index.schema_id,
            ConstraintKind::Unique(ReferencedKey {
                index_id: index.uuid,
                columns: index.column_set(),
                reference_count: 0,
            }),
        )
    }

    pub fn foreign_key(
        name: impl Into<String>,
        index: &IndexDescriptor,
        referenced_constraint_id: Uuid,
    ) -> Self {
        Self::new(
            name,
            index.table_id,
            index.schema_id,
            ConstraintKind::ForeignKey(ForeignKey {
                index_id: index.uuid,
                columns: index.column_set(),
                referenced_constraint_id,
                delete_rule: ReferentialAction::NoAction,
                update_rule: ReferentialAction::NoAction,
            }),
        )
    }

    /// Set the deferrable flags
    #[must_use]
    pub fn deferrable(mut self, initially_deferred: bool) -> Self {
        self.deferrable = true;
        self.initially_deferred = initially_deferred;
        self
    }

    /// Set referential actions of a foreign key; no effect on other kinds
    #[must_use]
    pub fn rules(mut self, delete_rule: ReferentialAction, update_rule: ReferentialAction) -> Self {
        if let ConstraintKind::ForeignKey(fk) = &mut self.kind {
            fk.delete_rule = delete_rule;
            fk.update_rule = update_rule;
        }
        self
    }

    pub fn is_check(&self) -> bool {
        matches!(self.kind, ConstraintKind::Check(_))
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::ForeignKey(_))
    }

    /// Whether other constraints can reference this one
    pub fn is_referenced_key(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::PrimaryKey(_) | ConstraintKind::Unique(_)
        )
    }

    /// Columns the constraint reads or enforces
    pub fn referenced_columns(&self) -> &ColumnSet {
        match &self.kind {
            ConstraintKind::Check(c) => &c.referenced_columns,
            ConstraintKind::PrimaryKey(k) | ConstraintKind::Unique(k) => &k.columns,
            ConstraintKind::ForeignKey(fk) => &fk.columns,
        }
    }

    /// Backing index id for key-family constraints
    pub fn backing_index_id(&self) -> Option<Uuid> {
        match &self.kind {
            ConstraintKind::Check(_) => None,
            ConstraintKind::PrimaryKey(k) | ConstraintKind::Unique(k) => Some(k.index_id),
            ConstraintKind::ForeignKey(fk) => Some(fk.index_id),
        }
    }

    /// Number of foreign keys referencing this key; zero for other kinds
    pub fn reference_count(&self) -> usize {
        match &self.kind {
            ConstraintKind::PrimaryKey(k) | ConstraintKind::Unique(k) => k.reference_count,
            _ => 0,
        }
    }

    /// Record one more (or one fewer) referencing foreign key
    pub fn adjust_reference_count(&mut self, increment: bool) {
        if let ConstraintKind::PrimaryKey(k) | ConstraintKind::Unique(k) = &mut self.kind {
            k.reference_count = if increment {
                k.reference_count + 1
            } else {
                k.reference_count.saturating_sub(1)
            };
        }
    }

    /// Whether the constraint has to be checked for a statement
    ///
    /// A referenced key fires on DELETE only while some foreign key points at
    /// it, so the referencing rows can be checked. The referencing side never
    /// fires on DELETE.
    pub fn needs_to_fire(&self, stmt: StatementType, modified: &ModifiedColumns) -> bool {
        if !self.enabled {
            return false;
        }
        match (&self.kind, stmt) {
            (_, StatementType::Insert) => true,
            (ConstraintKind::Check(_), StatementType::Delete) => false,
            (ConstraintKind::ForeignKey(_), StatementType::Delete) => false,
            (ConstraintKind::PrimaryKey(k) | ConstraintKind::Unique(k), StatementType::Delete) => {
                k.reference_count > 0
            }
            (_, StatementType::Update) => modified.intersects(self.referenced_columns()),
        }
    }

    /// Resolve the backing index, memoised after the first success
    ///
    /// A missing index means the catalog is corrupt and is reported as
    /// `CatalogInconsistency`. CHECK constraints resolve to `None`.
    pub fn backing_index(
        &self,
        dd: &dyn DataDictionary,
    ) -> DictionaryResult<Option<&IndexDescriptor>> {
        let Some(index_id) = self.backing_index_id() else {
            return Ok(None);
        };
        if let Some(index) = self.backing_index.get() {
            return Ok(Some(index));
        }
        let index = dd
            .index_descriptor(index_id)?
            .ok_or_else(|| DictionaryError::CatalogInconsistency {
                kind: DescriptorType::Index,
                id: index_id,
                context: format!("backing index of constraint {}", self.name),
            })?;
        Ok(Some(self.backing_index.get_or_init(|| index)))
    }

    /// Drop the memoised backing index so the next access re-resolves it
    pub fn reset_backing_index(&mut self) {
        self.backing_index.take();
    }

    /// Referenced key of a foreign key
    pub fn referenced_constraint(
        &self,
        dd: &dyn DataDictionary,
    ) -> DictionaryResult<Option<ConstraintDescriptor>> {
        let ConstraintKind::ForeignKey(fk) = &self.kind else {
            return Ok(None);
        };
        dd.constraint_descriptor(fk.referenced_constraint_id)?
            .map(Some)
            .ok_or_else(|| DictionaryError::CatalogInconsistency {
                kind: DescriptorType::Constraint,
                id: fk.referenced_constraint_id,
                context: format!("key referenced by foreign key {}", self.name),
            })
    }
}

impl PartialEq for ConstraintDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
            && self.name == other.name
            && self.table_id == other.table_id
            && self.schema_id == other.schema_id
            && self.enabled == other.enabled
            && self.deferrable == other.deferrable
            && self.initially_deferred == other.initially_deferred
            && self.kind == other.kind
    }
}

impl TupleDescriptor for ConstraintDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::Constraint
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for ConstraintDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for ConstraintDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema_id(&self) -> Uuid {
        self.schema_id
    }
}

/// Constraints of one table
#[derive(Debug, Clone, Default)]
pub struct ConstraintDescriptorList {
    constraints: Vec<ConstraintDescriptor>,
}

impl ConstraintDescriptorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cd: ConstraintDescriptor) {
        self.constraints.push(cd);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintDescriptor> {
        self.constraints.iter()
    }

    pub fn primary_key(&self) -> Option<&ConstraintDescriptor> {
        self.constraints
            .iter()
            .find(|c| matches!(c.kind, ConstraintKind::PrimaryKey(_)))
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<&ConstraintDescriptor> {
        self.constraints.iter().find(|c| c.uuid == id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ConstraintDescriptor> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Enabled constraints only
    pub fn enabled(&self) -> impl Iterator<Item = &ConstraintDescriptor> {
        self.constraints.iter().filter(|c| c.enabled)
    }

    /// Constraints that have to be checked for a statement
    pub fn needing_to_fire(
        &self,
        stmt: StatementType,
        modified: &ModifiedColumns,
    ) -> Vec<&ConstraintDescriptor> {
        self.constraints
            .iter()
            .filter(|c| c.needs_to_fire(stmt, modified))
            .collect()
    }
}

impl FromIterator<ConstraintDescriptor> for ConstraintDescriptorList {
    fn from_iter<I: IntoIterator<Item = ConstraintDescriptor>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ConstraintDescriptorList {
    type Item = ConstraintDescriptor;
    type IntoIter = std::vec::IntoIter<ConstraintDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.into_iter()
    }
}
