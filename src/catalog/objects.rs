//! Compiled and routine objects: views, triggers, stored statements,
//! sequences, aliases and jar files

use uuid::Uuid;

use super::{
    ColumnSet, DescriptorType, ModifiedColumns, StatementType, TupleDescriptor,
    UniqueSqlObjectDescriptor, UniqueTupleDescriptor,
};

/// View descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDescriptor {
    /// Same id as the view's row in SYSTABLES
    pub uuid: Uuid,
    pub name: String,
    pub schema_id: Uuid,
    /// Original CREATE VIEW text
    pub view_text: String,
    /// Schema that was current when the view was compiled
    pub comp_schema_id: Uuid,
}

impl ViewDescriptor {
    pub fn new(name: impl Into<String>, schema_id: Uuid, view_text: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            schema_id,
            view_text: view_text.into(),
            comp_schema_id: schema_id,
        }
    }
}

impl TupleDescriptor for ViewDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::View
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for ViewDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for ViewDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema_id(&self) -> Uuid {
        self.schema_id
    }
}

/// Event a trigger fires on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    fn matches(&self, stmt: StatementType) -> bool {
        matches!(
            (self, stmt),
            (TriggerEvent::Insert, StatementType::Insert)
                | (TriggerEvent::Update, StatementType::Update)
                | (TriggerEvent::Delete, StatementType::Delete)
        )
    }
}

/// Trigger descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDescriptor {
    pub uuid: Uuid,
    pub name: String,
    pub schema_id: Uuid,
    /// Table the trigger is defined on
    pub table_id: Uuid,
    pub event: TriggerEvent,
    /// `UPDATE OF` columns; `None` means every column
    pub referenced_columns: Option<ColumnSet>,
    /// Stored statement holding the trigger action
    pub action_sps_id: Uuid,
    pub enabled: bool,
}

impl TriggerDescriptor {
    pub fn new(
        name: impl Into<String>,
        schema_id: Uuid,
        table_id: Uuid,
        event: TriggerEvent,
        action_sps_id: Uuid,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            schema_id,
            table_id,
            event,
            referenced_columns: None,
            action_sps_id,
            enabled: true,
        }
    }

    /// Restrict an UPDATE trigger to some columns
    #[must_use]
    pub fn update_of(mut self, columns: ColumnSet) -> Self {
        self.referenced_columns = Some(columns);
        self
    }

    /// Whether the trigger fires for a statement
    pub fn needs_to_fire(&self, stmt: StatementType, modified: &ModifiedColumns) -> bool {
        if !self.enabled || !self.event.matches(stmt) {
            return false;
        }
        match (&self.referenced_columns, stmt) {
            (Some(cols), StatementType::Update) => modified.intersects(cols),
            _ => true,
        }
    }
}

impl TupleDescriptor for TriggerDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::Trigger
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for TriggerDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for TriggerDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema_id(&self) -> Uuid {
        self.schema_id
    }
}

/// Stored prepared statement (SYSSTATEMENTS row)
#[derive(Debug, Clone, PartialEq)]
pub struct SpsDescriptor {
    pub uuid: Uuid,
    pub name: String,
    pub schema_id: Uuid,
    pub text: String,
    /// Cleared by invalidation; the statement is recompiled on next use
    pub valid: bool,
}

impl SpsDescriptor {
    pub fn new(name: impl Into<String>, schema_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            schema_id,
            text: text.into(),
            valid: true,
        }
    }
}

impl TupleDescriptor for SpsDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::StoredStatement
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for SpsDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for SpsDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema_id(&self) -> Uuid {
        self.schema_id
    }
}

/// Sequence descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDescriptor {
    pub uuid: Uuid,
    pub name: String,
    pub schema_id: Uuid,
    pub start: i64,
    pub increment: i64,
    pub min: i64,
    pub max: i64,
    pub cycle: bool,
}

impl SequenceDescriptor {
    pub fn new(name: impl Into<String>, schema_id: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            schema_id,
            start: 1,
            increment: 1,
            min: i64::MIN,
            max: i64::MAX,
            cycle: false,
        }
    }
}

impl TupleDescriptor for SequenceDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::Sequence
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for SequenceDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for SequenceDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema_id(&self) -> Uuid {
        self.schema_id
    }
}

/// Kind of SYSALIASES row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasType {
    Procedure,
    Function,
    UserDefinedType,
    Aggregate,
    Synonym,
}

impl AliasType {
    /// Routines carry EXECUTE permissions
    pub fn is_routine(&self) -> bool {
        matches!(self, AliasType::Procedure | AliasType::Function)
    }
}

/// Alias descriptor (routine, type, aggregate or synonym)
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDescriptor {
    pub uuid: Uuid,
    pub name: String,
    pub schema_id: Uuid,
    pub alias_type: AliasType,
    /// External name (class, method or synonym target)
    pub java_name: String,
}

impl AliasDescriptor {
    pub fn new(
        name: impl Into<String>,
        schema_id: Uuid,
        alias_type: AliasType,
        java_name: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            schema_id,
            alias_type,
            java_name: java_name.into(),
        }
    }
}

impl TupleDescriptor for AliasDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::Alias
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for AliasDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for AliasDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema_id(&self) -> Uuid {
        self.schema_id
    }
}

/// Jar file installed in a schema
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfoDescriptor {
    pub uuid: Uuid,
    pub name: String,
    pub schema_id: Uuid,
    pub generation_id: u64,
}

impl FileInfoDescriptor {
    pub fn new(name: impl Into<String>, schema_id: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            schema_id,
            generation_id: 0,
        }
    }
}

impl TupleDescriptor for FileInfoDescriptor {
    fn descriptor_type(&self) -> DescriptorType {
        DescriptorType::File
    }

    fn descriptor_name(&self) -> String {
        self.name.clone()
    }
}

impl UniqueTupleDescriptor for FileInfoDescriptor {
    fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl UniqueSqlObjectDescriptor for FileInfoDescriptor {
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

    fn update_trigger(cols: Option<ColumnSet>) -> TriggerDescriptor {
        let t = TriggerDescriptor::new(
            "TRG",
            Uuid::new_v4(),
            Uuid::new_v4(),
            TriggerEvent::Update,
            Uuid::new_v4(),
        );
        match cols {
            Some(cols) => t.update_of(cols),
            None => t,
        }
    }

    #[test]
    fn test_trigger_fires_on_matching_event_only() {
        let trg = update_trigger(None);
        assert!(trg.needs_to_fire(StatementType::Update, &ModifiedColumns::All));
        assert!(!trg.needs_to_fire(StatementType::Insert, &ModifiedColumns::All));
        assert!(!trg.needs_to_fire(StatementType::Delete, &ModifiedColumns::All));
    }

    #[test]
    fn test_update_of_columns() {
        let trg = update_trigger(Some(ColumnSet::from_positions([2])));
        assert!(trg.needs_to_fire(StatementType::Update, &ModifiedColumns::from_positions(&[2, 3])));
        assert!(!trg.needs_to_fire(StatementType::Update, &ModifiedColumns::from_positions(&[3])));
        assert!(trg.needs_to_fire(StatementType::Update, &ModifiedColumns::from_positions(&[])));
    }

    #[test]
    fn test_disabled_trigger() {
        let mut trg = update_trigger(None);
        trg.enabled = false;
        assert!(!trg.needs_to_fire(StatementType::Update, &ModifiedColumns::All));
    }

    #[test]
    fn test_alias_routine_kinds() {
        assert!(AliasType::Function.is_routine());
        assert!(AliasType::Procedure.is_routine());
        assert!(!AliasType::Aggregate.is_routine());
        assert!(!AliasType::Synonym.is_routine());
    }
}
