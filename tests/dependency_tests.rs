//! Dependency manager integration tests

use std::sync::Arc;

use roodict::catalog::{
    ColumnDescriptor, ColumnSet, DataType, SchemaDescriptor, SpsDescriptor, TableDescriptor,
    TriggerDescriptor, TriggerEvent, ViewDescriptor,
};
use roodict::constraint::ConstraintDescriptor;
use roodict::depend::{
    CompiledStatement, Dependable, DependableClass, DependableFinder, DependencyError,
    DependencyManager, Dependent, InvalidationAction,
};
use roodict::dictionary::{DataDictionary, MemoryDictionary};
use roodict::error::ErrorCategory;

struct Db {
    dd: Arc<MemoryDictionary>,
    dm: DependencyManager,
    schema: SchemaDescriptor,
    table: TableDescriptor,
}

fn db() -> Db {
    let dd = Arc::new(MemoryDictionary::new());
    let schema = SchemaDescriptor::new("APP", "alice");
    let table = TableDescriptor::new("T", schema.uuid)
        .column(ColumnDescriptor::new("A", DataType::Int))
        .column(ColumnDescriptor::new("B", DataType::Varchar(20)))
        .column(ColumnDescriptor::new("C", DataType::BigInt));
    dd.add_schema(schema.clone()).unwrap();
    dd.add_table(table.clone()).unwrap();
    let dm = DependencyManager::new(dd.clone());
    Db {
        dd,
        dm,
        schema,
        table,
    }
}

impl Db {
    fn view(&self, name: &str) -> Arc<dyn Dependent> {
        let view = ViewDescriptor::new(name, self.schema.uuid, format!("SELECT * FROM {}", name));
        self.dd.add_view(view.clone()).unwrap();
        Arc::new(view)
    }

    fn statement(&self, sql: &str) -> (Arc<CompiledStatement>, Arc<dyn Dependent>) {
        let stmt = Arc::new(CompiledStatement::new(sql));
        let dependent: Arc<dyn Dependent> = stmt.clone();
        (stmt, dependent)
    }
}

#[test]
fn test_stored_and_in_memory_edges() {
    let db = db();
    let view = db.view("V");
    let (_stmt, dependent) = db.statement("SELECT * FROM T");

    assert!(db.dm.add_dependency(&view, &db.table).unwrap());
    assert!(!db.dm.add_dependency(&view, &db.table).unwrap());
    assert!(db.dm.add_dependency(&dependent, &db.table).unwrap());

    // Only the view edge is stored
    let stored = db.dd.all_stored_dependencies().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].dependent_id, view.object_id());
    assert_eq!(db.dm.count_dependencies().unwrap(), 2);
    assert_eq!(db.dm.dependents_of(db.table.uuid).unwrap().len(), 2);

    let providers = db.dm.providers_of(dependent.object_id()).unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].name, "T");
    assert_eq!(providers[0].class_type(), DependableClass::Table);

    let dump = db.dm.dump_dependencies().unwrap();
    assert!(dump.lines().next().unwrap().starts_with("stored View"));
    assert!(dump.contains("in-memory PreparedStatement"));
}

#[test]
fn test_invalidate_compiled_statement() {
    let db = db();
    let (stmt, dependent) = db.statement("SELECT A FROM T");
    db.dm.add_dependency(&dependent, &db.table).unwrap();

    let report = db
        .dm
        .invalidate_for(&db.table, InvalidationAction::CreateIndex)
        .unwrap();
    assert_eq!(report.invalidated, vec![stmt.object_id()]);
    assert!(!stmt.is_valid());
    assert_eq!(stmt.last_action(), Some(InvalidationAction::CreateIndex));

    // Twice is the same as once
    let again = db
        .dm
        .invalidate_for(&db.table, InvalidationAction::CreateIndex)
        .unwrap();
    assert_eq!(again.invalidated, report.invalidated);
    assert!(!stmt.is_valid());

    stmt.revalidate();
    assert!(stmt.is_valid());
}

#[test]
fn test_invalidate_without_dependents_is_noop() {
    let db = db();
    let report = db
        .dm
        .invalidate_for(&db.table, InvalidationAction::DropTable)
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(report.skipped, 0);
}

#[test]
fn test_column_scoped_invalidation() {
    let db = db();
    let (on_a, dep_a) = db.statement("SELECT A FROM T");
    let (on_b, dep_b) = db.statement("SELECT B FROM T");
    let (whole, dep_whole) = db.statement("SELECT * FROM T");

    let col_a = db.table.clone().with_referenced_columns(ColumnSet::from_positions([1]));
    let col_b = db.table.clone().with_referenced_columns(ColumnSet::from_positions([2]));
    db.dm.add_dependency(&dep_a, &col_a).unwrap();
    db.dm.add_dependency(&dep_b, &col_b).unwrap();
    db.dm.add_dependency(&dep_whole, &db.table).unwrap();

    let dropped = db.table.clone().with_referenced_columns(ColumnSet::from_positions([2]));
    let report = db
        .dm
        .invalidate_for(&dropped, InvalidationAction::DropColumn)
        .unwrap();

    assert!(on_a.is_valid());
    assert!(!on_b.is_valid());
    assert!(!whole.is_valid());
    assert_eq!(report.skipped, 1);
    assert_eq!(report.invalidated.len(), 2);
}

#[test]
fn test_view_restricts_drop_table() {
    let db = db();
    let view = db.view("V");
    db.dm.add_dependency(&view, &db.table).unwrap();

    let err = db
        .dm
        .invalidate_for(&db.table, InvalidationAction::DropTable)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AggregateInvalidationFailure);
    let failures = err.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].dependent_name, "V");
    assert!(matches!(
        *failures[0].error,
        DependencyError::Restrict {
            action: InvalidationAction::DropTable,
            dependent_class: DependableClass::View,
            ..
        }
    ));
    assert!(db.dd.view_descriptor(view.object_id()).unwrap().is_some());
}

#[test]
fn test_failures_do_not_stop_other_dependents() {
    let db = db();
    let view = db.view("V");
    let (stmt, dependent) = db.statement("SELECT * FROM T");
    db.dm.add_dependency(&view, &db.table).unwrap();
    db.dm.add_dependency(&dependent, &db.table).unwrap();

    let err = db
        .dm
        .invalidate_for(&db.table, InvalidationAction::Rename)
        .unwrap_err();
    assert_eq!(err.failures().len(), 1);
    assert!(!stmt.is_valid());
}

#[test]
fn test_cascade_through_views() {
    let db = db();
    let v1 = db.view("V1");
    let v1_desc = db.dd.view_descriptor(v1.object_id()).unwrap().unwrap();
    let v2 = db.view("V2");
    let (stmt, dependent) = db.statement("SELECT * FROM V2");
    let v2_desc = db.dd.view_descriptor(v2.object_id()).unwrap().unwrap();

    db.dm.add_dependency(&v1, &db.table).unwrap();
    db.dm.add_dependency(&v2, &v1_desc).unwrap();
    db.dm.add_dependency(&dependent, &v2_desc).unwrap();

    db.dm
        .invalidate_for(&db.table, InvalidationAction::DropTableCascade)
        .unwrap();

    assert!(db.dd.view_descriptor(v1.object_id()).unwrap().is_none());
    assert!(db.dd.view_descriptor(v2.object_id()).unwrap().is_none());
    assert_eq!(stmt.last_action(), Some(InvalidationAction::DropViewCascade));
    assert!(db.dd.all_stored_dependencies().unwrap().is_empty());
}

#[test]
fn test_trigger_recompiles_on_ignored_action() {
    let db = db();
    let sps = SpsDescriptor::new("TRIG_ACTION", db.schema.uuid, "INSERT INTO LOG VALUES (1)");
    let sps_id = sps.uuid;
    db.dd.add_statement(sps).unwrap();
    let trigger = TriggerDescriptor::new(
        "TRIG",
        db.schema.uuid,
        db.table.uuid,
        TriggerEvent::Insert,
        sps_id,
    );
    db.dd.add_trigger(trigger.clone()).unwrap();
    let trigger: Arc<dyn Dependent> = Arc::new(trigger);
    db.dm.add_dependency(&trigger, &db.table).unwrap();

    db.dm
        .invalidate_for(&db.table, InvalidationAction::CreateIndex)
        .unwrap();
    assert!(!db.dd.sps_descriptor(sps_id).unwrap().unwrap().valid);
    assert!(db.dd.trigger_descriptor(trigger.object_id()).unwrap().is_some());

    // Revoke drops it together with its action statement
    db.dm
        .invalidate_for(&db.table, InvalidationAction::RevokePrivilege)
        .unwrap();
    assert!(db.dd.trigger_descriptor(trigger.object_id()).unwrap().is_none());
    assert!(db.dd.sps_descriptor(sps_id).unwrap().is_none());
}

#[test]
fn test_alter_table_allowed_with_dependents() {
    let db = db();
    let view = db.view("V");
    let sps = SpsDescriptor::new("TRIG_ACTION", db.schema.uuid, "INSERT INTO LOG VALUES (1)");
    let sps_id = sps.uuid;
    db.dd.add_statement(sps).unwrap();
    let trigger = TriggerDescriptor::new(
        "TRIG",
        db.schema.uuid,
        db.table.uuid,
        TriggerEvent::Insert,
        sps_id,
    );
    db.dd.add_trigger(trigger.clone()).unwrap();
    let trigger: Arc<dyn Dependent> = Arc::new(trigger);
    let (stmt, dependent) = db.statement("SELECT * FROM T");
    db.dm.add_dependency(&view, &db.table).unwrap();
    db.dm.add_dependency(&trigger, &db.table).unwrap();
    db.dm.add_dependency(&dependent, &db.table).unwrap();

    // ALTER TABLE ADD COLUMN
    db.dm
        .invalidate_for(&db.table, InvalidationAction::AlterTable)
        .unwrap();
    assert!(db.dd.view_descriptor(view.object_id()).unwrap().is_some());
    assert!(db.dd.trigger_descriptor(trigger.object_id()).unwrap().is_some());
    assert!(!db.dd.sps_descriptor(sps_id).unwrap().unwrap().valid);
    assert_eq!(stmt.last_action(), Some(InvalidationAction::AlterTable));

    db.dm
        .invalidate_for(&db.table, InvalidationAction::ModifyColumnDefault)
        .unwrap();
    assert!(db.dd.view_descriptor(view.object_id()).unwrap().is_some());
}

#[test]
fn test_constraint_cascades_on_drop_column_cascade() {
    let db = db();
    let check = ConstraintDescriptor::check(
        "CK",
        db.table.uuid,
        db.schema.uuid,
        "B IS NOT NULL",
        ColumnSet::from_positions([2]),
    );
    let id = check.uuid;
    db.dd.add_constraint(check.clone()).unwrap();
    let check: Arc<dyn Dependent> = Arc::new(check);
    let on_b = db.table.clone().with_referenced_columns(ColumnSet::from_positions([2]));
    db.dm.add_dependency(&check, &on_b).unwrap();

    // Another column: untouched
    let on_c = db.table.clone().with_referenced_columns(ColumnSet::from_positions([3]));
    let report = db
        .dm
        .invalidate_for(&on_c, InvalidationAction::DropColumnCascade)
        .unwrap();
    assert_eq!(report.skipped, 1);
    assert!(db.dd.constraint_descriptor(id).unwrap().is_some());

    db.dm
        .invalidate_for(&on_b, InvalidationAction::DropColumnCascade)
        .unwrap();
    assert!(db.dd.constraint_descriptor(id).unwrap().is_none());
}

#[test]
fn test_clear_and_copy_dependencies() {
    let db = db();
    let view = db.view("V");
    let (_old, old_dep) = db.statement("SELECT * FROM V");
    let (_new, new_dep) = db.statement("SELECT * FROM V");
    let view_desc = db.dd.view_descriptor(view.object_id()).unwrap().unwrap();

    db.dm.add_dependency(&old_dep, &db.table).unwrap();
    db.dm.add_dependency(&old_dep, &view_desc).unwrap();
    assert_eq!(db.dm.copy_dependencies(old_dep.as_ref(), &new_dep, true).unwrap(), 2);
    assert_eq!(db.dm.providers_of(new_dep.object_id()).unwrap().len(), 2);

    assert_eq!(db.dm.clear_dependencies(old_dep.as_ref()).unwrap(), 2);
    assert!(db.dm.providers_of(old_dep.object_id()).unwrap().is_empty());

    let edge = db.dm.dependents_of(db.table.uuid).unwrap().remove(0);
    assert_eq!(edge.dependent_id, new_dep.object_id());
    assert!(db.dm.clear_in_memory_dependency(&edge));
    assert!(!db.dm.clear_in_memory_dependency(&edge));
    assert_eq!(db.dm.count_dependencies().unwrap(), 1);
}

#[test]
fn test_persistent_provider_infos() {
    let db = db();
    let view = db.view("V");
    let narrowed = db.table.clone().with_referenced_columns(ColumnSet::from_positions([1, 3]));
    db.dm.add_dependency(&view, &narrowed).unwrap();

    let infos = db.dm.persistent_provider_infos(view.object_id()).unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(
        infos[0].finder,
        DependableFinder::Columns {
            columns: ColumnSet::from_positions([1, 3])
        }
    );
    assert_eq!(infos[0].affected_columns, Some(ColumnSet::from_positions([1, 3])));
}
