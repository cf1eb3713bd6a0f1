//! Live prepared statements as dependents

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use uuid::Uuid;

use super::{
    Dependable, DependableFinder, DependencyResult, Dependent, InvalidationAction,
    InvalidationContext, ProviderInfo,
};

/// A compiled statement held by a session
///
/// Never persistent, so all of its edges live in the dependency manager.
/// Invalidation only marks it; the next execution recompiles.
#[derive(Debug)]
pub struct CompiledStatement {
    id: Uuid,
    sql: String,
    valid: AtomicBool,
    last_action: Mutex<Option<InvalidationAction>>,
}

impl CompiledStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sql: sql.into(),
            valid: AtomicBool::new(true),
            last_action: Mutex::new(None),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Action of the most recent invalidation
    pub fn last_action(&self) -> Option<InvalidationAction> {
        *self.last_action.lock()
    }

    /// Mark recompiled. The caller re-records dependencies afterwards.
    pub fn revalidate(&self) {
        self.valid.store(true, Ordering::Release);
    }
}

impl Dependable for CompiledStatement {
    fn object_id(&self) -> Uuid {
        self.id
    }

    fn dependable_finder(&self) -> DependableFinder {
        DependableFinder::CompiledStatement
    }

    fn object_name(&self) -> String {
        self.sql.clone()
    }
}

impl Dependent for CompiledStatement {
    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    fn prepare_to_invalidate(
        &self,
        _provider: &ProviderInfo,
        _action: InvalidationAction,
        _cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        Ok(())
    }

    fn make_invalid(
        &self,
        action: InvalidationAction,
        _cx: &InvalidationContext<'_>,
    ) -> DependencyResult<()> {
        self.valid.store(false, Ordering::Release);
        *self.last_action.lock() = Some(action);
        Ok(())
    }
}
