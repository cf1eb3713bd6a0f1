//! Dependency manager
//!
//! Records edges and drives invalidation. Stored edges go through the
//! dictionary; in-memory edges (those with a live prepared statement at
//! either end) are kept here, indexed both by dependent and by provider,
//! together with the live dependents themselves.
//!
//! Invalidation takes a snapshot of the provider's edges, releases the lock,
//! and only then dispatches. Dependents may record or clear edges (including
//! cascading into further invalidations) while they are being invalidated.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    Dependable, Dependency, DependencyError, DependencyResult, Dependent, InvalidationAction,
    InvalidationContext, InvalidationFailure, Provider, ProviderInfo,
};
use crate::catalog::ColumnSet;
use crate::dictionary::DataDictionary;

#[derive(Default)]
struct InMemoryDependencies {
    /// Edges by dependent id
    dependents: HashMap<Uuid, Vec<Dependency>>,
    /// Edges by provider id
    providers: HashMap<Uuid, Vec<Dependency>>,
    /// Live dependents that have at least one in-memory edge
    live: HashMap<Uuid, Arc<dyn Dependent>>,
}

impl InMemoryDependencies {
    fn add(&mut self, dep: Dependency, dependent: &Arc<dyn Dependent>) -> bool {
        let by_dependent = self.dependents.entry(dep.dependent_id).or_default();
        if by_dependent.contains(&dep) {
            return false;
        }
        by_dependent.push(dep.clone());
        self.providers.entry(dep.provider_id).or_default().push(dep.clone());
        if !dependent.is_persistent() {
            self.live
                .entry(dep.dependent_id)
                .or_insert_with(|| Arc::clone(dependent));
        }
        true
    }

    fn remove(&mut self, dep: &Dependency) -> bool {
        let mut removed = false;
        if let Some(list) = self.dependents.get_mut(&dep.dependent_id) {
            let before = list.len();
            list.retain(|d| d != dep);
            removed = list.len() != before;
            if list.is_empty() {
                self.dependents.remove(&dep.dependent_id);
                self.live.remove(&dep.dependent_id);
            }
        }
        if let Some(list) = self.providers.get_mut(&dep.provider_id) {
            list.retain(|d| d != dep);
            if list.is_empty() {
                self.providers.remove(&dep.provider_id);
            }
        }
        removed
    }

    fn edge_count(&self) -> usize {
        self.dependents.values().map(Vec::len).sum()
    }
}

/// Summary of a successful invalidation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvalidationReport {
    /// Dependents that were told, in dispatch order
    pub invalidated: Vec<Uuid>,
    /// Edges skipped because their columns do not intersect the change
    pub skipped: usize,
}

impl InvalidationReport {
    pub fn is_empty(&self) -> bool {
        self.invalidated.is_empty()
    }
}

/// Records dependencies and propagates invalidation
pub struct DependencyManager {
    dictionary: Arc<dyn DataDictionary>,
    memory: Mutex<InMemoryDependencies>,
}

impl DependencyManager {
    pub fn new(dictionary: Arc<dyn DataDictionary>) -> Self {
        Self {
            dictionary,
            memory: Mutex::new(InMemoryDependencies::default()),
        }
    }

    pub fn dictionary(&self) -> &dyn DataDictionary {
        self.dictionary.as_ref()
    }

    /// Record that `dependent` depends on `provider`
    ///
    /// Both persistent: the edge is stored through the dictionary. Otherwise
    /// it is kept in memory. Returns false if an identical edge already exists.
    pub fn add_dependency<P>(
        &self,
        dependent: &Arc<dyn Dependent>,
        provider: &P,
    ) -> DependencyResult<bool>
    where
        P: Provider + ?Sized,
    {
        let dep = Dependency::new(dependent.as_ref(), provider);
        self.record(dep, dependent)
    }

    fn record(&self, dep: Dependency, dependent: &Arc<dyn Dependent>) -> DependencyResult<bool> {
        let added = if dep.is_stored() {
            self.dictionary.add_stored_dependency(&dep)?
        } else {
            self.memory.lock().add(dep.clone(), dependent)
        };
        if added {
            debug!(
                dependent = %dep.dependent_id,
                dependent_class = %dep.dependent_finder.class(),
                provider = %dep.provider_id,
                provider_class = %dep.provider_finder.class(),
                stored = dep.is_stored(),
                "dependency added"
            );
        }
        Ok(added)
    }

    /// Tell every dependent of `provider` about `action`
    ///
    /// Each dependent first gets a chance to refuse, then is invalidated. A
    /// failing dependent is recorded and the rest are still processed; if any
    /// failed the whole call fails with `InvalidationFailed` listing them.
    /// Invalidations that succeeded stay in effect.
    ///
    /// When the provider narrows the change to some columns, edges that are
    /// themselves narrowed to disjoint columns are skipped.
    pub fn invalidate_for<P>(
        &self,
        provider: &P,
        action: InvalidationAction,
    ) -> DependencyResult<InvalidationReport>
    where
        P: Provider + ?Sized,
    {
        let provider_id = provider.object_id();
        let affected = provider.provider_columns().cloned();

        let mut edges = self.dictionary.stored_dependencies_for_provider(provider_id)?;
        let live = {
            let memory = self.memory.lock();
            if let Some(list) = memory.providers.get(&provider_id) {
                edges.extend(list.iter().cloned());
            }
            memory.live.clone()
        };

        let base = ProviderInfo::from_provider(provider);
        let cx = InvalidationContext {
            dictionary: self.dictionary.as_ref(),
            manager: self,
        };
        let mut report = InvalidationReport::default();
        let mut failures = Vec::new();
        let mut seen = HashSet::new();

        for edge in edges {
            let narrowed = match narrow(affected.as_ref(), edge.provider_finder.columns()) {
                Narrowing::Skip => {
                    report.skipped += 1;
                    continue;
                }
                Narrowing::Columns(cols) => cols,
            };
            if !seen.insert(edge.dependent_id) {
                continue;
            }

            let dependent: Arc<dyn Dependent> = match live.get(&edge.dependent_id) {
                Some(d) => Arc::clone(d),
                None => match edge
                    .dependent_finder
                    .resolve(self.dictionary.as_ref(), edge.dependent_id)
                {
                    Ok(Some(obj)) => match obj.into_dependent() {
                        Some(d) => Arc::from(d),
                        None => {
                            warn!(dependent = %edge.dependent_id, "dependency on object that cannot be invalidated");
                            continue;
                        }
                    },
                    // Already dropped, e.g. by an earlier cascade in this pass
                    Ok(None) => continue,
                    Err(e) => {
                        failures.push(InvalidationFailure {
                            dependent_id: edge.dependent_id,
                            dependent_name: edge.dependent_id.to_string(),
                            error: Box::new(e.into()),
                        });
                        continue;
                    }
                },
            };

            let info = ProviderInfo {
                affected_columns: narrowed,
                ..base.clone()
            };
            debug!(
                provider = %info.name,
                dependent = %dependent.object_name(),
                action = %action,
                "invalidating dependent"
            );
            let outcome = dependent
                .prepare_to_invalidate(&info, action, &cx)
                .and_then(|()| dependent.make_invalid(action, &cx));
            match outcome {
                Ok(()) => report.invalidated.push(edge.dependent_id),
                Err(e) => {
                    warn!(
                        provider = %info.name,
                        dependent = %dependent.object_name(),
                        action = %action,
                        error = %e,
                        "dependent failed to invalidate"
                    );
                    failures.push(InvalidationFailure {
                        dependent_id: edge.dependent_id,
                        dependent_name: dependent.object_name(),
                        error: Box::new(e),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(DependencyError::InvalidationFailed {
                provider_name: base.name,
                action,
                failures,
            })
        }
    }

    /// Remove every edge of a dependent, stored and in memory. Returns the
    /// number of edges removed.
    pub fn clear_dependencies<D>(&self, dependent: &D) -> DependencyResult<usize>
    where
        D: Dependable + ?Sized,
    {
        let id = dependent.object_id();
        let stored = if dependent.is_persistent() {
            self.dictionary.drop_dependents_stored_dependencies(id)?
        } else {
            0
        };
        let mut memory = self.memory.lock();
        let edges = memory.dependents.get(&id).cloned().unwrap_or_default();
        for edge in &edges {
            memory.remove(edge);
        }
        memory.live.remove(&id);
        debug!(dependent = %id, stored, in_memory = edges.len(), "dependencies cleared");
        Ok(stored + edges.len())
    }

    /// Remove one in-memory edge. Returns whether it existed.
    pub fn clear_in_memory_dependency(&self, dep: &Dependency) -> bool {
        self.memory.lock().remove(dep)
    }

    /// Give `to` every provider `from` has
    ///
    /// With `persistent_only`, providers that are not persistent are skipped.
    /// Returns the number of new edges.
    pub fn copy_dependencies<D>(
        &self,
        from: &D,
        to: &Arc<dyn Dependent>,
        persistent_only: bool,
    ) -> DependencyResult<usize>
    where
        D: Dependable + ?Sized,
    {
        let mut copied = 0;
        for edge in self.edges_of_dependent(from.object_id())? {
            if persistent_only && !edge.provider_finder.is_persistent() {
                continue;
            }
            let dep = Dependency {
                dependent_id: to.object_id(),
                dependent_finder: to.dependable_finder(),
                provider_id: edge.provider_id,
                provider_finder: edge.provider_finder,
            };
            if self.record(dep, to)? {
                copied += 1;
            }
        }
        Ok(copied)
    }

    fn edges_of_dependent(&self, dependent_id: Uuid) -> DependencyResult<Vec<Dependency>> {
        let mut edges = self
            .dictionary
            .stored_dependencies_for_dependent(dependent_id)?;
        if let Some(list) = self.memory.lock().dependents.get(&dependent_id) {
            edges.extend(list.iter().cloned());
        }
        Ok(edges)
    }

    /// Providers of a dependent, stored and in memory
    pub fn providers_of(&self, dependent_id: Uuid) -> DependencyResult<Vec<ProviderInfo>> {
        self.edges_of_dependent(dependent_id)?
            .into_iter()
            .map(|edge| {
                let name = match edge
                    .provider_finder
                    .resolve(self.dictionary.as_ref(), edge.provider_id)?
                {
                    Some(obj) => obj.object_name(),
                    None => edge.provider_id.to_string(),
                };
                Ok(ProviderInfo {
                    id: edge.provider_id,
                    affected_columns: edge.provider_finder.columns().cloned(),
                    finder: edge.provider_finder,
                    name,
                })
            })
            .collect()
    }

    /// Persistent providers of a dependent
    pub fn persistent_provider_infos(
        &self,
        dependent_id: Uuid,
    ) -> DependencyResult<Vec<ProviderInfo>> {
        Ok(self
            .providers_of(dependent_id)?
            .into_iter()
            .filter(|p| p.finder.is_persistent())
            .collect())
    }

    /// Edges into a provider, stored and in memory
    pub fn dependents_of(&self, provider_id: Uuid) -> DependencyResult<Vec<Dependency>> {
        let mut edges = self.dictionary.stored_dependencies_for_provider(provider_id)?;
        if let Some(list) = self.memory.lock().providers.get(&provider_id) {
            edges.extend(list.iter().cloned());
        }
        Ok(edges)
    }

    /// Number of edges, stored and in memory
    pub fn count_dependencies(&self) -> DependencyResult<usize> {
        let stored = self.dictionary.all_stored_dependencies()?.len();
        Ok(stored + self.memory.lock().edge_count())
    }

    /// Human-readable listing of every edge, stored first
    pub fn dump_dependencies(&self) -> DependencyResult<String> {
        let stored = self.dictionary.all_stored_dependencies()?;
        let mut in_memory: Vec<Dependency> = self
            .memory
            .lock()
            .dependents
            .values()
            .flatten()
            .cloned()
            .collect();
        in_memory.sort_by_key(|d| (d.dependent_id, d.provider_id));

        let mut out = String::new();
        for (label, edges) in [("stored", &stored), ("in-memory", &in_memory)] {
            for dep in edges {
                let _ = writeln!(
                    out,
                    "{} {} {} -> {} {}{}",
                    label,
                    dep.dependent_finder.class(),
                    dep.dependent_id,
                    dep.provider_finder.class(),
                    dep.provider_id,
                    dep.provider_finder
                        .columns()
                        .map(|c| format!(" {}", c))
                        .unwrap_or_default()
                );
            }
        }
        Ok(out)
    }
}

enum Narrowing {
    Skip,
    Columns(Option<ColumnSet>),
}

/// Columns of a change that an edge cares about
fn narrow(affected: Option<&ColumnSet>, edge_columns: Option<&ColumnSet>) -> Narrowing {
    match (affected, edge_columns) {
        (Some(affected), Some(edge)) => {
            let subset = affected.intersection(edge);
            if subset.is_empty() {
                Narrowing::Skip
            } else {
                Narrowing::Columns(Some(subset))
            }
        }
        (Some(affected), None) => Narrowing::Columns(Some(affected.clone())),
        (None, _) => Narrowing::Columns(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow() {
        let affected = ColumnSet::from_positions([2, 3]);
        assert!(matches!(
            narrow(Some(&affected), Some(&ColumnSet::from_positions([5]))),
            Narrowing::Skip
        ));
        match narrow(Some(&affected), Some(&ColumnSet::from_positions([3, 5]))) {
            Narrowing::Columns(Some(cols)) => assert_eq!(cols, ColumnSet::from_positions([3])),
            _ => panic!("expected narrowed columns"),
        }
        assert!(matches!(
            narrow(Some(&affected), None),
            Narrowing::Columns(Some(_))
        ));
        assert!(matches!(
            narrow(None, Some(&affected)),
            Narrowing::Columns(None)
        ));
    }
}
