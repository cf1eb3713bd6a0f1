//! Role closure
//!
//! Role grants form a graph: `GRANT a TO b` is an edge `a -> b`. The closure
//! iterator walks that graph from a root role and yields every reachable role
//! exactly once, root first.
//!
//! - `Inverse` follows edges backwards and yields the roles granted to the
//!   root, directly or through other roles. This is the set of roles a session
//!   holds when the root is its current role.
//! - `Forward` follows edges and yields the roles the root is granted to. This
//!   is the set of roles affected when the root is revoked or dropped.
//!
//! Grants to users or PUBLIC are not edges, and neither are definition rows.
//! The seen-set bounds the walk even if a cycle slipped into the catalog.

use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::dictionary::{DataDictionary, DictionaryResult};
use crate::permission::PermissionsDescriptor;

/// Grantor recorded on role definitions
pub const SYSTEM_GRANTOR: &str = "_SYSTEM";

/// Direction of a closure walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureDirection {
    /// Roles the root is granted to
    Forward,
    /// Roles granted to the root
    Inverse,
}

#[derive(Debug)]
enum ClosureState {
    Initialized {
        root: String,
    },
    Iterating {
        /// Discovered, not yet yielded
        pending: VecDeque<String>,
        /// Yielded, edges not yet fetched
        frontier: VecDeque<String>,
        seen: HashSet<String>,
    },
    Exhausted,
}

/// Lazy walk over the role grant graph
pub struct RoleClosureIterator<'a> {
    dd: &'a dyn DataDictionary,
    direction: ClosureDirection,
    state: ClosureState,
}

impl<'a> RoleClosureIterator<'a> {
    pub fn new(dd: &'a dyn DataDictionary, root: impl Into<String>, direction: ClosureDirection) -> Self {
        Self {
            dd,
            direction,
            state: ClosureState::Initialized { root: root.into() },
        }
    }

    /// Roles granted to `root`, transitively, root included
    pub fn inverse(dd: &'a dyn DataDictionary, root: impl Into<String>) -> Self {
        Self::new(dd, root, ClosureDirection::Inverse)
    }

    /// Roles `root` is granted to, transitively, root included
    pub fn forward(dd: &'a dyn DataDictionary, root: impl Into<String>) -> Self {
        Self::new(dd, root, ClosureDirection::Forward)
    }

    pub fn direction(&self) -> ClosureDirection {
        self.direction
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, ClosureState::Exhausted)
    }

    /// Next role, or `Ok(None)` once every reachable role has been yielded
    ///
    /// A dictionary failure is returned once and leaves the iterator exhausted.
    pub fn next_role(&mut self) -> DictionaryResult<Option<String>> {
        match self.advance() {
            Ok(Some(role)) => Ok(Some(role)),
            Ok(None) => {
                self.state = ClosureState::Exhausted;
                Ok(None)
            }
            Err(e) => {
                self.state = ClosureState::Exhausted;
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> DictionaryResult<Option<String>> {
        if let ClosureState::Initialized { root } = &self.state {
            let root = root.clone();
            let mut seen = HashSet::new();
            seen.insert(root.clone());
            self.state = ClosureState::Iterating {
                pending: VecDeque::new(),
                frontier: VecDeque::from([root.clone()]),
                seen,
            };
            return Ok(Some(root));
        }

        let ClosureState::Iterating {
            pending,
            frontier,
            seen,
        } = &mut self.state
        else {
            return Ok(None);
        };

        loop {
            if let Some(role) = pending.pop_front() {
                frontier.push_back(role.clone());
                return Ok(Some(role));
            }
            let Some(node) = frontier.pop_front() else {
                return Ok(None);
            };
            for next in neighbours(self.dd, &node, self.direction)? {
                if seen.insert(next.clone()) {
                    trace!(from = %node, to = %next, "role closure edge");
                    pending.push_back(next);
                }
            }
        }
    }
}

fn neighbours(
    dd: &dyn DataDictionary,
    role: &str,
    direction: ClosureDirection,
) -> DictionaryResult<Vec<String>> {
    match direction {
        ClosureDirection::Inverse => Ok(dd
            .role_grants_to_grantee(role)?
            .iter()
            .filter_map(PermissionsDescriptor::role_name)
            .map(str::to_string)
            .collect()),
        ClosureDirection::Forward => {
            let mut roles = Vec::new();
            for grant in dd.role_grants_of_role(role)? {
                if dd.role_definition(grant.grantee())?.is_some() {
                    roles.push(grant.grantee().to_string());
                }
            }
            Ok(roles)
        }
    }
}

impl Iterator for RoleClosureIterator<'_> {
    type Item = DictionaryResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_role().transpose()
    }
}

/// Whether `role` is reachable from `root` in the given direction
pub fn closure_contains(
    dd: &dyn DataDictionary,
    root: &str,
    role: &str,
    direction: ClosureDirection,
) -> DictionaryResult<bool> {
    for found in RoleClosureIterator::new(dd, root, direction) {
        if found? == role {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::MemoryDictionary;

    fn dictionary(edges: &[(&str, &str)]) -> MemoryDictionary {
        let dd = MemoryDictionary::new();
        let mut roles: Vec<&str> = edges.iter().flat_map(|(a, b)| [*a, *b]).collect();
        roles.sort_unstable();
        roles.dedup();
        for role in roles {
            dd.add_role_grant(PermissionsDescriptor::role_definition(role, "dbo"))
                .unwrap();
        }
        for (role, grantee) in edges {
            dd.add_role_grant(PermissionsDescriptor::role_grant(*role, *grantee, "dbo"))
                .unwrap();
        }
        dd
    }

    fn collect(iter: RoleClosureIterator<'_>) -> Vec<String> {
        iter.collect::<DictionaryResult<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_root_only() {
        let dd = MemoryDictionary::new();
        let mut iter = RoleClosureIterator::inverse(&dd, "lonely");
        assert_eq!(iter.next_role().unwrap().as_deref(), Some("lonely"));
        assert_eq!(iter.next_role().unwrap(), None);
        assert!(iter.is_exhausted());
        assert_eq!(iter.next_role().unwrap(), None);
    }

    #[test]
    fn test_forward_chain() {
        let dd = dictionary(&[("a", "b"), ("b", "c")]);
        assert_eq!(collect(RoleClosureIterator::forward(&dd, "a")), vec!["a", "b", "c"]);
        assert_eq!(collect(RoleClosureIterator::inverse(&dd, "c")), vec!["c", "b", "a"]);
        assert_eq!(collect(RoleClosureIterator::forward(&dd, "c")), vec!["c"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let dd = dictionary(&[("a", "b"), ("b", "a")]);
        let mut found = collect(RoleClosureIterator::forward(&dd, "a"));
        found.sort();
        assert_eq!(found, vec!["a", "b"]);
    }

    #[test]
    fn test_users_are_not_edges() {
        let dd = dictionary(&[("a", "b")]);
        dd.add_role_grant(PermissionsDescriptor::role_grant("a", "bob", "dbo"))
            .unwrap();
        dd.add_role_grant(PermissionsDescriptor::role_grant("b", "PUBLIC", "dbo"))
            .unwrap();
        assert_eq!(collect(RoleClosureIterator::forward(&dd, "a")), vec!["a", "b"]);
        assert!(closure_contains(&dd, "a", "b", ClosureDirection::Forward).unwrap());
        assert!(!closure_contains(&dd, "a", "bob", ClosureDirection::Forward).unwrap());
    }
}
