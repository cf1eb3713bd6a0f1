//! Column bitmaps
//!
//! Constraints, triggers, column permissions and column-scoped dependencies all
//! refer to sets of column positions. Positions are 1-based, matching the
//! ordinal of the column in its table.

use std::fmt;
use std::hash::{Hash, Hasher};

use croaring::Bitmap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A set of 1-based column positions
///
/// Position 0 is never a member; inserting or removing it is a no-op.
#[derive(Clone)]
pub struct ColumnSet {
    bits: Bitmap,
}

impl ColumnSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            bits: Bitmap::new(),
        }
    }

    /// Build a set from column positions
    pub fn from_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut set = Self::new();
        for pos in positions {
            set.insert(pos);
        }
        set
    }

    fn slot(position: usize) -> Option<u32> {
        match u32::try_from(position) {
            Ok(0) | Err(_) => None,
            Ok(pos) => Some(pos),
        }
    }

    /// Add a position. Returns true if it was not already present.
    pub fn insert(&mut self, position: usize) -> bool {
        match Self::slot(position) {
            Some(pos) => self.bits.add_checked(pos),
            None => false,
        }
    }

    /// Remove a position. Returns true if it was present.
    pub fn remove(&mut self, position: usize) -> bool {
        match Self::slot(position) {
            Some(pos) => self.bits.remove_checked(pos),
            None => false,
        }
    }

    /// Check membership
    pub fn contains(&self, position: usize) -> bool {
        Self::slot(position).is_some_and(|pos| self.bits.contains(pos))
    }

    /// True when no position is set
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of positions set
    pub fn len(&self) -> usize {
        self.bits.cardinality() as usize
    }

    /// Iterate positions in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().map(|pos| pos as usize)
    }

    /// Whether any position is shared with `other`
    pub fn intersects(&self, other: &ColumnSet) -> bool {
        self.bits.intersect(&other.bits)
    }

    /// Whether every position of `other` is also in `self`
    pub fn is_superset(&self, other: &ColumnSet) -> bool {
        other.bits.is_subset(&self.bits)
    }

    /// Positions in `self` that are not in `other`
    pub fn difference(&self, other: &ColumnSet) -> ColumnSet {
        ColumnSet {
            bits: self.bits.andnot(&other.bits),
        }
    }

    /// Positions present in both sets
    pub fn intersection(&self, other: &ColumnSet) -> ColumnSet {
        ColumnSet {
            bits: self.bits.and(&other.bits),
        }
    }

    /// Add every position of `other`. Returns the number of newly added positions.
    pub fn union_with(&mut self, other: &ColumnSet) -> usize {
        let added = other.bits.andnot_cardinality(&self.bits) as usize;
        self.bits.or_inplace(&other.bits);
        added
    }

    /// Remove every position of `other`. Returns the number of removed positions.
    pub fn subtract(&mut self, other: &ColumnSet) -> usize {
        let removed = self.bits.and_cardinality(&other.bits) as usize;
        self.bits.andnot_inplace(&other.bits);
        removed
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ColumnSet {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for ColumnSet {}

impl Hash for ColumnSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for pos in self.bits.iter() {
            pos.hash(state);
        }
    }
}

impl fmt::Debug for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Encoded as the ascending list of positions
impl Serialize for ColumnSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.bits.iter())
    }
}

impl<'de> Deserialize<'de> for ColumnSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let positions = Vec::<u32>::deserialize(deserializer)?;
        Ok(positions.into_iter().map(|pos| pos as usize).collect())
    }
}

impl FromIterator<usize> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        ColumnSet::from_positions(iter)
    }
}

impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, pos) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", pos)?;
        }
        write!(f, "}}")
    }
}

/// Columns touched by a DML statement
///
/// An UPDATE that does not list its columns (or an empty list) modifies every
/// column, represented by `All` rather than an empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifiedColumns {
    /// Every column of the table
    All,
    /// Only these positions
    Only(ColumnSet),
}

impl ModifiedColumns {
    /// Build from an array of positions; an empty array means all columns
    pub fn from_positions(positions: &[usize]) -> Self {
        if positions.is_empty() {
            ModifiedColumns::All
        } else {
            ModifiedColumns::Only(positions.iter().copied().collect())
        }
    }

    /// Column intersection test used by constraint and trigger firing
    pub fn intersects(&self, referenced: &ColumnSet) -> bool {
        match self {
            ModifiedColumns::All => true,
            ModifiedColumns::Only(cols) => cols.intersects(referenced),
        }
    }
}
