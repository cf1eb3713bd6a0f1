//! Privilege kinds and privilege sets
//!
//! Table and schema permission rows hold a set of privileges, each either
//! absent, granted, or granted with grant option.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Privilege types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Privilege {
    /// Read data
    Select,
    /// Add data
    Insert,
    /// Modify data
    Update,
    /// Remove data
    Delete,
    /// Reference in a foreign key
    References,
    /// Create triggers on a table
    Trigger,
    /// Invoke a routine
    Execute,
    /// Use a sequence, type or aggregate
    Usage,
    /// Create objects in a schema
    Create,
    /// Alter objects in a schema
    Modify,
    /// Drop objects in a schema
    Drop,
}

impl Privilege {
    /// Parse privilege name from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SELECT" => Some(Privilege::Select),
            "INSERT" => Some(Privilege::Insert),
            "UPDATE" => Some(Privilege::Update),
            "DELETE" => Some(Privilege::Delete),
            "REFERENCES" => Some(Privilege::References),
            "TRIGGER" => Some(Privilege::Trigger),
            "EXECUTE" => Some(Privilege::Execute),
            "USAGE" => Some(Privilege::Usage),
            "CREATE" => Some(Privilege::Create),
            "MODIFY" => Some(Privilege::Modify),
            "DROP" => Some(Privilege::Drop),
            _ => None,
        }
    }

    /// Convert to string representation for storage
    pub fn to_str(&self) -> &'static str {
        match self {
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::References => "REFERENCES",
            Privilege::Trigger => "TRIGGER",
            Privilege::Execute => "EXECUTE",
            Privilege::Usage => "USAGE",
            Privilege::Create => "CREATE",
            Privilege::Modify => "MODIFY",
            Privilege::Drop => "DROP",
        }
    }

    /// Privileges that ALL PRIVILEGES expands to on a table
    pub fn table_privileges() -> [Privilege; 6] {
        [
            Privilege::Select,
            Privilege::Delete,
            Privilege::Insert,
            Privilege::Update,
            Privilege::References,
            Privilege::Trigger,
        ]
    }

    /// Whether the privilege can be granted on individual columns
    pub fn is_column_privilege(&self) -> bool {
        matches!(
            self,
            Privilege::Select | Privilege::Update | Privilege::References
        )
    }

    /// Whether the privilege is a schema privilege
    pub fn is_schema_privilege(&self) -> bool {
        matches!(self, Privilege::Create | Privilege::Modify | Privilege::Drop)
    }

    fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// State of one privilege in a permission row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Absent,
    Granted,
    Grantable,
}

/// A set of privileges with per-privilege grant option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrivilegeSet {
    granted: u16,
    grantable: u16,
}

impl PrivilegeSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding the given privileges, without grant option
    pub fn of(privileges: &[Privilege]) -> Self {
        let mut set = Self::new();
        for p in privileges {
            set.set(*p, Grant::Granted);
        }
        set
    }

    /// Add a privilege
    #[must_use]
    pub fn with(mut self, privilege: Privilege, grant: Grant) -> Self {
        self.set(privilege, grant);
        self
    }

    /// Set the state of one privilege
    pub fn set(&mut self, privilege: Privilege, grant: Grant) {
        let bit = privilege.bit();
        match grant {
            Grant::Absent => {
                self.granted &= !bit;
                self.grantable &= !bit;
            }
            Grant::Granted => {
                self.granted |= bit;
                self.grantable &= !bit;
            }
            Grant::Grantable => {
                self.granted |= bit;
                self.grantable |= bit;
            }
        }
    }

    /// State of one privilege
    pub fn get(&self, privilege: Privilege) -> Grant {
        let bit = privilege.bit();
        if self.grantable & bit != 0 {
            Grant::Grantable
        } else if self.granted & bit != 0 {
            Grant::Granted
        } else {
            Grant::Absent
        }
    }

    /// Whether the privilege is held, with grant option when `for_grant`
    pub fn allows(&self, privilege: Privilege, for_grant: bool) -> bool {
        match self.get(privilege) {
            Grant::Absent => false,
            Grant::Granted => !for_grant,
            Grant::Grantable => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.granted == 0
    }

    /// Merge `other` into `self`. Returns the number of privilege states that
    /// changed (newly granted, or upgraded to grantable).
    pub fn union_with(&mut self, other: &PrivilegeSet) -> usize {
        let new_granted = other.granted & !self.granted;
        let new_grantable = other.grantable & !self.grantable;
        self.granted |= other.granted;
        self.grantable |= other.grantable;
        (new_granted | new_grantable).count_ones() as usize
    }

    /// Revoke the privileges in `other`. Returns the number of privileges
    /// that were held and are now gone.
    pub fn subtract(&mut self, other: &PrivilegeSet) -> usize {
        let removed = self.granted & other.granted;
        self.granted &= !other.granted;
        self.grantable &= !other.granted;
        removed.count_ones() as usize
    }

    /// Privileges held, in declaration order
    pub fn privileges(&self) -> Vec<Privilege> {
        ALL_PRIVILEGES
            .iter()
            .copied()
            .filter(|p| self.granted & p.bit() != 0)
            .collect()
    }
}

const ALL_PRIVILEGES: [Privilege; 11] = [
    Privilege::Select,
    Privilege::Insert,
    Privilege::Update,
    Privilege::Delete,
    Privilege::References,
    Privilege::Trigger,
    Privilege::Execute,
    Privilege::Usage,
    Privilege::Create,
    Privilege::Modify,
    Privilege::Drop,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip_names() {
        for p in ALL_PRIVILEGES {
            assert_eq!(Privilege::parse(p.to_str()), Some(p));
        }
        assert_eq!(Privilege::parse("select"), Some(Privilege::Select));
        assert_eq!(Privilege::parse("GRANT OPTION"), None);
    }

    #[test]
    fn test_grant_states() {
        let set = PrivilegeSet::new()
            .with(Privilege::Select, Grant::Grantable)
            .with(Privilege::Insert, Grant::Granted);
        assert!(set.allows(Privilege::Select, true));
        assert!(set.allows(Privilege::Insert, false));
        assert!(!set.allows(Privilege::Insert, true));
        assert!(!set.allows(Privilege::Delete, false));
        assert_eq!(set.privileges(), vec![Privilege::Select, Privilege::Insert]);
    }

    #[test]
    fn test_union_counts_upgrades() {
        let mut set = PrivilegeSet::of(&[Privilege::Select]);
        let other = PrivilegeSet::new()
            .with(Privilege::Select, Grant::Grantable)
            .with(Privilege::Delete, Grant::Granted);
        assert_eq!(set.union_with(&other), 2);
        assert_eq!(set.union_with(&other), 0);
        assert_eq!(set.get(Privilege::Select), Grant::Grantable);
    }

    #[test]
    fn test_subtract_then_empty() {
        let mut set = PrivilegeSet::of(&[Privilege::Select, Privilege::Update]);
        assert_eq!(set.subtract(&PrivilegeSet::of(&[Privilege::Update])), 1);
        assert_eq!(set.subtract(&PrivilegeSet::of(&[Privilege::Update])), 0);
        assert!(!set.is_empty());
        assert_eq!(set.subtract(&PrivilegeSet::of(&[Privilege::Select])), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_privilege_classes() {
        assert!(Privilege::References.is_column_privilege());
        assert!(!Privilege::Delete.is_column_privilege());
        assert!(Privilege::Modify.is_schema_privilege());
        assert_eq!(Privilege::table_privileges().len(), 6);
    }
}
