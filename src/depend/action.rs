//! Invalidation actions

use std::fmt;

/// Cause of an invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationAction {
    AlterTable,
    /// Rename of a table or column
    Rename,
    RenameIndex,
    CompileFailed,
    DropTable,
    DropIndex,
    DropView,
    CreateIndex,
    Rollback,
    ChangedCursor,
    CreateConstraint,
    DropConstraint,
    DropRoutine,
    PreparedStatementRelease,
    DropStoredStatement,
    UserRecompileRequest,
    BulkInsert,
    CreateView,
    DropJar,
    ReplaceJar,
    SetConstraintsEnable,
    SetConstraintsDisable,
    InternalRecompileRequest,
    CreateTrigger,
    DropTrigger,
    SetTriggersEnable,
    SetTriggersDisable,
    ModifyColumnDefault,
    CompressTable,
    DropTableCascade,
    DropViewCascade,
    DropColumn,
    DropColumnCascade,
    DropStatistics,
    UpdateStatistics,
    TruncateTable,
    DropSynonym,
    RevokePrivilege,
    RevokePrivilegeRestrict,
    RevokeRole,
    DropSequence,
    DropUdt,
    DropAggregate,
}

/// How a persistent dependent reacts to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Nothing to do beyond recompiling
    Ignore,
    /// Drop the dependent along with the provider change
    Cascade,
    /// Refuse the provider change
    Restrict,
}

impl InvalidationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidationAction::AlterTable => "ALTER TABLE",
            InvalidationAction::Rename => "RENAME",
            InvalidationAction::RenameIndex => "RENAME INDEX",
            InvalidationAction::CompileFailed => "COMPILE FAILED",
            InvalidationAction::DropTable => "DROP TABLE",
            InvalidationAction::DropIndex => "DROP INDEX",
            InvalidationAction::DropView => "DROP VIEW",
            InvalidationAction::CreateIndex => "CREATE INDEX",
            InvalidationAction::Rollback => "ROLLBACK",
            InvalidationAction::ChangedCursor => "CHANGED CURSOR",
            InvalidationAction::CreateConstraint => "CREATE CONSTRAINT",
            InvalidationAction::DropConstraint => "DROP CONSTRAINT",
            InvalidationAction::DropRoutine => "DROP ROUTINE",
            InvalidationAction::PreparedStatementRelease => "PREPARED STATEMENT RELEASE",
            InvalidationAction::DropStoredStatement => "DROP STORED PREPARED STATEMENT",
            InvalidationAction::UserRecompileRequest => "USER REQUESTED INVALIDATION",
            InvalidationAction::BulkInsert => "BULK INSERT",
            InvalidationAction::CreateView => "CREATE_VIEW",
            InvalidationAction::DropJar => "DROP_JAR",
            InvalidationAction::ReplaceJar => "REPLACE_JAR",
            InvalidationAction::SetConstraintsEnable => "SET_CONSTRAINTS_ENABLE",
            InvalidationAction::SetConstraintsDisable => "SET_CONSTRAINTS_DISABLE",
            InvalidationAction::InternalRecompileRequest => "INTERNAL RECOMPILE REQUEST",
            InvalidationAction::CreateTrigger => "CREATE TRIGGER",
            InvalidationAction::DropTrigger => "DROP TRIGGER",
            InvalidationAction::SetTriggersEnable => "SET TRIGGERS ENABLED",
            InvalidationAction::SetTriggersDisable => "SET TRIGGERS DISABLED",
            InvalidationAction::ModifyColumnDefault => "MODIFY COLUMN DEFAULT",
            InvalidationAction::CompressTable => "COMPRESS TABLE",
            InvalidationAction::DropTableCascade => "DROP TABLE CASCADE",
            InvalidationAction::DropViewCascade => "DROP VIEW CASCADE",
            InvalidationAction::DropColumn => "DROP COLUMN",
            InvalidationAction::DropColumnCascade => "DROP COLUMN CASCADE",
            InvalidationAction::DropStatistics => "DROP STATISTICS",
            InvalidationAction::UpdateStatistics => "UPDATE STATISTICS",
            InvalidationAction::TruncateTable => "TRUNCATE TABLE",
            InvalidationAction::DropSynonym => "DROP SYNONYM",
            InvalidationAction::RevokePrivilege => "REVOKE PRIVILEGE",
            InvalidationAction::RevokePrivilegeRestrict => "REVOKE PRIVILEGE RESTRICT",
            InvalidationAction::RevokeRole => "REVOKE ROLE",
            InvalidationAction::DropSequence => "DROP SEQUENCE",
            InvalidationAction::DropUdt => "DROP TYPE",
            InvalidationAction::DropAggregate => "DROP AGGREGATE",
        }
    }

    /// Reaction of views, triggers and constraints
    pub fn disposition(&self) -> Disposition {
        use InvalidationAction::*;
        match self {
            RevokePrivilege | RevokeRole | DropTableCascade | DropViewCascade
            | DropColumnCascade => Disposition::Cascade,
            BulkInsert | CompressTable | CreateConstraint | DropConstraint | CreateIndex
            | DropIndex | CreateTrigger | DropTrigger | SetConstraintsEnable
            | SetConstraintsDisable | SetTriggersEnable | SetTriggersDisable | TruncateTable
            | UpdateStatistics | DropStatistics | RenameIndex | InternalRecompileRequest
            | UserRecompileRequest | ChangedCursor | Rollback | CompileFailed
            | PreparedStatementRelease | AlterTable | ModifyColumnDefault => Disposition::Ignore,
            _ => Disposition::Restrict,
        }
    }
}

impl fmt::Display for InvalidationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_strings() {
        assert_eq!(
            InvalidationAction::DropStoredStatement.as_str(),
            "DROP STORED PREPARED STATEMENT"
        );
        assert_eq!(InvalidationAction::RevokeRole.to_string(), "REVOKE ROLE");
        assert_eq!(InvalidationAction::SetTriggersEnable.as_str(), "SET TRIGGERS ENABLED");
    }

    #[test]
    fn test_dispositions() {
        assert_eq!(
            InvalidationAction::RevokePrivilege.disposition(),
            Disposition::Cascade
        );
        assert_eq!(
            InvalidationAction::DropColumnCascade.disposition(),
            Disposition::Cascade
        );
        assert_eq!(InvalidationAction::CreateIndex.disposition(), Disposition::Ignore);
        assert_eq!(InvalidationAction::TruncateTable.disposition(), Disposition::Ignore);
        assert_eq!(InvalidationAction::AlterTable.disposition(), Disposition::Ignore);
        assert_eq!(
            InvalidationAction::ModifyColumnDefault.disposition(),
            Disposition::Ignore
        );
        assert_eq!(InvalidationAction::DropTable.disposition(), Disposition::Restrict);
        assert_eq!(InvalidationAction::Rename.disposition(), Disposition::Restrict);
        assert_eq!(InvalidationAction::DropColumn.disposition(), Disposition::Restrict);
    }
}
