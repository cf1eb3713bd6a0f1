//! Session state consulted by permission checks

/// Per-connection authorization state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Unique connection identifier
    pub connection_id: u32,
    /// Authorization id of the session user
    pub authorization_id: String,
    /// Role set with SET ROLE, if any
    pub current_role: Option<String>,
    /// Active transaction ID (None = autocommit)
    pub current_txn: Option<u64>,
}

impl SessionContext {
    pub fn new(connection_id: u32, authorization_id: impl Into<String>) -> Self {
        Self {
            connection_id,
            authorization_id: authorization_id.into(),
            current_role: None,
            current_txn: None,
        }
    }

    /// SET ROLE; `None` is SET ROLE NONE
    pub fn set_role(&mut self, role: Option<String>) {
        self.current_role = role;
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.current_role = Some(role.into());
        self
    }

    /// Statement running inside transaction `txn_id`; `None` is autocommit
    pub fn with_transaction(mut self, txn_id: Option<u64>) -> Self {
        self.current_txn = txn_id;
        self
    }
}
