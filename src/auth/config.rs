//! Authorization configuration

use super::error::{AuthError, AuthResult};

/// Property enabling SQL standard authorization
pub const SQL_AUTHORIZATION_PROPERTY: &str = "roodict.authorization.sql";

/// Property naming the database owner
pub const DATABASE_OWNER_PROPERTY: &str = "roodict.authorization.owner";

/// Owner used when none is configured
pub const DEFAULT_DATABASE_OWNER: &str = "APP";

/// Database-wide authorization settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationConfig {
    /// When false every permission check passes
    pub sql_authorization: bool,
    /// Database owner. Bypasses permission checks and alone may administer roles.
    pub database_owner: String,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            sql_authorization: false,
            database_owner: DEFAULT_DATABASE_OWNER.to_string(),
        }
    }
}

impl AuthorizationConfig {
    /// Authorization enabled, owned by `database_owner`
    pub fn new(database_owner: impl Into<String>) -> Self {
        Self {
            sql_authorization: true,
            database_owner: database_owner.into(),
        }
    }

    pub fn with_sql_authorization(mut self, enabled: bool) -> Self {
        self.sql_authorization = enabled;
        self
    }

    pub fn with_database_owner(mut self, owner: impl Into<String>) -> Self {
        self.database_owner = owner.into();
        self
    }

    /// Build from `roodict.*` properties. Unknown keys are ignored.
    pub fn from_properties<I, K, V>(properties: I) -> AuthResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in properties {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                SQL_AUTHORIZATION_PROPERTY => {
                    config.sql_authorization = parse_bool(value).ok_or_else(|| {
                        AuthError::InvalidProperty {
                            key: key.to_string(),
                            value: value.to_string(),
                        }
                    })?;
                }
                DATABASE_OWNER_PROPERTY => {
                    if value.is_empty() {
                        return Err(AuthError::InvalidProperty {
                            key: key.to_string(),
                            value: value.to_string(),
                        });
                    }
                    config.database_owner = value.to_string();
                }
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn is_database_owner(&self, authorization_id: &str) -> bool {
        self.database_owner == authorization_id
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AuthorizationConfig::default();
        assert!(!config.sql_authorization);
        assert!(config.is_database_owner(DEFAULT_DATABASE_OWNER));
    }

    #[test]
    fn test_builders() {
        let config = AuthorizationConfig::new("dbo").with_sql_authorization(false);
        assert!(!config.sql_authorization);
        assert_eq!(config.database_owner, "dbo");
        let config = config.with_database_owner("alice");
        assert!(config.is_database_owner("alice"));
    }

    #[test]
    fn test_from_properties() {
        let mut props = HashMap::new();
        props.insert(SQL_AUTHORIZATION_PROPERTY, "TRUE");
        props.insert(DATABASE_OWNER_PROPERTY, " dbo ");
        props.insert("roodict.unrelated", "x");
        let config = AuthorizationConfig::from_properties(props).unwrap();
        assert!(config.sql_authorization);
        assert_eq!(config.database_owner, "dbo");
    }

    #[test]
    fn test_from_properties_rejects_bad_values() {
        let err = AuthorizationConfig::from_properties([(SQL_AUTHORIZATION_PROPERTY, "maybe")])
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidProperty { .. }));

        assert!(AuthorizationConfig::from_properties([(DATABASE_OWNER_PROPERTY, "")]).is_err());
    }
}
