//! Authorization
//!
//! Permission checks for compiled statements, recording of the grants
//! persistent objects rely on, and GRANT/REVOKE/role administration.

pub mod config;
pub mod error;
pub mod grant;
pub mod session;
pub mod statement;

pub use config::AuthorizationConfig;
pub use error::{AuthError, AuthResult};
pub use grant::PrivilegeAdmin;
pub use session::SessionContext;
pub use statement::{AuthorizationContext, Authorizer, StatementPermission};
