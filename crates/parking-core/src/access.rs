//! # Access Module
//!
//! The role-check contract. Identity and token handling stay with the
//! request layer; it resolves the caller into an [`Actor`] and the core only
//! compares roles.
//!
//! ## Role Hierarchy
//! ```text
//! Operator  <  Manager  <  Admin
//!
//! Operator: open/close register, check-in/out, sales, expenses
//! Manager:  + billing methods, register reopen
//! Admin:    everything
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Staff role, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Operator,
    Manager,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Operator => write!(f, "operator"),
            Role::Manager => write!(f, "manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// The resolved caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
        }
    }

    /// Fails with `Forbidden` unless this actor's role is at least `required`.
    pub fn require(&self, required: Role, action: &str) -> CoreResult<()> {
        require_role(self.role, required, action)
    }
}

/// Fails with `Forbidden` unless `actual >= required`.
pub fn require_role(actual: Role, required: Role, action: &str) -> CoreResult<()> {
    if actual >= required {
        return Ok(());
    }

    Err(CoreError::Forbidden {
        actual,
        required,
        action: action.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Operator < Role::Manager);
        assert!(Role::Manager < Role::Admin);
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(Role::Admin, Role::Manager, "reopen register").is_ok());
        assert!(require_role(Role::Manager, Role::Manager, "reopen register").is_ok());

        let err = require_role(Role::Operator, Role::Manager, "reopen register").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(
            err.to_string(),
            "Role operator cannot reopen register: requires manager"
        );
    }
}
