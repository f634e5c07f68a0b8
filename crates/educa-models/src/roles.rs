//! User roles (Papel).
//!
//! Every user has exactly one role. Roles are stored in PostgreSQL as the
//! `papel` enum type and travel over the wire (JSON, JWT claims) using their
//! Portuguese names:
//!
//! | Variant | Wire name | Scope |
//! |---------|-----------|-------|
//! | [`Role::Administrator`] | `ADMINISTRADOR` | Full access, user management |
//! | [`Role::Manager`] | `GESTOR` | School management: classes, enrollments, reports |
//! | [`Role::Teacher`] | `PROFESSOR` | Own classes: tasks, grading, forum moderation |
//! | [`Role::Student`] | `ALUNO` | Enrolled classes: submissions, forum |
//! | [`Role::Guardian`] | `RESPONSAVEL` | Read-only view of linked students |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "papel")]
pub enum Role {
    #[serde(rename = "ADMINISTRADOR")]
    #[sqlx(rename = "ADMINISTRADOR")]
    Administrator,
    #[serde(rename = "PROFESSOR")]
    #[sqlx(rename = "PROFESSOR")]
    Teacher,
    #[serde(rename = "ALUNO")]
    #[sqlx(rename = "ALUNO")]
    Student,
    #[serde(rename = "GESTOR")]
    #[sqlx(rename = "GESTOR")]
    Manager,
    #[serde(rename = "RESPONSAVEL")]
    #[sqlx(rename = "RESPONSAVEL")]
    Guardian,
}

/// Administrators only.
pub const ADMIN_ONLY: &[Role] = &[Role::Administrator];

/// School staff: administrators and managers.
pub const STAFF: &[Role] = &[Role::Administrator, Role::Manager];

/// Staff plus teachers.
pub const TEACHING: &[Role] = &[Role::Administrator, Role::Manager, Role::Teacher];

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Administrator,
        Role::Teacher,
        Role::Student,
        Role::Manager,
        Role::Guardian,
    ];

    /// Wire name of the role, as stored in JWT claims and the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "ADMINISTRADOR",
            Role::Teacher => "PROFESSOR",
            Role::Student => "ALUNO",
            Role::Manager => "GESTOR",
            Role::Guardian => "RESPONSAVEL",
        }
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        STAFF.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_roles() {
        assert_eq!("ADMINISTRADOR".parse::<Role>(), Ok(Role::Administrator));
        assert_eq!("PROFESSOR".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!("ALUNO".parse::<Role>(), Ok(Role::Student));
        assert_eq!("GESTOR".parse::<Role>(), Ok(Role::Manager));
        assert_eq!("RESPONSAVEL".parse::<Role>(), Ok(Role::Guardian));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("aluno".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
        assert!("ADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn test_round_trip_through_as_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Guardian).unwrap(), r#""RESPONSAVEL""#);
        let role: Role = serde_json::from_str(r#""GESTOR""#).unwrap();
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn test_staff() {
        assert!(Role::Administrator.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::Teacher.is_staff());
        assert!(!Role::Student.is_staff());
        assert!(!Role::Guardian.is_staff());
    }

    #[test]
    fn test_allow_lists() {
        assert!(TEACHING.contains(&Role::Teacher));
        assert!(!TEACHING.contains(&Role::Student));
        assert_eq!(ADMIN_ONLY, &[Role::Administrator]);
    }
}
