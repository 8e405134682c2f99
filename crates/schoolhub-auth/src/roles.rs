//! System roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four fixed roles. A user's role decides which writes they may perform
/// and which entity references they can satisfy (e.g. a class teacher must be
/// a `Teacher`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
    Parent,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Teacher => "TEACHER",
            UserRole::Student => "STUDENT",
            UserRole::Parent => "PARENT",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "TEACHER" => Ok(UserRole::Teacher),
            "STUDENT" => Ok(UserRole::Student),
            "PARENT" => Ok(UserRole::Parent),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&UserRole::Teacher).unwrap(),
            r#""TEACHER""#
        );
        let role: UserRole = serde_json::from_str(r#""PARENT""#).unwrap();
        assert_eq!(role, UserRole::Parent);
    }

    #[test]
    fn test_role_from_str_is_case_insensitive() {
        assert_eq!("student".parse::<UserRole>().unwrap(), UserRole::Student);
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("principal".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_display_matches_as_str() {
        for role in [
            UserRole::Admin,
            UserRole::Teacher,
            UserRole::Student,
            UserRole::Parent,
        ] {
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
