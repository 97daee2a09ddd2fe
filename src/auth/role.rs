/// Role and account-status enums shared by tokens, guards, and handlers.
///
/// Both are stored as TEXT columns and travel inside JWT claims, so they
/// round-trip through their string forms.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Vendor,
    Teacher,
    Learner,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Vendor => "VENDOR",
            Role::Teacher => "TEACHER",
            Role::Learner => "LEARNER",
            Role::User => "USER",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "VENDOR" => Ok(Role::Vendor),
            "TEACHER" => Ok(Role::Teacher),
            "LEARNER" => Ok(Role::Learner),
            "USER" => Ok(Role::User),
            _ => Err(AppError::Validation(ValidationError::InvalidFormat(
                "role".to_string(),
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "SUSPENDED" => Ok(UserStatus::Suspended),
            _ => Err(AppError::Validation(ValidationError::InvalidFormat(
                "status".to_string(),
            ))),
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            Role::Admin,
            Role::Vendor,
            Role::Teacher,
            Role::Learner,
            Role::User,
        ] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(Role::parse("SUPERUSER").is_err());
        assert!(Role::parse("admin").is_err());
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(UserStatus::parse("ACTIVE").unwrap(), UserStatus::Active);
        assert_eq!(
            UserStatus::parse("SUSPENDED").unwrap(),
            UserStatus::Suspended
        );
        assert!(UserStatus::parse("DELETED").is_err());
    }

    #[test]
    fn test_role_serde_uses_uppercase() {
        let json = serde_json::to_string(&Role::Teacher).unwrap();
        assert_eq!(json, "\"TEACHER\"");
        let back: Role = serde_json::from_str("\"LEARNER\"").unwrap();
        assert_eq!(back, Role::Learner);
    }
}
