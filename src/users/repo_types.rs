use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Coarse-grained capability tag. Stored as the `user_role` enum in
/// Postgres, serialized uppercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
    Instructor,
}

impl Role {
    /// Parse a client-supplied role string; only the three enumerated
    /// values are accepted.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            "INSTRUCTOR" => Some(Role::Instructor),
            _ => None,
        }
    }
}

/// User record in the database. The password hash and reset-token
/// fields never leave the server.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub affiliation: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub subscriptions: Vec<String>,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            full_name: "ada lovelace".into(),
            email: "ada@x.com".into(),
            phone: "1234567890".into(),
            affiliation: "analytical engines".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$secret".into(),
            role: Role::User,
            subscriptions: vec!["C1".into()],
            reset_token_hash: Some("deadbeef".into()),
            reset_token_expires_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serialization_strips_secrets() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("reset_token"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("ada@x.com"));
        assert!(json.contains("\"role\":\"USER\""));
        assert!(json.contains("C1"));
    }

    #[test]
    fn role_parses_only_known_values() {
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("INSTRUCTOR"), Some(Role::Instructor));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse("ROOT"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Instructor).unwrap(), "\"INSTRUCTOR\"");
        let parsed: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
