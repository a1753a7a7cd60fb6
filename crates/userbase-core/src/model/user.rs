//! The User entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, InvalidInputError};
use crate::types::UserId;

use super::Patch;

/// A stored user.
///
/// Every read produces a fresh value; nothing returned to callers aliases
/// store-side state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// The payload for creating a user. The id is always generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<i32>,
    /// Defaults to the creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age: None,
            created_at: None,
        }
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Presence checks on required fields.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` or `email` is empty or blank.
    pub fn validate(&self) -> Result<(), Error> {
        require_present("name", &self.name)?;
        require_present("email", &self.email)
    }
}

/// A partial update. Only fields that are present change.
///
/// `name` and `email` are required on the entity and can only be replaced;
/// `age` can also be cleared with an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub age: Patch<i32>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_keep()
    }

    /// Presence checks on the fields being replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if a replacement `name` or `email` is blank.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            require_present("name", name)?;
        }
        if let Some(email) = &self.email {
            require_present("email", email)?;
        }
        Ok(())
    }

    /// Overlay this patch on an existing user. `id` and `createdAt` never change.
    pub fn apply(self, current: User) -> User {
        User {
            id: current.id,
            name: self.name.unwrap_or(current.name),
            email: self.email.unwrap_or(current.email),
            age: self.age.apply(current.age),
            created_at: current.created_at,
        }
    }
}

fn require_present(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(InvalidInputError::Field {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> User {
        User {
            id: UserId::generate(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            age: Some(1),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        }
    }

    #[test]
    fn age_only_patch_keeps_other_fields() {
        let user = sample();
        let patch = UserPatch {
            age: Patch::Set(42),
            ..Default::default()
        };
        let updated = patch.apply(user.clone());
        assert_eq!(updated.age, Some(42));
        assert_eq!(updated.name, user.name);
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.created_at, user.created_at);
        assert_eq!(updated.id, user.id);
    }

    #[test]
    fn clear_age_patch() {
        let patch: UserPatch = serde_json::from_str(r#"{"age": null}"#).unwrap();
        assert_eq!(patch.apply(sample()).age, None);
    }

    #[test]
    fn patch_rejects_id_field() {
        assert!(serde_json::from_str::<UserPatch>(r#"{"id": "x"}"#).is_err());
    }

    #[test]
    fn new_user_requires_name_and_email() {
        assert!(NewUser::new("A", "a@x.com").validate().is_ok());
        assert!(NewUser::new("", "a@x.com").validate().is_err());
        assert!(NewUser::new("A", "   ").validate().is_err());
    }

    #[test]
    fn user_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
