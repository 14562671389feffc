//! User profile type as seen by the matching engine.
//!
//! Profiles are owned by the external profile store. The matcher only reads
//! them, so this type carries just the fields matching needs plus display names.

use serde::{Deserialize, Serialize};

use crate::error::SkillError;

/// Profile visibility. Only public profiles are eligible as candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// A platform user.
///
/// Accepts the camelCase field names used by exported profile documents
/// (`_id`, `skillsOffered`, `skillsWanted`, `profileVisibility`) on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique identifier
    #[serde(alias = "_id", alias = "userId")]
    pub user_id: String,

    #[serde(default, alias = "firstName")]
    pub first_name: String,

    #[serde(default, alias = "lastName")]
    pub last_name: String,

    /// Skills this user can teach, in profile order
    #[serde(default, alias = "skillsOffered")]
    pub skills_offered: Vec<String>,

    /// Skills this user wants to learn, in profile order
    #[serde(default, alias = "skillsWanted")]
    pub skills_wanted: Vec<String>,

    #[serde(default, alias = "profileVisibility")]
    pub visibility: Visibility,
}

impl User {
    /// Create a public user with no display name.
    pub fn new(
        user_id: impl Into<String>,
        skills_offered: Vec<String>,
        skills_wanted: Vec<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            first_name: String::new(),
            last_name: String::new(),
            skills_offered,
            skills_wanted,
            visibility: Visibility::Public,
        }
    }

    /// Builder-style display name setter.
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Builder-style visibility setter.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Whether this user may appear as a candidate for others.
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// "First Last", trimmed. Empty when no names are set.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SkillError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SkillError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_visibility_is_public() {
        let user = User::new("u1", vec![], vec![]);
        assert!(user.is_visible());
    }

    #[test]
    fn test_private_user_not_visible() {
        let user = User::new("u1", vec![], vec![]).with_visibility(Visibility::Private);
        assert!(!user.is_visible());
    }

    #[test]
    fn test_deserialize_profile_document() {
        let json = r#"{
            "_id": "6871ff9b9a91d889120fa062",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "skillsOffered": ["Python", "Go"],
            "skillsWanted": ["Yoga"],
            "profileVisibility": "private",
            "email": "ada@example.com"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.user_id, "6871ff9b9a91d889120fa062");
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.skills_offered, vec!["Python", "Go"]);
        assert_eq!(user.skills_wanted, vec!["Yoga"]);
        assert_eq!(user.visibility, Visibility::Private);
    }

    #[test]
    fn test_missing_skill_lists_default_empty() {
        let user: User = serde_json::from_str(r#"{"user_id": "u2"}"#).unwrap();
        assert!(user.skills_offered.is_empty());
        assert!(user.skills_wanted.is_empty());
        assert_eq!(user.visibility, Visibility::Public);
        assert_eq!(user.display_name(), "");
    }

    #[test]
    fn test_bytes_preserve_skill_order() {
        let user = User::new("u3", vec!["b".into(), "a".into()], vec!["".into(), " ".into()]);
        let decoded = User::from_bytes(&user.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, user);
    }
}
