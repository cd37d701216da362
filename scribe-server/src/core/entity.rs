use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Maximum length of an entity's content, in characters
pub const MAX_CONTENT_LEN: usize = 2000;

/// Maximum length of an entity's creating user, in characters
pub const MAX_CREATE_USER_LEN: usize = 100;

/// Validation codes reported by [`Entity::validate`] and [`EntityRequest::validate`]
pub mod violation {
    pub const CONTENT_EMPTY: &str = "contentEmpty";
    pub const CONTENT_OVERFLOW: &str = "contentOverflow";
    pub const CREATE_USER_EMPTY: &str = "createUserEmpty";
    pub const CREATE_USER_OVERFLOW: &str = "createUserOverflow";
}

/// An entity record.
///
/// Records are immutable once built. `create_date` stays `None` until the
/// persistent store has durably inserted the record and assigned it.
/// Equality and hashing only look at `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    id: String,
    content: String,
    create_date: Option<DateTime<Utc>>,
    create_user: String,
}

impl Entity {
    /// Build a record that has not been persisted yet
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        create_user: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            create_date: None,
            create_user: create_user.into(),
        }
    }

    /// Return a copy of this record stamped with a durable creation date
    pub fn with_create_date(mut self, create_date: DateTime<Utc>) -> Self {
        self.create_date = Some(create_date);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn create_date(&self) -> Option<DateTime<Utc>> {
        self.create_date
    }

    pub fn create_user(&self) -> &str {
        &self.create_user
    }

    /// List the constraint violations of this record (empty when valid)
    pub fn validate(&self) -> Vec<&'static str> {
        let mut violations = Vec::new();

        if self.content.trim().is_empty() {
            violations.push(violation::CONTENT_EMPTY);
        } else if self.content.chars().count() > MAX_CONTENT_LEN {
            violations.push(violation::CONTENT_OVERFLOW);
        }

        if self.create_user.trim().is_empty() {
            violations.push(violation::CREATE_USER_EMPTY);
        } else if self.create_user.chars().count() > MAX_CREATE_USER_LEN {
            violations.push(violation::CREATE_USER_OVERFLOW);
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Body of a create request
#[derive(Debug, Clone, Deserialize)]
pub struct EntityRequest {
    pub content: String,
}

impl EntityRequest {
    pub fn validate(&self) -> Vec<&'static str> {
        if self.content.trim().is_empty() {
            vec![violation::CONTENT_EMPTY]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_is_by_id() {
        let a = Entity::new("1", "first", "alice");
        let b = Entity::new("1", "second", "bob").with_create_date(Utc::now());
        let c = Entity::new("2", "first", "alice");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Entity> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_validate_missing_fields() {
        let entity = Entity::new("1", "", "");
        let violations = entity.validate();

        assert!(violations.contains(&violation::CONTENT_EMPTY));
        assert!(violations.contains(&violation::CREATE_USER_EMPTY));
        assert!(!entity.is_valid());
    }

    #[test]
    fn test_validate_blank_content() {
        let entity = Entity::new("1", "   \t", "alice");
        assert_eq!(entity.validate(), vec![violation::CONTENT_EMPTY]);
    }

    #[test]
    fn test_validate_overflow() {
        let content = "x".repeat(MAX_CONTENT_LEN + 1);
        let user = "u".repeat(MAX_CREATE_USER_LEN + 1);
        let entity = Entity::new("1", content, user);

        assert_eq!(
            entity.validate(),
            vec![violation::CONTENT_OVERFLOW, violation::CREATE_USER_OVERFLOW]
        );
    }

    #[test]
    fn test_validate_at_limits() {
        let content = "é".repeat(MAX_CONTENT_LEN);
        let user = "u".repeat(MAX_CREATE_USER_LEN);
        assert!(Entity::new("1", content, user).is_valid());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let entity = Entity::new("42", "hello", "alice");
        let json = serde_json::to_value(&entity).unwrap();

        assert_eq!(json["id"], "42");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["createUser"], "alice");
        assert!(json["createDate"].is_null());
    }

    #[test]
    fn test_request_validation() {
        let blank = EntityRequest {
            content: " ".to_string(),
        };
        let ok = EntityRequest {
            content: "hello".to_string(),
        };

        assert_eq!(blank.validate(), vec![violation::CONTENT_EMPTY]);
        assert!(ok.validate().is_empty());
    }
}
