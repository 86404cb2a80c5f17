//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical record served by the REST surface.
//! - Own name validation and normalization shared by every store backend.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes afterwards.
//! - A stored `name` is trimmed and non-empty.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned item identifier.
pub type ItemId = i64;

/// Upper bound for a normalized item name, in characters.
pub const NAME_MAX_CHARS: usize = 255;

/// Canonical item record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Write payload accepted by create and update.
///
/// `name` is optional at the decoding layer so a missing field surfaces as a
/// validation failure instead of a decode failure. Unknown fields, including
/// a client-supplied `id`, are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemDraft {
    #[serde(default)]
    pub name: Option<String>,
}

impl ItemDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Takes the supplied name; content rules are applied by the store.
    pub fn require_name(self) -> Result<String, ItemValidationError> {
        self.name.ok_or(ItemValidationError::MissingName)
    }
}

/// Reasons a name is rejected before it reaches the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    MissingName,
    EmptyName,
    NameTooLong { max_chars: usize, actual_chars: usize },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "name is required"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong {
                max_chars,
                actual_chars,
            } => write!(
                f,
                "name has {actual_chars} characters; at most {max_chars} are allowed"
            ),
        }
    }
}

impl Error for ItemValidationError {}

/// Trims surrounding whitespace and enforces the name rules.
pub fn normalize_name(raw: &str) -> Result<String, ItemValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ItemValidationError::EmptyName);
    }

    let actual_chars = trimmed.chars().count();
    if actual_chars > NAME_MAX_CHARS {
        return Err(ItemValidationError::NameTooLong {
            max_chars: NAME_MAX_CHARS,
            actual_chars,
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, Item, ItemDraft, ItemValidationError, NAME_MAX_CHARS};

    #[test]
    fn normalize_name_trims_surrounding_whitespace() {
        assert_eq!(normalize_name("  Alice \n").unwrap(), "Alice");
    }

    #[test]
    fn normalize_name_rejects_blank_values() {
        assert_eq!(normalize_name(""), Err(ItemValidationError::EmptyName));
        assert_eq!(normalize_name(" \t "), Err(ItemValidationError::EmptyName));
    }

    #[test]
    fn normalize_name_enforces_char_limit_not_byte_limit() {
        let at_limit = "é".repeat(NAME_MAX_CHARS);
        assert_eq!(normalize_name(&at_limit).unwrap(), at_limit);

        let over_limit = "x".repeat(NAME_MAX_CHARS + 1);
        assert_eq!(
            normalize_name(&over_limit),
            Err(ItemValidationError::NameTooLong {
                max_chars: NAME_MAX_CHARS,
                actual_chars: NAME_MAX_CHARS + 1,
            })
        );
    }

    #[test]
    fn draft_without_name_is_missing() {
        assert_eq!(
            ItemDraft::default().require_name(),
            Err(ItemValidationError::MissingName)
        );

        let null_name: ItemDraft = serde_json::from_str(r#"{"name":null}"#).unwrap();
        assert_eq!(
            null_name.require_name(),
            Err(ItemValidationError::MissingName)
        );
    }

    #[test]
    fn item_serializes_as_flat_object() {
        let json = serde_json::to_string(&Item::new(1, "Alice")).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"Alice"}"#);
    }

    #[test]
    fn draft_ignores_client_supplied_id() {
        let draft: ItemDraft = serde_json::from_str(r#"{"id":42,"name":"Bob"}"#).unwrap();
        assert_eq!(draft, ItemDraft::named("Bob"));
    }
}
