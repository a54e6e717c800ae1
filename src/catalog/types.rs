//! Inventory item type definitions.
//!
//! Defines [`Item`] (a read-only catalog record), [`OpenStatus`] and
//! [`ItemStatus`] (closed enums with string forms matching the `items` table),
//! and [`ParseEnumError`] for rejecting unknown stored values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Error returned when a stored string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Whether the item's packaging has been opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenStatus {
    Unopened,
    Opened,
    /// Not applicable or unknown (loose items, furniture, documents).
    Other,
}

impl OpenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::Opened => "opened",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for OpenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OpenStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unopened" => Ok(Self::Unopened),
            "opened" => Ok(Self::Opened),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError::new("open status", s)),
        }
    }
}

/// Lifecycle status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    InStock,
    UsedUp,
    Expired,
    GivenAway,
    Discarded,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 5] = [
        Self::InStock,
        Self::UsedUp,
        Self::Expired,
        Self::GivenAway,
        Self::Discarded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::UsedUp => "used_up",
            Self::Expired => "expired",
            Self::GivenAway => "given_away",
            Self::Discarded => "discarded",
        }
    }

    /// Human-readable label for reason text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InStock => "in stock",
            Self::UsedUp => "used up",
            Self::Expired => "expired",
            Self::GivenAway => "given away",
            Self::Discarded => "discarded",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(Self::InStock),
            "used_up" => Ok(Self::UsedUp),
            "expired" => Ok(Self::Expired),
            "given_away" => Ok(Self::GivenAway),
            "discarded" => Ok(Self::Discarded),
            _ => Err(ParseEnumError::new("item status", s)),
        }
    }
}

/// An inventory item, matching the `items` table plus its tags and photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// UUID v7 primary key when created by this crate; any unique string otherwise.
    /// Empty until stored.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// When the item was added to the inventory.
    pub added_at: DateTime<Utc>,
    pub open_status: OpenStatus,
    pub status: ItemStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Photo paths or URIs, in display order.
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Item {
    /// Whole days between `added_at` and `now`, zero for future timestamps.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.added_at).num_days().max(0)
    }

    /// Brand with surrounding whitespace removed, `None` when blank.
    pub fn brand_name(&self) -> Option<&str> {
        self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }

    /// Location with surrounding whitespace removed, `None` when blank.
    pub fn location_name(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in ItemStatus::ALL {
            assert_eq!(status.as_str().parse::<ItemStatus>().unwrap(), status);
        }
        for open in [OpenStatus::Unopened, OpenStatus::Opened, OpenStatus::Other] {
            assert_eq!(open.as_str().parse::<OpenStatus>().unwrap(), open);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "lost".parse::<ItemStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown item status: lost");
    }

    #[test]
    fn item_deserializes_with_defaults() {
        let json = r#"{
            "id": "a",
            "name": "Kettle",
            "category": "Kitchen",
            "added_at": "2025-01-01T00:00:00Z",
            "open_status": "opened",
            "status": "in_stock"
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.status, ItemStatus::InStock);
        assert!(item.brand.is_none());
        assert!(item.tags.is_empty());
    }

    #[test]
    fn blank_brand_is_treated_as_missing() {
        let json = r#"{
            "id": "a", "name": "Mug", "category": "Kitchen", "brand": "  ",
            "added_at": "2025-01-01T00:00:00Z", "open_status": "other", "status": "in_stock"
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.brand_name(), None);
    }
}
