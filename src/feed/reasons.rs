//! Short explanations attached to a small share of feed entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::types::{Item, ItemStatus, OpenStatus};

/// Why an entry is being surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedReason {
    /// Looks back at when and how the item was acquired.
    Memory,
    /// Points out a pattern in the catalog the item belongs to.
    Insight,
    /// Connects the item to where it lives and what it is tagged with.
    Discovery,
    /// Suggests an action based on lifecycle or open status.
    Suggestion,
}

impl FeedReason {
    pub const ALL: [FeedReason; 4] = [
        Self::Memory,
        Self::Insight,
        Self::Discovery,
        Self::Suggestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Insight => "insight",
            Self::Discovery => "discovery",
            Self::Suggestion => "suggestion",
        }
    }

    /// Render the reason text for an item.
    pub fn render(&self, item: &Item, now: DateTime<Utc>) -> String {
        match self {
            Self::Memory => memory_text(item, now),
            Self::Insight => insight_text(item),
            Self::Discovery => discovery_text(item),
            Self::Suggestion => suggestion_text(item),
        }
    }
}

impl std::fmt::Display for FeedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn memory_text(item: &Item, now: DateTime<Utc>) -> String {
    let age = describe_age(item.age_days(now));
    match item.open_status {
        OpenStatus::Unopened => format!("You got {} {age} and it is still sealed", item.name),
        _ => format!("{} joined your collection {age}", item.name),
    }
}

fn insight_text(item: &Item) -> String {
    match item.brand_name() {
        Some(brand) => format!("{brand} shows up often in your {}", item.category),
        None => format!("{} is part of your {} collection", item.name, item.category),
    }
}

fn discovery_text(item: &Item) -> String {
    let tag = item.tags.iter().next();
    match (item.location_name(), tag) {
        (Some(location), Some(tag)) => {
            format!("Tucked away in {location}, tagged \"{tag}\"")
        }
        (Some(location), None) => format!("Still waiting for you in {location}"),
        (None, Some(tag)) => format!("Rediscover your \"{tag}\" things"),
        (None, None) => format!("Have you thought about {} lately?", item.name),
    }
}

fn suggestion_text(item: &Item) -> String {
    match (item.status, item.open_status) {
        (ItemStatus::Expired, _) => format!("{} has expired, time to replace or discard it", item.name),
        (ItemStatus::UsedUp, _) => format!("{} is used up, add it to your shopping list?", item.name),
        (ItemStatus::InStock, OpenStatus::Unopened) => {
            format!("{} is still unopened, maybe give it a try", item.name)
        }
        (ItemStatus::InStock, _) => format!("Check how {} is holding up", item.name),
        (status, _) => format!("{} was {}, update its record?", item.name, status.label()),
    }
}

fn describe_age(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        d if d < 30 => format!("{d} days ago"),
        d if d < 365 => {
            let months = d / 30;
            if months == 1 {
                "a month ago".to_string()
            } else {
                format!("{months} months ago")
            }
        }
        d => {
            let years = d / 365;
            if years == 1 {
                "a year ago".to_string()
            } else {
                format!("{years} years ago")
            }
        }
    }
}
