//! Static relevance scoring.
//!
//! An item's algorithm score is a weighted sum of four sub-scores, each clamped
//! to `[0, 1]` before weighting:
//!
//! | Dimension | Weight | Looks at |
//! |-----------|--------|----------|
//! | memory | 0.30 | age, price, open status |
//! | insight | 0.25 | brand frequency, category share, price vs catalog average |
//! | relationship | 0.25 | co-located items, related items, shared tags |
//! | needs | 0.20 | lifecycle urgency, open status, value protection |
//!
//! Insight and relationship are catalog-relative, so scoring takes a snapshot of
//! the whole catalog. [`CatalogIndex`] precomputes the aggregates once per snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::catalog::types::{Item, ItemStatus, OpenStatus};
use crate::config::ScoringConfig;

/// Per-dimension scores and their weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub memory: f64,
    pub insight: f64,
    pub relationship: f64,
    pub needs: f64,
    pub total: f64,
}

/// Normalized features of one catalog entry.
struct IndexedItem {
    id: String,
    brand: Option<String>,
    category: String,
    location: Option<String>,
    price: Option<f64>,
    keywords: HashSet<String>,
    tags: BTreeSet<String>,
}

impl IndexedItem {
    fn from_item(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            brand: item.brand_name().map(str::to_lowercase),
            category: normalize(&item.category),
            location: item.location_name().map(str::to_lowercase),
            price: item.price.filter(|p| p.is_finite() && *p >= 0.0),
            keywords: keywords(item),
            tags: item
                .tags
                .iter()
                .map(|t| normalize(t))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

/// Aggregates over one catalog snapshot.
pub struct CatalogIndex {
    entries: Vec<IndexedItem>,
    brand_counts: HashMap<String, usize>,
    category_counts: HashMap<String, usize>,
    average_price: Option<f64>,
}

impl CatalogIndex {
    pub fn build(items: &[Item]) -> Self {
        let entries: Vec<IndexedItem> = items.iter().map(IndexedItem::from_item).collect();

        let mut brand_counts: HashMap<String, usize> = HashMap::new();
        let mut category_counts: HashMap<String, usize> = HashMap::new();
        let mut price_sum = 0.0;
        let mut priced = 0usize;

        for entry in &entries {
            if let Some(ref brand) = entry.brand {
                *brand_counts.entry(brand.clone()).or_insert(0) += 1;
            }
            *category_counts.entry(entry.category.clone()).or_insert(0) += 1;
            if let Some(price) = entry.price {
                price_sum += price;
                priced += 1;
            }
        }

        let average_price = (priced > 0).then(|| price_sum / priced as f64);

        Self {
            entries,
            brand_counts,
            category_counts,
            average_price,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn average_price(&self) -> Option<f64> {
        self.average_price
    }
}

/// Computes the static, catalog-relative relevance of an item.
#[derive(Debug, Clone)]
pub struct ItemScorer {
    weights: ScoringConfig,
}

impl Default for ItemScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ItemScorer {
    pub fn new(weights: ScoringConfig) -> Self {
        Self { weights }
    }

    /// Score one item against a catalog snapshot. Builds a throwaway index.
    pub fn score(&self, item: &Item, all_items: &[Item], now: DateTime<Utc>) -> f64 {
        let index = CatalogIndex::build(all_items);
        self.score_indexed(item, &index, now)
    }

    /// Score one item against a prebuilt index. Always in `[0, 1]`.
    pub fn score_indexed(&self, item: &Item, index: &CatalogIndex, now: DateTime<Utc>) -> f64 {
        self.breakdown(item, index, now).total
    }

    pub fn breakdown(&self, item: &Item, index: &CatalogIndex, now: DateTime<Utc>) -> ScoreBreakdown {
        let memory = memory_score(item, now);
        let insight = insight_score(item, index);
        let relationship = relationship_score(item, index);
        let needs = needs_score(item);

        let w = &self.weights;
        let total = memory * w.memory_weight
            + insight * w.insight_weight
            + relationship * w.relationship_weight
            + needs * w.needs_weight;

        ScoreBreakdown {
            memory,
            insight,
            relationship,
            needs,
            total: clamp_unit(total),
        }
    }
}

// ── Memory ───────────────────────────────────────────────────────────────────

/// Nostalgia value: older, pricier and still-sealed items are more memorable.
pub fn memory_score(item: &Item, now: DateTime<Utc>) -> f64 {
    let age = match item.age_days(now) {
        d if d > 180 => 0.4,
        d if d > 90 => 0.35,
        d if d > 30 => 0.25,
        d if d > 7 => 0.15,
        _ => 0.05,
    };

    let price = match item.price {
        None => 0.1,
        Some(p) if p >= 2000.0 => 0.3,
        Some(p) if p >= 1000.0 => 0.25,
        Some(p) if p >= 500.0 => 0.2,
        Some(p) if p >= 200.0 => 0.15,
        Some(p) if p >= 50.0 => 0.08,
        Some(_) => 0.02,
    };

    let open = match item.open_status {
        OpenStatus::Unopened => 0.3,
        OpenStatus::Opened => 0.1,
        OpenStatus::Other => 0.02,
    };

    clamp_unit(age + price + open)
}

// ── Insight ──────────────────────────────────────────────────────────────────

pub fn insight_score(item: &Item, index: &CatalogIndex) -> f64 {
    let brand = match item.brand_name() {
        None => 0.0,
        Some(b) => {
            let count = index
                .brand_counts
                .get(&b.to_lowercase())
                .copied()
                .unwrap_or(0);
            match count {
                c if c >= 5 => 0.4,
                c if c >= 3 => 0.3,
                2 => 0.2,
                _ => 0.1,
            }
        }
    };

    let category = if index.is_empty() {
        0.05
    } else {
        let count = index
            .category_counts
            .get(&normalize(&item.category))
            .copied()
            .unwrap_or(0);
        match count as f64 / index.len() as f64 {
            s if s >= 0.3 => 0.3,
            s if s >= 0.2 => 0.2,
            s if s >= 0.1 => 0.1,
            _ => 0.05,
        }
    };

    let price = match (item.price, index.average_price) {
        (Some(p), Some(avg)) if avg > 0.0 => match p / avg {
            r if r >= 2.0 => 0.3,
            r if r >= 1.5 => 0.25,
            r if r >= 1.0 => 0.2,
            r if r >= 0.5 => 0.15,
            _ => 0.1,
        },
        _ => 0.0,
    };

    clamp_unit(brand + category + price)
}

// ── Relationship ─────────────────────────────────────────────────────────────

pub fn relationship_score(item: &Item, index: &CatalogIndex) -> f64 {
    let this = IndexedItem::from_item(item);

    let mut co_located = 0usize;
    let mut related = 0usize;
    let mut shared_tags = 0usize;

    for other in index.entries.iter().filter(|e| e.id != this.id) {
        if this.location.is_some() && this.location == other.location {
            co_located += 1;
        }
        if is_related(&this, other) {
            related += 1;
        }
        shared_tags += this.tags.intersection(&other.tags).count();
    }

    let location = if this.location.is_none() {
        0.0
    } else {
        match co_located {
            n if n >= 10 => 0.4,
            n if n >= 5 => 0.3,
            n if n >= 2 => 0.2,
            _ => 0.1,
        }
    };

    let related = (related as f64 * 0.05).min(0.3);
    let tags = (shared_tags as f64 * 0.02).min(0.3);

    clamp_unit(location + related + tags)
}

fn is_related(a: &IndexedItem, b: &IndexedItem) -> bool {
    if a.keywords.intersection(&b.keywords).take(2).count() >= 2 {
        return true;
    }
    if a.brand.is_some() && a.brand == b.brand {
        return true;
    }
    if !a.category.is_empty() && a.category == b.category {
        return true;
    }
    match (a.price, b.price) {
        (Some(x), Some(y)) if x > 0.0 && y > 0.0 => x.max(y) / x.min(y) <= 2.0,
        _ => false,
    }
}

// ── Needs ────────────────────────────────────────────────────────────────────

pub fn needs_score(item: &Item) -> f64 {
    let urgency = match item.status {
        ItemStatus::Expired => 0.4,
        ItemStatus::UsedUp => 0.3,
        ItemStatus::InStock => 0.1,
        ItemStatus::GivenAway => 0.05,
        ItemStatus::Discarded => 0.02,
    };

    let open = match item.open_status {
        OpenStatus::Unopened => 0.3,
        OpenStatus::Opened => 0.15,
        OpenStatus::Other => 0.1,
    };

    let protection = match item.price {
        Some(p) if p >= 500.0 => 0.3,
        Some(p) if p >= 200.0 => 0.2,
        Some(p) if p >= 50.0 => 0.1,
        _ => 0.0,
    };

    clamp_unit(urgency + open + protection)
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Lowercased keywords from name tokens, category, brand and tags.
fn keywords(item: &Item) -> HashSet<String> {
    let mut set: HashSet<String> = item
        .name
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= 2)
        .collect();

    let category = normalize(&item.category);
    if !category.is_empty() {
        set.insert(category);
    }
    if let Some(brand) = item.brand_name() {
        set.insert(brand.to_lowercase());
    }
    for tag in &item.tags {
        let tag = normalize(tag);
        if !tag.is_empty() {
            set.insert(tag);
        }
    }
    set
}
