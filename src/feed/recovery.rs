//! Per-item penalty recovery schedule.
//!
//! Every showing of an item accrues a display penalty. How quickly that penalty is
//! paid back depends on how valuable the item looks: high-scoring, expensive,
//! sealed or urgent items recover fast; cheap consumables recover slowly. The model
//! is pure; the tracker in [`super::display_state`] owns the mutable side.

use crate::catalog::types::{Item, ItemStatus, OpenStatus};

pub const MIN_RECOVERY_RATE: f64 = 0.3;
pub const MAX_RECOVERY_RATE: f64 = 3.0;
pub const MIN_BROWSE_DISTANCE: u32 = 5;
pub const MAX_BROWSE_DISTANCE: u32 = 100;

/// Category keywords and their importance multiplier. First match wins.
const CATEGORY_IMPORTANCE: &[(&str, f64)] = &[
    ("document", 1.3),
    ("certificate", 1.3),
    ("passport", 1.3),
    ("electronic", 1.3),
    ("computer", 1.3),
    ("camera", 1.25),
    ("medicine", 1.2),
    ("medical", 1.2),
    ("jewel", 1.2),
    ("watch", 1.15),
    ("tool", 1.1),
    ("appliance", 1.1),
    ("clothing", 0.9),
    ("book", 0.9),
    ("stationery", 0.8),
    ("toy", 0.8),
    ("cosmetic", 0.8),
    ("consumable", 0.7),
    ("cleaning", 0.7),
    ("snack", 0.6),
    ("food", 0.6),
    ("grocery", 0.6),
];

const PREMIUM_BRANDS: &[&str] = &[
    "apple",
    "sony",
    "samsung",
    "dyson",
    "canon",
    "nikon",
    "fujifilm",
    "leica",
    "bose",
    "bang & olufsen",
    "lego",
    "nintendo",
    "rolex",
    "omega",
    "hermes",
    "chanel",
    "louis vuitton",
    "gucci",
    "patagonia",
    "le creuset",
];

/// Pure recovery schedule, parameterized by the base browse distance.
#[derive(Debug, Clone)]
pub struct RecoveryModel {
    base_distance: f64,
}

impl Default for RecoveryModel {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl RecoveryModel {
    pub fn new(base_distance: f64) -> Self {
        Self { base_distance }
    }

    /// Multiplier on recovery speed, in `[0.3, 3.0]`.
    pub fn recovery_rate(&self, item: &Item, algorithm_score: f64) -> f64 {
        let mut rate = 1.0;

        rate *= match algorithm_score {
            s if s >= 0.8 => 2.0,
            s if s >= 0.6 => 1.5,
            s if s >= 0.4 => 1.2,
            s if s >= 0.2 => 0.8,
            _ => 0.5,
        };

        rate *= match item.price {
            None => 0.9,
            Some(p) if p >= 2000.0 => 1.4,
            Some(p) if p >= 1000.0 => 1.3,
            Some(p) if p >= 500.0 => 1.2,
            Some(p) if p >= 200.0 => 1.1,
            Some(p) if p >= 50.0 => 1.0,
            Some(_) => 0.8,
        };

        rate *= match item.open_status {
            OpenStatus::Unopened => 1.3,
            OpenStatus::Opened => 1.0,
            OpenStatus::Other => 0.8,
        };

        rate *= match item.status {
            ItemStatus::Expired => 1.4,
            ItemStatus::UsedUp => 1.2,
            ItemStatus::InStock => 1.0,
            ItemStatus::GivenAway => 0.8,
            ItemStatus::Discarded => 0.6,
        };

        rate *= category_importance(&item.category);

        if is_premium_brand(item.brand_name()) {
            rate *= 1.1;
        }

        rate.clamp(MIN_RECOVERY_RATE, MAX_RECOVERY_RATE)
    }

    /// Browse distance needed for full recovery, in `[5, 100]`.
    pub fn required_browse_distance(
        &self,
        item: &Item,
        algorithm_score: f64,
        current_penalty: f64,
    ) -> u32 {
        let rate = self.recovery_rate(item, algorithm_score);
        let severity = match current_penalty {
            p if p >= 1.5 => 1.8,
            p if p >= 1.0 => 1.5,
            p if p >= 0.5 => 1.2,
            p if p >= 0.2 => 1.0,
            _ => 0.8,
        };

        let distance = (self.base_distance / rate * severity).round();
        (distance.max(0.0) as u32).clamp(MIN_BROWSE_DISTANCE, MAX_BROWSE_DISTANCE)
    }

    /// Share of `current_penalty` earned back after `browse_distance` positions.
    ///
    /// Progress is bucketed, so recovery arrives in steps rather than linearly.
    pub fn recovery_amount(
        &self,
        item: &Item,
        algorithm_score: f64,
        current_penalty: f64,
        browse_distance: u64,
    ) -> f64 {
        if current_penalty <= 0.0 {
            return 0.0;
        }

        let required = self.required_browse_distance(item, algorithm_score, current_penalty);
        let progress = (browse_distance as f64 / required as f64).min(1.0);
        current_penalty * recovery_step(progress)
    }
}

/// Discrete recovery fraction for a progress ratio in `[0, 1]`.
pub fn recovery_step(progress: f64) -> f64 {
    match progress {
        p if p >= 1.0 => 1.0,
        p if p >= 0.9 => 0.9,
        p if p >= 0.8 => 0.8,
        p if p >= 0.6 => 0.6,
        p if p >= 0.4 => 0.4,
        p if p >= 0.2 => 0.2,
        p if p >= 0.1 => 0.1,
        _ => 0.0,
    }
}

fn category_importance(category: &str) -> f64 {
    let category = category.to_lowercase();
    CATEGORY_IMPORTANCE
        .iter()
        .find(|(keyword, _)| category.contains(keyword))
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

fn is_premium_brand(brand: Option<&str>) -> bool {
    brand.is_some_and(|b| {
        let b = b.to_lowercase();
        PREMIUM_BRANDS.contains(&b.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn item(category: &str, price: Option<f64>) -> Item {
        Item {
            id: "r".into(),
            name: "Item".into(),
            category: category.into(),
            brand: None,
            price,
            added_at: "2026-01-01T00:00:00Z".parse().unwrap(),
            open_status: OpenStatus::Opened,
            status: ItemStatus::InStock,
            location: None,
            tags: BTreeSet::new(),
            photos: Vec::new(),
        }
    }

    #[test]
    fn neutral_attributes_leave_only_score_factor() {
        let model = RecoveryModel::default();
        // only the score bracket (0.4..0.6 → ×1.2) moves the rate
        let rate = model.recovery_rate(&item("Misc", Some(100.0)), 0.5);
        assert!((rate - 1.2).abs() < 1e-9);
    }

    #[test]
    fn rate_is_clamped_at_both_ends() {
        let model = RecoveryModel::default();

        let mut treasure = item("Electronics", Some(5000.0));
        treasure.open_status = OpenStatus::Unopened;
        treasure.status = ItemStatus::Expired;
        treasure.brand = Some("Sony".into());
        assert_eq!(model.recovery_rate(&treasure, 0.95), MAX_RECOVERY_RATE);

        let mut crumbs = item("Snack food", Some(1.0));
        crumbs.open_status = OpenStatus::Other;
        crumbs.status = ItemStatus::Discarded;
        assert_eq!(model.recovery_rate(&crumbs, 0.05), MIN_RECOVERY_RATE);
    }

    #[test]
    fn category_keywords_match_case_insensitively() {
        assert_eq!(category_importance("Important Documents"), 1.3);
        assert_eq!(category_importance("FOOD"), 0.6);
        assert_eq!(category_importance("Furniture"), 1.0);
    }

    #[test]
    fn required_distance_scales_with_penalty() {
        let model = RecoveryModel::default();
        let it = item("Misc", Some(100.0));
        // rate 1.2 → 20 / 1.2 = 16.67
        assert_eq!(model.required_browse_distance(&it, 0.5, 0.1), 13); // ×0.8
        assert_eq!(model.required_browse_distance(&it, 0.5, 0.3), 17); // ×1.0
        assert_eq!(model.required_browse_distance(&it, 0.5, 2.0), 30); // ×1.8
    }

    #[test]
    fn required_distance_is_bounded() {
        let model = RecoveryModel::new(1000.0);
        let it = item("Misc", None);
        assert_eq!(model.required_browse_distance(&it, 0.0, 5.0), MAX_BROWSE_DISTANCE);

        let model = RecoveryModel::new(1.0);
        assert_eq!(model.required_browse_distance(&it, 0.9, 0.0), MIN_BROWSE_DISTANCE);
    }

    #[test]
    fn recovery_is_stepped() {
        let model = RecoveryModel::default();
        let it = item("Misc", Some(100.0));
        // penalty 0.5, rate 1.2 → required round(16.67 × 1.2) = 20
        assert_eq!(model.recovery_amount(&it, 0.5, 0.5, 0), 0.0);
        assert_eq!(model.recovery_amount(&it, 0.5, 0.5, 1), 0.0);
        assert!((model.recovery_amount(&it, 0.5, 0.5, 3) - 0.05).abs() < 1e-9);
        assert!((model.recovery_amount(&it, 0.5, 0.5, 9) - 0.2).abs() < 1e-9);
        assert!((model.recovery_amount(&it, 0.5, 0.5, 20) - 0.5).abs() < 1e-9);
        assert!((model.recovery_amount(&it, 0.5, 0.5, 500) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_penalty_means_no_recovery() {
        let model = RecoveryModel::default();
        assert_eq!(model.recovery_amount(&item("Misc", None), 0.9, 0.0, 100), 0.0);
    }
}
