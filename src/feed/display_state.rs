//! Session-scoped display bookkeeping.
//!
//! [`DisplayStateTracker`] owns a global position counter and one
//! [`ItemDisplayState`] per item seen this session. Showing an item adds a stepped
//! penalty; browsing past other items earns recovery according to the
//! [`RecoveryModel`]. Nothing here is persisted.

use serde::Serialize;
use std::collections::HashMap;

use super::recovery::RecoveryModel;
use crate::catalog::types::Item;
use crate::config::RecoveryConfig;

/// Mutable display bookkeeping for one item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemDisplayState {
    pub display_penalty: f64,
    pub last_display_position: u64,
    /// Showings that count toward the next penalty step. Capped by partial resets.
    pub display_count: u32,
    /// Showings over the whole session.
    pub total_display_count: u32,
}

/// Outcome of scoring one item against its display state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayScore {
    pub final_score: f64,
    pub penalty: f64,
    pub recovery: f64,
    pub browse_distance: u64,
    pub required_distance: u32,
}

/// Aggregate view of tracker state for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSummary {
    pub tracked_items: usize,
    pub global_position: u64,
    pub average_penalty: f64,
    pub max_penalty: f64,
    pub total_displays: u64,
}

/// Penalty added for the next showing, by how often the item was already shown.
pub fn penalty_increment(display_count: u32) -> f64 {
    match display_count {
        0 => 0.5,
        1 => 0.3,
        2 => 0.25,
        3 => 0.2,
        _ => 0.15,
    }
}

pub struct DisplayStateTracker {
    model: RecoveryModel,
    states: HashMap<String, ItemDisplayState>,
    global_position: u64,
    cleanup_threshold: u64,
    stale_window: u64,
}

impl Default for DisplayStateTracker {
    fn default() -> Self {
        Self::new(&RecoveryConfig::default())
    }
}

impl DisplayStateTracker {
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            model: RecoveryModel::new(config.base_distance),
            states: HashMap::new(),
            global_position: 0,
            cleanup_threshold: config.cleanup_threshold,
            stale_window: config.stale_window,
        }
    }

    pub fn recovery_model(&self) -> &RecoveryModel {
        &self.model
    }

    pub fn global_position(&self) -> u64 {
        self.global_position
    }

    pub fn state(&self, item_id: &str) -> Option<&ItemDisplayState> {
        self.states.get(item_id)
    }

    pub fn tracked_items(&self) -> usize {
        self.states.len()
    }

    /// Penalty-adjusted score for an item. Creates its state on first sight.
    pub fn display_score(&mut self, item: &Item, algorithm_score: f64) -> DisplayScore {
        self.states.entry(item.id.clone()).or_default();
        self.peek_display_score(item, algorithm_score)
    }

    /// Same computation as [`display_score`](Self::display_score) without touching state.
    pub fn peek_display_score(&self, item: &Item, algorithm_score: f64) -> DisplayScore {
        let (penalty, last_position) = self
            .states
            .get(&item.id)
            .map(|s| (s.display_penalty, s.last_display_position))
            .unwrap_or((0.0, 0));

        let browse_distance = self.global_position.saturating_sub(last_position);
        let required_distance = self
            .model
            .required_browse_distance(item, algorithm_score, penalty);
        let recovery = self
            .model
            .recovery_amount(item, algorithm_score, penalty, browse_distance);

        DisplayScore {
            final_score: (algorithm_score - penalty + recovery).max(0.0),
            penalty,
            recovery,
            browse_distance,
            required_distance,
        }
    }

    /// Record one showing at the current position and advance the position.
    pub fn record_display(&mut self, item_id: &str) {
        let position = self.global_position;
        let state = self.states.entry(item_id.to_string()).or_default();

        state.display_penalty += penalty_increment(state.display_count);
        state.last_display_position = position;
        state.display_count = state.display_count.saturating_add(1);
        state.total_display_count = state.total_display_count.saturating_add(1);

        self.global_position += 1;
        self.cleanup();
    }

    /// Record showings in list order. Later items see the positions of earlier ones.
    pub fn record_batch_display<S: AsRef<str>>(&mut self, item_ids: &[S]) {
        for id in item_ids {
            self.record_display(id.as_ref());
        }
    }

    /// Pay back the recovery an item has currently earned, lowering its stored penalty.
    ///
    /// Returns the amount subtracted.
    pub fn apply_recovery(&mut self, item: &Item, algorithm_score: f64) -> f64 {
        let global_position = self.global_position;
        let Some(state) = self.states.get_mut(&item.id) else {
            return 0.0;
        };

        let distance = global_position.saturating_sub(state.last_display_position);
        let amount =
            self.model
                .recovery_amount(item, algorithm_score, state.display_penalty, distance);
        state.display_penalty = (state.display_penalty - amount).max(0.0);
        amount
    }

    /// Soften state without forgetting it.
    ///
    /// Items not shown within the last `keep_recent` positions get their penalty halved.
    /// Items shown more than three times have their step counter capped at one, so the
    /// next showing is penalized lightly again; accumulated penalty is untouched by the cap.
    pub fn partial_reset(&mut self, keep_recent: u64) {
        let cutoff = self.global_position.saturating_sub(keep_recent);
        let mut halved = 0usize;

        for state in self.states.values_mut() {
            if state.last_display_position < cutoff {
                state.display_penalty /= 2.0;
                halved += 1;
            }
            if state.display_count > 3 {
                state.display_count = 1;
            }
        }

        tracing::debug!(halved, keep_recent, "partial display-state reset");
    }

    pub fn reset_all(&mut self) {
        self.states.clear();
        self.global_position = 0;
    }

    pub fn reset_item(&mut self, item_id: &str) -> bool {
        self.states.remove(item_id).is_some()
    }

    pub fn summary(&self) -> TrackerSummary {
        let tracked_items = self.states.len();
        let (sum, max, total) = self.states.values().fold((0.0, 0.0_f64, 0u64), |acc, s| {
            (
                acc.0 + s.display_penalty,
                acc.1.max(s.display_penalty),
                acc.2 + s.total_display_count as u64,
            )
        });

        TrackerSummary {
            tracked_items,
            global_position: self.global_position,
            average_penalty: if tracked_items == 0 {
                0.0
            } else {
                sum / tracked_items as f64
            },
            max_penalty: max,
            total_displays: total,
        }
    }

    /// Re-baseline positions past the threshold, then evict stale inert entries.
    fn cleanup(&mut self) {
        if self.global_position > self.cleanup_threshold {
            let min_position = self
                .states
                .values()
                .map(|s| s.last_display_position)
                .min()
                .unwrap_or(0);

            if min_position > 0 {
                for state in self.states.values_mut() {
                    state.last_display_position -= min_position;
                }
                self.global_position -= min_position;
                tracing::debug!(
                    shift = min_position,
                    global_position = self.global_position,
                    "display positions re-baselined"
                );
            }
        }

        if self.global_position > self.stale_window {
            let horizon = self.global_position - self.stale_window;
            let before = self.states.len();
            self.states
                .retain(|_, s| !(s.last_display_position < horizon && s.display_penalty <= 0.1));
            let evicted = before - self.states.len();
            if evicted > 0 {
                tracing::debug!(evicted, "stale display states evicted");
            }
        }
    }
}
