//! Feed page assembly.
//!
//! [`FeedOrchestrator::generate_feed`] runs the whole pipeline for one page:
//!
//! 1. snapshot the catalog from the [`ItemSource`]
//! 2. algorithm score → display score → anti-loop adjustment, per item
//! 3. rank and shuffle near-ties
//! 4. apply the coverage quota ([`select_with_coverage`])
//! 5. attach reasons to a random share of entries
//! 6. record every shown entry with both trackers, in output order

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;

use super::anti_loop::AntiLoopMixer;
use super::display_state::{DisplayScore, DisplayStateTracker, ItemDisplayState, TrackerSummary};
use super::pacer::BatchSource;
use super::reasons::FeedReason;
use super::scorer::{CatalogIndex, ItemScorer, ScoreBreakdown};
use super::{Clock, SystemClock};
use crate::catalog::types::Item;
use crate::catalog::ItemSource;
use crate::config::LaneConfig;

/// An item with its scores for one ranking pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem {
    pub item: Item,
    pub algorithm_score: f64,
    /// Score after penalty, recovery and anti-loop adjustment.
    pub display_score: f64,
    pub browse_distance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ItemDisplayState>,
}

/// One entry of a feed page.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayItem {
    pub item: Item,
    pub show_reason: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_type: Option<FeedReason>,
    pub algorithm_score: f64,
    pub display_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmStatistics {
    pub pages_generated: u64,
    pub items_displayed: u64,
    pub last_catalog_size: usize,
    pub display_state: TrackerSummary,
    pub mixer_display_count: u64,
    pub recent_history: Vec<String>,
    pub loop_detected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDebugInfo {
    pub item: Item,
    pub breakdown: ScoreBreakdown,
    pub recovery_rate: f64,
    pub display: DisplayScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ItemDisplayState>,
    pub recent_occurrences: usize,
    pub diversity_penalty: f64,
}

/// Choose at most `count` entries from a ranked list.
///
/// When the list is longer than `count` and has entries on both sides of
/// `threshold` (by algorithm score), `floor(count × ratio)` come from the high side
/// and the rest from the low side, and the result is shuffled. A side with fewer
/// entries than its quota is not topped up from the other side, so the result can be
/// shorter than `count`.
pub fn select_with_coverage<R: Rng + ?Sized>(
    ranked: Vec<ScoredItem>,
    count: usize,
    threshold: f64,
    ratio: f64,
    rng: &mut R,
) -> Vec<ScoredItem> {
    if ranked.len() <= count {
        return ranked;
    }

    let (high, low): (Vec<ScoredItem>, Vec<ScoredItem>) = ranked
        .into_iter()
        .partition(|s| s.algorithm_score >= threshold);

    if high.is_empty() || low.is_empty() {
        let mut only = if high.is_empty() { low } else { high };
        only.truncate(count);
        return only;
    }

    let high_target = ((count as f64) * ratio.clamp(0.0, 1.0)).floor() as usize;
    let low_target = count - high_target.min(count);

    let mut selected: Vec<ScoredItem> = high.into_iter().take(high_target).collect();
    selected.extend(low.into_iter().take(low_target));
    selected.shuffle(rng);
    selected
}

pub struct FeedOrchestrator {
    source: Arc<dyn ItemSource>,
    clock: Arc<dyn Clock>,
    scorer: ItemScorer,
    tracker: DisplayStateTracker,
    mixer: AntiLoopMixer,
    rng: StdRng,
    coverage_threshold: f64,
    coverage_ratio: f64,
    reason_probability: f64,
    pages_generated: u64,
    items_displayed: u64,
    last_catalog_size: usize,
}

impl FeedOrchestrator {
    /// Build an orchestrator seeded from `config.feed.seed` (OS entropy when unset).
    pub fn new(source: Arc<dyn ItemSource>, config: &LaneConfig) -> Self {
        let mut rng = match config.feed.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mixer_rng = StdRng::seed_from_u64(rng.gen());

        Self {
            source,
            clock: Arc::new(SystemClock),
            scorer: ItemScorer::new(config.scoring.clone()),
            tracker: DisplayStateTracker::new(&config.recovery),
            mixer: AntiLoopMixer::new(&config.anti_loop, mixer_rng),
            rng,
            coverage_threshold: config.feed.coverage_threshold,
            coverage_ratio: config.feed.coverage_ratio.clamp(0.0, 1.0),
            reason_probability: config.feed.reason_probability.clamp(0.0, 1.0),
            pages_generated: 0,
            items_displayed: 0,
            last_catalog_size: 0,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tracker(&self) -> &DisplayStateTracker {
        &self.tracker
    }

    pub fn mixer(&self) -> &AntiLoopMixer {
        &self.mixer
    }

    /// Produce the next page of up to `count` entries and record them as shown.
    pub async fn generate_feed(&mut self, count: usize) -> Result<Vec<DisplayItem>> {
        let items = self.source.fetch_items().await?;
        self.last_catalog_size = items.len();
        if items.is_empty() {
            tracing::debug!("empty catalog, nothing to rank");
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let catalog_size = items.len();
        let ranked = self.rank(items, now);
        let high = ranked
            .iter()
            .filter(|s| s.algorithm_score >= self.coverage_threshold)
            .count();

        let selected = select_with_coverage(
            ranked,
            count,
            self.coverage_threshold,
            self.coverage_ratio,
            &mut self.rng,
        );

        let feed: Vec<DisplayItem> = selected
            .into_iter()
            .map(|scored| self.annotate(scored, now))
            .collect();

        for entry in &feed {
            self.tracker.record_display(&entry.item.id);
            self.mixer.record_display(&entry.item.id);
        }

        self.pages_generated += 1;
        self.items_displayed += feed.len() as u64;

        let reasons = feed.iter().filter(|d| d.show_reason).count();
        tracing::info!(
            requested = count,
            returned = feed.len(),
            catalog = catalog_size,
            high_bucket = high,
            low_bucket = catalog_size - high,
            reasons,
            "feed page generated"
        );
        if feed.len() < count && catalog_size > count {
            tracing::debug!(
                shortfall = count - feed.len(),
                "coverage quota left page short"
            );
        }
        if self.mixer.detect_loop_pattern() {
            tracing::warn!("recent feed history is cycling through few items");
        }

        Ok(feed)
    }

    /// Score every item and order them, shuffling near-ties.
    fn rank(&mut self, items: Vec<Item>, now: DateTime<Utc>) -> Vec<ScoredItem> {
        let index = CatalogIndex::build(&items);
        let mut pairs = Vec::with_capacity(items.len());
        let mut scored: Vec<Option<ScoredItem>> = Vec::with_capacity(items.len());

        for (position, item) in items.into_iter().enumerate() {
            let algorithm_score = self.scorer.score_indexed(&item, &index, now);
            let display = self.tracker.display_score(&item, algorithm_score);
            let final_score =
                self.mixer
                    .apply_adjustments(&item.id, display.final_score, algorithm_score, now);

            pairs.push((position, final_score));
            scored.push(Some(ScoredItem {
                state: self.tracker.state(&item.id).cloned(),
                item,
                algorithm_score,
                display_score: final_score,
                browse_distance: display.browse_distance,
            }));
        }

        self.mixer
            .intelligent_shuffle(pairs)
            .into_iter()
            .filter_map(|(position, _)| scored[position].take())
            .collect()
    }

    fn annotate(&mut self, scored: ScoredItem, now: DateTime<Utc>) -> DisplayItem {
        let reason = if self.rng.gen_bool(self.reason_probability) {
            let pick = self.rng.gen_range(0..FeedReason::ALL.len());
            Some(FeedReason::ALL[pick])
        } else {
            None
        };

        DisplayItem {
            show_reason: reason.is_some(),
            reason_text: reason.map(|r| r.render(&scored.item, now)),
            reason_type: reason,
            algorithm_score: scored.algorithm_score,
            display_score: scored.display_score,
            item: scored.item,
        }
    }

    pub fn algorithm_statistics(&self) -> AlgorithmStatistics {
        AlgorithmStatistics {
            pages_generated: self.pages_generated,
            items_displayed: self.items_displayed,
            last_catalog_size: self.last_catalog_size,
            display_state: self.tracker.summary(),
            mixer_display_count: self.mixer.display_count(),
            recent_history: self.mixer.recent_history().map(str::to_string).collect(),
            loop_detected: self.mixer.detect_loop_pattern(),
        }
    }

    /// Forget all session state. The random streams continue.
    pub fn reset_algorithm_state(&mut self) {
        self.tracker.reset_all();
        self.mixer.reset();
        self.pages_generated = 0;
        self.items_displayed = 0;
        tracing::info!("feed session state reset");
    }

    pub fn reset_item(&mut self, item_id: &str) -> bool {
        self.tracker.reset_item(item_id)
    }

    pub fn partial_reset(&mut self, keep_recent: u64) {
        self.tracker.partial_reset(keep_recent);
    }

    /// Scoring internals for one item against a fresh snapshot. Read-only.
    pub async fn item_debug_info(&self, item_id: &str) -> Result<Option<ItemDebugInfo>> {
        let items = self.source.fetch_items().await?;
        let Some(item) = items.iter().find(|i| i.id == item_id).cloned() else {
            return Ok(None);
        };

        let now = self.clock.now();
        let index = CatalogIndex::build(&items);
        let breakdown = self.scorer.breakdown(&item, &index, now);
        let recovery_rate = self
            .tracker
            .recovery_model()
            .recovery_rate(&item, breakdown.total);
        let display = self.tracker.peek_display_score(&item, breakdown.total);

        Ok(Some(ItemDebugInfo {
            state: self.tracker.state(item_id).cloned(),
            recent_occurrences: self.mixer.recent_occurrences(item_id),
            diversity_penalty: self.mixer.diversity_penalty(item_id),
            item,
            breakdown,
            recovery_rate,
            display,
        }))
    }
}

#[async_trait]
impl BatchSource<DisplayItem> for FeedOrchestrator {
    async fn next_batch(&mut self, count: usize) -> Result<Vec<DisplayItem>> {
        self.generate_feed(count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{ItemStatus, OpenStatus};
    use std::collections::BTreeSet;

    fn scored(id: usize, algorithm_score: f64) -> ScoredItem {
        ScoredItem {
            item: Item {
                id: format!("item-{id}"),
                name: format!("Item {id}"),
                category: "Misc".into(),
                brand: None,
                price: None,
                added_at: "2026-01-01T00:00:00Z".parse().unwrap(),
                open_status: OpenStatus::Other,
                status: ItemStatus::InStock,
                location: None,
                tags: BTreeSet::new(),
                photos: Vec::new(),
            },
            algorithm_score,
            display_score: algorithm_score,
            browse_distance: 0,
            state: None,
        }
    }

    #[test]
    fn coverage_shortfall_is_not_padded() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ranked: Vec<ScoredItem> = (0..7).map(|i| scored(i, 0.6)).collect();
        ranked.extend((7..20).map(|i| scored(i, 0.1)));

        let selected = select_with_coverage(ranked, 10, 0.3, 0.9, &mut rng);

        assert_eq!(selected.len(), 8);
        let high = selected.iter().filter(|s| s.algorithm_score >= 0.3).count();
        assert_eq!(high, 7);
        assert_eq!(selected.len() - high, 1);
    }

    #[test]
    fn coverage_splits_ninety_ten() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut ranked: Vec<ScoredItem> = (0..30).map(|i| scored(i, 0.8)).collect();
        ranked.extend((30..60).map(|i| scored(i, 0.2)));

        let selected = select_with_coverage(ranked, 20, 0.3, 0.9, &mut rng);
        assert_eq!(selected.len(), 20);
        let low: Vec<&ScoredItem> = selected.iter().filter(|s| s.algorithm_score < 0.3).collect();
        assert_eq!(low.len(), 2);
        // truncation keeps the best-ranked low entries
        let low_ids: BTreeSet<&str> = low.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(low_ids, BTreeSet::from(["item-30", "item-31"]));
    }

    #[test]
    fn small_catalog_returned_whole_in_rank_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let ranked: Vec<ScoredItem> = (0..5).map(|i| scored(i, 0.5 - i as f64 * 0.1)).collect();
        let selected = select_with_coverage(ranked, 5, 0.3, 0.9, &mut rng);
        let ids: Vec<&str> = selected.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["item-0", "item-1", "item-2", "item-3", "item-4"]);
    }

    #[test]
    fn one_sided_catalog_takes_top_ranked() {
        let mut rng = StdRng::seed_from_u64(4);
        let ranked: Vec<ScoredItem> = (0..10).map(|i| scored(i, 0.1)).collect();
        let selected = select_with_coverage(ranked, 3, 0.3, 0.9, &mut rng);
        let ids: Vec<&str> = selected.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["item-0", "item-1", "item-2"]);
    }
}
