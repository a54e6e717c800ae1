//! Anti-loop score mixing.
//!
//! Keeps the feed from settling into a fixed order or cycling through the same few
//! items. [`AntiLoopMixer`] adds bounded noise to every score, pushes down items that
//! were shown recently, and shuffles near-ties. Its display counter is independent of
//! the tracker's global position; both must be advanced for every shown item.

use chrono::{DateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::f64::consts::TAU;

use crate::config::AntiLoopConfig;

/// Scores closer than this are considered tied and may swap places.
pub const TIE_GAP: f64 = 0.1;

const RANDOM_SPAN: f64 = 0.2;
const WAVE_AMPLITUDE: f64 = 0.05;
const JITTER_AMPLITUDE: f64 = 0.05;
const LOOP_WINDOW: usize = 10;
const LOOP_MAX_DISTINCT: usize = 4;

/// Individual terms added to a score, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustment {
    pub random: f64,
    pub time_wave: f64,
    pub diversity_penalty: f64,
    pub periodic_jitter: f64,
    pub final_score: f64,
}

pub struct AntiLoopMixer {
    rng: StdRng,
    history: VecDeque<String>,
    history_window: usize,
    jitter_epoch: u64,
    display_count: u64,
}

impl AntiLoopMixer {
    pub fn new(config: &AntiLoopConfig, rng: StdRng) -> Self {
        Self {
            rng,
            history: VecDeque::with_capacity(config.history_window),
            history_window: config.history_window,
            jitter_epoch: config.jitter_epoch.max(1),
            display_count: 0,
        }
    }

    pub fn seeded(config: &AntiLoopConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    /// Adjusted score, floored at zero.
    pub fn apply_adjustments(
        &mut self,
        item_id: &str,
        base_score: f64,
        algorithm_score: f64,
        now: DateTime<Utc>,
    ) -> f64 {
        self.adjust(item_id, base_score, algorithm_score, now).final_score
    }

    /// Like [`apply_adjustments`](Self::apply_adjustments) but returns every term.
    pub fn adjust(
        &mut self,
        item_id: &str,
        base_score: f64,
        algorithm_score: f64,
        now: DateTime<Utc>,
    ) -> Adjustment {
        let random = self.rng.gen_range(0.0..RANDOM_SPAN);
        let time_wave = time_wave(item_id, now);
        let diversity_penalty = self.diversity_penalty(item_id);
        let periodic_jitter = self.periodic_jitter(algorithm_score);

        let final_score =
            (base_score + random + time_wave - diversity_penalty + periodic_jitter).max(0.0);

        Adjustment {
            random,
            time_wave,
            diversity_penalty,
            periodic_jitter,
            final_score,
        }
    }

    /// Penalty for appearing in the recent history window.
    pub fn diversity_penalty(&self, item_id: &str) -> f64 {
        match self.recent_occurrences(item_id) {
            n if n >= 3 => 0.3,
            2 => 0.2,
            1 => 0.1,
            _ => 0.0,
        }
    }

    pub fn recent_occurrences(&self, item_id: &str) -> usize {
        self.history.iter().filter(|id| id.as_str() == item_id).count()
    }

    /// Jitter applied only at epoch boundaries of the display counter.
    ///
    /// Seeded from the cycle number and the score, so it repeats exactly within an epoch.
    fn periodic_jitter(&self, algorithm_score: f64) -> f64 {
        if self.display_count % self.jitter_epoch != 0 {
            return 0.0;
        }
        let cycle = self.display_count / self.jitter_epoch;
        let seed = cycle.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ algorithm_score.to_bits();
        StdRng::seed_from_u64(seed).gen_range(-JITTER_AMPLITUDE..JITTER_AMPLITUDE)
    }

    /// Sort descending, then shuffle within runs of near-tied scores.
    ///
    /// A run continues while each score is within [`TIE_GAP`] of the previous one, so
    /// items separated by a larger gap never trade places.
    pub fn intelligent_shuffle<K>(&mut self, mut pairs: Vec<(K, f64)>) -> Vec<(K, f64)> {
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut groups: Vec<Vec<(K, f64)>> = Vec::new();
        let mut previous: Option<f64> = None;
        for pair in pairs {
            let starts_group = match previous {
                Some(prev) => (prev - pair.1).abs() >= TIE_GAP,
                None => true,
            };
            previous = Some(pair.1);
            if starts_group {
                groups.push(Vec::new());
            }
            if let Some(group) = groups.last_mut() {
                group.push(pair);
            }
        }

        let mut shuffled = Vec::new();
        for mut group in groups {
            group.shuffle(&mut self.rng);
            shuffled.extend(group);
        }
        shuffled
    }

    pub fn record_display(&mut self, item_id: &str) {
        if self.history_window > 0 {
            if self.history.len() == self.history_window {
                self.history.pop_front();
            }
            self.history.push_back(item_id.to_string());
        }
        self.display_count += 1;
    }

    /// True when the last ten displays cover four or fewer distinct items.
    pub fn detect_loop_pattern(&self) -> bool {
        if self.history.len() < LOOP_WINDOW {
            return false;
        }
        let distinct: HashSet<&str> = self
            .history
            .iter()
            .rev()
            .take(LOOP_WINDOW)
            .map(String::as_str)
            .collect();
        distinct.len() <= LOOP_MAX_DISTINCT
    }

    pub fn display_count(&self) -> u64 {
        self.display_count
    }

    pub fn recent_history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Forget history and the counter. The random stream continues.
    pub fn reset(&mut self) {
        self.history.clear();
        self.display_count = 0;
    }
}

/// Hour-of-day wave plus a per-item wave that shifts every minute, each ±0.05.
fn time_wave(item_id: &str, now: DateTime<Utc>) -> f64 {
    let hour = now.hour() as f64 + now.minute() as f64 / 60.0;
    let daily = (hour / 24.0 * TAU).sin() * WAVE_AMPLITUDE;

    let minute = (now.timestamp() / 60) as u64;
    let seed = stable_hash(item_id) ^ minute;
    let per_item = ((seed % 100_000) as f64).sin() * WAVE_AMPLITUDE;

    daily + per_item
}

/// FNV-1a. Stable across runs and toolchains, unlike `DefaultHasher`.
fn stable_hash(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
    })
}
