//! Paced, batched delivery of feed entries.
//!
//! [`DeliveryPacer`] hands a requested number of entries to the consumer in small
//! batches with a pause between them. The pause starts long and shrinks as more
//! entries arrive, so the list appears to speed up as it fills. The pause is the
//! only await point besides generation itself; dropping the future there leaves the
//! pacer idle.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::PacingConfig;

/// Something that can produce the next `count` entries on demand.
#[async_trait]
pub trait BatchSource<T>: Send {
    async fn next_batch(&mut self, count: usize) -> Result<Vec<T>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacerState {
    Idle,
    Loading,
    /// Set by the consumer when it is close to the end of what it has.
    /// Purely informational; nothing transitions out of it automatically.
    PreLoading,
}

pub struct DeliveryPacer {
    state: Mutex<PacerState>,
    config: PacingConfig,
}

impl Default for DeliveryPacer {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}

/// Puts the pacer back to `Idle` however the load loop exits.
struct LoadingGuard<'a> {
    state: &'a Mutex<PacerState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = PacerState::Idle;
    }
}

impl DeliveryPacer {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            state: Mutex::new(PacerState::Idle),
            config,
        }
    }

    pub fn state(&self) -> PacerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark that the consumer is nearing the end of its list. Ignored while loading.
    pub fn enter_pre_loading(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == PacerState::Idle {
            *state = PacerState::PreLoading;
        }
    }

    /// True when idle and no more than the preload threshold of entries remain below
    /// the visible window.
    pub fn should_pre_load(&self, visible: usize, total: usize, first_visible: usize) -> bool {
        if self.state() != PacerState::Idle {
            return false;
        }
        let seen = first_visible.saturating_add(visible);
        total.saturating_sub(seen) <= self.config.preload_threshold
    }

    /// Pause after `loaded` entries have been delivered.
    ///
    /// Shrinks linearly from the initial delay to the minimum as `loaded` approaches the
    /// acceleration span, then stays at the minimum.
    pub fn batch_delay(&self, loaded: usize) -> Duration {
        let span = self.config.acceleration_span.max(1) as f64;
        let progress = (loaded as f64 / span).min(1.0);
        let initial = self.config.initial_delay_ms as f64;
        let min = self.config.min_delay_ms as f64;
        let ms = initial - (initial - min) * progress;
        Duration::from_millis(ms.round().max(0.0) as u64)
    }

    /// Load entries until `total_needed` is reached, handing each batch to `on_batch`.
    ///
    /// Returns the number of entries delivered. Returns `Ok(0)` at once if another load
    /// is already running. Stops early if the source returns an empty batch.
    pub async fn load_more_smoothly<T, G, F>(
        &self,
        current_count: usize,
        total_needed: usize,
        mut on_batch: F,
        generator: &mut G,
    ) -> Result<usize>
    where
        G: BatchSource<T> + ?Sized,
        F: FnMut(Vec<T>) + Send,
        T: Send,
    {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == PacerState::Loading {
                tracing::debug!("load already in progress, skipping");
                return Ok(0);
            }
            *state = PacerState::Loading;
        }
        let _guard = LoadingGuard { state: &self.state };

        let mut remaining = total_needed.saturating_sub(current_count);
        let mut loaded = 0usize;
        let batch_size = self.config.batch_size.max(1);

        while remaining > 0 {
            let want = batch_size.min(remaining);
            let batch = generator.next_batch(want).await?;
            if batch.is_empty() {
                tracing::debug!(loaded, remaining, "source ran dry");
                break;
            }

            let got = batch.len().min(remaining);
            on_batch(batch);
            loaded += got;
            remaining -= got;

            if remaining > 0 {
                tokio::time::sleep(self.batch_delay(loaded)).await;
            }
        }

        tracing::debug!(loaded, "paced load finished");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        next: usize,
        calls: Vec<usize>,
    }

    #[async_trait]
    impl BatchSource<usize> for Counter {
        async fn next_batch(&mut self, count: usize) -> Result<Vec<usize>> {
            self.calls.push(count);
            let batch = (self.next..self.next + count).collect();
            self.next += count;
            Ok(batch)
        }
    }

    #[test]
    fn delay_accelerates_then_floors() {
        let pacer = DeliveryPacer::default();
        assert_eq!(pacer.batch_delay(0), Duration::from_millis(80));
        assert_eq!(pacer.batch_delay(6), Duration::from_millis(60));
        assert_eq!(pacer.batch_delay(12), Duration::from_millis(40));
        assert_eq!(pacer.batch_delay(60), Duration::from_millis(40));
    }

    #[test]
    fn should_pre_load_near_bottom() {
        let pacer = DeliveryPacer::default();
        assert!(!pacer.should_pre_load(10, 100, 0));
        assert!(pacer.should_pre_load(10, 40, 15));
        assert!(pacer.should_pre_load(10, 20, 15));
    }

    #[test]
    fn pre_loading_blocks_further_pre_load() {
        let pacer = DeliveryPacer::default();
        pacer.enter_pre_loading();
        assert_eq!(pacer.state(), PacerState::PreLoading);
        assert!(!pacer.should_pre_load(10, 20, 15));
    }

    #[tokio::test(start_paused = true)]
    async fn loads_in_batches_of_six() {
        let pacer = DeliveryPacer::default();
        let mut source = Counter { next: 0, calls: Vec::new() };
        let mut received = Vec::new();

        let loaded = pacer
            .load_more_smoothly(4, 20, |batch: Vec<usize>| received.extend(batch), &mut source)
            .await
            .unwrap();

        assert_eq!(loaded, 16);
        assert_eq!(source.calls, vec![6, 6, 4]);
        assert_eq!(received, (0..16).collect::<Vec<_>>());
        assert_eq!(pacer.state(), PacerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_to_do_when_already_full() {
        let pacer = DeliveryPacer::default();
        let mut source = Counter { next: 0, calls: Vec::new() };
        let loaded = pacer
            .load_more_smoothly(30, 20, |_: Vec<usize>| {}, &mut source)
            .await
            .unwrap();
        assert_eq!(loaded, 0);
        assert!(source.calls.is_empty());
    }
}
