//! The adaptive feed engine.
//!
//! Leaves first: [`scorer`] and [`recovery`] are pure; [`display_state`] and
//! [`anti_loop`] hold session state; [`orchestrator`] composes them into pages and
//! [`pacer`] streams pages out in small batches.

pub mod anti_loop;
pub mod display_state;
pub mod orchestrator;
pub mod pacer;
pub mod reasons;
pub mod recovery;
pub mod scorer;

use chrono::{DateTime, Utc};

pub use orchestrator::{DisplayItem, FeedOrchestrator};
pub use pacer::{BatchSource, DeliveryPacer};

/// Source of "now" for age and time-of-day terms.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
