//! Adaptive "memory lane" feed ranking for personal inventory catalogs.
//!
//! memlane turns a static catalog of inventory items into an endless, relevance-ordered
//! feed that does not repeat itself. Every item gets a static score from four weighted
//! dimensions:
//!
//! | Dimension | Weight | Looks at |
//! |-----------|--------|----------|
//! | **Memory** | 0.30 | open status, age, price |
//! | **Insight** | 0.25 | brand recurrence, price against the catalog average, category share |
//! | **Relationship** | 0.25 | co-located items, related items, shared tags |
//! | **Needs** | 0.20 | lifecycle status, open status, price |
//!
//! On top of that, each session tracks a display penalty per item that recovers as the
//! user browses past other items, mixes in bounded noise so the order never freezes, and
//! reserves a share of every page for low-scoring items.
//!
//! # Architecture
//!
//! - **Storage**: SQLite item catalog (tags and photos in side tables)
//! - **Ranking**: [`feed::FeedOrchestrator`], single-writer, session-scoped state
//! - **Delivery**: [`feed::DeliveryPacer`] streams pages in accelerating batches
//! - **Transport**: MCP over stdio, plus a CLI
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema and migrations
//! - [`catalog`]: Item model, item sources and the item store
//! - [`feed`]: Scoring, display state, anti-loop mixing, page assembly and pacing

pub mod catalog;
pub mod config;
pub mod db;
pub mod feed;
