//! claude-spend
//!
//! Reporting library for Claude Code session logs: scans the JSONL usage
//! tree, prices every assistant response against a model-rate table, and
//! produces filtered, aggregated, sorted report rows.
//!
//! ## Pipeline
//!
//! 1. [`pricing::PricingFetcher`] materializes the model-rate table (remote
//!    document with a one-hour cache, built-in fallback on any failure)
//! 2. [`scanner::UsageScanner`] walks `<claude_home>/projects` and yields
//!    cost-priced [`UsageRecord`]s plus discard statistics
//! 3. [`filters::apply_filters`] narrows the set by time window and project
//! 4. [`aggregate`] optionally collapses records per (project, day) or per
//!    project
//! 5. [`sort::sort_by_field`] orders whichever shape the caller chose
//!
//! The CLI in `main.rs` and the rendering in [`display`] are thin wrappers
//! around this pipeline.

pub mod aggregate;
pub mod config;
pub mod display;
pub mod filters;
pub mod logging;
pub mod models;
pub mod pricing;
pub mod scanner;
pub mod sort;
pub mod timestamp;

pub use models::{AggregatedEntry, ModelPricing, UsageRecord};
pub use pricing::{PricingFetcher, PricingTable};
pub use scanner::{ScanOutcome, ScanStats, UsageScanner};
