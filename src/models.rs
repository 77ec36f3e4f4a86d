//! Core data models
//!
//! Types flow through the pipeline in this order:
//!
//! 1. [`RawLine`] / [`RawMessage`] / [`RawUsage`] - permissive shapes for one
//!    JSONL line as written by Claude Code (field names vary across schema
//!    versions, so everything is optional or defaulted)
//! 2. [`UsageRecord`] - one normalized, cost-priced assistant response
//! 3. [`AggregatedEntry`] - one summary row per (project, day) or per project
//!
//! [`ModelPricing`] carries the four per-token rates used to price a record;
//! see [`crate::pricing`] for how a model name resolves to one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a session log, as loosely as it appears on disk.
///
/// Lines that fail to deserialize into this shape are skipped by the scanner;
/// lines that deserialize but carry no `message.usage` produce no record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLine {
    pub timestamp: Option<String>,
    pub cwd: Option<String>,
    pub message: Option<RawMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub role: Option<String>,
    pub model: Option<String>,
    pub usage: Option<RawUsage>,
}

/// Token counts for a single response.
///
/// Cache fields have shipped under two names each; both are accepted and the
/// older `cache_creation_input_tokens`/`cache_read_input_tokens` spelling wins
/// when a line somehow carries both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_write_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
    pub cache_read_tokens: Option<u64>,
}

impl RawUsage {
    pub fn cache_write(&self) -> u64 {
        self.cache_creation_input_tokens
            .or(self.cache_write_tokens)
            .unwrap_or(0)
    }

    pub fn cache_read(&self) -> u64 {
        self.cache_read_input_tokens
            .or(self.cache_read_tokens)
            .unwrap_or(0)
    }
}

/// One token-accounted assistant response with its computed cost.
#[derive(Debug, Clone, Serialize)]
pub struct UsageRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub project: String,
    pub role: Option<String>,
    #[serde(rename = "inputTokens")]
    pub input_tokens: u64,
    #[serde(rename = "outputTokens")]
    pub output_tokens: u64,
    #[serde(rename = "cacheWriteTokens")]
    pub cache_write_tokens: u64,
    #[serde(rename = "cacheReadTokens")]
    pub cache_read_tokens: u64,
    pub model: Option<String>,
    pub cost: f64,
}

impl UsageRecord {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_write_tokens + self.cache_read_tokens
    }
}

/// Per-token rates for one model. Prices are per token, not per million.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_cost_per_token: Option<f64>,
    pub output_cost_per_token: Option<f64>,
    pub cache_creation_input_token_cost: Option<f64>,
    pub cache_read_input_token_cost: Option<f64>,
}

/// One summary row produced by the aggregator.
///
/// `date` is the UTC calendar day for per-day grouping ("unknown" when the
/// group's records carry no timestamp) and `None` for per-project grouping.
/// `timestamp` is the latest timestamp seen in the group.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedEntry {
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "inputTokens")]
    pub input_tokens: u64,
    #[serde(rename = "outputTokens")]
    pub output_tokens: u64,
    #[serde(rename = "cacheWriteTokens")]
    pub cache_write_tokens: u64,
    #[serde(rename = "cacheReadTokens")]
    pub cache_read_tokens: u64,
    pub cost: f64,
    #[serde(rename = "messageCount")]
    pub message_count: u64,
    /// The single contributing model name, "N models", or "" when no record
    /// in the group named a model.
    pub model: String,
}

impl AggregatedEntry {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_write_tokens + self.cache_read_tokens
    }
}
