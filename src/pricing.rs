//! Model pricing: fetch, cache, fuzzy resolution and cost calculation.
//!
//! Rates come from LiteLLM's published pricing document, filtered down to the
//! Claude family. The fetch is time-bounded and any failure falls back to a
//! built-in table of known rates, so a report never blocks on the network and
//! never runs without pricing. Both outcomes are cached for an hour inside
//! the caller-owned [`PricingFetcher`].

use crate::models::ModelPricing;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const LITELLM_PRICING_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Model-name-to-rates table with stable iteration order.
///
/// Entries keep their insertion order so the substring fallback in
/// [`PricingTable::resolve`] is deterministic: the first entry in table order
/// that matches wins, with no similarity ranking on top.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    entries: Vec<(String, ModelPricing)>,
    index: HashMap<String, usize>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, pricing: ModelPricing) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = pricing,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, pricing));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelPricing> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelPricing)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a usage record's model name to a pricing entry.
    ///
    /// In order, first hit wins: exact key, fixed name-variant rewrites, then
    /// a case-insensitive substring match in either direction against every
    /// key in table order. Returns `None` when nothing matches, which prices
    /// the record at zero.
    pub fn resolve(&self, model: &str) -> Option<&ModelPricing> {
        if let Some(pricing) = self.get(model) {
            return Some(pricing);
        }

        for candidate in variant_names(model) {
            if let Some(pricing) = self.get(&candidate) {
                return Some(pricing);
            }
        }

        let needle = model.to_lowercase();
        for (name, pricing) in &self.entries {
            let key = name.to_lowercase();
            if key.contains(&needle) || needle.contains(&key) {
                return Some(pricing);
            }
        }

        None
    }
}

/// Fixed rewrites of a model name toward LiteLLM's naming, in priority order.
fn variant_names(model: &str) -> Vec<String> {
    let mut candidates = vec![format!("anthropic/{}", model)];
    if let Some(base) = model.strip_suffix("-latest") {
        candidates.push(base.to_string());
    }
    for (from, to) in [("claude-3-5-", "claude-3.5-"), ("claude-3.5-", "claude-3-5-")] {
        if model.contains(from) {
            candidates.push(model.replace(from, to));
        }
    }
    candidates
}

/// Pure cost function: tokens weighted by the resolved per-token rates.
///
/// Any absent rate, and an absent entry entirely, contributes zero. Never
/// negative, never NaN.
pub fn calculate_cost(
    input_tokens: u64,
    output_tokens: u64,
    cache_write_tokens: u64,
    cache_read_tokens: u64,
    pricing: Option<&ModelPricing>,
) -> f64 {
    let Some(pricing) = pricing else {
        return 0.0;
    };

    let mut cost = 0.0;
    if let Some(rate) = pricing.input_cost_per_token {
        cost += input_tokens as f64 * rate;
    }
    if let Some(rate) = pricing.output_cost_per_token {
        cost += output_tokens as f64 * rate;
    }
    if let Some(rate) = pricing.cache_creation_input_token_cost {
        cost += cache_write_tokens as f64 * rate;
    }
    if let Some(rate) = pricing.cache_read_input_token_cost {
        cost += cache_read_tokens as f64 * rate;
    }
    cost
}

/// Owns the pricing table and its one-hour cache.
///
/// Construct one per process and call [`PricingFetcher::fetch`] before
/// scanning; records are priced as they are parsed.
#[derive(Debug, Default)]
pub struct PricingFetcher {
    cached: Option<(PricingTable, Instant)>,
}

impl PricingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pricing table, reusing a cached copy younger than an hour
    /// when `use_cache` allows it.
    ///
    /// Fetch or parse failures degrade to the built-in fallback table with a
    /// warning; the fallback is cached under the same policy so repeated
    /// failures do not retry within the window.
    pub async fn fetch(&mut self, use_cache: bool) -> PricingTable {
        if use_cache {
            if let Some((table, fetched_at)) = &self.cached {
                if fetched_at.elapsed() < CACHE_TTL {
                    debug!(models = table.len(), "using cached pricing table");
                    return table.clone();
                }
            }
        }

        let table = match fetch_remote_pricing().await {
            Ok(table) => {
                info!(models = table.len(), "fetched model pricing");
                table
            }
            Err(e) => {
                warn!(error = %e, "pricing fetch failed, using built-in rates");
                fallback_pricing()
            }
        };

        self.cached = Some((table.clone(), Instant::now()));
        table
    }
}

async fn fetch_remote_pricing() -> Result<PricingTable> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let document: serde_json::Value = client
        .get(LITELLM_PRICING_URL)
        .send()
        .await
        .context("pricing request failed")?
        .error_for_status()
        .context("pricing request returned an error status")?
        .json()
        .await
        .context("failed to parse pricing document")?;

    let object = document
        .as_object()
        .context("pricing document is not a JSON object")?;

    let mut table = PricingTable::new();
    for (name, value) in object {
        if !name.starts_with("claude-") && !name.starts_with("anthropic/") {
            continue;
        }
        let pricing = ModelPricing {
            input_cost_per_token: value.get("input_cost_per_token").and_then(|v| v.as_f64()),
            output_cost_per_token: value.get("output_cost_per_token").and_then(|v| v.as_f64()),
            cache_creation_input_token_cost: value
                .get("cache_creation_input_token_cost")
                .and_then(|v| v.as_f64()),
            cache_read_input_token_cost: value
                .get("cache_read_input_token_cost")
                .and_then(|v| v.as_f64()),
        };
        // Entries that price nothing are useless for cost reports.
        if pricing.input_cost_per_token.is_none() && pricing.output_cost_per_token.is_none() {
            continue;
        }
        table.insert(name.clone(), pricing);
    }

    anyhow::ensure!(!table.is_empty(), "pricing document had no usable entries");
    Ok(table)
}

fn entry(input: f64, output: f64, cache_write: f64, cache_read: f64) -> ModelPricing {
    ModelPricing {
        input_cost_per_token: Some(input),
        output_cost_per_token: Some(output),
        cache_creation_input_token_cost: Some(cache_write),
        cache_read_input_token_cost: Some(cache_read),
    }
}

/// Hand-maintained rates used when the fetch fails. Dollars per token.
pub fn fallback_pricing() -> PricingTable {
    let mut table = PricingTable::new();

    // Opus family: $15/M in, $75/M out
    let opus = entry(1.5e-5, 7.5e-5, 1.875e-5, 1.5e-6);
    table.insert("claude-opus-4-1-20250805", opus.clone());
    table.insert("claude-opus-4-20250514", opus.clone());
    table.insert("claude-3-opus-20240229", opus.clone());
    table.insert("claude-3-opus-latest", opus);

    // Sonnet family: $3/M in, $15/M out
    let sonnet = entry(3e-6, 1.5e-5, 3.75e-6, 3e-7);
    table.insert("claude-sonnet-4-20250514", sonnet.clone());
    table.insert("claude-3-7-sonnet-20250219", sonnet.clone());
    table.insert("claude-3-5-sonnet-20241022", sonnet.clone());
    table.insert("claude-3-5-sonnet-20240620", sonnet.clone());
    table.insert("claude-3-5-sonnet-latest", sonnet);

    // Haiku family
    let haiku_35 = entry(8e-7, 4e-6, 1e-6, 8e-8);
    table.insert("claude-3-5-haiku-20241022", haiku_35.clone());
    table.insert("claude-3-5-haiku-latest", haiku_35);
    table.insert("claude-3-haiku-20240307", entry(2.5e-7, 1.25e-6, 3e-7, 3e-8));

    table
}
