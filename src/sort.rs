//! Ordering of records and aggregate rows by a user-chosen field.
//!
//! Field and order names arrive as strings from the CLI; an unknown value is
//! a validation error naming the bad input and the allowed set, never a
//! silent default.

use crate::models::{AggregatedEntry, UsageRecord};
use anyhow::{bail, Error};
use chrono::{DateTime, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Cost,
    Time,
    Tokens,
    Project,
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cost" => Ok(Self::Cost),
            "time" => Ok(Self::Time),
            "tokens" => Ok(Self::Tokens),
            "project" => Ok(Self::Project),
            other => bail!(
                "Invalid sort field: '{}'. Valid fields: cost, time, tokens, project",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => bail!("Invalid sort order: '{}'. Valid orders: asc, desc", other),
        }
    }
}

/// Sort keys shared by raw records and aggregate rows, so one sorter serves
/// both report shapes.
pub trait Sortable {
    fn cost_key(&self) -> f64;
    fn time_key(&self) -> Option<DateTime<Utc>>;
    fn tokens_key(&self) -> u64;
    fn project_key(&self) -> &str;
}

impl Sortable for UsageRecord {
    fn cost_key(&self) -> f64 {
        self.cost
    }
    fn time_key(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
    fn tokens_key(&self) -> u64 {
        self.total_tokens()
    }
    fn project_key(&self) -> &str {
        &self.project
    }
}

impl Sortable for AggregatedEntry {
    fn cost_key(&self) -> f64 {
        self.cost
    }
    fn time_key(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
    fn tokens_key(&self) -> u64 {
        self.total_tokens()
    }
    fn project_key(&self) -> &str {
        &self.project
    }
}

/// Return a reordered copy; the input is never mutated. Uses an unstable
/// sort, so ties keep no particular relative order.
pub fn sort_by_field<T: Sortable + Clone>(
    items: &[T],
    field: SortField,
    order: SortOrder,
) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_unstable_by(|a, b| {
        let ordering = match field {
            SortField::Cost => a.cost_key().total_cmp(&b.cost_key()),
            SortField::Time => {
                let a_time = a.time_key().unwrap_or(DateTime::UNIX_EPOCH);
                let b_time = b.time_key().unwrap_or(DateTime::UNIX_EPOCH);
                a_time.cmp(&b_time)
            }
            SortField::Tokens => a.tokens_key().cmp(&b.tokens_key()),
            SortField::Project => a
                .project_key()
                .to_lowercase()
                .cmp(&b.project_key().to_lowercase()),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    sorted
}
