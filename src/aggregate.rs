//! Aggregation of usage records into summary rows.
//!
//! Groups are emitted in the order their keys were first seen; final ordering
//! belongs to [`crate::sort`]. Token and cost sums are order-independent, the
//! representative timestamp is the maximum in the group, and the model label
//! depends only on the group's distinct model set.

use crate::models::{AggregatedEntry, UsageRecord};
use std::collections::{HashMap, HashSet};

/// Calendar-day key used when a record carries no timestamp.
const UNKNOWN_DATE: &str = "unknown";

/// Collapse records into one row per (project, UTC calendar day).
pub fn aggregate_by_project_and_day(records: &[UsageRecord]) -> Vec<AggregatedEntry> {
    aggregate(records, true)
}

/// Collapse records into one row per project.
pub fn aggregate_by_project(records: &[UsageRecord]) -> Vec<AggregatedEntry> {
    aggregate(records, false)
}

fn aggregate(records: &[UsageRecord], by_day: bool) -> Vec<AggregatedEntry> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<(String, Option<String>), usize> = HashMap::new();

    for record in records {
        let date = by_day.then(|| match record.timestamp {
            Some(ts) => ts.date_naive().to_string(),
            None => UNKNOWN_DATE.to_string(),
        });
        let key = (record.project.clone(), date.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Group::new(record.project.clone(), date));
            groups.len() - 1
        });
        groups[slot].add(record);
    }

    groups.into_iter().map(Group::finish).collect()
}

struct Group {
    entry: AggregatedEntry,
    models: HashSet<String>,
}

impl Group {
    fn new(project: String, date: Option<String>) -> Self {
        Self {
            entry: AggregatedEntry {
                project,
                date,
                timestamp: None,
                input_tokens: 0,
                output_tokens: 0,
                cache_write_tokens: 0,
                cache_read_tokens: 0,
                cost: 0.0,
                message_count: 0,
                model: String::new(),
            },
            models: HashSet::new(),
        }
    }

    fn add(&mut self, record: &UsageRecord) {
        self.entry.input_tokens += record.input_tokens;
        self.entry.output_tokens += record.output_tokens;
        self.entry.cache_write_tokens += record.cache_write_tokens;
        self.entry.cache_read_tokens += record.cache_read_tokens;
        self.entry.cost += record.cost;
        self.entry.message_count += 1;
        // None < Some, so the max is the latest timestamp seen in the group.
        self.entry.timestamp = self.entry.timestamp.max(record.timestamp);
        if let Some(model) = &record.model {
            self.models.insert(model.clone());
        }
    }

    fn finish(mut self) -> AggregatedEntry {
        self.entry.model = match self.models.len() {
            0 => String::new(),
            1 => self.models.into_iter().next().unwrap_or_default(),
            n => format!("{} models", n),
        };
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, h, 0, 0).unwrap()
    }

    fn record(
        project: &str,
        timestamp: Option<DateTime<Utc>>,
        model: Option<&str>,
        tokens: (u64, u64, u64, u64),
        cost: f64,
    ) -> UsageRecord {
        UsageRecord {
            timestamp,
            project: project.to_string(),
            role: Some("assistant".to_string()),
            input_tokens: tokens.0,
            output_tokens: tokens.1,
            cache_write_tokens: tokens.2,
            cache_read_tokens: tokens.3,
            model: model.map(str::to_string),
            cost,
        }
    }

    #[test]
    fn groups_by_project_and_utc_day() {
        let records = vec![
            record("alpha", Some(at(1, 9)), Some("m1"), (10, 5, 0, 0), 0.1),
            record("alpha", Some(at(1, 18)), Some("m1"), (20, 10, 0, 0), 0.2),
            record("alpha", Some(at(2, 9)), Some("m1"), (1, 1, 0, 0), 0.01),
            record("beta", Some(at(1, 9)), Some("m1"), (5, 5, 0, 0), 0.05),
        ];
        let rows = aggregate_by_project_and_day(&records);
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.project, "alpha");
        assert_eq!(first.date.as_deref(), Some("2025-06-01"));
        assert_eq!(first.input_tokens, 30);
        assert_eq!(first.output_tokens, 15);
        assert_eq!(first.message_count, 2);
        assert!((first.cost - 0.3).abs() < 1e-12);
    }

    #[test]
    fn representative_timestamp_is_group_max() {
        let records = vec![
            record("alpha", Some(at(1, 18)), None, (1, 0, 0, 0), 0.0),
            record("alpha", Some(at(1, 9)), None, (1, 0, 0, 0), 0.0),
            record("alpha", Some(at(1, 23)), None, (1, 0, 0, 0), 0.0),
        ];
        let rows = aggregate_by_project_and_day(&records);
        assert_eq!(rows[0].timestamp, Some(at(1, 23)));
    }

    #[test]
    fn model_label_reflects_distinct_model_count() {
        let one = aggregate_by_project(&[
            record("a", Some(at(1, 1)), Some("claude-x"), (1, 0, 0, 0), 0.0),
            record("a", Some(at(1, 2)), Some("claude-x"), (1, 0, 0, 0), 0.0),
        ]);
        assert_eq!(one[0].model, "claude-x");

        let two = aggregate_by_project(&[
            record("a", Some(at(1, 1)), Some("claude-x"), (1, 0, 0, 0), 0.0),
            record("a", Some(at(1, 2)), Some("claude-y"), (1, 0, 0, 0), 0.0),
        ]);
        assert_eq!(two[0].model, "2 models");

        let none = aggregate_by_project(&[record("a", Some(at(1, 1)), None, (1, 0, 0, 0), 0.0)]);
        assert_eq!(none[0].model, "");
    }

    #[test]
    fn untimestamped_records_group_under_unknown_date() {
        let rows = aggregate_by_project_and_day(&[
            record("a", None, None, (1, 2, 3, 4), 0.0),
            record("a", None, None, (1, 2, 3, 4), 0.0),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date.as_deref(), Some("unknown"));
        assert_eq!(rows[0].message_count, 2);
    }

    #[test]
    fn sums_are_order_independent() {
        let mut records = vec![
            record("a", Some(at(1, 1)), Some("m1"), (10, 20, 30, 40), 0.5),
            record("a", Some(at(1, 2)), Some("m2"), (1, 2, 3, 4), 0.25),
            record("a", Some(at(2, 3)), Some("m1"), (7, 7, 7, 7), 0.1),
        ];
        let forward = aggregate_by_project(&records);
        records.reverse();
        let backward = aggregate_by_project(&records);

        assert_eq!(forward[0].total_tokens(), backward[0].total_tokens());
        assert_eq!(forward[0].message_count, backward[0].message_count);
        assert!((forward[0].cost - backward[0].cost).abs() < 1e-12);
        assert_eq!(forward[0].timestamp, backward[0].timestamp);
        assert_eq!(forward[0].model, backward[0].model);
    }

    #[test]
    fn aggregation_preserves_token_totals() {
        let records = vec![
            record("a", Some(at(1, 1)), None, (10, 20, 30, 40), 0.0),
            record("b", Some(at(1, 2)), None, (1, 2, 3, 4), 0.0),
            record("a", Some(at(3, 3)), None, (5, 6, 7, 8), 0.0),
            record("b", None, None, (9, 9, 9, 9), 0.0),
        ];
        let raw_total: u64 = records.iter().map(UsageRecord::total_tokens).sum();
        let rows = aggregate_by_project_and_day(&records);
        let aggregated_total: u64 = rows.iter().map(AggregatedEntry::total_tokens).sum();
        assert_eq!(raw_total, aggregated_total);
    }

    #[test]
    fn group_order_follows_first_appearance() {
        let records = vec![
            record("zeta", Some(at(2, 1)), None, (1, 0, 0, 0), 0.0),
            record("alpha", Some(at(1, 1)), None, (1, 0, 0, 0), 0.0),
            record("zeta", Some(at(3, 1)), None, (1, 0, 0, 0), 0.0),
        ];
        let rows = aggregate_by_project(&records);
        assert_eq!(rows[0].project, "zeta");
        assert_eq!(rows[1].project, "alpha");
    }
}
