//! Session log scanning: directory traversal and JSONL record extraction.
//!
//! The usage root is `<claude_home>/projects`, one subdirectory per project,
//! each holding zero or more `.jsonl` session logs. Files are parsed in
//! parallel and per-file results are merged in discovery order, so the output
//! sequence is deterministic for a given tree.
//!
//! Everything below the root degrades quietly: an unreadable file or a
//! malformed line is counted in [`ScanStats`] and skipped. Only a missing
//! root is fatal, since the tool then has nothing at all to read.

use crate::config;
use crate::models::{RawLine, UsageRecord};
use crate::pricing::{calculate_cost, PricingTable};
use crate::timestamp::parse_timestamp;
use anyhow::Result;
use glob::glob;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Discard accounting for one scan. Partial failures never abort the run,
/// so this is the only place they become visible.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub lines_read: usize,
    pub lines_discarded: usize,
    pub records: usize,
}

impl ScanStats {
    fn absorb(&mut self, other: &ScanStats) {
        self.files_scanned += other.files_scanned;
        self.files_skipped += other.files_skipped;
        self.lines_read += other.lines_read;
        self.lines_discarded += other.lines_discarded;
        self.records += other.records;
    }
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub records: Vec<UsageRecord>,
    pub stats: ScanStats,
}

/// Walks the usage tree and turns log lines into priced [`UsageRecord`]s.
///
/// Pricing must already be materialized; cost is computed per record as it
/// is parsed.
pub struct UsageScanner<'a> {
    pricing: &'a PricingTable,
}

impl<'a> UsageScanner<'a> {
    pub fn new(pricing: &'a PricingTable) -> Self {
        Self { pricing }
    }

    pub fn scan(&self, claude_home: &Path) -> Result<ScanOutcome> {
        let projects_dir = claude_home.join("projects");
        if !projects_dir.is_dir() {
            anyhow::bail!(config::missing_data_help(claude_home));
        }

        let files = find_log_files(&projects_dir);
        let partials: Vec<FileScan> = files.par_iter().map(|path| self.scan_file(path)).collect();

        let mut outcome = ScanOutcome {
            records: Vec::new(),
            stats: ScanStats::default(),
        };
        for partial in partials {
            outcome.stats.absorb(&partial.stats);
            outcome.records.extend(partial.records);
        }
        outcome.stats.records = outcome.records.len();

        info!(
            files = outcome.stats.files_scanned,
            files_skipped = outcome.stats.files_skipped,
            lines = outcome.stats.lines_read,
            lines_discarded = outcome.stats.lines_discarded,
            records = outcome.stats.records,
            "scanned usage data"
        );
        Ok(outcome)
    }

    /// Parse one log file. Never fails: an unreadable file counts as skipped
    /// and yields nothing.
    fn scan_file(&self, path: &Path) -> FileScan {
        // A directory or other non-file can match the glob; opening one does
        // not reliably fail on every platform, so check up front.
        if !path.is_file() {
            debug!(file = %path.display(), "skipping non-file entry");
            return FileScan::skipped();
        }
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!(file = %path.display(), error = %e, "skipping unreadable file");
                return FileScan::skipped();
            }
        };

        let mut scan = FileScan::new();
        let mut project: Option<String> = None;

        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    // An I/O error mid-file will repeat on every retry, so
                    // abandon the rest of this file.
                    debug!(file = %path.display(), error = %e, "read error, abandoning file");
                    scan.stats.lines_discarded += 1;
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            scan.stats.lines_read += 1;

            let Ok(raw) = serde_json::from_str::<RawLine>(line) else {
                scan.stats.lines_discarded += 1;
                continue;
            };
            // Only lines with a nested usage object become records; summaries,
            // user turns and tool results fall through here.
            let Some(message) = raw.message else { continue };
            let Some(usage) = message.usage else { continue };

            if project.is_none() {
                project = raw
                    .cwd
                    .as_deref()
                    .filter(|cwd| !cwd.is_empty())
                    .and_then(last_path_segment);
            }

            let timestamp = raw
                .timestamp
                .as_deref()
                .and_then(|t| parse_timestamp(t).ok());
            let pricing = message.model.as_deref().and_then(|m| self.pricing.resolve(m));
            let cache_write_tokens = usage.cache_write();
            let cache_read_tokens = usage.cache_read();

            scan.records.push(UsageRecord {
                timestamp,
                project: String::new(),
                role: message.role,
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                cache_write_tokens,
                cache_read_tokens,
                model: message.model,
                cost: calculate_cost(
                    usage.input_tokens,
                    usage.output_tokens,
                    cache_write_tokens,
                    cache_read_tokens,
                    pricing,
                ),
            });
        }

        // Project identity is per file: the cwd of the first usage-bearing
        // line, else the directory the file sits in.
        let project = project.unwrap_or_else(|| directory_name(path));
        for record in &mut scan.records {
            record.project = project.clone();
        }
        scan
    }
}

struct FileScan {
    records: Vec<UsageRecord>,
    stats: ScanStats,
}

impl FileScan {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            stats: ScanStats {
                files_scanned: 1,
                ..Default::default()
            },
        }
    }

    fn skipped() -> Self {
        Self {
            records: Vec::new(),
            stats: ScanStats {
                files_skipped: 1,
                ..Default::default()
            },
        }
    }
}

/// All `.jsonl` files one level below the projects root, in glob's sorted
/// discovery order.
fn find_log_files(projects_dir: &Path) -> Vec<PathBuf> {
    let pattern = projects_dir.join("*").join("*.jsonl");
    match glob(&pattern.to_string_lossy()) {
        Ok(paths) => paths.flatten().collect(),
        Err(e) => {
            debug!(error = %e, "bad glob pattern for projects root");
            Vec::new()
        }
    }
}

fn last_path_segment(path: &str) -> Option<String> {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn directory_name(file: &Path) -> String {
    file.parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Distinct project names in first-seen order, for the projects report.
pub fn project_names(records: &[UsageRecord]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut names = Vec::new();
    for record in records {
        if seen.insert(record.project.clone()) {
            names.push(record.project.clone());
        }
    }
    names
}
