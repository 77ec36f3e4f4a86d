use claude_spend::models::ModelPricing;
use claude_spend::pricing::PricingTable;
use claude_spend::scanner::{project_names, UsageScanner};

mod common;

fn test_pricing() -> PricingTable {
    let mut table = PricingTable::new();
    table.insert(
        "claude-sonnet-4-20250514",
        ModelPricing {
            input_cost_per_token: Some(3e-6),
            output_cost_per_token: Some(1.5e-5),
            cache_creation_input_token_cost: Some(3.75e-6),
            cache_read_input_token_cost: Some(3e-7),
        },
    );
    table
}

#[test]
fn scans_usage_lines_and_prices_them() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    let content = format!(
        "{}\n{}\n",
        common::usage_line(
            "2025-06-01T10:00:00Z",
            "/home/dev/web-frontend",
            "claude-sonnet-4-20250514",
            1_000_000,
            0,
        ),
        common::usage_line(
            "2025-06-01T11:00:00Z",
            "/home/dev/web-frontend",
            "claude-sonnet-4-20250514",
            0,
            1_000_000,
        ),
    );
    common::write_log(home.path(), "-home-dev-web-frontend", "session.jsonl", &content)?;

    let pricing = test_pricing();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.stats.files_scanned, 1);
    assert_eq!(outcome.stats.lines_read, 2);
    assert_eq!(outcome.stats.lines_discarded, 0);
    assert!((outcome.records[0].cost - 3.0).abs() < 1e-9);
    assert!((outcome.records[1].cost - 15.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn project_comes_from_cwd_last_segment() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    common::write_log(
        home.path(),
        "-some-encoded-dir",
        "a.jsonl",
        &common::usage_line("2025-06-01T10:00:00Z", "/home/dev/web-frontend", "m", 1, 1),
    )?;

    let pricing = PricingTable::new();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;
    assert_eq!(outcome.records[0].project, "web-frontend");
    Ok(())
}

#[test]
fn project_falls_back_to_directory_name() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    // No cwd field on any line.
    common::write_log(
        home.path(),
        "bare-project",
        "a.jsonl",
        r#"{"timestamp":"2025-06-01T10:00:00Z","message":{"role":"assistant","model":"m","usage":{"input_tokens":1,"output_tokens":1}}}"#,
    )?;

    let pricing = PricingTable::new();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;
    assert_eq!(outcome.records[0].project, "bare-project");
    Ok(())
}

#[test]
fn lines_without_usage_produce_no_record() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    let content = [
        // summary line, no message at all
        r#"{"type":"summary","summary":"some chat"}"#,
        // user turn, message but no usage
        r#"{"timestamp":"2025-06-01T09:00:00Z","cwd":"/home/dev/app","message":{"role":"user"}}"#,
        // malformed json
        r#"{"timestamp": oops"#,
        // the only real record
        &common::usage_line("2025-06-01T10:00:00Z", "/home/dev/app", "m", 10, 5),
    ]
    .join("\n");
    common::write_log(home.path(), "-home-dev-app", "session.jsonl", &content)?;

    let pricing = PricingTable::new();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.stats.lines_read, 4);
    assert_eq!(outcome.stats.lines_discarded, 1);
    assert_eq!(outcome.stats.records, 1);
    Ok(())
}

#[test]
fn cache_field_aliases_are_accepted() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    common::write_log(
        home.path(),
        "p",
        "a.jsonl",
        r#"{"message":{"role":"assistant","usage":{"input_tokens":1,"output_tokens":1,"cache_write_tokens":50,"cache_read_tokens":70}}}"#,
    )?;

    let pricing = PricingTable::new();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;
    assert_eq!(outcome.records[0].cache_write_tokens, 50);
    assert_eq!(outcome.records[0].cache_read_tokens, 70);
    // No timestamp on the line: the record still exists, just undated.
    assert!(outcome.records[0].timestamp.is_none());
    Ok(())
}

#[test]
fn unknown_model_prices_at_zero() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    common::write_log(
        home.path(),
        "p",
        "a.jsonl",
        &common::usage_line("2025-06-01T10:00:00Z", "/x/p", "mystery-model", 1000, 1000),
    )?;

    let pricing = test_pricing();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;
    assert_eq!(outcome.records[0].cost, 0.0);
    Ok(())
}

#[test]
fn missing_projects_root_is_fatal_with_remediation() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    // No projects/ underneath.
    let pricing = PricingTable::new();
    let err = UsageScanner::new(&pricing)
        .scan(dir.path())
        .unwrap_err()
        .to_string();
    assert!(err.contains("No Claude Code usage data found"));
    assert!(err.contains("CLAUDE_HOME"));
    Ok(())
}

#[test]
fn empty_projects_root_scans_to_nothing() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    let pricing = PricingTable::new();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.files_scanned, 0);
    Ok(())
}

#[test]
fn multiple_projects_listed_distinctly() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    common::write_log(
        home.path(),
        "-a",
        "one.jsonl",
        &common::usage_line("2025-06-01T10:00:00Z", "/srv/alpha", "m", 1, 1),
    )?;
    common::write_log(
        home.path(),
        "-b",
        "two.jsonl",
        &common::usage_line("2025-06-01T10:00:00Z", "/srv/beta", "m", 1, 1),
    )?;

    let pricing = PricingTable::new();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;
    let mut projects = project_names(&outcome.records);
    projects.sort();
    assert_eq!(projects, vec!["alpha", "beta"]);
    Ok(())
}

#[test]
fn unreadable_entry_is_skipped_not_fatal() -> anyhow::Result<()> {
    let home = common::claude_home()?;
    common::write_log(
        home.path(),
        "-home-dev-app",
        "good.jsonl",
        &common::usage_line(
            "2025-06-01T10:00:00Z",
            "/home/dev/app",
            "claude-sonnet-4-20250514",
            10,
            5,
        ),
    )?;
    // A directory with a .jsonl name matches discovery but cannot be read
    // as a log file.
    std::fs::create_dir_all(
        home.path()
            .join("projects")
            .join("-home-dev-app")
            .join("broken.jsonl"),
    )?;

    let pricing = test_pricing();
    let outcome = UsageScanner::new(&pricing).scan(home.path())?;

    assert_eq!(outcome.stats.files_skipped, 1);
    assert_eq!(outcome.stats.files_scanned, 1);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].project, "app");
    Ok(())
}
