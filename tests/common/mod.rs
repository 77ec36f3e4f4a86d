use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a fake claude home with a `projects/` tree.
pub fn claude_home() -> Result<TempDir> {
    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("projects"))?;
    Ok(dir)
}

/// Write one session log under `projects/<project_dir>/<filename>`.
pub fn write_log(home: &Path, project_dir: &str, filename: &str, content: &str) -> Result<()> {
    let dir = home.join("projects").join(project_dir);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(filename), content)?;
    Ok(())
}

/// One assistant line with usage data, in the on-disk shape.
pub fn usage_line(timestamp: &str, cwd: &str, model: &str, input: u64, output: u64) -> String {
    format!(
        r#"{{"timestamp":"{}","cwd":"{}","message":{{"role":"assistant","model":"{}","usage":{{"input_tokens":{},"output_tokens":{},"cache_creation_input_tokens":0,"cache_read_input_tokens":0}}}}}}"#,
        timestamp, cwd, model, input, output
    )
}
