use anyhow::Context;
use std::io::Write;
use std::path::Path;
use stockrank_core::domain::recommendation::RecommendationReport;

/// Pretty JSON to `path`, or stdout when no path is given.
pub fn write_report(report: &RecommendationReport, path: Option<&Path>) -> anyhow::Result<()> {
    let mut body = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    body.push('\n');

    match path {
        Some(path) => std::fs::write(path, body)
            .with_context(|| format!("failed to write report to {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(body.as_bytes())
                .context("failed to write report to stdout")?;
            stdout.flush().context("failed to flush stdout")
        }
    }
}
