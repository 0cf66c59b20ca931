//! Loading recorded pen traces

use std::path::Path;

use anyhow::Context;
use ink::PenEvent;

/// Parse a trace: either a JSON array of events or JSON lines.
///
/// Blank lines and lines starting with `#` are skipped in JSON lines mode.
pub fn parse_trace(contents: &str) -> anyhow::Result<Vec<PenEvent>> {
    if contents.trim_start().starts_with('[') {
        return serde_json::from_str(contents).context("invalid JSON trace");
    }

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid event on line {}", i + 1))
        })
        .collect()
}

pub fn load_trace(path: &Path) -> anyhow::Result<Vec<PenEvent>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    parse_trace(&contents)
}
