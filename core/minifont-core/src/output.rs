//! Streaming output helpers for pipeline reports.

use std::io::Write;

use anyhow::Result;

use crate::subset::FontArtifact;

/// Write artifacts as a prettified JSON array.
pub fn write_json_pretty(artifacts: &[FontArtifact], mut w: impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(artifacts)?;
    w.write_all(json.as_bytes())?;
    Ok(())
}

/// Write artifacts as newline-delimited JSON (NDJSON).
pub fn write_ndjson(artifacts: &[FontArtifact], mut w: impl Write) -> Result<()> {
    for artifact in artifacts {
        let line = serde_json::to_string(artifact)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}
