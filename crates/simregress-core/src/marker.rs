//! End-status classifier: turns a build's completion marker file into a
//! [`CompletionStatus`] plus a runtime in seconds.

use std::path::Path;

use anyhow::{bail, Context};

use crate::model::CompletionStatus;

/// File the simulation writes as its completion record.
pub const END_MARKER: &str = "simout.end";

/// Token present in the marker when the run completed cleanly, e.g.
/// `Simulation Completed Successfully-- 1 Warning; Elapsed Time=00hr 00min  1.42sec`.
pub const SUCCESS_TOKEN: &str = "Successfully";

/// Token present when the run hit a fatal error, e.g.
/// `Simulation Terminated--Fatal Error Detected. Elapsed Time=00hr 00min  0.59sec`.
pub const FATAL_TOKEN: &str = "Fatal";

/// Classify the raw marker contents and extract the elapsed runtime.
///
/// Returns `(Unknown, 0.0)` when neither token is present. A marker that
/// matches a token but carries a malformed duration is an error; the caller
/// records `Unknown` rather than asserting a false runtime.
pub fn parse_marker(contents: &str) -> anyhow::Result<(CompletionStatus, f64)> {
    // The marker line may be wrapped mid-token by the writer.
    let contents = contents.replace('\n', "");

    let status = if contents.contains(SUCCESS_TOKEN) {
        CompletionStatus::Success
    } else if contents.contains(FATAL_TOKEN) {
        CompletionStatus::Fatal
    } else {
        return Ok((CompletionStatus::Unknown, 0.0));
    };

    let runtime = parse_elapsed(&contents)?;
    Ok((status, runtime))
}

/// Parse the `HHhr MMmin SS.sssec` duration after the marker's single `=`.
/// Hours and minutes are fixed two-digit fields; seconds run up to the
/// literal `s`. Whitespace between tokens may duplicate.
fn parse_elapsed(contents: &str) -> anyhow::Result<f64> {
    let (_, time_part) = contents
        .split_once('=')
        .context("marker has no '=' separating the elapsed-time field")?;

    let tokens: Vec<&str> = time_part.split_whitespace().collect();
    if tokens.len() < 3 {
        bail!("elapsed-time field has {} tokens, expected 3", tokens.len());
    }

    let hours: f64 = tokens[0]
        .get(..2)
        .context("hours token shorter than 2 characters")?
        .parse()
        .context("hours field is not numeric")?;
    let minutes: f64 = tokens[1]
        .get(..2)
        .context("minutes token shorter than 2 characters")?
        .parse()
        .context("minutes field is not numeric")?;

    let seconds_token = tokens[2];
    let s_at = seconds_token
        .find('s')
        .context("seconds token has no 's' terminator")?;
    let seconds: f64 = seconds_token[..s_at]
        .parse()
        .context("seconds field is not numeric")?;

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Classify one case run directory. A missing marker file is reported as
/// `Missing` without invoking the parser; an unreadable or malformed marker
/// degrades to `Unknown`.
pub fn classify_run_dir(dir: &Path) -> (CompletionStatus, f64) {
    let path = dir.join(END_MARKER);
    if !path.exists() {
        return (CompletionStatus::Missing, 0.0);
    }
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unreadable completion marker");
            return (CompletionStatus::Unknown, 0.0);
        }
    };
    match parse_marker(&contents) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "malformed completion marker");
            (CompletionStatus::Unknown, 0.0)
        }
    }
}
