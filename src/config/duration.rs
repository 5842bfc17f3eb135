//! Kubernetes duration parsing (`<number><unit>` with units s, m, h, d).

use anyhow::Result;
use regex::Regex;
use std::time::Duration;

/// Parse a Kubernetes duration string such as `30s`, `5m`, `1h` or `2d`.
///
/// Units are case-insensitive. Zero durations are rejected because every
/// duration in this crate is a polling or timeout interval.
pub fn parse_kubernetes_duration(duration_str: &str) -> Result<Duration> {
    let duration_trimmed = duration_str.trim();

    if duration_trimmed.is_empty() {
        return Err(anyhow::anyhow!("Duration string cannot be empty"));
    }

    let duration_regex = Regex::new(r"^(?P<number>\d+)(?P<unit>[smhd])$")
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    let interval_lower = duration_trimmed.to_lowercase();

    let captures = duration_regex.captures(&interval_lower).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid duration format '{duration_trimmed}'. Expected format: <number><unit> (e.g., '30s', '5m', '1h')"
        )
    })?;

    let number: u64 = captures
        .name("number")
        .ok_or_else(|| anyhow::anyhow!("Failed to extract number from duration '{duration_trimmed}'"))?
        .as_str()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid number in duration '{duration_trimmed}': {e}"))?;

    if number == 0 {
        return Err(anyhow::anyhow!(
            "Duration '{duration_trimmed}' must be greater than zero"
        ));
    }

    let unit = captures
        .name("unit")
        .ok_or_else(|| anyhow::anyhow!("Failed to extract unit from duration '{duration_trimmed}'"))?
        .as_str();

    let seconds = match unit {
        "s" => number,
        "m" => number.saturating_mul(60),
        "h" => number.saturating_mul(3600),
        "d" => number.saturating_mul(86400),
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown duration unit '{unit}' in '{duration_trimmed}'"
            ))
        }
    };

    Ok(Duration::from_secs(seconds))
}
