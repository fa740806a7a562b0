use jiff::{SignedDuration, Span, SpanRelativeTo};

/// Parses a timeout given as plain seconds, a friendly duration ("30s",
/// "1m30s") or an ISO 8601 duration ("PT1M").
pub fn parse_timeout(input: &str) -> Result<SignedDuration, String> {
    let duration = if let Ok(seconds) = input.parse::<i64>() {
        SignedDuration::from_secs(seconds)
    } else if let Ok(duration) = input.parse::<SignedDuration>() {
        duration
    } else {
        input
            .parse::<Span>()
            .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
            .map_err(|error| format!("invalid duration {input:?}: {error}"))?
    };

    if duration.is_negative() {
        return Err(format!("negative timeout {input:?}"));
    }
    Ok(duration)
}
