/// Parses an origin processing time given in seconds, optionally suffixed
/// with `s`, into milliseconds.
///
/// Malformed, negative, or non-finite values are treated as absent.
#[must_use]
pub fn parse_origin_time(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('s').unwrap_or(trimmed).trim();
    if number.is_empty() {
        return None;
    }
    let seconds: f64 = number.parse().ok()?;
    if !seconds.is_finite() || seconds.is_sign_negative() {
        return None;
    }
    Some(seconds * 1000.0)
}
