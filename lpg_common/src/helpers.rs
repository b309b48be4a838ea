use std::{str::FromStr, time::Duration};

/// Parse a positive number from a string value. Returns `None` for missing, malformed, or zero values so that the
/// caller can fall back to its default.
pub fn parse_positive<T>(value: Option<&str>) -> Option<T>
where T: FromStr + PartialOrd + Default {
    value.and_then(|s| s.trim().parse::<T>().ok()).filter(|v| *v > T::default())
}

/// Parse a positive number of seconds into a [`Duration`].
pub fn parse_seconds(value: Option<&str>) -> Option<Duration> {
    parse_positive::<u64>(value).map(Duration::from_secs)
}
