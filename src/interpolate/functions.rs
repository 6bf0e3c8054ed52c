//! Built-in template functions: `random(length)` and `timestamp(format)`
//!
//! Malformed arguments fall back to defaults instead of failing.

use chrono::format::{Item, StrftimeItems};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

const DEFAULT_RANDOM_LENGTH: usize = 10;
const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Evaluate a function call. Returns `None` for unknown functions.
pub fn call(name: &str, args: &[&str]) -> Option<String> {
    match name {
        "random" => Some(random(args.first().copied())),
        "timestamp" => Some(timestamp(args.first().copied())),
        _ => None,
    }
}

/// Split `name(a,b)` into its name and raw argument list
pub fn parse_call(token: &str) -> Option<(&str, Vec<&str>)> {
    let open = token.find('(')?;
    let name = &token[..open];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let inner = token[open + 1..].strip_suffix(')')?;
    if inner.contains(')') {
        return None;
    }

    Some((name, inner.split(',').collect()))
}

fn random(length: Option<&str>) -> String {
    let length = length
        .and_then(|arg| arg.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_RANDOM_LENGTH);

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn timestamp(format: Option<&str>) -> String {
    let format = format
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .filter(|f| !StrftimeItems::new(f).any(|item| matches!(item, Item::Error)))
        .unwrap_or(DEFAULT_TIMESTAMP_FORMAT);

    Utc::now().format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call() {
        assert_eq!(parse_call("random(5)"), Some(("random", vec!["5"])));
        assert_eq!(parse_call("random()"), Some(("random", vec![""])));
        assert_eq!(
            parse_call("timestamp(%Y,extra)"),
            Some(("timestamp", vec!["%Y", "extra"]))
        );
        assert_eq!(parse_call("user_id"), None);
        assert_eq!(parse_call("rand0m(5)"), None);
        assert_eq!(parse_call("random(5"), None);
        assert_eq!(parse_call("(5)"), None);
    }

    #[test]
    fn test_random_lengths() {
        assert_eq!(random(Some("5")).len(), 5);
        assert_eq!(random(Some(" 12 ")).len(), 12);
        assert_eq!(random(None).len(), DEFAULT_RANDOM_LENGTH);
        assert_eq!(random(Some("abc")).len(), DEFAULT_RANDOM_LENGTH);
        assert_eq!(random(Some("0")).len(), DEFAULT_RANDOM_LENGTH);
        assert_eq!(random(Some("-3")).len(), DEFAULT_RANDOM_LENGTH);
        assert!(random(Some("32")).chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_timestamp_formats() {
        let year = timestamp(Some("%Y"));
        assert_eq!(year.len(), 4);
        assert!(year.chars().all(|c| c.is_ascii_digit()));

        let default = timestamp(None);
        assert_eq!(default.len(), "2024-01-01T00:00:00Z".len());
        assert!(default.ends_with('Z'));

        // An invalid specifier degrades to the default layout
        assert_eq!(timestamp(Some("%Q")).len(), default.len());
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(call("uuid", &[]), None);
    }
}
