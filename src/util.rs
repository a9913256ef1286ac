use chrono::{DateTime, FixedOffset};
use std::time::Duration;

/// `YYYY-MM` of the timestamp's own calendar date (not converted to UTC).
pub fn month_key(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%Y-%m").to_string()
}

/// Canonical form of a tracked subdirectory: no leading separator and
/// exactly one trailing separator. `None` for paths naming the root.
pub fn normalize_subdir(path: &str) -> Option<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("{trimmed}/"))
    }
}

/// Normalizes every path, keeping the first occurrence of duplicates.
pub fn normalize_subdirs<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(paths.len());
    for p in paths {
        if let Some(n) = normalize_subdir(p.as_ref()) {
            if !out.contains(&n) {
                out.push(n);
            }
        }
    }
    out
}

/// Splits a comma separated `--subdirs` value.
pub fn parse_subdir_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Column header used for a subdirectory in the CSV export.
pub fn subdir_column_name(subdir: &str) -> String {
    subdir.trim_matches('/').replace('/', "_")
}

pub fn parse_timeout(input: &str) -> std::result::Result<Duration, String> {
    let d = humantime::parse_duration(input).map_err(|e| format!("invalid duration '{input}': {e}"))?;
    if d.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_uses_commit_local_date() {
        let ts = DateTime::parse_from_rfc3339("2024-01-31T23:30:00-05:00").unwrap();
        assert_eq!(month_key(&ts), "2024-01");
        let ts = DateTime::parse_from_rfc3339("2024-02-01T00:30:00+01:00").unwrap();
        assert_eq!(month_key(&ts), "2024-02");
    }

    #[test]
    fn normalize_adds_single_trailing_separator() {
        assert_eq!(normalize_subdir("apps/web").as_deref(), Some("apps/web/"));
        assert_eq!(normalize_subdir("/apps/web//").as_deref(), Some("apps/web/"));
        assert_eq!(normalize_subdir(" src "), Some("src/".to_string()));
        assert_eq!(normalize_subdir("/"), None);
        assert_eq!(normalize_subdir(""), None);
    }

    #[test]
    fn normalize_subdirs_preserves_order_and_dedupes() {
        let got = normalize_subdirs(&["b", "a/", "/b/", "", "c"]);
        assert_eq!(got, vec!["b/", "a/", "c/"]);
    }

    #[test]
    fn parse_subdir_list_skips_blanks() {
        assert_eq!(parse_subdir_list("apps/web, apps/api,,"), vec!["apps/web", "apps/api"]);
        assert!(parse_subdir_list("").is_empty());
    }

    #[test]
    fn column_name_flattens_path() {
        assert_eq!(subdir_column_name("apps/coral-web/"), "apps_coral-web");
    }

    #[test]
    fn parse_timeout_accepts_humantime() {
        assert_eq!(parse_timeout("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_timeout("300s").unwrap(), Duration::from_secs(300));
        assert!(parse_timeout("0s").is_err());
        assert!(parse_timeout("soon").is_err());
    }
}
