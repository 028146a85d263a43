//! Object key helpers shared by the planner and orchestrator.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Path delimiter for object keys
pub const DELIMITER: &str = "/";

/// Split a key into its non-empty segments.
///
/// Consecutive, leading and trailing delimiters collapse, so
/// `"a//b/"` yields `["a", "b"]`.
pub fn split_key(key: &str) -> Vec<&str> {
    key.split(DELIMITER).filter(|s| !s.is_empty()).collect()
}

/// A key ending in the delimiter is a pseudo-folder, not a file.
pub fn is_directory_marker(key: &str) -> bool {
    key.ends_with(DELIMITER)
}

/// Render `[prefix/]year=YYYY/month=MM/day=DD/hour=HH/filename`.
pub fn partitioned_key(prefix: &str, ts: &NaiveDateTime, filename: &str) -> String {
    let partition = format!(
        "year={:04}/month={:02}/day={:02}/hour={:02}/{}",
        ts.year(),
        ts.month(),
        ts.day(),
        ts.hour(),
        filename
    );
    if prefix.is_empty() {
        partition
    } else {
        format!("{}{}{}", prefix, DELIMITER, partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_split_collapses_delimiters() {
        assert_eq!(split_key("a/b/c.json"), vec!["a", "b", "c.json"]);
        assert_eq!(split_key("/a//b/"), vec!["a", "b"]);
        assert!(split_key("").is_empty());
        assert!(split_key("///").is_empty());
    }

    #[test]
    fn test_directory_marker() {
        assert!(is_directory_marker("logs/"));
        assert!(is_directory_marker("/"));
        assert!(!is_directory_marker("logs/app.json"));
        assert!(!is_directory_marker(""));
    }

    #[test]
    fn test_partitioned_key_zero_pads() {
        assert_eq!(
            partitioned_key("logs", &ts(2023, 5, 9, 4), "f.json"),
            "logs/year=2023/month=05/day=09/hour=04/f.json"
        );
        assert_eq!(
            partitioned_key("", &ts(987, 12, 31, 23), "f.json"),
            "year=0987/month=12/day=31/hour=23/f.json"
        );
    }
}
