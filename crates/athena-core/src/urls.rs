//! Compaction of numbered source URLs into ranges for display.

use std::sync::LazyLock;

use regex::Regex;

static NUMBERED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*/)(\d+)$").expect("static regex"));

/// Digits of the trailing number that must agree for URLs to share a range.
const RANGE_PREFIX_LEN: usize = 4;

/// A run of numbered URLs under one base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRange {
    pub base: String,
    pub start: String,
    pub end: String,
}

impl std::fmt::Display for UrlRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.base, self.start, self.end)
    }
}

/// Group URLs ending in `/<digits>` by base and by the first four digits.
///
/// Each range starts at the first URL seen for its group and ends at the last
/// one. Groups keep the order in which they were first seen. URLs without a
/// trailing number are skipped.
pub fn compact_urls<S: AsRef<str>>(urls: &[S]) -> Vec<UrlRange> {
    let mut ranges: Vec<UrlRange> = Vec::new();
    let mut keys: Vec<(String, String)> = Vec::new();

    for url in urls {
        let Some(caps) = NUMBERED_URL.captures(url.as_ref()) else {
            continue;
        };
        let base = &caps[1];
        let number = &caps[2];
        let prefix: String = number.chars().take(RANGE_PREFIX_LEN).collect();

        match keys.iter().position(|(b, p)| b == base && *p == prefix) {
            Some(i) => ranges[i].end = number.to_string(),
            None => {
                keys.push((base.to_string(), prefix));
                ranges.push(UrlRange {
                    base: base.to_string(),
                    start: number.to_string(),
                    end: number.to_string(),
                });
            }
        }
    }

    // ranges under the same base are listed together
    let mut ordered: Vec<UrlRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match ordered.iter().rposition(|r| r.base == range.base) {
            Some(i) => ordered.insert(i + 1, range),
            None => ordered.push(range),
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_base_and_prefix() {
        let urls = [
            "https://bank.example/q/10001",
            "https://bank.example/q/10002",
            "https://bank.example/q/10005",
            "https://bank.example/q/20001",
            "https://other.example/item/7",
        ];
        let ranges: Vec<String> = compact_urls(&urls).iter().map(ToString::to_string).collect();
        assert_eq!(
            ranges,
            vec![
                "https://bank.example/q/, 10001, 10005",
                "https://bank.example/q/, 20001, 20001",
                "https://other.example/item/, 7, 7",
            ]
        );
    }

    #[test]
    fn bases_stay_together_in_first_seen_order() {
        let urls = ["https://a/1000", "https://b/5", "https://a/2000"];
        let bases: Vec<String> = compact_urls(&urls).into_iter().map(|r| r.start).collect();
        assert_eq!(bases, vec!["1000", "2000", "5"]);
    }

    #[test]
    fn unnumbered_urls_are_skipped() {
        let urls = vec![
            "https://www.sanfoundry.com/topic-questions/".to_string(),
            "no-slash-123".to_string(),
        ];
        assert!(compact_urls(&urls).is_empty());
    }
}
