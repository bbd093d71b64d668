//! Parsing of scraped discussion threads.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static COMMENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+?)said:(.+ago):(.+)").expect("static regex"));

/// One comment from a question's discussion page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub username: String,
    /// Relative age as scraped, e.g. `2 years ago`.
    pub when: String,
    /// Comment body; may contain HTML.
    pub text: String,
}

/// Parse the backend's newline-separated discussion dump.
///
/// Lines that are not of the form `<user>said:<age> ago:<text>` are dropped.
pub fn parse_comments(raw: &str) -> Vec<Comment> {
    raw.lines()
        .filter_map(|line| {
            let caps = COMMENT_LINE.captures(line)?;
            Some(Comment {
                username: caps[1].trim().to_string(),
                when: caps[2].trim().replace(':', ""),
                text: caps[3].trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comment_lines() {
        let raw = "alice said: 2 years ago: Option B is right\n\
                   noise line\n\
                   bob said:3 months ago:<b>No</b>, it's C";
        let comments = parse_comments(raw);
        assert_eq!(
            comments,
            vec![
                Comment {
                    username: "alice".into(),
                    when: "2 years ago".into(),
                    text: "Option B is right".into(),
                },
                Comment {
                    username: "bob".into(),
                    when: "3 months ago".into(),
                    text: "<b>No</b>, it's C".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_dump_yields_nothing() {
        assert!(parse_comments("").is_empty());
        assert!(parse_comments("no comments yet").is_empty());
    }
}
