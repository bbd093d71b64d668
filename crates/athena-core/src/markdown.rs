//! Formatting for bot-generated explanations.
//!
//! The explanation service answers in a loose markdown dialect: numbered
//! citation links, `**bold**`, option bullets, fenced code and pipe tables.
//! [`format_bot_response`] turns that into HTML.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const LINK_STYLE: &str = "color: blue; text-decoration: underline;";
const PRE_STYLE: &str = "overflow-x: auto; padding: 2; font-size: small; background-color: #f0f0f0; border-radius: 4px;";
const TABLE_STYLE: &str = "border-collapse: collapse; width: 100%;";
const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 8px;";

static CITATION_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[(\d+)\]: (https?://[^\s]+) "(.+)""#).expect("static regex")
});

static CITATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\^\d+\^\]\[\d+\]\s*|\[\d+\]\[\d+\]\s*").expect("static regex")
});

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("static regex"));

static OPTION_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- Option [ABCD]:").expect("static regex"));

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[a-z]*\n([\s\S]*?)```").expect("static regex"));

/// Format a bot response as HTML.
pub fn format_bot_response(response: &str) -> String {
    let text = CITATION_LINK.replace_all(response, |caps: &Captures<'_>| {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer" style="{LINK_STYLE}">[{}] {}</a><br/>"#,
            &caps[2], &caps[1], &caps[3]
        )
    });
    let text = CITATION_MARKER.replace_all(&text, "");
    let text = BOLD.replace_all(&text, |caps: &Captures<'_>| {
        format!("<strong>{}</strong>", &caps[1])
    });
    let text = OPTION_BULLET.replace_all(&text, |caps: &Captures<'_>| {
        format!("<br/> {}", &caps[0])
    });
    let text = CODE_FENCE.replace_all(&text, |caps: &Captures<'_>| {
        format!(r#"<pre style="{PRE_STYLE}"><code>{}</code></pre>"#, &caps[1])
    });
    convert_tables(&text)
}

/// Convert pipe tables into HTML tables.
///
/// A table is a header row, a separator row (`|---|:--:|`) with the same
/// number of columns, and zero or more data rows; every line starts and ends
/// with `|`. A block that breaks any of these rules, including a data row with
/// the wrong number of cells, is left as literal text.
pub fn convert_tables(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        match parse_table(&lines[i..]) {
            Some((html, consumed)) => {
                out.push(html);
                i += consumed;
            }
            None => {
                out.push(lines[i].to_string());
                i += 1;
            }
        }
    }

    out.join("\n")
}

/// Parse a table starting at the first line. Returns the HTML and the number
/// of lines consumed.
fn parse_table(lines: &[&str]) -> Option<(String, usize)> {
    let header = row_cells(lines.first()?)?;
    let separator = row_cells(lines.get(1)?)?;
    if separator.len() != header.len() || !separator.iter().all(|c| is_separator_cell(c)) {
        return None;
    }

    let mut rows = Vec::new();
    for line in &lines[2..] {
        let Some(cells) = row_cells(line) else {
            break;
        };
        if cells.len() != header.len() {
            return None;
        }
        rows.push(cells);
    }

    let consumed = 2 + rows.len();
    Some((render_table(&header, &rows), consumed))
}

fn row_cells(line: &str) -> Option<Vec<&str>> {
    let line = line.trim_end_matches('\r');
    let inner = line.strip_prefix('|')?.strip_suffix('|')?;
    if inner.is_empty() {
        return None;
    }
    Some(inner.split('|').map(str::trim).collect())
}

fn is_separator_cell(cell: &str) -> bool {
    cell.contains('-') && cell.chars().all(|c| c == '-' || c == ':')
}

fn render_table(header: &[&str], rows: &[Vec<&str>]) -> String {
    let mut html = format!(r#"<table style="{TABLE_STYLE}"><thead><tr>"#);
    for cell in header {
        html.push_str(&format!(r#"<th style="{CELL_STYLE}">{cell}</th>"#));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!(r#"<td style="{CELL_STYLE}">{cell}</td>"#));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_links_become_anchors() {
        let out = format_bot_response(r#"[1]: https://example.com/a "Example A""#);
        assert_eq!(
            out,
            format!(
                r#"<a href="https://example.com/a" target="_blank" rel="noopener noreferrer" style="{LINK_STYLE}">[1] Example A</a><br/>"#
            )
        );
    }

    #[test]
    fn stray_citation_markers_are_removed() {
        assert_eq!(
            format_bot_response("Ohm's law[^1^][1] applies [2][2] here"),
            "Ohm's lawapplies here"
        );
    }

    #[test]
    fn bold_and_option_bullets() {
        assert_eq!(
            format_bot_response("**Answer** is B.\n- Option A: wrong\n- Option B: right"),
            "<strong>Answer</strong> is B.\n<br/> - Option A: wrong\n<br/> - Option B: right"
        );
    }

    #[test]
    fn option_bullets_only_for_a_to_d() {
        assert_eq!(format_bot_response("- Option E: n/a"), "- Option E: n/a");
    }

    #[test]
    fn fenced_code_becomes_pre() {
        let out = format_bot_response("Try:\n```python\nprint(1)\n```\ndone");
        assert_eq!(
            out,
            format!("Try:\n<pre style=\"{PRE_STYLE}\"><code>print(1)\n</code></pre>\ndone")
        );
    }

    #[test]
    fn two_column_table() {
        let out = format_bot_response("| Term | Meaning |\n|---|:---:|\n| V | Voltage |\n");
        assert_eq!(out.matches("<table").count(), 1);
        assert_eq!(out.matches("<thead>").count(), 1);
        assert_eq!(out.matches("<th style=").count(), 2);
        assert_eq!(out.matches("<tbody>").count(), 1);
        assert_eq!(out.matches("<tr>").count(), 2);
        assert_eq!(out.matches("<td style=").count(), 2);
        assert!(out.contains(">Voltage</td>"));
    }

    #[test]
    fn header_only_table_has_empty_body() {
        let out = convert_tables("| A | B |\n| - | - |");
        assert!(out.contains("<tbody></tbody>"));
    }

    #[test]
    fn table_without_separator_is_left_alone() {
        let text = "| Term | Meaning |\n| V | Voltage |\n";
        assert_eq!(format_bot_response(text), text);
        assert!(!format_bot_response(text).contains("<table"));
    }

    #[test]
    fn ragged_table_is_left_alone() {
        let text = "| A | B |\n|---|---|\n| 1 | 2 | 3 |\n";
        assert_eq!(convert_tables(text), text);
    }

    #[test]
    fn separator_column_count_must_match() {
        let text = "| A | B |\n|---|\n| 1 | 2 |";
        assert_eq!(convert_tables(text), text);
    }

    #[test]
    fn table_ends_at_first_non_row_line() {
        let out = convert_tables("before\n| A |\n|---|\n| 1 |\nafter");
        assert!(out.starts_with("before\n<table"));
        assert!(out.ends_with("</table>\nafter"));
    }
}
