//! Styling for archive text files shown in the detail pane.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

static KEY_VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S.*?):(.*)").expect("key/value regex is valid") // Static pattern, safe to panic
});

const SEPARATOR_PREFIX: &str = "=====";

fn key_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn separator_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Styles one text file line: `Key: value` lines get a highlighted key and
/// `=====` rules are dimmed.
pub fn highlight_line(line: &str) -> Line<'static> {
    let line = line.trim_end_matches('\r');
    if line.trim_start().starts_with(SEPARATOR_PREFIX) {
        return Line::from(Span::styled(line.to_string(), separator_style()));
    }
    if let Some(captures) = KEY_VALUE_PATTERN.captures(line) {
        let key = captures.get(1).map_or("", |m| m.as_str());
        let value = captures.get(2).map_or("", |m| m.as_str());
        return Line::from(vec![
            Span::styled(format!("{key}:"), key_style()),
            Span::raw(value.to_string()),
        ]);
    }
    Line::from(line.to_string())
}

/// Styles a whole text file.
pub fn highlight_textfile(textfile: &str) -> Vec<Line<'static>> {
    textfile.lines().map(highlight_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_line_splits_key() {
        let line = highlight_line("Title                   : Scythe 2");
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "Title                   :");
        assert_eq!(line.spans[0].style, key_style());
        assert_eq!(line.spans[1].content, " Scythe 2");
    }

    #[test]
    fn test_indented_line_is_plain() {
        let line = highlight_line("   continued: text");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].style, Style::default());
    }

    #[test]
    fn test_separator_is_dimmed() {
        let rule = "=".repeat(75);
        let line = highlight_line(&rule);
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].style, separator_style());
    }

    #[test]
    fn test_crlf_textfile_lines() {
        let lines = highlight_textfile("Author: Erik Alm\r\nplain text\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[1].content, " Erik Alm");
        assert_eq!(lines[1].spans[0].content, "plain text");
    }
}
