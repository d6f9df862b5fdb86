// AI
//! 🖨️ previewer.rs: "just show me the first ten rows" as a service.
//!
//! 🍽️ Renders a `Frame` as a `+---+` grid with comfy-table, header on top, cells untouched
//! unless truncation is asked for. When the frame holds more rows than we print, a footer owns
//! up to it: `only showing top 10 rows`.
//!
//! ⚠️ Content arrangement stays `Disabled`. Dynamic arrangement would wrap long cells to the
//! terminal width, and a wrapped cell is a truncated cell wearing a disguise.

use std::io::Write;

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Deserialize;

use crate::frame::Frame;

// -- 🎨 borders: left, right, top, bottom, header rule, vertical lines, corners.
// -- the four spaces switch off lines between data rows.
const GRID_PRESET: &str = "||--+-++|    ++++++";

const NULL_DISPLAY: &str = "null";

/// 🔧 The `[preview]` section.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ShowOptions {
    /// 📏 Data rows to print, header not included.
    pub max_rows: usize,
    /// ✂️ Cut cells longer than this many characters. 0 = never truncate.
    pub truncate: usize,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            max_rows: 10,
            truncate: 0,
        }
    }
}

/// 🧯 Line breaks and tabs would split a row across lines or knock columns out of line.
fn escape_control(value: &str) -> String {
    let mut the_escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => the_escaped.push_str("\\n"),
            '\r' => the_escaped.push_str("\\r"),
            '\t' => the_escaped.push_str("\\t"),
            other => the_escaped.push(other),
        }
    }
    the_escaped
}

/// ✂️ `truncate` chars at most, with `...` when there is room for it.
fn truncate_cell(value: &str, truncate: usize) -> String {
    if truncate == 0 || value.chars().count() <= truncate {
        return value.to_string();
    }
    if truncate < 4 {
        value.chars().take(truncate).collect()
    } else {
        let mut the_cut: String = value.chars().take(truncate - 3).collect();
        the_cut.push_str("...");
        the_cut
    }
}

/// 🎨 Build the grid for the first `max_rows` rows. Exposed for callers that want the table
/// itself rather than the printed text.
pub fn render(frame: &Frame, options: &ShowOptions) -> Table {
    // -- ➡️ truncated cells line up on the right, full cells on the left
    let the_alignment = if options.truncate > 0 {
        CellAlignment::Right
    } else {
        CellAlignment::Left
    };
    let to_cell = |value: Option<&str>| {
        let the_text = escape_control(value.unwrap_or(NULL_DISPLAY));
        Cell::new(truncate_cell(&the_text, options.truncate))
            .set_alignment(the_alignment)
    };

    let mut the_table = Table::new();
    the_table.load_preset(GRID_PRESET);
    the_table.set_content_arrangement(ContentArrangement::Disabled);
    the_table.set_header(frame.columns().iter().map(|name| to_cell(Some(name.as_str()))));

    for row in frame.rows().take(options.max_rows) {
        the_table.add_row(row.values().iter().map(|value| to_cell(value.as_deref())));
    }

    for column in the_table.column_iter_mut() {
        column.set_padding((0, 0));
    }
    the_table
}

/// 🖨️ Write the preview (grid plus footer) to `out`.
pub fn show<W: Write>(
    frame: &Frame,
    options: &ShowOptions,
    out: &mut W,
) -> std::io::Result<()> {
    let the_table = render(frame, options);
    writeln!(out, "{the_table}")?;

    if frame.row_count() > options.max_rows {
        let the_noun = if options.max_rows == 1 { "row" } else { "rows" };
        writeln!(out, "only showing top {} {}", options.max_rows, the_noun)?;
    }
    writeln!(out)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a_frame_with(rows: usize) -> Frame {
        Frame::new(
            vec!["c1".into(), "c2".into(), "c3".into()],
            (0..rows)
                .map(|i| {
                    vec![
                        Some(format!("r{i:02}a")),
                        Some(format!("r{i:02}b")),
                        if i % 2 == 0 { None } else { Some(format!("r{i:02}c")) },
                    ]
                })
                .collect(),
        )
    }

    fn shown(frame: &Frame, options: &ShowOptions) -> String {
        let mut the_buffer = Vec::new();
        show(frame, options, &mut the_buffer).expect("💀 writing into a Vec cannot fail");
        String::from_utf8(the_buffer).expect("💀 preview should be UTF-8")
    }

    fn data_lines(text: &str) -> usize {
        text.lines().filter(|line| line.contains("a|") || line.contains("a ")).count()
    }

    #[test]
    fn the_one_where_twelve_rows_get_cut_to_ten() {
        let the_text = shown(&a_frame_with(12), &ShowOptions::default());

        assert_eq!(the_text.lines().filter(|l| l.contains("c1")).count(), 1);
        for i in 0..10 {
            assert!(the_text.contains(&format!("r{i:02}a")), "row {i} missing:\n{the_text}");
        }
        assert!(!the_text.contains("r10a"));
        assert!(!the_text.contains("r11a"));
        assert_eq!(data_lines(&the_text), 10);
        assert!(the_text.contains("only showing top 10 rows"));
    }

    #[test]
    fn the_one_where_four_rows_are_all_shown_without_a_footer() {
        let the_text = shown(&a_frame_with(4), &ShowOptions::default());
        assert_eq!(data_lines(&the_text), 4);
        assert!(the_text.contains("r03a"));
        assert!(!the_text.contains("only showing"));
        assert!(the_text.contains("null"));
    }

    #[test]
    fn the_one_where_a_novel_in_a_cell_is_printed_in_full() {
        let the_novel = "It was a dark and stormy night; ".repeat(40).trim_end().to_string();
        let the_frame = Frame::new(
            vec!["story".into()],
            vec![vec![Some(the_novel.clone())]],
        );
        let the_text = shown(&the_frame, &ShowOptions::default());
        assert!(the_text.contains(&the_novel));
        assert!(!the_text.contains("..."));
    }

    #[test]
    fn the_one_where_truncation_is_opt_in() {
        let the_frame = Frame::new(
            vec!["long".into()],
            vec![vec![Some("abcdefghijklmnopqrstuvwxyz".into())]],
        );
        let the_options = ShowOptions {
            truncate: 20,
            ..ShowOptions::default()
        };
        let the_text = shown(&the_frame, &the_options);
        assert!(the_text.contains("abcdefghijklmnopq..."));
        assert!(!the_text.contains("abcdefghijklmnopqrstuvwxyz"));
    }

    #[test]
    fn the_one_where_truncate_cell_handles_the_edge_cases() {
        assert_eq!(truncate_cell("hello", 0), "hello");
        assert_eq!(truncate_cell("hello", 5), "hello");
        assert_eq!(truncate_cell("hello", 3), "hel");
        assert_eq!(truncate_cell("hello world", 8), "hello...");
        // -- 🌍 characters, not bytes
        assert_eq!(truncate_cell("ééééé", 4), "é...");
    }

    #[test]
    fn the_one_where_a_multiline_cell_stays_on_one_line() {
        let the_frame = Frame::new(
            vec!["address".into(), "tabs".into()],
            vec![
                vec![Some("1 Main St\nSpringfield\r\n".into()), Some("a\tb".into())],
                vec![Some("plain".into()), None],
            ],
        );
        let the_text = shown(&the_frame, &ShowOptions::default());
        assert!(the_text.contains(r"1 Main St\nSpringfield\r\n"), "got:\n{the_text}");
        assert!(the_text.contains(r"a\tb"));
        assert!(!the_text.contains('\t'));
        // -- 📏 top rule, header, rule, two rows, bottom rule, blank line
        assert_eq!(the_text.lines().count(), 7, "got:\n{the_text}");
        assert_eq!(escape_control("no specials"), "no specials");
    }

    #[test]
    fn the_one_where_one_row_is_singular() {
        let the_text = shown(
            &a_frame_with(3),
            &ShowOptions {
                max_rows: 1,
                truncate: 0,
            },
        );
        assert!(the_text.contains("only showing top 1 row\n"));
    }

    #[test]
    fn the_one_where_an_empty_frame_still_has_a_header() {
        let the_text = shown(&a_frame_with(0), &ShowOptions::default());
        assert_eq!(the_text.lines().filter(|l| l.contains("c1")).count(), 1);
        assert_eq!(data_lines(&the_text), 0);
        assert!(!the_text.contains("only showing"));
    }
}
