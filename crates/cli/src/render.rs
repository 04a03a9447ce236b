//! Plain-text rendering of tables and column lists for the terminal.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use panelmerge_engine::{col_to_letter, Table, Value};

/// Widest a preview column is allowed to get.
const MAX_COL_WIDTH: usize = 24;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| ch.width().unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    // Walk chars, stop at width - 2 to leave room for ".."
    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// One cell as shown in a preview. Unmatched carried cells read `<missing>`.
fn preview_cell(v: &Value) -> String {
    match v {
        Value::Missing => "<missing>".to_string(),
        other => other.to_string().replace('\n', " "),
    }
}

/// Aligned text table of the first `max_rows` rows, header first.
pub(crate) fn render_table(table: &Table, max_rows: usize) -> String {
    let preview = table.head(max_rows);
    let cells: Vec<Vec<String>> = preview
        .rows()
        .iter()
        .map(|r| r.iter().map(preview_cell).collect())
        .collect();

    let widths: Vec<usize> = preview
        .headers()
        .iter()
        .enumerate()
        .map(|(c, h)| {
            cells
                .iter()
                .map(|r| display_width(&r[c]))
                .chain(std::iter::once(display_width(h)))
                .max()
                .unwrap_or(0)
                .min(MAX_COL_WIDTH)
        })
        .collect();

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| pad_right(v, w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(preview.headers()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    if table.row_count() > max_rows {
        out.push_str(&format!("... {} more row(s)\n", table.row_count() - max_rows));
    }
    out
}

/// `A  User REF` style listing of every column.
pub(crate) fn render_columns(table: &Table) -> String {
    table
        .headers()
        .iter()
        .enumerate()
        .map(|(i, h)| format!("  {:<3} {h}\n", col_to_letter(i)))
        .collect()
}
