//! Pulls register rows out of the HTML register table.
//!
//! The vendor documentation is not well-formed enough for a real HTML parser to be worth it, so
//! rows and cells are located with non-greedy patterns. Only rows with exactly [`COLUMNS`] cells
//! are of interest; everything else on the page (navigation, legends, nested layout tables) has a
//! different shape and is dropped here.

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Number of cells in a register row: decimal address, hex address, register count, function
/// codes, data type, access, name and description.
pub const COLUMNS: usize = 8;

pub type Row = [String; COLUMNS];

static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("row pattern is valid"));
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<td[^>]*>(.*?)</td>").expect("cell pattern is valid"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Lazily iterate over all eight-cell rows in `markup`, in document order.
pub fn rows(markup: &str) -> impl Iterator<Item = Row> + '_ {
    ROW.captures_iter(markup).filter_map(|row| {
        let fragments = cells(row.get(1)?.as_str());
        let Ok(fragments) = <[&str; COLUMNS]>::try_from(fragments) else {
            trace!(
                offset = row.get(0).map_or(0, |m| m.start()),
                "skipping row without {COLUMNS} cells"
            );
            return None;
        };
        Some(fragments.map(cell_text))
    })
}

/// Raw inner markup of every cell in a row fragment.
pub fn cells(row: &str) -> Vec<&str> {
    CELL.captures_iter(row)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Plain text of a single cell.
///
/// Markup is removed and the remainder trimmed *before* entities are decoded, so an escaped
/// non-breaking space at either end is kept as `U+00A0`. Entities are expanded the way browsers
/// do it in text content: legacy named references without a `;`, C1 numeric references mapped
/// through Windows-1252 and invalid code points replaced with `U+FFFD`.
pub fn cell_text(cell: &str) -> String {
    let stripped = TAG.replace_all(cell, "");
    htmlize::unescape(stripped.trim()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_eight_cell_rows() {
        let markup = r#"
            <table>
              <tr><th>Dec Adress</th><th>Hex</th></tr>
              <tr class="odd"><td>100</td><td>0x0064</td><td>1</td><td>03</td>
                  <td>UINT16</td><td>RO</td><td>Device Status</td><td>Status</td></tr>
              <tr><td>1</td><td>2</td><td>3</td></tr>
            </table>
        "#;
        let rows = rows(markup).collect::<Vec<_>>();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "100");
        assert_eq!(rows[0][6], "Device Status");
    }

    #[test]
    fn row_spanning_lines() {
        let markup = "<tr>\n<td>1</td>\n<td>2</td>\n<td>3</td>\n<td>4</td>\n\
                      <td>5</td>\n<td>6</td>\n<td>7</td>\n<td>8\n</td>\n</tr>";
        let rows = rows(markup).collect::<Vec<_>>();
        assert_eq!(rows, vec![["1", "2", "3", "4", "5", "6", "7", "8"].map(String::from)]);
    }

    #[test]
    fn cell_text_strips_tags_and_decodes() {
        assert_eq!(cell_text("  <p><b>Input</b> voltage</p> "), "Input voltage");
        assert_eq!(cell_text("A &amp; B &lt;C&gt;"), "A & B <C>");
        assert_eq!(cell_text("&quot;quoted&quot; &#176;C"), "\"quoted\" \u{b0}C");
        assert_eq!(cell_text("&nbsp;x"), "\u{a0}x");
        assert_eq!(cell_text("<br/>"), "");
    }

    #[test]
    fn entities_decode_like_a_browser() {
        assert_eq!(cell_text("A &amp B &lt C"), "A & B < C");
        assert_eq!(cell_text("&copy 2024"), "\u{a9} 2024");
        assert_eq!(cell_text("&#128;"), "\u{20ac}");
        assert_eq!(cell_text("&#x9F;"), "\u{178}");
        assert_eq!(cell_text("&#0;"), "\u{fffd}");
        assert_eq!(cell_text("&#x110000;"), "\u{fffd}");
        assert_eq!(cell_text("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn cells_of_a_row() {
        assert_eq!(cells(r#"<td a="1">x</td><td></td>"#), vec!["x", ""]);
        assert!(cells("<th>x</th>").is_empty());
    }

    #[test]
    fn no_rows_in_plain_text() {
        assert_eq!(rows("no table here").count(), 0);
    }
}
