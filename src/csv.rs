//! RFC4180-style CSV tokenizing for the spreadsheet export.
//!
//! The spreadsheet export endpoint emits plain CSV with quoted fields,
//! embedded commas, doubled-quote escapes, and CRLF line endings. This is a
//! character-level scanner rather than a line splitter so quoted fields may
//! contain newlines.

/// Parses CSV text into rows of fields.
///
/// A `"` toggles the in-quotes flag unless it is immediately followed by
/// another `"` while already inside quotes, in which case a literal quote is
/// emitted and the pair consumed. A `,` outside quotes ends the current
/// field. End of row always emits the final accumulated field, even when
/// empty, so trailing empty columns survive. Rows that are a single empty
/// field (blank lines) are dropped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(std::mem::take(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                if row.len() > 1 || !row[0].is_empty() {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush a trailing row that lacks a final newline.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Serializes one row back to a CSV line (no trailing newline).
///
/// The inverse of [`parse_rows`] for a single row: fields containing commas,
/// quotes, or newlines are quoted with doubled-quote escaping.
pub fn serialize_row(fields: &[String]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
        {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{parse_rows, serialize_row};
    use pretty_assertions::assert_eq;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn tokenizes_quotes_commas_and_escapes() {
        let rows = parse_rows("a,\"b,c\",\"\"\"\"");
        assert_eq!(rows, vec![row(&["a", "b,c", "\""])]);
    }

    #[test]
    fn keeps_trailing_empty_fields() {
        let rows = parse_rows("a,b,\nc,,\n");
        assert_eq!(rows, vec![row(&["a", "b", ""]), row(&["c", "", ""])]);
    }

    #[test]
    fn tolerates_crlf_and_drops_blank_lines() {
        let rows = parse_rows("name,role\r\n\r\nada,president\r\n");
        assert_eq!(
            rows,
            vec![row(&["name", "role"]), row(&["ada", "president"])]
        );
    }

    #[test]
    fn quoted_fields_may_contain_newlines() {
        let rows = parse_rows("a,\"line one\nline two\"\nb,c\n");
        assert_eq!(
            rows,
            vec![row(&["a", "line one\nline two"]), row(&["b", "c"])]
        );
    }

    #[test]
    fn round_trips_awkward_fields() {
        let original = row(&["plain", "with,comma", "with \"quote\"", ""]);
        let line = serialize_row(&original);
        let mut reparsed = parse_rows(&line);
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed.remove(0), original);
    }

    #[test]
    fn final_row_without_newline_is_flushed() {
        let rows = parse_rows("a,b\nc,d");
        assert_eq!(rows, vec![row(&["a", "b"]), row(&["c", "d"])]);
    }
}
