//! FILENAME: core/grid-engine/src/csv.rs
//! CSV text export of data rows.

use crate::column::ColumnDef;
use crate::row::Row;
use crate::value::Value;

/// Escapes one field. Quotes are doubled, and a field containing a quote,
/// comma, line feed or carriage return is wrapped in quotes. Null is empty.
pub fn escape_csv(value: &Value) -> String {
    let mut s = value.to_string();
    if s.contains('"') {
        s = s.replace('"', "\"\"");
    }
    if s.contains(['"', ',', '\n', '\r']) {
        s = format!("\"{}\"", s);
    }
    s
}

/// Serializes `rows` under `cols`: a header line of column labels, then one
/// line per row. Cells pass through the column's value formatter before
/// escaping. Lines are joined with `\n`, without a trailing newline.
pub fn to_csv<R: Row>(rows: &[R], cols: &[ColumnDef<R>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);

    let header: Vec<String> = cols
        .iter()
        .map(|col| escape_csv(&Value::from(col.header_label())))
        .collect();
    lines.push(header.join(","));

    for row in rows {
        let fields: Vec<String> = cols
            .iter()
            .map(|col| {
                let value = col.value_of(row);
                match &col.value_formatter {
                    Some(format) => escape_csv(&format(&value, row)),
                    None => escape_csv(&value),
                }
            })
            .collect();
        lines.push(fields.join(","));
    }

    log::debug!(target: "EXPORT", "serialized {} rows x {} columns", rows.len(), cols.len());
    lines.join("\n")
}
