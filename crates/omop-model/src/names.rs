//! Name normalization used for comparison only; raw names are never rewritten.

/// Normalize a table name: lower-case, with `-`, `/` and whitespace runs
/// collapsed into a single space and no leading or trailing separators.
///
/// `"Admission / Discharge"`, `"admission-discharge"` and
/// `"Admission  Discharge"` all normalize to `"admission discharge"`.
pub fn normalize_table_name(raw: &str) -> String {
    raw.to_lowercase()
        .split(|c: char| c == '-' || c == '/' || c.is_whitespace())
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Two table names denote the same logical table.
pub fn same_table(a: &str, b: &str) -> bool {
    normalize_table_name(a) == normalize_table_name(b)
}

/// Standardize a data column header: lower-case, with spaces, `-` and `.`
/// replaced by `_` and repeated underscores collapsed.
pub fn normalize_column_key(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        let c = if c.is_whitespace() || c == '-' || c == '.' {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}
