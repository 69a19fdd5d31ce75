use omop_model::{SourceRow, normalize_column_key};

/// Look up a column: exact key, then case-insensitive, then standardized key.
pub(crate) fn row_value<'r>(row: &'r SourceRow, column: &str) -> Option<&'r str> {
    if let Some(value) = row.get(column) {
        return Some(value.as_str());
    }
    if let Some((_, value)) = row.iter().find(|(key, _)| key.eq_ignore_ascii_case(column)) {
        return Some(value.as_str());
    }
    let standardized = normalize_column_key(column);
    row.iter()
        .find(|(key, _)| normalize_column_key(key) == standardized)
        .map(|(_, value)| value.as_str())
}

/// First non-blank value among `columns`, trimmed.
pub(crate) fn first_present<'r>(row: &'r SourceRow, columns: &[String]) -> Option<&'r str> {
    columns
        .iter()
        .filter_map(|column| row_value(row, column))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_standardized_key() {
        let mut row = SourceRow::new();
        row.insert("admit_dt_tm".to_string(), "2023-01-01".to_string());
        row.insert("MRN".to_string(), " M1 ".to_string());
        assert_eq!(row_value(&row, "Admit Dt Tm"), Some("2023-01-01"));
        assert_eq!(row_value(&row, "mrn"), Some(" M1 "));
        assert_eq!(row_value(&row, "encntr_num"), None);
        assert_eq!(
            first_present(&row, &["patient_id".to_string(), "mrn".to_string()]),
            Some("M1")
        );
    }
}
