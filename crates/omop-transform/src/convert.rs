//! Conversion of raw source text into target column values.

use omop_model::{CellValue, ValueKind, temporal};

/// A converted value. `parsed` is false when the text did not fit the
/// column's expected kind and was kept as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub value: CellValue,
    pub parsed: bool,
}

impl Converted {
    fn parsed(value: CellValue) -> Self {
        Self {
            value,
            parsed: true,
        }
    }

    fn kept(text: &str) -> Self {
        Self {
            value: CellValue::text(text),
            parsed: false,
        }
    }
}

/// Convert `raw` for `target_column`. Blank input yields `None`.
pub fn convert_value(target_column: &str, raw: &str) -> Option<Converted> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let converted = match ValueKind::for_column(target_column) {
        ValueKind::Integer => parse_i64(trimmed)
            .map(|value| Converted::parsed(CellValue::Integer(value)))
            .unwrap_or_else(|| Converted::kept(trimmed)),
        ValueKind::Decimal => parse_f64(trimmed)
            .map(|value| Converted::parsed(CellValue::Decimal(value)))
            .unwrap_or_else(|| Converted::kept(trimmed)),
        ValueKind::Date => temporal::parse_date(trimmed)
            .map(|date| Converted::parsed(CellValue::Text(temporal::format_date(date))))
            .unwrap_or_else(|| Converted::kept(trimmed)),
        ValueKind::Datetime => temporal::parse_datetime(trimmed)
            .map(|datetime| Converted::parsed(CellValue::Text(temporal::format_datetime(datetime))))
            .unwrap_or_else(|| Converted::kept(trimmed)),
        ValueKind::Text => Converted::parsed(CellValue::text(trimmed)),
    };
    Some(converted)
}

/// Integer text, or a decimal with no fractional part.
fn parse_i64(value: &str) -> Option<i64> {
    if let Ok(parsed) = value.parse::<i64>() {
        return Some(parsed);
    }
    let float = parse_f64(value)?;
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    (float.fract() == 0.0 && in_range).then_some(float as i64)
}

fn parse_f64(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}
