use crate::dataset::DataSetError;
use crate::workbook::cell::epoch_base_date;
use crate::workbook::cell::serial_to_datetime;
use crate::workbook::cell::Cell;
use crate::workbook::cell::CellKind;
use crate::workbook::cell::DateSystem;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use std::fmt::Display;
use std::str::FromStr;

/// A canonical typed cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Blank cell; never an error
    Empty,
    Text(String),
    Boolean(bool),
    /// Exact decimal, no binary float drift
    Decimal(Decimal),
    Timestamp(NaiveDateTime),
    /// Date-less time of day
    Time(NaiveTime),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Type-aware equality: same-variant values compare directly (decimals
    /// numerically), and text on one side is parsed into the other side's
    /// type before comparing. Empty only equals Empty.
    pub fn compares_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(text), typed) | (typed, Value::Text(text)) if !matches!(typed, Value::Text(_)) => {
                typed.matches_text(text)
            }
            _ => self == other,
        }
    }

    fn matches_text(&self, text: &str) -> bool {
        match self {
            Value::Empty => false,
            Value::Text(_) => unreachable!("handled by compares_equal"),
            Value::Boolean(value) => match text {
                "true" | "1" => *value,
                "false" | "0" => !*value,
                _ => false,
            },
            Value::Decimal(value) => Decimal::from_str(text.trim())
                .map(|parsed| parsed == *value)
                .unwrap_or(false),
            Value::Timestamp(value) => {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                    .map(|parsed| parsed == *value)
                    .unwrap_or(false)
            }
            Value::Time(value) => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
                .map(|parsed| parsed == *value)
                .unwrap_or(false),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::Timestamp(value) => write!(f, "{value}"),
            Value::Time(value) => write!(f, "{value}"),
        }
    }
}

/// Converts one raw cell into a canonical value.
///
/// An absent cell is `Empty`. Formula and error cells are a hard stop with
/// row/column coordinates; formulas are never evaluated.
pub(crate) fn coerce(cell: Option<&Cell>, date_system: DateSystem) -> Result<Value, DataSetError> {
    let cell = match cell {
        Some(cell) => cell,
        None => return Ok(Value::Empty),
    };
    match cell.kind {
        CellKind::Text => Ok(Value::Text(cell.value.to_owned())),
        CellKind::Boolean => Ok(Value::Boolean(cell.value == "1" || cell.value == "true")),
        CellKind::Number => coerce_number(cell, date_system),
        CellKind::Formula | CellKind::Error => Err(DataSetError::UnsupportedCellType {
            row: cell.row,
            column: cell.col,
        }),
    }
}

fn coerce_number(cell: &Cell, date_system: DateSystem) -> Result<Value, DataSetError> {
    if cell.format.as_ref().is_some_and(|f| f.is_date_formatted()) {
        let serial = cell
            .value
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(cell, &e.to_string()))?;
        let datetime = serial_to_datetime(serial, date_system)
            .ok_or_else(|| invalid(cell, "date serial out of range"))?;
        // The zero-date carries no calendar information: time of day only.
        if datetime.date() == epoch_base_date(date_system) {
            return Ok(Value::Time(datetime.time()));
        }
        return Ok(Value::Timestamp(datetime));
    }

    let code = cell
        .format
        .as_ref()
        .and_then(|f| f.code.as_deref())
        .filter(|code| *code != "General" && *code != "@");
    if let Some(code) = code {
        if let Some(rendered) = render_decimal(&cell.value, code) {
            return Ok(Value::Decimal(rendered));
        }
    }

    // No meaningful format: take the literal, normalizing a trailing ".0"
    // so integral values are not falsely fractional.
    let literal = cell.value.trim();
    let literal = literal.strip_suffix(".0").unwrap_or(literal);
    parse_decimal(literal)
        .map(Value::Decimal)
        .ok_or_else(|| invalid(cell, "not a decimal number"))
}

fn invalid(cell: &Cell, message: &str) -> DataSetError {
    DataSetError::InvalidCellValue {
        reference: cell.reference(),
        message: message.to_owned(),
    }
}

fn parse_decimal(literal: &str) -> Option<Decimal> {
    Decimal::from_str(literal)
        .or_else(|_| Decimal::from_scientific(literal))
        .ok()
}

/// Renders a numeric literal through a display format code to a fixed-point
/// decimal. Only plain decimal codes (digits, `#`, grouping, one decimal
/// point) are supported; anything else reports failure so the caller falls
/// back to the plain literal.
fn render_decimal(literal: &str, code: &str) -> Option<Decimal> {
    let section = code.split(';').next()?;

    // Strip escapes, quoted literals and bracketed sections.
    let mut cleaned = String::new();
    let mut is_escaped = false;
    let mut is_literal = false;
    let mut is_bracketed = false;
    for character in section.chars() {
        match character {
            _ if is_escaped => is_escaped = false,
            '_' | '\\' if !is_escaped => is_escaped = true,
            '"' if is_literal => is_literal = false,
            '"' if !is_literal && !is_bracketed => is_literal = true,
            ']' if is_bracketed => is_bracketed = false,
            '[' if !is_bracketed && !is_literal => is_bracketed = true,
            _ if is_literal || is_bracketed => (),
            ' ' => (),
            _ => cleaned.push(character),
        }
    }

    let (integer_part, fraction_part) = match cleaned.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (cleaned.as_str(), ""),
    };
    let supported = |part: &str| part.chars().all(|c| matches!(c, '0' | '#' | ','));
    if !supported(integer_part) || !supported(fraction_part) {
        return None;
    }
    let max_digits = fraction_part.chars().filter(|c| matches!(c, '0' | '#')).count() as u32;
    let min_digits = fraction_part.chars().filter(|c| *c == '0').count() as u32;

    let mut value = parse_decimal(literal.trim())?
        .round_dp_with_strategy(max_digits, RoundingStrategy::MidpointNearestEven);
    if value.scale() < min_digits {
        value.rescale(min_digits);
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::cell::NumberFormat;

    fn number(value: &str, format: Option<NumberFormat>) -> Cell {
        Cell {
            row: 1,
            col: 1,
            kind: CellKind::Number,
            value: value.to_owned(),
            format,
        }
    }

    fn decimal(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    fn plain_format(code: &str) -> Option<NumberFormat> {
        Some(NumberFormat::from_custom_code(code))
    }

    #[test]
    fn blank_cell_is_empty() {
        assert_eq!(coerce(None, DateSystem::Date1900).unwrap(), Value::Empty);
    }

    #[test]
    fn text_passes_through_unmodified() {
        let cell = Cell {
            row: 0,
            col: 0,
            kind: CellKind::Text,
            value: "  spaced  ".to_owned(),
            format: None,
        };
        assert_eq!(
            coerce(Some(&cell), DateSystem::Date1900).unwrap(),
            Value::Text("  spaced  ".to_owned())
        );
    }

    #[test]
    fn booleans_coerce_from_container_literals() {
        for (literal, expected) in [("1", true), ("true", true), ("0", false)] {
            let cell = Cell {
                row: 0,
                col: 0,
                kind: CellKind::Boolean,
                value: literal.to_owned(),
                format: None,
            };
            assert_eq!(
                coerce(Some(&cell), DateSystem::Date1900).unwrap(),
                Value::Boolean(expected)
            );
        }
    }

    #[test]
    fn formatted_number_renders_fixed_point() {
        let cell = number("3.1", plain_format("0.00"));
        let value = coerce(Some(&cell), DateSystem::Date1900).unwrap();
        assert_eq!(value, Value::Decimal(decimal("3.10")));
        assert_eq!(value.to_string(), "3.10");
    }

    #[test]
    fn unformatted_integral_number_drops_trailing_zero() {
        let cell = number("5.0", None);
        let value = coerce(Some(&cell), DateSystem::Date1900).unwrap();
        assert_eq!(value.to_string(), "5");
    }

    #[test]
    fn unsupported_format_code_falls_back_to_literal() {
        let cell = number("0.25", plain_format("0.00%"));
        let value = coerce(Some(&cell), DateSystem::Date1900).unwrap();
        assert_eq!(value, Value::Decimal(decimal("0.25")));
    }

    #[test]
    fn grouping_format_keeps_exact_value() {
        let cell = number("1234.5", plain_format("#,##0.00"));
        let value = coerce(Some(&cell), DateSystem::Date1900).unwrap();
        assert_eq!(value.to_string(), "1234.50");
    }

    #[test]
    fn rendering_uses_bankers_rounding() {
        let cell = number("2.345", plain_format("0.00"));
        let value = coerce(Some(&cell), DateSystem::Date1900).unwrap();
        assert_eq!(value.to_string(), "2.34");
    }

    #[test]
    fn date_formatted_serial_becomes_timestamp() {
        let cell = number("45292.5", plain_format("yyyy-mm-dd"));
        let value = coerce(Some(&cell), DateSystem::Date1900).unwrap();
        assert_eq!(
            value,
            Value::Timestamp(
                NaiveDateTime::parse_from_str("2024-01-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
            )
        );
    }

    #[test]
    fn epoch_base_date_serial_becomes_time_only() {
        let cell = number("0.75", plain_format("hh:mm:ss"));
        let value = coerce(Some(&cell), DateSystem::Date1900).unwrap();
        assert_eq!(
            value,
            Value::Time(NaiveTime::parse_from_str("18:00:00", "%H:%M:%S").unwrap())
        );
    }

    #[test]
    fn formula_cell_is_a_hard_stop() {
        let cell = Cell {
            row: 3,
            col: 2,
            kind: CellKind::Formula,
            value: "2".to_owned(),
            format: None,
        };
        let error = coerce(Some(&cell), DateSystem::Date1900).unwrap_err();
        assert!(matches!(
            error,
            DataSetError::UnsupportedCellType { row: 3, column: 2 }
        ));
    }

    #[test]
    fn type_aware_equality_is_numeric_for_decimals() {
        assert!(Value::Decimal(decimal("3.10")).compares_equal(&Value::Decimal(decimal("3.1"))));
        assert!(Value::Decimal(decimal("1")).compares_equal(&Value::Text("1.0".to_owned())));
        assert!(!Value::Decimal(decimal("1")).compares_equal(&Value::Text("x".to_owned())));
        assert!(Value::Boolean(true).compares_equal(&Value::Text("1".to_owned())));
        assert!(!Value::Empty.compares_equal(&Value::Text(String::new())));
    }
}
