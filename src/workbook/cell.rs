use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;

/// Raw cell kinds as they appear in the workbook container.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum CellKind {
    #[default]
    Text,
    Boolean,
    Number,
    /// Formula cells are never evaluated; coercion rejects them.
    Formula,
    Error,
}

/// Date system used by the workbook for numeric date serials.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum DateSystem {
    #[default]
    Date1900,
    Date1904,
}

/// What a number format says about a numeric cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum FormatClass {
    #[default]
    Plain,
    Date,
    Time,
    DateTime,
}

/// Display format attached to a numeric cell: the date/time classification
/// plus the format code retained for decimal rendering.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NumberFormat {
    pub(crate) class: FormatClass,
    pub(crate) code: Option<String>,
}

impl NumberFormat {
    /// Resolves a built-in number format id to its format, if recognized.
    pub(crate) fn from_builtin_id(id: &str) -> Option<NumberFormat> {
        let class = match id {
            "14" | "15" | "16" | "17" => Some(FormatClass::Date),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(FormatClass::Time),
            "22" => Some(FormatClass::DateTime),
            _ => None,
        };
        if let Some(class) = class {
            return Some(NumberFormat { class, code: None });
        }
        builtin_format_code(id).map(|code| NumberFormat {
            class: FormatClass::Plain,
            code: Some(code.to_owned()),
        })
    }

    /// Classifies a custom format code by scanning for date and time letters,
    /// skipping escaped characters, quoted literals and bracketed sections.
    pub(crate) fn from_custom_code(code: &str) -> NumberFormat {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracketed = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in code.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_bracketed => is_literal = true,

                ']' if is_bracketed => is_bracketed = false,
                '[' if !is_bracketed && !is_literal => is_bracketed = true,
                _ if is_literal || is_bracketed => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        let class = match (is_date, is_time) {
            (true, true) => FormatClass::DateTime,
            (true, false) => FormatClass::Date,
            (false, true) => FormatClass::Time,
            (false, false) => FormatClass::Plain,
        };
        NumberFormat {
            class,
            code: (class == FormatClass::Plain).then(|| code.to_owned()),
        }
    }

    /// True when the format marks the numeric serial as a calendar value.
    pub(crate) fn is_date_formatted(&self) -> bool {
        self.class != FormatClass::Plain
    }
}

/// Built-in decimal format codes, matching what the original container
/// resolves for these ids. Percent, scientific and text formats are listed
/// so the renderer can reject them explicitly.
fn builtin_format_code(id: &str) -> Option<&'static str> {
    match id {
        "1" => Some("0"),
        "2" => Some("0.00"),
        "3" => Some("#,##0"),
        "4" => Some("#,##0.00"),
        "9" => Some("0%"),
        "10" => Some("0.00%"),
        "11" => Some("0.00E+00"),
        "37" => Some("#,##0;(#,##0)"),
        "38" => Some("#,##0;[Red](#,##0)"),
        "39" => Some("#,##0.00;(#,##0.00)"),
        "40" => Some("#,##0.00;[Red](#,##0.00)"),
        "48" => Some("##0.0E+0"),
        "49" => Some("@"),
        _ => None,
    }
}

/// One raw cell: position, kind, literal value, and the attached format.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellKind,
    /// Cell value as the literal string from the container
    pub(crate) value: String,
    /// Display format, numeric cells only
    pub(crate) format: Option<NumberFormat>,
}

impl Cell {
    /// Returns the A1-style cell reference (e.g. "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// True for a text cell whose trimmed content is non-empty.
    pub(crate) fn is_non_blank_text(&self) -> bool {
        self.kind == CellKind::Text && !self.value.trim().is_empty()
    }
}

/// Converts 0-based row and column indexes to an A1-style reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut column = col as u32 + 1;
    let mut reference = String::new();
    while column > 0 {
        column -= 1;
        let digit = char::from_u32(65 + column % 26).expect("Hardcode letters");
        column /= 26;
        reference.insert(0, digit);
    }
    reference.push_str(&(row + 1).to_string());
    reference
}

/// Converts an A1-style reference to 0-based row and column indexes.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let mut col = 0usize;
    for letter in letters.chars() {
        let digit = (letter.to_ascii_uppercase() as usize).checked_sub('A' as usize)?;
        if digit >= 26 {
            return None;
        }
        col = col * 26 + digit + 1;
    }
    let row = digits.parse::<usize>().ok()?;
    if col == 0 || row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Date of serial 0 under the given date system; a date/time serial whose
/// date component lands here carries no calendar date, only a time of day.
pub(crate) fn epoch_base_date(system: DateSystem) -> NaiveDate {
    match system {
        DateSystem::Date1900 => NaiveDate::from_ymd_opt(1899, 12, 31),
        DateSystem::Date1904 => NaiveDate::from_ymd_opt(1904, 1, 1),
    }
    .expect("NaiveDate literal")
}

/// Converts a numeric date serial to a calendar date-time.
/// Handles the Lotus 1-2-3 leap year bug for the 1900 system.
pub(crate) fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let adjustment = match system {
        DateSystem::Date1900 => {
            if days < 60 {
                1
            } else {
                0
            }
        }
        DateSystem::Date1904 => 1462,
    };
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate literal");
    let date = base.checked_add_signed(Duration::days(days + adjustment))?;
    let microseconds = (serial.fract() * 86_400_000_000f64).round() as i64;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::microseconds(microseconds))
}
