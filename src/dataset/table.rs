use crate::dataset::coerce;
use crate::dataset::DataSetError;
use crate::dataset::Value;
use crate::workbook::cell::CellKind;
use crate::workbook::sheet::SheetGrid;
use std::collections::HashSet;

/// Sticky row label marking the scenario a block of rows belongs to.
pub const PATTERN_MARKER: &str = "[Pattern]";

/// Options controlling how sheets are turned into tables.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Header cell text that switches a sheet into labeled mode.
    pub pattern_marker: String,
    /// Labels to keep; empty means every row is kept.
    pub patterns: HashSet<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            pattern_marker: PATTERN_MARKER.to_owned(),
            patterns: HashSet::new(),
        }
    }
}

impl LoadOptions {
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn includes(&self, label: Option<&str>) -> bool {
        self.patterns.is_empty() || label.is_some_and(|label| self.patterns.contains(label))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    Unknown,
    Text,
    Boolean,
    Decimal,
    Timestamp,
    Time,
}

impl ColumnKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Empty => ColumnKind::Unknown,
            Value::Text(_) => ColumnKind::Text,
            Value::Boolean(_) => ColumnKind::Boolean,
            Value::Decimal(_) => ColumnKind::Decimal,
            Value::Timestamp(_) => ColumnKind::Timestamp,
            Value::Time(_) => ColumnKind::Time,
        }
    }
}

/// A named column with the type inferred from its first non-blank value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A rectangular block of canonical values under named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index of a named column; duplicate names resolve to the last one.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().rposition(|column| column.name == name)
    }

    /// Cell lookup by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Result<&Value, DataSetError> {
        let column_index = self
            .column_index(column)
            .ok_or_else(|| DataSetError::ColumnNotFound {
                table: self.name.to_owned(),
                column: column.to_owned(),
            })?;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column_index))
            .ok_or_else(|| DataSetError::RowOutOfRange {
                table: self.name.to_owned(),
                row,
            })
    }

    /// Copy of this table without the named columns.
    pub fn without_columns(&self, excluded: &[&str]) -> Table {
        let kept: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !excluded.contains(&column.name.as_str()))
            .map(|(index, _)| index)
            .collect();
        Table {
            name: self.name.to_owned(),
            columns: kept.iter().map(|&index| self.columns[index].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    kept.iter()
                        // Ragged hand-built rows project as blanks.
                        .map(|&index| row.get(index).cloned().unwrap_or(Value::Empty))
                        .collect()
                })
                .collect(),
        }
    }

    /// Builds a table from one sheet, honoring the sticky-label protocol.
    ///
    /// When the first header cell equals the marker, every data column shifts
    /// one position right and column zero holds scenario labels. A label only
    /// changes on a non-blank text cell, so blank label cells extend the
    /// scenario above them.
    pub fn from_sheet(grid: &SheetGrid, options: &LoadOptions) -> Result<Table, DataSetError> {
        let mut table = Table::new(grid.name.to_owned());
        if grid.is_empty() || !grid.has_header_row() {
            return Ok(table);
        }

        let labeled = grid
            .get(0, 0)
            .is_some_and(|cell| {
                cell.kind == CellKind::Text && cell.value == options.pattern_marker
            });
        let offset = usize::from(labeled);

        let upper_bound = grid.col_upper_bound().unwrap_or(0);
        let mut physical_columns = Vec::new();
        for col in offset..=upper_bound {
            if let Some(cell) = grid.get(0, col) {
                if cell.is_non_blank_text() {
                    physical_columns.push(col);
                    table.columns.push(Column {
                        name: cell.value.trim().to_owned(),
                        kind: ColumnKind::Unknown,
                    });
                }
            }
        }

        let mut label: Option<String> = None;
        for row in grid.body_rows() {
            if labeled {
                if let Some(cell) = grid.get(row, 0) {
                    if cell.is_non_blank_text() {
                        label = Some(cell.value.trim().to_owned());
                    }
                }
            }
            if labeled && !options.includes(label.as_deref()) {
                continue;
            }
            let mut values = Vec::with_capacity(physical_columns.len());
            for (index, &col) in physical_columns.iter().enumerate() {
                let value = coerce(grid.get(row, col), grid.date_system)?;
                if table.columns[index].kind == ColumnKind::Unknown && !value.is_empty() {
                    table.columns[index].kind = ColumnKind::of(&value);
                }
                values.push(value);
            }
            table.rows.push(values);
        }
        Ok(table)
    }
}
