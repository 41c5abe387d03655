//! Ordered collection of typed tables loaded from one workbook.

pub(crate) mod table;
pub(crate) mod value;

pub use table::Column;
pub use table::ColumnKind;
pub use table::LoadOptions;
pub use table::Table;
pub use table::PATTERN_MARKER;
pub use value::Value;

pub(crate) use value::coerce;

use crate::error::FixtureSheetError;
use crate::workbook::Workbook;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataSetError {
    #[error("Unsupported cell type at rowIndex={row}, columnIndex={column}")]
    UnsupportedCellType { row: usize, column: usize },
    #[error("Invalid value in cell {reference}: {message}")]
    InvalidCellValue { reference: String, message: String },
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Column not found in table {table}: {column}")]
    ColumnNotFound { table: String, column: String },
    #[error("Row {row} out of range in table {table}")]
    RowOutOfRange { table: String, row: usize },
}

/// Tables in workbook order, addressable by name.
///
/// The name list preserves every sheet in encounter order, duplicates
/// included; name lookup resolves duplicates to the last occurrence.
#[derive(Clone, Debug, Default)]
pub struct DataSet {
    names: Vec<String>,
    tables: HashMap<String, Table>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every sheet of a workbook file as a table.
    pub fn from_file(
        path: impl AsRef<std::path::Path>,
        options: &LoadOptions,
    ) -> Result<Self, FixtureSheetError> {
        Self::from_workbook(&mut Workbook::open(path)?, options)
    }

    pub fn from_workbook<RS: Read + Seek>(
        workbook: &mut Workbook<RS>,
        options: &LoadOptions,
    ) -> Result<Self, FixtureSheetError> {
        let mut dataset = Self::new();
        for grid in workbook.read_sheets()? {
            dataset.push(Table::from_sheet(&grid, options)?);
        }
        log::debug!("loaded {} tables", dataset.len());
        Ok(dataset)
    }

    pub fn push(&mut self, table: Table) {
        self.names.push(table.name.to_owned());
        self.tables.insert(table.name.to_owned(), table);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn table_names(&self) -> &[String] {
        &self.names
    }

    pub fn table(&self, name: &str) -> Result<&Table, DataSetError> {
        self.tables
            .get(name)
            .ok_or_else(|| DataSetError::TableNotFound(name.to_owned()))
    }

    /// Tables in workbook order.
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.names.iter().filter_map(|name| self.tables.get(name))
    }

    /// Tables in reverse workbook order, for teardown-style passes.
    pub fn iter_reversed(&self) -> impl Iterator<Item = &Table> {
        self.names
            .iter()
            .rev()
            .filter_map(|name| self.tables.get(name))
    }
}
