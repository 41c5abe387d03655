//! # Fixture Sheet
//!
//! Loads spreadsheet workbooks as typed test fixtures and compares them
//! against other datasets, cell by cell.
//!
//! ## Features
//!
//! - **Workbook loading**: Streams `.xlsx` containers directly, resolving
//!   shared strings, number formats, and the 1900/1904 date systems
//! - **Scenario filtering**: Sheets headed by a `[Pattern]` marker column
//!   carry sticky row labels; loading can select just the labeled scenarios
//!   a test needs
//! - **Typed values**: Cells coerce to text, boolean, exact decimal,
//!   timestamp, or time-of-day, with display-format-aware decimal scaling
//! - **Aggregated comparison**: Shape problems fail fast, content problems
//!   collect every mismatching cell into a single report
//! - **Query-backed actuals**: A [`QueryExecutor`] turns live query results
//!   into tables so fixtures can be checked against a database
//!
//! ## Example
//!
//! ```no_run
//! use fixture_sheet::{assert_equals, DataSet, LoadOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let expected = DataSet::from_file("expected.xlsx", &LoadOptions::default())?;
//! let actual = DataSet::from_file("actual.xlsx", &LoadOptions::with_patterns(["verify"]))?;
//! assert_equals(&expected, &actual)?;
//! # Ok(())
//! # }
//! ```

pub mod assertion;
pub mod compare;
pub mod dataset;
mod error;
mod helpers;
pub mod workbook;

#[cfg(test)]
mod testutil;

pub use crate::assertion::assert_equals;
pub use crate::assertion::assert_equals_by_query;
pub use crate::assertion::assert_equals_ignore_cols;
pub use crate::assertion::assert_equals_with;
pub use crate::assertion::assert_table_equals;
pub use crate::assertion::assert_table_equals_by_query;
pub use crate::assertion::assert_table_equals_ignore_cols;
pub use crate::assertion::QueryExecutor;
pub use crate::compare::ComparisonFailure;
pub use crate::dataset::DataSet;
pub use crate::dataset::DataSetError;
pub use crate::dataset::LoadOptions;
pub use crate::dataset::Table;
pub use crate::dataset::Value;
pub use crate::error::FixtureSheetError;
pub use crate::workbook::Workbook;
pub use crate::workbook::WorkbookError;
