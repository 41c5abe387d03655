//! Thin assertion wrappers around the comparator, the surface most callers
//! use from tests.

use crate::compare::compare_datasets;
use crate::compare::compare_tables;
use crate::compare::ComparisonFailure;
use crate::compare::DefaultFailureFormat;
use crate::compare::FailureFormat;
use crate::compare::SkipBothEmpty;
use crate::dataset::DataSet;
use crate::dataset::Table;
use crate::error::FixtureSheetError;

/// Supplies live tables to compare the fixture against.
pub trait QueryExecutor {
    /// Runs a query and shapes its result as a table with the given name.
    fn query_table(&mut self, table_name: &str, query: &str) -> Result<Table, FixtureSheetError>;
}

pub fn assert_equals(expected: &DataSet, actual: &DataSet) -> Result<(), ComparisonFailure> {
    assert_equals_with(expected, actual, &DefaultFailureFormat)
}

pub fn assert_equals_with(
    expected: &DataSet,
    actual: &DataSet,
    format: &dyn FailureFormat,
) -> Result<(), ComparisonFailure> {
    compare_datasets(expected, actual, &[], &SkipBothEmpty, format)
}

pub fn assert_table_equals(expected: &Table, actual: &Table) -> Result<(), ComparisonFailure> {
    compare_tables(expected, actual, &[], &SkipBothEmpty, &DefaultFailureFormat)
}

pub fn assert_table_equals_ignore_cols(
    expected: &Table,
    actual: &Table,
    ignored_columns: &[&str],
) -> Result<(), ComparisonFailure> {
    compare_tables(expected, actual, ignored_columns, &SkipBothEmpty, &DefaultFailureFormat)
}

/// Compares one named table of the fixture against its counterpart,
/// ignoring the given columns on both sides.
pub fn assert_equals_ignore_cols(
    expected: &DataSet,
    actual: &DataSet,
    table_name: &str,
    ignored_columns: &[&str],
) -> Result<(), FixtureSheetError> {
    let expected_table = expected.table(table_name)?;
    let actual_table = actual.table(table_name)?;
    assert_table_equals_ignore_cols(expected_table, actual_table, ignored_columns)?;
    Ok(())
}

/// Compares an expected table against the result of a query.
pub fn assert_table_equals_by_query(
    expected: &Table,
    executor: &mut dyn QueryExecutor,
    query: &str,
) -> Result<(), FixtureSheetError> {
    let actual = executor.query_table(&expected.name, query)?;
    assert_table_equals(expected, &actual)?;
    Ok(())
}

/// Compares one named table of the fixture against the result of a query.
pub fn assert_equals_by_query(
    expected: &DataSet,
    table_name: &str,
    executor: &mut dyn QueryExecutor,
    query: &str,
) -> Result<(), FixtureSheetError> {
    let expected_table = expected.table(table_name)?;
    assert_table_equals_by_query(expected_table, executor, query)
}
