//! Dataset and table comparison: structural checks fail fast, content
//! checks aggregate every mismatch into a single report.

pub(crate) mod policy;

pub use policy::DefaultFailureFormat;
pub use policy::FailureFormat;
pub use policy::SkipBothEmpty;
pub use policy::ValuePolicy;

use crate::dataset::DataSet;
use crate::dataset::Table;
use crate::dataset::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComparisonFailure {
    #[error("{subject} expected={expected} actual={actual}")]
    Structural {
        subject: String,
        expected: String,
        actual: String,
    },
    #[error("{message}")]
    Content { message: String },
}

/// One cell-level mismatch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Difference {
    pub table: String,
    pub row: usize,
    pub column: String,
    pub message: String,
}

/// Compares two datasets table by table.
///
/// Only dataset-level shape problems stop the comparison immediately: first
/// the table counts, then the sorted name lists. Everything after that is
/// collected; per-table failures and mismatching cells across every table
/// land in one aggregated failure.
pub fn compare_datasets(
    expected: &DataSet,
    actual: &DataSet,
    ignored_columns: &[&str],
    policy: &dyn ValuePolicy,
    format: &dyn FailureFormat,
) -> Result<(), ComparisonFailure> {
    if std::ptr::eq(expected, actual) {
        return Ok(());
    }

    let mut expected_names: Vec<&String> = expected.table_names().iter().collect();
    let mut actual_names: Vec<&String> = actual.table_names().iter().collect();
    expected_names.sort();
    actual_names.sort();
    if expected_names.len() != actual_names.len() {
        return Err(ComparisonFailure::Structural {
            subject: "table count".to_owned(),
            expected: expected_names.len().to_string(),
            actual: actual_names.len().to_string(),
        });
    }
    if expected_names != actual_names {
        return Err(ComparisonFailure::Structural {
            subject: "table names".to_owned(),
            expected: format!("{expected_names:?}"),
            actual: format!("{actual_names:?}"),
        });
    }

    let mut messages = Vec::new();
    for name in expected_names {
        let expected_table = expected
            .table(name)
            .expect("name taken from this dataset's own inventory");
        let actual_table = actual
            .table(name)
            .expect("presence established by the name check");
        // A failing table contributes its message; later tables still run.
        match table_differences(expected_table, actual_table, ignored_columns, policy, format) {
            Ok(found) => messages.extend(found.into_iter().map(|difference| difference.message)),
            Err(failure) => messages.push(failure.to_string()),
        }
    }
    raise_content(messages)
}

/// Compares two tables by name, shape, then cell content.
pub fn compare_tables(
    expected: &Table,
    actual: &Table,
    ignored_columns: &[&str],
    policy: &dyn ValuePolicy,
    format: &dyn FailureFormat,
) -> Result<(), ComparisonFailure> {
    let differences = table_differences(expected, actual, ignored_columns, policy, format)?;
    raise_content(differences.into_iter().map(|difference| difference.message).collect())
}

fn raise_content(messages: Vec<String>) -> Result<(), ComparisonFailure> {
    if messages.is_empty() {
        return Ok(());
    }
    log::debug!("comparison found {} mismatch(es)", messages.len());
    Err(ComparisonFailure::Content {
        message: messages.join("\n"),
    })
}

fn table_differences(
    expected: &Table,
    actual: &Table,
    ignored_columns: &[&str],
    policy: &dyn ValuePolicy,
    format: &dyn FailureFormat,
) -> Result<Vec<Difference>, ComparisonFailure> {
    let expected = if ignored_columns.is_empty() {
        expected.clone()
    } else {
        expected.without_columns(ignored_columns)
    };
    let actual = if ignored_columns.is_empty() {
        actual.clone()
    } else {
        actual.without_columns(ignored_columns)
    };

    if expected.row_count() != actual.row_count() {
        return Err(ComparisonFailure::Structural {
            subject: format!("row count (table={})", expected.name),
            expected: expected.row_count().to_string(),
            actual: actual.row_count().to_string(),
        });
    }
    // Column inventories compare as sets; a query-sourced actual may carry
    // the same columns in a different order.
    let mut expected_columns: Vec<&str> =
        expected.columns.iter().map(|column| column.name.as_str()).collect();
    let mut actual_columns: Vec<&str> =
        actual.columns.iter().map(|column| column.name.as_str()).collect();
    expected_columns.sort_unstable();
    actual_columns.sort_unstable();
    if expected_columns != actual_columns {
        return Err(ComparisonFailure::Structural {
            subject: format!("columns (table={})", expected.name),
            expected: format!("{expected_columns:?}"),
            actual: format!("{actual_columns:?}"),
        });
    }

    const BLANK: Value = Value::Empty;
    let mut differences = Vec::new();
    for (row, (expected_row, actual_row)) in
        expected.rows.iter().zip(actual.rows.iter()).enumerate()
    {
        for (index, column) in expected.columns.iter().enumerate() {
            let actual_index = actual
                .column_index(&column.name)
                .expect("column present after the inventory check");
            // Hand-built tables may carry ragged rows; short cells read as blank.
            let expected_value = expected_row.get(index).unwrap_or(&BLANK);
            let actual_value = actual_row.get(actual_index).unwrap_or(&BLANK);
            if policy.skip(&expected.name, &column.name, expected_value, actual_value) {
                continue;
            }
            if expected_value.compares_equal(actual_value) {
                continue;
            }
            differences.push(Difference {
                table: expected.name.to_owned(),
                row,
                column: column.name.to_owned(),
                message: format.format(
                    &expected.name,
                    row,
                    &column.name,
                    expected_value,
                    actual_value,
                ),
            });
        }
    }
    Ok(differences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use crate::dataset::ColumnKind;
    use crate::dataset::Value;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn table(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table {
            name: name.to_owned(),
            columns: columns
                .iter()
                .map(|name| Column {
                    name: (*name).to_owned(),
                    kind: ColumnKind::Unknown,
                })
                .collect(),
            rows,
        }
    }

    fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    fn run_tables(expected: &Table, actual: &Table) -> Result<(), ComparisonFailure> {
        compare_tables(expected, actual, &[], &SkipBothEmpty, &DefaultFailureFormat)
    }

    fn run_datasets(expected: &DataSet, actual: &DataSet) -> Result<(), ComparisonFailure> {
        compare_datasets(expected, actual, &[], &SkipBothEmpty, &DefaultFailureFormat)
    }

    #[test]
    fn identical_dataset_instance_short_circuits() {
        let dataset = DataSet::new();
        assert!(run_datasets(&dataset, &dataset).is_ok());
    }

    #[test]
    fn table_count_mismatch_fails_before_names() {
        let mut expected = DataSet::new();
        expected.push(table("a", &[], vec![]));
        expected.push(table("b", &[], vec![]));
        let mut actual = DataSet::new();
        actual.push(table("a", &[], vec![]));
        let failure = run_datasets(&expected, &actual).unwrap_err();
        assert_eq!(failure.to_string(), "table count expected=2 actual=1");
    }

    #[test]
    fn name_order_does_not_matter() {
        let mut expected = DataSet::new();
        expected.push(table("b", &[], vec![]));
        expected.push(table("a", &[], vec![]));
        let mut actual = DataSet::new();
        actual.push(table("a", &[], vec![]));
        actual.push(table("b", &[], vec![]));
        assert!(run_datasets(&expected, &actual).is_ok());
    }

    #[test]
    fn name_mismatch_reports_both_sorted_lists() {
        let mut expected = DataSet::new();
        expected.push(table("users", &[], vec![]));
        let mut actual = DataSet::new();
        actual.push(table("orders", &[], vec![]));
        let failure = run_datasets(&expected, &actual).unwrap_err();
        assert_eq!(
            failure.to_string(),
            r#"table names expected=["users"] actual=["orders"]"#
        );
    }

    #[test]
    fn every_cell_mismatch_is_aggregated() {
        let expected = table(
            "users",
            &["id", "name"],
            vec![vec![text("1"), text("alice")], vec![text("2"), text("bob")]],
        );
        let actual = table(
            "users",
            &["id", "name"],
            vec![vec![text("9"), text("alice")], vec![text("2"), text("carol")]],
        );
        let failure = run_tables(&expected, &actual).unwrap_err();
        let report = failure.to_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            [
                "value (table=users, row=0, column=id): expected <1> but was <9>",
                "value (table=users, row=1, column=name): expected <bob> but was <carol>",
            ]
        );
    }

    #[test]
    fn failing_table_does_not_hide_later_tables() {
        let mut expected = DataSet::new();
        expected.push(table("a", &["id"], vec![vec![text("1")]]));
        expected.push(table("b", &["id"], vec![vec![text("1")]]));
        let mut actual = DataSet::new();
        actual.push(table("a", &["id"], vec![]));
        actual.push(table("b", &["id"], vec![vec![text("2")]]));
        let report = run_datasets(&expected, &actual).unwrap_err().to_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            [
                "row count (table=a) expected=1 actual=0",
                "value (table=b, row=0, column=id): expected <1> but was <2>",
            ]
        );
    }

    #[test]
    fn column_order_does_not_matter() {
        let expected = table("t", &["a", "b"], vec![vec![text("1"), text("2")]]);
        let actual = table("t", &["b", "a"], vec![vec![text("2"), text("1")]]);
        assert!(run_tables(&expected, &actual).is_ok());
    }

    #[test]
    fn reordered_columns_still_compare_by_name() {
        let expected = table("t", &["a", "b"], vec![vec![text("1"), text("2")]]);
        let actual = table("t", &["b", "a"], vec![vec![text("1"), text("2")]]);
        let report = run_tables(&expected, &actual).unwrap_err().to_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            [
                "value (table=t, row=0, column=a): expected <1> but was <2>",
                "value (table=t, row=0, column=b): expected <2> but was <1>",
            ]
        );
    }

    #[test]
    fn row_count_mismatch_is_structural() {
        let expected = table("users", &["id"], vec![vec![text("1")]]);
        let actual = table("users", &["id"], vec![]);
        let failure = run_tables(&expected, &actual).unwrap_err();
        assert_eq!(failure.to_string(), "row count (table=users) expected=1 actual=0");
    }

    #[test]
    fn text_and_decimal_compare_numerically() {
        let expected = table("t", &["n"], vec![vec![text("3.10")]]);
        let actual = table(
            "t",
            &["n"],
            vec![vec![Value::Decimal(Decimal::from_str("3.1").unwrap())]],
        );
        assert!(run_tables(&expected, &actual).is_ok());
    }

    #[test]
    fn both_blank_cells_are_skipped_by_default() {
        let expected = table("t", &["a"], vec![vec![Value::Empty]]);
        let actual = table("t", &["a"], vec![vec![Value::Empty]]);
        assert!(run_tables(&expected, &actual).is_ok());
    }

    #[test]
    fn one_sided_blank_is_a_mismatch() {
        let expected = table("t", &["a"], vec![vec![Value::Empty]]);
        let actual = table("t", &["a"], vec![vec![text("x")]]);
        assert!(run_tables(&expected, &actual).is_err());
    }

    #[test]
    fn ignored_columns_are_invisible_to_both_shape_and_content() {
        let expected = table(
            "users",
            &["id", "updated_at"],
            vec![vec![text("1"), text("monday")]],
        );
        let actual = table(
            "users",
            &["id", "updated_at"],
            vec![vec![text("1"), text("friday")]],
        );
        assert!(compare_tables(
            &expected,
            &actual,
            &["updated_at"],
            &SkipBothEmpty,
            &DefaultFailureFormat
        )
        .is_ok());
    }

    struct SkipColumn<'a>(&'a str);

    impl ValuePolicy for SkipColumn<'_> {
        fn skip(&self, _table: &str, column: &str, _expected: &Value, _actual: &Value) -> bool {
            column == self.0
        }
    }

    #[test]
    fn custom_policy_can_exempt_a_column() {
        let expected = table("t", &["a", "b"], vec![vec![text("1"), text("x")]]);
        let actual = table("t", &["a", "b"], vec![vec![text("1"), text("y")]]);
        assert!(
            compare_tables(&expected, &actual, &[], &SkipColumn("b"), &DefaultFailureFormat)
                .is_ok()
        );
    }
}
