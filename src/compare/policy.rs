use crate::dataset::Value;

/// Decides which cell pairs are exempt from comparison.
pub trait ValuePolicy {
    /// True when this pair needs no check.
    fn skip(&self, table: &str, column: &str, expected: &Value, actual: &Value) -> bool;
}

/// Skips a pair only when both sides are blank.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkipBothEmpty;

impl ValuePolicy for SkipBothEmpty {
    fn skip(&self, _table: &str, _column: &str, expected: &Value, actual: &Value) -> bool {
        expected.is_empty() && actual.is_empty()
    }
}

/// Formats one cell mismatch into a report line.
pub trait FailureFormat {
    fn format(&self, table: &str, row: usize, column: &str, expected: &Value, actual: &Value)
        -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFailureFormat;

impl FailureFormat for DefaultFailureFormat {
    fn format(
        &self,
        table: &str,
        row: usize,
        column: &str,
        expected: &Value,
        actual: &Value,
    ) -> String {
        format!(
            "value (table={table}, row={row}, column={column}): expected <{expected}> but was <{actual}>"
        )
    }
}
