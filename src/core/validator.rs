use crate::domain::model::{ComponentSpec, InputRow, RowIssue, TotalCell, ValidatedRow};
use crate::utils::error::{MarksError, Result};
use std::collections::HashSet;

/// Columns an input spreadsheet must expose: every component, then the total.
pub fn required_columns(spec: &ComponentSpec, total_column: &str) -> Vec<String> {
    spec.names()
        .map(str::to_string)
        .chain(std::iter::once(total_column.to_string()))
        .collect()
}

/// Exact, case-sensitive presence check. Column order does not matter.
pub fn check_schema(headers: &[String], required: &[String]) -> Result<()> {
    let present: HashSet<&str> = headers.iter().map(String::as_str).collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !present.contains(name.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MarksError::SchemaMismatch {
            required: required.to_vec(),
            missing,
        })
    }
}

/// Classify one row's total. `Ok` carries the integral total.
pub fn validate_total(row: &InputRow, spec: &ComponentSpec) -> std::result::Result<u32, RowIssue> {
    let (min, max) = spec.reachable_range();

    match &row.total {
        TotalCell::Missing => Err(RowIssue::missing(row.row)),
        TotalCell::Text(text) => match TotalCell::from_text(text) {
            TotalCell::Missing => Err(RowIssue::missing(row.row)),
            TotalCell::Text(text) => Err(RowIssue::not_a_number(row.row, text)),
            number @ TotalCell::Number(_) => {
                validate_total(&InputRow::new(row.row, number), spec)
            }
        },
        TotalCell::Number(value) => {
            let value = *value;
            if !value.is_finite() {
                Err(RowIssue::not_a_number(row.row, value.to_string()))
            } else if value < f64::from(min) || value > f64::from(max) {
                Err(RowIssue::out_of_range(row.row, value))
            } else if value.fract() != 0.0 {
                Err(RowIssue::not_an_integer(row.row, value))
            } else {
                Ok(value as u32)
            }
        }
    }
}

/// Validate the whole batch before anything is decomposed.
///
/// Every failing row is collected into a single `InvalidTotals` error.
pub fn validate_totals(rows: &[InputRow], spec: &ComponentSpec) -> Result<Vec<ValidatedRow>> {
    let mut validated = Vec::with_capacity(rows.len());
    let mut issues = Vec::new();

    for row in rows {
        match validate_total(row, spec) {
            Ok(total) => validated.push(ValidatedRow { row: row.row, total }),
            Err(issue) => {
                tracing::debug!("Row {} rejected: {}", row.row, issue);
                issues.push(issue);
            }
        }
    }

    if issues.is_empty() {
        Ok(validated)
    } else {
        let (min, max) = spec.reachable_range();
        Err(MarksError::InvalidTotals { min, max, issues })
    }
}
