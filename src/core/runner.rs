use crate::core::decomposer::Decomposer;
use crate::core::validator::validate_totals;
use crate::domain::model::{InputRow, ResultRow};
use crate::utils::error::{MarksError, Result};
use rand::Rng;

/// Validates a batch, then decomposes it row by row.
pub struct BatchRunner<'a> {
    decomposer: &'a Decomposer,
}

impl<'a> BatchRunner<'a> {
    pub fn new(decomposer: &'a Decomposer) -> Self {
        Self { decomposer }
    }

    /// All-or-nothing: any invalid total, or the first row the decomposer
    /// gives up on, fails the whole batch and no rows are returned.
    pub fn process<R: Rng + ?Sized>(&self, rows: &[InputRow], rng: &mut R) -> Result<Vec<ResultRow>> {
        let validated = validate_totals(rows, self.decomposer.spec())?;
        tracing::debug!("{} rows passed validation", validated.len());

        let mut results = Vec::with_capacity(validated.len());
        for row in validated {
            let decomposition = self
                .decomposer
                .decompose(row.total, rng)
                .ok_or(MarksError::DecompositionExhausted {
                    row: row.row,
                    total: row.total,
                })?;

            tracing::debug!(
                "Row {}: total {} -> {:?}",
                row.row,
                row.total,
                decomposition.values
            );
            results.push(ResultRow {
                row: row.row,
                total: row.total,
                decomposition,
            });
        }

        Ok(results)
    }
}
