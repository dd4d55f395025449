// src/process/split.rs
use tracing::{info, instrument};

use super::raw_table::{Cell, RawTable, COMPOUND_SEPARATOR};
use crate::error::{PipelineError, PipelineResult};
use crate::schema::types::FUEL;

/// Indices of rows whose fuel cell holds two fuel types.
pub fn hybrid_rows(table: &RawTable) -> PipelineResult<Vec<usize>> {
    let fuel = table.column_index(FUEL)?;
    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r[fuel].as_ref().is_some_and(Cell::is_compound))
        .map(|(i, _)| i)
        .collect())
}

/// Fail on the first fuel cell that still carries the separator, e.g. a
/// malformed `Gasoline/` that was never tagged as two readings.
pub fn ensure_fuel_split(table: &RawTable) -> PipelineResult<()> {
    let fuel = table.column_index(FUEL)?;
    for (row, r) in table.rows.iter().enumerate() {
        if let Some(cell) = &r[fuel] {
            if cell.text().contains(COMPOUND_SEPARATOR) {
                return Err(PipelineError::UnsplitValue {
                    table: table.name.clone(),
                    column: FUEL.to_string(),
                    row,
                    value: cell.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Replace each hybrid row with one row per fuel reading.
///
/// Every split column of the `n`th copy takes reading `n`, so the columns stay
/// zipped; other columns are copied. Non-hybrid rows keep their order, then all
/// first-reading rows, then all second-reading rows.
#[instrument(level = "info", skip(table, split_columns), fields(table = %table.name))]
pub fn split_hybrids(table: RawTable, split_columns: &[&str]) -> PipelineResult<RawTable> {
    let hybrids = hybrid_rows(&table)?;
    if hybrids.is_empty() {
        info!("no hybrid rows");
        ensure_fuel_split(&table)?;
        return Ok(table);
    }

    let split_idx = split_columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<PipelineResult<Vec<usize>>>()?;

    let before = table.len();
    let mut kept = Vec::with_capacity(before + hybrids.len());
    let mut hybrid_source = Vec::with_capacity(hybrids.len());
    let mut next = hybrids.iter().peekable();
    for (i, row) in table.rows.iter().enumerate() {
        if next.peek() == Some(&&i) {
            next.next();
            hybrid_source.push(row);
        } else {
            kept.push(row.clone());
        }
    }

    for reading in 0..2 {
        for row in &hybrid_source {
            let mut copy = (*row).clone();
            for &c in &split_idx {
                copy[c] = copy[c].as_ref().map(|cell| cell.part(reading));
            }
            kept.push(copy);
        }
    }

    let out = table.with_rows(kept);
    ensure_fuel_split(&out)?;
    info!(
        before,
        hybrids = hybrids.len(),
        after = out.len(),
        "split hybrid rows"
    );
    Ok(out)
}
