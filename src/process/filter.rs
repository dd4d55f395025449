// src/process/filter.rs
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use super::raw_table::{Cell, RawTable};
use crate::error::PipelineResult;
use crate::schema::types::CERT_REGION;

/// Keep rows whose `column` equals `value`, then drop the now-constant column.
/// Null cells never match.
pub fn filter_region(table: RawTable, column: &str, value: &str) -> PipelineResult<RawTable> {
    let idx = table.column_index(column)?;
    let before = table.len();
    let rows: Vec<_> = table
        .rows
        .iter()
        .filter(|r| matches!(&r[idx], Some(c) if c.text() == value))
        .cloned()
        .collect();
    let filtered = table.with_rows(rows);
    debug!(table = %filtered.name, column, value, before, after = filtered.len(), "filtered");
    filtered.drop_columns(&[column])
}

/// `(column, null count)` for every column.
pub fn null_counts(table: &RawTable) -> Vec<(String, usize)> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), table.rows.iter().filter(|r| r[i].is_none()).count()))
        .collect()
}

/// Remove every row with a null in any column.
pub fn drop_nulls(table: RawTable) -> RawTable {
    let rows = table
        .rows
        .iter()
        .filter(|r| r.iter().all(Option::is_some))
        .cloned()
        .collect();
    table.with_rows(rows)
}

/// Rows equal to an earlier row.
pub fn duplicate_count(table: &RawTable) -> usize {
    let mut seen: HashSet<&Vec<Option<Cell>>> = HashSet::with_capacity(table.len());
    table.rows.iter().filter(|r| !seen.insert(*r)).count()
}

/// Keep the first occurrence of each row, preserving order.
pub fn drop_duplicates(table: RawTable) -> RawTable {
    let mut seen: HashSet<&Vec<Option<Cell>>> = HashSet::with_capacity(table.len());
    let rows = table
        .rows
        .iter()
        .filter(|r| seen.insert(*r))
        .cloned()
        .collect();
    table.with_rows(rows)
}

/// Region filter, then null drop, then dedup. Rows differing only in a null
/// cell are removed by the null drop before dedup compares them.
#[instrument(level = "info", skip(table), fields(table = %table.name))]
pub fn filter_and_dedup(table: RawTable, region: &str) -> PipelineResult<RawTable> {
    let start = table.len();
    let table = filter_region(table, CERT_REGION, region)?;

    for (column, nulls) in null_counts(&table).into_iter().filter(|(_, n)| *n > 0) {
        debug!(column = %column, nulls, "null cells");
    }
    let table = drop_nulls(table);
    let after_nulls = table.len();

    let dupes = duplicate_count(&table);
    let table = drop_duplicates(table);

    info!(
        start,
        after_nulls,
        duplicates = dupes,
        rows = table.len(),
        "filtered and deduplicated"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        RawTable::from_strings(
            "2008",
            &["model", "cert_region", "cmb_mpg"],
            &[
                &["Civic", "CA", "30"],
                &["Civic", "FA", "30"],
                &["Civic", "CA", "30"],
                &["Accord", "CA", ""],
                &["Accord", "CA", "25"],
                &["Fit", "", "33"],
            ],
        )
    }

    #[test]
    fn region_filter_drops_the_column() -> PipelineResult<()> {
        let t = filter_region(sample(), "cert_region", "CA")?;
        assert!(t.column_index("cert_region").is_err());
        assert_eq!(t.headers, vec!["model", "cmb_mpg"]);
        assert_eq!(t.len(), 4);
        Ok(())
    }

    #[test]
    fn null_drop_is_idempotent() {
        let once = drop_nulls(sample());
        assert_eq!(once.len(), 4);
        assert!(null_counts(&once).iter().all(|(_, n)| *n == 0));
        let twice = drop_nulls(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn dedup_is_idempotent_and_keeps_first() {
        let t = sample();
        assert_eq!(duplicate_count(&t), 1);
        let once = drop_duplicates(t);
        assert_eq!(once.len(), 5);
        assert_eq!(duplicate_count(&once), 0);
        assert_eq!(once.rows[1][1], Cell::parse("FA"));
        assert_eq!(drop_duplicates(once.clone()).len(), once.len());
    }

    #[test]
    fn full_stage_order() -> PipelineResult<()> {
        let t = filter_and_dedup(sample(), "CA")?;
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[0], vec![Cell::parse("Civic"), Cell::parse("30")]);
        assert_eq!(t.rows[1], vec![Cell::parse("Accord"), Cell::parse("25")]);
        Ok(())
    }

    #[test]
    fn na_placeholder_rows_are_dropped_with_nulls() -> PipelineResult<()> {
        let t = RawTable::from_strings(
            "2008",
            &["model", "cert_region", "air_pollution_score"],
            &[&["Civic", "CA", "N/A"], &["Accord", "CA", "6"], &["Fit", "CA", "NaN"]],
        );
        let t = filter_and_dedup(t, "CA")?;
        assert_eq!(t.len(), 1);
        assert_eq!(t.rows[0], vec![Cell::parse("Accord"), Cell::parse("6")]);
        Ok(())
    }
}
