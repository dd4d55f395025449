// src/schema/normalize.rs

use tracing::{debug, info};

use super::types::{YearProfile, CANONICAL_COLUMNS};
use crate::error::{PipelineError, PipelineResult};
use crate::process::RawTable;

/// Trim, lower-case, and turn internal spaces into underscores.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Drop the year's extraneous columns, apply its explicit renames, then
/// normalize every label. The result must match `CANONICAL_COLUMNS`.
#[tracing::instrument(level = "info", skip(table, profile), fields(year = %profile.year))]
pub fn normalize_schema(table: RawTable, profile: &YearProfile) -> PipelineResult<RawTable> {
    let mut table = table.drop_columns(profile.drop_columns)?;

    for (from, to) in profile.renames {
        let idx = table.column_index(from)?;
        debug!(from, to, "rename");
        table.headers[idx] = to.to_string();
    }

    table.headers = table.headers.iter().map(|h| normalize_label(h)).collect();
    check_canonical(&table)?;

    info!(columns = table.headers.len(), "schema aligned");
    Ok(table)
}

/// Completeness check of the declarative renames.
pub fn check_canonical(table: &RawTable) -> PipelineResult<()> {
    if table.headers.iter().map(String::as_str).eq(CANONICAL_COLUMNS.iter().copied()) {
        return Ok(());
    }
    let missing: Vec<&str> = CANONICAL_COLUMNS
        .iter()
        .copied()
        .filter(|c| !table.headers.iter().any(|h| h == c))
        .collect();
    let unexpected: Vec<&str> = table
        .headers
        .iter()
        .map(String::as_str)
        .filter(|h| !CANONICAL_COLUMNS.contains(h))
        .collect();
    Err(PipelineError::SchemaMismatch {
        left: table.name.clone(),
        right: "canonical columns".to_string(),
        detail: format!(
            "missing {:?}, unexpected {:?}, got {:?}",
            missing, unexpected, table.headers
        ),
    })
}

/// Element-wise label equality between two tables.
pub fn ensure_aligned(left: &RawTable, right: &RawTable) -> PipelineResult<()> {
    if left.headers == right.headers {
        return Ok(());
    }
    let detail = left
        .headers
        .iter()
        .zip(&right.headers)
        .enumerate()
        .find(|(_, (l, r))| l != r)
        .map(|(i, (l, r))| format!("position {i}: `{l}` vs `{r}`"))
        .unwrap_or_else(|| {
            format!(
                "{} vs {} columns",
                left.headers.len(),
                right.headers.len()
            )
        });
    Err(PipelineError::SchemaMismatch {
        left: left.name.clone(),
        right: right.name.clone(),
        detail,
    })
}
