use arrow::{
    array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder},
    record_batch::RecordBatch,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument};

use super::raw_table::{Cell, RawTable};
use crate::error::{PipelineError, PipelineResult};
use crate::schema::{
    arrow::build_arrow_schema,
    types::{ColumnKind, CylinderFormat, CYLINDERS},
};

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("static regex"));

fn coercion_error(column: &str, row: usize, cell: Option<&Cell>, target: &'static str) -> PipelineError {
    PipelineError::TypeCoercion {
        column: column.to_string(),
        row,
        value: cell.map(|c| c.to_string()).unwrap_or_default(),
        target,
        compound: cell.is_some_and(Cell::is_compound),
    }
}

/// Integer from a text cell; integral floats (`6.0`) are accepted.
fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

/// Rewrite the cylinder column as plain integers: `(6 cyl)` → `6`, `6.0` → `6`.
#[instrument(level = "info", skip(table), fields(table = %table.name))]
pub fn fix_cylinders(table: RawTable, format: CylinderFormat) -> PipelineResult<RawTable> {
    let idx = table.column_index(CYLINDERS)?;
    let mut rows = Vec::with_capacity(table.len());

    for (r, row) in table.rows.iter().enumerate() {
        let cell = row[idx].as_ref();
        let parsed = match cell {
            Some(Cell::Scalar(s)) => match format {
                CylinderFormat::Labelled => DIGITS
                    .captures(s)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<i64>().ok()),
                CylinderFormat::Decimal => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64),
            },
            _ => None,
        };
        let cyl = parsed.ok_or_else(|| coercion_error(CYLINDERS, r, cell, "Int64"))?;

        let mut out = row.clone();
        out[idx] = Some(Cell::Scalar(cyl.to_string()));
        rows.push(out);
    }

    info!(rows = rows.len(), "cylinder counts fixed");
    Ok(table.with_rows(rows))
}

/// Convert every column to its final type, in the order of `columns`.
///
/// Must run after splitting: a compound value in a numeric column is a
/// `TypeCoercion` error, as is a null anywhere.
#[instrument(level = "info", skip(table, columns), fields(table = %table.name))]
pub fn coerce_table(table: &RawTable, columns: &[(&str, ColumnKind)]) -> PipelineResult<RecordBatch> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for (name, kind) in columns {
        let idx = table.column_index(name)?;
        let cells = table.rows.iter().map(|r| r[idx].as_ref());

        let array: ArrayRef = match kind {
            ColumnKind::Text => {
                let mut b = StringBuilder::with_capacity(table.len(), table.len() * 8);
                for (r, cell) in cells.enumerate() {
                    let cell = cell.ok_or_else(|| coercion_error(name, r, None, "Utf8"))?;
                    b.append_value(cell.text());
                }
                Arc::new(b.finish())
            }
            ColumnKind::Int => {
                let mut b = Int64Builder::with_capacity(table.len());
                for (r, cell) in cells.enumerate() {
                    let v = match cell {
                        Some(Cell::Scalar(s)) => parse_int(s),
                        _ => None,
                    }
                    .ok_or_else(|| coercion_error(name, r, cell, "Int64"))?;
                    b.append_value(v);
                }
                Arc::new(b.finish())
            }
            ColumnKind::Float => {
                let mut b = Float64Builder::with_capacity(table.len());
                for (r, cell) in cells.enumerate() {
                    let v = match cell {
                        Some(Cell::Scalar(s)) => s.trim().parse::<f64>().ok(),
                        _ => None,
                    }
                    .ok_or_else(|| coercion_error(name, r, cell, "Float64"))?;
                    b.append_value(v);
                }
                Arc::new(b.finish())
            }
        };
        arrays.push(array);
    }

    let schema = build_arrow_schema(columns);
    let batch = RecordBatch::try_new(schema, arrays).map_err(|e| PipelineError::SchemaMismatch {
        left: table.name.clone(),
        right: "final columns".to_string(),
        detail: e.to_string(),
    })?;
    info!(rows = batch.num_rows(), columns = batch.num_columns(), "coerced");
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int64Array, StringArray};

    #[test]
    fn labelled_and_decimal_cylinders() -> PipelineResult<()> {
        let t08 = RawTable::from_strings("2008", &["cyl"], &[&["(6 cyl)"], &["(12 cyl)"]]);
        let t08 = fix_cylinders(t08, CylinderFormat::Labelled)?;
        assert_eq!(t08.rows[1][0], Cell::parse("12"));

        let t18 = RawTable::from_strings("2018", &["cyl"], &[&["4.0"], &["8"]]);
        let t18 = fix_cylinders(t18, CylinderFormat::Decimal)?;
        assert_eq!(t18.rows[0][0], Cell::parse("4"));
        assert_eq!(t18.rows[1][0], Cell::parse("8"));
        Ok(())
    }

    #[test]
    fn cylinder_without_digits_fails() {
        let t = RawTable::from_strings("2008", &["cyl"], &[&["(rotary)"]]);
        let err = fix_cylinders(t, CylinderFormat::Labelled).unwrap_err();
        assert!(matches!(err, PipelineError::TypeCoercion { row: 0, .. }));
    }

    #[test]
    fn coerce_builds_typed_columns() -> PipelineResult<()> {
        let t = RawTable::from_strings(
            "2018",
            &["model", "cyl", "cmb_mpg"],
            &[&["Civic", "4", "36"], &["Tahoe", "8.0", "18.5"]],
        );
        let batch = coerce_table(
            &t,
            &[
                ("model", ColumnKind::Text),
                ("cyl", ColumnKind::Int),
                ("cmb_mpg", ColumnKind::Float),
            ],
        )?;
        let model = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        let cyl = batch.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        let mpg = batch.column(2).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(model.value(1), "Tahoe");
        assert_eq!(cyl.value(0), 4);
        assert_eq!(cyl.value(1), 8);
        assert_eq!(mpg.value(1), 18.5);
        assert_eq!(mpg.null_count(), 0);
        Ok(())
    }

    #[test]
    fn compound_value_demands_split_first() {
        let t = RawTable::from_strings("2008", &["air_pollution_score"], &[&["7"], &["6/4"]]);
        let err = coerce_table(&t, &[("air_pollution_score", ColumnKind::Float)]).unwrap_err();
        match &err {
            PipelineError::TypeCoercion {
                row,
                value,
                compound,
                ..
            } => {
                assert_eq!(*row, 1);
                assert_eq!(value, "6/4");
                assert!(*compound);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("split hybrid rows"));
    }

    #[test]
    fn padded_numbers_still_coerce() -> PipelineResult<()> {
        let t = RawTable::from_strings("2008", &["cyl", "cmb_mpg"], &[&[" 6 ", "29 "]]);
        let batch = coerce_table(&t, &[("cyl", ColumnKind::Int), ("cmb_mpg", ColumnKind::Float)])?;
        let cyl = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        let mpg = batch.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(cyl.value(0), 6);
        assert_eq!(mpg.value(0), 29.0);
        Ok(())
    }

    #[test]
    fn fractional_value_is_not_an_int() {
        let t = RawTable::from_strings("2008", &["greenhouse_gas_score"], &[&["6.5"]]);
        assert!(coerce_table(&t, &[("greenhouse_gas_score", ColumnKind::Int)]).is_err());
    }
}
