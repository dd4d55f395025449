// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::types::{ColumnKind, FINAL_COLUMNS};
use crate::error::{PipelineError, PipelineResult};

/// - Text  → Utf8
/// - Int   → Int64
/// - Float → Float64
pub fn map_to_arrow_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Text => DataType::Utf8,
        ColumnKind::Int => DataType::Int64,
        ColumnKind::Float => DataType::Float64,
    }
}

/// Build an ArrowSchema (inside an Arc) from `(name, kind)` pairs.
/// Clean tables hold no nulls, so every field is non-nullable.
pub fn build_arrow_schema(cols: &[(&str, ColumnKind)]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = cols
        .iter()
        .map(|(name, kind)| ArrowField::new(*name, map_to_arrow_type(*kind), false))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

pub fn clean_schema() -> Arc<ArrowSchema> {
    build_arrow_schema(FINAL_COLUMNS)
}

/// Element-wise comparison of names and types.
pub fn ensure_same_types(
    left_name: &str,
    left: &ArrowSchema,
    right_name: &str,
    right: &ArrowSchema,
) -> PipelineResult<()> {
    let mismatch = |detail: String| PipelineError::SchemaMismatch {
        left: left_name.to_string(),
        right: right_name.to_string(),
        detail,
    };

    if left.fields().len() != right.fields().len() {
        return Err(mismatch(format!(
            "{} vs {} columns",
            left.fields().len(),
            right.fields().len()
        )));
    }
    for (l, r) in left.fields().iter().zip(right.fields()) {
        if l.name() != r.name() || l.data_type() != r.data_type() {
            return Err(mismatch(format!(
                "{}: {:?} vs {}: {:?}",
                l.name(),
                l.data_type(),
                r.name(),
                r.data_type()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_schema_types() {
        let schema = clean_schema();
        assert_eq!(schema.field_with_name("cyl").unwrap().data_type(), &DataType::Int64);
        assert_eq!(schema.field_with_name("cmb_mpg").unwrap().data_type(), &DataType::Float64);
        assert_eq!(schema.field_with_name("smartway").unwrap().data_type(), &DataType::Utf8);
    }

    #[test]
    fn type_difference_is_reported() {
        let a = build_arrow_schema(&[("x", ColumnKind::Int)]);
        let b = build_arrow_schema(&[("x", ColumnKind::Float)]);
        let err = ensure_same_types("2008", &a, "2018", &b).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
        assert!(ensure_same_types("2008", &a, "2018", &a).is_ok());
    }
}
