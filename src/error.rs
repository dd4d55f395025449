// src/error.rs
use thiserror::Error;

/// Stage-level failures. Every variant is fatal: the next stage relies on the
/// postcondition the failing stage could not establish.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("schema mismatch between {left} and {right}: {detail}")]
    SchemaMismatch {
        left: String,
        right: String,
        detail: String,
    },

    #[error("column `{column}` row {row}: cannot convert {value:?} to {target}{}", hint_suffix(.compound))]
    TypeCoercion {
        column: String,
        row: usize,
        value: String,
        target: &'static str,
        compound: bool,
    },

    #[error("{table}: column `{column}` row {row} still holds {value:?} after splitting")]
    UnsplitValue {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error("column `{column}` not found in {table}")]
    MissingColumn { table: String, column: String },
}

fn hint_suffix(compound: &bool) -> &'static str {
    if *compound {
        " (value holds two readings; split hybrid rows before coercing)"
    } else {
        ""
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_coercion_error_mentions_split() {
        let err = PipelineError::TypeCoercion {
            column: "air_pollution_score".into(),
            row: 3,
            value: "6/4".into(),
            target: "Float64",
            compound: true,
        };
        let msg = err.to_string();
        assert!(msg.contains("\"6/4\""));
        assert!(msg.contains("split hybrid rows before coercing"));
    }

    #[test]
    fn scalar_coercion_error_has_no_hint() {
        let err = PipelineError::TypeCoercion {
            column: "cyl".into(),
            row: 0,
            value: "n/a cyl".into(),
            target: "Int64",
            compound: false,
        };
        assert!(!err.to_string().contains("split"));
    }
}
