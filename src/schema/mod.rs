pub mod arrow;
pub mod normalize;
pub mod types;

pub use arrow::{build_arrow_schema, clean_schema, ensure_same_types, map_to_arrow_type};
pub use normalize::{ensure_aligned, normalize_label, normalize_schema};
pub use types::{ColumnKind, CylinderFormat, Year, YearProfile, CANONICAL_COLUMNS, FINAL_COLUMNS};
