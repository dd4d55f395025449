// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column labels both years share once normalized, in file order.
pub const CANONICAL_COLUMNS: &[&str] = &[
    "model",
    "displ",
    "cyl",
    "trans",
    "drive",
    "fuel",
    "cert_region",
    "veh_class",
    "air_pollution_score",
    "city_mpg",
    "hwy_mpg",
    "cmb_mpg",
    "greenhouse_gas_score",
    "smartway",
];

pub const CERT_REGION: &str = "cert_region";
pub const FUEL: &str = "fuel";
pub const CYLINDERS: &str = "cyl";
pub const MODEL: &str = "model";

/// Scalar type every cleaned column converges to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Int,
    Float,
}

/// Final column list of a clean table: the canonical list minus `cert_region`.
pub const FINAL_COLUMNS: &[(&str, ColumnKind)] = &[
    ("model", ColumnKind::Text),
    ("displ", ColumnKind::Float),
    ("cyl", ColumnKind::Int),
    ("trans", ColumnKind::Text),
    ("drive", ColumnKind::Text),
    ("fuel", ColumnKind::Text),
    ("veh_class", ColumnKind::Text),
    ("air_pollution_score", ColumnKind::Float),
    ("city_mpg", ColumnKind::Float),
    ("hwy_mpg", ColumnKind::Float),
    ("cmb_mpg", ColumnKind::Float),
    ("greenhouse_gas_score", ColumnKind::Int),
    ("smartway", ColumnKind::Text),
];

/// How a year writes its cylinder count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CylinderFormat {
    /// `(6 cyl)`
    Labelled,
    /// `6.0`
    Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Year {
    #[serde(rename = "2008")]
    Y2008,
    #[serde(rename = "2018")]
    Y2018,
}

impl Year {
    pub const ALL: [Year; 2] = [Year::Y2008, Year::Y2018];

    /// Two-digit tag used in snapshot file names.
    pub fn short(&self) -> &'static str {
        match self {
            Year::Y2008 => "08",
            Year::Y2018 => "18",
        }
    }

    pub fn profile(&self) -> &'static YearProfile {
        match self {
            Year::Y2008 => &PROFILE_2008,
            Year::Y2018 => &PROFILE_2018,
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Y2008 => f.write_str("2008"),
            Year::Y2018 => f.write_str("2018"),
        }
    }
}

/// Everything that differs between the two source files.
#[derive(Debug)]
pub struct YearProfile {
    pub year: Year,
    /// Raw labels with no counterpart in the other year.
    pub drop_columns: &'static [&'static str],
    /// Raw label renames applied before label normalization.
    pub renames: &'static [(&'static str, &'static str)],
    /// Columns that may hold two slash-joined readings on hybrid rows.
    pub split_columns: &'static [&'static str],
    pub cylinder_format: CylinderFormat,
    pub alternative_fuels: &'static [&'static str],
    pub smartway_certified: &'static [&'static str],
}

pub static PROFILE_2008: YearProfile = YearProfile {
    year: Year::Y2008,
    drop_columns: &["Stnd", "Underhood ID", "FE Calc Appr", "Unadj Cmb MPG"],
    renames: &[("Sales Area", "Cert Region")],
    split_columns: &[
        "fuel",
        "air_pollution_score",
        "city_mpg",
        "hwy_mpg",
        "cmb_mpg",
        "greenhouse_gas_score",
    ],
    cylinder_format: CylinderFormat::Labelled,
    alternative_fuels: &["CNG", "ethanol"],
    smartway_certified: &["yes"],
};

// air_pollution_score and greenhouse_gas_score are already scalar in 2018.
pub static PROFILE_2018: YearProfile = YearProfile {
    year: Year::Y2018,
    drop_columns: &["Stnd", "Stnd Description", "Underhood ID", "Comb CO2"],
    renames: &[],
    split_columns: &["fuel", "city_mpg", "hwy_mpg", "cmb_mpg"],
    cylinder_format: CylinderFormat::Decimal,
    alternative_fuels: &["Ethanol", "Electricity"],
    smartway_certified: &["Yes", "Elite"],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_columns_are_canonical_without_region() {
        let canonical: Vec<&str> = CANONICAL_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != CERT_REGION)
            .collect();
        let finals: Vec<&str> = FINAL_COLUMNS.iter().map(|(n, _)| *n).collect();
        assert_eq!(canonical, finals);
    }

    #[test]
    fn split_columns_are_final_columns() {
        for year in Year::ALL {
            for c in year.profile().split_columns {
                assert!(FINAL_COLUMNS.iter().any(|(n, _)| n == c), "{c}");
            }
        }
    }
}
