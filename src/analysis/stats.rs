use serde::Serialize;

use super::record::{VehicleRecord, NUMERIC_FIELDS};

/// count / mean / std / min / quartiles / max of one numeric column.
/// Everything but `count` is `None` on an empty input; `std` also needs two values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    #[serde(flatten)]
    pub stats: Describe,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Linear interpolation between closest ranks; `sorted` must be ascending.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

pub fn describe(values: &[f64]) -> Describe {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let m = mean(values);
    let std = match (m, values.len()) {
        (Some(m), n) if n > 1 => {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        }
        _ => None,
    };

    Describe {
        count: values.len(),
        mean: m,
        std,
        min: sorted.first().copied(),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// `describe` for every numeric column of `records`.
pub fn describe_records<'a, I>(records: I) -> Vec<ColumnStats>
where
    I: IntoIterator<Item = &'a VehicleRecord>,
{
    let records: Vec<&VehicleRecord> = records.into_iter().collect();
    NUMERIC_FIELDS
        .iter()
        .map(|(name, get)| {
            let values: Vec<f64> = records.iter().map(|r| get(r)).collect();
            ColumnStats {
                column: name.to_string(),
                stats: describe(&values),
            }
        })
        .collect()
}
