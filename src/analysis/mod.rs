pub mod merge;
pub mod record;
pub mod stats;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

use crate::process::ColumnSummary;
use crate::schema::{Year, YearProfile};
pub use merge::{max_improvement, merge_on_model, model_mpg_changes, CombinedRecord, ModelMpgChange};
pub use record::{records_from_batch, VehicleRecord};
pub use stats::{describe, describe_records, ColumnStats, Describe};

/// `(value, count)` of the fuel column, most frequent first, ties by name.
pub fn fuel_counts(records: &[VehicleRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        *counts.entry(r.fuel.as_str()).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Distinct models running on any of `fuels`.
pub fn alternative_fuel_models(records: &[VehicleRecord], fuels: &[&str]) -> usize {
    records
        .iter()
        .filter(|r| fuels.contains(&r.fuel.as_str()))
        .map(|r| r.model.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Mean `cmb_mpg` per vehicle class.
pub fn class_mean_mpg(records: &[VehicleRecord]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for r in records {
        let e = sums.entry(r.veh_class.clone()).or_insert((0.0, 0));
        e.0 += r.cmb_mpg;
        e.1 += 1;
    }
    sums.into_iter()
        .map(|(class, (sum, n))| (class, sum / n as f64))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassChange {
    pub veh_class: String,
    pub mean_2008: Option<f64>,
    pub mean_2018: Option<f64>,
    /// Only present when the class exists in both years.
    pub change: Option<f64>,
}

pub fn class_changes(
    old: &BTreeMap<String, f64>,
    new: &BTreeMap<String, f64>,
) -> Vec<ClassChange> {
    let classes: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    classes
        .into_iter()
        .map(|c| {
            let (o, n) = (old.get(c).copied(), new.get(c).copied());
            ClassChange {
                veh_class: c.clone(),
                mean_2008: o,
                mean_2018: n,
                change: o.zip(n).map(|(o, n)| n - o),
            }
        })
        .collect()
}

pub fn smartway_vehicles<'a>(
    records: &'a [VehicleRecord],
    certified: &'a [&'a str],
) -> impl Iterator<Item = &'a VehicleRecord> + 'a {
    records
        .iter()
        .filter(move |r| certified.contains(&r.smartway.as_str()))
}

/// Rows whose `cmb_mpg` is strictly above the table mean.
pub fn above_average(records: &[VehicleRecord]) -> Vec<&VehicleRecord> {
    let cmb: Vec<f64> = records.iter().map(|r| r.cmb_mpg).collect();
    match stats::mean(&cmb) {
        Some(m) => records.iter().filter(|r| r.cmb_mpg > m).collect(),
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct YearReport {
    pub year: Year,
    pub raw_columns: Vec<ColumnSummary>,
    pub rows: usize,
    pub fuel_counts: Vec<(String, usize)>,
    pub alternative_fuel_models: usize,
    pub smartway: Vec<ColumnStats>,
    pub above_average: Vec<ColumnStats>,
}

impl YearReport {
    pub fn build(profile: &YearProfile, raw_columns: Vec<ColumnSummary>, records: &[VehicleRecord]) -> Self {
        Self {
            year: profile.year,
            raw_columns,
            rows: records.len(),
            fuel_counts: fuel_counts(records),
            alternative_fuel_models: alternative_fuel_models(records, profile.alternative_fuels),
            smartway: describe_records(smartway_vehicles(records, profile.smartway_certified)),
            above_average: describe_records(above_average(records)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub rows: usize,
    pub models_only_2008: Vec<String>,
    pub models_only_2018: Vec<String>,
    pub changes: Vec<ModelMpgChange>,
    pub max_improvement: Option<ModelMpgChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub y2008: YearReport,
    pub y2018: YearReport,
    /// Unique alternative-fuel models gained from 2008 to 2018.
    pub alternative_fuel_increase: i64,
    pub class_mpg: Vec<ClassChange>,
    pub merge: MergeSummary,
}

/// Answer every fixed question over the two cleaned tables. Read-only.
pub fn build_report(
    y2008: YearReport,
    y2018: YearReport,
    old: &[VehicleRecord],
    new: &[VehicleRecord],
    outcome: &merge::MergeOutcome,
) -> AnalysisReport {
    let class_mpg = class_changes(&class_mean_mpg(old), &class_mean_mpg(new));
    let changes = model_mpg_changes(&outcome.combined);
    let best = max_improvement(&changes).cloned();

    if let Some(b) = &best {
        info!(model = %b.model, mpg_change = b.mpg_change, "largest improvement");
    }

    AnalysisReport {
        generated_at: Utc::now(),
        alternative_fuel_increase: y2018.alternative_fuel_models as i64
            - y2008.alternative_fuel_models as i64,
        y2008,
        y2018,
        class_mpg,
        merge: MergeSummary {
            rows: outcome.combined.len(),
            models_only_2008: outcome.only_2008.iter().cloned().collect(),
            models_only_2018: outcome.only_2018.iter().cloned().collect(),
            changes,
            max_improvement: best,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::record::tests::vehicle;
    use crate::schema::types::{PROFILE_2008, PROFILE_2018};

    fn records_2008() -> Vec<VehicleRecord> {
        let mut smart = vehicle("Prius", "midsize car", "Gasoline", 46.0);
        smart.smartway = "yes".to_string();
        vec![
            vehicle("Civic", "small car", "Gasoline", 30.0),
            vehicle("Civic", "small car", "CNG", 28.0),
            vehicle("Tahoe", "SUV", "ethanol", 12.0),
            vehicle("Tahoe", "SUV", "gas", 16.0),
            smart,
        ]
    }

    #[test]
    fn alternative_fuel_counts_unique_models() {
        let rs = records_2008();
        assert_eq!(alternative_fuel_models(&rs, PROFILE_2008.alternative_fuels), 2);
        assert_eq!(alternative_fuel_models(&rs, PROFILE_2018.alternative_fuels), 0);
    }

    #[test]
    fn fuel_counts_sorted_by_frequency() {
        let counts = fuel_counts(&records_2008());
        assert_eq!(counts[0], ("Gasoline".to_string(), 2));
        assert_eq!(counts[1].0, "CNG");
    }

    #[test]
    fn class_change_needs_both_years() {
        let old = class_mean_mpg(&records_2008());
        assert_eq!(old["SUV"], 14.0);
        let new = class_mean_mpg(&[vehicle("Tahoe", "SUV", "Gasoline", 20.0)]);
        let changes = class_changes(&old, &new);
        let suv = changes.iter().find(|c| c.veh_class == "SUV").unwrap();
        assert_eq!(suv.change, Some(6.0));
        let small = changes.iter().find(|c| c.veh_class == "small car").unwrap();
        assert_eq!(small.mean_2018, None);
        assert_eq!(small.change, None);
    }

    #[test]
    fn smartway_and_above_average_subsets() {
        let rs = records_2008();
        let smart: Vec<_> = smartway_vehicles(&rs, PROFILE_2008.smartway_certified).collect();
        assert_eq!(smart.len(), 1);
        assert_eq!(smart[0].model, "Prius");

        // mean is 26.4
        let top = above_average(&rs);
        let models: Vec<&str> = top.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["Civic", "Civic", "Prius"]);
        assert!(above_average(&[]).is_empty());
    }

    #[test]
    fn report_pulls_the_questions_together() {
        let old = records_2008();
        let new = vec![
            vehicle("Civic", "small car", "Gasoline", 36.0),
            vehicle("Tahoe", "SUV", "Ethanol", 18.0),
        ];
        let outcome = merge_on_model(&old, &new);
        let report = build_report(
            YearReport::build(&PROFILE_2008, Vec::new(), &old),
            YearReport::build(&PROFILE_2018, Vec::new(), &new),
            &old,
            &new,
            &outcome,
        );
        assert_eq!(report.alternative_fuel_increase, -1);
        assert_eq!(report.merge.models_only_2008, vec!["Prius".to_string()]);
        // Civic 29 → 36, Tahoe 14 → 18
        assert_eq!(report.merge.max_improvement.as_ref().unwrap().model, "Civic");
        assert_eq!(report.merge.max_improvement.unwrap().mpg_change, 7.0);

        let json = serde_json::to_value(&report.y2008).unwrap();
        assert_eq!(json["year"], "2008");
    }
}
