// src/analysis/merge.rs
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

use super::record::VehicleRecord;

/// Suffix carried by every 2008 column in the combined dataset.
pub const SUFFIX_2008: &str = "_2008";

/// A 2008 row paired with a 2018 row of the same model.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    pub old: VehicleRecord,
    pub new: VehicleRecord,
}

impl CombinedRecord {
    /// `<field>_2008` for the old half, plain names for the new half.
    pub fn headers() -> Vec<String> {
        VehicleRecord::FIELDS
            .iter()
            .map(|f| format!("{f}{SUFFIX_2008}"))
            .chain(VehicleRecord::FIELDS.iter().map(|f| f.to_string()))
            .collect()
    }

    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = self.old.to_fields();
        fields.extend(self.new.to_fields());
        fields
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub combined: Vec<CombinedRecord>,
    /// Models dropped by the inner join, per side.
    pub only_2008: BTreeSet<String>,
    pub only_2018: BTreeSet<String>,
}

/// Inner join on model name. Left order is kept; each left row pairs with
/// every matching right row in right order.
pub fn merge_on_model(old: &[VehicleRecord], new: &[VehicleRecord]) -> MergeOutcome {
    let mut by_model: HashMap<&str, Vec<&VehicleRecord>> = HashMap::new();
    for r in new {
        by_model.entry(r.model.as_str()).or_default().push(r);
    }

    let mut outcome = MergeOutcome::default();
    for o in old {
        match by_model.get(o.model.as_str()) {
            Some(matches) => outcome.combined.extend(matches.iter().map(|n| CombinedRecord {
                old: o.clone(),
                new: (*n).clone(),
            })),
            None => {
                outcome.only_2008.insert(o.model.clone());
            }
        }
    }
    let old_models: BTreeSet<&str> = old.iter().map(|r| r.model.as_str()).collect();
    outcome.only_2018 = new
        .iter()
        .filter(|r| !old_models.contains(r.model.as_str()))
        .map(|r| r.model.clone())
        .collect();

    if !outcome.only_2008.is_empty() || !outcome.only_2018.is_empty() {
        warn!(
            only_2008 = outcome.only_2008.len(),
            only_2018 = outcome.only_2018.len(),
            "models without a counterpart excluded from merge"
        );
    }
    info!(rows = outcome.combined.len(), "merged on model");
    outcome
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMpgChange {
    pub model: String,
    pub cmb_mpg_2008: f64,
    pub cmb_mpg_2018: f64,
    pub mpg_change: f64,
}

/// Mean combined mpg per model on each side of the join, sorted by model.
pub fn model_mpg_changes(combined: &[CombinedRecord]) -> Vec<ModelMpgChange> {
    let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for c in combined {
        let e = sums.entry(c.old.model.as_str()).or_insert((0.0, 0.0, 0));
        e.0 += c.old.cmb_mpg;
        e.1 += c.new.cmb_mpg;
        e.2 += 1;
    }
    sums.into_iter()
        .map(|(model, (old, new, n))| {
            let (old, new) = (old / n as f64, new / n as f64);
            ModelMpgChange {
                model: model.to_string(),
                cmb_mpg_2008: old,
                cmb_mpg_2018: new,
                mpg_change: new - old,
            }
        })
        .collect()
}

/// Largest `mpg_change`; ties go to the lexicographically smallest model.
pub fn max_improvement(changes: &[ModelMpgChange]) -> Option<&ModelMpgChange> {
    changes.iter().fold(None, |best: Option<&ModelMpgChange>, c| match best {
        Some(b) if c.mpg_change < b.mpg_change => Some(b),
        Some(b) if c.mpg_change == b.mpg_change && b.model <= c.model => Some(b),
        _ => Some(c),
    })
}
