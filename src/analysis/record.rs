// src/analysis/record.rs
use anyhow::{anyhow, Result};
use arrow::{
    array::{Array, Float64Array, Int64Array, StringArray},
    record_batch::RecordBatch,
};
use serde::Serialize;

/// One cleaned row: a (model, fuel) combination for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRecord {
    pub model: String,
    pub displ: f64,
    pub cyl: i64,
    pub trans: String,
    pub drive: String,
    pub fuel: String,
    pub veh_class: String,
    pub air_pollution_score: f64,
    pub city_mpg: f64,
    pub hwy_mpg: f64,
    pub cmb_mpg: f64,
    pub greenhouse_gas_score: i64,
    pub smartway: String,
}

/// Numeric columns and their accessors, in file order.
pub const NUMERIC_FIELDS: &[(&str, fn(&VehicleRecord) -> f64)] = &[
    ("displ", |r: &VehicleRecord| r.displ),
    ("cyl", |r: &VehicleRecord| r.cyl as f64),
    ("air_pollution_score", |r: &VehicleRecord| r.air_pollution_score),
    ("city_mpg", |r: &VehicleRecord| r.city_mpg),
    ("hwy_mpg", |r: &VehicleRecord| r.hwy_mpg),
    ("cmb_mpg", |r: &VehicleRecord| r.cmb_mpg),
    ("greenhouse_gas_score", |r: &VehicleRecord| r.greenhouse_gas_score as f64),
];

impl VehicleRecord {
    /// Column labels matching `to_fields`.
    pub const FIELDS: [&'static str; 13] = [
        "model",
        "displ",
        "cyl",
        "trans",
        "drive",
        "fuel",
        "veh_class",
        "air_pollution_score",
        "city_mpg",
        "hwy_mpg",
        "cmb_mpg",
        "greenhouse_gas_score",
        "smartway",
    ];

    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.model.clone(),
            self.displ.to_string(),
            self.cyl.to_string(),
            self.trans.clone(),
            self.drive.clone(),
            self.fuel.clone(),
            self.veh_class.clone(),
            self.air_pollution_score.to_string(),
            self.city_mpg.to_string(),
            self.hwy_mpg.to_string(),
            self.cmb_mpg.to_string(),
            self.greenhouse_gas_score.to_string(),
            self.smartway.clone(),
        ]
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("column {} missing from batch", name))?;
    col.as_any().downcast_ref::<T>().ok_or_else(|| {
        anyhow!(
            "column {} has unexpected type {:?}",
            name,
            col.data_type()
        )
    })
}

/// Read a clean batch back into typed records.
pub fn records_from_batch(batch: &RecordBatch) -> Result<Vec<VehicleRecord>> {
    let model = column::<StringArray>(batch, "model")?;
    let displ = column::<Float64Array>(batch, "displ")?;
    let cyl = column::<Int64Array>(batch, "cyl")?;
    let trans = column::<StringArray>(batch, "trans")?;
    let drive = column::<StringArray>(batch, "drive")?;
    let fuel = column::<StringArray>(batch, "fuel")?;
    let veh_class = column::<StringArray>(batch, "veh_class")?;
    let air = column::<Float64Array>(batch, "air_pollution_score")?;
    let city = column::<Float64Array>(batch, "city_mpg")?;
    let hwy = column::<Float64Array>(batch, "hwy_mpg")?;
    let cmb = column::<Float64Array>(batch, "cmb_mpg")?;
    let ghg = column::<Int64Array>(batch, "greenhouse_gas_score")?;
    let smartway = column::<StringArray>(batch, "smartway")?;

    Ok((0..batch.num_rows())
        .map(|i| VehicleRecord {
            model: model.value(i).to_string(),
            displ: displ.value(i),
            cyl: cyl.value(i),
            trans: trans.value(i).to_string(),
            drive: drive.value(i).to_string(),
            fuel: fuel.value(i).to_string(),
            veh_class: veh_class.value(i).to_string(),
            air_pollution_score: air.value(i),
            city_mpg: city.value(i),
            hwy_mpg: hwy.value(i),
            cmb_mpg: cmb.value(i),
            greenhouse_gas_score: ghg.value(i),
            smartway: smartway.value(i).to_string(),
        })
        .collect())
}
