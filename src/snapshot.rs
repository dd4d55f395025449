// src/snapshot.rs
use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use serde::Serialize;
use std::{
    ffi::OsString,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::analysis::CombinedRecord;
use crate::process::RawTable;
use crate::schema::Year;

/// Stage artifacts, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Columns dropped and renamed.
    Aligned,
    /// Region filter, null drop and dedup applied.
    Filtered,
    /// Cylinder counts as integers.
    Cylinders,
    /// Hybrid rows split.
    Split,
    /// Every column typed.
    Clean,
}

impl Stage {
    pub fn file_name(&self, year: Year) -> String {
        let y = year.short();
        match self {
            Stage::Aligned => format!("data_{y}_v1.csv"),
            Stage::Filtered => format!("data_{y}_v2.csv"),
            Stage::Cylinders => format!("data_{y}_v3.csv"),
            Stage::Split => format!("data_{y}_v4.csv"),
            Stage::Clean => format!("clean_{y}.csv"),
        }
    }
}

pub const COMBINED_FILE: &str = "combined_dataset.csv";
pub const REPORT_FILE: &str = "report.json";

pub fn clean_parquet_name(year: Year) -> String {
    format!("clean_{}.parquet", year.short())
}

/// `<file name>.tmp` next to `path`, so `clean_08.csv` and `clean_08.parquet`
/// never share a temporary.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write through a temporary sibling, then rename over `path`.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let temp_path = temp_path_for(path);
    let file = File::create(&temp_path)
        .with_context(|| format!("creating {}", temp_path.display()))?;
    write(file).with_context(|| format!("writing {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("renaming {} -> {}", temp_path.display(), path.display()))?;
    debug!(path = %path.display(), "wrote snapshot");
    Ok(())
}

/// Untyped table as CSV; null cells are written empty.
pub fn write_raw_csv(table: &RawTable, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut w = csv::Writer::from_writer(BufWriter::new(file));
        w.write_record(&table.headers)?;
        for row in &table.rows {
            w.write_record(row.iter().map(|c| c.as_ref().map(|c| c.to_string()).unwrap_or_default()))?;
        }
        w.flush()?;
        Ok(())
    })
}

pub fn write_batch_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut w = WriterBuilder::new().with_header(true).build(BufWriter::new(file));
        w.write(batch)?;
        Ok(())
    })
}

pub fn write_batch_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let props = WriterProperties::builder()
            .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
            .set_dictionary_enabled(true)
            .build();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
            .context("creating parquet writer")?;
        writer.write(batch).context("writing batch to parquet")?;
        writer.close().context("closing parquet writer")?;
        Ok(())
    })
}

pub fn write_combined_csv(rows: &[CombinedRecord], path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut w = csv::Writer::from_writer(BufWriter::new(file));
        w.write_record(CombinedRecord::headers())?;
        for r in rows {
            w.write_record(r.to_fields())?;
        }
        w.flush()?;
        Ok(())
    })
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, value)?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    })
}

/// Output directory handle; creates the directory on open.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    root: PathBuf,
}

impl SnapshotDir {
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).with_context(|| format!("creating {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn stage_path(&self, stage: Stage, year: Year) -> PathBuf {
        self.path(&stage.file_name(year))
    }
}

/// Receives each stage's output as soon as that stage returns, so a later
/// failure leaves the earlier snapshots on disk.
pub trait StageSink {
    fn raw_stage(&mut self, year: Year, stage: Stage, table: &RawTable) -> Result<()>;
    fn clean_stage(&mut self, year: Year, batch: &RecordBatch) -> Result<()>;
}

/// Keeps nothing; used for in-memory runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshots;

impl StageSink for NoSnapshots {
    fn raw_stage(&mut self, _: Year, _: Stage, _: &RawTable) -> Result<()> {
        Ok(())
    }

    fn clean_stage(&mut self, _: Year, _: &RecordBatch) -> Result<()> {
        Ok(())
    }
}

impl StageSink for SnapshotDir {
    fn raw_stage(&mut self, year: Year, stage: Stage, table: &RawTable) -> Result<()> {
        write_raw_csv(table, &self.stage_path(stage, year))
    }

    fn clean_stage(&mut self, year: Year, batch: &RecordBatch) -> Result<()> {
        write_batch_csv(batch, &self.stage_path(Stage::Clean, year))?;
        write_batch_parquet(batch, &self.path(&clean_parquet_name(year)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::read_table;
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use tempfile::tempdir;

    #[test]
    fn raw_csv_round_trips_nulls_and_compounds() -> Result<()> {
        let dir = tempdir()?;
        let table = RawTable::from_strings(
            "2008",
            &["model", "fuel", "cmb_mpg"],
            &[&["Tahoe", "ethanol/gas", ""], &["Civic, LX", "Gasoline", "30"]],
        );
        let path = dir.path().join("t.csv");
        write_raw_csv(&table, &path)?;

        let back = read_table(File::open(&path)?, "2008")?;
        assert_eq!(back, table);
        assert!(!temp_path_for(&path).exists());
        Ok(())
    }

    #[test]
    fn csv_and_parquet_use_distinct_temporaries() {
        let dir = Path::new("out");
        let csv = temp_path_for(&dir.join(Stage::Clean.file_name(Year::Y2008)));
        let parquet = temp_path_for(&dir.join(clean_parquet_name(Year::Y2008)));
        assert_eq!(csv, dir.join("clean_08.csv.tmp"));
        assert_eq!(parquet, dir.join("clean_08.parquet.tmp"));
    }

    #[test]
    fn stage_names_follow_the_version_sequence() {
        assert_eq!(Stage::Aligned.file_name(Year::Y2008), "data_08_v1.csv");
        assert_eq!(Stage::Split.file_name(Year::Y2018), "data_18_v4.csv");
        assert_eq!(Stage::Clean.file_name(Year::Y2018), "clean_18.csv");
    }

    #[test]
    fn parquet_snapshot_keeps_row_count() -> Result<()> {
        use crate::process::convert::coerce_table;
        use crate::schema::ColumnKind;

        let dir = tempdir()?;
        let table = RawTable::from_strings(
            "2018",
            &["model", "cmb_mpg"],
            &[&["Civic", "36"], &["Fit", "33"], &["Accord", "33"]],
        );
        let batch = coerce_table(&table, &[("model", ColumnKind::Text), ("cmb_mpg", ColumnKind::Float)])?;
        let path = dir.path().join("clean.parquet");
        write_batch_parquet(&batch, &path)?;

        let reader = SerializedFileReader::new(File::open(&path)?)?;
        assert_eq!(reader.metadata().file_metadata().num_rows(), 3);
        Ok(())
    }
}
