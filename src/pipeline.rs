// src/pipeline.rs
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use std::time::Instant;
use tracing::{info, instrument};

use crate::{
    analysis::{
        build_report, merge::MergeOutcome, merge_on_model, records_from_batch, AnalysisReport,
        VehicleRecord, YearReport,
    },
    config::PipelineConfig,
    process::{
        convert::{coerce_table, fix_cylinders},
        filter::filter_and_dedup,
        load_table,
        split::split_hybrids,
        summarize_columns, ColumnSummary, RawTable,
    },
    schema::{clean_schema, ensure_aligned, ensure_same_types, normalize_schema, Year, FINAL_COLUMNS},
    snapshot::{self, NoSnapshots, SnapshotDir, Stage, StageSink},
};

/// Every intermediate table of one year.
#[derive(Debug, Clone)]
pub struct YearStages {
    pub year: Year,
    pub raw_columns: Vec<ColumnSummary>,
    pub aligned: RawTable,
    pub filtered: RawTable,
    pub cylinders: RawTable,
    pub split: RawTable,
    pub clean: RecordBatch,
}

/// Run both years through every cleaning stage, handing each stage's table
/// to `sink` as it is produced. Fails at the first stage whose postcondition
/// does not hold.
#[instrument(level = "info", skip_all)]
pub fn clean_tables<S: StageSink>(
    raw_2008: RawTable,
    raw_2018: RawTable,
    region: &str,
    sink: &mut S,
) -> Result<(YearStages, YearStages)> {
    let summary_08 = summarize_columns(&raw_2008);
    let summary_18 = summarize_columns(&raw_2018);

    let aligned_08 = normalize_schema(raw_2008, Year::Y2008.profile())?;
    sink.raw_stage(Year::Y2008, Stage::Aligned, &aligned_08)?;
    let aligned_18 = normalize_schema(raw_2018, Year::Y2018.profile())?;
    sink.raw_stage(Year::Y2018, Stage::Aligned, &aligned_18)?;
    ensure_aligned(&aligned_08, &aligned_18)?;

    let stages_08 = clean_aligned(Year::Y2008, summary_08, aligned_08, region, sink)?;
    let stages_18 = clean_aligned(Year::Y2018, summary_18, aligned_18, region, sink)?;
    ensure_same_types(
        "2008",
        &stages_08.clean.schema(),
        "2018",
        &stages_18.clean.schema(),
    )?;
    ensure_same_types("2008", &stages_08.clean.schema(), "final columns", &clean_schema())?;

    Ok((stages_08, stages_18))
}

fn clean_aligned<S: StageSink>(
    year: Year,
    raw_columns: Vec<ColumnSummary>,
    aligned: RawTable,
    region: &str,
    sink: &mut S,
) -> Result<YearStages> {
    let profile = year.profile();
    let filtered = filter_and_dedup(aligned.clone(), region)?;
    sink.raw_stage(year, Stage::Filtered, &filtered)?;
    let cylinders = fix_cylinders(filtered.clone(), profile.cylinder_format)?;
    sink.raw_stage(year, Stage::Cylinders, &cylinders)?;
    let split = split_hybrids(cylinders.clone(), profile.split_columns)?;
    sink.raw_stage(year, Stage::Split, &split)?;
    let clean = coerce_table(&split, FINAL_COLUMNS)?;
    sink.clean_stage(year, &clean)?;
    info!(year = %year, rows = clean.num_rows(), "clean");

    Ok(YearStages {
        year,
        raw_columns,
        aligned,
        filtered,
        cylinders,
        split,
        clean,
    })
}

/// Result of a full run.
#[derive(Debug)]
pub struct PipelineOutput {
    pub y2008: YearStages,
    pub y2018: YearStages,
    pub records_2008: Vec<VehicleRecord>,
    pub records_2018: Vec<VehicleRecord>,
    pub merge: MergeOutcome,
    pub report: AnalysisReport,
}

/// Clean both tables, merge them, and answer the fixed questions. No I/O.
pub fn analyze(raw_2008: RawTable, raw_2018: RawTable, region: &str) -> Result<PipelineOutput> {
    analyze_into(raw_2008, raw_2018, region, &mut NoSnapshots)
}

/// `analyze`, with every stage table handed to `sink` as it is produced.
pub fn analyze_into<S: StageSink>(
    raw_2008: RawTable,
    raw_2018: RawTable,
    region: &str,
    sink: &mut S,
) -> Result<PipelineOutput> {
    let (y2008, y2018) = clean_tables(raw_2008, raw_2018, region, sink)?;
    let records_2008 = records_from_batch(&y2008.clean).context("reading 2008 records")?;
    let records_2018 = records_from_batch(&y2018.clean).context("reading 2018 records")?;

    let merge = merge_on_model(&records_2008, &records_2018);
    let report = build_report(
        YearReport::build(Year::Y2008.profile(), y2008.raw_columns.clone(), &records_2008),
        YearReport::build(Year::Y2018.profile(), y2018.raw_columns.clone(), &records_2018),
        &records_2008,
        &records_2018,
        &merge,
    );

    Ok(PipelineOutput {
        y2008,
        y2018,
        records_2008,
        records_2018,
        merge,
        report,
    })
}

/// Persist the merged dataset and the report. Stage snapshots are written by
/// the sink while cleaning runs.
pub fn write_results(out: &PipelineOutput, dir: &SnapshotDir) -> Result<()> {
    snapshot::write_combined_csv(&out.merge.combined, &dir.path(snapshot::COMBINED_FILE))?;
    snapshot::write_json(&out.report, &dir.path(snapshot::REPORT_FILE))?;
    Ok(())
}

/// Load, clean, analyze and write everything named by `cfg`.
#[instrument(level = "info", skip(cfg), fields(out = %cfg.output_dir.display()))]
pub fn run(cfg: &PipelineConfig) -> Result<PipelineOutput> {
    let start = Instant::now();
    let raw_2008 = load_table(&cfg.input_2008, "2008")?;
    let raw_2018 = load_table(&cfg.input_2018, "2018")?;
    info!(rows_2008 = raw_2008.len(), rows_2018 = raw_2018.len(), "loaded");

    let mut dir = SnapshotDir::create(&cfg.output_dir)?;
    let out = analyze_into(raw_2008, raw_2018, &cfg.cert_region, &mut dir)?;
    write_results(&out, &dir)?;

    info!(elapsed = ?start.elapsed(), combined = out.merge.combined.len(), "pipeline complete");
    Ok(out)
}
