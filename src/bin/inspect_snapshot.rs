use anyhow::{Context, Result};
use fuel_economy::{
    analysis::{describe_records, records_from_batch},
    schema::{clean_schema, ensure_same_types},
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};
use prettytable::{format, Cell, Row, Table};
use std::{env, fs::File, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: path to a clean_XX.parquet snapshot.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <CLEAN_PARQUET_FILE>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_snapshot(Path::new(&args[1])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

fn stat(v: Option<f64>) -> String {
    v.map_or_else(|| "-".into(), |v| format!("{:.3}", v))
}

/// Print file metadata, verify the column types, and describe numeric columns.
fn inspect_snapshot(path: &Path) -> Result<()> {
    let meta_reader = SerializedFileReader::new(
        File::open(path).with_context(|| format!("opening {}", path.display()))?,
    )?;
    let file_meta = meta_reader.metadata().file_metadata();
    println!("=== Snapshot: {} ===", path.display());
    println!("Total rows:           {}", file_meta.num_rows());
    println!(
        "Number of row groups: {}",
        meta_reader.metadata().num_row_groups()
    );
    println!("File-size on disk:    {} bytes", std::fs::metadata(path)?.len());

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        ensure_same_types(
            &path.display().to_string(),
            &batch.schema(),
            "clean schema",
            &clean_schema(),
        )?;
        records.extend(records_from_batch(&batch)?);
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.add_row(Row::new(
        ["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]
            .iter()
            .map(|h| Cell::new(h).style_spec("bFg"))
            .collect(),
    ));
    for c in describe_records(&records) {
        let s = &c.stats;
        table.add_row(Row::new(vec![
            Cell::new(&c.column),
            Cell::new(&s.count.to_string()).style_spec("r"),
            Cell::new(&stat(s.mean)).style_spec("r"),
            Cell::new(&stat(s.std)).style_spec("r"),
            Cell::new(&stat(s.min)).style_spec("r"),
            Cell::new(&stat(s.q25)).style_spec("r"),
            Cell::new(&stat(s.median)).style_spec("r"),
            Cell::new(&stat(s.q75)).style_spec("r"),
            Cell::new(&stat(s.max)).style_spec("r"),
        ]));
    }
    println!();
    table.printstd();
    Ok(())
}
