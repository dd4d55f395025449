// src/process/mod.rs
pub mod convert;
pub mod filter;
pub mod raw_table;
pub mod split;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::{debug, warn};

pub use raw_table::{Cell, RawTable, COMPOUND_SEPARATOR};

/// Read one raw fuel-economy CSV (header row + data rows) into a `RawTable`.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_table<P: AsRef<Path>>(path: P, name: &str) -> Result<RawTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path.as_ref()))?;
    read_table(BufReader::new(file), name)
        .with_context(|| format!("Failed to load {:?}", path.as_ref()))
}

/// Parse CSV text from any reader. Short records are padded with nulls so
/// every row has one cell per header.
pub fn read_table<R: Read>(reader: R, name: &str) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = RawTable::new(name, headers);
    let width = table.headers.len();

    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error in {} at record {}", name, idx))?;
        if record.len() > width {
            warn!(table = name, record = idx, fields = record.len(), width, "extra fields ignored");
        }
        let mut row: Vec<Option<Cell>> = record.iter().take(width).map(Cell::parse).collect();
        row.resize(width, None);
        table.rows.push(row);
    }

    debug!(table = name, rows = table.len(), columns = width, "loaded");
    Ok(table)
}

/// Non-null and distinct-value counts for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub non_null: usize,
    pub unique: usize,
}

/// Per-column counts used to assess a raw table before cleaning.
pub fn summarize_columns(table: &RawTable) -> Vec<ColumnSummary> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let mut distinct = HashSet::new();
            let mut non_null = 0;
            for cell in table.rows.iter().filter_map(|r| r[i].as_ref()) {
                non_null += 1;
                distinct.insert(cell);
            }
            ColumnSummary {
                column: h.clone(),
                non_null,
                unique: distinct.len(),
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    pub(crate) fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,fuel_economy=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn test_load_table_example() -> Result<()> {
        init_test_logging();
        let content = r#"Model,Displ,Cyl,Trans,Drive,Fuel,Sales Area,Stnd,Underhood ID,Veh Class,Air Pollution Score,FE Calc Appr,City MPG,Hwy MPG,Cmb MPG,Unadj Cmb MPG,Greenhouse Gas Score,SmartWay
ACURA MDX,3.7,(6 cyl),Auto-S5,4WD,Gasoline,CA,U2,8HNXT03.7PKR,SUV,7,Drv,15,20,17,22.0527,4,no
CHEVROLET Tahoe,5.3,(8 cyl),Auto-L4,4WD,ethanol/gas,CA,B5,8GMXT05.3397,SUV,6/4,Drv,11/14,15/19,12/16,17.0,6/4,no
AUDI A3,2.0,(4 cyl),Man-6,2WD,Gasoline,FA,B5,8ADXV02.0362,,6,Drv,,29,25,30.8,7,no
"#;
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(content.as_bytes())?;

        let table = load_table(tmp.path(), "2008")?;
        assert_eq!(table.headers.len(), 18);
        assert_eq!(table.headers[6], "Sales Area");
        assert_eq!(table.len(), 3);

        let fuel = table.column_index("Fuel")?;
        assert_eq!(
            table.rows[1][fuel],
            Some(Cell::Compound("ethanol".into(), "gas".into()))
        );
        let class = table.column_index("Veh Class")?;
        assert_eq!(table.rows[2][class], None);
        Ok(())
    }

    #[test]
    fn short_records_are_padded_with_nulls() -> Result<()> {
        let table = read_table("a,b,c\n1,2\n".as_bytes(), "t")?;
        assert_eq!(table.rows[0], vec![Cell::parse("1"), Cell::parse("2"), None]);
        Ok(())
    }

    #[test]
    fn summarize_counts_non_null_and_unique() -> Result<()> {
        let table = read_table("fuel,cyl\nGas,4\nGas,\nCNG,6\n".as_bytes(), "t")?;
        let summary = summarize_columns(&table);
        assert_eq!(
            summary[0],
            ColumnSummary {
                column: "fuel".into(),
                non_null: 3,
                unique: 2
            }
        );
        assert_eq!(summary[1].non_null, 2);
        assert_eq!(summary[1].unique, 2);
        Ok(())
    }
}
