use anyhow::Result;
use fuel_economy::{analysis::AnalysisReport, config::PipelineConfig, pipeline};
use prettytable::{format, Cell, Row, Table};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn print_summary(report: &AnalysisReport) {
    println!("\n--- Alternative fuel models ---");
    println!(
        "2008: {}  2018: {}  change: {:+}",
        report.y2008.alternative_fuel_models,
        report.y2018.alternative_fuel_models,
        report.alternative_fuel_increase
    );

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.add_row(Row::new(vec![
        Cell::new("Vehicle Class").style_spec("bFg"),
        Cell::new("cmb_mpg 2008").style_spec("bFg"),
        Cell::new("cmb_mpg 2018").style_spec("bFg"),
        Cell::new("Change").style_spec("bFg"),
    ]));
    for c in &report.class_mpg {
        table.add_row(Row::new(vec![
            Cell::new(&c.veh_class),
            Cell::new(&fmt_opt(c.mean_2008)).style_spec("r"),
            Cell::new(&fmt_opt(c.mean_2018)).style_spec("r"),
            Cell::new(&fmt_opt(c.change)).style_spec("r"),
        ]));
    }
    println!("\n--- Combined mpg by vehicle class ---");
    table.printstd();

    println!("\n--- Models produced in both years ---");
    println!(
        "{} models compared, {} only in 2008, {} only in 2018",
        report.merge.changes.len(),
        report.merge.models_only_2008.len(),
        report.merge.models_only_2018.len()
    );
    if let Some(best) = &report.merge.max_improvement {
        println!(
            "Most improved: {} ({:.2} → {:.2}, {:+.2} mpg)",
            best.model, best.cmb_mpg_2008, best.cmb_mpg_2018, best.mpg_change
        );
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) resolve inputs and output dir ────────────────────────────
    let cfg = PipelineConfig::resolve(std::env::args().skip(1))?;
    info!(
        input_2008 = %cfg.input_2008.display(),
        input_2018 = %cfg.input_2018.display(),
        region = %cfg.cert_region,
        "configured"
    );

    // ─── 3) clean, analyze, write snapshots ──────────────────────────
    let out = pipeline::run(&cfg)?;

    // ─── 4) summary ──────────────────────────────────────────────────
    print_summary(&out.report);

    info!("all done");
    Ok(())
}
