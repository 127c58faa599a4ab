//! zomato_eda CLI entry point.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use zomato_eda::charts::{render_all, write_gallery};
use zomato_eda::cli::{write_json, write_query, write_report, Cli, Command, Inputs, QueryArgs, ReportArgs};
use zomato_eda::{Analysis, AnalysisConfig};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.load_config().context("Failed to load configuration")?;

    match &cli.command {
        Command::Report(args) => report(args, config),
        Command::Query(args) => query(args, config),
    }
}

fn prepare(inputs: &Inputs, mut config: AnalysisConfig) -> Result<(Analysis, AnalysisConfig)> {
    inputs.apply(&mut config)?;
    let analysis = Analysis::load(&inputs.listings, &inputs.countries, &config).with_context(|| {
        format!(
            "Failed to prepare {} and {}",
            inputs.listings.display(),
            inputs.countries.display()
        )
    })?;
    Ok((analysis, config))
}

fn report(args: &ReportArgs, config: AnalysisConfig) -> Result<()> {
    let (analysis, mut config) = prepare(&args.inputs, config)?;
    if let Some(format) = args.format {
        config.charts.format = format;
    }

    let report = analysis.report()?;
    let mut stdout = io::stdout().lock();
    if args.json {
        write_json(&report, &mut stdout)?;
    } else {
        write_report(&report, &mut stdout)?;
    }
    stdout.flush()?;

    if args.no_charts {
        return Ok(());
    }

    let charts = analysis.chart_plan()?;
    let rendered = render_all(&charts, &args.out, &config.charts)
        .with_context(|| format!("Failed to render charts into {}", args.out.display()))?;
    let index = write_gallery(&args.out, &rendered)?;
    info!(index = %index.display(), "Gallery written");
    eprintln!("Wrote {} charts to {}", rendered.len(), args.out.display());

    if args.open {
        if let Err(e) = open::that(&index) {
            warn!(error = %e, "Could not open the gallery");
        }
    }
    Ok(())
}

fn query(args: &QueryArgs, config: AnalysisConfig) -> Result<()> {
    let (analysis, _) = prepare(&args.inputs, config)?;
    let result = analysis.query(&args.to_query())?;

    let mut stdout = io::stdout().lock();
    if args.json {
        write_json(&result, &mut stdout)?;
    } else {
        write_query(&result, &mut stdout)?;
    }
    stdout.flush()?;
    Ok(())
}
