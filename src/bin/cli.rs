use anyhow::Context;
use clap::{Parser, Subcommand, Args, ValueEnum};
use medcat::prelude::*;
use medcat::analytics::print_sample;
use medcat::config::parse_delimiter;
use medcat::constants::CURRENCY;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medcat")]
#[command(version, about = "CNSS medication catalog builder - convert, inspect, and search medication reference data", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "MEDCAT_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a reference spreadsheet into a CNSS catalog
    Convert(ConvertArgs),
    /// Show summary statistics for an existing catalog
    Stats(StatsArgs),
    /// Search a catalog by medication name or DCI
    Search(SearchArgs),
    /// Show one catalog record by id
    Show(ShowArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Source spreadsheet (.csv, or .xlsx/.xls/.ods with the excel feature)
    source: PathBuf,
    /// Output catalog path
    #[arg(short, long)]
    output: PathBuf,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatOpt>,
    /// Write the JSON array without indentation
    #[arg(long)]
    compact: bool,
    /// CSV field delimiter (a single character, or "tab")
    #[arg(long)]
    delimiter: Option<String>,
    /// Worksheet index for workbook sources
    #[arg(long)]
    sheet: Option<usize>,
    /// Number of sample records printed after the summary
    #[arg(long)]
    sample: Option<usize>,
    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
    /// Transform rows on a single thread
    #[arg(long)]
    sequential: bool,
}

#[derive(Args)]
struct StatsArgs {
    /// Catalog produced by `medcat convert`
    catalog: PathBuf,
    /// Number of sample records to list
    #[arg(long)]
    sample: Option<usize>,
}

#[derive(Args)]
struct SearchArgs {
    /// Catalog produced by `medcat convert`
    catalog: PathBuf,
    /// Text to look for in names and DCIs (case-insensitive)
    query: String,
    /// Limit number of results
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct ShowArgs {
    /// Catalog produced by `medcat convert`
    catalog: PathBuf,
    /// Record id (1-based source row)
    id: usize,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum FormatOpt {
    Json,
    JsonLines,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Convert(args) => cmd_convert(args, config),
        Commands::Stats(args) => cmd_stats(args, config),
        Commands::Search(args) => cmd_search(args, config),
        Commands::Show(args) => cmd_show(args),
    });

    if let Err(e) = result {
        match e.downcast_ref::<MedcatError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<MedcatConfig> {
    match path {
        Some(path) => MedcatConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(MedcatConfig::load()),
    }
}

fn cmd_convert(args: ConvertArgs, config: MedcatConfig) -> anyhow::Result<()> {
    let mut builder = ConfigBuilder::from_config(config);
    if let Some(format) = args.format {
        builder = builder.export_format(match format {
            FormatOpt::Json => ExportFormat::Json,
            FormatOpt::JsonLines => ExportFormat::JsonLines,
        });
    }
    if args.compact {
        builder = builder.pretty_print(false);
    }
    if let Some(delimiter) = args.delimiter.as_deref() {
        builder = builder.csv_delimiter(parse_delimiter(delimiter)?);
    }
    if let Some(sheet) = args.sheet {
        builder = builder.sheet_index(sheet);
    }
    if let Some(sample) = args.sample {
        builder = builder.sample_size(sample);
    }
    if args.no_progress {
        builder = builder.progress_bar(false);
    }
    if args.sequential {
        builder = builder.parallel(false);
    }
    let config = builder.build();

    let report = PipelineBuilder::new()
        .source(&args.source)
        .output(&args.output)
        .config(config.clone())
        .run()?;

    report.print_summary(config.sample_size);
    log::info!("Conversion finished in {:.2}s", report.elapsed.as_secs_f64());
    Ok(())
}

fn cmd_stats(args: StatsArgs, config: MedcatConfig) -> anyhow::Result<()> {
    let catalog = Catalog::load(&args.catalog)?;
    CatalogStats::from_records(&catalog.records, 0).print_summary();
    print_sample(&catalog.records, args.sample.unwrap_or(config.sample_size));
    Ok(())
}

fn cmd_search(args: SearchArgs, config: MedcatConfig) -> anyhow::Result<()> {
    let catalog = Catalog::load(&args.catalog)?;
    let results = catalog.search(&args.query, args.limit.unwrap_or(config.search_limit));

    for record in &results {
        println!("{}", record_line(record));
    }
    println!("Total matches: {}", results.len());
    Ok(())
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let catalog = Catalog::load(&args.catalog)?;
    let record = catalog
        .get(args.id)
        .with_context(|| format!("No record with id {} in {}", args.id, args.catalog.display()))?;

    println!("{}", record_line(record));
    println!(
        "  base price {:.2} {} | reimbursed {:.2} {} | CNOPS rate {}%",
        record.base_reimbursement_price,
        CURRENCY,
        record.reimbursement_amount,
        CURRENCY,
        record.reference_rate,
    );
    Ok(())
}

fn record_line(record: &MedicationRecord) -> String {
    format!(
        "{} | {} | {} | PPV {:.2} {} | {} | patient pays {:.2} {}",
        record.sequence_id,
        record.display_line(),
        record.product_kind,
        record.public_price,
        CURRENCY,
        record.derived_rate,
        record.patient_share,
        CURRENCY,
    )
}
