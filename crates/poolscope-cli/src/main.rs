use std::collections::HashMap;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use poolscope_analysis::arb_bound::estimate_arb_bound;
use poolscope_analysis::classify::{classify_events, ClassificationConfig, ClassificationReport};
use poolscope_analysis::frequency::trade_frequency;
use poolscope_analysis::netting::AttributionMode;
use poolscope_data::schema::{EventSchema, ParseStats, PoolVersion};
use poolscope_data::taxonomy::AddressTaxonomy;
use poolscope_data::types::SwapEvent;
use poolscope_sim::engine::{run_for_cost, CostSweepPoint, SimConfig};

#[derive(Parser, Debug)]
#[command(name = "poolscope")]
#[command(about = "DEX volume taxonomy and LVR estimation toolkit")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify swap volume into sandwich/arbitrage/core/other buckets.
    Classify(ClassifyArgs),
    /// Sweep fixed trade costs through the LVR simulation.
    Simulate(SimulateArgs),
    /// Trade-frequency statistics over an event file.
    Frequency(FrequencyArgs),
    /// Upper bound on toxic-arbitrage volume over an event file.
    ArbBound(ArbBoundArgs),
}

#[derive(Args, Debug)]
struct EventInput {
    /// Comma-delimited event records with a header line.
    #[arg(long)]
    events: PathBuf,

    /// Event schema: v2 or v3.
    #[arg(long, default_value = "v2")]
    schema: String,

    /// Only keep events for this pool address.
    #[arg(long)]
    pool: Option<String>,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    #[command(flatten)]
    input: EventInput,

    /// JSON file mapping addresses to labels (router/arb_bot/internal).
    #[arg(long)]
    taxonomy: PathBuf,

    /// Attribution mode: recipient or bot-precedence.
    #[arg(long, default_value = "recipient")]
    attribution: String,

    /// Unknown bilateral volume above this (token0 base units) is flagged.
    #[arg(long, default_value_t = 100_000_000_000)]
    anomaly_threshold: u64,

    /// Token0 decimals used when rendering volumes.
    #[arg(long, default_value_t = 6)]
    decimals: u32,

    /// Also print per-day bucket totals.
    #[arg(long)]
    by_day: bool,

    /// How many anomalies to print.
    #[arg(long, default_value_t = 10)]
    top_anomalies: usize,

    /// Output format: table or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Reference price at tick 0.
    #[arg(long)]
    initial_price: f64,

    /// Total pool value in numeraire units.
    #[arg(long)]
    pool_value: f64,

    /// Per-day volatility of the reference price.
    #[arg(long)]
    sigma_per_day: f64,

    /// Price ticks per day (7200 for 12-second blocks).
    #[arg(long)]
    ticks_per_day: u32,

    /// Horizon in days.
    #[arg(long)]
    days: u32,

    /// Swap fee tier as a fraction, e.g. 0.003.
    #[arg(long)]
    fee_tier: f64,

    /// Fixed per-trade costs to sweep, numeraire units.
    #[arg(long, value_delimiter = ',', required = true)]
    costs: Vec<f64>,

    /// Monte-Carlo paths per cost.
    #[arg(long)]
    paths: u32,

    /// Run seed.
    #[arg(long)]
    seed: u64,

    /// Output format: table or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct FrequencyArgs {
    #[command(flatten)]
    input: EventInput,

    /// Output format: table or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct ArbBoundArgs {
    #[command(flatten)]
    input: EventInput,

    /// Token0 decimals used when rendering volumes.
    #[arg(long, default_value_t = 6)]
    decimals: u32,

    /// Output format: table or json.
    #[arg(long, default_value = "table")]
    output: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Classify(args) => handle_classify(args),
        Commands::Simulate(args) => handle_simulate(args),
        Commands::Frequency(args) => handle_frequency(args),
        Commands::ArbBound(args) => handle_arb_bound(args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn parse_version(raw: &str) -> Result<PoolVersion> {
    match raw.to_lowercase().as_str() {
        "v2" | "2" => Ok(PoolVersion::V2),
        "v3" | "3" => Ok(PoolVersion::V3),
        other => Err(eyre!("unknown schema '{other}'; use 'v2' or 'v3'")),
    }
}

fn parse_attribution(raw: &str) -> Result<AttributionMode> {
    match raw.to_lowercase().as_str() {
        "recipient" => Ok(AttributionMode::Recipient),
        "bot-precedence" => Ok(AttributionMode::BotPrecedence),
        other => Err(eyre!(
            "unknown attribution mode '{other}'; use 'recipient' or 'bot-precedence'"
        )),
    }
}

/// Materializes event rows for the core pipeline.
///
/// The first non-empty line must be the header; a missing required column
/// fails fast, malformed rows are skipped and counted.
fn load_events(input: &EventInput) -> Result<(Vec<SwapEvent>, ParseStats)> {
    let version = parse_version(&input.schema)?;
    let pool_filter = input
        .pool
        .as_deref()
        .map(|raw| {
            raw.parse::<Address>()
                .map_err(|error| eyre!("invalid pool address '{raw}': {error}"))
        })
        .transpose()?;

    let text = std::fs::read_to_string(&input.events)
        .wrap_err_with(|| format!("failed to read event file {}", input.events.display()))?;
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| eyre!("event file {} is empty", input.events.display()))?;

    let schema = EventSchema::from_header(version, header)?;
    let (events, stats) = schema.parse_records(lines, pool_filter);

    info!(
        parsed = stats.parsed,
        skipped = stats.skipped,
        filtered = stats.filtered,
        file = %input.events.display(),
        "event file loaded"
    );
    if stats.skipped > 0 {
        warn!(
            skipped = stats.skipped,
            "malformed rows were skipped; see debug log for details"
        );
    }

    Ok((events, stats))
}

fn load_taxonomy(path: &Path) -> Result<AddressTaxonomy> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read taxonomy file {}", path.display()))?;
    let labels: HashMap<String, String> =
        serde_json::from_str(&text).wrap_err("taxonomy file is not a {address: label} JSON map")?;
    let taxonomy = AddressTaxonomy::from_labels(&labels)?;
    info!(addresses = taxonomy.len(), "taxonomy loaded");
    Ok(taxonomy)
}

fn scale_volume(volume: u128, decimals: u32) -> f64 {
    volume as f64 / 10f64.powi(decimals as i32)
}

fn handle_classify(args: ClassifyArgs) -> Result<()> {
    let (events, stats) = load_events(&args.input)?;
    let taxonomy = load_taxonomy(&args.taxonomy)?;
    let config = ClassificationConfig {
        attribution: parse_attribution(&args.attribution)?,
        anomaly_threshold: args.anomaly_threshold as u128,
    };

    let report = classify_events(&events, &taxonomy, &config)?;

    match args.output.to_lowercase().as_str() {
        "table" => print_classify_table(&report, &args),
        "json" => print_classify_json(&report, &stats, &args)?,
        other => return Err(eyre!("unknown output format '{other}'; use 'table' or 'json'")),
    }

    info!(
        blocks = report.blocks,
        anomalies = report.anomalies.len(),
        "classify command completed"
    );
    Ok(())
}

fn print_classify_table(report: &ClassificationReport, args: &ClassifyArgs) {
    let decimals = args.decimals;
    let total = report.totals.total();
    let share = |volume: u128| -> String {
        if total == 0 {
            "0.00%".to_string()
        } else {
            format!("{:.2}%", volume as f64 / total as f64 * 100.0)
        }
    };

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Bucket", "Volume (token0)", "Share"]);
    table.add_row(vec![
        "Core".to_string(),
        format!("{:.2}", scale_volume(report.totals.core, decimals)),
        share(report.totals.core),
    ]);
    table.add_row(vec![
        "Arbitrage".to_string(),
        format!("{:.2}", scale_volume(report.totals.arbitrage, decimals)),
        share(report.totals.arbitrage),
    ]);
    table.add_row(vec![
        "Sandwich".to_string(),
        format!("{:.2}", scale_volume(report.totals.sandwich, decimals)),
        share(report.totals.sandwich),
    ]);
    table.add_row(vec![
        "Other".to_string(),
        format!("{:.2}", scale_volume(report.totals.other, decimals)),
        share(report.totals.other),
    ]);
    println!("{}\n", table);

    if args.by_day {
        let mut daily = Table::new();
        daily.load_preset(UTF8_BORDERS_ONLY);
        daily.set_header(vec!["Day", "Core", "Arbitrage", "Sandwich", "Other"]);
        for (day, buckets) in &report.daily {
            daily.add_row(vec![
                day.to_string(),
                format!("{:.2}", scale_volume(buckets.core, decimals)),
                format!("{:.2}", scale_volume(buckets.arbitrage, decimals)),
                format!("{:.2}", scale_volume(buckets.sandwich, decimals)),
                format!("{:.2}", scale_volume(buckets.other, decimals)),
            ]);
        }
        println!("{}\n", daily);
    }

    println!("Blocks classified: {}", report.blocks);
    if report.attribution_conflicts > 0 {
        println!(
            "Attribution conflicts (bot sender vs router recipient): {}",
            report.attribution_conflicts
        );
    }

    if !report.anomalies.is_empty() {
        println!("Top unclassified addresses for taxonomy curation:");
        for anomaly in report.anomalies.iter().take(args.top_anomalies) {
            println!(
                "  {:#x}  volume={:.2}  occurrences={}",
                anomaly.address,
                scale_volume(anomaly.volume, decimals),
                anomaly.occurrences
            );
        }
    }
}

fn print_classify_json(
    report: &ClassificationReport,
    stats: &ParseStats,
    args: &ClassifyArgs,
) -> Result<()> {
    let daily: Vec<serde_json::Value> = report
        .daily
        .iter()
        .map(|(day, buckets)| {
            serde_json::json!({
                "day": day.to_string(),
                "buckets": buckets,
            })
        })
        .collect();

    let body = serde_json::json!({
        "totals": report.totals,
        "blocks": report.blocks,
        "daily": daily,
        "anomalies": report.anomalies.iter().take(args.top_anomalies).collect::<Vec<_>>(),
        "attribution_conflicts": report.attribution_conflicts,
        "rows_skipped": stats.skipped,
        "rows_filtered": stats.filtered,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<()> {
    let config = SimConfig {
        initial_price: args.initial_price,
        pool_value: args.pool_value,
        sigma_per_day: args.sigma_per_day,
        ticks_per_day: args.ticks_per_day,
        horizon_days: args.days,
        fee_tier: args.fee_tier,
        trade_costs: args.costs.clone(),
        num_paths: args.paths,
        seed: args.seed,
    };
    config.validate()?;

    let pb = ProgressBar::new(config.trade_costs.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30}] {pos}/{len} {msg}")
            .wrap_err("failed to create progress style")?,
    );
    pb.set_message("sweeping trade costs");

    let mut points = Vec::with_capacity(config.trade_costs.len());
    for &cost in &config.trade_costs {
        points.push(run_for_cost(&config, cost));
        pb.inc(1);
    }
    pb.finish_and_clear();

    match args.output.to_lowercase().as_str() {
        "table" => print_sweep_table(&points, &config),
        "json" => print_sweep_json(&points, &config)?,
        other => return Err(eyre!("unknown output format '{other}'; use 'table' or 'json'")),
    }

    info!(
        costs = config.trade_costs.len(),
        paths = config.num_paths,
        seed = config.seed,
        "simulate command completed"
    );
    Ok(())
}

/// Annualization factor: per-horizon normalized numbers to APR percent.
fn apr_coeff(horizon_days: u32) -> f64 {
    365.0 / horizon_days as f64 * 100.0
}

fn print_sweep_table(points: &[CostSweepPoint], config: &SimConfig) {
    let coeff = apr_coeff(config.horizon_days);

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Trade Cost",
        "LVR APR",
        "Fee APR",
        "Recapture",
        "Trades/Tick",
    ]);
    for point in points {
        let recapture = if point.mean_lvr > 0.0 {
            format!("{:.2}%", point.mean_fees / point.mean_lvr * 100.0)
        } else {
            "-".to_string()
        };
        table.add_row(vec![
            format!("{}", point.trade_cost),
            format!("{:.3}%", point.mean_lvr * coeff),
            format!("{:.3}%", point.mean_fees * coeff),
            recapture,
            format!("{:.4}", point.mean_trades_per_tick),
        ]);
    }
    println!("{}\n", table);

    // Analytic zero-fee benchmark for context: LVR = sigma^2 / 8 per day.
    let predicted = config.sigma_per_day * config.sigma_per_day / 8.0 * 365.0 * 100.0;
    println!(
        "Predicted frictionless LVR: {:.3}% APR (sigma={}/day, fee tier {:.2}%)",
        predicted,
        config.sigma_per_day,
        config.fee_tier * 100.0
    );
}

fn print_sweep_json(points: &[CostSweepPoint], config: &SimConfig) -> Result<()> {
    let coeff = apr_coeff(config.horizon_days);
    let rows: Vec<serde_json::Value> = points
        .iter()
        .map(|point| {
            serde_json::json!({
                "trade_cost": point.trade_cost,
                "mean_lvr": point.mean_lvr,
                "mean_fees": point.mean_fees,
                "mean_trades_per_tick": point.mean_trades_per_tick,
                "lvr_apr_pct": point.mean_lvr * coeff,
                "fee_apr_pct": point.mean_fees * coeff,
            })
        })
        .collect();

    let body = serde_json::json!({
        "seed": config.seed,
        "paths": config.num_paths,
        "fee_tier": config.fee_tier,
        "sweep": rows,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn handle_frequency(args: FrequencyArgs) -> Result<()> {
    let (events, _) = load_events(&args.input)?;
    let stats = trade_frequency(&events)?;

    match args.output.to_lowercase().as_str() {
        "table" => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Metric", "Value"]);
            table.add_row(vec!["Blocks covered".to_string(), stats.blocks_covered.to_string()]);
            table.add_row(vec![
                "Trades/block (mean)".to_string(),
                format!("{:.2}", stats.mean_trades_per_block),
            ]);
            table.add_row(vec![
                "Trades/block (median)".to_string(),
                stats.median_trades_per_block.to_string(),
            ]);
            table.add_row(vec![
                "Trades/block (std)".to_string(),
                format!("{:.2}", stats.std_trades_per_block),
            ]);
            table.add_row(vec![
                "Blocks with trades".to_string(),
                format!("{:.2}%", stats.traded_block_share * 100.0),
            ]);
            table.add_row(vec!["Gap (mean)".to_string(), format!("{:.2}", stats.mean_gap)]);
            table.add_row(vec!["Gap (median)".to_string(), stats.median_gap.to_string()]);
            table.add_row(vec!["Gap (std)".to_string(), format!("{:.2}", stats.std_gap)]);
            println!("{}", table);
        }
        "json" => {
            let body = serde_json::json!({
                "blocks_covered": stats.blocks_covered,
                "mean_trades_per_block": stats.mean_trades_per_block,
                "median_trades_per_block": stats.median_trades_per_block,
                "std_trades_per_block": stats.std_trades_per_block,
                "traded_block_share": stats.traded_block_share,
                "mean_gap": stats.mean_gap,
                "median_gap": stats.median_gap,
                "std_gap": stats.std_gap,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        other => return Err(eyre!("unknown output format '{other}'; use 'table' or 'json'")),
    }

    info!(blocks = stats.blocks_covered, "frequency command completed");
    Ok(())
}

fn handle_arb_bound(args: ArbBoundArgs) -> Result<()> {
    let (events, _) = load_events(&args.input)?;
    let bound = estimate_arb_bound(&events)?;

    match args.output.to_lowercase().as_str() {
        "table" => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Metric", "Value"]);
            table.add_row(vec![
                "Total token0 volume".to_string(),
                format!("{:.2}", scale_volume(bound.total_volume, args.decimals)),
            ]);
            table.add_row(vec![
                "Arb volume bound".to_string(),
                format!("{:.2}", scale_volume(bound.bound_volume, args.decimals)),
            ]);
            table.add_row(vec![
                "Bound proportion".to_string(),
                format!("{:.2}%", bound.proportion() * 100.0),
            ]);
            println!("{}", table);
        }
        "json" => {
            let body = serde_json::json!({
                "total_volume": bound.total_volume,
                "bound_volume": bound.bound_volume,
                "proportion": bound.proportion(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        other => return Err(eyre!("unknown output format '{other}'; use 'table' or 'json'")),
    }

    info!(
        total_volume = bound.total_volume as f64,
        bound_volume = bound.bound_volume as f64,
        "arb-bound command completed"
    );
    Ok(())
}
