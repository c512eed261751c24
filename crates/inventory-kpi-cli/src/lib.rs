//! `ikpi` command surface.
//!
//! Hosts that embed the pipeline should go through:
//! - [`run_cli`] for a fully parsed command line.
//! - [`run_with_db`] for one [`Command`] against a database path.
//! - [`run_command`] for one [`Command`] against an open [`SqliteRecordStore`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use inventory_kpi_core::{
    check_referential_integrity, parse_date, AvgStockRow, CurrentStockRow, InventoryAgeRow,
    LowInventoryRow, Pipeline, PipelineConfig, PipelineOutput, Product, RankedSalesRow,
    ReferentialViolation, ReorderRow, SalesMonth, SeasonalDemandRow, StockStatusRow, StockoutRow,
    Store, SummaryReportRow, TransactionInput, TurnoverRow,
};
use inventory_kpi_store_sqlite::{SqliteRecordStore, StoreStatus};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "ikpi")]
#[command(about = "Inventory KPI pipeline CLI")]
pub struct Cli {
    #[arg(long, default_value = "./inventory_kpi.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Creates or upgrades the database schema.
    Migrate,
    /// Loads reference data or facts from a JSON array file.
    Ingest {
        #[command(subcommand)]
        command: Box<IngestCommand>,
    },
    /// Shows record counts, the latest seq and the covered date range.
    Status(StatusArgs),
    /// Runs the pipeline and prints a single result set.
    Report(ReportArgs),
    /// Runs the pipeline and prints every result set as JSON.
    Run(RunArgs),
    /// Lists facts that reference unknown stores or products.
    Check(CheckArgs),
}

#[derive(Debug, Subcommand)]
pub enum IngestCommand {
    /// Inserts or replaces stores keyed by `store_id`.
    Stores(IngestArgs),
    /// Inserts or replaces products keyed by `product_id`.
    Products(IngestArgs),
    /// Appends daily facts. The whole file is rejected if any fact is invalid.
    Transactions(IngestArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(long)]
    file: PathBuf,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// JSON file holding a pipeline configuration. Flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    window_days: Option<u32>,
    #[arg(long)]
    lead_time_multiplier: Option<f64>,
    #[arg(long)]
    low_inventory_threshold_ratio: Option<f64>,
    #[arg(long)]
    overstock_threshold: Option<f64>,
    #[arg(long)]
    understock_threshold: Option<f64>,
    /// Last day of the trailing window (YYYY-MM-DD). Defaults to the latest fact date.
    #[arg(long)]
    anchor_date: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(value_enum)]
    kind: ReportKind,
    #[command(flatten)]
    config: ConfigArgs,
    /// Only rows for this sales month (YYYY-MM). ranked-sales only.
    #[arg(long)]
    month: Option<String>,
    /// Only rows ranked at or above N within their store and month. ranked-sales only.
    #[arg(long)]
    top: Option<u32>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Also write the output document to this file.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    CurrentStock,
    LowInventory,
    StockStatus,
    Reorder,
    Turnover,
    Stockout,
    InventoryAge,
    AvgStock,
    Summary,
    RankedSales,
    SeasonalDemand,
}

#[derive(Debug, Serialize)]
struct IngestReport {
    kind: &'static str,
    ingested: usize,
    first_seq: Option<i64>,
    last_seq: Option<i64>,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    healthy: bool,
    transactions_checked: usize,
    violations: &'a [ReferentialViolation],
}

/// Executes the parsed top-level command line.
///
/// # Errors
/// Returns an error when the store cannot be opened or migrated, or the
/// command fails.
pub fn run_cli(cli: Cli) -> Result<()> {
    run_with_db(&cli.db, cli.command)
}

/// Executes one command against the `SQLite` database at `db_path`,
/// migrating it first.
///
/// # Errors
/// Returns an error when store open/migrate fails or the command fails.
pub fn run_with_db(db_path: &Path, command: Command) -> Result<()> {
    let mut store = SqliteRecordStore::open(db_path)?;
    store.migrate()?;
    run_command(command, &mut store)
}

/// Executes one command against an already migrated store handle.
///
/// # Errors
/// Returns an error when ingestion input is invalid, configuration is
/// rejected, a read fails, or `check` finds referential violations.
pub fn run_command(command: Command, store: &mut SqliteRecordStore) -> Result<()> {
    match command {
        Command::Migrate => {
            let status = store.status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::Ingest { command } => run_ingest(*command, store),
        Command::Status(args) => {
            let status = store.status()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
            Ok(())
        }
        Command::Report(args) => run_report(args, store),
        Command::Run(args) => {
            let output = run_pipeline(&args.config, store)?;
            let rendered = serde_json::to_string_pretty(&output)?;
            if let Some(path) = args.output {
                fs::write(&path, &rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "wrote pipeline output");
            }
            println!("{rendered}");
            Ok(())
        }
        Command::Check(args) => run_check(&args, store),
    }
}

fn run_ingest(command: IngestCommand, store: &mut SqliteRecordStore) -> Result<()> {
    let report = match command {
        IngestCommand::Stores(args) => {
            let stores: Vec<Store> = read_json_file(&args.file)?;
            for item in &stores {
                store.upsert_store(item)?;
            }
            IngestReport {
                kind: "stores",
                ingested: stores.len(),
                first_seq: None,
                last_seq: None,
            }
        }
        IngestCommand::Products(args) => {
            let products: Vec<Product> = read_json_file(&args.file)?;
            for item in &products {
                store.upsert_product(item)?;
            }
            IngestReport {
                kind: "products",
                ingested: products.len(),
                first_seq: None,
                last_seq: None,
            }
        }
        IngestCommand::Transactions(args) => {
            let inputs: Vec<TransactionInput> = read_json_file(&args.file)?;
            let appended = store.append_transactions(&inputs)?;
            IngestReport {
                kind: "transactions",
                ingested: appended.len(),
                first_seq: appended.first().map(|fact| fact.seq),
                last_seq: appended.last().map(|fact| fact.seq),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_report(args: ReportArgs, store: &SqliteRecordStore) -> Result<()> {
    let month = args
        .month
        .as_deref()
        .map(SalesMonth::parse)
        .transpose()
        .map_err(|err| anyhow!("invalid --month value: {err}"))?;

    if (month.is_some() || args.top.is_some()) && args.kind != ReportKind::RankedSales {
        return Err(anyhow!(
            "--month and --top only apply to the ranked-sales report"
        ));
    }
    if args.top == Some(0) {
        return Err(anyhow!("--top MUST be >= 1"));
    }

    let output = run_pipeline(&args.config, store)?;

    match args.kind {
        ReportKind::CurrentStock => emit(args.json, &output.current_stock, print_current_stock),
        ReportKind::LowInventory => emit(args.json, &output.low_inventory, print_low_inventory),
        ReportKind::StockStatus => emit(args.json, &output.stock_status, print_stock_status),
        ReportKind::Reorder => emit(args.json, &output.reorder, print_reorder),
        ReportKind::Turnover => emit(args.json, &output.turnover, print_turnover),
        ReportKind::Stockout => emit(args.json, &output.stockout, print_stockout),
        ReportKind::InventoryAge => emit(args.json, &output.inventory_age, print_inventory_age),
        ReportKind::AvgStock => emit(args.json, &output.avg_stock, print_avg_stock),
        ReportKind::Summary => emit(args.json, &output.summary, print_summary),
        ReportKind::RankedSales => {
            let rows = filter_ranked_sales(output.ranked_sales, month, args.top);
            emit(args.json, &rows, print_ranked_sales)
        }
        ReportKind::SeasonalDemand => {
            emit(args.json, &output.seasonal_demand, print_seasonal_demand)
        }
    }
}

fn run_check(args: &CheckArgs, store: &SqliteRecordStore) -> Result<()> {
    let snapshot = store.snapshot()?;
    let violations = check_referential_integrity(&snapshot);

    if args.json {
        let report = CheckReport {
            healthy: violations.is_empty(),
            transactions_checked: snapshot.transactions.len(),
            violations: &violations,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "transactions_checked={} healthy={}",
            snapshot.transactions.len(),
            if violations.is_empty() { "yes" } else { "no" }
        );
        if !violations.is_empty() {
            print_violations(&violations);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(
            "referential check failed: {} transaction(s) reference unknown stores or products",
            violations.len()
        ))
    }
}

fn run_pipeline(args: &ConfigArgs, store: &SqliteRecordStore) -> Result<PipelineOutput> {
    let pipeline = Pipeline::new(resolve_config(args)?)
        .map_err(|err| anyhow!("invalid pipeline configuration: {err}"))?;
    pipeline.run_source(store)
}

fn resolve_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let value: serde_json::Value = read_json_file(path)?;
            PipelineConfig::from_json(&value)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(value) = args.window_days {
        config.window_days = value;
    }
    if let Some(value) = args.lead_time_multiplier {
        config.lead_time_multiplier = value;
    }
    if let Some(value) = args.low_inventory_threshold_ratio {
        config.low_inventory_threshold_ratio = value;
    }
    if let Some(value) = args.overstock_threshold {
        config.overstock_threshold = value;
    }
    if let Some(value) = args.understock_threshold {
        config.understock_threshold = value;
    }
    if let Some(raw) = args.anchor_date.as_deref() {
        let anchor = parse_date(raw).map_err(|err| anyhow!("invalid --anchor-date value: {err}"))?;
        config.anchor_date = Some(anchor);
    }

    Ok(config)
}

fn filter_ranked_sales(
    rows: Vec<RankedSalesRow>,
    month: Option<SalesMonth>,
    top: Option<u32>,
) -> Vec<RankedSalesRow> {
    rows.into_iter()
        .filter(|row| month.map_or(true, |wanted| row.sales_month == wanted))
        .filter(|row| top.map_or(true, |limit| row.rank_in_store_month <= limit))
        .collect()
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn emit<T: Serialize>(json: bool, rows: &[T], print: fn(&[T])) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
    } else {
        print(rows);
    }
    Ok(())
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.2}")
}

fn fmt_opt_f64(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), fmt_f64)
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let render = |cells: &[&str]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end()
            .to_string()
    };

    println!("{}", render(headers));
    println!(
        "{}",
        "-".repeat(widths.iter().sum::<usize>() + widths.len().saturating_sub(1))
    );
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", render(&cells));
    }
    if rows.is_empty() {
        println!("(no rows)");
    }
}

fn print_status(status: &StoreStatus) {
    println!(
        "schema_version={} stores={} products={} transactions={} latest_seq={}",
        status
            .schema_version
            .map_or_else(|| "none".to_string(), |value| value.to_string()),
        status.stores,
        status.products,
        status.transactions,
        status.latest_seq
    );
    println!(
        "first_date={} last_date={}",
        status
            .first_date
            .map_or_else(|| "n/a".to_string(), |date| date.to_string()),
        status
            .last_date
            .map_or_else(|| "n/a".to_string(), |date| date.to_string())
    );
}

fn print_current_stock(rows: &[CurrentStockRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.store_id.to_string(),
                row.product_id.to_string(),
                row.latest_date.to_string(),
                row.inventory_level.to_string(),
            ]
        })
        .collect();
    print_table(
        &["store_id", "product_id", "latest_date", "inventory_level"],
        &cells,
    );
}

fn print_low_inventory(rows: &[LowInventoryRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.store_id.to_string(),
                row.product_id.to_string(),
                row.latest_date.to_string(),
                row.inventory_level.to_string(),
                fmt_f64(row.latest_forecast),
            ]
        })
        .collect();
    print_table(
        &[
            "store_id",
            "product_id",
            "latest_date",
            "inventory_level",
            "latest_forecast",
        ],
        &cells,
    );
}

fn print_stock_status(rows: &[StockStatusRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.store_id.to_string(),
                row.product_id.to_string(),
                row.inventory_level.to_string(),
                fmt_f64(row.latest_forecast),
                row.status.as_str().to_string(),
            ]
        })
        .collect();
    print_table(
        &[
            "store_id",
            "product_id",
            "inventory_level",
            "latest_forecast",
            "status",
        ],
        &cells,
    );
}

fn print_reorder(rows: &[ReorderRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.store_id.to_string(),
                row.product_id.to_string(),
                fmt_f64(row.avg_daily_sales),
                row.max_daily_sales.to_string(),
                fmt_f64(row.reorder_point),
            ]
        })
        .collect();
    print_table(
        &[
            "store_id",
            "product_id",
            "avg_daily_sales",
            "max_daily_sales",
            "reorder_point",
        ],
        &cells,
    );
}

fn print_turnover(rows: &[TurnoverRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.product_id.to_string(),
                row.total_units_sold.to_string(),
                fmt_f64(row.avg_inventory),
                fmt_opt_f64(row.inventory_turnover_ratio),
            ]
        })
        .collect();
    print_table(
        &[
            "product_id",
            "total_units_sold",
            "avg_inventory",
            "inventory_turnover_ratio",
        ],
        &cells,
    );
}

fn print_stockout(rows: &[StockoutRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.store_id.to_string(),
                row.product_id.to_string(),
                row.total_days.to_string(),
                row.stockout_days.to_string(),
                fmt_f64(row.stockout_rate_percent),
            ]
        })
        .collect();
    print_table(
        &[
            "store_id",
            "product_id",
            "total_days",
            "stockout_days",
            "stockout_rate_percent",
        ],
        &cells,
    );
}

fn print_inventory_age(rows: &[InventoryAgeRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.product_id.to_string(),
                fmt_opt_f64(row.avg_inventory_age_days),
            ]
        })
        .collect();
    print_table(&["product_id", "avg_inventory_age_days"], &cells);
}

fn print_avg_stock(rows: &[AvgStockRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.store_id.to_string(),
                row.product_id.to_string(),
                fmt_f64(row.avg_inventory),
            ]
        })
        .collect();
    print_table(&["store_id", "product_id", "avg_inventory"], &cells);
}

fn print_summary(rows: &[SummaryReportRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.store_id.to_string(),
                row.product_id.to_string(),
                fmt_f64(row.stockout_rate_percent),
                fmt_opt_f64(row.avg_inventory_age_days),
                fmt_opt_f64(row.avg_stock_level),
                fmt_opt_f64(row.inventory_turnover_ratio),
                fmt_opt_f64(row.reorder_point),
            ]
        })
        .collect();
    print_table(
        &[
            "store_id",
            "product_id",
            "stockout_rate_percent",
            "avg_inventory_age_days",
            "avg_stock_level",
            "inventory_turnover_ratio",
            "reorder_point",
        ],
        &cells,
    );
}

fn print_ranked_sales(rows: &[RankedSalesRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.store_id.to_string(),
                row.sales_month.to_string(),
                row.rank_in_store_month.to_string(),
                row.product_id.to_string(),
                row.monthly_units_sold.to_string(),
            ]
        })
        .collect();
    print_table(
        &[
            "store_id",
            "sales_month",
            "rank",
            "product_id",
            "monthly_units_sold",
        ],
        &cells,
    );
}

fn print_seasonal_demand(rows: &[SeasonalDemandRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.category.clone(),
                row.month.to_string(),
                row.season.to_string(),
                row.total_units_sold.to_string(),
                fmt_f64(row.avg_forecast),
            ]
        })
        .collect();
    print_table(
        &[
            "category",
            "month",
            "season",
            "total_units_sold",
            "avg_forecast",
        ],
        &cells,
    );
}

fn print_violations(violations: &[ReferentialViolation]) {
    let cells: Vec<Vec<String>> = violations
        .iter()
        .map(|violation| {
            vec![
                violation.kind.as_str().to_string(),
                violation.seq.to_string(),
                violation.date.to_string(),
                violation.store_id.to_string(),
                violation.product_id.to_string(),
            ]
        })
        .collect();
    print_table(&["kind", "seq", "date", "store_id", "product_id"], &cells);
}
