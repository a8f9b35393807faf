// orderdesk - order tracking over a shared Google Sheet

mod config;
mod exit_codes;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use orderdesk_engine::{
    mutation, normalize, orders, payouts, Catalog, CreateOrderRequest, MarkFulfilledRequest,
    OrderAggregate, OrderLine,
};
use orderdesk_sheets::{AppsScriptClient, MutationOutcome, SheetsClient, SheetsError};

use config::DeskConfig;
use exit_codes::{
    EXIT_CONFIG_MISSING, EXIT_FETCH_API, EXIT_FETCH_NETWORK, EXIT_MUTATE_INVALID,
    EXIT_MUTATE_NETWORK, EXIT_MUTATE_REJECTED, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "orderdesk")]
#[command(about = "Order tracking and payout reconciliation over a shared Google Sheet")]
#[command(version)]
struct Cli {
    /// Spreadsheet ID (the long token in the sheet URL)
    #[arg(long, global = true, env = "ORDERDESK_SHEET_ID")]
    sheet_id: Option<String>,

    /// Google Sheets API key for v4 reads (omit to use the public export)
    #[arg(long, global = true, env = "ORDERDESK_API_KEY")]
    api_key: Option<String>,

    /// Apps Script webhook URL for mutations
    #[arg(long, global = true, env = "ORDERDESK_SCRIPT_URL")]
    script_url: Option<String>,

    /// Config file path (default: orderdesk/orderdesk.toml in the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (debug level; RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List orders from the tracker
    #[command(after_help = "\
Examples:
  orderdesk orders
  orderdesk orders --view completed
  orderdesk orders --view all --json | jq '.[].order_id'")]
    Orders {
        /// Which view of the order book to show
        #[arg(long, value_enum, default_value = "to-fulfill")]
        view: OrderView,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Summarize monthly settlement payouts
    #[command(after_help = "\
Months after the reference month are excluded (the settlement sheet
carries projected rows for future months).

Examples:
  orderdesk payouts
  orderdesk payouts --as-of 2024-01-15
  orderdesk payouts --json")]
    Payouts {
        /// Reference date (YYYY-MM-DD, default: today)
        #[arg(long, value_name = "DATE")]
        as_of: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Append a new order via the webhook
    #[command(after_help = "\
Each --line is SKU:QTY or SKU:QTY:REVENUE. When --total is omitted the
order total is the sum of line revenues.

Examples:
  orderdesk create-order '#1042' --line WB-6:2:24.00 --line WB-12:1:22.50
  orderdesk create-order '#1043' --date 07/03/2024 --line WB-6:1 --total 12.00")]
    CreateOrder {
        /// Order ID as it should appear in the sheet
        order_id: String,

        /// Order date (default: today, recorded as DD/MM/YYYY)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,

        /// Line item, SKU:QTY[:REVENUE]. Repeatable.
        #[arg(long = "line", value_name = "SPEC", required = true)]
        lines: Vec<String>,

        /// Fulfilment partner (default: CHATHAM)
        #[arg(long)]
        partner: Option<String>,

        /// Explicit order total (default: sum of line revenues)
        #[arg(long)]
        total: Option<f64>,
    },

    /// Stamp an order's rows as fulfilled via the webhook
    #[command(after_help = "\
Examples:
  orderdesk mark-fulfilled '#1042'
  orderdesk mark-fulfilled '#1042' --date 09/03/2024")]
    MarkFulfilled {
        /// Order ID to stamp
        order_id: String,

        /// Fulfilment date (default: today, recorded as DD/MM/YYYY)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrderView {
    /// Rows with an order date and no fulfilment date
    ToFulfill,
    /// Rows with a fulfilment date, newest first
    Completed,
    /// Everything, newest order first
    All,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = DeskConfig::resolve(
        cli.config.as_deref(),
        cli.sheet_id,
        cli.api_key,
        cli.script_url,
    )?;

    match cli.command {
        Commands::Orders { view, json } => cmd_orders(&config, view, json),
        Commands::Payouts { as_of, json } => cmd_payouts(&config, as_of, json),
        Commands::CreateOrder {
            order_id,
            date,
            lines,
            partner,
            total,
        } => cmd_create_order(&config, &order_id, date, &lines, partner, total),
        Commands::MarkFulfilled { order_id, date } => {
            cmd_mark_fulfilled(&config, &order_id, date)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Create error from a sheet read failure with proper exit code.
    pub fn fetch(err: SheetsError) -> Self {
        let code = match &err {
            SheetsError::Network(_) => EXIT_FETCH_NETWORK,
            SheetsError::NotConfigured(_) => EXIT_CONFIG_MISSING,
            _ => EXIT_FETCH_API,
        };
        let hint = match &err {
            SheetsError::Http(403, _) | SheetsError::Api(_) => {
                Some("is the sheet shared (anyone with the link can view)?".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// orders
// ============================================================================

fn cmd_orders(config: &DeskConfig, view: OrderView, json: bool) -> Result<(), CliError> {
    let client = SheetsClient::new(&config.sheet_id, config.api_key.as_deref())
        .map_err(CliError::fetch)?;

    let rows = client
        .fetch_rows(&config.tabs.orders)
        .map_err(|e| CliError::fetch(e).with_hint("check sheet_id and the orders tab name"))?;
    let catalog = load_catalog(&client, &config.tabs.setup);

    let partitions = orders::partition(&rows, &catalog);
    let selected = match view {
        OrderView::ToFulfill => partitions.to_fulfill,
        OrderView::Completed => partitions.completed,
        OrderView::All => partitions.all,
    };

    if json {
        print_json(&selected)?;
        return Ok(());
    }

    if selected.is_empty() {
        println!("no orders");
        return Ok(());
    }

    let show_fulfilled = view != OrderView::ToFulfill;
    let mut table = Table::new(if show_fulfilled {
        vec!["ORDER", "DATE", "FULFILLED", "ITEMS", "QTY"]
    } else {
        vec!["ORDER", "DATE", "ITEMS", "QTY"]
    });
    for order in &selected {
        let mut row = vec![order.order_id.clone(), order.order_date.clone()];
        if show_fulfilled {
            row.push(order.fulfilled_date.clone());
        }
        row.push(items_summary(order));
        row.push(format_quantity(order.total_quantity));
        table.row(row);
    }
    table.print();
    Ok(())
}

/// A missing or broken setup tab degrades to an empty catalog; orders are
/// still listed, just with unresolved product names.
fn load_catalog(client: &SheetsClient, setup_tab: &str) -> Catalog {
    match client.fetch_grid(setup_tab) {
        Ok(rows) => Catalog::build(&rows),
        Err(err) => {
            log::warn!("could not read setup tab {setup_tab:?}: {err}; product names will be unresolved");
            Catalog::default()
        }
    }
}

fn items_summary(order: &OrderAggregate) -> String {
    order
        .items
        .iter()
        .map(|item| format!("{}×{}", format_quantity(item.quantity), item.name))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// payouts
// ============================================================================

fn cmd_payouts(config: &DeskConfig, as_of: Option<String>, json: bool) -> Result<(), CliError> {
    let reference_date = match as_of {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
            CliError::args(format!("invalid --as-of date: {s:?}"))
                .with_hint("use YYYY-MM-DD, e.g. --as-of 2024-01-15")
        })?,
        None => chrono::Local::now().date_naive(),
    };

    let client = SheetsClient::new(&config.sheet_id, config.api_key.as_deref())
        .map_err(CliError::fetch)?;
    let rows = client
        .fetch_rows(&config.tabs.settlement)
        .map_err(|e| CliError::fetch(e).with_hint("check sheet_id and the settlement tab name"))?;

    let summaries = payouts::aggregate(&rows, reference_date);

    if json {
        print_json(&summaries)?;
        return Ok(());
    }

    if summaries.is_empty() {
        println!("no settled months");
        return Ok(());
    }

    let mut table = Table::new(vec!["MONTH", "PACKS", "PAYOUT"]);
    let mut total = 0.0;
    for summary in &summaries {
        total += summary.total_payout;
        table.row(vec![
            summary.month.clone(),
            format_quantity(summary.total_packs),
            format!("£{:.2}", summary.total_payout),
        ]);
    }
    table.row(vec![
        "TOTAL".to_string(),
        String::new(),
        format!("£{total:.2}"),
    ]);
    table.print();
    Ok(())
}

// ============================================================================
// create-order / mark-fulfilled
// ============================================================================

fn cmd_create_order(
    config: &DeskConfig,
    order_id: &str,
    date: Option<String>,
    line_specs: &[String],
    partner: Option<String>,
    total: Option<f64>,
) -> Result<(), CliError> {
    let order_date = canonical_or_today(date);
    let lines = line_specs
        .iter()
        .map(|spec| parse_line_spec(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let request =
        CreateOrderRequest::build(order_id, &order_date, partner.as_deref(), total, lines)
            .map_err(|e: mutation::MutationError| CliError {
                code: EXIT_MUTATE_INVALID,
                message: e.to_string(),
                hint: None,
            })?;

    post_mutation(config, &request)?;
    println!("created order {} ({} lines)", request.order_id, request.line_items.len());
    Ok(())
}

fn cmd_mark_fulfilled(
    config: &DeskConfig,
    order_id: &str,
    date: Option<String>,
) -> Result<(), CliError> {
    let fulfilment_date = canonical_or_today(date);
    let request = MarkFulfilledRequest::new(order_id, &fulfilment_date).map_err(|e| CliError {
        code: EXIT_MUTATE_INVALID,
        message: e.to_string(),
        hint: None,
    })?;

    post_mutation(config, &request)?;
    println!("marked {} fulfilled on {}", request.order_id, request.fulfilment_date);
    Ok(())
}

fn post_mutation(config: &DeskConfig, payload: &impl serde::Serialize) -> Result<MutationOutcome, CliError> {
    let script_url = config.require_script_url()?;
    let client = AppsScriptClient::new(script_url).map_err(|e| CliError {
        code: EXIT_CONFIG_MISSING,
        message: e.to_string(),
        hint: None,
    })?;

    let outcome = client.post(payload).map_err(|e| CliError {
        code: EXIT_MUTATE_NETWORK,
        message: e.to_string(),
        hint: Some("is the Apps Script deployment URL current?".to_string()),
    })?;

    if !outcome.ok {
        return Err(CliError {
            code: EXIT_MUTATE_REJECTED,
            message: format!("webhook rejected the mutation: {}", outcome.message),
            hint: None,
        });
    }
    Ok(outcome)
}

/// `SKU:QTY` or `SKU:QTY:REVENUE`.
fn parse_line_spec(spec: &str) -> Result<OrderLine, CliError> {
    let mut parts = spec.splitn(3, ':');
    let sku = parts.next().unwrap_or("").trim().to_string();
    if sku.is_empty() {
        return Err(CliError::args(format!("line {spec:?} has no SKU"))
            .with_hint("use SKU:QTY or SKU:QTY:REVENUE"));
    }
    let qty = match parts.next() {
        Some(q) => q.trim().parse::<f64>().map_err(|_| {
            CliError::args(format!("line {spec:?} has a non-numeric quantity"))
        })?,
        None => 1.0,
    };
    let line_revenue = match parts.next() {
        Some(r) => r.trim().parse::<f64>().map_err(|_| {
            CliError::args(format!("line {spec:?} has a non-numeric revenue"))
        })?,
        None => 0.0,
    };
    Ok(OrderLine { sku, qty, line_revenue })
}

/// Normalize a user-supplied date to canonical form, or use today.
fn canonical_or_today(date: Option<String>) -> String {
    match date {
        Some(s) => normalize::to_canonical_date(&orderdesk_engine::Cell::text(s)),
        None => chrono::Local::now().date_naive().format("%d/%m/%Y").to_string(),
    }
}

// ============================================================================
// output helpers
// ============================================================================

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).map_err(|e| CliError {
        code: exit_codes::EXIT_ERROR,
        message: e.to_string(),
        hint: None,
    })?;
    writeln!(handle).map_err(|e| CliError {
        code: exit_codes::EXIT_ERROR,
        message: e.to_string(),
        hint: None,
    })
}

fn format_quantity(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Minimal left-aligned column layout for terminal output.
struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: Vec<&'static str>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn print(&self) {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }
        let header_line: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
            .collect();
        println!("{}", header_line.join("  ").trim_end());
        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
                .collect();
            println!("{}", line.join("  ").trim_end());
        }
    }
}
