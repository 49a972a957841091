//! # Report Printer
//!
//! Runs one report against a database and prints it as JSON.
//!
//! ## Usage
//! ```bash
//! # Profit & loss for the current month
//! cargo run -p tally-db --bin report -- profit-loss
//!
//! # Sales summary for a quarter
//! cargo run -p tally-db --bin report -- sales --from 2024-01-01 --to 2024-03-31
//!
//! # Receivables aging as of a date
//! cargo run -p tally-db --bin report -- receivables --as-of 2024-06-30
//!
//! # Customer statement
//! cargo run -p tally-db --bin report -- statement --customer <ID> --from 2024-01-01 --to 2024-06-30
//! ```
//!
//! `--from`/`--to` default to the current month, `--as-of` to today.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use tally_core::validation::parse_iso_date;
use tally_core::DateRange;
use tally_db::{init_tracing, AppConfig, Database, ReportRepository};

const REPORTS: &[(&str, &str)] = &[
    ("sales", "Sales summary with top customers and months"),
    ("purchases", "Purchase summary with top suppliers and months"),
    ("sales-by-customer", "Sales grouped by customer"),
    ("purchases-by-supplier", "Purchases grouped by supplier"),
    ("sales-by-item", "Quantity and amount sold per item"),
    ("purchases-by-item", "Quantity and amount bought per item"),
    ("profit-loss", "Revenue, cost of goods, expenses"),
    ("cash-flow", "Money in and out by source"),
    ("tax", "Tax collected, tax paid, net"),
    ("day-book", "Every document on one day (uses --from)"),
    ("cash-movement", "In and out per payment mode"),
    ("stock", "Stock value and counts"),
    ("low-stock", "Items at or below their alert level"),
    ("profitability", "Revenue, cost and margin per item"),
    ("stock-movement", "Units in and out per item"),
    ("receivables", "Customer aging buckets"),
    ("payables", "Supplier aging buckets"),
    ("statement", "Customer statement with running balance"),
    ("balances", "Customer balances, receivable and payable"),
];

struct Args {
    report: Option<String>,
    from: Option<String>,
    to: Option<String>,
    as_of: Option<String>,
    customer: Option<String>,
    db_path: Option<PathBuf>,
    top_n: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args() {
        Some(args) => args,
        None => return ExitCode::SUCCESS,
    };

    match run(args).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `None` when help was printed.
fn parse_args() -> Option<Args> {
    let argv: Vec<String> = env::args().collect();
    let mut args = Args {
        report: None,
        from: None,
        to: None,
        as_of: None,
        customer: None,
        db_path: None,
        top_n: None,
    };

    let mut i = 1;
    while i < argv.len() {
        let value = argv.get(i + 1).cloned();
        match argv[i].as_str() {
            "--from" | "-f" => {
                args.from = value;
                i += 1;
            }
            "--to" | "-t" => {
                args.to = value;
                i += 1;
            }
            "--as-of" | "-a" => {
                args.as_of = value;
                i += 1;
            }
            "--customer" | "-c" => {
                args.customer = value;
                i += 1;
            }
            "--db" | "-d" => {
                args.db_path = value.map(PathBuf::from);
                i += 1;
            }
            "--top" => {
                args.top_n = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                return None;
            }
            name if args.report.is_none() => args.report = Some(name.to_string()),
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    Some(args)
}

fn print_help() {
    println!("Tally Report Printer");
    println!();
    println!("Usage: report <REPORT> [OPTIONS]");
    println!();
    println!("Reports:");
    for (name, about) in REPORTS {
        println!("  {:<24}{}", name, about);
    }
    println!();
    println!("Options:");
    println!("  -f, --from <DATE>      Range start, YYYY-MM-DD (default: first of this month)");
    println!("  -t, --to <DATE>        Range end, YYYY-MM-DD (default: end of this month)");
    println!("  -a, --as-of <DATE>     Aging reference date (default: today)");
    println!("  -c, --customer <ID>    Customer for the statement report");
    println!("  -d, --db <PATH>        Database file path (default: from config)");
    println!("      --top <N>          Entries in top-N lists (default: from config)");
    println!("  -h, --help             Show this help message");
}

async fn run(args: Args) -> Result<String, Box<dyn std::error::Error>> {
    let report = args
        .report
        .clone()
        .ok_or("no report given, see --help")?;

    let mut config = AppConfig::load_or_default(None);
    if let Some(path) = args.db_path.clone() {
        config.database.path = Some(path);
    }
    let top_n = args.top_n.unwrap_or(config.reports.top_n);

    let today = Utc::now().date_naive();
    let range = date_range(&args, today)?;
    let as_of = match &args.as_of {
        Some(value) => parse_iso_date("as_of", value)?,
        None => today,
    };

    let db = Database::new(config.db_config()).await?;
    let reports = db.reports();
    let json = render(&reports, &report, range, as_of, top_n, args.customer.as_deref()).await;
    db.close().await;

    json
}

fn date_range(args: &Args, today: NaiveDate) -> Result<DateRange, Box<dyn std::error::Error>> {
    let month = DateRange::month_of(today);
    let from = match &args.from {
        Some(value) => parse_iso_date("from", value)?,
        None => month.from,
    };
    let to = match &args.to {
        Some(value) => parse_iso_date("to", value)?,
        None => month.to,
    };
    Ok(DateRange::new(from, to)?)
}

async fn render(
    reports: &ReportRepository,
    report: &str,
    range: DateRange,
    as_of: NaiveDate,
    top_n: usize,
    customer: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    let json = match report {
        "sales" => serde_json::to_string_pretty(&reports.sales_summary(range, top_n).await?)?,
        "purchases" => {
            serde_json::to_string_pretty(&reports.purchase_summary(range, top_n).await?)?
        }
        "sales-by-customer" => {
            serde_json::to_string_pretty(&reports.sales_by_customer(range).await?)?
        }
        "purchases-by-supplier" => {
            serde_json::to_string_pretty(&reports.purchases_by_supplier(range).await?)?
        }
        "sales-by-item" => serde_json::to_string_pretty(&reports.sales_by_item(range).await?)?,
        "purchases-by-item" => {
            serde_json::to_string_pretty(&reports.purchases_by_item(range).await?)?
        }
        "profit-loss" => serde_json::to_string_pretty(&reports.profit_loss(range).await?)?,
        "cash-flow" => serde_json::to_string_pretty(&reports.cash_flow(range).await?)?,
        "tax" => serde_json::to_string_pretty(&reports.tax_summary(range).await?)?,
        "day-book" => serde_json::to_string_pretty(&reports.day_book(range.from).await?)?,
        "cash-movement" => serde_json::to_string_pretty(&reports.cash_movement(range).await?)?,
        "stock" => serde_json::to_string_pretty(&reports.stock_summary().await?)?,
        "low-stock" => serde_json::to_string_pretty(&reports.low_stock().await?)?,
        "profitability" => {
            serde_json::to_string_pretty(&reports.item_profitability(range).await?)?
        }
        "stock-movement" => serde_json::to_string_pretty(&reports.stock_movement(range).await?)?,
        "receivables" => serde_json::to_string_pretty(&reports.receivables_aging(as_of).await?)?,
        "payables" => serde_json::to_string_pretty(&reports.payables_aging(as_of).await?)?,
        "statement" => {
            let customer = customer.ok_or("statement needs --customer <ID>")?;
            serde_json::to_string_pretty(&reports.customer_statement(customer, range).await?)?
        }
        "balances" => serde_json::to_string_pretty(&reports.customer_balances().await?)?,
        other => return Err(format!("unknown report '{}', see --help", other).into()),
    };

    Ok(json)
}
