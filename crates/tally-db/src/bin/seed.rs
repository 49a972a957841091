//! # Seed Data Generator
//!
//! Fills a database with a few weeks of shop activity so every report has
//! something to show.
//!
//! ## Usage
//! ```bash
//! # 60 days of history into the configured database
//! cargo run -p tally-db --bin seed
//!
//! # Custom history length
//! cargo run -p tally-db --bin seed -- --days 120
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - A catalogue of grocery products and one service
//! - Customers, suppliers and a party that is both
//! - Weekly purchase invoices from suppliers (stock in)
//! - Daily sale invoices with payments, some on credit (stock out)
//! - Expenses, cash drawer and bank movements, a credit note
//! - Today's sales go through the real checkout, so the POS path is exercised
//!
//! Values are derived from the day index, so two runs produce the same
//! shape of data.

use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tally_core::{
    BankTransaction, BankTxnKind, CashTransaction, CreditNote, Customer, Direction, Expense,
    Invoice, InvoiceKind, InvoiceLineItem, InvoiceStatus, Item, ItemKind, Money, PartyType,
    Payment, PosCart,
};
use tally_db::repository::generate_id;
use tally_db::{init_tracing, AppConfig, Database};

/// (name, sku, purchase cents, sale cents, tax bps, opening stock, low-stock alert)
const PRODUCTS: &[(&str, &str, i64, i64, u32, i64, i64)] = &[
    ("Basmati Rice 5kg", "RICE-5", 1_800, 2_250, 0, 40, 10),
    ("Sugar 1kg", "SUG-1", 140, 165, 0, 120, 30),
    ("Cooking Oil 3L", "OIL-3", 1_350, 1_600, 1_700, 25, 8),
    ("Tea 475g", "TEA-475", 820, 990, 1_700, 30, 10),
    ("Flour 10kg", "ATTA-10", 1_150, 1_350, 0, 20, 6),
    ("Milk Pack 1L", "MILK-1", 250, 290, 0, 60, 24),
    ("Dish Soap", "SOAP-D", 180, 240, 1_700, 18, 6),
    ("Biscuits Family", "BISC-F", 95, 130, 1_700, 80, 20),
];

const CUSTOMERS: &[(&str, PartyType, i64)] = &[
    ("Ahmed Traders", PartyType::Customer, 5_000),
    ("Sara Khan", PartyType::Customer, 0),
    ("Corner Cafe", PartyType::Customer, 12_000),
    ("Metro Wholesale", PartyType::Supplier, -20_000),
    ("Green Farms", PartyType::Supplier, 0),
    ("City Distributors", PartyType::Both, 0),
];

const PAYMENT_MODES: &[&str] = &["cash", "card", "bank", "cash", "cash"];

const EXPENSE_CATEGORIES: &[(&str, i64)] = &[
    ("Rent", 45_000),
    ("Electricity", 8_500),
    ("Salaries", 60_000),
    ("Transport", 3_200),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 60;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of history to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: from config)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = AppConfig::load_or_default(None);
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }
    let path = config.database_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    println!("Tally Seed Data Generator");
    println!("=========================");
    println!("Database: {}", path.display());
    println!("History:  {} days", days);
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let today = Utc::now().date_naive();
    let first_day = today - Duration::days(days.max(1));

    // Catalogue and parties
    let mut items = Vec::with_capacity(PRODUCTS.len() + 1);
    for (idx, row) in PRODUCTS.iter().enumerate() {
        let item = product(row, idx);
        db.items().insert(&item).await?;
        items.push(item);
    }
    let delivery = service("Home Delivery", 150);
    db.items().insert(&delivery).await?;
    println!("✓ {} items", items.len() + 1);

    let mut customers = Vec::new();
    let mut suppliers = Vec::new();
    for (name, party_type, opening) in CUSTOMERS {
        let record = party(name, *party_type, *opening, first_day);
        db.customers().insert(&record).await?;
        if matches!(party_type, PartyType::Customer | PartyType::Both) {
            customers.push(record.clone());
        }
        if matches!(party_type, PartyType::Supplier | PartyType::Both) {
            suppliers.push(record);
        }
    }
    println!("✓ {} parties", CUSTOMERS.len());

    // Daily history, oldest first
    let mut sales = 0usize;
    let mut purchases = 0usize;
    for day in 0..days {
        let date = first_day + Duration::days(day);
        let seed = day as usize;

        if day % 7 == 0 {
            let supplier = &suppliers[seed % suppliers.len()];
            record_purchase(&db, supplier, &items, date, seed).await?;
            purchases += 1;
        }

        for n in 0..(1 + seed % 3) {
            let customer = if (seed + n) % 4 == 0 {
                None
            } else {
                Some(&customers[(seed + n) % customers.len()])
            };
            record_sale(&db, customer, &items, date, seed * 3 + n).await?;
            sales += 1;
        }

        if day % 10 == 3 {
            let (category, amount) = EXPENSE_CATEGORIES[seed % EXPENSE_CATEGORIES.len()];
            db.expenses()
                .insert(&Expense {
                    id: generate_id(),
                    date,
                    category: Some(category.to_string()),
                    amount: Money::from_cents(amount),
                    payment_mode: Some("cash".to_string()),
                    description: None,
                    created_at: at(date, 18),
                })
                .await?;
        }

        if day % 5 == 1 {
            record_cash_and_bank(&db, date, seed).await?;
        }
    }

    if let Some(customer) = customers.first() {
        db.credit_notes()
            .insert(&CreditNote {
                id: generate_id(),
                credit_note_number: format!("CN-{:06}", days),
                customer_id: customer.id.clone(),
                invoice_id: None,
                date: today,
                amount: Money::from_cents(1_500),
                reason: Some("Damaged goods returned".to_string()),
                created_at: Utc::now(),
            })
            .await?;
    }

    // Today's counter sales through the checkout path
    let checkout = db.checkout(&config.store);
    for (n, item) in items.iter().take(3).enumerate() {
        let mut cart = PosCart::new();
        cart.add_item(item);
        cart.add_item(&delivery);
        if let Some(customer) = customers.get(n) {
            cart.set_customer(Some(customer.clone()));
        }
        let paid = if n == 0 {
            Money::zero()
        } else {
            cart.grand_total()
        };
        match checkout
            .process_transaction(&mut cart, PAYMENT_MODES[n], paid)
            .await
        {
            Ok(receipt) => {
                println!(
                    "  Checkout {} total {}",
                    receipt.invoice_number,
                    config.store.format_currency(receipt.total)
                );
                sales += 1;
            }
            Err(e) => eprintln!("Checkout failed: {}", e),
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} sales and {} purchases in {:?}",
        sales, purchases, elapsed
    );

    let low = db.reports().low_stock().await?;
    println!("  Items at or below alert level: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn at(date: NaiveDate, hour: i64) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc() + Duration::hours(hour)
}

fn product(row: &(&str, &str, i64, i64, u32, i64, i64), idx: usize) -> Item {
    let (name, sku, purchase, sale, tax_bps, stock, alert) = *row;
    let now = Utc::now();

    Item {
        id: generate_id(),
        name: name.to_string(),
        sku: Some(sku.to_string()),
        item_type: ItemKind::Product,
        unit: Some(if idx % 2 == 0 { "pcs" } else { "pack" }.to_string()),
        stock_quantity: stock,
        purchase_price: Money::from_cents(purchase),
        sale_price: Money::from_cents(sale),
        tax_rate_bps: tax_bps,
        low_stock_alert: alert,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn service(name: &str, price: i64) -> Item {
    let now = Utc::now();

    Item {
        id: generate_id(),
        name: name.to_string(),
        sku: None,
        item_type: ItemKind::Service,
        unit: None,
        stock_quantity: 0,
        purchase_price: Money::zero(),
        sale_price: Money::from_cents(price),
        tax_rate_bps: 0,
        low_stock_alert: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn party(name: &str, party_type: PartyType, opening: i64, since: NaiveDate) -> Customer {
    Customer {
        id: generate_id(),
        name: name.to_string(),
        phone: Some(format!("0300{:07}", name.len() * 104_729 % 10_000_000)),
        email: None,
        address: None,
        party_type,
        opening_balance: Money::from_cents(opening),
        current_balance: Money::from_cents(opening),
        credit_days: 30,
        is_active: true,
        created_at: at(since, 9),
    }
}

/// A dated sale outside the checkout path: invoice, lines, stock out,
/// payment, and balance for whatever is left unpaid.
async fn record_sale(
    db: &Database,
    customer: Option<&Customer>,
    items: &[Item],
    date: NaiveDate,
    seed: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let invoice_id = generate_id();
    let mut lines = Vec::new();
    for k in 0..(1 + seed % 3) {
        let item = &items[(seed + k * 3) % items.len()];
        let quantity = 1 + ((seed + k) % 4) as i64;
        let amount = item.sale_price * quantity;
        lines.push(InvoiceLineItem {
            id: generate_id(),
            invoice_id: invoice_id.clone(),
            item_id: Some(item.id.clone()),
            item_name: item.name.clone(),
            quantity,
            unit: item.unit.clone(),
            unit_price: item.sale_price,
            tax_rate_bps: item.tax_rate_bps,
            discount_bps: 0,
            discount_amount: Money::zero(),
            amount,
        });
    }

    let subtotal: Money = lines.iter().map(|l| l.amount).sum();
    let tax: Money = lines
        .iter()
        .map(|l| l.amount.percentage(i64::from(l.tax_rate_bps)))
        .sum();
    let total = subtotal + tax;
    let paid = match (customer, seed % 3) {
        (Some(_), 0) => Money::zero(),
        (Some(_), 1) => total.divide_by(2),
        _ => total,
    };
    let due = total - paid;
    let status = if due.is_zero() {
        InvoiceStatus::Paid
    } else if paid.is_zero() {
        InvoiceStatus::Unpaid
    } else {
        InvoiceStatus::Partial
    };
    let created_at = at(date, 10 + (seed % 8) as i64);

    let invoice = Invoice {
        id: invoice_id,
        invoice_number: format!("INV-S{:05}", seed),
        invoice_type: InvoiceKind::Sale,
        customer_id: customer.map(|c| c.id.clone()),
        customer_name: customer
            .map(|c| c.name.clone())
            .unwrap_or_else(|| tally_core::WALK_IN_CUSTOMER.to_string()),
        date,
        due_date: customer.map(|c| date + Duration::days(c.credit_days)),
        status,
        subtotal,
        tax_amount: tax,
        discount_amount: Money::zero(),
        total,
        amount_paid: paid,
        amount_due: due,
        notes: None,
        created_at,
    };
    db.invoices().insert(&invoice, &lines).await?;

    for line in &lines {
        if let Some(item_id) = &line.item_id {
            db.items().update_stock(item_id, -line.quantity).await?;
        }
    }

    if paid.is_positive() {
        db.payments()
            .insert(&Payment {
                id: generate_id(),
                payment_number: format!("PAY-S{:05}", seed),
                direction: Direction::In,
                customer_id: invoice.customer_id.clone(),
                customer_name: Some(invoice.customer_name.clone()),
                invoice_id: Some(invoice.id.clone()),
                date,
                amount: paid,
                payment_mode: PAYMENT_MODES[seed % PAYMENT_MODES.len()].to_string(),
                notes: None,
                created_at,
            })
            .await?;
    }

    if let Some(customer) = customer {
        if due.is_positive() {
            db.customers().adjust_balance(&customer.id, due).await?;
        }
    }

    Ok(())
}

/// A dated purchase: restocks a few items from one supplier, paid by bank.
async fn record_purchase(
    db: &Database,
    supplier: &Customer,
    items: &[Item],
    date: NaiveDate,
    seed: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let invoice_id = generate_id();
    let mut lines = Vec::new();
    for k in 0..3 {
        let item = &items[(seed + k) % items.len()];
        let quantity = 12 + ((seed + k) % 3) as i64 * 6;
        lines.push(InvoiceLineItem {
            id: generate_id(),
            invoice_id: invoice_id.clone(),
            item_id: Some(item.id.clone()),
            item_name: item.name.clone(),
            quantity,
            unit: item.unit.clone(),
            unit_price: item.purchase_price,
            tax_rate_bps: item.tax_rate_bps,
            discount_bps: 0,
            discount_amount: Money::zero(),
            amount: item.purchase_price * quantity,
        });
    }

    let subtotal: Money = lines.iter().map(|l| l.amount).sum();
    let tax: Money = lines
        .iter()
        .map(|l| l.amount.percentage(i64::from(l.tax_rate_bps)))
        .sum();
    let total = subtotal + tax;
    // Every other delivery is left on account
    let paid = if seed % 14 == 0 { total } else { total.divide_by(2) };
    let created_at = at(date, 9);

    let invoice = Invoice {
        id: invoice_id,
        invoice_number: format!("PUR-{:05}", seed),
        invoice_type: InvoiceKind::Purchase,
        customer_id: Some(supplier.id.clone()),
        customer_name: supplier.name.clone(),
        date,
        due_date: Some(date + Duration::days(supplier.credit_days)),
        status: if paid == total {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Partial
        },
        subtotal,
        tax_amount: tax,
        discount_amount: Money::zero(),
        total,
        amount_paid: paid,
        amount_due: total - paid,
        notes: None,
        created_at,
    };
    db.invoices().insert(&invoice, &lines).await?;

    for line in &lines {
        if let Some(item_id) = &line.item_id {
            db.items().update_stock(item_id, line.quantity).await?;
        }
    }

    db.payments()
        .insert(&Payment {
            id: generate_id(),
            payment_number: format!("PAY-P{:05}", seed),
            direction: Direction::Out,
            customer_id: Some(supplier.id.clone()),
            customer_name: Some(supplier.name.clone()),
            invoice_id: Some(invoice.id.clone()),
            date,
            amount: paid,
            payment_mode: "bank".to_string(),
            notes: None,
            created_at,
        })
        .await?;

    Ok(())
}

async fn record_cash_and_bank(
    db: &Database,
    date: NaiveDate,
    seed: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let direction = if seed % 2 == 0 {
        Direction::In
    } else {
        Direction::Out
    };
    db.cash()
        .insert_cash(&CashTransaction {
            id: generate_id(),
            date,
            direction,
            amount: Money::from_cents(2_000 + (seed % 5) as i64 * 500),
            description: Some("Cash drawer adjustment".to_string()),
            created_at: at(date, 20),
        })
        .await?;

    let txn_type = if seed % 3 == 0 {
        BankTxnKind::Withdrawal
    } else {
        BankTxnKind::Deposit
    };
    db.cash()
        .insert_bank(&BankTransaction {
            id: generate_id(),
            account_name: "Main Account".to_string(),
            date,
            txn_type,
            amount: Money::from_cents(10_000 + (seed % 4) as i64 * 2_500),
            description: None,
            created_at: at(date, 21),
        })
        .await?;

    Ok(())
}
