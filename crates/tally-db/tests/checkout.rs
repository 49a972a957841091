//! End-to-end checkout behaviour against an in-memory database: rejected
//! and failed checkouts leave no trace, successful ones show up in reports.

use chrono::Utc;
use tally_core::{
    CoreError, DateRange, Discount, Item, ItemKind, Money, PosCart, TaxRate,
};
use tally_db::{CheckoutError, Database, DbConfig, StoreSettings};

fn item(name: &str, stock: i64, purchase: i64, sale: i64) -> Item {
    let now = Utc::now();
    Item {
        id: tally_db::repository::generate_id(),
        name: name.to_string(),
        sku: None,
        item_type: ItemKind::Product,
        unit: Some("pcs".to_string()),
        stock_quantity: stock,
        purchase_price: Money::from_cents(purchase),
        sale_price: Money::from_cents(sale),
        tax_rate_bps: 0,
        low_stock_alert: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Every row checkout could touch, in a comparable form.
#[derive(Debug, PartialEq)]
struct Snapshot {
    invoices: Vec<(String, i64)>,
    lines: Vec<(String, i64)>,
    stock: Vec<(String, i64)>,
    payments: Vec<(String, i64)>,
    balances: Vec<(String, i64)>,
}

async fn snapshot(db: &Database) -> Snapshot {
    async fn rows(db: &Database, sql: &str) -> Vec<(String, i64)> {
        sqlx::query_as(sql).fetch_all(db.pool()).await.unwrap()
    }

    Snapshot {
        invoices: rows(db, "SELECT id, total FROM invoices ORDER BY id").await,
        lines: rows(db, "SELECT id, quantity FROM invoice_items ORDER BY id").await,
        stock: rows(db, "SELECT id, stock_quantity FROM items ORDER BY id").await,
        payments: rows(db, "SELECT id, amount FROM payments ORDER BY id").await,
        balances: rows(db, "SELECT id, current_balance FROM customers ORDER BY id").await,
    }
}

async fn stocked_database() -> (Database, Item, Item) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let soap = item("Soap", 20, 60, 90);
    let oil = item("Oil 1L", 2, 400, 520);
    db.items().insert(&soap).await.unwrap();
    db.items().insert(&oil).await.unwrap();
    (db, soap, oil)
}

#[tokio::test]
async fn insufficient_stock_leaves_every_table_untouched() {
    let (db, soap, oil) = stocked_database().await;
    let before = snapshot(&db).await;

    let mut cart = PosCart::new();
    cart.add_item(&soap);
    cart.add_item(&oil);
    cart.update_quantity(&oil.id, 3).unwrap();

    let err = db
        .checkout(&StoreSettings::default())
        .process_transaction(&mut cart, "cash", Money::from_cents(5_000))
        .await
        .unwrap_err();

    match err {
        CheckoutError::Rejected(CoreError::InsufficientStock {
            item_name,
            available,
            ..
        }) => {
            assert_eq!(item_name, "Oil 1L");
            assert_eq!(available, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(snapshot(&db).await, before);
    assert_eq!(cart.item_count(), 2);
}

#[tokio::test]
async fn stock_is_checked_against_stored_quantity() {
    let (db, soap, _) = stocked_database().await;

    // The cart's copy still says 20
    let mut cart = PosCart::new();
    cart.add_item(&soap);
    cart.update_quantity(&soap.id, 5).unwrap();
    db.items().update_stock(&soap.id, -18).await.unwrap();

    let err = db
        .checkout(&StoreSettings::default())
        .process_transaction(&mut cart, "cash", Money::from_cents(450))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Rejected(CoreError::InsufficientStock { available: 2, .. })
    ));
}

#[tokio::test]
async fn failed_payment_insert_rolls_back_the_whole_sale() {
    let (db, soap, oil) = stocked_database().await;
    sqlx::query(
        r#"
        CREATE TRIGGER fail_payments BEFORE INSERT ON payments
        BEGIN
            SELECT RAISE(ABORT, 'forced');
        END
        "#,
    )
    .execute(db.pool())
    .await
    .unwrap();
    let before = snapshot(&db).await;

    let mut cart = PosCart::new();
    cart.add_item(&soap);
    cart.add_item(&oil);
    cart.set_bill_discount(Discount::Fixed(Money::from_cents(10)));
    let checkout = db.checkout(&StoreSettings::default());

    let err = checkout
        .process_transaction(&mut cart, "cash", Money::from_cents(600))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::TransactionFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(snapshot(&db).await, before);
    // Kept for a retry
    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.grand_total().cents(), 600);

    sqlx::query("DROP TRIGGER fail_payments")
        .execute(db.pool())
        .await
        .unwrap();
    let receipt = checkout
        .process_transaction(&mut cart, "cash", Money::from_cents(600))
        .await
        .unwrap();

    assert_eq!(receipt.total.cents(), 600);
    assert!(cart.is_empty());
    assert_eq!(db.invoices().count().await.unwrap(), 1);
    assert_eq!(db.payments().count().await.unwrap(), 1);
}

#[tokio::test]
async fn committed_sale_shows_up_in_reports() {
    let (db, soap, oil) = stocked_database().await;
    let mut taxed = item("Shampoo", 10, 300, 400);
    taxed.tax_rate_bps = TaxRate::from_percentage(10.0).bps();
    db.items().insert(&taxed).await.unwrap();

    let mut cart = PosCart::new();
    cart.add_item(&soap);
    cart.add_item(&soap);
    cart.add_item(&oil);
    cart.add_item(&taxed);
    // 180 + 520 + 400, tax 40 on the shampoo
    let receipt = db
        .checkout(&StoreSettings::default())
        .process_transaction(&mut cart, "Card", Money::from_cents(1_140))
        .await
        .unwrap();
    assert_eq!(receipt.total.cents(), 1_140);

    let today = DateRange::single_day(Utc::now().date_naive());
    let reports = db.reports();

    let summary = reports.sales_summary(today, 5).await.unwrap();
    assert_eq!(summary.total_invoices, 1);
    assert_eq!(summary.total_amount.cents(), 1_140);
    assert_eq!(summary.top_items[0].item_name, "Oil 1L");

    let tax = reports.tax_summary(today).await.unwrap();
    assert_eq!(tax.tax_collected.cents(), 40);

    let movement = reports.cash_movement(today).await.unwrap();
    assert_eq!(movement.modes.len(), 1);
    assert_eq!(movement.modes[0].mode, "card");
    assert_eq!(movement.modes[0].in_amount.cents(), 1_140);

    let stock = reports.stock_summary().await.unwrap();
    // soap 18 × 60, oil 1 × 400, shampoo 9 × 300
    assert_eq!(stock.total_value.cents(), 1_080 + 400 + 2_700);
}
