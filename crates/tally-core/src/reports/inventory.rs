//! # Inventory Reports
//!
//! Stock summary, low stock, item profitability and stock movement.
//!
//! ## Stock Status
//! ```text
//!   qty ≤ 0              → out of stock
//!   0 < qty ≤ alert      → low stock
//!   qty > alert          → in stock
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::reports::DateRange;
use crate::types::Item;

// =============================================================================
// Stock Summary
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub const fn classify(stock_quantity: i64, low_stock_alert: i64) -> Self {
        if stock_quantity <= 0 {
            StockStatus::OutOfStock
        } else if stock_quantity <= low_stock_alert {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSummaryLine {
    pub item_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub stock_quantity: i64,
    pub purchase_price: Money,
    pub stock_value: Money,
    pub low_stock_alert: i64,
    pub status: StockStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSummary {
    pub items: Vec<StockSummaryLine>,
    pub item_count: usize,
    pub total_value: Money,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
}

/// Values every active item at purchase price and counts the low and empty
/// ones. Inactive items are skipped.
///
/// ```rust
/// use tally_core::reports::inventory::StockStatus;
///
/// assert_eq!(StockStatus::classify(0, 5), StockStatus::OutOfStock);
/// assert_eq!(StockStatus::classify(5, 5), StockStatus::LowStock);
/// assert_eq!(StockStatus::classify(6, 5), StockStatus::InStock);
/// ```
pub fn build_stock_summary(items: &[Item]) -> StockSummary {
    let lines: Vec<StockSummaryLine> = items
        .iter()
        .filter(|item| item.is_active)
        .map(|item| StockSummaryLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            sku: item.sku.clone(),
            stock_quantity: item.stock_quantity,
            purchase_price: item.purchase_price,
            stock_value: item.stock_value(),
            low_stock_alert: item.low_stock_alert,
            status: StockStatus::classify(item.stock_quantity, item.low_stock_alert),
        })
        .collect();

    let count = |status: StockStatus| lines.iter().filter(|l| l.status == status).count();

    StockSummary {
        item_count: lines.len(),
        total_value: lines.iter().map(|l| l.stock_value).sum(),
        low_stock_count: count(StockStatus::LowStock),
        out_of_stock_count: count(StockStatus::OutOfStock),
        items: lines,
    }
}

// =============================================================================
// Low Stock
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockItem {
    pub item_id: String,
    pub name: String,
    pub stock_quantity: i64,
    pub low_stock_alert: i64,
    /// `low_stock_alert - stock_quantity`
    pub shortfall: i64,
}

/// Active stocked items at or below their alert level, largest shortfall
/// first.
pub fn build_low_stock(items: &[Item]) -> Vec<LowStockItem> {
    let mut low: Vec<LowStockItem> = items
        .iter()
        .filter(|item| item.is_active && item.item_type.is_stocked())
        .filter(|item| item.stock_quantity <= item.low_stock_alert)
        .map(|item| LowStockItem {
            item_id: item.id.clone(),
            name: item.name.clone(),
            stock_quantity: item.stock_quantity,
            low_stock_alert: item.low_stock_alert,
            shortfall: item.low_stock_alert - item.stock_quantity,
        })
        .collect();

    low.sort_by(|a, b| b.shortfall.cmp(&a.shortfall));
    low
}

// =============================================================================
// Item Profitability
// =============================================================================

/// Sales of one item in a range, joined with its current purchase price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ItemSalesRow {
    pub item_id: String,
    pub item_name: Option<String>,
    pub quantity_sold: Option<i64>,
    pub revenue: Option<Money>,
    pub purchase_price: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemProfitability {
    pub item_id: String,
    pub item_name: String,
    pub quantity_sold: i64,
    pub revenue: Money,
    /// `quantity_sold × current purchase price`
    pub cost: Money,
    pub profit: Money,
    /// `profit / revenue`, 0 when there is no revenue. Display only.
    pub margin: f64,
}

/// Costs sales at today's purchase price, not the price paid at the time.
/// Sorted by profit, highest first.
pub fn build_item_profitability(rows: Vec<ItemSalesRow>) -> Vec<ItemProfitability> {
    let mut out: Vec<ItemProfitability> = rows
        .into_iter()
        .map(|row| {
            let quantity_sold = row.quantity_sold.unwrap_or(0);
            let revenue = Money::from_nullable(row.revenue);
            let cost = Money::from_nullable(row.purchase_price).multiply_quantity(quantity_sold);
            let profit = revenue - cost;

            ItemProfitability {
                item_name: row.item_name.unwrap_or_else(|| row.item_id.clone()),
                item_id: row.item_id,
                quantity_sold,
                revenue,
                cost,
                profit,
                margin: profit.ratio_of(revenue),
            }
        })
        .collect();

    out.sort_by(|a, b| b.profit.cmp(&a.profit));
    out
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Units bought and sold per item in a range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovementRow {
    pub item_id: String,
    pub item_name: String,
    pub quantity_in: Option<i64>,
    pub quantity_out: Option<i64>,
    pub current_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovementLine {
    pub item_id: String,
    pub item_name: String,
    pub quantity_in: i64,
    pub quantity_out: i64,
    pub net: i64,
    pub current_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovementReport {
    pub range: DateRange,
    /// Busiest items first (in + out).
    pub items: Vec<StockMovementLine>,
    pub total_in: i64,
    pub total_out: i64,
}

pub fn build_stock_movement(range: DateRange, rows: Vec<StockMovementRow>) -> StockMovementReport {
    let mut items: Vec<StockMovementLine> = rows
        .into_iter()
        .map(|row| {
            let quantity_in = row.quantity_in.unwrap_or(0);
            let quantity_out = row.quantity_out.unwrap_or(0);
            StockMovementLine {
                item_id: row.item_id,
                item_name: row.item_name,
                quantity_in,
                quantity_out,
                net: quantity_in - quantity_out,
                current_stock: row.current_stock,
            }
        })
        .filter(|line| line.quantity_in != 0 || line.quantity_out != 0)
        .collect();

    items.sort_by(|a, b| (b.quantity_in + b.quantity_out).cmp(&(a.quantity_in + a.quantity_out)));

    StockMovementReport {
        range,
        total_in: items.iter().map(|l| l.quantity_in).sum(),
        total_out: items.iter().map(|l| l.quantity_out).sum(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;
    use chrono::Utc;

    fn item(id: &str, qty: i64, price: i64, alert: i64) -> Item {
        Item {
            id: id.to_string(),
            name: format!("Item {}", id),
            sku: None,
            item_type: ItemKind::Product,
            unit: None,
            stock_quantity: qty,
            purchase_price: Money::from_cents(price),
            sale_price: Money::from_cents(price * 2),
            tax_rate_bps: 0,
            low_stock_alert: alert,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stock_summary_example() {
        let items = vec![item("a", 10, 100, 0), item("b", 2, 50, 5), item("c", 0, 20, 0)];

        let summary = build_stock_summary(&items);

        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total_value.cents(), 1_100);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.out_of_stock_count, 1);
        assert_eq!(summary.items[1].status, StockStatus::LowStock);
    }

    #[test]
    fn test_stock_summary_skips_inactive() {
        let mut retired = item("x", 50, 100, 0);
        retired.is_active = false;

        let summary = build_stock_summary(&[retired]);
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.total_value, Money::zero());
    }

    #[test]
    fn test_negative_stock_is_out_of_stock() {
        assert_eq!(StockStatus::classify(-3, 5), StockStatus::OutOfStock);
    }

    #[test]
    fn test_low_stock_sorted_by_shortfall() {
        let mut service = item("s", 0, 0, 10);
        service.item_type = ItemKind::Service;
        let items = vec![
            item("a", 4, 10, 5),
            item("b", 0, 10, 8),
            item("c", 9, 10, 5),
            service,
        ];

        let low = build_low_stock(&items);

        let ids: Vec<&str> = low.iter().map(|l| l.item_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(low[0].shortfall, 8);
    }

    #[test]
    fn test_item_profitability_uses_current_cost() {
        let rows = vec![
            ItemSalesRow {
                item_id: "tea".into(),
                item_name: Some("Tea".into()),
                quantity_sold: Some(4),
                revenue: Some(Money::from_cents(1_000)),
                purchase_price: Some(Money::from_cents(150)),
            },
            ItemSalesRow {
                item_id: "free".into(),
                item_name: None,
                quantity_sold: Some(2),
                revenue: None,
                purchase_price: Some(Money::from_cents(100)),
            },
        ];

        let report = build_item_profitability(rows);

        assert_eq!(report[0].item_id, "tea");
        assert_eq!(report[0].cost.cents(), 600);
        assert_eq!(report[0].profit.cents(), 400);
        assert!((report[0].margin - 0.4).abs() < 1e-9);
        assert_eq!(report[1].item_name, "free");
        assert_eq!(report[1].profit.cents(), -200);
        assert_eq!(report[1].margin, 0.0);
    }

    #[test]
    fn test_stock_movement_net_and_order() {
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        let rows = vec![
            StockMovementRow {
                item_id: "a".into(),
                item_name: "A".into(),
                quantity_in: Some(10),
                quantity_out: Some(3),
                current_stock: 7,
            },
            StockMovementRow {
                item_id: "b".into(),
                item_name: "B".into(),
                quantity_in: None,
                quantity_out: Some(20),
                current_stock: 0,
            },
            StockMovementRow {
                item_id: "idle".into(),
                item_name: "Idle".into(),
                quantity_in: None,
                quantity_out: None,
                current_stock: 4,
            },
        ];

        let report = build_stock_movement(range, rows);

        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].item_id, "b");
        assert_eq!(report.items[0].net, -20);
        assert_eq!(report.items[1].net, 7);
        assert_eq!(report.total_in, 10);
        assert_eq!(report.total_out, 23);
    }
}
