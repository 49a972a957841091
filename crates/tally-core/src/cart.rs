//! # Cart Pricing Engine
//!
//! The in-memory priced cart behind the POS screen. One `PosCart` per POS
//! session; nothing else mutates it. Checkout reads it and, on success,
//! clears it through [`PosCart::clear`].
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Screen Action            Engine Call             State Change          │
//! │  ─────────────            ───────────             ────────────          │
//! │                                                                         │
//! │  Tap item ───────────────► add_item() ──────────► qty += 1 or push     │
//! │  Change qty ─────────────► update_quantity() ───► qty = max(0, n)      │
//! │  Override price ─────────► update_item_price() ─► price = max(0, p)    │
//! │  Line discount ──────────► update_item_discount()                      │
//! │  Bill discount ──────────► set_bill_discount()                         │
//! │  Pick customer ──────────► set_customer()                              │
//! │  Remove ─────────────────► remove_item() ───────► line gone            │
//! │  Clear / checkout ok ────► clear() ─────────────► empty                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! ```text
//!   subtotal        = Σ price × qty
//!   item discounts  = Σ line discount   (pct of line, or fixed × qty)
//!   bill discount   = pct of (subtotal - item discounts), or flat
//!   tax             = Σ (line total - line discount) × rate
//!   grand total     = subtotal - item discounts - bill discount + tax
//! ```
//! Tax is taken on the item-discounted line; the bill discount is not spread
//! back over the lines. Totals are recomputed on every call.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, Item, TaxRate};

// =============================================================================
// Discount
// =============================================================================

/// A line or bill discount.
///
/// The engine stores whatever it is given; bounds are checked by callers
/// with [`crate::validation::validate_discount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Basis points of the base amount (1000 = 10%).
    Percentage(i64),
    /// Per unit on a line, flat on the bill.
    Fixed(Money),
}

impl Default for Discount {
    fn default() -> Self {
        Discount::Percentage(0)
    }
}

impl Discount {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        match self {
            Discount::Percentage(bps) => *bps == 0,
            Discount::Fixed(amount) => amount.is_zero(),
        }
    }

    /// Percentage in basis points, 0 for fixed discounts.
    pub fn bps(&self) -> i64 {
        match self {
            Discount::Percentage(bps) => *bps,
            Discount::Fixed(_) => 0,
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// An item in the cart with its (possibly overridden) price, quantity and
/// discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PosCartItem {
    /// Snapshot of the item when it was added.
    pub item: Item,
    pub quantity: i64,
    /// Unit price; starts at the item's sale price.
    pub price: Money,
    pub discount: Discount,
}

impl PosCartItem {
    pub fn from_item(item: &Item) -> Self {
        PosCartItem {
            item: item.clone(),
            quantity: 1,
            price: item.sale_price,
            discount: Discount::none(),
        }
    }

    #[inline]
    pub fn item_id(&self) -> &str {
        &self.item.id
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        self.item.tax_rate()
    }

    /// `price × quantity`.
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }

    /// Discount taken off this line. A fixed discount applies per unit.
    pub fn line_discount(&self) -> Money {
        match self.discount {
            Discount::Percentage(bps) => self.line_total().percentage(bps),
            Discount::Fixed(per_unit) => per_unit.multiply_quantity(self.quantity),
        }
    }

    /// Line total after its own discount. Stored as the invoice line amount.
    pub fn line_net(&self) -> Money {
        self.line_total() - self.line_discount()
    }

    pub fn line_tax(&self) -> Money {
        self.line_net().calculate_tax(self.tax_rate())
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Every derived total of a cart, computed in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub item_discount_total: Money,
    pub bill_discount_amount: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub grand_total: Money,
}

// =============================================================================
// Cart
// =============================================================================

/// The POS cart.
///
/// ## Invariants
/// - Lines are unique by item id (adding the same item bumps its quantity)
/// - `grand_total() == subtotal() - discount_total() + tax_total()`
/// - Zero-quantity lines are kept until the caller removes them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosCart {
    items: Vec<PosCartItem>,
    customer: Option<Customer>,
    bill_discount: Discount,
    selected_item_id: Option<String>,
}

impl PosCart {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn items(&self) -> &[PosCartItem] {
        &self.items
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn bill_discount(&self) -> Discount {
        self.bill_discount
    }

    pub fn selected_item_id(&self) -> Option<&str> {
        self.selected_item_id.as_deref()
    }

    pub fn get(&self, item_id: &str) -> Option<&PosCartItem> {
        self.items.iter().find(|line| line.item_id() == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Adds one unit of `item`.
    ///
    /// An existing line keeps its price and discount and gains one unit; a new
    /// line starts at quantity 1, the item's sale price and no discount. The
    /// affected item becomes the selection either way.
    pub fn add_item(&mut self, item: &Item) {
        match self.line_mut(&item.id) {
            Ok(line) => line.quantity += 1,
            Err(_) => self.items.push(PosCartItem::from_item(item)),
        }
        self.selected_item_id = Some(item.id.clone());
    }

    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<()> {
        let before = self.items.len();
        self.items.retain(|line| line.item_id() != item_id);
        if self.items.len() == before {
            return Err(CoreError::ItemNotInCart(item_id.to_string()));
        }

        if self.selected_item_id.as_deref() == Some(item_id) {
            self.selected_item_id = None;
        }
        Ok(())
    }

    /// Sets the quantity, clamped at zero. A zero-quantity line stays.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        self.line_mut(item_id)?.quantity = quantity.max(0);
        Ok(())
    }

    /// Overrides the unit price, clamped at zero.
    pub fn update_item_price(&mut self, item_id: &str, price: Money) -> CoreResult<()> {
        self.line_mut(item_id)?.price = price.non_negative();
        Ok(())
    }

    pub fn update_item_discount(&mut self, item_id: &str, discount: Discount) -> CoreResult<()> {
        self.line_mut(item_id)?.discount = discount;
        Ok(())
    }

    pub fn set_bill_discount(&mut self, discount: Discount) {
        self.bill_discount = discount;
    }

    pub fn set_customer(&mut self, customer: Option<Customer>) {
        self.customer = customer;
    }

    /// Selects a line. Selecting an item that is not in the cart clears the
    /// selection.
    pub fn select_item(&mut self, item_id: Option<&str>) {
        self.selected_item_id = item_id
            .filter(|id| self.get(id).is_some())
            .map(str::to_string);
    }

    /// Empties the cart and resets customer, bill discount and selection.
    pub fn clear(&mut self) {
        self.items.clear();
        self.customer = None;
        self.bill_discount = Discount::none();
        self.selected_item_id = None;
    }

    fn line_mut(&mut self, item_id: &str) -> CoreResult<&mut PosCartItem> {
        self.items
            .iter_mut()
            .find(|line| line.item_id() == item_id)
            .ok_or_else(|| CoreError::ItemNotInCart(item_id.to_string()))
    }

    // -------------------------------------------------------------------------
    // Derived totals
    // -------------------------------------------------------------------------

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(PosCartItem::line_total).sum()
    }

    pub fn item_discount_total(&self) -> Money {
        self.items.iter().map(PosCartItem::line_discount).sum()
    }

    /// Bill discount on what is left after item discounts.
    pub fn bill_discount_amount(&self) -> Money {
        match self.bill_discount {
            Discount::Percentage(bps) => {
                (self.subtotal() - self.item_discount_total()).percentage(bps)
            }
            Discount::Fixed(amount) => amount,
        }
    }

    pub fn discount_total(&self) -> Money {
        self.item_discount_total() + self.bill_discount_amount()
    }

    pub fn tax_total(&self) -> Money {
        self.items.iter().map(PosCartItem::line_tax).sum()
    }

    pub fn grand_total(&self) -> Money {
        self.subtotal() - self.item_discount_total() - self.bill_discount_amount()
            + self.tax_total()
    }

    pub fn totals(&self) -> CartTotals {
        let subtotal = self.subtotal();
        let item_discount_total = self.item_discount_total();
        let bill_discount_amount = self.bill_discount_amount();
        let tax_total = self.tax_total();

        CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            subtotal,
            item_discount_total,
            bill_discount_amount,
            discount_total: item_discount_total + bill_discount_amount,
            tax_total,
            grand_total: subtotal - item_discount_total - bill_discount_amount + tax_total,
        }
    }

    // -------------------------------------------------------------------------
    // Session snapshot
    // -------------------------------------------------------------------------

    /// The slice of state that survives a restart.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            customer: self.customer.clone(),
            bill_discount: self.bill_discount,
        }
    }

    /// Rebuilds a cart from a snapshot. Nothing is selected.
    pub fn restore(snapshot: CartSnapshot) -> Self {
        PosCart {
            items: snapshot.items,
            customer: snapshot.customer,
            bill_discount: snapshot.bill_discount,
            selected_item_id: None,
        }
    }
}

/// Persisted cart slice: lines, customer and bill discount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSnapshot {
    pub items: Vec<PosCartItem>,
    pub customer: Option<Customer>,
    #[serde(default)]
    pub bill_discount: Discount,
}

impl CartSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemKind, PartyType};
    use chrono::Utc;

    fn test_item(id: &str, price_cents: i64, tax_bps: u32) -> Item {
        Item {
            id: id.to_string(),
            name: format!("Item {}", id),
            sku: Some(format!("SKU-{}", id)),
            item_type: ItemKind::Product,
            unit: Some("pcs".to_string()),
            stock_quantity: 100,
            purchase_price: Money::from_cents(price_cents / 2),
            sale_price: Money::from_cents(price_cents),
            tax_rate_bps: tax_bps,
            low_stock_alert: 5,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_customer() -> Customer {
        Customer {
            id: "c1".to_string(),
            name: "Ayesha Traders".to_string(),
            phone: None,
            email: None,
            address: None,
            party_type: PartyType::Customer,
            opening_balance: Money::zero(),
            current_balance: Money::zero(),
            credit_days: 30,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn assert_identity(cart: &PosCart) {
        assert_eq!(
            cart.grand_total(),
            cart.subtotal() - cart.discount_total() + cart.tax_total()
        );
        let totals = cart.totals();
        assert_eq!(totals.grand_total, cart.grand_total());
        assert_eq!(totals.discount_total, cart.discount_total());
    }

    #[test]
    fn test_add_item_seeds_line() {
        let mut cart = PosCart::new();
        let item = test_item("1", 999, 0);

        cart.add_item(&item);

        let line = cart.get("1").unwrap();
        assert_eq!(line.quantity, 1);
        assert_eq!(line.price.cents(), 999);
        assert_eq!(line.discount, Discount::Percentage(0));
        assert_eq!(cart.selected_item_id(), Some("1"));
    }

    #[test]
    fn test_add_same_item_keeps_price_and_discount() {
        let mut cart = PosCart::new();
        let item = test_item("1", 1000, 0);
        let other = test_item("2", 500, 0);

        cart.add_item(&item);
        cart.update_item_price("1", Money::from_cents(800)).unwrap();
        cart.update_item_discount("1", Discount::Percentage(500)).unwrap();
        cart.add_item(&other);
        cart.add_item(&item);

        let line = cart.get("1").unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.price.cents(), 800);
        assert_eq!(line.discount, Discount::Percentage(500));
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.selected_item_id(), Some("1"));
    }

    #[test]
    fn test_quantity_and_price_clamp_at_zero() {
        let mut cart = PosCart::new();
        cart.add_item(&test_item("1", 1000, 0));

        cart.update_quantity("1", -4).unwrap();
        assert_eq!(cart.get("1").unwrap().quantity, 0);
        assert_eq!(cart.item_count(), 1);

        cart.update_item_price("1", Money::from_cents(-50)).unwrap();
        assert_eq!(cart.get("1").unwrap().price, Money::zero());
    }

    #[test]
    fn test_unknown_item_is_reported() {
        let mut cart = PosCart::new();
        assert!(matches!(
            cart.update_quantity("missing", 2),
            Err(CoreError::ItemNotInCart(id)) if id == "missing"
        ));
        assert!(cart.remove_item("missing").is_err());
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut cart = PosCart::new();
        cart.add_item(&test_item("1", 1000, 0));
        cart.add_item(&test_item("2", 1000, 0));
        assert_eq!(cart.selected_item_id(), Some("2"));

        cart.remove_item("1").unwrap();
        assert_eq!(cart.selected_item_id(), Some("2"));

        cart.remove_item("2").unwrap();
        assert_eq!(cart.selected_item_id(), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_worked_example() {
        let mut cart = PosCart::new();
        // $10.00 at 10% tax, qty 2, 10% line discount
        cart.add_item(&test_item("1", 1000, 1000));
        cart.update_quantity("1", 2).unwrap();
        cart.update_item_discount("1", Discount::Percentage(1000)).unwrap();
        // $5.00 at 0% tax, qty 3, $0.50 per-unit discount
        cart.add_item(&test_item("2", 500, 0));
        cart.update_quantity("2", 3).unwrap();
        cart.update_item_discount("2", Discount::Fixed(Money::from_cents(50)))
            .unwrap();
        // 10% off the bill
        cart.set_bill_discount(Discount::Percentage(1000));

        let totals = cart.totals();
        assert_eq!(totals.subtotal.cents(), 3500);
        assert_eq!(totals.item_discount_total.cents(), 200 + 150);
        assert_eq!(totals.bill_discount_amount.cents(), 315);
        assert_eq!(totals.discount_total.cents(), 665);
        // Tax only on line 1 after its own discount: 1800 × 10%
        assert_eq!(totals.tax_total.cents(), 180);
        assert_eq!(totals.grand_total.cents(), 3500 - 665 + 180);
        assert_eq!(totals.total_quantity, 5);
    }

    #[test]
    fn test_fixed_bill_discount_is_flat() {
        let mut cart = PosCart::new();
        cart.add_item(&test_item("1", 1000, 0));
        cart.update_quantity("1", 4).unwrap();
        cart.set_bill_discount(Discount::Fixed(Money::from_cents(250)));

        assert_eq!(cart.bill_discount_amount().cents(), 250);
        assert_eq!(cart.grand_total().cents(), 3750);
    }

    #[test]
    fn test_bill_discount_does_not_change_tax() {
        let mut cart = PosCart::new();
        cart.add_item(&test_item("1", 1000, 825));
        let tax_before = cart.tax_total();

        cart.set_bill_discount(Discount::Percentage(5000));

        assert_eq!(cart.tax_total(), tax_before);
        assert_eq!(tax_before.cents(), 83);
    }

    #[test]
    fn test_grand_total_identity_holds_across_edits() {
        let mut cart = PosCart::new();
        let items: Vec<Item> = (0..6)
            .map(|i| test_item(&i.to_string(), 199 + i * 731, (i as u32 * 275) % 1800))
            .collect();

        for step in 0..60i64 {
            let item = &items[(step % 6) as usize];
            match step % 5 {
                0 => cart.add_item(item),
                1 => {
                    cart.add_item(item);
                    cart.update_quantity(&item.id, step % 7).unwrap();
                }
                2 => {
                    cart.add_item(item);
                    cart.update_item_discount(&item.id, Discount::Percentage(step * 37 % 12_000))
                        .unwrap();
                }
                3 => {
                    cart.add_item(item);
                    cart.update_item_discount(&item.id, Discount::Fixed(Money::from_cents(step * 3)))
                        .unwrap();
                }
                _ => cart.set_bill_discount(if step % 2 == 0 {
                    Discount::Percentage(step * 11)
                } else {
                    Discount::Fixed(Money::from_cents(step * 13))
                }),
            }
            assert_identity(&cart);
        }
    }

    #[test]
    fn test_out_of_range_discount_is_stored() {
        let mut cart = PosCart::new();
        cart.add_item(&test_item("1", 1000, 0));
        cart.update_item_discount("1", Discount::Percentage(15_000)).unwrap();

        assert_eq!(cart.item_discount_total().cents(), 1500);
        assert_eq!(cart.grand_total().cents(), -500);
        assert_identity(&cart);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cart = PosCart::new();
        cart.add_item(&test_item("1", 1000, 0));
        cart.set_customer(Some(test_customer()));
        cart.set_bill_discount(Discount::Fixed(Money::from_cents(100)));

        cart.clear();

        assert_eq!(cart, PosCart::new());
        assert_eq!(cart.grand_total(), Money::zero());
    }

    #[test]
    fn test_snapshot_round_trip_drops_selection() {
        let mut cart = PosCart::new();
        cart.add_item(&test_item("1", 1000, 825));
        cart.update_item_discount("1", Discount::Fixed(Money::from_cents(25)))
            .unwrap();
        cart.set_customer(Some(test_customer()));
        cart.set_bill_discount(Discount::Percentage(250));

        let json = cart.snapshot().to_json().unwrap();
        let restored = PosCart::restore(CartSnapshot::from_json(&json).unwrap());

        assert_eq!(restored.items(), cart.items());
        assert_eq!(restored.customer(), cart.customer());
        assert_eq!(restored.bill_discount(), cart.bill_discount());
        assert_eq!(restored.selected_item_id(), None);
        assert_eq!(restored.totals(), cart.totals());
    }

    #[test]
    fn test_discount_serde_shape() {
        let json = serde_json::to_string(&Discount::Fixed(Money::from_cents(50))).unwrap();
        assert_eq!(json, r#"{"type":"fixed","value":50}"#);
        let parsed: Discount = serde_json::from_str(r#"{"type":"percentage","value":1000}"#).unwrap();
        assert_eq!(parsed, Discount::Percentage(1000));
    }
}
