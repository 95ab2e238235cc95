use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::lifecycle::amounts::{compute_line_amounts, compute_totals, Amounts};

/// Order status enumeration.
///
/// The backend owns every transition between these values; the client only
/// reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Draft,
    Confirmed,
    Pending,
    PartiallyDelivered,
    Delivered,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Draft => write!(f, "DRAFT"),
            OrderStatus::Confirmed => write!(f, "CONFIRMED"),
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::PartiallyDelivered => write!(f, "PARTIALLY_DELIVERED"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(OrderStatus::Draft),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "PENDING" => Ok(OrderStatus::Pending),
            "PARTIALLY_DELIVERED" => Ok(OrderStatus::PartiallyDelivered),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// Per-line reception status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStatus {
    #[default]
    Pending,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineStatus::Pending => write!(f, "PENDING"),
            LineStatus::PartiallyReceived => write!(f, "PARTIALLY_RECEIVED"),
            LineStatus::Received => write!(f, "RECEIVED"),
            LineStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// The supplier an order resolves to at save time.
///
/// Exactly one of the two is ever sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierRef {
    /// A known supplier record
    Id(i64),

    /// A raw address, used when no supplier record exists ("email mode")
    Email(String),
}

/// One ordered product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Server-assigned identifier, absent until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Supplier or internal reference code
    #[serde(default)]
    pub reference: Option<String>,

    /// Product designation (required)
    pub designation: String,

    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,

    /// Ordered quantity
    pub quantity: u32,

    /// Unit price before tax
    pub unit_price: Decimal,

    /// Tax rate in percent
    pub tax_rate: Decimal,

    /// Derived: quantity × unit price
    #[serde(default)]
    pub pretax_amount: Decimal,

    /// Derived: pre-tax amount × rate / 100
    #[serde(default)]
    pub tax_amount: Decimal,

    /// Derived: pre-tax + tax
    #[serde(default)]
    pub total_amount: Decimal,

    /// Linked product, if the line was picked from the catalogue
    #[serde(default)]
    pub product_id: Option<i64>,

    /// Reception status
    #[serde(default)]
    pub status: LineStatus,

    /// Quantity received so far
    #[serde(default)]
    pub quantity_received: u32,
}

impl LineItem {
    /// Creates a pending line with its amounts already computed.
    pub fn new(
        designation: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        let mut line = LineItem {
            id: None,
            reference: None,
            designation: designation.into(),
            description: None,
            quantity,
            unit_price,
            tax_rate,
            pretax_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            product_id: None,
            status: LineStatus::Pending,
            quantity_received: 0,
        };
        line.recompute();
        line
    }

    /// Links the line to a catalogue product, whose stock moves on delivery.
    pub fn with_product(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Refreshes the derived amount fields from quantity, price and rate.
    pub fn recompute(&mut self) {
        let amounts = compute_line_amounts(self);
        self.pretax_amount = amounts.pretax;
        self.tax_amount = amounts.tax;
        self.total_amount = amounts.total;
    }

    /// Quantity still expected from the supplier.
    pub fn quantity_outstanding(&self) -> u32 {
        self.quantity.saturating_sub(self.quantity_received)
    }
}

/// Purchase order (commande) sent to a supplier.
///
/// Totals carried here are derived from `lines`; they are never the source
/// of truth on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Server-assigned identifier, absent until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Human-readable order number, assigned by the backend
    #[serde(default)]
    pub number: String,

    /// Supplier record the order is placed with
    #[serde(default, rename = "fournisseurId", skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i64>,

    /// Raw supplier address for orders created in email mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_email: Option<String>,

    /// Date the order was placed
    #[serde(default)]
    pub order_date: Option<NaiveDate>,

    /// Expected delivery date
    #[serde(default)]
    pub expected_delivery_date: Option<NaiveDate>,

    /// Actual delivery date
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,

    /// Order status
    #[serde(default)]
    pub status: OrderStatus,

    /// Sum of line pre-tax amounts
    #[serde(default)]
    pub pretax_amount: Decimal,

    /// Sum of line tax amounts
    #[serde(default)]
    pub tax_amount: Decimal,

    /// Sum of line totals
    #[serde(default)]
    pub total_amount: Decimal,

    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,

    /// Ordered line items
    #[serde(default)]
    pub lines: Vec<LineItem>,

    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Suffix appended to the number of a locally synthesized placeholder order.
pub const PLACEHOLDER_NUMBER_SUFFIX: &str = "-ERROR";

impl Order {
    /// A fresh client-side draft: no supplier, no lines, nothing persisted.
    pub fn draft() -> Self {
        Order {
            id: None,
            number: String::new(),
            supplier_id: None,
            supplier_email: None,
            order_date: None,
            expected_delivery_date: None,
            delivery_date: None,
            status: OrderStatus::Draft,
            pretax_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            notes: None,
            lines: Vec::new(),
            created_at: None,
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    /// Stand-in returned when every retrieval attempt for `id` failed.
    pub fn placeholder(id: i64) -> Self {
        Order {
            id: Some(id),
            number: format!("CMD-{}{}", id, PLACEHOLDER_NUMBER_SUFFIX),
            ..Order::draft()
        }
    }

    /// Whether this order was synthesized locally after a failed fetch.
    ///
    /// Callers must treat such an order as unknown, not as a real draft.
    pub fn is_placeholder(&self) -> bool {
        self.number.ends_with(PLACEHOLDER_NUMBER_SUFFIX)
    }

    /// Refreshes every line's amounts, then the order totals.
    pub fn recompute_totals(&mut self) {
        for line in &mut self.lines {
            line.recompute();
        }
        let Amounts { pretax, tax, total } = compute_totals(self);
        self.pretax_amount = pretax;
        self.tax_amount = tax;
        self.total_amount = total;
    }

    /// Copy of this order carrying only the given supplier reference.
    pub fn with_supplier(&self, supplier: &SupplierRef) -> Order {
        let mut payload = self.clone();
        match supplier {
            SupplierRef::Id(id) => {
                payload.supplier_id = Some(*id);
                payload.supplier_email = None;
            }
            SupplierRef::Email(email) => {
                payload.supplier_id = None;
                payload.supplier_email = Some(email.clone());
            }
        }
        payload
    }
}

/// Quantity received for one line in a partial delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineReceipt {
    pub line_id: i64,
    pub quantity_received: u32,
}

/// Partial delivery request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDelivery {
    pub receipts: Vec<LineReceipt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_status_rejected_at_deserialization() {
        let result: Result<Order, _> = serde_json::from_value(json!({
            "id": 4,
            "number": "CMD-4",
            "status": "SHIPPED",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_status_round_trips_through_display() {
        for status in [
            OrderStatus::Draft,
            OrderStatus::Confirmed,
            OrderStatus::Pending,
            OrderStatus::PartiallyDelivered,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_placeholder_is_flagged() {
        let order = Order::placeholder(42);
        assert_eq!(order.id, Some(42));
        assert_eq!(order.status, OrderStatus::Draft);
        assert_eq!(order.total_amount, Decimal::ZERO);
        assert!(order.number.ends_with(PLACEHOLDER_NUMBER_SUFFIX));
        assert!(order.is_placeholder());
        assert!(!Order::draft().is_placeholder());
    }

    #[test]
    fn test_with_supplier_keeps_a_single_reference() {
        let mut order = Order::draft();
        order.supplier_id = Some(3);
        order.supplier_email = Some("old@example.com".to_string());

        let by_email = order.with_supplier(&SupplierRef::Email("a@b.co".to_string()));
        assert_eq!(by_email.supplier_id, None);
        assert_eq!(by_email.supplier_email.as_deref(), Some("a@b.co"));

        let by_id = order.with_supplier(&SupplierRef::Id(9));
        assert_eq!(by_id.supplier_id, Some(9));
        assert_eq!(by_id.supplier_email, None);

        let body = serde_json::to_value(&by_id).unwrap();
        assert_eq!(body["fournisseurId"], 9);
        assert!(body.get("supplierEmail").is_none());
    }

    #[test]
    fn test_quantity_outstanding_saturates() {
        let mut line = LineItem::new("Paper", 5, Decimal::new(10, 0), Decimal::new(20, 0));
        line.quantity_received = 7;
        assert_eq!(line.quantity_outstanding(), 0);
    }
}
