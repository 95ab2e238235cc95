use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalogue product, used to prefill order lines and for stock alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    #[serde(default)]
    pub reference: Option<String>,

    pub name: String,

    /// Default purchase price before tax
    #[serde(default)]
    pub unit_price: Decimal,

    /// Default tax rate in percent
    #[serde(default)]
    pub tax_rate: Decimal,

    #[serde(default)]
    pub stock_quantity: i64,

    /// Stock level at or below which the product is flagged
    #[serde(default)]
    pub alert_threshold: i64,
}

impl Product {
    /// Stock at or below the alert threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.alert_threshold
    }
}
