use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::order::OrderStatus;

/// Page envelope shared by the plain listing and the advanced search.
///
/// Only these fields are common to both endpoints; anything else either one
/// returns is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,

    pub total_elements: u64,

    #[serde(default)]
    pub total_pages: Option<u32>,

    /// Zero-based page index
    #[serde(default)]
    pub number: u32,

    #[serde(default)]
    pub size: u32,
}

/// Optional order search criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilters {
    /// Substring of the order number
    pub number: Option<String>,
    pub supplier_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl OrderFilters {
    /// True when no criterion is set. Blank number strings count as unset.
    pub fn is_empty(&self) -> bool {
        self.number.as_deref().map_or(true, |n| n.trim().is_empty())
            && self.supplier_id.is_none()
            && self.status.is_none()
            && self.from.is_none()
            && self.to.is_none()
    }

    /// Query-string pairs for the advanced search endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(number) = self.number.as_deref().map(str::trim) {
            if !number.is_empty() {
                pairs.push(("number", number.to_string()));
            }
        }
        if let Some(supplier_id) = self.supplier_id {
            pairs.push(("supplierId", supplier_id.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_number_is_empty() {
        let filters = OrderFilters {
            number: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(filters.is_empty());
        assert!(filters.query_pairs().is_empty());
    }

    #[test]
    fn test_query_pairs() {
        let filters = OrderFilters {
            number: Some("CMD-2".to_string()),
            status: Some(OrderStatus::Confirmed),
            from: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };
        assert!(!filters.is_empty());
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("number", "CMD-2".to_string()),
                ("status", "CONFIRMED".to_string()),
                ("from", "2024-03-01".to_string()),
            ]
        );
    }
}
