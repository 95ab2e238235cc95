use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::ValidationError;
use crate::models::order::{Order, SupplierRef};

/// How the supplier of a new order is designated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupplierMode {
    /// Pick an existing supplier record
    #[default]
    Id,

    /// Type a raw email address
    Email,
}

impl fmt::Display for SupplierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplierMode::Id => write!(f, "id"),
            SupplierMode::Email => write!(f, "email"),
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Basic `local@domain.tld` syntax check.
pub fn is_valid_email(candidate: &str) -> bool {
    email_pattern().is_match(candidate.trim())
}

/// Checks an order before it is sent to the backend.
///
/// On success, returns the single supplier reference the save must use:
/// the supplier id in [`SupplierMode::Id`], the trimmed email in
/// [`SupplierMode::Email`]. The field belonging to the other mode is ignored.
pub fn validate_for_save(order: &Order, mode: SupplierMode) -> Result<SupplierRef, ValidationError> {
    if order.lines.is_empty() {
        return Err(ValidationError::NoLines);
    }

    let supplier = match mode {
        SupplierMode::Id => order
            .supplier_id
            .map(SupplierRef::Id)
            .ok_or(ValidationError::MissingSupplier)?,
        SupplierMode::Email => {
            let email = order.supplier_email.as_deref().unwrap_or("").trim();
            if !is_valid_email(email) {
                return Err(ValidationError::InvalidSupplierEmail(email.to_string()));
            }
            SupplierRef::Email(email.to_string())
        }
    };

    for (index, line) in order.lines.iter().enumerate() {
        if line.designation.trim().is_empty() {
            return Err(ValidationError::MissingDesignation { index });
        }
        if line.quantity == 0 {
            return Err(ValidationError::ZeroQuantity { index });
        }
        if line.unit_price < Decimal::ZERO {
            return Err(ValidationError::NegativeUnitPrice { index });
        }
        if line.tax_rate < Decimal::ZERO {
            return Err(ValidationError::NegativeTaxRate { index });
        }
    }

    Ok(supplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::LineItem;

    fn order_with_line() -> Order {
        let mut order = Order::draft();
        order
            .lines
            .push(LineItem::new("Paper", 2, Decimal::from(5), Decimal::from(20)));
        order
    }

    #[test]
    fn test_empty_lines_fail_in_every_mode() {
        let mut order = Order::draft();
        order.supplier_id = Some(1);
        order.supplier_email = Some("a@b.co".to_string());
        assert_eq!(validate_for_save(&order, SupplierMode::Id), Err(ValidationError::NoLines));
        assert_eq!(validate_for_save(&order, SupplierMode::Email), Err(ValidationError::NoLines));
    }

    #[test]
    fn test_id_mode_requires_supplier() {
        let order = order_with_line();
        assert_eq!(
            validate_for_save(&order, SupplierMode::Id),
            Err(ValidationError::MissingSupplier)
        );
    }

    #[test]
    fn test_id_mode_ignores_email() {
        let mut order = order_with_line();
        order.supplier_id = Some(12);
        order.supplier_email = Some("not-an-email".to_string());
        assert_eq!(validate_for_save(&order, SupplierMode::Id), Ok(SupplierRef::Id(12)));
    }

    #[test]
    fn test_email_mode_checks_syntax() {
        let mut order = order_with_line();
        order.supplier_email = Some("not-an-email".to_string());
        assert_eq!(
            validate_for_save(&order, SupplierMode::Email),
            Err(ValidationError::InvalidSupplierEmail("not-an-email".to_string()))
        );

        order.supplier_email = Some("a@b.co".to_string());
        assert_eq!(
            validate_for_save(&order, SupplierMode::Email),
            Ok(SupplierRef::Email("a@b.co".to_string()))
        );
    }

    #[test]
    fn test_email_mode_without_email_fails() {
        let mut order = order_with_line();
        order.supplier_id = Some(4);
        assert!(matches!(
            validate_for_save(&order, SupplierMode::Email),
            Err(ValidationError::InvalidSupplierEmail(_))
        ));
    }

    #[test]
    fn test_line_checks() {
        let mut order = order_with_line();
        order.supplier_id = Some(1);
        order.lines[0].quantity = 0;
        assert_eq!(
            validate_for_save(&order, SupplierMode::Id),
            Err(ValidationError::ZeroQuantity { index: 0 })
        );

        order.lines[0].quantity = 1;
        order.lines[0].designation = "  ".to_string();
        assert_eq!(
            validate_for_save(&order, SupplierMode::Id),
            Err(ValidationError::MissingDesignation { index: 0 })
        );

        order.lines[0].designation = "Paper".to_string();
        order.lines[0].tax_rate = Decimal::from(-1);
        assert_eq!(
            validate_for_save(&order, SupplierMode::Id),
            Err(ValidationError::NegativeTaxRate { index: 0 })
        );
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email(" buyer@supplies.example.com "));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email(""));
    }
}
