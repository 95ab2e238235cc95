use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::order::{LineItem, Order};

/// Pre-tax, tax and total amounts of a line or of a whole order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Amounts {
    pub pretax: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl std::ops::Add for Amounts {
    type Output = Amounts;

    fn add(self, other: Amounts) -> Amounts {
        Amounts {
            pretax: self.pretax + other.pretax,
            tax: self.tax + other.tax,
            total: self.total + other.total,
        }
    }
}

/// Computes a line's amounts from its quantity, unit price and tax rate.
///
/// Always derived from the inputs, never from the line's stored amount fields.
pub fn compute_line_amounts(line: &LineItem) -> Amounts {
    let pretax = Decimal::from(line.quantity) * line.unit_price;
    let tax = pretax * line.tax_rate / Decimal::ONE_HUNDRED;
    Amounts {
        pretax,
        tax,
        total: pretax + tax,
    }
}

/// Sums the freshly computed amounts of every line. An order without lines
/// totals zero.
pub fn compute_totals(order: &Order) -> Amounts {
    order
        .lines
        .iter()
        .map(compute_line_amounts)
        .fold(Amounts::default(), |acc, amounts| acc + amounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn test_line_amounts_follow_formula() {
        for (quantity, price, rate) in [(1, dec(0), dec(0)), (3, dec(200), dec(20)), (7, Decimal::new(1999, 2), Decimal::new(55, 1))] {
            let line = LineItem::new("Item", quantity, price, rate);
            let amounts = compute_line_amounts(&line);
            assert_eq!(amounts.pretax, Decimal::from(quantity) * price);
            assert_eq!(amounts.tax, amounts.pretax * rate / dec(100));
            assert_eq!(amounts.total, amounts.pretax + amounts.tax);
        }
    }

    #[test]
    fn test_stale_stored_amounts_are_ignored() {
        let mut line = LineItem::new("Item", 2, dec(50), dec(10));
        line.pretax_amount = dec(999);
        line.quantity = 4;
        let amounts = compute_line_amounts(&line);
        assert_eq!(amounts.pretax, dec(200));
        assert_eq!(amounts.tax, dec(20));
    }

    #[test]
    fn test_empty_order_totals_zero() {
        assert_eq!(compute_totals(&Order::draft()), Amounts::default());
    }

    #[test]
    fn test_two_line_order_totals() {
        let mut order = Order::draft();
        order.lines.push(LineItem::new("Chairs", 5, dec(100), dec(20)));
        order.lines.push(LineItem::new("Desks", 3, dec(200), dec(20)));

        let totals = compute_totals(&order);
        assert_eq!(totals.pretax, dec(1100));
        assert_eq!(totals.tax, dec(220));
        assert_eq!(totals.total, dec(1320));

        let summed = order
            .lines
            .iter()
            .map(compute_line_amounts)
            .fold(Amounts::default(), |acc, a| acc + a);
        assert_eq!(totals, summed);
    }
}
