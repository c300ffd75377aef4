//! # Cash Register Shifts
//!
//! Running totals of one operator's shift and the cash count at close.
//!
//! ```text
//! open (opening balance R$100.00)
//!   │
//!   ├── sale: cash R$50.00 for R$42.30 → change R$7.70
//!   ├── sale: pix R$18.90
//!   │
//!   ▼
//! close: expected cash = 100.00 + 50.00 − 7.70 = R$142.30
//!        counted       = R$140.00
//!        difference    = −R$2.30
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::checkout::FinalizedSale;
use crate::money::Money;
use crate::types::PaymentMethod;

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Closed,
}

/// Accumulated figures of a shift. Also used as the delta of one sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTotals {
    pub sale_count: i64,
    /// Sum of sale totals.
    pub gross_cents: i64,
    /// Sum of every discount given (item, promotion, global, loyalty).
    pub discount_cents: i64,
    /// Amounts tendered per method. Cash includes the part returned as change.
    pub cash_cents: i64,
    pub credit_card_cents: i64,
    pub debit_card_cents: i64,
    pub pix_cents: i64,
    pub fiado_cents: i64,
    pub change_cents: i64,
}

impl ShiftTotals {
    /// The figures one sale adds to a shift.
    pub fn for_sale(sale: &FinalizedSale) -> Self {
        let mut delta = ShiftTotals::default();
        delta.record_sale(sale);
        delta
    }

    pub fn record_sale(&mut self, sale: &FinalizedSale) {
        self.sale_count += 1;
        self.gross_cents += sale.totals.total_cents;
        self.discount_cents += sale.totals.total_discount().cents();
        for tender in &sale.tenders {
            *self.method_mut(tender.method) += tender.amount_cents;
        }
        self.change_cents += sale.change_cents;
    }

    /// Adds another set of totals (a sale delta) to these.
    pub fn merge(&mut self, other: &ShiftTotals) {
        self.sale_count += other.sale_count;
        self.gross_cents += other.gross_cents;
        self.discount_cents += other.discount_cents;
        self.cash_cents += other.cash_cents;
        self.credit_card_cents += other.credit_card_cents;
        self.debit_card_cents += other.debit_card_cents;
        self.pix_cents += other.pix_cents;
        self.fiado_cents += other.fiado_cents;
        self.change_cents += other.change_cents;
    }

    pub fn method_total(&self, method: PaymentMethod) -> Money {
        let cents = match method {
            PaymentMethod::Cash => self.cash_cents,
            PaymentMethod::CreditCard => self.credit_card_cents,
            PaymentMethod::DebitCard => self.debit_card_cents,
            PaymentMethod::Pix => self.pix_cents,
            PaymentMethod::Fiado => self.fiado_cents,
        };
        Money::from_cents(cents)
    }

    fn method_mut(&mut self, method: PaymentMethod) -> &mut i64 {
        match method {
            PaymentMethod::Cash => &mut self.cash_cents,
            PaymentMethod::CreditCard => &mut self.credit_card_cents,
            PaymentMethod::DebitCard => &mut self.debit_card_cents,
            PaymentMethod::Pix => &mut self.pix_cents,
            PaymentMethod::Fiado => &mut self.fiado_cents,
        }
    }
}

/// A cash register shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashShift {
    pub id: String,
    pub operator_id: String,
    pub register_name: String,
    pub status: ShiftStatus,
    pub opening_balance_cents: i64,
    pub totals: ShiftTotals,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub counted_cash_cents: Option<i64>,
}

impl CashShift {
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// Opening balance + cash received − change given.
    pub fn expected_cash(&self) -> Money {
        Money::from_cents(self.opening_balance_cents + self.totals.cash_cents - self.totals.change_cents)
    }

    pub fn reconcile(&self, counted: Money) -> ShiftReconciliation {
        let expected = self.expected_cash();
        ShiftReconciliation {
            expected_cents: expected.cents(),
            counted_cents: counted.cents(),
            difference_cents: (counted - expected).cents(),
        }
    }
}

/// Result of counting the drawer. Negative difference means missing cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReconciliation {
    pub expected_cents: i64,
    pub counted_cents: i64,
    pub difference_cents: i64,
}

impl ShiftReconciliation {
    pub fn is_balanced(&self) -> bool {
        self.difference_cents == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutTotals;
    use crate::types::Tender;

    fn shift() -> CashShift {
        CashShift {
            id: "s-1".to_string(),
            operator_id: "op-1".to_string(),
            register_name: "Caixa 01".to_string(),
            status: ShiftStatus::Open,
            opening_balance_cents: 10_000,
            totals: ShiftTotals::default(),
            opened_at: Utc::now(),
            closed_at: None,
            counted_cash_cents: None,
        }
    }

    fn sale(total: i64, tenders: Vec<Tender>, change: i64) -> FinalizedSale {
        FinalizedSale {
            id: "sale".to_string(),
            receipt_number: "R".to_string(),
            shift_id: "s-1".to_string(),
            operator_id: "op-1".to_string(),
            seller_id: None,
            customer_id: None,
            customer_name: crate::UNIDENTIFIED_CUSTOMER.to_string(),
            lines: Vec::new(),
            totals: CheckoutTotals {
                subtotal_cents: total + 100,
                global_discount_cents: 100,
                total_cents: total,
                ..CheckoutTotals::default()
            },
            paid_cents: tenders.iter().map(|t| t.amount_cents).sum(),
            tenders,
            change_cents: change,
            points_redeemed: 0,
            points_earned: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_sales_and_reconcile() {
        let mut shift = shift();

        shift
            .totals
            .record_sale(&sale(4230, vec![Tender::new(PaymentMethod::Cash, 5000)], 770));
        shift
            .totals
            .merge(&ShiftTotals::for_sale(&sale(1890, vec![Tender::new(PaymentMethod::Pix, 1890)], 0)));

        assert_eq!(shift.totals.sale_count, 2);
        assert_eq!(shift.totals.gross_cents, 6120);
        assert_eq!(shift.totals.discount_cents, 200);
        assert_eq!(shift.totals.method_total(PaymentMethod::Pix).cents(), 1890);
        assert_eq!(shift.expected_cash().cents(), 14_230);

        let rec = shift.reconcile(Money::from_cents(14_000));
        assert_eq!(rec.difference_cents, -230);
        assert!(!rec.is_balanced());
        assert!(shift.reconcile(Money::from_cents(14_230)).is_balanced());
    }
}
