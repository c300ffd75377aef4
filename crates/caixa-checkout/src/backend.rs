//! # Checkout Backend
//!
//! Everything the checkout reads from or writes to storage, behind one
//! async trait. `caixa_db::Database` is the production implementation;
//! unit tests use the generated `MockCheckoutBackend`.
//!
//! ```text
//! Reads                                 Writes
//! ─────                                 ──────
//! find_product / search_products        create_sale          (sale + items + payments)
//! find_customer / search_customers      decrement_stock      (per product)
//! active_promotions(now)                record_shift_sale    (shift running totals)
//! customer_points                       record_loyalty       (ledger + balance)
//! open_shift(operator)                  record_commission
//!                                       start_shift          (operator, register)
//! ```

use async_trait::async_trait;
use chrono::NaiveDateTime;

use caixa_core::checkout::{CommissionRecord, FinalizedSale, LoyaltyLedgerEntry};
use caixa_core::loyalty::CustomerPoints;
use caixa_core::promotion::Promotion;
use caixa_core::shift::{CashShift, ShiftTotals};
use caixa_core::{Customer, Money, Product};
use caixa_db::{Database, DbResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// Product by id, active or not.
    async fn find_product(&self, id: &str) -> DbResult<Option<Product>>;

    /// Active product by barcode.
    async fn find_product_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>>;

    async fn search_products(&self, term: &str, limit: u32) -> DbResult<Vec<Product>>;

    async fn find_customer(&self, id: &str) -> DbResult<Option<Customer>>;

    async fn search_customers(&self, term: &str, limit: u32) -> DbResult<Vec<Customer>>;

    /// Promotions active at `now` (store local time), in creation order.
    async fn active_promotions(&self, now: NaiveDateTime) -> DbResult<Vec<Promotion>>;

    async fn customer_points(&self, customer_id: &str) -> DbResult<Option<CustomerPoints>>;

    async fn open_shift(&self, operator_id: &str) -> DbResult<Option<CashShift>>;

    /// Opens a shift for the operator at the named register.
    async fn start_shift(
        &self,
        operator_id: &str,
        register_name: &str,
        opening_balance: Money,
    ) -> DbResult<CashShift>;

    /// Stores the sale. Nothing else has been written when this fails.
    async fn create_sale(&self, sale: &FinalizedSale) -> DbResult<()>;

    async fn decrement_stock(&self, product_id: &str, amount: i64) -> DbResult<()>;

    async fn record_shift_sale(&self, shift_id: &str, delta: &ShiftTotals) -> DbResult<()>;

    async fn record_loyalty(&self, entry: &LoyaltyLedgerEntry) -> DbResult<()>;

    async fn record_commission(&self, record: &CommissionRecord) -> DbResult<()>;
}

#[async_trait]
impl CheckoutBackend for Database {
    async fn find_product(&self, id: &str) -> DbResult<Option<Product>> {
        self.products().get_by_id(id).await
    }

    async fn find_product_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        self.products().get_by_barcode(barcode).await
    }

    async fn search_products(&self, term: &str, limit: u32) -> DbResult<Vec<Product>> {
        self.products().search(term, limit).await
    }

    async fn find_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        self.customers().get_by_id(id).await
    }

    async fn search_customers(&self, term: &str, limit: u32) -> DbResult<Vec<Customer>> {
        self.customers().search(term, limit).await
    }

    async fn active_promotions(&self, now: NaiveDateTime) -> DbResult<Vec<Promotion>> {
        self.promotions().active_at(now).await
    }

    async fn customer_points(&self, customer_id: &str) -> DbResult<Option<CustomerPoints>> {
        self.loyalty().customer_points(customer_id).await
    }

    async fn open_shift(&self, operator_id: &str) -> DbResult<Option<CashShift>> {
        self.shifts().open_for_operator(operator_id).await
    }

    async fn start_shift(
        &self,
        operator_id: &str,
        register_name: &str,
        opening_balance: Money,
    ) -> DbResult<CashShift> {
        self.shifts().open(operator_id, register_name, opening_balance).await
    }

    async fn create_sale(&self, sale: &FinalizedSale) -> DbResult<()> {
        self.sales().insert(sale).await
    }

    async fn decrement_stock(&self, product_id: &str, amount: i64) -> DbResult<()> {
        self.products().decrement_stock(product_id, amount).await
    }

    async fn record_shift_sale(&self, shift_id: &str, delta: &ShiftTotals) -> DbResult<()> {
        self.shifts().record_sale(shift_id, delta).await
    }

    async fn record_loyalty(&self, entry: &LoyaltyLedgerEntry) -> DbResult<()> {
        self.loyalty().record(entry).await
    }

    async fn record_commission(&self, record: &CommissionRecord) -> DbResult<()> {
        self.commissions().insert(record).await
    }
}
