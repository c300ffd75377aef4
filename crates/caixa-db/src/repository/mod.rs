//! # Repository Module
//!
//! One repository per aggregate, each holding a clone of the pool.
//!
//! ```text
//! db.products()     ProductRepository     catalog reads, stock decrement
//! db.customers()    CustomerRepository    lookup and search
//! db.promotions()   PromotionRepository   rules, scope targets, active list
//! db.loyalty()      LoyaltyRepository     programs, balances, ledger
//! db.shifts()       ShiftRepository       open/close, running totals
//! db.sales()        SaleRepository        sale + items + payments
//! db.commissions()  CommissionRepository  seller commissions
//! ```
//!
//! Rows are read into `sqlx::FromRow` record structs and converted to the
//! caixa-core types; conversion failures surface as `DbError::InvalidData`.

pub mod commission;
pub mod customer;
pub mod loyalty;
pub mod product;
pub mod promotion;
pub mod sale;
pub mod shift;
