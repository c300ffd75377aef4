//! # caixa-db: Database Layer for Caixa POS
//!
//! SQLite storage behind the checkout: catalog reads, promotions, loyalty
//! balances, cash shifts and finalized sales.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caixa POS Data Flow                              │
//! │                                                                         │
//! │  CheckoutSession (caixa-checkout)                                      │
//! │       │  via the CheckoutBackend trait                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     caixa-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Product       │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Customer      │    │ 001_initial  │  │   │
//! │  │   │               │    │ Promotion     │    │ _schema.sql  │  │   │
//! │  │   │               │    │ Loyalty       │    │              │  │   │
//! │  │   │               │    │ Shift         │    │              │  │   │
//! │  │   │               │    │ Sale          │    │              │  │   │
//! │  │   │               │    │ Commission    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (data dir) or :memory: in tests                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caixa_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("caixa.db")).await?;
//! let products = db.products().search("cafe", 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::commission::CommissionRepository;
pub use repository::customer::CustomerRepository;
pub use repository::loyalty::LoyaltyRepository;
pub use repository::product::ProductRepository;
pub use repository::promotion::PromotionRepository;
pub use repository::sale::SaleRepository;
pub use repository::shift::ShiftRepository;
