//! # State Module
//!
//! Process-wide state of a register.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │ ConfigState  │  │    DbState       │  │     SessionState<B>      │  │
//! │  │              │  │                  │  │                          │  │
//! │  │ device_id    │  │  Database        │  │  Arc<Mutex<              │  │
//! │  │ operator_id  │  │  (SQLite pool)   │  │    CheckoutSession<B>    │  │
//! │  │ policy, ...  │  │                  │  │  >>                      │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  ConfigState: read-only after load                                      │
//! │  DbState: the pool is thread-safe                                       │
//! │  SessionState: one command at a time changes the sale                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod session;

pub use config::{ConfigState, CONFIG_FILE_NAME, DATABASE_FILE_NAME};
pub use db::DbState;
pub use session::SessionState;
