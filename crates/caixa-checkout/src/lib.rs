//! # Caixa Checkout
//!
//! The register-side checkout session: cart, promotions, loyalty
//! redemption and sale finalization over a storage backend.
//!
//! ## Module Organization
//! ```text
//! caixa_checkout/
//! ├── lib.rs            ◄─── You are here (startup helpers)
//! ├── session.rs        ◄─── CheckoutSession: the sale in progress
//! ├── backend.rs        ◄─── CheckoutBackend trait + Database impl
//! ├── shortcuts.rs      ◄─── Function key bindings
//! ├── notifications.rs  ◄─── Operator toasts
//! ├── state/
//! │   ├── config.rs     ◄─── ConfigState (file + CAIXA_* env)
//! │   ├── db.rs         ◄─── DbState (SQLite pool)
//! │   └── session.rs    ◄─── SessionState (shared session handle)
//! └── error.rs          ◄─── CheckoutError for the UI
//! ```
//!
//! ## Startup
//! ```rust,ignore
//! caixa_checkout::init_tracing();
//! let config = ConfigState::load(None)?;
//! let session = caixa_checkout::open_session(config).await?;
//! let state = SessionState::new(session);
//! ```

pub mod backend;
pub mod error;
pub mod notifications;
pub mod session;
pub mod shortcuts;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub use backend::CheckoutBackend;
pub use error::{CheckoutError, CheckoutResult, ErrorCode};
pub use notifications::{Notification, NotificationLevel};
pub use session::{
    AddOutcome, CheckoutSession, Prompt, SaleReceipt, SessionSnapshot, ShortcutOutcome, UiEffect,
};
pub use shortcuts::{ShortcutAction, ShortcutTable};
pub use state::{ConfigState, DbState, SessionState};

use caixa_db::Database;

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=caixa_checkout=trace` - Trace for this crate only
/// - Default: INFO, debug for caixa crates
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caixa_checkout=debug,caixa_db=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Opens the configured database and starts a session on it: loads the
/// operator's open shift and the active promotions.
pub async fn open_session(config: ConfigState) -> CheckoutResult<CheckoutSession<Database>> {
    let db = DbState::open(&config).await?;
    let mut session = CheckoutSession::new(db.database(), config)?;
    session.start().await?;

    info!(
        shift_open = session.shift().is_some(),
        promotions = session.promotions().len(),
        "Checkout session ready"
    );
    Ok(session)
}
