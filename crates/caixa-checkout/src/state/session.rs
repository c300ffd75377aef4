//! # Session State
//!
//! Shared handle to the register's checkout session.
//!
//! ## Thread Safety
//! The session sits behind `Arc<tokio::sync::Mutex<T>>`: UI commands may
//! arrive concurrently, only one may change the sale at a time, and the
//! lock is held across backend awaits (e.g. during `finalize`).

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::backend::CheckoutBackend;
use crate::session::{CheckoutSession, SessionSnapshot};

pub struct SessionState<B> {
    session: Arc<Mutex<CheckoutSession<B>>>,
}

impl<B> Clone for SessionState<B> {
    fn clone(&self) -> Self {
        SessionState {
            session: Arc::clone(&self.session),
        }
    }
}

impl<B: CheckoutBackend> SessionState<B> {
    pub fn new(session: CheckoutSession<B>) -> Self {
        SessionState {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Exclusive access to the session, e.g. for async operations.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let outcome = state.lock().await.scan("7891000100103").await?;
    /// ```
    pub async fn lock(&self) -> MutexGuard<'_, CheckoutSession<B>> {
        self.session.lock().await
    }

    /// Runs a synchronous operation on the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let outcome = state.with_session(|s| s.handle_shortcut("F7")).await;
    /// ```
    pub async fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CheckoutSession<B>) -> R,
    {
        let mut session = self.session.lock().await;
        f(&mut session)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockCheckoutBackend;
    use crate::state::ConfigState;
    use caixa_core::Product;

    #[tokio::test]
    async fn test_clones_share_one_session() {
        let session = CheckoutSession::new(MockCheckoutBackend::new(), ConfigState::default()).unwrap();
        let state = SessionState::new(session);
        let other = state.clone();

        let product = Product::new("p-1", "SKU-1", "Café", 1590);
        let handle = tokio::spawn(async move {
            let added = other.with_session(|s| s.add_product(&product).map(|_| ())).await;
            added
        });
        handle.await.unwrap().unwrap();

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.totals.total_cents, 1590);
        assert!(!snapshot.can_checkout);
    }
}
