//! # Checkout Session
//!
//! One register's sale in progress: the cart, the promotions in force,
//! the selected customer's loyalty state, the open shift and the
//! operator notifications.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  scan / add_product ──► Cart ──► reprice() ──► AppliedPromotion[]      │
//! │        │                  ▲          │                                  │
//! │        │ sold by weight   │          └── loyalty still fits? (warn)    │
//! │        ▼                  │                                             │
//! │  pending weighing ── confirm_weight(g)                                 │
//! │                                                                         │
//! │  select_customer ──► CustomerPoints ──► redeem_points / remove         │
//! │                                                                         │
//! │  finalize(tenders)                                                     │
//! │    re-read shift ─► ensure_ready ─► build_sale ─► create_sale          │
//! │                                        ├─ Err: notify, keep cart       │
//! │                                        └─ Ok: stock, shift, loyalty,   │
//! │                                           commission (failures →       │
//! │                                           warnings), clear cart,       │
//! │                                           reload promotions, receipt   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation reprices the cart synchronously against the clock, so
//! time-of-day windows open and close mid-sale. The only awaits are the
//! backend calls; nothing is retried.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::backend::CheckoutBackend;
use crate::error::{CheckoutError, CheckoutResult};
use crate::notifications::{Notification, NotificationQueue};
use crate::shortcuts::{ShortcutAction, ShortcutTable};
use crate::state::ConfigState;
use caixa_core::cart::{Cart, CartItem};
use caixa_core::checkout::{
    build_sale, commission_for, ensure_ready, loyalty_entries, stock_movements, CheckoutTotals,
    FinalizedSale, Receipt, SaleContext,
};
use caixa_core::loyalty::LoyaltyRedeemer;
use caixa_core::promotion::{AppliedPromotion, Promotion, PromotionEvaluator};
use caixa_core::shift::{CashShift, ShiftTotals};
use caixa_core::validation::validate_search_term;
use caixa_core::{CoreError, Customer, Discount, Money, Product, Tender, Weight, UNIDENTIFIED_CUSTOMER};

/// Source of the current instant.
pub type Clock = fn() -> DateTime<Utc>;

// =============================================================================
// Outcomes & Views
// =============================================================================

/// Result of putting a product in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddOutcome {
    Added { line_id: String },
    /// Product is sold by weight; waiting for `confirm_weight`.
    NeedsWeight { product: Product },
}

/// Operator input a shortcut asks the UI to collect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prompt {
    Quantity { line_id: String },
    PriceCheck,
    ItemDiscount { line_id: String },
    GlobalDiscount,
    Customer,
    Payment { total_cents: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UiEffect {
    ToggleFullscreen,
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShortcutOutcome {
    Performed { action: ShortcutAction },
    NeedsInput { prompt: Prompt },
    Ui { effect: UiEffect },
    Rejected { message: String },
    Unbound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyView {
    pub customer_id: String,
    pub program_name: String,
    /// Balance minus the staged redemption.
    pub available_points: i64,
    pub redeemed_points: i64,
    pub max_redeemable: i64,
    pub min_points_redeem: i64,
    pub discount_cents: i64,
}

/// Everything the checkout screen renders.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub items: Vec<CartItem>,
    pub applied_promotions: Vec<AppliedPromotion>,
    pub totals: CheckoutTotals,
    pub global_discount: Discount,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub loyalty: Option<LoyaltyView>,
    pub pending_weighing: Option<Product>,
    pub selected_line: Option<String>,
    pub shift_open: bool,
    pub can_checkout: bool,
}

/// A finished sale as returned to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale: FinalizedSale,
    pub receipt: Receipt,
    /// Follow-up writes that failed after the sale was stored.
    pub warnings: Vec<String>,
}

// =============================================================================
// Session
// =============================================================================

pub struct CheckoutSession<B> {
    backend: B,
    config: ConfigState,
    shortcuts: ShortcutTable,
    clock: Clock,
    cart: Cart,
    promotions: Vec<Promotion>,
    applied: Vec<AppliedPromotion>,
    loyalty: LoyaltyRedeemer,
    redemption_stale: bool,
    pending_weighing: Option<Product>,
    selected_line: Option<String>,
    shift: Option<CashShift>,
    notifications: NotificationQueue,
}

impl<B: CheckoutBackend> CheckoutSession<B> {
    /// Creates an idle session. Call [`CheckoutSession::start`] to load the
    /// shift and promotions.
    pub fn new(backend: B, config: ConfigState) -> CheckoutResult<Self> {
        let shortcuts = config.shortcut_table()?;
        Ok(CheckoutSession {
            backend,
            config,
            shortcuts,
            clock: Utc::now,
            cart: Cart::new(),
            promotions: Vec::new(),
            applied: Vec::new(),
            loyalty: LoyaltyRedeemer::new(),
            redemption_stale: false,
            pending_weighing: None,
            selected_line: None,
            shift: None,
            notifications: NotificationQueue::new(),
        })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Loads the operator's open shift and the active promotions.
    pub async fn start(&mut self) -> CheckoutResult<()> {
        self.refresh_shift().await?;
        self.refresh_promotions().await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Backend reads
    // -------------------------------------------------------------------------

    /// Reloads the operator's open shift. Returns whether one is open.
    pub async fn refresh_shift(&mut self) -> CheckoutResult<bool> {
        match self.backend.open_shift(&self.config.operator_id).await {
            Ok(shift) => {
                debug!(operator_id = %self.config.operator_id, open = shift.is_some(), "Shift refreshed");
                self.shift = shift;
                Ok(self.shift.is_some())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Opens a shift for the configured operator at the configured
    /// register.
    pub async fn open_shift(&mut self, opening_balance: Money) -> CheckoutResult<CashShift> {
        if self.refresh_shift().await? {
            return Err(self.fail(CheckoutError::validation("A shift is already open for this operator")));
        }

        match self
            .backend
            .start_shift(&self.config.operator_id, &self.config.register_name, opening_balance)
            .await
        {
            Ok(shift) => {
                info!(
                    shift_id = %shift.id,
                    operator_id = %shift.operator_id,
                    register = %shift.register_name,
                    opening = opening_balance.cents(),
                    "Shift opened"
                );
                self.notifications
                    .success(format!("Shift opened at {}", shift.register_name));
                self.shift = Some(shift.clone());
                Ok(shift)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Reloads the promotions in their date range and reprices the cart.
    pub async fn refresh_promotions(&mut self) -> CheckoutResult<usize> {
        let now = self.local_now();
        match self.backend.active_promotions(now).await {
            Ok(promotions) => {
                debug!(count = promotions.len(), "Promotions refreshed");
                self.promotions = promotions;
                self.reprice();
                Ok(self.promotions.len())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Product search for the picker and for price checks. Doesn't touch
    /// the cart.
    pub async fn search_products(&mut self, term: &str) -> CheckoutResult<Vec<Product>> {
        let term = validate_search_term(term).map_err(|e| self.fail(CoreError::from(e)))?;
        let limit = self.config.search_limit;
        self.backend
            .search_products(&term, limit)
            .await
            .map_err(|e| self.fail(e))
    }

    pub async fn search_customers(&mut self, term: &str) -> CheckoutResult<Vec<Customer>> {
        let term = validate_search_term(term).map_err(|e| self.fail(CoreError::from(e)))?;
        let limit = self.config.search_limit;
        self.backend
            .search_customers(&term, limit)
            .await
            .map_err(|e| self.fail(e))
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Looks a code up as barcode, then as product id, and adds it.
    pub async fn scan(&mut self, code: &str) -> CheckoutResult<AddOutcome> {
        let code = code.trim();
        let found = match self.backend.find_product_by_barcode(code).await {
            Ok(Some(product)) => Some(product),
            Ok(None) => self.backend.find_product(code).await.map_err(|e| self.fail(e))?,
            Err(e) => return Err(self.fail(e)),
        };

        match found {
            Some(product) => self.add_product(&product),
            None => Err(self.fail(CheckoutError::not_found("Product", code))),
        }
    }

    /// Adds one unit, or starts weight entry for products sold by weight.
    pub fn add_product(&mut self, product: &Product) -> CheckoutResult<AddOutcome> {
        if product.sold_by_weight {
            if !product.is_active {
                return Err(self.fail(CoreError::ProductInactive(product.id.clone())));
            }
            debug!(product_id = %product.id, "Waiting for weight");
            self.pending_weighing = Some(product.clone());
            return Ok(AddOutcome::NeedsWeight {
                product: product.clone(),
            });
        }

        match self.cart.add_item(product) {
            Ok(line_id) => {
                debug!(product_id = %product.id, line_id = %line_id, "Product added");
                self.notifications.success(format!("{} added", product.name));
                self.selected_line = Some(line_id.clone());
                self.reprice();
                Ok(AddOutcome::Added { line_id })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Adds the pending weighed product with the weight read from the scale.
    pub fn confirm_weight(&mut self, weight: Weight) -> CheckoutResult<String> {
        let Some(product) = self.pending_weighing.take() else {
            return Err(self.fail(CheckoutError::validation("No product is waiting for a weight")));
        };

        match self.cart.add_weighed_item(&product, weight) {
            Ok(line_id) => {
                debug!(product_id = %product.id, grams = weight.grams(), "Weighed product added");
                self.notifications
                    .success(format!("{} ({:.3} kg) added", product.name, weight.kilograms()));
                self.selected_line = Some(line_id.clone());
                self.reprice();
                Ok(line_id)
            }
            Err(e) => {
                // keep waiting so the operator can weigh again
                self.pending_weighing = Some(product);
                Err(self.fail(e))
            }
        }
    }

    pub fn cancel_weighing(&mut self) -> Option<Product> {
        self.pending_weighing.take()
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CheckoutResult<()> {
        if let Err(e) = self.cart.update_quantity(line_id, quantity) {
            return Err(self.fail(e));
        }
        self.fix_selection();
        self.reprice();
        Ok(())
    }

    pub fn remove_item(&mut self, line_id: &str) -> CheckoutResult<()> {
        match self.cart.remove_item(line_id) {
            Ok(item) => {
                self.notifications.info(format!("{} removed", item.name));
                self.fix_selection();
                self.reprice();
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn apply_item_discount(&mut self, line_id: &str, discount: Discount) -> CheckoutResult<()> {
        if let Err(e) = self.cart.apply_item_discount(line_id, discount) {
            return Err(self.fail(e));
        }
        self.reprice();
        Ok(())
    }

    pub fn set_global_discount(&mut self, discount: Discount) -> CheckoutResult<()> {
        if let Err(e) = self.cart.set_global_discount(discount) {
            return Err(self.fail(e));
        }
        self.reprice();
        Ok(())
    }

    /// Line targeted by quantity, discount and delete shortcuts.
    pub fn select_line(&mut self, line_id: &str) -> CheckoutResult<()> {
        if self.cart.line(line_id).is_none() {
            return Err(self.fail(CoreError::LineNotFound(line_id.to_string())));
        }
        self.selected_line = Some(line_id.to_string());
        Ok(())
    }

    /// Cancels the sale in progress.
    pub fn clear(&mut self) {
        if !self.cart.is_empty() {
            info!(lines = self.cart.items().len(), "Sale cancelled");
        }
        self.reset_sale();
    }

    /// Cancels the sale in progress and reloads the promotions for the next
    /// one.
    pub async fn new_sale(&mut self) {
        self.clear();
        self.reload_promotions().await;
    }

    // -------------------------------------------------------------------------
    // Customer & loyalty
    // -------------------------------------------------------------------------

    /// Attaches a customer and loads their loyalty balance.
    ///
    /// A failed balance lookup keeps the customer without loyalty and only
    /// warns.
    pub async fn select_customer(&mut self, customer_id: &str) -> CheckoutResult<()> {
        let customer = match self.backend.find_customer(customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => return Err(self.fail(CheckoutError::not_found("Customer", customer_id))),
            Err(e) => return Err(self.fail(e)),
        };

        let points = match self.backend.customer_points(customer_id).await {
            Ok(points) => points,
            Err(e) => {
                warn!(customer_id = %customer_id, error = %e, "Loyalty balance unavailable");
                self.notifications.warning("Loyalty balance unavailable");
                None
            }
        };

        info!(customer_id = %customer_id, points = ?points.as_ref().map(|p| p.available_points), "Customer selected");
        self.notifications
            .info(format!("Customer: {}", customer.display_name()));
        self.cart.set_customer(Some(customer));
        self.loyalty.load(points);
        self.redemption_stale = false;
        Ok(())
    }

    pub fn clear_customer(&mut self) {
        self.cart.set_customer(None);
        self.loyalty.reset();
        self.redemption_stale = false;
    }

    /// Stages a redemption against the current purchase value. `0` clears it.
    pub fn redeem_points(&mut self, points: i64) -> CheckoutResult<Money> {
        let max_discount = self.totals().before_loyalty();
        match self.loyalty.redeem(points, max_discount) {
            Ok(discount) => {
                debug!(points, discount = discount.cents(), "Points staged");
                self.redemption_stale = false;
                Ok(discount)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn remove_redemption(&mut self) {
        self.loyalty.remove_redemption();
        self.redemption_stale = false;
    }

    // -------------------------------------------------------------------------
    // Totals & checkout
    // -------------------------------------------------------------------------

    pub fn totals(&self) -> CheckoutTotals {
        CheckoutTotals::compute(&self.cart, &self.applied, self.loyalty.discount())
    }

    /// Cart non-empty, shift open, staged redemption still within the cap.
    pub fn check_ready(&self) -> CheckoutResult<()> {
        ensure_ready(&self.cart, self.shift.as_ref(), &self.totals(), &self.loyalty).map_err(CheckoutError::from)
    }

    pub fn can_checkout(&self) -> bool {
        self.check_ready().is_ok()
    }

    /// Validates the tenders, stores the sale and clears the cart.
    ///
    /// The operator's shift is read again first; a shift closed since it
    /// was loaded rejects the sale with `ShiftClosed`.
    ///
    /// ## Failure Handling
    /// - Precondition or tender errors: nothing is sent, cart untouched
    /// - `create_sale` fails: error notification, cart untouched (retry)
    /// - A follow-up write fails: logged and returned as a warning; the
    ///   sale is already stored, so the cart is still cleared
    pub async fn finalize(&mut self, tenders: Vec<Tender>) -> CheckoutResult<SaleReceipt> {
        self.refresh_shift().await?;
        self.reprice();
        if let Err(e) = self.check_ready() {
            return Err(self.fail(e));
        }
        let Some(shift_id) = self.shift.as_ref().map(|s| s.id.clone()) else {
            return Err(self.fail(CoreError::ShiftClosed));
        };

        let ctx = SaleContext {
            shift_id,
            operator_id: self.config.operator_id.clone(),
            seller_id: self.config.seller_id.clone(),
            device_id: self.config.device_id.clone(),
            now: (self.clock)(),
        };

        let sale = match build_sale(&self.cart, &self.applied, &self.loyalty, tenders, ctx) {
            Ok(sale) => sale,
            Err(e) => return Err(self.fail(e)),
        };

        debug!(sale_id = %sale.id, total = sale.totals.total_cents, "Submitting sale");
        if let Err(e) = self.backend.create_sale(&sale).await {
            error!(sale_id = %sale.id, error = %e, "Sale could not be stored");
            return Err(self.fail(e));
        }

        let warnings = self.record_follow_ups(&sale).await;
        for warning in &warnings {
            self.notifications.warning(warning.clone());
        }

        if let Some(shift) = self.shift.as_mut() {
            shift.totals.record_sale(&sale);
        }
        self.reset_sale();
        self.reload_promotions().await;

        info!(
            sale_id = %sale.id,
            receipt = %sale.receipt_number,
            total = sale.totals.total_cents,
            warnings = warnings.len(),
            "Sale finalized"
        );
        self.notifications.success(format!(
            "Sale {} finished: {}",
            sale.receipt_number,
            self.config.format_currency(sale.totals.total_cents)
        ));

        Ok(SaleReceipt {
            receipt: Receipt::from_sale(&sale).with_header(self.config.receipt_header()),
            sale,
            warnings,
        })
    }

    async fn record_follow_ups(&self, sale: &FinalizedSale) -> Vec<String> {
        let mut warnings = Vec::new();

        for (product_id, amount) in stock_movements(sale) {
            if let Err(e) = self.backend.decrement_stock(&product_id, amount).await {
                warn!(sale_id = %sale.id, product_id = %product_id, error = %e, "Stock not updated");
                warnings.push(format!("Stock of product {} not updated: {}", product_id, e));
            }
        }

        if let Err(e) = self
            .backend
            .record_shift_sale(&sale.shift_id, &ShiftTotals::for_sale(sale))
            .await
        {
            warn!(sale_id = %sale.id, shift_id = %sale.shift_id, error = %e, "Shift totals not updated");
            warnings.push(format!("Shift totals not updated: {}", e));
        }

        for entry in loyalty_entries(sale) {
            if let Err(e) = self.backend.record_loyalty(&entry).await {
                warn!(sale_id = %sale.id, kind = ?entry.kind, error = %e, "Loyalty not recorded");
                warnings.push(format!("Loyalty points ({:?}) not recorded: {}", entry.kind, e));
            }
        }

        if let Some(commission) = commission_for(sale, self.config.commission_rate()) {
            if let Err(e) = self.backend.record_commission(&commission).await {
                warn!(sale_id = %sale.id, seller_id = %commission.seller_id, error = %e, "Commission not recorded");
                warnings.push(format!("Commission not recorded: {}", e));
            }
        }

        warnings
    }

    // -------------------------------------------------------------------------
    // Shortcuts
    // -------------------------------------------------------------------------

    /// Dispatches a function key.
    pub fn handle_shortcut(&mut self, key: &str) -> ShortcutOutcome {
        let Some(action) = self.shortcuts.action_for(key) else {
            return ShortcutOutcome::Unbound;
        };
        debug!(key = %key, action = action.as_str(), "Shortcut");

        match action {
            ShortcutAction::NewSale | ShortcutAction::CancelSale => {
                if action == ShortcutAction::CancelSale && !self.cart.is_empty() {
                    self.notifications.info("Sale cancelled");
                }
                self.clear();
                ShortcutOutcome::Performed { action }
            }
            ShortcutAction::PriceCheck => ShortcutOutcome::NeedsInput {
                prompt: Prompt::PriceCheck,
            },
            ShortcutAction::TotalDiscount => ShortcutOutcome::NeedsInput {
                prompt: Prompt::GlobalDiscount,
            },
            ShortcutAction::SelectCustomer => ShortcutOutcome::NeedsInput {
                prompt: Prompt::Customer,
            },
            ShortcutAction::Fullscreen => ShortcutOutcome::Ui {
                effect: UiEffect::ToggleFullscreen,
            },
            ShortcutAction::EditQuantity | ShortcutAction::ItemDiscount | ShortcutAction::DeleteItem => {
                let Some(line_id) = self.selected_line.clone() else {
                    return self.reject(CoreError::EmptyCart);
                };
                match action {
                    ShortcutAction::EditQuantity => ShortcutOutcome::NeedsInput {
                        prompt: Prompt::Quantity { line_id },
                    },
                    ShortcutAction::ItemDiscount => ShortcutOutcome::NeedsInput {
                        prompt: Prompt::ItemDiscount { line_id },
                    },
                    _ => match self.remove_item(&line_id) {
                        Ok(()) => ShortcutOutcome::Performed { action },
                        Err(e) => ShortcutOutcome::Rejected { message: e.message },
                    },
                }
            }
            ShortcutAction::Finalize => match self.check_ready() {
                Ok(()) => ShortcutOutcome::NeedsInput {
                    prompt: Prompt::Payment {
                        total_cents: self.totals().total_cents,
                    },
                },
                Err(e) => self.reject(e),
            },
        }
    }

    fn reject(&mut self, err: impl Into<CheckoutError>) -> ShortcutOutcome {
        ShortcutOutcome::Rejected {
            message: self.fail(err).message,
        }
    }

    // -------------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------------

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Promotions loaded by the last refresh.
    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    pub fn applied_promotions(&self) -> &[AppliedPromotion] {
        &self.applied
    }

    pub fn loyalty(&self) -> &LoyaltyRedeemer {
        &self.loyalty
    }

    pub fn shift(&self) -> Option<&CashShift> {
        self.shift.as_ref()
    }

    pub fn pending_weighing(&self) -> Option<&Product> {
        self.pending_weighing.as_ref()
    }

    pub fn selected_line(&self) -> Option<&str> {
        self.selected_line.as_deref()
    }

    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let totals = self.totals();
        let loyalty = self.loyalty.customer_points().map(|points| LoyaltyView {
            customer_id: points.customer_id.clone(),
            program_name: points.program.name.clone(),
            available_points: self.loyalty.available(),
            redeemed_points: self.loyalty.redeemed_points(),
            max_redeemable: self.loyalty.max_redeemable(totals.before_loyalty()),
            min_points_redeem: points.program.min_points_redeem,
            discount_cents: self.loyalty.discount().cents(),
        });

        SessionSnapshot {
            items: self.cart.items().to_vec(),
            applied_promotions: self.applied.clone(),
            totals,
            global_discount: self.cart.global_discount(),
            customer_id: self.cart.customer().map(|c| c.id.clone()),
            customer_name: self
                .cart
                .customer()
                .map_or(UNIDENTIFIED_CUSTOMER, Customer::display_name)
                .to_string(),
            loyalty,
            pending_weighing: self.pending_weighing.clone(),
            selected_line: self.selected_line.clone(),
            shift_open: self.shift.as_ref().is_some_and(CashShift::is_open),
            can_checkout: self.can_checkout(),
        }
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn local_now(&self) -> NaiveDateTime {
        self.config.local_time((self.clock)())
    }

    /// Promotions for the next sale. A failed read keeps the current list.
    async fn reload_promotions(&mut self) {
        let now = self.local_now();
        match self.backend.active_promotions(now).await {
            Ok(promotions) => {
                debug!(count = promotions.len(), "Promotions reloaded");
                self.promotions = promotions;
                self.reprice();
            }
            Err(e) => {
                warn!(error = %e, "Promotions not reloaded");
                self.notifications
                    .warning("Promotions could not be reloaded; using the previous list");
            }
        }
    }

    /// Re-evaluates promotions for the current cart.
    fn reprice(&mut self) {
        let now = self.local_now();
        self.applied = PromotionEvaluator::new(&self.promotions, self.config.promotion_policy)
            .evaluate(self.cart.items(), now);

        let fits = self.loyalty.fits(self.totals().before_loyalty());
        if !fits && !self.redemption_stale {
            warn!(
                redeemed = self.loyalty.redeemed_points(),
                "Staged redemption exceeds the purchase value"
            );
            self.notifications
                .warning("Points redeemed exceed the purchase value; adjust the redemption");
        }
        self.redemption_stale = !fits;
    }

    fn fix_selection(&mut self) {
        let still_there = self
            .selected_line
            .as_deref()
            .is_some_and(|id| self.cart.line(id).is_some());
        if !still_there {
            self.selected_line = self.cart.items().last().map(|i| i.line_id.clone());
        }
    }

    fn reset_sale(&mut self) {
        self.cart.clear();
        self.applied.clear();
        self.loyalty.reset();
        self.redemption_stale = false;
        self.pending_weighing = None;
        self.selected_line = None;
    }

    /// Logs a failed action and queues it for the operator.
    fn fail(&mut self, err: impl Into<CheckoutError>) -> CheckoutError {
        let err = err.into();
        warn!(code = ?err.code, message = %err.message, "Checkout action rejected");
        self.notifications.error(err.message.clone());
        err
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
