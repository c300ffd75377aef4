//! End-to-end checkout against an in-memory SQLite database.

use caixa_checkout::{AddOutcome, CheckoutSession, ConfigState, ErrorCode, SessionState};
use caixa_core::loyalty::LoyaltyProgram;
use caixa_core::promotion::{Promotion, PromotionRule, PromotionScope, ValidityWindow};
use caixa_core::{Customer, Money, PaymentMethod, Percentage, Product, Tender, Weight};
use caixa_db::{Database, DbConfig};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// 2024-06-15 12:00 store time.
fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 15, 0, 0).unwrap()
}

fn cafe() -> Product {
    let mut product = Product::new("cafe", "CAF-500", "Café Torrado 500g", 1590);
    product.barcode = Some("7891000100103".to_string());
    product.track_inventory = true;
    product.stock = Some(50);
    product
}

fn picanha() -> Product {
    let mut product = Product::new("picanha", "ACG-PIC", "Picanha kg", 6990).by_weight();
    product.track_inventory = true;
    product.stock = Some(10_000);
    product
}

fn config() -> ConfigState {
    ConfigState {
        seller_id: Some("vend-1".to_string()),
        commission_rate_bps: 200,
        ..ConfigState::default()
    }
}

async fn seeded_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    db.products().insert(&cafe()).await.unwrap();
    db.products().insert(&picanha()).await.unwrap();
    db.customers()
        .insert(&Customer::new("c-1", "Ana Souza"))
        .await
        .unwrap();

    let program = LoyaltyProgram {
        id: "clube".to_string(),
        name: "Clube Caixa".to_string(),
        point_value_cents: 5,
        min_points_redeem: 100,
        earn_points_per_unit: 1.0,
        is_active: true,
    };
    db.loyalty().insert_program(&program).await.unwrap();
    db.loyalty().set_balance("c-1", "clube", 1_000).await.unwrap();

    let promo = Promotion::new("cafe-3x2", "Café leve 3 pague 2", PromotionRule::BuyXGetY { buy: 2, get: 1 })
        .with_scope(PromotionScope::Products(vec!["cafe".to_string()]));
    db.promotions().insert(&promo).await.unwrap();

    db.shifts()
        .open("operador", "Caixa 01", Money::from_cents(20_000))
        .await
        .unwrap();

    db
}

async fn started_session(db: &Database) -> CheckoutSession<Database> {
    let mut session = CheckoutSession::new(db.clone(), config())
        .unwrap()
        .with_clock(noon);
    session.start().await.unwrap();
    session
}

#[tokio::test]
async fn full_sale_updates_stock_shift_loyalty_and_commission() {
    caixa_checkout::init_tracing();
    let db = seeded_db().await;
    let mut session = started_session(&db).await;
    assert!(session.shift().is_some());
    assert_eq!(session.promotions().len(), 1);

    for _ in 0..3 {
        session.scan("7891000100103").await.unwrap();
    }
    let outcome = session.scan("picanha").await.unwrap();
    assert!(matches!(outcome, AddOutcome::NeedsWeight { .. }));
    session.confirm_weight(Weight::from_grams(500)).unwrap();

    // café 3 × 15,90 = 47,70 minus one free; picanha 0,5 kg × 69,90 = 34,95
    let totals = session.totals();
    assert_eq!(totals.subtotal_cents, 8265);
    assert_eq!(totals.promotion_discount_cents, 1590);

    session.select_customer("c-1").await.unwrap();
    assert_eq!(session.redeem_points(200).unwrap(), Money::from_cents(1000));
    assert_eq!(session.totals().total_cents, 5675);

    let result = session
        .finalize(vec![Tender::new(PaymentMethod::Cash, 6000)])
        .await
        .unwrap();
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.sale.change_cents, 325);
    assert_eq!(result.sale.points_earned, 56);
    assert!(session.cart().is_empty());

    let stored = db.sales().get_by_id(&result.sale.id).await.unwrap().unwrap();
    assert_eq!(stored.lines.len(), 2);
    assert_eq!(stored.totals.total_cents, 5675);
    assert_eq!(stored.receipt_number, result.sale.receipt_number);

    let cafe = db.products().get_by_id("cafe").await.unwrap().unwrap();
    assert_eq!(cafe.stock, Some(47));
    let picanha = db.products().get_by_id("picanha").await.unwrap().unwrap();
    assert_eq!(picanha.stock, Some(9_500));

    let shift = db.shifts().open_for_operator("operador").await.unwrap().unwrap();
    assert_eq!(shift.totals.sale_count, 1);
    assert_eq!(shift.totals.gross_cents, 5675);
    assert_eq!(shift.totals.cash_cents, 6000);
    assert_eq!(shift.totals.change_cents, 325);
    assert_eq!(shift.expected_cash(), Money::from_cents(20_000 + 6000 - 325));

    let points = db.loyalty().customer_points("c-1").await.unwrap().unwrap();
    assert_eq!(points.available_points, 1_000 - 200 + 56);
    assert_eq!(db.loyalty().ledger_for("c-1").await.unwrap().len(), 2);

    let commissions = db.commissions().list_for_seller("vend-1").await.unwrap();
    assert_eq!(commissions.len(), 1);
    assert_eq!(commissions[0].amount_cents, 114);
}

#[tokio::test]
async fn closed_shift_after_start_rejects_checkout() {
    let db = seeded_db().await;
    let mut session = started_session(&db).await;

    let shift_id = session.shift().unwrap().id.clone();
    db.shifts().close(&shift_id, Money::from_cents(20_000)).await.unwrap();

    session.scan("cafe").await.unwrap();
    let err = session
        .finalize(vec![Tender::new(PaymentMethod::Pix, 1590)])
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ShiftClosed);
    assert!(session.shift().is_none());
    assert_eq!(session.cart().items().len(), 1);
    assert!(db.sales().list_for_shift(&shift_id).await.unwrap().is_empty());

    let cafe = db.products().get_by_id("cafe").await.unwrap().unwrap();
    assert_eq!(cafe.stock, Some(50));
    let closed = db.shifts().get_by_id(&shift_id).await.unwrap().unwrap();
    assert_eq!(closed.totals.sale_count, 0);

    // a fresh shift at the configured register takes the same sale
    let reopened = session.open_shift(Money::from_cents(10_000)).await.unwrap();
    assert_eq!(reopened.register_name, "Caixa 01");
    let result = session
        .finalize(vec![Tender::new(PaymentMethod::Pix, 1590)])
        .await
        .unwrap();
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.sale.shift_id, reopened.id);
    assert_eq!(result.receipt.header, vec!["Caixa POS"]);
}

static STORE_NOW: AtomicI64 = AtomicI64::new(0);

fn store_clock() -> DateTime<Utc> {
    Utc.timestamp_opt(STORE_NOW.load(Ordering::SeqCst), 0).unwrap()
}

/// Moves the store clock to `hour:minute` on 2024-06-15 (UTC-3).
fn set_store_time(hour: u32, minute: u32) {
    let utc = Utc.with_ymd_and_hms(2024, 6, 15, hour + 3, minute, 0).unwrap();
    STORE_NOW.store(utc.timestamp(), Ordering::SeqCst);
}

#[tokio::test]
async fn happy_hour_loaded_early_applies_when_it_opens() {
    let db = seeded_db().await;
    db.products()
        .insert(&Product::new("cerveja", "CRV-350", "Cerveja lata 350ml", 1000))
        .await
        .unwrap();
    let happy_hour = Promotion::new(
        "hh-cerveja",
        "Happy hour cerveja",
        PromotionRule::HappyHour {
            rate: Percentage::from_bps(2000),
            max_discount_cents: None,
        },
    )
    .with_scope(PromotionScope::Products(vec!["cerveja".to_string()]))
    .with_window(ValidityWindow::daily(
        NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    ));
    db.promotions().insert(&happy_hour).await.unwrap();

    set_store_time(16, 0);
    let mut session = CheckoutSession::new(db.clone(), config())
        .unwrap()
        .with_clock(store_clock);
    session.start().await.unwrap();
    assert_eq!(session.promotions().len(), 2);

    session.scan("cerveja").await.unwrap();
    assert_eq!(session.totals().promotion_discount_cents, 0);
    session.clear();

    set_store_time(17, 30);
    session.scan("cerveja").await.unwrap();
    assert_eq!(session.totals().promotion_discount_cents, 200);

    let result = session
        .finalize(vec![Tender::new(PaymentMethod::Cash, 800)])
        .await
        .unwrap();
    assert_eq!(result.sale.totals.total_cents, 800);

    set_store_time(19, 30);
    session.scan("cerveja").await.unwrap();
    assert_eq!(session.totals().promotion_discount_cents, 0);
}

#[tokio::test]
async fn shared_state_serializes_operations() {
    let db = seeded_db().await;
    let state = SessionState::new(started_session(&db).await);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            let mut session = state.lock().await;
            let added = session.scan("7891000100103").await.map(|_| ());
            added
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].units(), 4);
    assert!(snapshot.can_checkout);
}

#[tokio::test]
async fn open_session_creates_database_file() {
    let dir = std::env::temp_dir().join(format!("caixa-open-session-{}", uuid::Uuid::new_v4()));
    let config = ConfigState {
        database_path: Some(dir.join("caixa.db")),
        ..ConfigState::default()
    };

    let mut session = caixa_checkout::open_session(config).await.unwrap();
    assert!(session.shift().is_none());
    assert!(session.search_products("café").await.unwrap().is_empty());
    assert!(dir.join("caixa.db").exists());

    drop(session);
    let _ = std::fs::remove_dir_all(dir);
}
