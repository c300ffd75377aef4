//! # Sale Repository
//!
//! Persists finalized sales: one `sales` row with its items and payments,
//! written in a single transaction.
//!
//! ## Transaction
//! ```text
//! BEGIN
//!   INSERT sales           (header + totals)
//!   INSERT sale_items      (one per cart line, line_no keeps cart order)
//!   INSERT sale_payments   (one per tender, line_no keeps entry order)
//! COMMIT
//! ```
//!
//! Stock, shift totals, loyalty and commissions are written afterwards by
//! the checkout through their own repositories.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use caixa_core::checkout::{CheckoutTotals, FinalizedSale, SaleLine};
use caixa_core::{PaymentMethod, Tender};

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleRecord {
    id: String,
    receipt_number: String,
    shift_id: String,
    operator_id: String,
    seller_id: Option<String>,
    customer_id: Option<String>,
    customer_name: String,
    subtotal_cents: i64,
    item_discount_cents: i64,
    promotion_discount_cents: i64,
    global_discount_cents: i64,
    loyalty_discount_cents: i64,
    total_cents: i64,
    paid_cents: i64,
    change_cents: i64,
    points_redeemed: i64,
    points_earned: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleItemRecord {
    product_id: String,
    sku: String,
    name: String,
    unit_price_cents: i64,
    quantity: i64,
    weight_grams: Option<i64>,
    item_discount_cents: i64,
    promotion_id: Option<String>,
    promotion_discount_cents: i64,
    line_total_cents: i64,
}

impl From<SaleItemRecord> for SaleLine {
    fn from(r: SaleItemRecord) -> Self {
        SaleLine {
            product_id: r.product_id,
            sku: r.sku,
            name: r.name,
            unit_price_cents: r.unit_price_cents,
            quantity: r.quantity,
            weight_grams: r.weight_grams,
            item_discount_cents: r.item_discount_cents,
            promotion_id: r.promotion_id,
            promotion_discount_cents: r.promotion_discount_cents,
            line_total_cents: r.line_total_cents,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PaymentRecord {
    method: PaymentMethod,
    amount_cents: i64,
}

const SALE_COLUMNS: &str = r#"
    id, receipt_number, shift_id, operator_id, seller_id, customer_id, customer_name,
    subtotal_cents, item_discount_cents, promotion_discount_cents,
    global_discount_cents, loyalty_discount_cents, total_cents,
    paid_cents, change_cents, points_redeemed, points_earned, created_at
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a sale with its items and payments.
    ///
    /// Nothing is written if any insert fails.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Sale id or receipt number already used
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown shift or customer
    pub async fn insert(&self, sale: &FinalizedSale) -> DbResult<()> {
        debug!(
            sale_id = %sale.id,
            lines = sale.lines.len(),
            tenders = sale.tenders.len(),
            "Inserting sale"
        );

        let mut tx = self.pool.begin().await?;

        let totals = &sale.totals;
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_number, shift_id, operator_id, seller_id, customer_id, customer_name,
                subtotal_cents, item_discount_cents, promotion_discount_cents,
                global_discount_cents, loyalty_discount_cents, total_cents,
                paid_cents, change_cents, points_redeemed, points_earned, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(&sale.shift_id)
        .bind(&sale.operator_id)
        .bind(&sale.seller_id)
        .bind(&sale.customer_id)
        .bind(&sale.customer_name)
        .bind(totals.subtotal_cents)
        .bind(totals.item_discount_cents)
        .bind(totals.promotion_discount_cents)
        .bind(totals.global_discount_cents)
        .bind(totals.loyalty_discount_cents)
        .bind(totals.total_cents)
        .bind(sale.paid_cents)
        .bind(sale.change_cents)
        .bind(sale.points_redeemed)
        .bind(sale.points_earned)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for (line_no, line) in sale.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, line_no, product_id, sku, name, unit_price_cents,
                    quantity, weight_grams, item_discount_cents,
                    promotion_id, promotion_discount_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(line_no as i64)
            .bind(&line.product_id)
            .bind(&line.sku)
            .bind(&line.name)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.weight_grams)
            .bind(line.item_discount_cents)
            .bind(&line.promotion_id)
            .bind(line.promotion_discount_cents)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        for (line_no, tender) in sale.tenders.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_payments (id, sale_id, line_no, method, amount_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(line_no as i64)
            .bind(tender.method)
            .bind(tender.amount_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            receipt = %sale.receipt_number,
            total = sale.totals.total_cents,
            "Sale stored"
        );
        Ok(())
    }

    /// Loads a sale with its lines and tenders.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<FinalizedSale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let record = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match record {
            Some(record) => Ok(Some(self.hydrate(record).await?)),
            None => Ok(None),
        }
    }

    /// Sales of a shift, oldest first.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<FinalizedSale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE shift_id = ?1 ORDER BY created_at, rowid");
        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(shift_id)
            .fetch_all(&self.pool)
            .await?;

        let mut sales = Vec::with_capacity(records.len());
        for record in records {
            sales.push(self.hydrate(record).await?);
        }
        Ok(sales)
    }

    async fn hydrate(&self, r: SaleRecord) -> DbResult<FinalizedSale> {
        let lines = sqlx::query_as::<_, SaleItemRecord>(
            r#"
            SELECT product_id, sku, name, unit_price_cents, quantity, weight_grams,
                   item_discount_cents, promotion_id, promotion_discount_cents, line_total_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(&r.id)
        .fetch_all(&self.pool)
        .await?;

        let tenders = sqlx::query_as::<_, PaymentRecord>(
            "SELECT method, amount_cents FROM sale_payments WHERE sale_id = ?1 ORDER BY line_no",
        )
        .bind(&r.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(FinalizedSale {
            id: r.id,
            receipt_number: r.receipt_number,
            shift_id: r.shift_id,
            operator_id: r.operator_id,
            seller_id: r.seller_id,
            customer_id: r.customer_id,
            customer_name: r.customer_name,
            lines: lines.into_iter().map(SaleLine::from).collect(),
            tenders: tenders
                .into_iter()
                .map(|p| Tender::new(p.method, p.amount_cents))
                .collect(),
            totals: CheckoutTotals {
                subtotal_cents: r.subtotal_cents,
                item_discount_cents: r.item_discount_cents,
                promotion_discount_cents: r.promotion_discount_cents,
                global_discount_cents: r.global_discount_cents,
                loyalty_discount_cents: r.loyalty_discount_cents,
                total_cents: r.total_cents,
            },
            paid_cents: r.paid_cents,
            change_cents: r.change_cents,
            points_redeemed: r.points_redeemed,
            points_earned: r.points_earned,
            created_at: r.created_at,
        })
    }
}
