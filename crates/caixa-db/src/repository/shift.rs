//! # Shift Repository
//!
//! Cash register shifts and their running totals.
//!
//! ## Lifecycle
//! ```text
//! open(operator) ──► record_sale(delta) ... ──► close(counted cash)
//!      │                    │                          │
//!  status = open      totals += delta             status = closed
//!  (one per operator) (rejected once closed)      reconciliation returned
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use caixa_core::shift::{CashShift, ShiftReconciliation, ShiftStatus, ShiftTotals};
use caixa_core::Money;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ShiftRecord {
    id: String,
    operator_id: String,
    register_name: String,
    status: ShiftStatus,
    opening_balance_cents: i64,
    sale_count: i64,
    gross_cents: i64,
    discount_cents: i64,
    cash_cents: i64,
    credit_card_cents: i64,
    debit_card_cents: i64,
    pix_cents: i64,
    fiado_cents: i64,
    change_cents: i64,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    counted_cash_cents: Option<i64>,
}

impl From<ShiftRecord> for CashShift {
    fn from(r: ShiftRecord) -> Self {
        CashShift {
            id: r.id,
            operator_id: r.operator_id,
            register_name: r.register_name,
            status: r.status,
            opening_balance_cents: r.opening_balance_cents,
            totals: ShiftTotals {
                sale_count: r.sale_count,
                gross_cents: r.gross_cents,
                discount_cents: r.discount_cents,
                cash_cents: r.cash_cents,
                credit_card_cents: r.credit_card_cents,
                debit_card_cents: r.debit_card_cents,
                pix_cents: r.pix_cents,
                fiado_cents: r.fiado_cents,
                change_cents: r.change_cents,
            },
            opened_at: r.opened_at,
            closed_at: r.closed_at,
            counted_cash_cents: r.counted_cash_cents,
        }
    }
}

const SHIFT_COLUMNS: &str = r#"
    id, operator_id, register_name, status, opening_balance_cents,
    sale_count, gross_cents, discount_cents,
    cash_cents, credit_card_cents, debit_card_cents, pix_cents, fiado_cents,
    change_cents, opened_at, closed_at, counted_cash_cents
"#;

/// Repository for cash shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Opens a shift for an operator.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Operator already has an open shift
    pub async fn open(
        &self,
        operator_id: &str,
        register_name: &str,
        opening_balance: Money,
    ) -> DbResult<CashShift> {
        let shift = CashShift {
            id: Uuid::new_v4().to_string(),
            operator_id: operator_id.to_string(),
            register_name: register_name.to_string(),
            status: ShiftStatus::Open,
            opening_balance_cents: opening_balance.cents(),
            totals: ShiftTotals::default(),
            opened_at: Utc::now(),
            closed_at: None,
            counted_cash_cents: None,
        };

        sqlx::query(
            r#"
            INSERT INTO cash_shifts (id, operator_id, register_name, status, opening_balance_cents, opened_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.operator_id)
        .bind(&shift.register_name)
        .bind(shift.status)
        .bind(shift.opening_balance_cents)
        .bind(shift.opened_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("open shift for operator", operator_id),
            other => other,
        })?;

        info!(shift_id = %shift.id, operator_id = %operator_id, "Shift opened");
        Ok(shift)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashShift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM cash_shifts WHERE id = ?1");
        let record = sqlx::query_as::<_, ShiftRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(CashShift::from))
    }

    /// The operator's open shift, if any.
    pub async fn open_for_operator(&self, operator_id: &str) -> DbResult<Option<CashShift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM cash_shifts WHERE operator_id = ?1 AND status = 'open'");
        let record = sqlx::query_as::<_, ShiftRecord>(&sql)
            .bind(operator_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(CashShift::from))
    }

    /// Adds one sale's figures to an open shift.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Shift doesn't exist or is closed
    pub async fn record_sale(&self, shift_id: &str, delta: &ShiftTotals) -> DbResult<()> {
        debug!(shift_id = %shift_id, gross = delta.gross_cents, "Adding sale to shift");

        let result = sqlx::query(
            r#"
            UPDATE cash_shifts SET
                sale_count        = sale_count + ?2,
                gross_cents       = gross_cents + ?3,
                discount_cents    = discount_cents + ?4,
                cash_cents        = cash_cents + ?5,
                credit_card_cents = credit_card_cents + ?6,
                debit_card_cents  = debit_card_cents + ?7,
                pix_cents         = pix_cents + ?8,
                fiado_cents       = fiado_cents + ?9,
                change_cents      = change_cents + ?10
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(shift_id)
        .bind(delta.sale_count)
        .bind(delta.gross_cents)
        .bind(delta.discount_cents)
        .bind(delta.cash_cents)
        .bind(delta.credit_card_cents)
        .bind(delta.debit_card_cents)
        .bind(delta.pix_cents)
        .bind(delta.fiado_cents)
        .bind(delta.change_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open shift", shift_id));
        }
        Ok(())
    }

    /// Closes a shift with the counted drawer amount.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Shift doesn't exist or is already closed
    pub async fn close(&self, shift_id: &str, counted: Money) -> DbResult<ShiftReconciliation> {
        let shift = self
            .get_by_id(shift_id)
            .await?
            .filter(CashShift::is_open)
            .ok_or_else(|| DbError::not_found("Open shift", shift_id))?;

        let result = sqlx::query(
            r#"
            UPDATE cash_shifts SET status = 'closed', closed_at = ?2, counted_cash_cents = ?3
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(shift_id)
        .bind(Utc::now())
        .bind(counted.cents())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open shift", shift_id));
        }

        let reconciliation = shift.reconcile(counted);
        if reconciliation.is_balanced() {
            info!(shift_id = %shift_id, "Shift closed");
        } else {
            warn!(
                shift_id = %shift_id,
                difference = reconciliation.difference_cents,
                "Shift closed with cash difference"
            );
        }
        Ok(reconciliation)
    }
}
