//! # Loyalty Repository
//!
//! Programs, per-customer balances and the points ledger.
//!
//! Every ledger entry moves the balance in the same transaction, so
//! `customer_points.available_points` always equals the ledger sum since
//! the balance was last set.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use caixa_core::checkout::{LoyaltyEntryKind, LoyaltyLedgerEntry};
use caixa_core::loyalty::{CustomerPoints, LoyaltyProgram};

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProgramRecord {
    id: String,
    name: String,
    point_value_cents: i64,
    min_points_redeem: i64,
    earn_points_per_unit: f64,
    is_active: bool,
}

impl From<ProgramRecord> for LoyaltyProgram {
    fn from(r: ProgramRecord) -> Self {
        LoyaltyProgram {
            id: r.id,
            name: r.name,
            point_value_cents: r.point_value_cents,
            min_points_redeem: r.min_points_redeem,
            earn_points_per_unit: r.earn_points_per_unit,
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct BalanceRecord {
    customer_id: String,
    available_points: i64,
    #[sqlx(flatten)]
    program: ProgramRecord,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LedgerRecord {
    id: String,
    customer_id: String,
    sale_id: String,
    kind: LoyaltyEntryKind,
    points: i64,
    created_at: chrono::DateTime<Utc>,
}

impl From<LedgerRecord> for LoyaltyLedgerEntry {
    fn from(r: LedgerRecord) -> Self {
        LoyaltyLedgerEntry {
            id: r.id,
            customer_id: r.customer_id,
            sale_id: r.sale_id,
            kind: r.kind,
            points: r.points,
            created_at: r.created_at,
        }
    }
}

/// Repository for loyalty database operations.
#[derive(Debug, Clone)]
pub struct LoyaltyRepository {
    pool: SqlitePool,
}

impl LoyaltyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LoyaltyRepository { pool }
    }

    pub async fn insert_program(&self, program: &LoyaltyProgram) -> DbResult<()> {
        debug!(id = %program.id, "Inserting loyalty program");

        sqlx::query(
            r#"
            INSERT INTO loyalty_programs (
                id, name, point_value_cents, min_points_redeem, earn_points_per_unit, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&program.id)
        .bind(&program.name)
        .bind(program.point_value_cents)
        .bind(program.min_points_redeem)
        .bind(program.earn_points_per_unit)
        .bind(program.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Enrolls a customer or overwrites their balance.
    pub async fn set_balance(&self, customer_id: &str, program_id: &str, points: i64) -> DbResult<()> {
        debug!(customer_id = %customer_id, points = %points, "Setting points balance");

        sqlx::query(
            r#"
            INSERT INTO customer_points (customer_id, program_id, available_points)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(customer_id) DO UPDATE SET
                program_id = excluded.program_id,
                available_points = excluded.available_points
            "#,
        )
        .bind(customer_id)
        .bind(program_id)
        .bind(points)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Balance and program of a customer; `None` if not enrolled.
    pub async fn customer_points(&self, customer_id: &str) -> DbResult<Option<CustomerPoints>> {
        let record = sqlx::query_as::<_, BalanceRecord>(
            r#"
            SELECT
                cp.customer_id, cp.available_points,
                lp.id, lp.name, lp.point_value_cents, lp.min_points_redeem,
                lp.earn_points_per_unit, lp.is_active
            FROM customer_points cp
            JOIN loyalty_programs lp ON lp.id = cp.program_id
            WHERE cp.customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(|r| CustomerPoints {
            customer_id: r.customer_id,
            available_points: r.available_points,
            program: r.program.into(),
        }))
    }

    /// Appends a ledger entry and moves the balance.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Customer is not enrolled
    /// * `Err(DbError::ConstraintViolation)` - Redemption would overdraw the balance
    pub async fn record(&self, entry: &LoyaltyLedgerEntry) -> DbResult<()> {
        let delta = match entry.kind {
            LoyaltyEntryKind::Earned => entry.points,
            LoyaltyEntryKind::Redeemed => -entry.points,
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE customer_points SET available_points = available_points + ?2 WHERE customer_id = ?1",
        )
        .bind(&entry.customer_id)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CustomerPoints", entry.customer_id.clone()));
        }

        sqlx::query(
            r#"
            INSERT INTO loyalty_ledger (id, customer_id, sale_id, kind, points, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.customer_id)
        .bind(&entry.sale_id)
        .bind(entry.kind)
        .bind(entry.points)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            customer_id = %entry.customer_id,
            kind = ?entry.kind,
            points = entry.points,
            "Loyalty points recorded"
        );
        Ok(())
    }

    pub async fn ledger_for(&self, customer_id: &str) -> DbResult<Vec<LoyaltyLedgerEntry>> {
        let records = sqlx::query_as::<_, LedgerRecord>(
            r#"
            SELECT id, customer_id, sale_id, kind, points, created_at
            FROM loyalty_ledger
            WHERE customer_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(LoyaltyLedgerEntry::from).collect())
    }
}
