//! # Commission Repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use caixa_core::checkout::CommissionRecord;
use caixa_core::Percentage;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CommissionRow {
    id: String,
    sale_id: String,
    seller_id: String,
    base_cents: i64,
    rate_bps: i64,
    amount_cents: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommissionRow> for CommissionRecord {
    type Error = DbError;

    fn try_from(r: CommissionRow) -> Result<Self, Self::Error> {
        let bps = u32::try_from(r.rate_bps)
            .map_err(|_| DbError::invalid_data("Commission", format!("{} has rate {}", r.id, r.rate_bps)))?;

        Ok(CommissionRecord {
            id: r.id,
            sale_id: r.sale_id,
            seller_id: r.seller_id,
            base_cents: r.base_cents,
            rate: Percentage::from_bps(bps),
            amount_cents: r.amount_cents,
            created_at: r.created_at,
        })
    }
}

/// Repository for seller commissions.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: SqlitePool,
}

impl CommissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CommissionRepository { pool }
    }

    pub async fn insert(&self, commission: &CommissionRecord) -> DbResult<()> {
        debug!(
            sale_id = %commission.sale_id,
            seller_id = %commission.seller_id,
            amount = commission.amount_cents,
            "Inserting commission"
        );

        sqlx::query(
            r#"
            INSERT INTO commissions (id, sale_id, seller_id, base_cents, rate_bps, amount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&commission.id)
        .bind(&commission.sale_id)
        .bind(&commission.seller_id)
        .bind(commission.base_cents)
        .bind(commission.rate.bps() as i64)
        .bind(commission.amount_cents)
        .bind(commission.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_seller(&self, seller_id: &str) -> DbResult<Vec<CommissionRecord>> {
        let rows = sqlx::query_as::<_, CommissionRow>(
            r#"
            SELECT id, sale_id, seller_id, base_cents, rate_bps, amount_cents, created_at
            FROM commissions
            WHERE seller_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CommissionRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    #[tokio::test]
    async fn test_commission_needs_a_stored_sale() {
        let db = memory_db().await;

        let commission = CommissionRecord {
            id: "cm-1".to_string(),
            sale_id: "missing-sale".to_string(),
            seller_id: "seller-1".to_string(),
            base_cents: 10_000,
            rate: Percentage::from_bps(250),
            amount_cents: 250,
            created_at: Utc::now(),
        };

        let err = db.commissions().insert(&commission).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.commissions().list_for_seller("seller-1").await.unwrap().is_empty());
    }
}
