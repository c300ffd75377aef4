//! # Promotion Repository
//!
//! Stores promotion rules as one row per promotion plus a target list.
//!
//! ## Row Layout
//! ```text
//! promotions                              promotion_targets
//! ┌────────┬──────────────┬───────────┐   ┌──────────────┬───────────┐
//! │ id     │ kind         │ params... │   │ promotion_id │ target_id │
//! ├────────┼──────────────┼───────────┤   ├──────────────┼───────────┤
//! │ pr-1   │ percentage   │ rate_bps  │   │ pr-2         │ p-10      │ scope = products
//! │ pr-2   │ buy_x_get_y  │ buy, get  │   │ pr-2         │ p-11      │
//! │ pr-3   │ happy_hour   │ rate_bps  │   │ pr-3         │ bebidas   │ scope = categories
//! └────────┴──────────────┴───────────┘   └──────────────┴───────────┘
//! ```
//!
//! `active_at` returns promotions oldest first; the evaluator's first-match
//! policy depends on that order.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use caixa_core::promotion::{Promotion, PromotionRule, PromotionScope, ValidityWindow};
use caixa_core::Percentage;

#[derive(Debug, Clone, sqlx::FromRow)]
struct PromotionRecord {
    id: String,
    name: String,
    kind: String,
    rate_bps: Option<i64>,
    amount_cents: Option<i64>,
    max_discount_cents: Option<i64>,
    buy_quantity: Option<i64>,
    get_quantity: Option<i64>,
    step_bps: Option<i64>,
    max_rate_bps: Option<i64>,
    tier_min_quantity: Option<i64>,
    scope: String,
    min_quantity: Option<i64>,
    min_value_cents: Option<i64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    is_active: bool,
}

/// Flattened rule parameters, one column each.
#[derive(Debug, Default)]
struct RuleColumns {
    rate_bps: Option<i64>,
    amount_cents: Option<i64>,
    max_discount_cents: Option<i64>,
    buy_quantity: Option<i64>,
    get_quantity: Option<i64>,
    step_bps: Option<i64>,
    max_rate_bps: Option<i64>,
    tier_min_quantity: Option<i64>,
}

impl RuleColumns {
    fn from_rule(rule: &PromotionRule) -> Self {
        match *rule {
            PromotionRule::Percentage {
                rate,
                max_discount_cents,
            }
            | PromotionRule::HappyHour {
                rate,
                max_discount_cents,
            } => RuleColumns {
                rate_bps: Some(rate.bps() as i64),
                max_discount_cents,
                ..RuleColumns::default()
            },
            PromotionRule::FixedAmount { amount_cents } => RuleColumns {
                amount_cents: Some(amount_cents),
                ..RuleColumns::default()
            },
            PromotionRule::BuyXGetY { buy, get } => RuleColumns {
                buy_quantity: Some(buy),
                get_quantity: Some(get),
                ..RuleColumns::default()
            },
            PromotionRule::Progressive {
                min_quantity,
                step,
                max_rate,
            } => RuleColumns {
                tier_min_quantity: Some(min_quantity),
                step_bps: Some(step.bps() as i64),
                max_rate_bps: Some(max_rate.bps() as i64),
                ..RuleColumns::default()
            },
        }
    }
}

impl PromotionRecord {
    fn required(&self, column: &str, value: Option<i64>) -> DbResult<i64> {
        value.ok_or_else(|| {
            DbError::invalid_data("Promotion", format!("{} ({}) is missing {}", self.id, self.kind, column))
        })
    }

    fn rate(&self, column: &str, value: Option<i64>) -> DbResult<Percentage> {
        let bps = self.required(column, value)?;
        u32::try_from(bps)
            .map(Percentage::from_bps)
            .map_err(|_| DbError::invalid_data("Promotion", format!("{} has invalid {}", self.id, column)))
    }

    fn rule(&self) -> DbResult<PromotionRule> {
        let rule = match self.kind.as_str() {
            "percentage" => PromotionRule::Percentage {
                rate: self.rate("rate_bps", self.rate_bps)?,
                max_discount_cents: self.max_discount_cents,
            },
            "happy_hour" => PromotionRule::HappyHour {
                rate: self.rate("rate_bps", self.rate_bps)?,
                max_discount_cents: self.max_discount_cents,
            },
            "fixed_amount" => PromotionRule::FixedAmount {
                amount_cents: self.required("amount_cents", self.amount_cents)?,
            },
            "buy_x_get_y" => PromotionRule::BuyXGetY {
                buy: self.required("buy_quantity", self.buy_quantity)?,
                get: self.required("get_quantity", self.get_quantity)?,
            },
            "progressive" => PromotionRule::Progressive {
                min_quantity: self.required("tier_min_quantity", self.tier_min_quantity)?,
                step: self.rate("step_bps", self.step_bps)?,
                max_rate: self.rate("max_rate_bps", self.max_rate_bps)?,
            },
            other => {
                return Err(DbError::invalid_data(
                    "Promotion",
                    format!("{} has unknown kind '{}'", self.id, other),
                ))
            }
        };
        Ok(rule)
    }

    fn into_promotion(self, targets: Vec<String>) -> DbResult<Promotion> {
        let scope = match self.scope.as_str() {
            "all_products" => PromotionScope::AllProducts,
            "products" => PromotionScope::Products(targets),
            "categories" => PromotionScope::Categories(targets),
            other => {
                return Err(DbError::invalid_data(
                    "Promotion",
                    format!("{} has unknown scope '{}'", self.id, other),
                ))
            }
        };

        Ok(Promotion {
            rule: self.rule()?,
            scope,
            window: ValidityWindow {
                start_date: self.start_date,
                end_date: self.end_date,
                start_time: self.start_time,
                end_time: self.end_time,
            },
            is_active: self.is_active,
            min_quantity: self.min_quantity,
            min_value_cents: self.min_value_cents,
            id: self.id,
            name: self.name,
        })
    }
}

fn scope_parts(scope: &PromotionScope) -> (&'static str, &[String]) {
    match scope {
        PromotionScope::AllProducts => ("all_products", &[]),
        PromotionScope::Products(ids) => ("products", ids.as_slice()),
        PromotionScope::Categories(ids) => ("categories", ids.as_slice()),
    }
}

/// Repository for promotion database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Inserts a promotion and its scope targets in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidData)` - Rule parameters are out of range
    pub async fn insert(&self, promotion: &Promotion) -> DbResult<()> {
        promotion
            .validate()
            .map_err(|e| DbError::invalid_data("Promotion", e.to_string()))?;

        debug!(id = %promotion.id, kind = promotion.rule.kind(), "Inserting promotion");

        let columns = RuleColumns::from_rule(&promotion.rule);
        let (scope, targets) = scope_parts(&promotion.scope);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, name, kind,
                rate_bps, amount_cents, max_discount_cents,
                buy_quantity, get_quantity,
                step_bps, max_rate_bps, tier_min_quantity,
                scope, min_quantity, min_value_cents,
                start_date, end_date, start_time, end_time,
                is_active, created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16, ?17, ?18,
                ?19, ?20
            )
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.name)
        .bind(promotion.rule.kind())
        .bind(columns.rate_bps)
        .bind(columns.amount_cents)
        .bind(columns.max_discount_cents)
        .bind(columns.buy_quantity)
        .bind(columns.get_quantity)
        .bind(columns.step_bps)
        .bind(columns.max_rate_bps)
        .bind(columns.tier_min_quantity)
        .bind(scope)
        .bind(promotion.min_quantity)
        .bind(promotion.min_value_cents)
        .bind(promotion.window.start_date)
        .bind(promotion.window.end_date)
        .bind(promotion.window.start_time)
        .bind(promotion.window.end_time)
        .bind(promotion.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        for target in targets {
            sqlx::query("INSERT INTO promotion_targets (promotion_id, target_id) VALUES (?1, ?2)")
                .bind(&promotion.id)
                .bind(target)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Enabled promotions whose date range covers `now`, oldest first.
    ///
    /// Time-of-day windows are not filtered here: the evaluator checks
    /// them on every reprice, so a happy hour loaded before it opens still
    /// applies once the clock reaches it. Rows that no longer decode into a
    /// rule are logged and skipped.
    pub async fn active_at(&self, now: NaiveDateTime) -> DbResult<Vec<Promotion>> {
        let today = now.date();

        let records = sqlx::query_as::<_, PromotionRecord>(
            r#"
            SELECT
                id, name, kind,
                rate_bps, amount_cents, max_discount_cents,
                buy_quantity, get_quantity,
                step_bps, max_rate_bps, tier_min_quantity,
                scope, min_quantity, min_value_cents,
                start_date, end_date, start_time, end_time,
                is_active
            FROM promotions
            WHERE is_active = 1
              AND (start_date IS NULL OR start_date <= ?1)
              AND (end_date IS NULL OR end_date >= ?1)
            ORDER BY created_at, rowid
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        let mut targets = self.targets().await?;

        let mut promotions = Vec::with_capacity(records.len());
        for record in records {
            let ids = targets.remove(&record.id).unwrap_or_default();
            let id = record.id.clone();
            match record.into_promotion(ids) {
                Ok(promotion) => promotions.push(promotion),
                Err(e) => warn!(promotion_id = %id, error = %e, "Skipping unreadable promotion"),
            }
        }

        debug!(count = promotions.len(), "Loaded active promotions");
        Ok(promotions)
    }

    /// Deactivates a promotion.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE promotions SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }
        Ok(())
    }

    async fn targets(&self) -> DbResult<HashMap<String, Vec<String>>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT promotion_id, target_id FROM promotion_targets ORDER BY promotion_id, target_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (promotion_id, target_id) in rows {
            map.entry(promotion_id).or_default().push(target_id);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_every_rule_in_creation_order() {
        let db = memory_db().await;
        let repo = db.promotions();

        let promotions = vec![
            Promotion::new(
                "pr-1",
                "10% tudo",
                PromotionRule::Percentage {
                    rate: Percentage::from_bps(1000),
                    max_discount_cents: Some(500),
                },
            ),
            Promotion::new("pr-2", "R$2 off", PromotionRule::FixedAmount { amount_cents: 200 })
                .with_scope(PromotionScope::Products(vec!["p-1".to_string(), "p-2".to_string()])),
            Promotion::new("pr-3", "Leve 3 pague 2", PromotionRule::BuyXGetY { buy: 2, get: 1 })
                .with_scope(PromotionScope::Categories(vec!["bebidas".to_string()])),
            Promotion::new(
                "pr-4",
                "Progressivo",
                PromotionRule::Progressive {
                    min_quantity: 3,
                    step: Percentage::from_bps(500),
                    max_rate: Percentage::from_bps(1500),
                },
            ),
        ];
        for p in &promotions {
            repo.insert(p).await.unwrap();
        }

        let loaded = repo.active_at(at(2024, 6, 15, 12)).await.unwrap();
        assert_eq!(loaded, promotions);
    }

    #[tokio::test]
    async fn test_active_filters_dates_and_flag() {
        let db = memory_db().await;
        let repo = db.promotions();

        let happy_hour = Promotion::new(
            "hh",
            "Happy hour",
            PromotionRule::HappyHour {
                rate: Percentage::from_bps(2000),
                max_discount_cents: None,
            },
        )
        .with_window(ValidityWindow::daily(
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        ));
        repo.insert(&happy_hour).await.unwrap();

        let june = Promotion::new("june", "Junho", PromotionRule::FixedAmount { amount_cents: 100 })
            .with_window(ValidityWindow {
                start_date: NaiveDate::from_ymd_opt(2024, 6, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 6, 30),
                ..ValidityWindow::default()
            });
        repo.insert(&june).await.unwrap();

        let ids = |v: Vec<Promotion>| v.into_iter().map(|p| p.id).collect::<Vec<_>>();

        assert_eq!(ids(repo.active_at(at(2024, 6, 30, 18)).await.unwrap()), vec!["hh", "june"]);
        assert_eq!(ids(repo.active_at(at(2024, 7, 1, 18)).await.unwrap()), vec!["hh"]);

        // loaded before the happy hour opens; the evaluator decides per reprice
        let early = repo.active_at(at(2024, 6, 30, 16)).await.unwrap();
        assert_eq!(ids(early.clone()), vec!["hh", "june"]);
        assert!(!early[0].is_active_at(at(2024, 6, 30, 16)));
        assert!(early[0].is_active_at(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap().and_hms_opt(17, 30, 0).unwrap()));

        repo.deactivate("hh").await.unwrap();
        assert!(repo.active_at(at(2024, 7, 1, 18)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_row_is_skipped() {
        let db = memory_db().await;
        let repo = db.promotions();

        sqlx::query(
            "INSERT INTO promotions (id, name, kind, scope, is_active, created_at) \
             VALUES ('broken', 'Sem quantidades', 'buy_x_get_y', 'all_products', 1, '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        repo.insert(&Promotion::new("ok", "R$1 off", PromotionRule::FixedAmount { amount_cents: 100 }))
            .await
            .unwrap();

        let loaded = repo.active_at(at(2024, 6, 15, 12)).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "ok");
    }

    #[tokio::test]
    async fn test_invalid_promotion_rejected() {
        let db = memory_db().await;
        let bad = Promotion::new("bad", "Zero", PromotionRule::BuyXGetY { buy: 0, get: 1 });

        let err = db.promotions().insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidData { .. }));
    }
}
