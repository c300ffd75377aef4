//! # Customer Repository
//!
//! Customer lookup for the F6 customer selector.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use caixa_core::validation::validate_search_term;
use caixa_core::Customer;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CustomerRecord {
    id: String,
    name: String,
    document: Option<String>,
    phone: Option<String>,
    credit_limit_cents: Option<i64>,
    is_active: bool,
}

impl From<CustomerRecord> for Customer {
    fn from(r: CustomerRecord) -> Self {
        Customer {
            id: r.id,
            name: r.name,
            document: r.document,
            phone: r.phone,
            credit_limit_cents: r.credit_limit_cents,
            is_active: r.is_active,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let record = sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, name, document, phone, credit_limit_cents, is_active
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Customer::from))
    }

    /// Searches active customers by name, document (CPF/CNPJ) or phone.
    pub async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let term = validate_search_term(term).map_err(|e| DbError::invalid_data("Search term", e.to_string()))?;
        debug!(term = %term, limit = %limit, "Searching customers");

        let pattern = format!("%{}%", term);
        let records = sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, name, document, phone, credit_limit_cents, is_active
            FROM customers
            WHERE is_active = 1
              AND (name LIKE ?1 OR document = ?2 OR phone = ?2)
            ORDER BY name
            LIMIT ?3
            "#,
        )
        .bind(pattern)
        .bind(&term)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Customer::from).collect())
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, document, phone, credit_limit_cents, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.document)
        .bind(&customer.phone)
        .bind(customer.credit_limit_cents)
        .bind(customer.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
