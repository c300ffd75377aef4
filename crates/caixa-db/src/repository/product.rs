//! # Product Repository
//!
//! Catalog reads for the checkout and stock decrements after a sale.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator types: "cafe"                                                │
//! │       │                                                                 │
//! │       ├── exact barcode / SKU?  ──► that product first                 │
//! │       │                                                                 │
//! │       └── name LIKE '%cafe%'    ──► ordered by name                    │
//! │                                                                         │
//! │  Inactive products never appear in search results.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use caixa_core::validation::validate_search_term;
use caixa_core::Product;

/// Row shape of the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRecord {
    id: String,
    sku: String,
    barcode: Option<String>,
    name: String,
    price_cents: i64,
    cost_cents: Option<i64>,
    category_id: Option<String>,
    sold_by_weight: bool,
    track_inventory: bool,
    stock: Option<i64>,
    is_active: bool,
}

impl From<ProductRecord> for Product {
    fn from(r: ProductRecord) -> Self {
        Product {
            id: r.id,
            sku: r.sku,
            barcode: r.barcode,
            name: r.name,
            price_cents: r.price_cents,
            cost_cents: r.cost_cents,
            category_id: r.category_id,
            sold_by_weight: r.sold_by_weight,
            track_inventory: r.track_inventory,
            stock: r.stock,
            is_active: r.is_active,
        }
    }
}

const PRODUCT_COLUMNS: &str = r#"
    id, sku, barcode, name, price_cents, cost_cents, category_id,
    sold_by_weight, track_inventory, stock, is_active
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by barcode, SKU or name.
    ///
    /// Exact barcode/SKU matches come first so a scanner read resolves to
    /// a single product. An empty term lists active products by name.
    pub async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<Product>> {
        let term = validate_search_term(term).map_err(|e| DbError::invalid_data("Search term", e.to_string()))?;

        debug!(term = %term, limit = %limit, "Searching products");

        let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND (?1 = '' OR barcode = ?1 OR sku = ?1 OR name LIKE ?2 ESCAPE '\' OR sku LIKE ?2 ESCAPE '\')
            ORDER BY (barcode = ?1 OR sku = ?1) DESC, name
            LIMIT ?3
            "#
        );

        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(&term)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), "Search returned products");
        Ok(records.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Product::from))
    }

    /// Gets an active product by barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 AND is_active = 1");
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Product::from))
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        let now: DateTime<Utc> = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, name, price_cents, cost_cents, category_id,
                sold_by_weight, track_inventory, stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(&product.category_id)
        .bind(product.sold_by_weight)
        .bind(product.track_inventory)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Takes `amount` out of stock (units, or grams for weighed products).
    ///
    /// Products that don't track inventory are left untouched. Stock may
    /// go negative: the sale already happened at the counter.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn decrement_stock(&self, id: &str, amount: i64) -> DbResult<()> {
        debug!(id = %id, amount = %amount, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                stock = CASE WHEN track_inventory = 1 THEN COALESCE(stock, 0) - ?2 ELSE stock END,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
