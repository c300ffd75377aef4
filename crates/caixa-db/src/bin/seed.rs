//! # Seed Data Generator
//!
//! Populates a development database with a small supermarket catalog,
//! a few customers enrolled in the loyalty club and sample promotions.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p caixa-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p caixa-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p caixa-db --bin seed -- --db ./data/caixa.db
//! ```
//!
//! Products are generated per category as `{name} {size}`. The hortifruti
//! and açougue categories are sold by weight (price per kg, stock in grams).

use std::env;

use caixa_core::loyalty::LoyaltyProgram;
use caixa_core::promotion::{Promotion, PromotionRule, PromotionScope, ValidityWindow};
use caixa_core::{Customer, Percentage, Product};
use caixa_db::{Database, DbConfig};
use chrono::NaiveTime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// (category id, sold by weight, names)
const CATEGORIES: &[(&str, bool, &[&str])] = &[
    (
        "bebidas",
        false,
        &[
            "Guaraná",
            "Refrigerante Cola",
            "Água Mineral",
            "Suco de Laranja",
            "Suco de Uva",
            "Cerveja Pilsen",
            "Chá Mate",
            "Energético",
            "Água de Coco",
            "Café Gelado",
        ],
    ),
    (
        "mercearia",
        false,
        &[
            "Arroz Branco",
            "Feijão Carioca",
            "Feijão Preto",
            "Açúcar Refinado",
            "Café Torrado",
            "Farinha de Mandioca",
            "Macarrão Espaguete",
            "Óleo de Soja",
            "Sal Refinado",
            "Farofa Pronta",
        ],
    ),
    (
        "laticinios",
        false,
        &[
            "Leite Integral",
            "Leite Desnatado",
            "Iogurte Natural",
            "Manteiga",
            "Requeijão",
            "Queijo Minas",
            "Creme de Leite",
            "Leite Condensado",
            "Doce de Leite",
            "Coalhada",
        ],
    ),
    (
        "hortifruti",
        true,
        &[
            "Banana Prata",
            "Tomate",
            "Batata",
            "Cebola",
            "Maçã Gala",
            "Mamão Formosa",
            "Laranja Pera",
            "Cenoura",
            "Alface",
            "Abacaxi",
        ],
    ),
    (
        "acougue",
        true,
        &[
            "Alcatra",
            "Picanha",
            "Contra-filé",
            "Frango Inteiro",
            "Coxa de Frango",
            "Linguiça Toscana",
            "Costela Bovina",
            "Patinho Moído",
            "Pernil Suíno",
            "Filé de Tilápia",
        ],
    ),
];

/// Size variants for unit products, with the price added in cents.
const SIZES: &[(&str, i64)] = &[
    ("200g", 0),
    ("500g", 250),
    ("1kg", 600),
    ("350ml", 0),
    ("1L", 300),
    ("2L", 550),
    ("Pacote", 150),
    ("Caixa", 400),
    ("Lata", 50),
    ("Garrafa", 350),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./caixa_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Caixa POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./caixa_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let generated = seed_products(&db, count).await;
    info!(generated, elapsed = ?start.elapsed(), "Products generated");

    seed_customers(&db).await?;
    seed_promotions(&db).await?;

    let hits = db.products().search("Café", 10).await?;
    info!(results = hits.len(), "Search check for 'Café'");

    info!("Seed complete");
    Ok(())
}

async fn seed_products(db: &Database, count: usize) -> usize {
    let mut generated = 0;

    'outer: for (category_idx, (category, by_weight, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            let variants: &[(&str, i64)] = if *by_weight { &[("kg", 0)] } else { SIZES };

            for (size_idx, (size, price_addon)) in variants.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + name_idx * 20 + size_idx;
                let product = generate_product(category, *by_weight, name, size, *price_addon, seed);

                if let Err(e) = db.products().insert(&product).await {
                    warn!(sku = %product.sku, error = %e, "Failed to insert product");
                    continue;
                }
                generated += 1;
            }
        }
    }

    generated
}

/// Generates a single product with plausible data.
fn generate_product(
    category: &str,
    by_weight: bool,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let prefix: String = category.chars().take(3).collect::<String>().to_uppercase();
    let sku = format!("{}-{:04}", prefix, seed);

    // R$1.99 - R$9.98, or R$9.90 - R$59.80 per kg
    let base_price = if by_weight {
        990 + ((seed * 37) % 5000) as i64
    } else {
        199 + ((seed * 17) % 800) as i64
    };
    let price_cents = base_price + price_addon;
    let cost_pct = 60 + (seed % 20) as i64;

    // Weighed stock is in grams
    let stock = if by_weight {
        ((seed % 50) as i64 + 1) * 1000
    } else {
        (seed % 101) as i64
    };

    Product {
        id: Uuid::new_v4().to_string(),
        sku,
        barcode: if by_weight { None } else { Some(format!("789{:010}", seed)) },
        name: if by_weight { name.to_string() } else { format!("{} {}", name, size) },
        price_cents,
        cost_cents: Some(price_cents * cost_pct / 100),
        category_id: Some(category.to_string()),
        sold_by_weight: by_weight,
        track_inventory: true,
        stock: Some(stock),
        is_active: true,
    }
}

async fn seed_customers(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let program = LoyaltyProgram {
        id: "clube-caixa".to_string(),
        name: "Clube Caixa".to_string(),
        point_value_cents: 5,
        min_points_redeem: 100,
        earn_points_per_unit: 1.0,
        is_active: true,
    };
    db.loyalty().insert_program(&program).await?;

    let customers = [
        ("Maria da Silva", "11122233344", Some(50_000), 1_200),
        ("João Pereira", "55566677788", Some(20_000), 80),
        ("Ana Souza", "99988877766", None, 0),
    ];

    for (name, document, credit_limit, points) in customers {
        let mut customer = Customer::new(Uuid::new_v4().to_string(), name);
        customer.document = Some(document.to_string());
        customer.credit_limit_cents = credit_limit;
        db.customers().insert(&customer).await?;
        db.loyalty().set_balance(&customer.id, &program.id, points).await?;
    }

    info!(count = customers.len(), "Customers generated");
    Ok(())
}

async fn seed_promotions(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let promotions = [
        Promotion::new(
            "leve3-bebidas",
            "Bebidas: leve 3 pague 2",
            PromotionRule::BuyXGetY { buy: 2, get: 1 },
        )
        .with_scope(PromotionScope::Categories(vec!["bebidas".to_string()])),
        Promotion::new(
            "progressivo-mercearia",
            "Mercearia: 5% a cada unidade a partir de 3",
            PromotionRule::Progressive {
                min_quantity: 3,
                step: Percentage::from_bps(500),
                max_rate: Percentage::from_bps(2000),
            },
        )
        .with_scope(PromotionScope::Categories(vec!["mercearia".to_string()])),
        Promotion::new(
            "happy-hour-acougue",
            "Happy hour do açougue",
            PromotionRule::HappyHour {
                rate: Percentage::from_bps(1500),
                max_discount_cents: Some(2_000),
            },
        )
        .with_scope(PromotionScope::Categories(vec!["acougue".to_string()]))
        .with_window(ValidityWindow::daily(
            NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
        )),
    ];

    for promotion in &promotions {
        db.promotions().insert(promotion).await?;
    }

    info!(count = promotions.len(), "Promotions generated");
    Ok(())
}
