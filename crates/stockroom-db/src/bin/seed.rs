//! # Seed Data Generator
//!
//! Populates the database with a small catalog and a demo discount code for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockroom.db
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! - One category per entry in `CATALOG`
//! - Products with prices from $2.50 upward and stock 0-40 (some sold out)
//! - Discount `SAVE10` (10%, active, expires in 90 days)

use anyhow::Context;
use chrono::{Duration, Utc};
use std::env;
use stockroom_db::{Database, DbConfig, NewDiscount, NewProduct};

/// Categories and their products.
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Hardware",
        &["Hex Bolt M8", "Wood Screw 40mm", "Wall Anchor", "Hinge 75mm"],
    ),
    (
        "Tools",
        &["Claw Hammer", "Tape Measure 5m", "Utility Knife", "Spirit Level"],
    ),
    (
        "Electrical",
        &["Extension Lead", "LED Bulb E27", "Cable Ties (100)", "Wall Socket"],
    ),
    (
        "Paint",
        &["Primer 1L", "Matt White 2.5L", "Roller Kit", "Masking Tape"],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stockroom.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0;
    for (category_idx, (category_name, products)) in CATALOG.iter().enumerate() {
        let category = db
            .categories()
            .insert(category_name)
            .await
            .with_context(|| format!("inserting category {category_name}"))?;

        for (product_idx, name) in products.iter().enumerate() {
            let seed = category_idx * 10 + product_idx;
            let product = NewProduct {
                name: name.to_string(),
                category_id: category.id.clone(),
                image_url: format!("https://images.example.com/products/{}.jpg", seed),
                price_cents: 250 + ((seed * 137) % 4000) as i64,
                // Every fifth product starts sold out
                stock: if seed % 5 == 4 { 0 } else { (seed % 40) as i64 + 1 },
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            generated += 1;
        }
    }

    println!("✓ Generated {} products", generated);

    db.discounts()
        .insert(&NewDiscount {
            code: "SAVE10".to_string(),
            percentage: 10,
            is_active: true,
            expires_at: Utc::now() + Duration::days(90),
        })
        .await
        .context("inserting SAVE10")?;

    println!("✓ Discount SAVE10 (10%) created");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
