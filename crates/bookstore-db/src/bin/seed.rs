//! # Seed Data Generator
//!
//! Populates a development database with accounts and a sample catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./bookstore.db
//! cargo run -p bookstore-db --bin seed
//!
//! # Specify database path
//! cargo run -p bookstore-db --bin seed -- --db ./data/bookstore.db
//! ```
//!
//! ## Generated Data
//! - Manager account `manager` / `manager123`
//! - Customer account `reader` / `reader123`
//! - A catalog of classics, each with 10 copies in stock

use std::env;

use bookstore_core::UserRole;
use bookstore_db::{Database, DbConfig, NewBook};

/// (title, author, genre, year, buy cents, rent cents)
const CATALOG: &[(&str, &str, &str, i64, i64, i64)] = &[
    ("Pride and Prejudice", "Jane Austen", "Romance", 1813, 899, 199),
    ("Emma", "Jane Austen", "Romance", 1815, 949, 199),
    ("Dune", "Frank Herbert", "Science Fiction", 1965, 1999, 399),
    ("Solaris", "Stanislaw Lem", "Science Fiction", 1961, 1499, 349),
    ("Moby-Dick", "Herman Melville", "Adventure", 1851, 1199, 299),
    ("The Hobbit", "J. R. R. Tolkien", "Fantasy", 1937, 1599, 349),
    ("Frankenstein", "Mary Shelley", "Horror", 1818, 799, 199),
    ("Middlemarch", "George Eliot", "Literary Fiction", 1871, 1299, 299),
    ("The Left Hand of Darkness", "Ursula K. Le Guin", "Science Fiction", 1969, 1399, 299),
    ("Crime and Punishment", "Fyodor Dostoevsky", "Literary Fiction", 1866, 1099, 249),
];

const ACCOUNTS: &[(&str, &str, &str, UserRole)] = &[
    ("manager", "manager@bookstore.local", "manager123", UserRole::Manager),
    ("reader", "reader@bookstore.local", "reader123", UserRole::Customer),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bookstore.db");

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
                println!("Bookstore Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bookstore.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bookstore Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (username, email, password, role) in ACCOUNTS {
        let account = db
            .users()
            .register_with_role(username, email, password, *role)
            .await?;
        println!("✓ Account {} ({:?}) id={}", account.username, account.role, account.id);
    }

    println!();
    println!("Adding catalog...");

    for (title, author, genre, year, buy, rent) in CATALOG {
        let book = db
            .books()
            .insert(&NewBook {
                title: title.to_string(),
                author: author.to_string(),
                genre: Some(genre.to_string()),
                publication_year: Some(*year),
                price_buy_cents: *buy,
                price_rent_cents: *rent,
            })
            .await?;
        println!("  + [{}] {} by {}", book.id, book.title, book.author);
    }

    println!();
    println!("✓ Seeded {} books", db.books().count().await?);

    db.close().await;
    Ok(())
}
