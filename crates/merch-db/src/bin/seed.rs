//! # Catalog Seeder
//!
//! Applies migrations and inserts the default merch catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./merch.db (default)
//! cargo run -p merch-db --bin seed
//!
//! # Specify database path
//! cargo run -p merch-db --bin seed -- --db ./data/merch.db
//!
//! # Only print the catalog that would be inserted
//! cargo run -p merch-db --bin seed -- --list
//! ```
//!
//! Safe to run repeatedly: items that already exist are skipped.

use std::env;

use clap::Parser;
use merch_db::{seed_catalog, Database, DbConfig, SqliteLedgerRepository, DEFAULT_CATALOG};

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Merch Shop Catalog Seeder")]
struct Args {
    /// Database file path (default: $DATABASE_PATH or ./merch.db)
    #[arg(short, long)]
    db: Option<String>,

    /// Print the default catalog and exit
    #[arg(short, long)]
    list: bool,
}

impl Args {
    fn database_path(&self) -> String {
        self.db
            .clone()
            .or_else(|| env::var("DATABASE_PATH").ok())
            .unwrap_or_else(|| String::from("./merch.db"))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let db_path = args.database_path();

    if args.list {
        for (name, price) in DEFAULT_CATALOG {
            println!("{:<12} {:>5}", name, price);
        }
        return Ok(());
    }

    println!("Merch Shop Catalog Seeder");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let added = seed_catalog(&db).await?;
    if added == 0 {
        println!("✓ Catalog already complete, nothing added");
    } else {
        println!("✓ Added {} of {} items", added, DEFAULT_CATALOG.len());
    }

    println!();
    println!("Catalog:");
    let mut conn = db.pool().acquire().await?;
    let items = SqliteLedgerRepository::new(&mut conn, true).list_items().await?;
    for item in &items {
        println!("  {:<12} {:>5}", item.name, item.price);
    }

    drop(conn);
    db.close().await;
    println!();
    println!("✓ Seed complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_flag() {
        let args = Args::try_parse_from(["seed", "--db", "./data/merch.db"]).unwrap();
        assert_eq!(args.database_path(), "./data/merch.db");
        assert!(!args.list);

        let args = Args::try_parse_from(["seed", "-d", "shop.db", "-l"]).unwrap();
        assert_eq!(args.db.as_deref(), Some("shop.db"));
        assert!(args.list);
    }

    #[test]
    fn test_db_flag_requires_value() {
        assert!(Args::try_parse_from(["seed", "--db"]).is_err());
    }

    #[test]
    fn test_unknown_argument_rejected() {
        assert!(Args::try_parse_from(["seed", "--dbb", "x.db"]).is_err());
    }
}
