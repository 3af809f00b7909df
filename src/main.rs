use anyhow::{Context, Result};
use std::env;
use std::path::Path;

use showroom::{
    compute_monthly_payment, default_monthly_payment, format_amount, FinancingOptions,
    SortDirection, Store, DEFAULT_ANNUAL_RATE, DEFAULT_TERM_MONTHS,
};

const DEFAULT_DB_PATH: &str = "showroom.db";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("init") => run_init(args.get(2).map(|s| s.as_str())),
        Some("list") => run_list(args.get(2).map(|s| s.as_str())),
        Some("quote") => run_quote(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("🚗 Showroom - dealership storefront core");
    println!();
    println!("Usage:");
    println!("  showroom init [db-path]             Create or upgrade the database");
    println!("  showroom list [db-path]             Print the vehicle catalog");
    println!("  showroom quote <price> [term] [rate]  Compute a financing quote");
}

fn run_init(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_DB_PATH);
    println!("🔧 Setting up database at {}...", path);

    Store::open(Path::new(path)).context("Failed to initialize database")?;

    println!("✓ Database ready");
    Ok(())
}

fn run_list(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_DB_PATH);

    if !Path::new(path).exists() {
        eprintln!("❌ Database not found at {}", path);
        eprintln!("   Run: showroom init");
        std::process::exit(1);
    }

    let store = Store::open(Path::new(path)).context("Failed to open database")?;
    let vehicles = store
        .list_vehicles(SortDirection::Descending)
        .context("Failed to load catalog")?;

    if vehicles.is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }

    println!("🚗 {} vehicle(s) in the catalog:\n", vehicles.len());
    for v in &vehicles {
        println!(
            "  {} {} {} — {} (from {}/month)",
            v.year,
            v.make,
            v.model,
            format_amount(v.price),
            format_amount(v.monthly_payment),
        );
    }

    Ok(())
}

fn run_quote(args: &[String]) -> Result<()> {
    let price: i64 = match args.first() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid price: {}", raw))?,
        None => {
            eprintln!("❌ Missing price");
            eprintln!("   Usage: showroom quote <price> [term] [rate]");
            std::process::exit(1);
        }
    };

    if price <= 0 {
        eprintln!("❌ Price must be greater than zero");
        std::process::exit(1);
    }

    let term: u32 = match args.get(1) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid term: {}", raw))?,
        None => DEFAULT_TERM_MONTHS,
    };

    let rate: f64 = match args.get(2) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid rate: {}", raw))?,
        None => DEFAULT_ANNUAL_RATE,
    };

    let options = FinancingOptions::for_price(price);
    let principal = price - options.down_payment_min;

    let payment = match compute_monthly_payment(principal, rate, term) {
        Ok(payment) => payment,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!("📊 Financing quote");
    println!("   List price:       {}", format_amount(price));
    println!("   Down payment:     {}", format_amount(options.down_payment_min));
    println!("   Financed amount:  {}", format_amount(principal));
    println!("   Term:             {} months", term);
    println!("   Rate:             {}% APR", rate);
    println!("   Monthly payment:  {}", format_amount(payment));

    // Listing cards use the fixed defaults; show that figure too when the
    // caller varied them
    if term != DEFAULT_TERM_MONTHS || rate != DEFAULT_ANNUAL_RATE {
        if let Ok(default) = default_monthly_payment(price) {
            println!("   (listing default: {}/month)", format_amount(default));
        }
    }

    Ok(())
}
