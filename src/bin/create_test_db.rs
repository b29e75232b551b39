use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use moneymap::{
    NewUser, PasswordHash, Transaction, TransactionKind, create_transaction, create_user,
    initialize_db,
};

/// A utility for creating a test database for the REST API server of moneymap.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo-password";

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let user = create_user(
        NewUser {
            full_name: "Demo User".to_owned(),
            email: DEMO_EMAIL.parse()?,
            password_hash: PasswordHash::new(DEMO_PASSWORD, PasswordHash::DEFAULT_COST)?,
            profile_image_url: None,
        },
        &conn,
    )?;

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc().replace_time(time::Time::MIDNIGHT);
    let transactions = [
        (TransactionKind::Income, "Salary", 4200.0, 3),
        (TransactionKind::Income, "Freelance", 650.0, 18),
        (TransactionKind::Income, "Salary", 4200.0, 33),
        (TransactionKind::Income, "Dividends", 120.5, 75),
        (TransactionKind::Expense, "Rent", 1800.0, 2),
        (TransactionKind::Expense, "Groceries", 145.9, 4),
        (TransactionKind::Expense, "Electricity", 96.3, 12),
        (TransactionKind::Expense, "Coffee", 5.5, 20),
        (TransactionKind::Expense, "Rent", 1800.0, 32),
    ];

    for (kind, label, amount, days_ago) in transactions {
        create_transaction(
            user.id,
            Transaction::build(kind, label, amount).date(today - Duration::days(days_ago)),
            &conn,
        )?;
    }

    println!("Success! Log in with {DEMO_EMAIL} and the password {DEMO_PASSWORD:?}.");

    Ok(())
}
