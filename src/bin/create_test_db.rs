use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finance_tracker::{
    Budget, BudgetPeriod, Category, PasswordHash, PaymentMethod, Transaction, TransactionType,
    ValidatedPassword, create_budget, create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

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

    println!("Creating test user test@example.com with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("Test User", "test@example.com", password_hash, &conn)?;

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc().date();
    let transactions = [
        Transaction::build(TransactionType::Income, 4200.0, Category::Salary, today)
            .description("Salary")
            .payment_method(PaymentMethod::BankTransfer),
        Transaction::build(
            TransactionType::Expense,
            1650.0,
            Category::Housing,
            today - Duration::days(1),
        )
        .description("Rent")
        .payment_method(PaymentMethod::BankTransfer),
        Transaction::build(
            TransactionType::Expense,
            84.3,
            Category::Food,
            today - Duration::days(2),
        )
        .description("Groceries")
        .payment_method(PaymentMethod::DebitCard)
        .tags(&["weekly"])
        .location(Some("Corner store".to_owned())),
        Transaction::build(
            TransactionType::Expense,
            12.0,
            Category::Entertainment,
            today - Duration::days(40),
        )
        .description("Cinema")
        .payment_method(PaymentMethod::CreditCard),
    ];

    for transaction in &transactions {
        create_transaction(user.id, transaction, &conn)?;
    }

    println!("Creating budget...");

    let start_of_month = today.replace_day(1)?;
    create_budget(
        user.id,
        &Budget::build(Category::Food, 400.0, BudgetPeriod::Monthly, start_of_month),
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
