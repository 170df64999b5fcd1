//! Paycheck distribution example.
//!
//! A salary lands in checking, part of it is swept to savings and the
//! employer withholds taxes and insurance. Loads the ledger as a book,
//! reconstructs every transaction and totals the flows per account pair
//! the way a cash-flow chart would.

use flow_reconstructor::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

const BOOK: &str = r#"{
    "accounts": [
        { "id": "salary",    "type": "INCOME",  "name": "Salary" },
        { "id": "checking",  "type": "BANK",    "name": "Checking" },
        { "id": "savings",   "type": "BANK",    "name": "Savings" },
        { "id": "tax",       "type": "EXPENSE", "name": "Income Tax" },
        { "id": "insurance", "type": "EXPENSE", "name": "Health Insurance" },
        { "id": "rent",      "type": "EXPENSE", "name": "Rent" },
        { "id": "opening",   "type": "EQUITY",  "name": "Opening Balances" }
    ],
    "splits": [
        { "transaction": "open",  "account": "checking",  "value": "500.00" },
        { "transaction": "open",  "account": "opening",   "value": "-500.00" },
        { "transaction": "pay-1", "account": "salary",    "value": "-4200.00" },
        { "transaction": "pay-1", "account": "checking",  "value": "2210.40" },
        { "transaction": "pay-1", "account": "savings",   "value": "500.00" },
        { "transaction": "pay-1", "account": "tax",       "value": "1180.60" },
        { "transaction": "pay-1", "account": "insurance", "value": "309.00" },
        { "transaction": "rent-1","account": "checking",  "value": "-1450.00" },
        { "transaction": "rent-1","account": "rent",      "value": "1450.00" }
    ]
}"#;

fn main() {
    env_logger::init();

    println!("╔══════════════════════════════════════════╗");
    println!("║  flow-reconstructor: Paycheck Split Demo ║");
    println!("╚══════════════════════════════════════════╝\n");

    let book = match Book::from_json(BOOK) {
        Ok(book) => book,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let transactions = match book.transactions() {
        Ok(txs) => txs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    println!(
        "{} transactions after dropping opening balances\n",
        transactions.len()
    );

    let reconstructor = match LinkReconstructor::new(ReconstructorConfig {
        workers: 2,
        ..Default::default()
    }) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let report = reconstructor.reconstruct_batch(&transactions);

    for (id, links) in report.succeeded() {
        println!("━━━ {} ━━━", id);
        for link in links {
            println!("  {:<10} → {:<10} {:>10}", link.source.as_str(), link.target.as_str(), link.value.to_string());
        }
        println!();
    }
    for error in report.failed() {
        println!("skipped: {}", error);
    }

    // Aggregate by (source, target) across all transactions
    let mut totals: BTreeMap<(&str, &str), Decimal> = BTreeMap::new();
    for link in report.links() {
        *totals
            .entry((link.source.as_str(), link.target.as_str()))
            .or_default() += link.value;
    }

    println!("━━━ Aggregated Flows ━━━\n");
    for ((source, target), value) in &totals {
        println!("  {:<10} → {:<10} {:>10}", source, target, value.to_string());
    }

    let summary = report.summary();
    println!(
        "\n{} of {} transactions reconstructed, {} links",
        summary.reconstructed, summary.transactions, summary.links
    );
}
