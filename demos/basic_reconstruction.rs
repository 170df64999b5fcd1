//! Basic link reconstruction example.
//!
//! Shows how a three-way split purchase is turned into directed links,
//! and how the two strategies agree when the answer is unique.

use flow_reconstructor::prelude::*;
use rust_decimal_macros::dec;

fn main() {
    println!("╔═══════════════════════════════════════════════════╗");
    println!("║  flow-reconstructor: Basic Reconstruction Example ║");
    println!("╚═══════════════════════════════════════════════════╝\n");

    // --- Scenario 1: one card pays two expenses ---
    println!("━━━ Scenario 1: Split Purchase ━━━\n");

    let purchase = Transaction::new("receipt-0042")
        .with_split(Split::new("checking", AccountType::Bank, dec!(-10.25)))
        .with_split(Split::new("groceries", AccountType::Expense, dec!(8.66)))
        .with_split(Split::new("household", AccountType::Expense, dec!(1.59)));

    for split in purchase.splits() {
        println!("  {:<10} {:<8} {:>8}", split.account.as_str(), split.account_type.as_str(), split.value.to_string());
    }
    println!();

    for strategy in ["continuous", "exact"] {
        let reconstructor = match LinkReconstructor::with_strategy(strategy) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };
        match reconstructor.reconstruct(&purchase) {
            Ok(links) => {
                println!("{} strategy:", strategy);
                for link in &links {
                    println!("  {} → {}: {}", link.source, link.target, link.value);
                }
                println!("  total movement: {}\n", links.total_value());
            }
            Err(e) => println!("{} strategy failed: {}\n", strategy, e),
        }
    }

    // --- Scenario 2: two accounts pay one bill ---
    println!("━━━ Scenario 2: Shared Payment ━━━\n");

    let shared = Transaction::new("rent-2024-03")
        .with_split(Split::new("checking", AccountType::Bank, dec!(-3.53)))
        .with_split(Split::new("savings", AccountType::Bank, dec!(-4.47)))
        .with_split(Split::new("rent", AccountType::Expense, dec!(8.00)));

    let reconstructor = match LinkReconstructor::new(ReconstructorConfig::default()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    match reconstructor.reconstruct(&shared) {
        Ok(links) => {
            for link in &links {
                println!("  {} → {}: {}", link.source, link.target, link.value);
            }
        }
        Err(e) => println!("  failed: {}", e),
    }
    println!();

    // --- Scenario 3: data errors stay per transaction ---
    println!("━━━ Scenario 3: Unbalanced Input ━━━\n");

    let broken = Transaction::new("typo")
        .with_split(Split::new("checking", AccountType::Bank, dec!(-10.00)))
        .with_split(Split::new("fuel", AccountType::Expense, dec!(1.00)))
        .with_split(Split::new("food", AccountType::Expense, dec!(10.00)));

    match reconstructor.reconstruct(&broken) {
        Ok(_) => println!("  unexpectedly reconstructed"),
        Err(e) => println!("  {} error: {}", e.kind(), e),
    }
}
