// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use anyhow::{Context, Result};

/// Replaces all data with a previously exported backup. A rejected file
/// leaves the current data untouched.
pub fn handle(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let text = std::fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
    let doc = ledger.import_json(&text)?;
    println!(
        "Data imported from {}: {} transactions, {} categories, {} debts, {} goals, {} investments",
        path,
        doc.transactions.len(),
        doc.categories.len(),
        doc.debts.len(),
        doc.goals.len(),
        doc.investments.len()
    );
    Ok(())
}
