// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::utils::today;
use anyhow::{Context, Result, bail};

pub fn handle(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = match sub.get_one::<String>("out") {
        Some(p) => p.trim().to_string(),
        None if fmt == "csv" => format!("tallybook_transactions_{}.csv", today().format("%Y-%m-%d")),
        None => Ledger::export_file_name(today()),
    };

    match fmt.as_str() {
        "json" => {
            let text = ledger.export_json()?;
            std::fs::write(&out, text).with_context(|| format!("Write {}", out))?;
            println!("Exported backup to {}", out);
        }
        "csv" => {
            let n = export_transactions_csv(ledger, &out)?;
            println!("Exported {} transactions to {}", n, out);
        }
        other => bail!("Unknown format: {} (use json|csv)", other),
    }
    Ok(())
}

/// Flat transaction listing for spreadsheets, oldest first.
pub fn export_transactions_csv(ledger: &Ledger, out: &str) -> Result<usize> {
    let doc = ledger.document()?;
    let mut txs = doc.transactions.clone();
    txs.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut wtr = csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
    wtr.write_record([
        "id",
        "date",
        "type",
        "amount",
        "currency",
        "category",
        "description",
        "notes",
    ])?;
    for t in &txs {
        let category = t
            .category_id
            .and_then(|id| doc.category(id))
            .map(|c| c.name.clone())
            .unwrap_or_default();
        wtr.write_record([
            t.id.to_string(),
            t.date.to_string(),
            t.r#type.to_string(),
            t.amount.to_string(),
            doc.settings.currency.clone(),
            category,
            t.description.clone(),
            t.notes.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(txs.len())
}
