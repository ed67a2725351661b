// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{Ledger, TransactionFilter};
use crate::models::{EntryType, NewTransaction, TransactionPatch};
use crate::utils::{
    fmt_money, maybe_print_json, note_patch, opt_date, opt_decimal, opt_parse, parse_decimal,
    pretty_table, today,
};
use anyhow::{Result, bail};
use serde::Serialize;

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("rm", sub)) => rm(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let r#type: EntryType = opt_parse(sub, "type")?.unwrap_or(EntryType::Expense);
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let description = sub.get_one::<String>("description").cloned().unwrap_or_default();
    let category_id = sub.get_one::<i64>("category").copied();
    let date = opt_date(sub, "date")?.unwrap_or_else(today);
    let notes = sub.get_one::<String>("note").map(|s| s.to_string());

    if let Some(cid) = category_id {
        if !ledger.categories()?.iter().any(|c| c.id == cid) {
            tracing::warn!(category_id = cid, "transaction references an unknown category");
        }
    }

    let t = ledger.add_transaction(NewTransaction {
        r#type,
        amount,
        description,
        category_id,
        date,
        notes,
    })?;
    let ccy = ledger.settings()?.currency;
    println!(
        "Recorded {} {} on {} (id {})",
        t.r#type,
        fmt_money(&t.amount, &ccy),
        t.date,
        t.id
    );
    Ok(())
}

fn edit(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("ID").unwrap();
    let category_id = if sub.get_flag("clear-category") {
        Some(None)
    } else {
        sub.get_one::<i64>("category").map(|c| Some(*c))
    };
    let patch = TransactionPatch {
        r#type: opt_parse(sub, "type")?,
        amount: opt_decimal(sub, "amount")?,
        description: sub.get_one::<String>("description").cloned(),
        category_id,
        date: opt_date(sub, "date")?,
        notes: note_patch(sub),
    };
    if !ledger.update_transaction(id, patch)? {
        bail!("Transaction {} not found", id);
    }
    println!("Updated transaction {}", id);
    Ok(())
}

fn rm(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("ID").unwrap();
    if !ledger.delete_transaction(id)? {
        bail!("Transaction {} not found", id);
    }
    println!("Deleted transaction {}", id);
    Ok(())
}

fn list(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(ledger, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.r#type.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.description.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Type", "Amount", "Category", "Description", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub amount: String,
    pub category: String,
    pub description: String,
    pub note: String,
}

pub fn filter_from(sub: &clap::ArgMatches) -> Result<TransactionFilter> {
    Ok(TransactionFilter {
        r#type: opt_parse(sub, "type")?,
        date: opt_date(sub, "date")?,
        category_id: sub.get_one::<i64>("category").copied(),
        start: opt_date(sub, "from")?,
        end: opt_date(sub, "to")?,
        limit: sub.get_one::<usize>("limit").copied(),
    })
}

pub fn query_rows(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let filter = filter_from(sub)?;
    let doc = ledger.document()?;
    let data = ledger
        .filter_transactions(&filter)?
        .into_iter()
        .map(|t| TransactionRow {
            id: t.id,
            date: t.date.to_string(),
            r#type: t.r#type.to_string(),
            amount: t.amount.round_dp(2).to_string(),
            category: t
                .category_id
                .and_then(|id| doc.category(id))
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            description: t.description,
            note: t.notes.unwrap_or_default(),
        })
        .collect();
    Ok(data)
}
