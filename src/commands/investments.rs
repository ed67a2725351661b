// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{InvestmentPatch, NewInvestment};
use crate::summary::investment_projection;
use crate::utils::{
    fmt_money, maybe_print_json, note_patch, opt_date, opt_decimal, opt_parse, parse_decimal,
    pretty_table, today,
};
use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let i = ledger.add_investment(NewInvestment {
                name: sub.get_one::<String>("name").unwrap().to_string(),
                r#type: opt_parse(sub, "type")?.context("--type is required")?,
                amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
                date: opt_date(sub, "date")?.unwrap_or_else(today),
                expected_return: opt_decimal(sub, "expected-return")?,
                notes: sub.get_one::<String>("note").map(|s| s.to_string()),
            })?;
            println!(
                "Added {} investment '{}' (id {}, expected {}%)",
                i.r#type, i.name, i.id, i.expected_return
            );
        }
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            let patch = InvestmentPatch {
                name: sub.get_one::<String>("name").cloned(),
                r#type: opt_parse(sub, "type")?,
                amount: opt_decimal(sub, "amount")?,
                date: opt_date(sub, "date")?,
                expected_return: opt_decimal(sub, "expected-return")?,
                notes: note_patch(sub),
            };
            if !ledger.update_investment(id, patch)? {
                bail!("Investment {} not found", id);
            }
            println!("Updated investment {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            if !ledger.delete_investment(id)? {
                bail!("Investment {} not found", id);
            }
            println!("Deleted investment {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvestmentRow {
    id: i64,
    name: String,
    r#type: String,
    amount: Decimal,
    date: String,
    expected_return: Decimal,
    expected_value: Decimal,
    expected_profit: Decimal,
}

fn list(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let doc = ledger.document()?;
    let data: Vec<InvestmentRow> = doc
        .investments
        .iter()
        .map(|i| {
            let p = investment_projection(i);
            InvestmentRow {
                id: i.id,
                name: i.name.clone(),
                r#type: i.r#type.to_string(),
                amount: i.amount,
                date: i.date.to_string(),
                expected_return: i.expected_return,
                expected_value: p.expected_value,
                expected_profit: p.expected_profit,
            }
        })
        .collect();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let ccy = &doc.settings.currency;
    let total: Decimal = data.iter().map(|r| r.amount).sum();
    let total_value: Decimal = data.iter().map(|r| r.expected_value).sum();
    let rows = data
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.name.clone(),
                r.r#type.clone(),
                fmt_money(&r.amount, ccy),
                r.date.clone(),
                format!("{}%", r.expected_return),
                fmt_money(&r.expected_value, ccy),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Type", "Amount", "Date", "Return", "Expected value"],
            rows
        )
    );
    println!(
        "Invested {} | expected {}",
        fmt_money(&total, ccy),
        fmt_money(&total_value, ccy)
    );
    Ok(())
}
