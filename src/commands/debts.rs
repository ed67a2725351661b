// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{DebtPatch, DebtType, NewDebt};
use crate::summary::upcoming_payments;
use crate::utils::{
    fmt_money, maybe_print_json, note_patch, opt_date, opt_decimal, opt_parse, parse_date,
    parse_decimal, pretty_table, today,
};
use anyhow::{Result, bail};

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("pay", sub)) => pay(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            if !ledger.delete_debt(id)? {
                bail!("Debt {} not found", id);
            }
            println!("Deleted debt {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let d = ledger.add_debt(NewDebt {
        name: sub.get_one::<String>("name").unwrap().to_string(),
        r#type: opt_parse(sub, "type")?.unwrap_or(DebtType::Debt),
        total_amount: parse_decimal(sub.get_one::<String>("total").unwrap())?,
        paid_amount: parse_decimal(sub.get_one::<String>("paid").unwrap())?,
        due_date: parse_date(sub.get_one::<String>("due").unwrap().trim())?,
        installment_amount: opt_decimal(sub, "installment")?,
        notes: sub.get_one::<String>("note").map(|s| s.to_string()),
    })?;
    println!("Added {} '{}' (id {}, {})", d.r#type, d.name, d.id, d.status);
    Ok(())
}

fn pay(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("ID").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let Some(d) = ledger.record_debt_payment(id, amount)? else {
        bail!("Debt {} not found", id);
    };
    let ccy = ledger.settings()?.currency;
    println!(
        "Paid {} towards '{}'; remaining {} ({})",
        fmt_money(&amount, &ccy),
        d.name,
        fmt_money(&d.remaining(), &ccy),
        d.status
    );
    Ok(())
}

fn edit(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("ID").unwrap();
    let patch = DebtPatch {
        name: sub.get_one::<String>("name").cloned(),
        r#type: opt_parse(sub, "type")?,
        total_amount: opt_decimal(sub, "total")?,
        paid_amount: opt_decimal(sub, "paid")?,
        due_date: opt_date(sub, "due")?,
        installment_amount: opt_decimal(sub, "installment")?.map(Some),
        notes: note_patch(sub),
    };
    if !ledger.update_debt(id, patch)? {
        bail!("Debt {} not found", id);
    }
    println!("Updated debt {}", id);
    Ok(())
}

fn list(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let doc = ledger.document()?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &doc.debts)? {
        return Ok(());
    }
    let ccy = &doc.settings.currency;
    let rows = doc
        .debts
        .iter()
        .map(|d| {
            vec![
                d.id.to_string(),
                d.name.clone(),
                d.r#type.to_string(),
                fmt_money(&d.total_amount, ccy),
                fmt_money(&d.paid_amount, ccy),
                fmt_money(&d.remaining(), ccy),
                d.due_date.to_string(),
                d.status.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Type", "Total", "Paid", "Remaining", "Due", "Status"],
            rows
        )
    );
    let upcoming = upcoming_payments(&doc, today());
    for p in &upcoming {
        println!(
            "Due in {} day(s): {} ({})",
            p.days_until_due,
            p.name,
            fmt_money(&p.installment_amount.unwrap_or(p.remaining), ccy)
        );
    }
    Ok(())
}
