// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{CategoryPatch, EntryType};
use crate::summary::{BudgetHealth, budget_summary, clamped_progress};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table, today};
use anyhow::{Result, bail};

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(ledger, sub)?,
        Some(("status", sub)) => status(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let cat_id = *sub.get_one::<i64>("category").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let doc = ledger.document()?;
    let Some(cat) = doc.category(cat_id) else {
        bail!("Category {} not found", cat_id);
    };
    if cat.r#type != EntryType::Expense {
        bail!("Budgets apply to expense categories; '{}' is {}", cat.name, cat.r#type);
    }
    ledger.update_category(
        cat_id,
        CategoryPatch {
            budget: Some(amount),
            ..Default::default()
        },
    )?;
    println!(
        "Budget set for {} = {}",
        cat.name,
        fmt_money(&amount, &doc.settings.currency)
    );
    Ok(())
}

fn status(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let doc = ledger.document()?;
    let summary = budget_summary(&doc, today());
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        return Ok(());
    }
    let ccy = &doc.settings.currency;
    let rows = summary
        .category_spending
        .iter()
        .filter(|c| c.budget > rust_decimal::Decimal::ZERO || c.spent > rust_decimal::Decimal::ZERO)
        .map(|c| {
            let health = match c.health {
                BudgetHealth::Good => "ok",
                BudgetHealth::Warning => "warning",
                BudgetHealth::Over => "OVER",
            };
            vec![
                c.name.clone(),
                fmt_money(&c.budget, ccy),
                fmt_money(&c.spent, ccy),
                fmt_money(&c.remaining, ccy),
                format!("{:.0}%", clamped_progress(c.percent_used)),
                health.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Category", "Budget", "Spent", "Remaining", "Used", "Health"],
            rows
        )
    );
    println!(
        "Total budget {} | spent {} | remaining {}",
        fmt_money(&summary.total_budget, ccy),
        fmt_money(&summary.actual_spending, ccy),
        fmt_money(&summary.remaining_budget, ccy)
    );
    Ok(())
}
