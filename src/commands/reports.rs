// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::summary::{ReportPeriod, financial_summary, period_report};
use crate::utils::{fmt_money, maybe_print_json, pretty_table, today};
use anyhow::Result;

/// `summary`: overall totals, this month and debts due within the window.
pub fn summary(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let doc = ledger.document()?;
    let s = financial_summary(&doc, today());
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    let ccy = &doc.settings.currency;
    let rows = vec![
        vec!["Total income".to_string(), fmt_money(&s.total_income, ccy)],
        vec!["Total expense".to_string(), fmt_money(&s.total_expense, ccy)],
        vec!["Net balance".to_string(), fmt_money(&s.net_balance, ccy)],
        vec!["Income this month".to_string(), fmt_money(&s.month_income, ccy)],
        vec!["Expense this month".to_string(), fmt_money(&s.month_expense, ccy)],
        vec!["Installments due".to_string(), fmt_money(&s.due_installments, ccy)],
        vec!["Debts due".to_string(), fmt_money(&s.due_debts, ccy)],
    ];
    println!("{}", pretty_table(&["", "Amount"], rows));
    Ok(())
}

/// `report --period`: totals and per-category breakdown for a window.
pub fn report(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let period: ReportPeriod = sub.get_one::<String>("period").unwrap().parse()?;
    let (start, end) = period.bounds(today())?;
    let doc = ledger.document()?;
    let r = period_report(&doc, start, end);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &r)? {
        return Ok(());
    }
    let ccy = &doc.settings.currency;
    let mut rows = Vec::new();
    for (name, amt) in &r.income_by_category {
        rows.push(vec!["income".to_string(), name.clone(), fmt_money(amt, ccy)]);
    }
    for (name, amt) in &r.expense_by_category {
        rows.push(vec!["expense".to_string(), name.clone(), fmt_money(amt, ccy)]);
    }
    println!("Report {} .. {} ({} transactions)", start, end, r.transaction_count);
    println!("{}", pretty_table(&["Type", "Category", "Amount"], rows));
    println!(
        "Income {} | expense {} | net {}",
        fmt_money(&r.total_income, ccy),
        fmt_money(&r.total_expense, ccy),
        fmt_money(&r.net_balance, ccy)
    );
    Ok(())
}
