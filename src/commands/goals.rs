// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{GoalPatch, NewGoal, Priority};
use crate::summary::clamped_progress;
use crate::utils::{
    fmt_money, maybe_print_json, note_patch, opt_date, opt_decimal, opt_parse, parse_decimal,
    pretty_table,
};
use anyhow::{Result, bail};

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let g = ledger.add_goal(NewGoal {
                name: sub.get_one::<String>("name").unwrap().to_string(),
                target_amount: parse_decimal(sub.get_one::<String>("target").unwrap())?,
                saved_amount: parse_decimal(sub.get_one::<String>("saved").unwrap())?,
                deadline: opt_date(sub, "deadline")?,
                priority: opt_parse(sub, "priority")?.unwrap_or(Priority::Medium),
                notes: sub.get_one::<String>("note").map(|s| s.to_string()),
            })?;
            println!("Added goal '{}' (id {}, {}%)", g.name, g.id, g.progress);
        }
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("contribute", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let Some(g) = ledger.contribute_to_goal(id, amount)? else {
                bail!("Goal {} not found", id);
            };
            let ccy = ledger.settings()?.currency;
            println!(
                "Saved {} towards '{}' ({}% of {})",
                fmt_money(&amount, &ccy),
                g.name,
                clamped_progress(g.progress),
                fmt_money(&g.target_amount, &ccy)
            );
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            let deadline = if sub.get_flag("clear-deadline") {
                Some(None)
            } else {
                opt_date(sub, "deadline")?.map(Some)
            };
            let patch = GoalPatch {
                name: sub.get_one::<String>("name").cloned(),
                target_amount: opt_decimal(sub, "target")?,
                saved_amount: opt_decimal(sub, "saved")?,
                deadline,
                priority: opt_parse(sub, "priority")?,
                notes: note_patch(sub),
            };
            if !ledger.update_goal(id, patch)? {
                bail!("Goal {} not found", id);
            }
            println!("Updated goal {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            if !ledger.delete_goal(id)? {
                bail!("Goal {} not found", id);
            }
            println!("Deleted goal {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let doc = ledger.document()?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &doc.goals)? {
        return Ok(());
    }
    let ccy = &doc.settings.currency;
    let rows = doc
        .goals
        .iter()
        .map(|g| {
            vec![
                g.id.to_string(),
                g.name.clone(),
                fmt_money(&g.saved_amount, ccy),
                fmt_money(&g.target_amount, ccy),
                format!("{}%", clamped_progress(g.progress).round_dp(1)),
                g.deadline.map(|d| d.to_string()).unwrap_or_default(),
                g.priority.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Goal", "Saved", "Target", "Progress", "Deadline", "Priority"],
            rows
        )
    );
    Ok(())
}
