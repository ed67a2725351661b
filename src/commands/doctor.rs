// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{Ledger, recompute_derived};
use crate::models::Document;
use crate::utils::{pretty_table, today};
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashSet;

pub fn handle(ledger: &Ledger) -> Result<()> {
    let doc = ledger.document()?;
    let rows: Vec<Vec<String>> = check(&doc, today())
        .into_iter()
        .map(|(issue, detail)| vec![issue, detail])
        .collect();

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Consistency findings as `(issue, detail)` pairs.
pub fn check(doc: &Document, today: NaiveDate) -> Vec<(String, String)> {
    let mut rows = Vec::new();

    // 1) Transactions pointing at categories that no longer exist
    for t in &doc.transactions {
        if let Some(cid) = t.category_id {
            if doc.category(cid).is_none() {
                rows.push((
                    "unknown_category".into(),
                    format!("tx {} -> category {}", t.id, cid),
                ));
            }
        }
    }

    // 2) Duplicate category names within a type
    let mut seen = HashSet::new();
    for c in &doc.categories {
        let key = (c.r#type, c.name.to_lowercase());
        if !seen.insert(key) {
            rows.push(("duplicate_category".into(), format!("{} ({})", c.name, c.r#type)));
        }
    }

    // 3) Derived fields out of date
    let mut fresh = doc.clone();
    recompute_derived(&mut fresh, today);
    for (stored, want) in doc.debts.iter().zip(&fresh.debts) {
        if stored.status != want.status {
            rows.push((
                "stale_debt_status".into(),
                format!("{}: {} (should be {})", stored.name, stored.status, want.status),
            ));
        }
    }
    for (stored, want) in doc.goals.iter().zip(&fresh.goals) {
        if stored.progress != want.progress {
            rows.push((
                "stale_goal_progress".into(),
                format!("{}: {}% (should be {}%)", stored.name, stored.progress, want.progress),
            ));
        }
    }

    let ids: Vec<i64> = doc
        .transactions
        .iter()
        .map(|t| t.id)
        .chain(doc.categories.iter().map(|c| c.id))
        .chain(doc.debts.iter().map(|d| d.id))
        .chain(doc.goals.iter().map(|g| g.id))
        .chain(doc.investments.iter().map(|i| i.id))
        .chain(doc.reminders.iter().map(|r| r.id))
        .collect();
    let mut unique = HashSet::new();
    for id in ids {
        if !unique.insert(id) {
            rows.push(("duplicate_id".into(), id.to_string()));
        }
    }

    rows
}
