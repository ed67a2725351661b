// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::utils::{maybe_print_json, opt_date, opt_decimal, pretty_table};
use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Value};

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let fields = fields_from(sub)?;
            let r = ledger.add_reminder(fields)?;
            println!("Added reminder {}", r.id);
        }
        Some(("list", sub)) => {
            let data = ledger.reminders()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|r| {
                        let text = |k: &str| match r.fields.get(k) {
                            Some(Value::String(s)) => s.clone(),
                            Some(other) => other.to_string(),
                            None => String::new(),
                        };
                        let extra: Vec<String> = r
                            .fields
                            .iter()
                            .filter(|(k, _)| !matches!(k.as_str(), "title" | "date" | "amount"))
                            .map(|(k, v)| format!("{}={}", k, v))
                            .collect();
                        vec![
                            r.id.to_string(),
                            text("title"),
                            text("date"),
                            text("amount"),
                            extra.join(" "),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Title", "Date", "Amount", "Other"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            if !ledger.delete_reminder(id)? {
                bail!("Reminder {} not found", id);
            }
            println!("Deleted reminder {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// Collects `--title`, `--date`, `--amount` and repeated `--field k=v` into
/// the reminder's free-form field map.
pub fn fields_from(sub: &clap::ArgMatches) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    if let Some(title) = sub.get_one::<String>("title") {
        fields.insert("title".into(), Value::String(title.trim().to_string()));
    }
    if let Some(date) = opt_date(sub, "date")? {
        fields.insert("date".into(), Value::String(date.to_string()));
    }
    if let Some(amount) = opt_decimal(sub, "amount")? {
        fields.insert("amount".into(), serde_json::to_value(amount)?);
    }
    for kv in sub.get_many::<String>("field").into_iter().flatten() {
        let (k, v) = kv
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid field '{}', expected key=value", kv))?;
        let k = k.trim();
        if k.is_empty() || k == "id" {
            bail!("Invalid field name '{}'", k);
        }
        fields.insert(k.to_string(), Value::String(v.trim().to_string()));
    }
    Ok(fields)
}
