// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{CategoryPatch, EntryType, NewCategory};
use crate::utils::{maybe_print_json, opt_decimal, opt_parse, parse_decimal, pretty_table};
use anyhow::{Result, bail};

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let r#type: EntryType = opt_parse(sub, "type")?.unwrap_or(EntryType::Expense);
            let budget = parse_decimal(sub.get_one::<String>("budget").unwrap())?;
            let c = ledger.add_category(NewCategory {
                name: name.to_string(),
                r#type,
                budget,
            })?;
            println!("Added {} category '{}' (id {})", c.r#type, c.name, c.id);
        }
        Some(("list", sub)) => {
            let kind: Option<EntryType> = opt_parse(sub, "type")?;
            let data: Vec<_> = ledger
                .categories()?
                .into_iter()
                .filter(|c| kind.is_none_or(|k| c.r#type == k))
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.r#type.to_string(),
                            format!("{:.2}", c.budget),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Category", "Type", "Budget"], rows));
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            let patch = CategoryPatch {
                name: sub.get_one::<String>("name").cloned(),
                r#type: opt_parse(sub, "type")?,
                budget: opt_decimal(sub, "budget")?,
            };
            if !ledger.update_category(id, patch)? {
                bail!("Category {} not found", id);
            }
            println!("Updated category {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("ID").unwrap();
            if !ledger.delete_category(id)? {
                bail!("Category {} not found", id);
            }
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}
