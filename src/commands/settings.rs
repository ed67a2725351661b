// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::SettingsPatch;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Result, bail};

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let s = ledger.settings()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                let rows = vec![
                    vec!["currency".to_string(), s.currency],
                    vec!["language".to_string(), s.language],
                    vec!["theme".to_string(), s.theme],
                ];
                println!("{}", pretty_table(&["Setting", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            let patch = SettingsPatch {
                currency: sub.get_one::<String>("currency").map(|s| s.to_uppercase()),
                language: sub.get_one::<String>("language").cloned(),
                theme: sub.get_one::<String>("theme").cloned(),
            };
            if patch.currency.is_none() && patch.language.is_none() && patch.theme.is_none() {
                bail!("Nothing to update: pass --currency, --language or --theme");
            }
            let s = ledger.update_settings(patch)?;
            println!(
                "Settings: currency {}, language {}, theme {}",
                s.currency, s.language, s.theme
            );
        }
        _ => {}
    }
    Ok(())
}
