// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::sync::{SyncCoordinator, forget_remote, link_remote, set_token, sync_info};
use std::thread;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(ledger: &Ledger, sync: &mut SyncCoordinator<'_>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("status", sub)) => status(ledger, sub)?,
        Some(("push", _)) => {
            println!("{}", sync.push());
        }
        Some(("pull", _)) => {
            let status = sync.pull();
            println!("{}", status);
        }
        Some(("watch", sub)) => {
            let cycles = sub.get_one::<u64>("cycles").copied();
            let statuses = sync.subscribe_status();
            thread::spawn(move || {
                for status in statuses {
                    eprintln!("sync: {}", status);
                }
            });
            sync.run(cycles);
        }
        Some(("token", sub)) => {
            let token = sub.get_one::<String>("TOKEN").unwrap();
            set_token(ledger, token)?;
            println!("Token saved; the next push will use gist sync");
        }
        Some(("forget", _)) => {
            forget_remote(ledger)?;
            println!("Removed token and remote ids");
        }
        Some(("link", sub)) => {
            let gist_id = sub.get_one::<String>("GIST_ID").unwrap();
            link_remote(ledger, gist_id)?;
            println!("Linked gist {}; run `sync pull` to fetch it", gist_id.trim());
        }
        Some(("identity", sub)) => {
            if let Some(id) = sub.get_one::<String>("set") {
                sync.set_user_id(id)?;
            }
            if let Some(gist_id) = sub.get_one::<String>("gist") {
                link_remote(ledger, gist_id)?;
            }
            println!("{}", sync.user_id());
        }
        _ => {}
    }
    Ok(())
}

fn status(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let info = sync_info(ledger)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &info)? {
        return Ok(());
    }
    let rows = vec![
        vec!["user id".to_string(), info.user_id.unwrap_or_default()],
        vec![
            "token".to_string(),
            if info.token_configured { "configured" } else { "not set" }.to_string(),
        ],
        vec!["gist".to_string(), info.gist_id.unwrap_or_default()],
        vec!["paste".to_string(), info.paste_url.unwrap_or_default()],
        vec![
            "last sync".to_string(),
            info.last_sync
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".into()),
        ],
    ];
    println!("{}", pretty_table(&["Sync", "Value"], rows));
    Ok(())
}
