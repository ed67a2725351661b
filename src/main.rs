// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tallybook::config::SyncConfig;
use tallybook::ledger::Ledger;
use tallybook::sync::{SyncCoordinator, SyncStatus, Transports};
use tallybook::{cli, commands, db};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tallybook=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let store = db::open_or_init()?;
    let ledger = Ledger::open(store)?;
    let config = SyncConfig::load(ledger.store())?;
    let transports = if matches.get_flag("offline") {
        Transports::none()
    } else {
        config.transports()?
    };
    let mut sync = SyncCoordinator::new(&ledger, transports, config.options())?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("tx", sub)) => commands::transactions::handle(&ledger, sub)?,
        Some(("category", sub)) => commands::categories::handle(&ledger, sub)?,
        Some(("debt", sub)) => commands::debts::handle(&ledger, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&ledger, sub)?,
        Some(("invest", sub)) => commands::investments::handle(&ledger, sub)?,
        Some(("reminder", sub)) => commands::reminders::handle(&ledger, sub)?,
        Some(("summary", sub)) => commands::reports::summary(&ledger, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&ledger, sub)?,
        Some(("report", sub)) => commands::reports::report(&ledger, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&ledger, sub)?,
        Some(("import", sub)) => commands::importer::handle(&ledger, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&ledger, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&ledger)?,
        Some(("sync", sub)) => commands::sync::handle(&ledger, &mut sync, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }

    // Leaving the process is the unload hook: push anything still pending.
    match sync.shutdown() {
        None | Some(SyncStatus::PushSkipped(_)) => {}
        Some(status) => eprintln!("sync: {}", status),
    }
    Ok(())
}
