// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use tallybook::db::Store;
use tallybook::ledger::Ledger;
use tallybook::models::DebtStatus;
use tallybook::{cli, commands};

fn setup() -> Ledger {
    let ledger = Ledger::open(Store::open_in_memory().unwrap()).unwrap();
    for (i, day) in ["2025-01-01", "2025-01-02", "2025-01-03"].iter().enumerate() {
        run(
            &ledger,
            &[
                "tx",
                "add",
                "--type",
                "expense",
                "--amount",
                " 10 ",
                "--category",
                "8",
                "--date",
                day,
                "--description",
                &format!("meal {}", i),
            ],
        );
    }
    ledger
}

fn run(ledger: &Ledger, args: &[&str]) {
    let cli = cli::build_cli();
    let mut argv = vec!["tallybook"];
    argv.extend_from_slice(args);
    let matches = cli.get_matches_from(argv);
    match matches.subcommand() {
        Some(("tx", sub)) => commands::transactions::handle(ledger, sub).unwrap(),
        Some(("debt", sub)) => commands::debts::handle(ledger, sub).unwrap(),
        Some(("goal", sub)) => commands::goals::handle(ledger, sub).unwrap(),
        Some(("category", sub)) => commands::categories::handle(ledger, sub).unwrap(),
        Some(("budget", sub)) => commands::budgets::handle(ledger, sub).unwrap(),
        Some(("reminder", sub)) => commands::reminders::handle(ledger, sub).unwrap(),
        Some(("settings", sub)) => commands::settings::handle(ledger, sub).unwrap(),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

#[test]
fn list_limit_respected() {
    let ledger = setup();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["tallybook", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = commands::transactions::query_rows(&ledger, list_m).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, "2025-01-03");
            assert_eq!(rows[0].category, "Food");
            assert_eq!(rows[0].amount.parse::<Decimal>().unwrap(), Decimal::new(10, 0));
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn list_filters_by_range() {
    let ledger = setup();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "tallybook", "tx", "list", "--from", "2025-01-02", "--to", "2025-01-02",
    ]);
    let (_, tx_m) = matches.subcommand().unwrap();
    let (_, list_m) = tx_m.subcommand().unwrap();
    let rows = commands::transactions::query_rows(&ledger, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "meal 1");
}

#[test]
fn edit_and_rm_via_cli() {
    let ledger = setup();
    let id = ledger.transactions().unwrap()[0].id.to_string();
    run(
        &ledger,
        &["tx", "edit", &id, "--amount", "12.5", "--clear-category", "--note", "tip"],
    );
    let t = ledger.transactions().unwrap().into_iter().next().unwrap();
    assert_eq!(t.amount, Decimal::new(125, 1));
    assert_eq!(t.category_id, None);
    assert_eq!(t.notes.as_deref(), Some("tip"));

    run(&ledger, &["tx", "rm", &id]);
    assert_eq!(ledger.transactions().unwrap().len(), 2);
}

#[test]
fn rm_unknown_id_is_an_error() {
    let ledger = setup();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["tallybook", "tx", "rm", "12345"]);
    let (_, tx_m) = matches.subcommand().unwrap();
    assert!(commands::transactions::handle(&ledger, tx_m).is_err());
    assert_eq!(ledger.transactions().unwrap().len(), 3);
}

#[test]
fn invalid_type_is_rejected_before_writing() {
    let ledger = setup();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "tallybook", "tx", "add", "--type", "transfer", "--amount", "1",
    ]);
    let (_, tx_m) = matches.subcommand().unwrap();
    let err = commands::transactions::handle(&ledger, tx_m).unwrap_err();
    assert!(err.to_string().contains("expected one of: income, expense"));
    assert_eq!(ledger.transactions().unwrap().len(), 3);
}

#[test]
fn debt_pay_books_expense_and_updates_status() {
    let ledger = setup();
    run(
        &ledger,
        &["debt", "add", "--name", "Phone", "--total", "300", "--due", "2099-01-01"],
    );
    let id = ledger.debts().unwrap()[0].id.to_string();
    run(&ledger, &["debt", "pay", &id, "--amount", "300"]);
    let d = &ledger.debts().unwrap()[0];
    assert_eq!(d.status, DebtStatus::Paid);
    assert_eq!(ledger.transactions().unwrap().len(), 4);
}

#[test]
fn goal_contribute_via_cli() {
    let ledger = setup();
    run(&ledger, &["goal", "add", "--name", "Bike", "--target", "400"]);
    let id = ledger.goals().unwrap()[0].id.to_string();
    run(&ledger, &["goal", "contribute", &id, "--amount", "100"]);
    assert_eq!(ledger.goals().unwrap()[0].progress, Decimal::new(25, 0));
}

#[test]
fn budget_set_targets_category_by_id() {
    let ledger = setup();
    run(&ledger, &["budget", "set", "--category", "8", "--amount", "250"]);
    let food = ledger
        .categories()
        .unwrap()
        .into_iter()
        .find(|c| c.id == 8)
        .unwrap();
    assert_eq!(food.budget, Decimal::new(250, 0));

    let cli = cli::build_cli();
    let matches =
        cli.get_matches_from(["tallybook", "budget", "set", "--category", "1", "--amount", "5"]);
    let (_, m) = matches.subcommand().unwrap();
    assert!(commands::budgets::handle(&ledger, m).is_err());
}

#[test]
fn reminder_fields_from_cli() {
    let ledger = setup();
    run(
        &ledger,
        &[
            "reminder", "add", "--title", "Rent", "--amount", "900", "--field", "repeat=monthly",
        ],
    );
    let r = &ledger.reminders().unwrap()[0];
    assert_eq!(r.fields["title"], "Rent");
    assert_eq!(r.fields["repeat"], "monthly");
    assert!(r.fields["amount"].is_number());
}

#[test]
fn settings_set_uppercases_currency() {
    let ledger = setup();
    run(&ledger, &["settings", "set", "--currency", "usd"]);
    assert_eq!(ledger.settings().unwrap().currency, "USD");
}
