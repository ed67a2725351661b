// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, command, value_parser};

fn output_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print JSON").conflicts_with("jsonl"))
        .arg(arg!(--jsonl "Print one JSON object per line"))
}

fn id_arg() -> Arg {
    arg!(<ID> "Record id").value_parser(value_parser!(i64))
}

fn type_arg(help: &'static str) -> Arg {
    Arg::new("type").long("type").value_name("TYPE").help(help)
}

fn note_args(cmd: Command) -> Command {
    cmd.arg(arg!(--note <NOTE> "Free-form note"))
        .arg(
            Arg::new("clear-note")
                .long("clear-note")
                .action(ArgAction::SetTrue)
                .conflicts_with("note")
                .help("Remove the note"),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Income and expense transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record a transaction")
                .arg(type_arg("income | expense").required(true))
                .arg(arg!(--amount <AMOUNT>).required(true))
                .arg(arg!(--description <TEXT>).default_value(""))
                .arg(arg!(--category <ID> "Category id").value_parser(value_parser!(i64)))
                .arg(arg!(--date <DATE> "YYYY-MM-DD, defaults to today"))
                .arg(arg!(--note <NOTE>)),
        )
        .subcommand(output_flags(
            Command::new("list")
                .about("List transactions, newest first")
                .arg(type_arg("income | expense"))
                .arg(arg!(--date <DATE> "Exact date"))
                .arg(arg!(--category <ID>).value_parser(value_parser!(i64)))
                .arg(arg!(--from <DATE> "Start of range (inclusive)"))
                .arg(arg!(--to <DATE> "End of range (inclusive)"))
                .arg(arg!(--limit <N>).value_parser(value_parser!(usize))),
        ))
        .subcommand(note_args(
            Command::new("edit")
                .about("Update fields of a transaction")
                .arg(id_arg())
                .arg(type_arg("income | expense"))
                .arg(arg!(--amount <AMOUNT>))
                .arg(arg!(--description <TEXT>))
                .arg(arg!(--category <ID>).value_parser(value_parser!(i64)))
                .arg(
                    Arg::new("clear-category")
                        .long("clear-category")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("category"),
                )
                .arg(arg!(--date <DATE>)),
        ))
        .subcommand(Command::new("rm").about("Delete a transaction").arg(id_arg()))
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Income and expense categories")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(arg!(--name <NAME>).required(true))
                .arg(type_arg("income | expense").required(true))
                .arg(arg!(--budget <AMOUNT> "Monthly budget").default_value("0")),
        )
        .subcommand(output_flags(
            Command::new("list").arg(type_arg("income | expense")),
        ))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(type_arg("income | expense"))
                .arg(arg!(--budget <AMOUNT>)),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn debt_cmd() -> Command {
    Command::new("debt")
        .about("Debts and installment plans")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(arg!(--name <NAME>).required(true))
                .arg(type_arg("debt | installment").default_value("debt"))
                .arg(arg!(--total <AMOUNT>).required(true))
                .arg(arg!(--paid <AMOUNT>).default_value("0"))
                .arg(arg!(--due <DATE>).required(true))
                .arg(arg!(--installment <AMOUNT> "Per-period installment"))
                .arg(arg!(--note <NOTE>)),
        )
        .subcommand(output_flags(Command::new("list")))
        .subcommand(
            Command::new("pay")
                .about("Pay towards a debt and book the expense")
                .arg(id_arg())
                .arg(arg!(--amount <AMOUNT>).required(true)),
        )
        .subcommand(note_args(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(type_arg("debt | installment"))
                .arg(arg!(--total <AMOUNT>))
                .arg(arg!(--paid <AMOUNT>))
                .arg(arg!(--due <DATE>))
                .arg(arg!(--installment <AMOUNT>)),
        ))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn goal_cmd() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(arg!(--name <NAME>).required(true))
                .arg(arg!(--target <AMOUNT>).required(true))
                .arg(arg!(--saved <AMOUNT>).default_value("0"))
                .arg(arg!(--deadline <DATE>))
                .arg(arg!(--priority <PRIORITY> "low | medium | high").default_value("medium"))
                .arg(arg!(--note <NOTE>)),
        )
        .subcommand(output_flags(Command::new("list")))
        .subcommand(
            Command::new("contribute")
                .about("Add savings to a goal and book the expense")
                .arg(id_arg())
                .arg(arg!(--amount <AMOUNT>).required(true)),
        )
        .subcommand(note_args(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(arg!(--target <AMOUNT>))
                .arg(arg!(--saved <AMOUNT>))
                .arg(arg!(--deadline <DATE>))
                .arg(
                    Arg::new("clear-deadline")
                        .long("clear-deadline")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("deadline"),
                )
                .arg(arg!(--priority <PRIORITY>)),
        ))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn invest_cmd() -> Command {
    let expected_return = || {
        Arg::new("expected-return")
            .long("expected-return")
            .value_name("PCT")
            .help("Expected return in percent")
    };
    Command::new("invest")
        .about("Investments")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(arg!(--name <NAME>).required(true))
                .arg(type_arg("stocks | real-estate | bank-deposit | gold | other").required(true))
                .arg(arg!(--amount <AMOUNT>).required(true))
                .arg(arg!(--date <DATE>))
                .arg(expected_return())
                .arg(arg!(--note <NOTE>)),
        )
        .subcommand(output_flags(Command::new("list")))
        .subcommand(note_args(
            Command::new("edit")
                .arg(id_arg())
                .arg(arg!(--name <NAME>))
                .arg(type_arg("stocks | real-estate | bank-deposit | gold | other"))
                .arg(arg!(--amount <AMOUNT>))
                .arg(arg!(--date <DATE>))
                .arg(expected_return()),
        ))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn reminder_cmd() -> Command {
    Command::new("reminder")
        .about("Free-form reminders")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(arg!(--title <TITLE>).required(true))
                .arg(arg!(--date <DATE>))
                .arg(arg!(--amount <AMOUNT>))
                .arg(
                    arg!(--field <KV> "Extra key=value field")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(output_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Monthly budgets per expense category")
        .subcommand_required(true)
        .subcommand(output_flags(
            Command::new("status").about("This month's spending against budgets"),
        ))
        .subcommand(
            Command::new("set")
                .arg(arg!(--category <ID>).required(true).value_parser(value_parser!(i64)))
                .arg(arg!(--amount <AMOUNT>).required(true)),
        )
}

fn sync_cmd() -> Command {
    Command::new("sync")
        .about("Cloud mirror of local data")
        .subcommand_required(true)
        .subcommand(output_flags(Command::new("status")))
        .subcommand(Command::new("push").about("Push the current snapshot now"))
        .subcommand(Command::new("pull").about("Pull and merge the remote snapshot"))
        .subcommand(
            Command::new("watch")
                .about("Pull, then push periodically")
                .arg(
                    arg!(--cycles <N> "Stop after N pushes")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("token")
                .about("Store a GitHub token for gist sync")
                .arg(arg!(<TOKEN>)),
        )
        .subcommand(Command::new("forget").about("Remove the token and remote ids"))
        .subcommand(
            Command::new("link")
                .about("Use an existing gist created by another device")
                .arg(arg!(<GIST_ID>)),
        )
        .subcommand(
            Command::new("identity")
                .about("Show or replace the sync identity")
                .arg(arg!(--set <USER_ID> "Adopt another device's identity"))
                .arg(arg!(--gist <GIST_ID> "Also link the gist that identity pushes to")),
        )
}

pub fn build_cli() -> Command {
    command!()
        .name("tallybook")
        .about("Personal finance tracker with optional cloud sync")
        .arg_required_else_help(true)
        .arg(
            arg!(--offline "Skip all network sync for this invocation")
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the database and seed categories"))
        .subcommand(tx_cmd())
        .subcommand(category_cmd())
        .subcommand(debt_cmd())
        .subcommand(goal_cmd())
        .subcommand(invest_cmd())
        .subcommand(reminder_cmd())
        .subcommand(output_flags(
            Command::new("summary").about("Totals, this month and debts due soon"),
        ))
        .subcommand(budget_cmd())
        .subcommand(output_flags(
            Command::new("report").about("Totals by category over a period").arg(
                arg!(--period <PERIOD> "month | last-month | year | YYYY-MM-DD..YYYY-MM-DD")
                    .default_value("month"),
            ),
        ))
        .subcommand(
            Command::new("export")
                .about("Write a backup of all data")
                .arg(arg!(--out <PATH> "Output file, defaults to a dated name"))
                .arg(arg!(--format <FORMAT> "json | csv").default_value("json")),
        )
        .subcommand(
            Command::new("import")
                .about("Replace all data with a backup")
                .arg(arg!(--path <PATH>).required(true)),
        )
        .subcommand(
            Command::new("settings")
                .subcommand_required(true)
                .subcommand(output_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(arg!(--currency <CCY>))
                        .arg(arg!(--language <LANG>))
                        .arg(arg!(--theme <THEME>)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check data consistency"))
        .subcommand(sync_cmd())
}
