// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde_json::json;
use tallybook::db::Store;
use tallybook::error::LedgerError;
use tallybook::ledger::{DATA_KEY, Ledger, TransactionFilter};
use tallybook::models::{
    CategoryPatch, DebtPatch, DebtStatus, DebtType, EntryType, GoalPatch, NewCategory, NewDebt,
    NewGoal, NewInvestment, NewTransaction, Priority, SettingsPatch, TransactionPatch,
    InvestmentType, OTHER_EXPENSE_CATEGORY_ID,
};
use tallybook::notify::ChangeOrigin;
use tallybook::utils::today;

fn ledger() -> Ledger {
    Ledger::open(Store::open_in_memory().unwrap()).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn expense(amount: &str, category_id: i64, date: NaiveDate) -> NewTransaction {
    NewTransaction {
        r#type: EntryType::Expense,
        amount: dec(amount),
        description: "lunch".into(),
        category_id: Some(category_id),
        date,
        notes: None,
    }
}

fn debt(total: &str, paid: &str, due: NaiveDate) -> NewDebt {
    NewDebt {
        name: "Car loan".into(),
        r#type: DebtType::Installment,
        total_amount: dec(total),
        paid_amount: dec(paid),
        due_date: due,
        installment_amount: Some(dec("100")),
        notes: None,
    }
}

#[test]
fn first_open_seeds_categories_and_settings() {
    let l = ledger();
    let cats = l.categories().unwrap();
    assert_eq!(cats.len(), 14);
    assert_eq!(cats[0].name, "Salary");
    assert_eq!(cats[0].r#type, EntryType::Income);
    assert_eq!(cats[7].id, 8);
    assert_eq!(cats[7].r#type, EntryType::Expense);
    let s = l.settings().unwrap();
    assert_eq!(s.currency, "EGP");
    assert_eq!(s.language, "ar");
    assert_eq!(s.theme, "light");
    assert_eq!(l.document().unwrap().timestamp, Some(0));
    assert!(!l.initialize().unwrap());
}

#[test]
fn add_returns_input_with_id_and_count_grows() {
    let l = ledger();
    let before = l.transactions().unwrap().len();
    let t = l.add_transaction(expense("100", 8, today())).unwrap();
    let all = l.transactions().unwrap();
    assert_eq!(all.len(), before + 1);
    let stored = all.iter().find(|x| x.id == t.id).unwrap();
    assert_eq!(stored, &t);
    assert_eq!(stored.amount, dec("100"));
    assert_eq!(stored.category_id, Some(8));
    assert!(t.id > 14);
}

#[test]
fn ids_are_unique_across_rapid_adds() {
    let l = ledger();
    let mut ids: Vec<i64> = (0..20)
        .map(|_| l.add_transaction(expense("1", 8, today())).unwrap().id)
        .collect();
    let n = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), n);
}

#[test]
fn update_and_delete_unknown_ids_report_false() {
    let l = ledger();
    assert!(!l.delete_transaction(999).unwrap());
    assert!(!l
        .update_category(999, CategoryPatch { budget: Some(dec("5")), ..Default::default() })
        .unwrap());
    assert!(!l.delete_goal(1).unwrap());
}

#[test]
fn update_transaction_merges_fields() {
    let l = ledger();
    let t = l.add_transaction(expense("10", 8, today())).unwrap();
    let ok = l
        .update_transaction(
            t.id,
            TransactionPatch {
                amount: Some(dec("12.50")),
                notes: Some(Some("split bill".into())),
                category_id: Some(None),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(ok);
    let after = l.transactions().unwrap().into_iter().find(|x| x.id == t.id).unwrap();
    assert_eq!(after.amount, dec("12.50"));
    assert_eq!(after.description, "lunch");
    assert_eq!(after.category_id, None);
    assert_eq!(after.notes.as_deref(), Some("split bill"));
    assert_eq!(after.created_at, t.created_at);
}

#[test]
fn rejected_mutation_writes_nothing() {
    let l = ledger();
    let rx = l.subscribe();
    let before = l.store().get(DATA_KEY).unwrap();
    let err = l.add_transaction(expense("-1", 8, today())).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let err = l
        .add_category(NewCategory {
            name: "  ".into(),
            r#type: EntryType::Expense,
            budget: Decimal::ZERO,
        })
        .unwrap_err();
    assert!(err.to_string().contains("name is required"));
    assert_eq!(l.store().get(DATA_KEY).unwrap(), before);
    assert!(rx.try_recv().is_err());
}

#[test]
fn every_successful_mutation_publishes_one_local_event() {
    let l = ledger();
    let rx = l.subscribe();
    l.add_transaction(expense("3", 8, today())).unwrap();
    l.update_settings(SettingsPatch {
        currency: Some("USD".into()),
        ..Default::default()
    })
    .unwrap();
    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.key == DATA_KEY && e.origin == ChangeOrigin::Local));
}

#[test]
fn debt_goes_overdue_then_paid() {
    let l = ledger();
    let yesterday = today() - Duration::days(1);
    let d = l
        .add_debt(NewDebt {
            r#type: DebtType::Debt,
            installment_amount: None,
            ..debt("1000", "0", yesterday)
        })
        .unwrap();
    assert_eq!(d.status, DebtStatus::Overdue);
    l.update_debt(
        d.id,
        DebtPatch {
            paid_amount: Some(dec("1000")),
            ..Default::default()
        },
    )
    .unwrap();
    let after = l.debts().unwrap().into_iter().find(|x| x.id == d.id).unwrap();
    assert_eq!(after.status, DebtStatus::Paid);
}

#[test]
fn debt_paid_cannot_exceed_total() {
    let l = ledger();
    assert!(l.add_debt(debt("100", "150", today())).is_err());
    let d = l.add_debt(debt("100", "0", today())).unwrap();
    assert_eq!(d.status, DebtStatus::Pending);
    assert!(l.record_debt_payment(d.id, dec("101")).is_err());
    assert!(l.record_debt_payment(d.id, Decimal::ZERO).is_err());
}

#[test]
fn debt_payment_books_an_expense_in_one_write() {
    let l = ledger();
    let d = l.add_debt(debt("500", "100", today() + Duration::days(30))).unwrap();
    let rx = l.subscribe();
    let paid = l.record_debt_payment(d.id, dec("150")).unwrap().unwrap();
    assert_eq!(paid.paid_amount, dec("250"));
    assert_eq!(paid.remaining(), dec("250"));
    assert_eq!(rx.try_iter().count(), 1);

    let txs = l.transactions().unwrap();
    let booked = txs.iter().find(|t| t.description == "Payment: Car loan").unwrap();
    assert_eq!(booked.r#type, EntryType::Expense);
    assert_eq!(booked.amount, dec("150"));
    assert_eq!(booked.category_id, Some(OTHER_EXPENSE_CATEGORY_ID));
    assert!(l.record_debt_payment(424242, dec("1")).unwrap().is_none());
}

#[test]
fn goal_progress_tracks_contributions() {
    let l = ledger();
    let g = l
        .add_goal(NewGoal {
            name: "Laptop".into(),
            target_amount: dec("200"),
            saved_amount: dec("50"),
            deadline: None,
            priority: Priority::High,
            notes: None,
        })
        .unwrap();
    assert_eq!(g.progress, dec("25"));
    let g = l.contribute_to_goal(g.id, dec("50")).unwrap().unwrap();
    assert_eq!(g.saved_amount, dec("100"));
    assert_eq!(g.progress, dec("50"));
    assert!(l
        .transactions()
        .unwrap()
        .iter()
        .any(|t| t.description == "Savings: Laptop" && t.amount == dec("50")));
    assert!(l.contribute_to_goal(g.id, dec("101")).is_err());
    assert!(l
        .update_goal(g.id, GoalPatch { target_amount: Some(Decimal::ZERO), ..Default::default() })
        .is_err());
}

#[test]
fn investment_defaults_expected_return() {
    let l = ledger();
    let i = l
        .add_investment(NewInvestment {
            name: "Index fund".into(),
            r#type: InvestmentType::Stocks,
            amount: dec("1000"),
            date: today(),
            expected_return: None,
            notes: Some("  ".into()),
        })
        .unwrap();
    assert_eq!(i.expected_return, dec("5"));
    assert_eq!(i.notes, None);
}

#[test]
fn reminders_keep_free_form_fields() {
    let l = ledger();
    let fields = json!({"title": "Rent", "day": 1, "id": 7})
        .as_object()
        .unwrap()
        .clone();
    let r = l.add_reminder(fields).unwrap();
    assert_ne!(r.id, 7);
    let stored = l.reminders().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].fields["title"], "Rent");
    assert_eq!(stored[0].fields["day"], 1);
    assert!(l.delete_reminder(r.id).unwrap());
    assert!(l.reminders().unwrap().is_empty());
}

#[test]
fn filter_transactions_by_type_category_and_range() {
    let l = ledger();
    let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
    l.add_transaction(expense("10", 8, d(1))).unwrap();
    l.add_transaction(expense("20", 7, d(5))).unwrap();
    l.add_transaction(expense("30", 8, d(9))).unwrap();
    l.add_transaction(NewTransaction {
        r#type: EntryType::Income,
        amount: dec("500"),
        description: "pay".into(),
        category_id: Some(1),
        date: d(5),
        notes: None,
    })
    .unwrap();

    let food = l
        .filter_transactions(&TransactionFilter {
            category_id: Some(8),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(food.len(), 2);
    assert_eq!(food[0].date, d(9));

    let early_expenses = l
        .filter_transactions(&TransactionFilter {
            r#type: Some(EntryType::Expense),
            start: Some(d(1)),
            end: Some(d(5)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(early_expenses.len(), 2);

    let on_fifth = l
        .filter_transactions(&TransactionFilter {
            date: Some(d(5)),
            limit: Some(1),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(on_fifth.len(), 1);
}

#[test]
fn settings_reject_blank_values() {
    let l = ledger();
    assert!(l
        .update_settings(SettingsPatch {
            theme: Some(" ".into()),
            ..Default::default()
        })
        .is_err());
    let s = l
        .update_settings(SettingsPatch {
            theme: Some("dark".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(s.theme, "dark");
    assert_eq!(s.currency, "EGP");
}

#[test]
fn corrupt_document_fails_reads_and_mutations_without_writing() {
    let l = ledger();
    l.store().set(DATA_KEY, "{not json").unwrap();
    assert!(matches!(l.document(), Err(LedgerError::CorruptDocument(_))));
    assert!(matches!(
        l.add_transaction(expense("5", 8, today())),
        Err(LedgerError::CorruptDocument(_))
    ));
    assert_eq!(l.store().get(DATA_KEY).unwrap().as_deref(), Some("{not json"));
}

#[test]
fn missing_document_reports_storage_unavailable() {
    let l = ledger();
    l.store().remove(DATA_KEY).unwrap();
    assert!(matches!(l.document(), Err(LedgerError::StorageUnavailable(_))));
    assert!(matches!(l.categories(), Err(LedgerError::StorageUnavailable(_))));
}

#[test]
fn first_mutation_stamps_a_real_timestamp() {
    let l = ledger();
    l.add_transaction(expense("1", 8, today())).unwrap();
    assert!(l.document().unwrap().timestamp.unwrap() > 0);
}
