// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The record store: typed CRUD over the single persisted [`Document`].
//!
//! Every mutation loads the document, applies the change to a copy, validates
//! it and writes the whole document back in one `set`. A rejected mutation
//! writes nothing.

use crate::db::{NAMESPACE, Store, in_namespace};
use crate::error::{LedgerError, Result};
use crate::models::{
    Category, CategoryPatch, Debt, DebtPatch, Document, EntryType, Goal, GoalPatch, Investment,
    InvestmentPatch, NewCategory, NewDebt, NewGoal, NewInvestment, NewTransaction,
    OTHER_EXPENSE_CATEGORY_ID, Reminder, Settings, SettingsPatch, Transaction, TransactionPatch,
};
use crate::notify::{ChangeEvent, ChangeOrigin};
use crate::summary::{debt_status, goal_progress};
use crate::utils::{now_ms, today};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::cell::Cell;
use std::sync::mpsc::Receiver;

/// Storage key holding the serialized [`Document`].
pub const DATA_KEY: &str = "tallybook_data";

/// Hands out time-derived ids that strictly increase for the life of the
/// process and never fall at or below `floor`.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: Cell<i64>,
}

impl IdGenerator {
    pub fn next(&self, floor: i64) -> i64 {
        let id = now_ms()
            .max(self.last.get().saturating_add(1))
            .max(floor.saturating_add(1));
        self.last.set(id);
        id
    }
}

/// Narrowing criteria for [`Ledger::filter_transactions`]. Unset fields match
/// everything; the date range is inclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub r#type: Option<EntryType>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub limit: Option<usize>,
}

/// Result of merging a remote snapshot into local storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub updated: Vec<String>,
    /// Remote keys that won the comparison but could not be applied.
    pub skipped: Vec<String>,
}

impl MergeOutcome {
    pub fn reload_required(&self) -> bool {
        !self.updated.is_empty()
    }
}

pub struct Ledger {
    store: Store,
    ids: IdGenerator,
}

fn invalid(msg: impl Into<String>) -> LedgerError {
    LedgerError::Validation(msg.into())
}

fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid(format!("{} name is required", what)));
    }
    Ok(())
}

fn non_negative(v: Decimal, field: &str) -> Result<()> {
    if v < Decimal::ZERO {
        return Err(invalid(format!("{} must not be negative (got {})", field, v)));
    }
    Ok(())
}

fn validate_transaction(t: &Transaction) -> Result<()> {
    non_negative(t.amount, "Amount")
}

fn validate_category(c: &Category) -> Result<()> {
    require_name(&c.name, "Category")?;
    non_negative(c.budget, "Budget")
}

fn validate_debt(d: &Debt) -> Result<()> {
    require_name(&d.name, "Debt")?;
    non_negative(d.total_amount, "Total amount")?;
    non_negative(d.paid_amount, "Paid amount")?;
    if let Some(i) = d.installment_amount {
        non_negative(i, "Installment amount")?;
    }
    if d.paid_amount > d.total_amount {
        return Err(invalid(format!(
            "Paid amount {} cannot exceed total amount {}",
            d.paid_amount, d.total_amount
        )));
    }
    Ok(())
}

fn validate_goal(g: &Goal) -> Result<()> {
    require_name(&g.name, "Goal")?;
    if g.target_amount <= Decimal::ZERO {
        return Err(invalid(format!(
            "Target amount must be positive (got {})",
            g.target_amount
        )));
    }
    non_negative(g.saved_amount, "Saved amount")?;
    if g.saved_amount > g.target_amount {
        return Err(invalid(format!(
            "Saved amount {} cannot exceed target amount {}",
            g.saved_amount, g.target_amount
        )));
    }
    Ok(())
}

fn validate_investment(i: &Investment) -> Result<()> {
    require_name(&i.name, "Investment")?;
    non_negative(i.amount, "Amount")
}

fn refresh_debt(d: &mut Debt, today: NaiveDate) {
    d.status = debt_status(d.paid_amount, d.total_amount, d.due_date, today);
}

fn refresh_goal(g: &mut Goal) {
    g.progress = goal_progress(g.saved_amount, g.target_amount);
}

/// Recomputes every derived field from source amounts.
pub fn recompute_derived(doc: &mut Document, today: NaiveDate) {
    for d in doc.debts.iter_mut() {
        refresh_debt(d, today);
    }
    for g in doc.goals.iter_mut() {
        refresh_goal(g);
    }
}

fn timestamp_of(v: &Value) -> Option<f64> {
    v.get("_timestamp").and_then(Value::as_f64)
}

/// Last-writer-wins rule for one key: a remote value replaces the local one
/// when there is no usable local value, or when both carry a `_timestamp` and
/// the remote one is strictly newer.
pub fn remote_wins(local: Option<&Value>, remote: &Value) -> bool {
    match local {
        None => true,
        Some(l) => match (timestamp_of(remote), timestamp_of(l)) {
            (Some(r), Some(l)) => r > l,
            _ => false,
        },
    }
}

fn clean_notes(n: Option<String>) -> Option<String> {
    n.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn remove_by_id<T>(items: &mut Vec<T>, id: i64, id_of: impl Fn(&T) -> i64) -> bool {
    match items.iter().position(|x| id_of(x) == id) {
        Some(idx) => {
            items.remove(idx);
            true
        }
        None => false,
    }
}

impl Ledger {
    /// Wraps `store` and seeds the document if this is the first run.
    pub fn open(store: Store) -> Result<Self> {
        let ledger = Self {
            store,
            ids: IdGenerator::default(),
        };
        ledger.initialize()?;
        Ok(ledger)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.store.subscribe()
    }

    /// Seeds the default document when none exists. Returns whether it seeded.
    /// The seed carries `_timestamp` 0 so any document written on another
    /// device wins the first merge.
    pub fn initialize(&self) -> Result<bool> {
        if self.store.get(DATA_KEY)?.is_some() {
            return Ok(false);
        }
        let mut doc = Document::seed();
        doc.timestamp = Some(0);
        self.write_document(&doc)?;
        tracing::info!("seeded new document with {} categories", doc.categories.len());
        Ok(true)
    }

    pub fn document(&self) -> Result<Document> {
        let raw = self.store.get(DATA_KEY)?.ok_or_else(|| {
            LedgerError::StorageUnavailable(format!("no document stored under '{}'", DATA_KEY))
        })?;
        serde_json::from_str(&raw).map_err(|e| LedgerError::CorruptDocument(e.to_string()))
    }

    /// Stamps `_timestamp` and persists the whole document.
    pub fn save_document(&self, doc: &mut Document) -> Result<()> {
        doc.timestamp = Some(now_ms());
        self.write_document(doc)
    }

    fn write_document(&self, doc: &Document) -> Result<()> {
        let text =
            serde_json::to_string(doc).map_err(|e| LedgerError::CorruptDocument(e.to_string()))?;
        self.store.set(DATA_KEY, &text)?;
        Ok(())
    }

    /// Loads, applies `f`, and persists if `f` returned `Some`.
    fn mutate<T>(&self, f: impl FnOnce(&mut Document) -> Result<Option<T>>) -> Result<Option<T>> {
        let mut doc = self.document()?;
        let out = f(&mut doc)?;
        if out.is_some() {
            self.save_document(&mut doc)?;
        }
        Ok(out)
    }

    fn next_id(&self, doc: &Document) -> i64 {
        self.ids.next(doc.max_id())
    }

    // === transactions ===

    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.document()?.transactions)
    }

    pub fn add_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        let added = self.mutate(|doc| {
            let t = Transaction {
                id: self.next_id(doc),
                r#type: new.r#type,
                amount: new.amount,
                description: new.description.trim().to_string(),
                category_id: new.category_id,
                date: new.date,
                notes: clean_notes(new.notes),
                created_at: Utc::now(),
            };
            validate_transaction(&t)?;
            doc.transactions.push(t.clone());
            Ok(Some(t))
        })?;
        added.ok_or_else(|| invalid("transaction was not added"))
    }

    pub fn update_transaction(&self, id: i64, patch: TransactionPatch) -> Result<bool> {
        let done = self.mutate(|doc| {
            let Some(slot) = doc.transactions.iter_mut().find(|t| t.id == id) else {
                return Ok(None);
            };
            let mut t = slot.clone();
            if let Some(v) = patch.r#type {
                t.r#type = v;
            }
            if let Some(v) = patch.amount {
                t.amount = v;
            }
            if let Some(v) = patch.description {
                t.description = v.trim().to_string();
            }
            if let Some(v) = patch.category_id {
                t.category_id = v;
            }
            if let Some(v) = patch.date {
                t.date = v;
            }
            if let Some(v) = patch.notes {
                t.notes = clean_notes(v);
            }
            validate_transaction(&t)?;
            *slot = t;
            Ok(Some(()))
        })?;
        Ok(done.is_some())
    }

    pub fn delete_transaction(&self, id: i64) -> Result<bool> {
        let done = self.mutate(|doc| {
            Ok(remove_by_id(&mut doc.transactions, id, |t| t.id).then_some(()))
        })?;
        Ok(done.is_some())
    }

    /// Matching transactions, newest date first.
    pub fn filter_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut out: Vec<Transaction> = self
            .transactions()?
            .into_iter()
            .filter(|t| filter.r#type.is_none_or(|k| t.r#type == k))
            .filter(|t| filter.date.is_none_or(|d| t.date == d))
            .filter(|t| filter.category_id.is_none_or(|c| t.category_id == Some(c)))
            .filter(|t| filter.start.is_none_or(|s| t.date >= s))
            .filter(|t| filter.end.is_none_or(|e| t.date <= e))
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        if let Some(n) = filter.limit {
            out.truncate(n);
        }
        Ok(out)
    }

    // === categories ===

    pub fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.document()?.categories)
    }

    pub fn add_category(&self, new: NewCategory) -> Result<Category> {
        let added = self.mutate(|doc| {
            let c = Category {
                id: self.next_id(doc),
                name: new.name.trim().to_string(),
                r#type: new.r#type,
                budget: new.budget,
            };
            validate_category(&c)?;
            doc.categories.push(c.clone());
            Ok(Some(c))
        })?;
        added.ok_or_else(|| invalid("category was not added"))
    }

    pub fn update_category(&self, id: i64, patch: CategoryPatch) -> Result<bool> {
        let done = self.mutate(|doc| {
            let Some(slot) = doc.categories.iter_mut().find(|c| c.id == id) else {
                return Ok(None);
            };
            let mut c = slot.clone();
            if let Some(v) = patch.name {
                c.name = v.trim().to_string();
            }
            if let Some(v) = patch.r#type {
                c.r#type = v;
            }
            if let Some(v) = patch.budget {
                c.budget = v;
            }
            validate_category(&c)?;
            *slot = c;
            Ok(Some(()))
        })?;
        Ok(done.is_some())
    }

    pub fn delete_category(&self, id: i64) -> Result<bool> {
        let done = self
            .mutate(|doc| Ok(remove_by_id(&mut doc.categories, id, |c| c.id).then_some(())))?;
        Ok(done.is_some())
    }

    // === debts ===

    pub fn debts(&self) -> Result<Vec<Debt>> {
        Ok(self.document()?.debts)
    }

    pub fn add_debt(&self, new: NewDebt) -> Result<Debt> {
        let added = self.mutate(|doc| {
            let mut d = Debt {
                id: self.next_id(doc),
                name: new.name.trim().to_string(),
                r#type: new.r#type,
                total_amount: new.total_amount,
                paid_amount: new.paid_amount,
                due_date: new.due_date,
                installment_amount: new.installment_amount,
                notes: clean_notes(new.notes),
                created_at: Utc::now(),
                status: Default::default(),
            };
            validate_debt(&d)?;
            refresh_debt(&mut d, today());
            doc.debts.push(d.clone());
            Ok(Some(d))
        })?;
        added.ok_or_else(|| invalid("debt was not added"))
    }

    pub fn update_debt(&self, id: i64, patch: DebtPatch) -> Result<bool> {
        let done = self.mutate(|doc| {
            let Some(slot) = doc.debts.iter_mut().find(|d| d.id == id) else {
                return Ok(None);
            };
            let mut d = slot.clone();
            if let Some(v) = patch.name {
                d.name = v.trim().to_string();
            }
            if let Some(v) = patch.r#type {
                d.r#type = v;
            }
            if let Some(v) = patch.total_amount {
                d.total_amount = v;
            }
            if let Some(v) = patch.paid_amount {
                d.paid_amount = v;
            }
            if let Some(v) = patch.due_date {
                d.due_date = v;
            }
            if let Some(v) = patch.installment_amount {
                d.installment_amount = v;
            }
            if let Some(v) = patch.notes {
                d.notes = clean_notes(v);
            }
            validate_debt(&d)?;
            refresh_debt(&mut d, today());
            *slot = d;
            Ok(Some(()))
        })?;
        Ok(done.is_some())
    }

    pub fn delete_debt(&self, id: i64) -> Result<bool> {
        let done =
            self.mutate(|doc| Ok(remove_by_id(&mut doc.debts, id, |d| d.id).then_some(())))?;
        Ok(done.is_some())
    }

    /// Pays `amount` towards a debt and books it as an expense in the same
    /// write. `Ok(None)` if the debt does not exist.
    pub fn record_debt_payment(&self, id: i64, amount: Decimal) -> Result<Option<Debt>> {
        if amount <= Decimal::ZERO {
            return Err(invalid(format!("Payment must be positive (got {})", amount)));
        }
        self.mutate(|doc| {
            let tx_id = self.next_id(doc);
            let has_other = doc.category(OTHER_EXPENSE_CATEGORY_ID).is_some();
            let Some(slot) = doc.debts.iter_mut().find(|d| d.id == id) else {
                return Ok(None);
            };
            if amount > slot.remaining() {
                return Err(invalid(format!(
                    "Payment {} exceeds the remaining balance {}",
                    amount,
                    slot.remaining()
                )));
            }
            let mut d = slot.clone();
            d.paid_amount += amount;
            validate_debt(&d)?;
            refresh_debt(&mut d, today());
            *slot = d.clone();
            doc.transactions.push(Transaction {
                id: tx_id,
                r#type: EntryType::Expense,
                amount,
                description: format!("Payment: {}", d.name),
                category_id: has_other.then_some(OTHER_EXPENSE_CATEGORY_ID),
                date: today(),
                notes: Some(format!("Payment towards {}", d.name)),
                created_at: Utc::now(),
            });
            Ok(Some(d))
        })
    }

    // === goals ===

    pub fn goals(&self) -> Result<Vec<Goal>> {
        Ok(self.document()?.goals)
    }

    pub fn add_goal(&self, new: NewGoal) -> Result<Goal> {
        let added = self.mutate(|doc| {
            let mut g = Goal {
                id: self.next_id(doc),
                name: new.name.trim().to_string(),
                target_amount: new.target_amount,
                saved_amount: new.saved_amount,
                deadline: new.deadline,
                priority: new.priority,
                notes: clean_notes(new.notes),
                created_at: Utc::now(),
                progress: Decimal::ZERO,
            };
            validate_goal(&g)?;
            refresh_goal(&mut g);
            doc.goals.push(g.clone());
            Ok(Some(g))
        })?;
        added.ok_or_else(|| invalid("goal was not added"))
    }

    pub fn update_goal(&self, id: i64, patch: GoalPatch) -> Result<bool> {
        let done = self.mutate(|doc| {
            let Some(slot) = doc.goals.iter_mut().find(|g| g.id == id) else {
                return Ok(None);
            };
            let mut g = slot.clone();
            if let Some(v) = patch.name {
                g.name = v.trim().to_string();
            }
            if let Some(v) = patch.target_amount {
                g.target_amount = v;
            }
            if let Some(v) = patch.saved_amount {
                g.saved_amount = v;
            }
            if let Some(v) = patch.deadline {
                g.deadline = v;
            }
            if let Some(v) = patch.priority {
                g.priority = v;
            }
            if let Some(v) = patch.notes {
                g.notes = clean_notes(v);
            }
            validate_goal(&g)?;
            refresh_goal(&mut g);
            *slot = g;
            Ok(Some(()))
        })?;
        Ok(done.is_some())
    }

    pub fn delete_goal(&self, id: i64) -> Result<bool> {
        let done =
            self.mutate(|doc| Ok(remove_by_id(&mut doc.goals, id, |g| g.id).then_some(())))?;
        Ok(done.is_some())
    }

    /// Adds savings to a goal and books them as an expense in the same write.
    pub fn contribute_to_goal(&self, id: i64, amount: Decimal) -> Result<Option<Goal>> {
        if amount <= Decimal::ZERO {
            return Err(invalid(format!(
                "Contribution must be positive (got {})",
                amount
            )));
        }
        self.mutate(|doc| {
            let tx_id = self.next_id(doc);
            let has_other = doc.category(OTHER_EXPENSE_CATEGORY_ID).is_some();
            let Some(slot) = doc.goals.iter_mut().find(|g| g.id == id) else {
                return Ok(None);
            };
            let mut g = slot.clone();
            g.saved_amount += amount;
            validate_goal(&g)?;
            refresh_goal(&mut g);
            *slot = g.clone();
            doc.transactions.push(Transaction {
                id: tx_id,
                r#type: EntryType::Expense,
                amount,
                description: format!("Savings: {}", g.name),
                category_id: has_other.then_some(OTHER_EXPENSE_CATEGORY_ID),
                date: today(),
                notes: Some(format!("Added to goal {}", g.name)),
                created_at: Utc::now(),
            });
            Ok(Some(g))
        })
    }

    // === investments ===

    pub fn investments(&self) -> Result<Vec<Investment>> {
        Ok(self.document()?.investments)
    }

    pub fn add_investment(&self, new: NewInvestment) -> Result<Investment> {
        let added = self.mutate(|doc| {
            let i = Investment {
                id: self.next_id(doc),
                name: new.name.trim().to_string(),
                r#type: new.r#type,
                amount: new.amount,
                date: new.date,
                expected_return: new.expected_return.unwrap_or(Decimal::new(5, 0)),
                notes: clean_notes(new.notes),
                created_at: Utc::now(),
            };
            validate_investment(&i)?;
            doc.investments.push(i.clone());
            Ok(Some(i))
        })?;
        added.ok_or_else(|| invalid("investment was not added"))
    }

    pub fn update_investment(&self, id: i64, patch: InvestmentPatch) -> Result<bool> {
        let done = self.mutate(|doc| {
            let Some(slot) = doc.investments.iter_mut().find(|i| i.id == id) else {
                return Ok(None);
            };
            let mut i = slot.clone();
            if let Some(v) = patch.name {
                i.name = v.trim().to_string();
            }
            if let Some(v) = patch.r#type {
                i.r#type = v;
            }
            if let Some(v) = patch.amount {
                i.amount = v;
            }
            if let Some(v) = patch.date {
                i.date = v;
            }
            if let Some(v) = patch.expected_return {
                i.expected_return = v;
            }
            if let Some(v) = patch.notes {
                i.notes = clean_notes(v);
            }
            validate_investment(&i)?;
            *slot = i;
            Ok(Some(()))
        })?;
        Ok(done.is_some())
    }

    pub fn delete_investment(&self, id: i64) -> Result<bool> {
        let done = self
            .mutate(|doc| Ok(remove_by_id(&mut doc.investments, id, |i| i.id).then_some(())))?;
        Ok(done.is_some())
    }

    // === reminders ===

    pub fn reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.document()?.reminders)
    }

    /// Stores free-form reminder fields; an `id` among them is replaced.
    pub fn add_reminder(&self, mut fields: Map<String, Value>) -> Result<Reminder> {
        fields.remove("id");
        let added = self.mutate(|doc| {
            let r = Reminder {
                id: self.next_id(doc),
                fields,
            };
            doc.reminders.push(r.clone());
            Ok(Some(r))
        })?;
        added.ok_or_else(|| invalid("reminder was not added"))
    }

    pub fn delete_reminder(&self, id: i64) -> Result<bool> {
        let done = self
            .mutate(|doc| Ok(remove_by_id(&mut doc.reminders, id, |r| r.id).then_some(())))?;
        Ok(done.is_some())
    }

    // === settings ===

    pub fn settings(&self) -> Result<Settings> {
        Ok(self.document()?.settings)
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        let updated = self.mutate(|doc| {
            if let Some(v) = patch.currency {
                require_name(&v, "Currency")?;
                doc.settings.currency = v.trim().to_string();
            }
            if let Some(v) = patch.language {
                require_name(&v, "Language")?;
                doc.settings.language = v.trim().to_string();
            }
            if let Some(v) = patch.theme {
                require_name(&v, "Theme")?;
                doc.settings.theme = v.trim().to_string();
            }
            Ok(Some(doc.settings.clone()))
        })?;
        updated.ok_or_else(|| invalid("settings were not updated"))
    }

    // === import / export ===

    pub fn export_json(&self) -> Result<String> {
        let doc = self.document()?;
        serde_json::to_string_pretty(&doc).map_err(|e| LedgerError::CorruptDocument(e.to_string()))
    }

    pub fn export_file_name(date: NaiveDate) -> String {
        format!("tallybook_backup_{}.json", date.format("%Y-%m-%d"))
    }

    /// Replaces the document with an exported one. Anything that is not a
    /// JSON object with a `version` field is rejected and nothing is written.
    pub fn import_json(&self, text: &str) -> Result<Document> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            LedgerError::InvalidImport(format!("Could not read the file: {}", e))
        })?;
        if value.get("version").is_none() {
            return Err(LedgerError::InvalidImport(
                "Invalid file: no 'version' field. Please check that this is a tallybook backup."
                    .into(),
            ));
        }
        let mut doc: Document = serde_json::from_value(value).map_err(|e| {
            LedgerError::InvalidImport(format!("Invalid file: {}", e))
        })?;
        recompute_derived(&mut doc, today());
        self.save_document(&mut doc)?;
        tracing::info!(
            transactions = doc.transactions.len(),
            "imported document version {}",
            doc.version
        );
        Ok(doc)
    }

    // === sync support ===

    /// Every namespaced key with its parsed JSON value.
    pub fn namespaced_snapshot(&self) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for (key, raw) in self.store.entries_matching(NAMESPACE)? {
            let value = match serde_json::from_str(&raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(key = %key, "value is not JSON, sending as string: {}", e);
                    Value::String(raw)
                }
            };
            out.insert(key, value);
        }
        Ok(out)
    }

    /// Privileged write path for pulled data. Each namespaced key is taken
    /// from `data` when [`remote_wins`] says so; the document key is parsed
    /// and has its derived fields recomputed before it is written. Remote
    /// `_timestamp`s are kept as-is so later comparisons stay monotonic.
    pub fn apply_remote_snapshot(&self, data: &Map<String, Value>) -> Result<MergeOutcome> {
        let mut outcome = MergeOutcome::default();
        for (key, remote) in data {
            if !in_namespace(key) {
                continue;
            }
            let local = self
                .store
                .get(key)?
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
            if !remote_wins(local.as_ref(), remote) {
                continue;
            }
            let text = if key == DATA_KEY {
                match serde_json::from_value::<Document>(remote.clone()) {
                    Ok(mut doc) => {
                        recompute_derived(&mut doc, today());
                        serde_json::to_string(&doc)
                            .map_err(|e| LedgerError::CorruptDocument(e.to_string()))?
                    }
                    Err(e) => {
                        tracing::warn!("remote document rejected: {}", e);
                        outcome.skipped.push(key.clone());
                        continue;
                    }
                }
            } else {
                remote.to_string()
            };
            self.store
                .set_with_origin(key, &text, ChangeOrigin::Remote)?;
            outcome.updated.push(key.clone());
        }
        if outcome.reload_required() {
            tracing::info!(keys = ?outcome.updated, "merged remote snapshot");
        }
        Ok(outcome)
    }
}
