// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure rollups over a [`Document`] snapshot. Nothing here touches storage;
//! callers pass `today` explicitly.

use crate::models::{
    Debt, DebtStatus, DebtType, Document, EntryType, Investment, Transaction,
};
use crate::utils::month_end;
use anyhow::{Result, anyhow};
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Debts due within this many days count as due now.
pub const DUE_WINDOW_DAYS: i64 = 7;

pub fn debt_status(paid: Decimal, total: Decimal, due: NaiveDate, today: NaiveDate) -> DebtStatus {
    if paid >= total {
        DebtStatus::Paid
    } else if due < today {
        DebtStatus::Overdue
    } else {
        DebtStatus::Pending
    }
}

/// Saved share of the target in percent, unclamped, to two decimals.
/// A zero target yields zero.
pub fn goal_progress(saved: Decimal, target: Decimal) -> Decimal {
    if target.is_zero() {
        return Decimal::ZERO;
    }
    (saved / target * Decimal::ONE_HUNDRED).round_dp(2)
}

pub fn clamped_progress(progress: Decimal) -> Decimal {
    progress.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

fn same_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
    pub month_income: Decimal,
    pub month_expense: Decimal,
    pub due_installments: Decimal,
    pub due_debts: Decimal,
}

pub fn financial_summary(doc: &Document, today: NaiveDate) -> FinancialSummary {
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut month_income = Decimal::ZERO;
    let mut month_expense = Decimal::ZERO;

    for t in &doc.transactions {
        let this_month = same_month(t.date, today);
        match t.r#type {
            EntryType::Income => {
                total_income += t.amount;
                if this_month {
                    month_income += t.amount;
                }
            }
            EntryType::Expense => {
                total_expense += t.amount;
                if this_month {
                    month_expense += t.amount;
                }
            }
        }
    }

    let horizon = today + Duration::days(DUE_WINDOW_DAYS);
    let mut due_installments = Decimal::ZERO;
    let mut due_debts = Decimal::ZERO;
    for d in &doc.debts {
        let remaining = d.remaining();
        if remaining > Decimal::ZERO && d.due_date <= horizon {
            match d.r#type {
                DebtType::Installment => due_installments += remaining,
                DebtType::Debt => due_debts += remaining,
            }
        }
    }

    FinancialSummary {
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
        month_income,
        month_expense,
        due_installments,
        due_debts,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetHealth {
    Good,
    Warning,
    Over,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category_id: i64,
    pub name: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    /// Zero when the category has no budget.
    pub percent_used: Decimal,
    pub health: BudgetHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub total_budget: Decimal,
    pub actual_spending: Decimal,
    pub remaining_budget: Decimal,
    pub category_spending: Vec<CategorySpending>,
}

impl BudgetSummary {
    pub fn for_category(&self, category_id: i64) -> Option<&CategorySpending> {
        self.category_spending
            .iter()
            .find(|c| c.category_id == category_id)
    }
}

fn budget_health(percent: Decimal) -> BudgetHealth {
    if percent > Decimal::ONE_HUNDRED {
        BudgetHealth::Over
    } else if percent > Decimal::new(80, 0) {
        BudgetHealth::Warning
    } else {
        BudgetHealth::Good
    }
}

/// This month's spending per expense category against its budget.
pub fn budget_summary(doc: &Document, today: NaiveDate) -> BudgetSummary {
    let mut spent_by_id: HashMap<i64, Decimal> = HashMap::new();
    for t in &doc.transactions {
        if t.r#type == EntryType::Expense && same_month(t.date, today) {
            if let Some(cid) = t.category_id {
                *spent_by_id.entry(cid).or_insert(Decimal::ZERO) += t.amount;
            }
        }
    }

    let mut total_budget = Decimal::ZERO;
    let mut actual_spending = Decimal::ZERO;
    let mut category_spending = Vec::new();
    for c in doc
        .categories
        .iter()
        .filter(|c| c.r#type == EntryType::Expense)
    {
        let spent = spent_by_id.get(&c.id).copied().unwrap_or(Decimal::ZERO);
        total_budget += c.budget;
        actual_spending += spent;
        let percent_used = if c.budget > Decimal::ZERO {
            (spent / c.budget * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };
        category_spending.push(CategorySpending {
            category_id: c.id,
            name: c.name.clone(),
            budget: c.budget,
            spent,
            remaining: c.budget - spent,
            percent_used,
            health: budget_health(percent_used),
        });
    }

    BudgetSummary {
        total_budget,
        actual_spending,
        remaining_budget: total_budget - actual_spending,
        category_spending,
    }
}

/// Reporting window, resolved against `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Month,
    LastMonth,
    Year,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl FromStr for ReportPeriod {
    type Err = anyhow::Error;

    /// `month`, `last-month`, `year` or `YYYY-MM-DD..YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "month" => Ok(ReportPeriod::Month),
            "last-month" => Ok(ReportPeriod::LastMonth),
            "year" => Ok(ReportPeriod::Year),
            other => {
                let (a, b) = other
                    .split_once("..")
                    .ok_or_else(|| anyhow!("Invalid period '{}'", other))?;
                let start = crate::utils::parse_date(a.trim())?;
                let end = crate::utils::parse_date(b.trim())?;
                if end < start {
                    return Err(anyhow!("Period end {} is before start {}", end, start));
                }
                Ok(ReportPeriod::Custom { start, end })
            }
        }
    }
}

impl ReportPeriod {
    pub fn bounds(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let first_of = |y: i32, m: u32| {
            NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(|| anyhow!("Invalid month {}-{}", y, m))
        };
        match *self {
            ReportPeriod::Month => {
                let month = format!("{:04}-{:02}", today.year(), today.month());
                Ok((first_of(today.year(), today.month())?, month_end(&month)?))
            }
            ReportPeriod::LastMonth => {
                let (y, m) = if today.month() == 1 {
                    (today.year() - 1, 12)
                } else {
                    (today.year(), today.month() - 1)
                };
                Ok((first_of(y, m)?, month_end(&format!("{:04}-{:02}", y, m))?))
            }
            ReportPeriod::Year => Ok((
                first_of(today.year(), 1)?,
                NaiveDate::from_ymd_opt(today.year(), 12, 31)
                    .ok_or_else(|| anyhow!("Invalid year {}", today.year()))?,
            )),
            ReportPeriod::Custom { start, end } => Ok((start, end)),
        }
    }
}

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
    pub transaction_count: usize,
    pub income_by_category: BTreeMap<String, Decimal>,
    pub expense_by_category: BTreeMap<String, Decimal>,
}

pub fn period_report(doc: &Document, start: NaiveDate, end: NaiveDate) -> PeriodReport {
    let in_range: Vec<&Transaction> = doc
        .transactions
        .iter()
        .filter(|t| t.date >= start && t.date <= end)
        .collect();

    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut income_by_category = BTreeMap::new();
    let mut expense_by_category = BTreeMap::new();
    for t in &in_range {
        let name = t
            .category_id
            .and_then(|id| doc.category(id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let (total, by_cat) = match t.r#type {
            EntryType::Income => (&mut total_income, &mut income_by_category),
            EntryType::Expense => (&mut total_expense, &mut expense_by_category),
        };
        *total += t.amount;
        *by_cat.entry(name).or_insert(Decimal::ZERO) += t.amount;
    }

    PeriodReport {
        start,
        end,
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
        transaction_count: in_range.len(),
        income_by_category,
        expense_by_category,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPayment {
    pub debt_id: i64,
    pub name: String,
    pub due_date: NaiveDate,
    pub days_until_due: i64,
    pub remaining: Decimal,
    pub installment_amount: Option<Decimal>,
}

/// Unpaid debts falling due between today and the end of the due window.
pub fn upcoming_payments(doc: &Document, today: NaiveDate) -> Vec<UpcomingPayment> {
    let horizon = today + Duration::days(DUE_WINDOW_DAYS);
    let mut out: Vec<UpcomingPayment> = doc
        .debts
        .iter()
        .filter(|d| d.remaining() > Decimal::ZERO && d.due_date >= today && d.due_date <= horizon)
        .map(|d: &Debt| UpcomingPayment {
            debt_id: d.id,
            name: d.name.clone(),
            due_date: d.due_date,
            days_until_due: (d.due_date - today).num_days(),
            remaining: d.remaining(),
            installment_amount: d.installment_amount,
        })
        .collect();
    out.sort_by_key(|p| p.due_date);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentProjection {
    pub investment_id: i64,
    pub expected_value: Decimal,
    pub expected_profit: Decimal,
}

pub fn investment_projection(inv: &Investment) -> InvestmentProjection {
    let expected_value =
        inv.amount * (Decimal::ONE + inv.expected_return / Decimal::ONE_HUNDRED);
    InvestmentProjection {
        investment_id: inv.id,
        expected_value,
        expected_profit: expected_value - inv.amount,
    }
}
