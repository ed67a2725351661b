// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const DOCUMENT_VERSION: &str = "1.0";

/// Id of the seeded "other expenses" category; debt payments and goal
/// contributions are booked against it.
pub const OTHER_EXPENSE_CATEGORY_ID: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub r#type: EntryType,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub r#type: EntryType,
    #[serde(default)]
    pub budget: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtType {
    Debt,
    Installment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    Paid,
    #[default]
    Pending,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: i64,
    pub name: String,
    pub r#type: DebtType,
    pub total_amount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Recomputed on every write; never trusted from input.
    #[serde(default)]
    pub status: DebtStatus,
}

impl Debt {
    pub fn remaining(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub saved_amount: Decimal,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Percentage saved, unclamped. Recomputed on every write.
    #[serde(default)]
    pub progress: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvestmentType {
    Stocks,
    RealEstate,
    BankDeposit,
    Gold,
    Other,
}

fn default_expected_return() -> Decimal {
    Decimal::new(5, 0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: i64,
    pub name: String,
    pub r#type: InvestmentType,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default = "default_expected_return")]
    pub expected_return: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Reminders are free-form; everything but the id is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub currency: String,
    pub language: String,
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "EGP".into(),
            language: "ar".into(),
            theme: "light".into(),
        }
    }
}

/// The whole persisted state of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub investments: Vec<Investment>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub settings: Settings,
    /// Milliseconds since the epoch of the last local persist; compared by
    /// the sync merge.
    #[serde(rename = "_timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Document {
    /// First-run document with the default categories.
    pub fn seed() -> Self {
        let seeded = [
            "Salary",
            "Freelance",
            "Investments",
            "Gifts",
            "Other income",
            "Housing",
            "Transport",
            "Food",
            "Shopping",
            "Entertainment",
            "Health",
            "Education",
            "Communications",
            "Other expenses",
        ];
        let categories = seeded
            .iter()
            .enumerate()
            .map(|(i, name)| Category {
                id: i as i64 + 1,
                name: (*name).to_string(),
                r#type: if i < 5 {
                    EntryType::Income
                } else {
                    EntryType::Expense
                },
                budget: Decimal::ZERO,
            })
            .collect();
        Self {
            version: DOCUMENT_VERSION.into(),
            transactions: Vec::new(),
            categories,
            debts: Vec::new(),
            goals: Vec::new(),
            investments: Vec::new(),
            reminders: Vec::new(),
            settings: Settings::default(),
            timestamp: None,
        }
    }

    /// Largest id used by any entity.
    pub fn max_id(&self) -> i64 {
        let ids = self
            .transactions
            .iter()
            .map(|t| t.id)
            .chain(self.categories.iter().map(|c| c.id))
            .chain(self.debts.iter().map(|d| d.id))
            .chain(self.goals.iter().map(|g| g.id))
            .chain(self.investments.iter().map(|i| i.id))
            .chain(self.reminders.iter().map(|r| r.id));
        ids.max().unwrap_or(0)
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}

// Inputs for creating records. Ids, timestamps and derived fields are assigned
// by the ledger.

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub r#type: EntryType,
    pub amount: Decimal,
    pub description: String,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub r#type: EntryType,
    pub budget: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDebt {
    pub name: String,
    pub r#type: DebtType,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: NaiveDate,
    pub installment_amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Decimal,
    pub saved_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInvestment {
    pub name: String,
    pub r#type: InvestmentType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub expected_return: Option<Decimal>,
    pub notes: Option<String>,
}

// Partial updates: `None` leaves the stored field alone.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub r#type: Option<EntryType>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category_id: Option<Option<i64>>,
    pub date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub r#type: Option<EntryType>,
    pub budget: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtPatch {
    pub name: Option<String>,
    pub r#type: Option<DebtType>,
    pub total_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub installment_amount: Option<Option<Decimal>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub target_amount: Option<Decimal>,
    pub saved_amount: Option<Decimal>,
    pub deadline: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvestmentPatch {
    pub name: Option<String>,
    pub r#type: Option<InvestmentType>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub expected_return: Option<Decimal>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub currency: Option<String>,
    pub language: Option<String>,
    pub theme: Option<String>,
}

macro_rules! str_enum {
    ($ty:ty { $($s:literal => $v:path),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($s => Ok($v),)+
                    other => Err(format!(
                        "Invalid value '{}', expected one of: {}",
                        other,
                        [$($s),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let s = match self {
                    $($v => $s,)+
                };
                f.write_str(s)
            }
        }
    };
}

str_enum!(EntryType { "income" => EntryType::Income, "expense" => EntryType::Expense });
str_enum!(DebtType { "debt" => DebtType::Debt, "installment" => DebtType::Installment });
str_enum!(DebtStatus {
    "paid" => DebtStatus::Paid,
    "pending" => DebtStatus::Pending,
    "overdue" => DebtStatus::Overdue,
});
str_enum!(Priority {
    "low" => Priority::Low,
    "medium" => Priority::Medium,
    "high" => Priority::High,
});
str_enum!(InvestmentType {
    "stocks" => InvestmentType::Stocks,
    "real-estate" => InvestmentType::RealEstate,
    "bank-deposit" => InvestmentType::BankDeposit,
    "gold" => InvestmentType::Gold,
    "other" => InvestmentType::Other,
});
