// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod categories;
pub mod debts;
pub mod doctor;
pub mod exporter;
pub mod goals;
pub mod importer;
pub mod investments;
pub mod reminders;
pub mod reports;
pub mod settings;
pub mod sync;
pub mod transactions;
