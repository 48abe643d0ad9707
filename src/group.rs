// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Expense group.
//!
//! A group owns the expenses and recorded settlements of one set of people.
//! All reads and writes go through a single lock, so balances and suggested
//! settlements are always computed from one consistent snapshot.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use settle_up::{EntryId, Expense, Group, GroupId, SettlementConfig};
//!
//! let group = Group::new(GroupId(1));
//! group
//!     .record_expense(EntryId(1), Expense::equal("A", dec!(30), ["A", "B", "C"]), dec!(0.01))
//!     .unwrap();
//!
//! let payments = group.suggest_settlements(&SettlementConfig::default()).unwrap();
//! assert_eq!(payments.len(), 2);
//! ```

use crate::balance::{Balances, DebtSummary, apply_settlements, calculate_balances, debt_summary};
use crate::base::{EntryId, GroupId};
use crate::config::SettlementConfig;
use crate::expense::Expense;
use crate::optimizer::min_cash_flow;
use crate::settlement::Payment;
use crate::SettlementError;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashSet;

#[derive(Debug)]
struct GroupData {
    group_id: GroupId,
    expenses: Vec<Expense>,
    settlements: Vec<Payment>,
    /// Every entry ID recorded so far, expenses and settlements alike.
    entries: HashSet<EntryId>,
}

impl GroupData {
    fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            expenses: Vec::new(),
            settlements: Vec::new(),
            entries: HashSet::new(),
        }
    }

    fn claim_entry(&mut self, entry_id: EntryId) -> Result<(), SettlementError> {
        if !self.entries.insert(entry_id) {
            return Err(SettlementError::DuplicateEntry(entry_id));
        }
        Ok(())
    }

    fn add_expense(
        &mut self,
        entry_id: EntryId,
        expense: Expense,
        tolerance: Decimal,
    ) -> Result<(), SettlementError> {
        // Reject bad records up front so later balance queries cannot fail on them.
        expense.validate(tolerance)?;
        self.claim_entry(entry_id)?;
        self.expenses.push(expense);
        Ok(())
    }

    fn add_settlement(&mut self, entry_id: EntryId, payment: Payment) -> Result<(), SettlementError> {
        payment.validate()?;
        self.claim_entry(entry_id)?;
        self.settlements.push(payment);
        Ok(())
    }

    fn balances(&self, tolerance: Decimal) -> Result<Balances, SettlementError> {
        let mut balances = calculate_balances(&self.expenses, tolerance)?;
        apply_settlements(&mut balances, &self.settlements);
        Ok(balances)
    }
}

/// Expense group with its own lock.
#[derive(Debug)]
pub struct Group {
    inner: Mutex<GroupData>,
}

impl Group {
    pub fn new(group_id: GroupId) -> Self {
        Self {
            inner: Mutex::new(GroupData::new(group_id)),
        }
    }

    pub fn id(&self) -> GroupId {
        self.inner.lock().group_id
    }

    pub fn expense_count(&self) -> usize {
        self.inner.lock().expenses.len()
    }

    pub fn settlement_count(&self) -> usize {
        self.inner.lock().settlements.len()
    }

    /// Records an expense after validating it.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::InvalidTolerance`] - `tolerance` is negative.
    /// - [`SettlementError::InvalidExpense`] - The expense failed validation.
    /// - [`SettlementError::DuplicateEntry`] - `entry_id` is already taken.
    pub fn record_expense(
        &self,
        entry_id: EntryId,
        expense: Expense,
        tolerance: Decimal,
    ) -> Result<(), SettlementError> {
        self.inner.lock().add_expense(entry_id, expense, tolerance)
    }

    /// Records a payment that has actually been made.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::InvalidAmount`] - Amount is zero or negative.
    /// - [`SettlementError::SelfPayment`] - Payer and payee are the same.
    /// - [`SettlementError::DuplicateEntry`] - `entry_id` is already taken.
    pub fn record_settlement(&self, entry_id: EntryId, payment: Payment) -> Result<(), SettlementError> {
        self.inner.lock().add_settlement(entry_id, payment)
    }

    /// Net balances after expenses and recorded settlements.
    pub fn balances(&self, tolerance: Decimal) -> Result<Balances, SettlementError> {
        self.inner.lock().balances(tolerance)
    }

    /// Payments that would settle the group right now.
    ///
    /// The lock is held across the balance calculation and the optimizer.
    pub fn suggest_settlements(
        &self,
        config: &SettlementConfig,
    ) -> Result<Vec<Payment>, SettlementError> {
        let data = self.inner.lock();
        let balances = data.balances(config.tolerance)?;
        min_cash_flow(&balances, config)
    }

    pub fn debt_summary(&self, tolerance: Decimal) -> Result<Vec<DebtSummary>, SettlementError> {
        let data = self.inner.lock();
        debt_summary(&data.expenses, &data.settlements, tolerance)
    }
}
