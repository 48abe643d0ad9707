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

//! In-memory expense ledger.
//!
//! The [`Ledger`] keeps every expense [`Group`] and routes entries to them.
//! It is an ordinary value: construct one and share it by reference or
//! through an `Arc`.
//!
//! # Entries
//!
//! - **Expenses**: Validated and stored, creating the group on first use.
//! - **Settlements**: Payments already made; the group must exist.
//!
//! # Thread Safety
//!
//! Groups live in a [`DashMap`] and each group has its own lock, so
//! different groups are updated in parallel while every computation for a
//! single group sees a consistent snapshot.

use crate::balance::{Balances, DebtSummary};
use crate::base::{EntryId, GroupId};
use crate::config::SettlementConfig;
use crate::expense::Expense;
use crate::group::Group;
use crate::settlement::Payment;
use crate::SettlementError;
use dashmap::DashMap;

/// Expense ledger managing many groups.
///
/// # Invariants
///
/// - Entry IDs are unique within a group across expenses and settlements.
/// - Only valid expenses are stored, so balance queries cannot fail on them.
/// - Settlements are positive and never from a user to themselves.
pub struct Ledger {
    groups: DashMap<GroupId, Group>,
    config: SettlementConfig,
}

impl Ledger {
    /// Creates an empty ledger with the default configuration.
    pub fn new() -> Self {
        Ledger {
            groups: DashMap::new(),
            config: SettlementConfig::default(),
        }
    }

    /// Creates an empty ledger with a custom configuration.
    ///
    /// # Errors
    ///
    /// [`SettlementError::InvalidTolerance`] if the tolerance is negative.
    pub fn with_config(config: SettlementConfig) -> Result<Self, SettlementError> {
        config.validate()?;
        Ok(Ledger {
            groups: DashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Records an expense, creating the group if needed.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::InvalidExpense`] - The expense failed validation;
    ///   no group is created for it.
    /// - [`SettlementError::DuplicateEntry`] - `entry_id` is taken in this group.
    pub fn record_expense(
        &self,
        group_id: GroupId,
        entry_id: EntryId,
        expense: Expense,
    ) -> Result<(), SettlementError> {
        expense.validate(self.config.tolerance)?;

        let group = self
            .groups
            .entry(group_id)
            .or_insert_with(|| Group::new(group_id));
        group.record_expense(entry_id, expense, self.config.tolerance)?;

        tracing::debug!(%group_id, %entry_id, "expense recorded");
        Ok(())
    }

    /// Records a settlement payment in an existing group.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::GroupNotFound`] - No expense was recorded for the group.
    /// - [`SettlementError::InvalidAmount`] - Amount is zero or negative.
    /// - [`SettlementError::SelfPayment`] - Payer and payee are the same.
    /// - [`SettlementError::DuplicateEntry`] - `entry_id` is taken in this group.
    pub fn record_settlement(
        &self,
        group_id: GroupId,
        entry_id: EntryId,
        payment: Payment,
    ) -> Result<(), SettlementError> {
        self.group(group_id)?.record_settlement(entry_id, payment)?;
        tracing::debug!(%group_id, %entry_id, "settlement recorded");
        Ok(())
    }

    /// Net balances of a group.
    pub fn balances(&self, group_id: GroupId) -> Result<Balances, SettlementError> {
        self.group(group_id)?.balances(self.config.tolerance)
    }

    /// Payments that would settle a group.
    pub fn suggest_settlements(&self, group_id: GroupId) -> Result<Vec<Payment>, SettlementError> {
        self.group(group_id)?.suggest_settlements(&self.config)
    }

    pub fn debt_summary(&self, group_id: GroupId) -> Result<Vec<DebtSummary>, SettlementError> {
        self.group(group_id)?.debt_summary(self.config.tolerance)
    }

    /// IDs of all groups, sorted.
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    /// Retrieves a group by ID.
    ///
    /// Returns `None` if nothing was recorded for the group.
    pub fn get_group(
        &self,
        group_id: &GroupId,
    ) -> Option<dashmap::mapref::one::Ref<'_, GroupId, Group>> {
        self.groups.get(group_id)
    }

    fn group(
        &self,
        group_id: GroupId,
    ) -> Result<dashmap::mapref::one::Ref<'_, GroupId, Group>, SettlementError> {
        self.groups
            .get(&group_id)
            .ok_or(SettlementError::GroupNotFound(group_id))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
