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

//! Net balance calculation.
//!
//! A user's net balance is what they paid minus what they owe:
//! - Positive: the user is a creditor and is owed money.
//! - Negative: the user is a debtor and owes money.
//!
//! Balances of a consistent group sum to zero, up to the few cents lost when
//! shares are rounded individually.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use settle_up::{Expense, UserId, calculate_balances};
//!
//! let expenses = vec![
//!     Expense::equal("A", dec!(120), ["A", "B", "C"]),
//!     Expense::equal("B", dec!(60), ["B", "C"]),
//! ];
//! let balances = calculate_balances(&expenses, dec!(0.01)).unwrap();
//! assert_eq!(balances[&UserId::from("A")], dec!(80.00));
//! assert_eq!(balances[&UserId::from("B")], dec!(-10.00));
//! assert_eq!(balances[&UserId::from("C")], dec!(-70.00));
//! ```

use crate::base::{UserId, round_money};
use crate::config::validate_tolerance;
use crate::expense::Expense;
use crate::settlement::Payment;
use crate::SettlementError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Net balance per user, ordered by user ID.
pub type Balances = BTreeMap<UserId, Decimal>;

/// Derives each user's net balance from a list of expenses.
///
/// For every expense the payer is credited the full amount, each participant
/// is debited their rounded share, and the payer's balance is rounded. All
/// balances are rounded once more at the end.
///
/// An equal-split expense without participants credits the payer and debits
/// nobody, which leaves the map unbalanced.
///
/// # Errors
///
/// - [`SettlementError::InvalidExpense`] - An expense failed validation. The
///   offending record is rejected before it touches any balance.
/// - [`SettlementError::InvalidTolerance`] - `tolerance` is negative.
pub fn calculate_balances(
    expenses: &[Expense],
    tolerance: Decimal,
) -> Result<Balances, SettlementError> {
    validate_tolerance(tolerance)?;

    let mut balances = Balances::new();

    for expense in expenses {
        let shares = expense.shares(tolerance)?;

        if expense.participants.is_empty() {
            tracing::warn!(
                payer = %expense.payer,
                amount = %expense.amount,
                "expense has no participants; payer credited without matching shares"
            );
        }

        *balances.entry(expense.payer.clone()).or_default() += expense.amount;
        for (participant, share) in shares {
            *balances.entry(participant).or_default() -= share;
        }

        if let Some(balance) = balances.get_mut(&expense.payer) {
            *balance = round_money(*balance);
        }
    }

    for balance in balances.values_mut() {
        *balance = round_money(*balance);
    }

    tracing::debug!(
        expenses = expenses.len(),
        users = balances.len(),
        "calculated balances"
    );

    Ok(balances)
}

/// Adjusts balances by payments that have already been made.
///
/// Paying reduces the payer's debt (`from` goes up) and reduces what the
/// recipient is still owed (`to` goes down). Users not yet in the map are
/// added.
pub fn apply_settlements(balances: &mut Balances, payments: &[Payment]) {
    for payment in payments {
        let from = balances.entry(payment.from.clone()).or_default();
        *from = round_money(*from + payment.amount);

        let to = balances.entry(payment.to.clone()).or_default();
        *to = round_money(*to - payment.amount);
    }
}

/// Per-user breakdown of a group's debts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtSummary {
    pub user: UserId,
    /// Amount advanced for other participants on expenses this user paid.
    pub lent: Decimal,
    /// This user's shares of expenses paid by others.
    pub borrowed: Decimal,
    /// Recorded settlements paid by this user.
    pub paid: Decimal,
    /// Recorded settlements received by this user.
    pub received: Decimal,
    /// `(lent - received) - (borrowed - paid)`.
    pub net: Decimal,
}

impl DebtSummary {
    fn new(user: UserId) -> Self {
        Self {
            user,
            lent: Decimal::ZERO,
            borrowed: Decimal::ZERO,
            paid: Decimal::ZERO,
            received: Decimal::ZERO,
            net: Decimal::ZERO,
        }
    }
}

/// Builds a [`DebtSummary`] for every user seen in expenses or payments.
///
/// For cent-denominated amounts each `net` equals the balance produced by
/// [`calculate_balances`] followed by [`apply_settlements`].
///
/// # Errors
///
/// Same as [`calculate_balances`].
pub fn debt_summary(
    expenses: &[Expense],
    payments: &[Payment],
    tolerance: Decimal,
) -> Result<Vec<DebtSummary>, SettlementError> {
    validate_tolerance(tolerance)?;

    let mut summaries: BTreeMap<UserId, DebtSummary> = BTreeMap::new();

    for expense in expenses {
        let shares = expense.shares(tolerance)?;
        let own_share = shares
            .iter()
            .find(|(participant, _)| *participant == expense.payer)
            .map_or(Decimal::ZERO, |(_, share)| *share);

        summary_for(&mut summaries, &expense.payer).lent += expense.amount - own_share;
        for (participant, share) in shares {
            if participant != expense.payer {
                summary_for(&mut summaries, &participant).borrowed += share;
            }
        }
    }

    for payment in payments {
        summary_for(&mut summaries, &payment.from).paid += payment.amount;
        summary_for(&mut summaries, &payment.to).received += payment.amount;
    }

    Ok(summaries
        .into_values()
        .map(|mut summary| {
            summary.lent = round_money(summary.lent);
            summary.borrowed = round_money(summary.borrowed);
            summary.paid = round_money(summary.paid);
            summary.received = round_money(summary.received);
            summary.net =
                round_money((summary.lent - summary.received) - (summary.borrowed - summary.paid));
            summary
        })
        .collect())
}

fn summary_for<'a>(
    summaries: &'a mut BTreeMap<UserId, DebtSummary>,
    user: &UserId,
) -> &'a mut DebtSummary {
    summaries
        .entry(user.clone())
        .or_insert_with(|| DebtSummary::new(user.clone()))
}
