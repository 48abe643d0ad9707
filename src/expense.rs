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

//! Expense records and how their cost is split.
//!
//! An expense is paid up front by one user and shared by an ordered set of
//! participants, equally, by weights or by explicit amounts:
//! - [`Split::Equal`]: every participant owes `round(amount / n)`.
//! - [`Split::Weighted`]: each participant owes `round(amount * weight)`.
//! - [`Split::Exact`]: each participant owes the given amount; the amounts
//!   must add up to the expense amount exactly.
//!
//! Shares are rounded to cents independently, so the shares of one expense may
//! differ from its amount by a few cents. That drift is absorbed by the
//! zero-sum tolerance rather than corrected.

use crate::base::{UserId, round_money};
use crate::error::ExpenseError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How an expense is divided between its participants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Split {
    #[default]
    Equal,
    /// Fraction of the amount owed by each participant.
    Weighted(HashMap<UserId, Decimal>),
    /// Amount owed by each participant.
    Exact(HashMap<UserId, Decimal>),
}

/// A single shared expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub payer: UserId,
    pub amount: Decimal,
    pub participants: Vec<UserId>,
    #[serde(default)]
    pub split: Split,
}

impl Expense {
    /// Creates an expense split equally among `participants`.
    pub fn equal<I, U>(payer: impl Into<UserId>, amount: Decimal, participants: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        Self {
            payer: payer.into(),
            amount,
            participants: participants.into_iter().map(Into::into).collect(),
            split: Split::Equal,
        }
    }

    /// Creates a weighted expense; participants keep the order of `weights`.
    pub fn weighted<I, U>(payer: impl Into<UserId>, amount: Decimal, weights: I) -> Self
    where
        I: IntoIterator<Item = (U, Decimal)>,
        U: Into<UserId>,
    {
        let (participants, map) = collect_pairs(weights);
        Self {
            payer: payer.into(),
            amount,
            participants,
            split: Split::Weighted(map),
        }
    }

    /// Creates an expense with explicit share amounts; participants keep the
    /// order of `shares`.
    pub fn exact<I, U>(payer: impl Into<UserId>, amount: Decimal, shares: I) -> Self
    where
        I: IntoIterator<Item = (U, Decimal)>,
        U: Into<UserId>,
    {
        let (participants, map) = collect_pairs(shares);
        Self {
            payer: payer.into(),
            amount,
            participants,
            split: Split::Exact(map),
        }
    }

    /// Checks the record invariants without computing shares.
    ///
    /// # Errors
    ///
    /// - [`ExpenseError::InvalidTolerance`] - `tolerance` is negative.
    /// - [`ExpenseError::NonPositiveAmount`] - Amount is zero or negative.
    /// - [`ExpenseError::DuplicateParticipant`] - A participant appears twice.
    /// - [`ExpenseError::NegativeWeight`] - A weight is below zero.
    /// - [`ExpenseError::WeightSum`] - Weights deviate from 1.0 beyond `tolerance`.
    /// - [`ExpenseError::MissingWeight`] - A participant has no weight.
    /// - [`ExpenseError::UnexpectedWeight`] - A weight names a non-participant.
    /// - [`ExpenseError::NegativeShare`] - An exact share is below zero.
    /// - [`ExpenseError::ShareSum`] - Exact shares do not add up to the amount.
    /// - [`ExpenseError::MissingShare`] - A participant has no exact share.
    /// - [`ExpenseError::UnexpectedShare`] - An exact share names a non-participant.
    pub fn validate(&self, tolerance: Decimal) -> Result<(), ExpenseError> {
        if tolerance < Decimal::ZERO {
            return Err(ExpenseError::InvalidTolerance(tolerance));
        }

        if self.amount <= Decimal::ZERO {
            return Err(ExpenseError::NonPositiveAmount(self.amount));
        }

        let mut seen = HashSet::with_capacity(self.participants.len());
        for participant in &self.participants {
            if !seen.insert(participant) {
                return Err(ExpenseError::DuplicateParticipant(participant.clone()));
            }
        }

        match &self.split {
            Split::Equal => {}
            Split::Weighted(weights) => {
                if let Some(user) = smallest_negative(weights) {
                    return Err(ExpenseError::NegativeWeight(user.clone()));
                }

                let sum: Decimal = weights.values().copied().sum();
                if (sum - Decimal::ONE).abs() > tolerance {
                    return Err(ExpenseError::WeightSum { sum });
                }

                check_coverage(
                    &self.participants,
                    &seen,
                    weights,
                    ExpenseError::MissingWeight,
                    ExpenseError::UnexpectedWeight,
                )?;
            }
            Split::Exact(amounts) => {
                if let Some(user) = smallest_negative(amounts) {
                    return Err(ExpenseError::NegativeShare(user.clone()));
                }

                let sum: Decimal = amounts.values().copied().sum();
                if sum != self.amount {
                    return Err(ExpenseError::ShareSum {
                        sum,
                        amount: self.amount,
                    });
                }

                check_coverage(
                    &self.participants,
                    &seen,
                    amounts,
                    ExpenseError::MissingShare,
                    ExpenseError::UnexpectedShare,
                )?;
            }
        }

        Ok(())
    }

    /// Returns each participant's rounded share, in participant order.
    ///
    /// An equal split with no participants yields no shares.
    ///
    /// # Errors
    ///
    /// Any error from [`Expense::validate`].
    pub fn shares(&self, tolerance: Decimal) -> Result<Vec<(UserId, Decimal)>, ExpenseError> {
        self.validate(tolerance)?;

        match &self.split {
            Split::Equal => {
                if self.participants.is_empty() {
                    return Ok(Vec::new());
                }
                let share = round_money(self.amount / Decimal::from(self.participants.len()));
                Ok(self
                    .participants
                    .iter()
                    .map(|participant| (participant.clone(), share))
                    .collect())
            }
            Split::Weighted(weights) => self
                .participants
                .iter()
                .map(|participant| {
                    let weight = weights
                        .get(participant)
                        .ok_or_else(|| ExpenseError::MissingWeight(participant.clone()))?;
                    Ok((participant.clone(), round_money(self.amount * *weight)))
                })
                .collect(),
            Split::Exact(amounts) => self
                .participants
                .iter()
                .map(|participant| {
                    let share = amounts
                        .get(participant)
                        .ok_or_else(|| ExpenseError::MissingShare(participant.clone()))?;
                    Ok((participant.clone(), round_money(*share)))
                })
                .collect(),
        }
    }
}

fn collect_pairs<I, U>(pairs: I) -> (Vec<UserId>, HashMap<UserId, Decimal>)
where
    I: IntoIterator<Item = (U, Decimal)>,
    U: Into<UserId>,
{
    let mut participants = Vec::new();
    let mut map = HashMap::new();
    for (user, value) in pairs {
        let user = user.into();
        participants.push(user.clone());
        map.insert(user, value);
    }
    (participants, map)
}

/// Smallest id holding a negative value; HashMap order is unstable.
fn smallest_negative(values: &HashMap<UserId, Decimal>) -> Option<&UserId> {
    values
        .iter()
        .filter(|(_, value)| **value < Decimal::ZERO)
        .map(|(user, _)| user)
        .min()
}

/// Every participant must have an entry and every entry must name a participant.
fn check_coverage(
    participants: &[UserId],
    seen: &HashSet<&UserId>,
    values: &HashMap<UserId, Decimal>,
    missing: fn(UserId) -> ExpenseError,
    unexpected: fn(UserId) -> ExpenseError,
) -> Result<(), ExpenseError> {
    if let Some(user) = participants.iter().find(|p| !values.contains_key(*p)) {
        return Err(missing(user.clone()));
    }
    if let Some(user) = values.keys().filter(|user| !seen.contains(user)).min() {
        return Err(unexpected(user.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOLERANCE: Decimal = dec!(0.01);

    #[test]
    fn equal_split_rounds_each_share() {
        let expense = Expense::equal("A", dec!(100), ["A", "B", "C"]);
        let shares = expense.shares(TOLERANCE).unwrap();
        assert_eq!(shares.len(), 3);
        assert!(shares.iter().all(|(_, share)| *share == dec!(33.33)));
    }

    #[test]
    fn equal_split_without_participants_has_no_shares() {
        let expense = Expense::equal("A", dec!(10), Vec::<&str>::new());
        assert!(expense.shares(TOLERANCE).unwrap().is_empty());
    }

    #[test]
    fn weighted_split_follows_participant_order() {
        let expense = Expense::weighted(
            "Alice",
            dec!(300),
            [("Alice", dec!(0.5)), ("Bob", dec!(0.3)), ("Charlie", dec!(0.2))],
        );
        let shares = expense.shares(TOLERANCE).unwrap();
        assert_eq!(
            shares,
            vec![
                (UserId::from("Alice"), dec!(150.00)),
                (UserId::from("Bob"), dec!(90.00)),
                (UserId::from("Charlie"), dec!(60.00)),
            ]
        );
    }

    #[test]
    fn weights_within_tolerance_are_accepted() {
        let expense = Expense::weighted("A", dec!(10), [("A", dec!(0.333)), ("B", dec!(0.666))]);
        assert!(expense.validate(TOLERANCE).is_ok());
    }

    #[test]
    fn rejects_non_positive_amount() {
        let expense = Expense::equal("A", dec!(0), ["A", "B"]);
        assert_eq!(expense.validate(TOLERANCE), Err(ExpenseError::NonPositiveAmount(dec!(0))));

        let expense = Expense::equal("A", dec!(-1), ["A", "B"]);
        assert_eq!(expense.validate(TOLERANCE), Err(ExpenseError::NonPositiveAmount(dec!(-1))));
    }

    #[test]
    fn rejects_duplicate_participant() {
        let expense = Expense::equal("A", dec!(10), ["A", "B", "A"]);
        assert_eq!(
            expense.validate(TOLERANCE),
            Err(ExpenseError::DuplicateParticipant(UserId::from("A")))
        );
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let expense = Expense::weighted("A", dec!(100), [("A", dec!(0.6)), ("B", dec!(0.5))]);
        assert_eq!(expense.validate(TOLERANCE), Err(ExpenseError::WeightSum { sum: dec!(1.1) }));
    }

    #[test]
    fn weight_sum_is_checked_before_coverage() {
        let mut expense = Expense::weighted("A", dec!(100), [("A", dec!(0.5))]);
        expense.participants.push(UserId::from("B"));
        assert_eq!(expense.validate(TOLERANCE), Err(ExpenseError::WeightSum { sum: dec!(0.5) }));
    }

    #[test]
    fn rejects_missing_weight() {
        let mut expense = Expense::weighted("A", dec!(100), [("A", dec!(1.0))]);
        expense.participants.push(UserId::from("B"));
        assert_eq!(
            expense.validate(TOLERANCE),
            Err(ExpenseError::MissingWeight(UserId::from("B")))
        );
    }

    #[test]
    fn rejects_weight_for_non_participant() {
        let mut expense =
            Expense::weighted("A", dec!(100), [("A", dec!(0.5)), ("B", dec!(0.5))]);
        expense.participants.retain(|p| p.as_str() == "A");
        assert_eq!(
            expense.validate(TOLERANCE),
            Err(ExpenseError::UnexpectedWeight(UserId::from("B")))
        );
    }

    #[test]
    fn negative_tolerance_is_rejected_before_any_other_check() {
        let expense = Expense::weighted("A", dec!(10), [("A", dec!(0.5)), ("B", dec!(0.5))]);
        assert_eq!(
            expense.validate(dec!(-0.01)),
            Err(ExpenseError::InvalidTolerance(dec!(-0.01)))
        );

        let expense = Expense::equal("A", dec!(0), ["A"]);
        assert_eq!(
            expense.shares(dec!(-1)),
            Err(ExpenseError::InvalidTolerance(dec!(-1)))
        );
    }

    #[test]
    fn rejects_negative_weight() {
        let expense = Expense::weighted("A", dec!(10), [("A", dec!(1.5)), ("B", dec!(-0.5))]);
        assert_eq!(
            expense.validate(TOLERANCE),
            Err(ExpenseError::NegativeWeight(UserId::from("B")))
        );
    }

    #[test]
    fn zero_weight_is_allowed() {
        let expense = Expense::weighted("A", dec!(10), [("A", dec!(1)), ("B", dec!(0))]);
        let shares = expense.shares(TOLERANCE).unwrap();
        assert_eq!(shares[1], (UserId::from("B"), dec!(0.00)));
    }

    #[test]
    fn exact_split_uses_given_amounts() {
        let expense = Expense::exact(
            "A",
            dec!(100),
            [("A", dec!(20)), ("B", dec!(45.50)), ("C", dec!(34.50))],
        );
        let shares = expense.shares(TOLERANCE).unwrap();
        assert_eq!(
            shares,
            vec![
                (UserId::from("A"), dec!(20.00)),
                (UserId::from("B"), dec!(45.50)),
                (UserId::from("C"), dec!(34.50)),
            ]
        );
    }

    #[test]
    fn exact_shares_must_match_amount() {
        // Exact shares get no tolerance: one cent short is rejected.
        let expense = Expense::exact("A", dec!(100), [("A", dec!(50)), ("B", dec!(49.99))]);
        assert_eq!(
            expense.validate(TOLERANCE),
            Err(ExpenseError::ShareSum {
                sum: dec!(99.99),
                amount: dec!(100)
            })
        );
    }

    #[test]
    fn exact_split_coverage() {
        let mut expense = Expense::exact("A", dec!(10), [("A", dec!(10))]);
        expense.participants.push(UserId::from("B"));
        assert_eq!(
            expense.validate(TOLERANCE),
            Err(ExpenseError::MissingShare(UserId::from("B")))
        );

        let mut expense = Expense::exact("A", dec!(10), [("A", dec!(4)), ("B", dec!(6))]);
        expense.participants.retain(|p| p.as_str() == "A");
        assert_eq!(
            expense.validate(TOLERANCE),
            Err(ExpenseError::UnexpectedShare(UserId::from("B")))
        );
    }

    #[test]
    fn rejects_negative_exact_share() {
        let expense = Expense::exact("A", dec!(10), [("A", dec!(15)), ("B", dec!(-5))]);
        assert_eq!(
            expense.validate(TOLERANCE),
            Err(ExpenseError::NegativeShare(UserId::from("B")))
        );
    }

    #[test]
    fn empty_weight_map_fails_sum_check() {
        let expense = Expense {
            payer: UserId::from("A"),
            amount: dec!(10),
            participants: vec![UserId::from("A")],
            split: Split::Weighted(HashMap::new()),
        };
        assert_eq!(expense.validate(TOLERANCE), Err(ExpenseError::WeightSum { sum: dec!(0) }));
    }
}
