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

//! Error types for balance calculation and settlement.

use crate::base::{EntryId, GroupId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons an expense record is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpenseError {
    /// Amount is zero or negative
    #[error("expense amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// The same participant is listed twice
    #[error("participant {0} listed more than once")]
    DuplicateParticipant(UserId),

    /// A participant of a weighted split has no weight
    #[error("missing weight for participant {0}")]
    MissingWeight(UserId),

    /// A weight was supplied for someone who does not participate
    #[error("weight supplied for non-participant {0}")]
    UnexpectedWeight(UserId),

    /// Weights do not add up to one
    #[error("weights must sum to 1.0, got {sum}")]
    WeightSum { sum: Decimal },

    /// A weight is below zero
    #[error("negative weight for participant {0}")]
    NegativeWeight(UserId),

    /// A participant of an exact split has no share
    #[error("missing share for participant {0}")]
    MissingShare(UserId),

    /// A share was supplied for someone who does not participate
    #[error("share supplied for non-participant {0}")]
    UnexpectedShare(UserId),

    /// A share amount is below zero
    #[error("negative share for participant {0}")]
    NegativeShare(UserId),

    /// Exact shares do not add up to the expense amount
    #[error("shares must sum to the expense amount {amount}, got {sum}")]
    ShareSum { sum: Decimal, amount: Decimal },

    /// Validation was asked to use a negative tolerance
    #[error("tolerance must not be negative, got {0}")]
    InvalidTolerance(Decimal),
}

/// Balance calculation, settlement and ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// An expense record failed validation
    #[error("invalid expense: {0}")]
    InvalidExpense(ExpenseError),

    /// Balances do not net out to zero
    #[error("balances not zero-sum: total={total}, tolerance={tolerance}")]
    Unbalanced { total: Decimal, tolerance: Decimal },

    /// The matching loop hit its iteration bound
    #[error("settlement loop exceeded max iterations ({max_iterations})")]
    NonConvergence { max_iterations: usize },

    /// Tolerance is negative
    #[error("tolerance must not be negative, got {0}")]
    InvalidTolerance(Decimal),

    /// Referenced group does not exist
    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    /// Entry ID already recorded in the group
    #[error("duplicate entry ID {0}")]
    DuplicateEntry(EntryId),

    /// Settlement amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Settlement payer and payee are the same user
    #[error("user {0} cannot settle with themselves")]
    SelfPayment(UserId),
}

impl From<ExpenseError> for SettlementError {
    fn from(error: ExpenseError) -> Self {
        match error {
            // A bad tolerance is a configuration error, not a bad record.
            ExpenseError::InvalidTolerance(tolerance) => SettlementError::InvalidTolerance(tolerance),
            other => SettlementError::InvalidExpense(other),
        }
    }
}
