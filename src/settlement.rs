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

//! Settlement payments.

use crate::SettlementError;
use crate::base::{UserId, round_money};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

/// A directed payment: `from` pays `to` the given amount.
///
/// Produced by the optimizer as a suggestion, or recorded in a
/// [`Ledger`](crate::Ledger) once it has actually happened.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Payment {
    pub from: UserId,
    pub to: UserId,
    pub amount: Decimal,
}

impl Payment {
    pub fn new(from: impl Into<UserId>, to: impl Into<UserId>, amount: Decimal) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    /// Checks that a payment can be recorded as made.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::InvalidAmount`] - Amount is zero or negative.
    /// - [`SettlementError::SelfPayment`] - Payer and payee are the same.
    pub fn validate(&self) -> Result<(), SettlementError> {
        if self.amount <= Decimal::ZERO {
            return Err(SettlementError::InvalidAmount);
        }
        if self.from == self.to {
            return Err(SettlementError::SelfPayment(self.from.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pays {} {}", self.from, self.to, round_money(self.amount))
    }
}

impl Serialize for Payment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Payment", 3)?;
        state.serialize_field("from", &self.from)?;
        state.serialize_field("to", &self.to)?;
        state.serialize_field("amount", &round_money(self.amount))?;
        state.end()
    }
}
