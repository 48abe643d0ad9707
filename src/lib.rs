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

//! # Settle Up
//!
//! This library tracks shared group expenses and works out who should pay whom,
//! using exact decimal money rounded to cents.
//!
//! ## Core Components
//!
//! - [`calculate_balances`]: Net balance per user from equal or weighted expenses
//! - [`min_cash_flow`]: Short list of payments that settles a zero-sum balance map
//! - [`min_cash_flow_detailed`]: The same payments plus a step-by-step trace
//! - [`Ledger`]: In-memory store of expense groups and recorded settlements
//! - [`SettlementError`]: Error types for invalid input and failed settlement
//!
//! ## Example
//!
//! ```
//! use settle_up::{Expense, Payment, SettlementConfig, calculate_balances, min_cash_flow};
//! use rust_decimal_macros::dec;
//!
//! let config = SettlementConfig::default();
//! let expenses = vec![
//!     Expense::equal("A", dec!(120), ["A", "B", "C"]),
//!     Expense::equal("B", dec!(60), ["B", "C"]),
//! ];
//!
//! let balances = calculate_balances(&expenses, config.tolerance).unwrap();
//! let payments = min_cash_flow(&balances, &config).unwrap();
//!
//! assert_eq!(
//!     payments,
//!     vec![
//!         Payment::new("C", "A", dec!(70.00)),
//!         Payment::new("B", "A", dec!(10.00)),
//!     ]
//! );
//! ```
//!
//! ## Thread Safety
//!
//! The calculator and optimizer are pure functions. The ledger locks each group
//! separately, so groups are updated in parallel while each settlement is
//! computed from a consistent snapshot of its group.

pub mod balance;
mod base;
mod config;
pub mod error;
mod expense;
mod group;
mod ledger;
pub mod optimizer;
mod settlement;

pub use balance::{Balances, DebtSummary, apply_settlements, calculate_balances, debt_summary};
pub use base::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, EntryId, GroupId, MONEY_SCALE, UserId, round_money,
};
pub use config::SettlementConfig;
pub use error::{ExpenseError, SettlementError};
pub use expense::{Expense, Split};
pub use group::Group;
pub use ledger::Ledger;
pub use optimizer::{min_cash_flow, min_cash_flow_detailed, validate_balance_sum};
pub use settlement::Payment;
