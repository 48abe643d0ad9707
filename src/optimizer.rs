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

//! Minimum cash flow settlement.
//!
//! Turns a zero-sum [`Balances`] map into a short list of [`Payment`]s that
//! brings every balance back to zero.
//!
//! # Algorithm
//!
//! Greedy largest-to-largest matching:
//!
//! 1. Validate that balances sum to zero within the tolerance.
//! 2. Drop balances already within the tolerance of zero.
//! 3. Split the rest into creditors and debtors (as positive amounts owed),
//!    each sorted by amount, largest first.
//! 4. Repeatedly match the current creditor with the current debtor, paying
//!    the smaller of the two amounts, and move past whichever side is settled.
//!
//! The result has at most `creditors + debtors - 1` payments. This is a
//! heuristic: it is optimal for the common one-sided shapes but does not
//! guarantee the minimum transaction count for every input, which is NP-hard
//! in general.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use settle_up::{Balances, Payment, SettlementConfig, UserId, min_cash_flow};
//!
//! let balances = Balances::from([
//!     (UserId::from("A"), dec!(80)),
//!     (UserId::from("B"), dec!(-10)),
//!     (UserId::from("C"), dec!(-70)),
//! ]);
//!
//! let payments = min_cash_flow(&balances, &SettlementConfig::default()).unwrap();
//! assert_eq!(
//!     payments,
//!     vec![
//!         Payment::new("C", "A", dec!(70.00)),
//!         Payment::new("B", "A", dec!(10.00)),
//!     ]
//! );
//! ```

use crate::balance::Balances;
use crate::base::{UserId, round_money};
use crate::config::{SettlementConfig, validate_tolerance};
use crate::settlement::Payment;
use crate::SettlementError;
use rust_decimal::Decimal;

/// Computes the payments that settle all balances.
///
/// # Errors
///
/// - [`SettlementError::Unbalanced`] - Balances do not sum to zero within the tolerance.
/// - [`SettlementError::NonConvergence`] - Matching exceeded `max_iterations`.
/// - [`SettlementError::InvalidTolerance`] - The configured tolerance is negative.
pub fn min_cash_flow(
    balances: &Balances,
    config: &SettlementConfig,
) -> Result<Vec<Payment>, SettlementError> {
    settle(balances, config, &mut ())
}

/// Same as [`min_cash_flow`], also returning a step-by-step trace.
///
/// The payments are identical to those of [`min_cash_flow`] for the same
/// input. The trace is meant for people, and its wording is not stable.
///
/// # Errors
///
/// Same as [`min_cash_flow`].
pub fn min_cash_flow_detailed(
    balances: &Balances,
    config: &SettlementConfig,
) -> Result<(Vec<Payment>, Vec<String>), SettlementError> {
    let mut trace = Vec::new();
    let payments = settle(balances, config, &mut trace)?;
    Ok((payments, trace))
}

/// Checks that `balances` sum to zero within `tolerance`.
///
/// # Errors
///
/// [`SettlementError::Unbalanced`] carrying the actual total.
pub fn validate_balance_sum(balances: &Balances, tolerance: Decimal) -> Result<(), SettlementError> {
    let total: Decimal = balances.values().copied().sum();
    if total.abs() > tolerance {
        return Err(SettlementError::Unbalanced { total, tolerance });
    }
    Ok(())
}

/// Receives trace lines. `()` discards them.
trait TraceSink {
    fn enabled(&self) -> bool;
    fn push(&mut self, line: String);
}

impl TraceSink for () {
    fn enabled(&self) -> bool {
        false
    }

    fn push(&mut self, _line: String) {}
}

impl TraceSink for Vec<String> {
    fn enabled(&self) -> bool {
        true
    }

    fn push(&mut self, line: String) {
        Vec::push(self, line);
    }
}

/// Formatting is skipped entirely when the sink discards lines.
macro_rules! trace_line {
    ($sink:expr, $($arg:tt)*) => {
        if $sink.enabled() {
            $sink.push(format!($($arg)*));
        }
    };
}

/// Remaining amount for one side of the matching.
#[derive(Debug)]
struct Position {
    user: UserId,
    amount: Decimal,
}

fn format_positions(positions: &[Position]) -> String {
    positions
        .iter()
        .map(|p| format!("{}={}", p.user, p.amount))
        .collect::<Vec<_>>()
        .join(", ")
}

fn settle<T: TraceSink>(
    balances: &Balances,
    config: &SettlementConfig,
    trace: &mut T,
) -> Result<Vec<Payment>, SettlementError> {
    config.validate()?;
    let tolerance = config.tolerance;

    if balances.len() < 2 {
        trace_line!(trace, "{} balance(s) provided, nothing to settle", balances.len());
        return Ok(Vec::new());
    }

    if let Err(error) = validate_balance_sum(balances, tolerance) {
        trace_line!(trace, "balance validation failed: {error}");
        return Err(error);
    }
    trace_line!(trace, "balances sum to zero within tolerance {tolerance}");

    // Everything within the tolerance of zero counts as settled.
    let mut creditors = Vec::new();
    let mut debtors = Vec::new();
    for (user, &amount) in balances {
        if amount > tolerance {
            creditors.push(Position {
                user: user.clone(),
                amount,
            });
        } else if amount < -tolerance {
            debtors.push(Position {
                user: user.clone(),
                amount: -amount,
            });
        }
    }

    if creditors.is_empty() || debtors.is_empty() {
        trace_line!(trace, "all balances settled, no payments needed");
        return Ok(Vec::new());
    }

    // Stable sorts: equal amounts keep user ID order.
    creditors.sort_by(|a, b| b.amount.cmp(&a.amount));
    debtors.sort_by(|a, b| b.amount.cmp(&a.amount));

    trace_line!(trace, "creditors (to receive): {}", format_positions(&creditors));
    trace_line!(trace, "debtors (to pay): {}", format_positions(&debtors));

    let mut payments = Vec::new();
    let mut iterations = 0usize;
    let (mut i, mut j) = (0, 0);

    while i < creditors.len() && j < debtors.len() {
        iterations += 1;
        if iterations > config.max_iterations {
            trace_line!(trace, "exceeded max iterations ({})", config.max_iterations);
            return Err(SettlementError::NonConvergence {
                max_iterations: config.max_iterations,
            });
        }

        let creditor = &creditors[i];
        let debtor = &debtors[j];
        trace_line!(
            trace,
            "step {iterations}: matching {} (owes {}) with {} (owed {})",
            debtor.user,
            debtor.amount,
            creditor.user,
            creditor.amount
        );

        let amount = round_money(creditor.amount.min(debtor.amount));
        if amount > tolerance {
            tracing::debug!(from = %debtor.user, to = %creditor.user, %amount, "settlement payment");
            trace_line!(trace, "  {} pays {} {amount}", debtor.user, creditor.user);
            payments.push(Payment {
                from: debtor.user.clone(),
                to: creditor.user.clone(),
                amount,
            });
        } else {
            trace_line!(trace, "  skipped, {amount} is within tolerance {tolerance}");
        }

        let credit_left = round_money(creditors[i].amount - amount);
        let debt_left = round_money(debtors[j].amount - amount);
        creditors[i].amount = credit_left;
        debtors[j].amount = debt_left;
        trace_line!(
            trace,
            "  remaining: {}={credit_left}, {}={debt_left}",
            creditors[i].user,
            debtors[j].user
        );

        if credit_left <= tolerance {
            trace_line!(trace, "  {} settled", creditors[i].user);
            i += 1;
        }
        if debt_left <= tolerance {
            trace_line!(trace, "  {} settled", debtors[j].user);
            j += 1;
        }
    }

    tracing::debug!(iterations, payments = payments.len(), "settlement complete");
    trace_line!(
        trace,
        "completed in {iterations} step(s) with {} payment(s)",
        payments.len()
    );

    Ok(payments)
}
