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

//! Ledger public API integration tests.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use settle_up::{
    EntryId, Expense, ExpenseError, GroupId, Ledger, Payment, SettlementConfig, SettlementError,
    UserId,
};

fn trip_ledger() -> Ledger {
    let ledger = Ledger::new();
    ledger
        .record_expense(GroupId(1), EntryId(1), Expense::equal("A", dec!(120), ["A", "B", "C"]))
        .unwrap();
    ledger
        .record_expense(GroupId(1), EntryId(2), Expense::equal("B", dec!(60), ["B", "C"]))
        .unwrap();
    ledger
}

#[test]
fn expense_creates_group() {
    let ledger = Ledger::new();
    assert!(ledger.get_group(&GroupId(1)).is_none());

    ledger
        .record_expense(GroupId(1), EntryId(1), Expense::equal("A", dec!(50), ["A", "B"]))
        .unwrap();

    let group = ledger.get_group(&GroupId(1)).unwrap();
    assert_eq!(group.id(), GroupId(1));
    assert_eq!(group.expense_count(), 1);
}

#[test]
fn balances_for_group() {
    let ledger = trip_ledger();
    let balances = ledger.balances(GroupId(1)).unwrap();

    assert_eq!(balances[&UserId::from("A")], dec!(80));
    assert_eq!(balances[&UserId::from("B")], dec!(-10));
    assert_eq!(balances[&UserId::from("C")], dec!(-70));
}

#[test]
fn suggest_settlements_for_group() {
    let ledger = trip_ledger();
    assert_eq!(
        ledger.suggest_settlements(GroupId(1)).unwrap(),
        vec![
            Payment::new("C", "A", dec!(70)),
            Payment::new("B", "A", dec!(10)),
        ]
    );
}

#[test]
fn recording_suggested_payments_settles_group() {
    let ledger = trip_ledger();
    let suggestions = ledger.suggest_settlements(GroupId(1)).unwrap();

    for (i, payment) in suggestions.into_iter().enumerate() {
        ledger
            .record_settlement(GroupId(1), EntryId(100 + i as u32), payment)
            .unwrap();
    }

    assert!(ledger.suggest_settlements(GroupId(1)).unwrap().is_empty());
    assert!(
        ledger
            .balances(GroupId(1))
            .unwrap()
            .values()
            .all(|b| b.is_zero())
    );
}

#[test]
fn partial_settlement_updates_suggestions() {
    let ledger = trip_ledger();
    ledger
        .record_settlement(GroupId(1), EntryId(3), Payment::new("C", "A", dec!(50)))
        .unwrap();

    assert_eq!(
        ledger.suggest_settlements(GroupId(1)).unwrap(),
        vec![
            Payment::new("C", "A", dec!(20)),
            Payment::new("B", "A", dec!(10)),
        ]
    );
}

#[test]
fn groups_are_independent() {
    let ledger = trip_ledger();
    ledger
        .record_expense(GroupId(2), EntryId(1), Expense::equal("X", dec!(10), ["X", "Y"]))
        .unwrap();

    assert_eq!(ledger.group_ids(), vec![GroupId(1), GroupId(2)]);
    assert_eq!(
        ledger.suggest_settlements(GroupId(2)).unwrap(),
        vec![Payment::new("Y", "X", dec!(5))]
    );
    assert_eq!(ledger.balances(GroupId(1)).unwrap().len(), 3);
}

#[test]
fn duplicate_entry_rejected() {
    let ledger = trip_ledger();
    let result =
        ledger.record_expense(GroupId(1), EntryId(1), Expense::equal("C", dec!(5), ["C", "A"]));
    assert_eq!(result, Err(SettlementError::DuplicateEntry(EntryId(1))));

    let result =
        ledger.record_settlement(GroupId(1), EntryId(2), Payment::new("B", "A", dec!(10)));
    assert_eq!(result, Err(SettlementError::DuplicateEntry(EntryId(2))));

    // Balances unchanged
    let balances = ledger.balances(GroupId(1)).unwrap();
    assert_eq!(balances[&UserId::from("A")], dec!(80));
}

#[test]
fn same_entry_id_in_different_groups() {
    let ledger = trip_ledger();
    ledger
        .record_expense(GroupId(2), EntryId(1), Expense::equal("X", dec!(10), ["X", "Y"]))
        .unwrap();
    assert_eq!(ledger.group_ids().len(), 2);
}

#[test]
fn invalid_expense_does_not_create_group() {
    let ledger = Ledger::new();
    let result = ledger.record_expense(
        GroupId(7),
        EntryId(1),
        Expense::weighted("A", dec!(100), [("A", dec!(0.5)), ("B", dec!(0.6))]),
    );

    assert_eq!(
        result,
        Err(SettlementError::InvalidExpense(ExpenseError::WeightSum {
            sum: dec!(1.1)
        }))
    );
    assert!(ledger.get_group(&GroupId(7)).is_none());
    assert_eq!(ledger.balances(GroupId(7)), Err(SettlementError::GroupNotFound(GroupId(7))));
}

#[test]
fn settlement_requires_existing_group() {
    let ledger = Ledger::new();
    let result =
        ledger.record_settlement(GroupId(1), EntryId(1), Payment::new("B", "A", dec!(10)));
    assert_eq!(result, Err(SettlementError::GroupNotFound(GroupId(1))));
}

#[test]
fn settlement_validation() {
    let ledger = trip_ledger();
    assert_eq!(
        ledger.record_settlement(GroupId(1), EntryId(3), Payment::new("B", "A", Decimal::ZERO)),
        Err(SettlementError::InvalidAmount)
    );
    assert_eq!(
        ledger.record_settlement(GroupId(1), EntryId(3), Payment::new("B", "A", dec!(-1))),
        Err(SettlementError::InvalidAmount)
    );
    assert_eq!(
        ledger.record_settlement(GroupId(1), EntryId(3), Payment::new("B", "B", dec!(1))),
        Err(SettlementError::SelfPayment(UserId::from("B")))
    );

    // The rejected attempts did not consume the entry ID
    ledger
        .record_settlement(GroupId(1), EntryId(3), Payment::new("B", "A", dec!(1)))
        .unwrap();
}

#[test]
fn overpayment_flips_balances() {
    let ledger = trip_ledger();
    ledger
        .record_settlement(GroupId(1), EntryId(3), Payment::new("B", "A", dec!(25)))
        .unwrap();

    let balances = ledger.balances(GroupId(1)).unwrap();
    assert_eq!(balances[&UserId::from("B")], dec!(15));

    let payments = ledger.suggest_settlements(GroupId(1)).unwrap();
    assert_eq!(
        payments,
        vec![
            Payment::new("C", "A", dec!(55)),
            Payment::new("C", "B", dec!(15)),
        ]
    );
}

#[test]
fn ledger_config_applies_to_every_group() {
    let ledger = Ledger::with_config(SettlementConfig::default().with_max_iterations(1)).unwrap();
    assert_eq!(ledger.config().max_iterations, 1);

    ledger
        .record_expense(GroupId(1), EntryId(1), Expense::equal("A", dec!(30), ["A", "B", "C"]))
        .unwrap();
    assert_eq!(
        ledger.suggest_settlements(GroupId(1)),
        Err(SettlementError::NonConvergence { max_iterations: 1 })
    );
}

#[test]
fn debt_summary_for_group() {
    let ledger = trip_ledger();
    ledger
        .record_settlement(GroupId(1), EntryId(3), Payment::new("C", "A", dec!(70)))
        .unwrap();

    let summary = ledger.debt_summary(GroupId(1)).unwrap();
    let nets: Vec<_> = summary.iter().map(|s| (s.user.as_str(), s.net)).collect();
    assert_eq!(nets, vec![("A", dec!(10)), ("B", dec!(-10)), ("C", dec!(0))]);
}

#[test]
fn ledger_rejects_negative_tolerance() {
    let result = Ledger::with_config(SettlementConfig::default().with_tolerance(dec!(-0.01)));
    assert!(matches!(result, Err(SettlementError::InvalidTolerance(t)) if t == dec!(-0.01)));
}

#[test]
fn wider_tolerance_accepts_looser_weights() {
    let ledger = Ledger::with_config(SettlementConfig::default().with_tolerance(dec!(0.05))).unwrap();
    ledger
        .record_expense(
            GroupId(1),
            EntryId(1),
            Expense::weighted("A", dec!(100), [("A", dec!(0.5)), ("B", dec!(0.48))]),
        )
        .unwrap();
    assert_eq!(ledger.balances(GroupId(1)).unwrap()[&UserId::from("B")], dec!(-48));
}

#[test]
fn exact_split_expense() {
    let ledger = Ledger::new();
    ledger
        .record_expense(
            GroupId(1),
            EntryId(1),
            Expense::exact("A", dec!(90), [("A", dec!(10)), ("B", dec!(30)), ("C", dec!(50))]),
        )
        .unwrap();

    assert_eq!(
        ledger.suggest_settlements(GroupId(1)).unwrap(),
        vec![
            Payment::new("C", "A", dec!(50)),
            Payment::new("B", "A", dec!(30)),
        ]
    );

    let result = ledger.record_expense(
        GroupId(1),
        EntryId(2),
        Expense::exact("A", dec!(90), [("A", dec!(10)), ("B", dec!(30))]),
    );
    assert_eq!(
        result,
        Err(SettlementError::InvalidExpense(ExpenseError::ShareSum {
            sum: dec!(40),
            amount: dec!(90)
        }))
    );
}
