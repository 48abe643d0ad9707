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

use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use settle_up::{
    Balances, Expense, Payment, SettlementConfig, SettlementError, Split, UserId,
    apply_settlements, calculate_balances, min_cash_flow, min_cash_flow_detailed,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Settle Up - Work out who pays whom
///
/// Reads expenses (or precomputed balances) from a CSV file and writes the
/// payments that settle every balance to stdout.
#[derive(Parser, Debug)]
#[command(name = "settle-up")]
#[command(about = "Computes minimal settlement payments for shared expenses", long_about = None)]
struct Args {
    /// Path to CSV file with expenses or balances
    ///
    /// Expenses format: payer,amount,participants,weights,shares
    /// Example: cargo run -- expenses.csv > payments.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// What the input file contains
    #[arg(long, value_enum, default_value_t = InputKind::Expenses)]
    input_kind: InputKind,

    /// CSV file of settlements already paid (from,to,amount)
    #[arg(long, value_name = "FILE")]
    settled: Option<PathBuf>,

    /// Largest deviation from zero treated as settled
    #[arg(long, default_value = "0.01")]
    tolerance: Decimal,

    /// Upper bound on matching steps
    #[arg(long, default_value_t = settle_up::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Print each matching step to stderr
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputKind {
    /// payer,amount,participants,weights,shares
    Expenses,
    /// user,balance
    Balances,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot open '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

fn main() {
    init_tracing();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays a clean CSV. Filter with `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = SettlementConfig::default()
        .with_tolerance(args.tolerance)
        .with_max_iterations(args.max_iterations);
    config.validate()?;

    let input = open(&args.input)?;
    let mut balances = match args.input_kind {
        InputKind::Expenses => calculate_balances(&read_expenses(input)?, config.tolerance)?,
        InputKind::Balances => read_balances(input)?,
    };

    if let Some(path) = &args.settled {
        apply_settlements(&mut balances, &read_settlements(open(path)?)?);
    }

    let payments = if args.trace {
        let (payments, trace) = min_cash_flow_detailed(&balances, &config)?;
        for line in trace {
            eprintln!("{}", line);
        }
        payments
    } else {
        min_cash_flow(&balances, &config)?
    };

    write_payments(&payments, io::stdout())?;
    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>, CliError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CliError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Raw CSV expense row.
///
/// Fields: `payer, amount, participants, weights, shares`
/// - `participants`: user IDs separated by `;`
/// - `weights`: optional `user=fraction` pairs separated by `;`
/// - `shares`: optional `user=amount` pairs separated by `;`
///
/// With neither `weights` nor `shares` the expense is split equally.
#[derive(Debug, Deserialize)]
struct ExpenseRecord {
    payer: String,
    amount: Decimal,
    participants: String,
    #[serde(default)]
    weights: Option<String>,
    #[serde(default)]
    shares: Option<String>,
}

impl ExpenseRecord {
    fn into_expense(self, line: u64) -> Result<Expense, CliError> {
        let participants = split_list(&self.participants).map(UserId::from).collect();

        let weights = non_empty(self.weights.as_deref());
        let shares = non_empty(self.shares.as_deref());
        let split = match (weights, shares) {
            (None, None) => Split::Equal,
            (Some(weights), None) => Split::Weighted(parse_pairs(weights, "fraction", line)?),
            (None, Some(shares)) => Split::Exact(parse_pairs(shares, "amount", line)?),
            (Some(_), Some(_)) => {
                return Err(CliError::InvalidRecord {
                    line,
                    reason: "weights and shares are mutually exclusive".to_string(),
                });
            }
        };

        Ok(Expense {
            payer: UserId::from(self.payer),
            amount: self.amount,
            participants,
            split,
        })
    }
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|value| !value.is_empty())
}

/// Parses `user=value` pairs separated by `;`.
fn parse_pairs(list: &str, unit: &str, line: u64) -> Result<HashMap<UserId, Decimal>, CliError> {
    let mut map = HashMap::new();
    for pair in split_list(list) {
        let (user, value) = pair.split_once('=').ok_or_else(|| CliError::InvalidRecord {
            line,
            reason: format!("'{}' is not of the form user={}", pair, unit),
        })?;
        let value = value.trim().parse::<Decimal>().map_err(|e| CliError::InvalidRecord {
            line,
            reason: format!("{} for '{}': {}", unit, user.trim(), e),
        })?;
        map.insert(UserId::from(user.trim()), value);
    }
    Ok(map)
}

/// Raw CSV balance row.
#[derive(Debug, Deserialize)]
struct BalanceRecord {
    user: String,
    balance: Decimal,
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(';').map(str::trim).filter(|item| !item.is_empty())
}

/// Deserializes every row, keeping its line number for error messages.
///
/// A bad row is fatal: a dropped expense or balance unbalances the group.
fn read_records<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<(u64, T)>, CliError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true) // Allow missing weights and shares columns
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |position| position.line());
        rows.push((line, record.deserialize(Some(&headers))?));
    }
    Ok(rows)
}

/// Reads expenses from CSV.
///
/// # Example
///
/// ```csv
/// payer,amount,participants,weights,shares
/// A,120,A;B;C,,
/// B,60,B;C,B=0.5;C=0.5,
/// C,40,A;C,,A=15;C=25
/// ```
fn read_expenses<R: Read>(reader: R) -> Result<Vec<Expense>, CliError> {
    read_records::<_, ExpenseRecord>(reader)?
        .into_iter()
        .map(|(line, record)| record.into_expense(line))
        .collect()
}

/// Reads a balance map from `user,balance` rows. Repeated users are summed.
fn read_balances<R: Read>(reader: R) -> Result<Balances, CliError> {
    let mut balances = Balances::new();
    for (_, record) in read_records::<_, BalanceRecord>(reader)? {
        *balances.entry(UserId::from(record.user)).or_default() += record.balance;
    }
    Ok(balances)
}

/// Reads settlements already paid from `from,to,amount` rows.
///
/// Each row must be a positive payment between two different users.
fn read_settlements<R: Read>(reader: R) -> Result<Vec<Payment>, CliError> {
    read_records::<_, Payment>(reader)?
        .into_iter()
        .map(|(line, payment)| {
            payment.validate().map_err(|e| CliError::InvalidRecord {
                line,
                reason: e.to_string(),
            })?;
            Ok(payment)
        })
        .collect()
}

/// Writes payments as CSV with columns `from, to, amount`.
///
/// # Example
///
/// ```csv
/// from,to,amount
/// C,A,70.00
/// B,A,10.00
/// ```
fn write_payments<W: Write>(payments: &[Payment], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for payment in payments {
        wtr.serialize(payment)?;
    }
    wtr.flush()?;
    Ok(())
}
