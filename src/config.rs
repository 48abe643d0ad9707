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

//! Settlement tuning knobs.

use crate::SettlementError;
use crate::base::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tolerance and iteration bound shared by the calculator and optimizer.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use settle_up::SettlementConfig;
///
/// let config = SettlementConfig::default().with_tolerance(dec!(0.05));
/// assert_eq!(config.tolerance, dec!(0.05));
/// assert_eq!(config.max_iterations, 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Largest deviation from zero still treated as settled.
    pub tolerance: Decimal,
    /// Upper bound on matching steps before giving up.
    pub max_iterations: usize,
}

impl SettlementConfig {
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// # Errors
    ///
    /// [`SettlementError::InvalidTolerance`] if the tolerance is negative.
    pub fn validate(&self) -> Result<(), SettlementError> {
        validate_tolerance(self.tolerance)
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

pub(crate) fn validate_tolerance(tolerance: Decimal) -> Result<(), SettlementError> {
    if tolerance < Decimal::ZERO {
        return Err(SettlementError::InvalidTolerance(tolerance));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults() {
        let config = SettlementConfig::default();
        assert_eq!(config.tolerance, dec!(0.01));
        assert_eq!(config.max_iterations, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_tolerance_is_valid() {
        assert!(SettlementConfig::default().with_tolerance(Decimal::ZERO).validate().is_ok());
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let config = SettlementConfig::default().with_tolerance(dec!(-0.01));
        assert_eq!(config.validate(), Err(SettlementError::InvalidTolerance(dec!(-0.01))));
    }

    #[test]
    fn deserializes_partial_config() {
        let config: SettlementConfig = serde_json::from_str(r#"{"max_iterations": 5}"#).unwrap();
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.tolerance, dec!(0.01));

        let config: SettlementConfig = serde_json::from_str(r#"{"tolerance": "0.5"}"#).unwrap();
        assert_eq!(config.tolerance, dec!(0.5));
    }
}
