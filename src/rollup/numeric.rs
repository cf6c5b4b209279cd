//! Additive accumulator types
//!
//! - `Counter` - plain integer count, overflow is an error
//! - `CoinVector` - per-denomination token amounts with unbounded magnitudes
//! - `BigTotal` - unbounded integer total (bytes)

use crate::error::{Result, StatisticsError};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Bytes in one gigabyte as used by subscription quotas
pub fn bytes_per_gigabyte() -> BigUint {
    BigUint::from(1_000_000_000u64)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter(i64);

impl Counter {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Add `n`, failing instead of wrapping
    pub fn add(&mut self, n: i64, metric: &'static str) -> Result<()> {
        self.0 = self
            .0
            .checked_add(n)
            .ok_or(StatisticsError::CounterOverflow { metric })?;
        Ok(())
    }

    pub fn incr(&mut self, metric: &'static str) -> Result<()> {
        self.add(1, metric)
    }
}

/// Token amounts keyed by denomination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinVector {
    amounts: BTreeMap<String, BigUint>,
}

/// Cosmos-style coin as stored by the ingestion pipeline
#[derive(Debug, Deserialize)]
struct RawCoin {
    denom: String,
    amount: String,
}

impl CoinVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored coin array such as `[{"denom":"usent","amount":"100"}]`
    ///
    /// Repeated denominations are summed. Any amount that is not a
    /// non-negative decimal integer is rejected.
    pub fn parse(json: &str) -> std::result::Result<Self, String> {
        let raw: Vec<RawCoin> =
            serde_json::from_str(json).map_err(|e| format!("invalid coins {}: {}", json, e))?;

        let mut coins = CoinVector::new();
        for coin in raw {
            if coin.denom.is_empty() {
                return Err(format!("empty denomination in {}", json));
            }
            let amount = BigUint::from_str(&coin.amount)
                .map_err(|_| format!("invalid amount {:?} for {}", coin.amount, coin.denom))?;
            coins.add_amount(&coin.denom, &amount);
        }

        Ok(coins)
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        let mut coins = CoinVector::new();
        for (denom, amount) in pairs {
            coins.add_amount(denom, &BigUint::from(amount));
        }
        coins
    }

    fn add_amount(&mut self, denom: &str, amount: &BigUint) {
        match self.amounts.get_mut(denom) {
            Some(existing) => *existing += amount,
            None => {
                self.amounts.insert(denom.to_string(), amount.clone());
            }
        }
    }

    /// Merge `other` into self; `None` is a no-op
    pub fn add(&mut self, other: Option<&CoinVector>) {
        let Some(other) = other else {
            return;
        };
        for (denom, amount) in &other.amounts {
            self.add_amount(denom, amount);
        }
    }

    pub fn amount_of(&self, denom: &str) -> BigUint {
        self.amounts.get(denom).cloned().unwrap_or_else(BigUint::zero)
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// Denomination to decimal-string amount, the published value shape
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.amounts
            .iter()
            .map(|(denom, amount)| (denom.clone(), amount.to_str_radix(10)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BigTotal(BigUint);

impl BigTotal {
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn add(&mut self, n: &BigUint) {
        self.0 += n;
    }

    /// Add `count * unit` without going through a fixed-width product
    pub fn add_scaled(&mut self, count: u64, unit: &BigUint) {
        self.0 += BigUint::from(count) * unit;
    }
}

impl std::fmt::Display for BigTotal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
