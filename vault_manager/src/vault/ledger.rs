//! Share ledger
//!
//! Proportional ownership of the pooled value. The share price is
//! `total_assets / total_supply`; an empty ledger converts one to one.

use std::collections::BTreeMap;

use candid::Principal;

use crate::utils::{
    error::{arithmetic_err, VaultError, VaultResult},
    math::{mul_div, Rounding},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShareLedger {
    balances: BTreeMap<Principal, u128>,
    total_supply: u128,
}

impl ShareLedger {
    pub fn balance_of(&self, owner: &Principal) -> u128 {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Converts `assets` to shares given the current aggregate value
    pub fn to_shares(&self, assets: u128, total_assets: u128, rounding: Rounding) -> VaultResult<u128> {
        if self.total_supply == 0 {
            return Ok(assets);
        }
        if total_assets == 0 {
            return Err(arithmetic_err("Outstanding shares are not backed by any assets."));
        }
        mul_div(assets, self.total_supply, total_assets, rounding)
    }

    /// Converts `shares` to assets given the current aggregate value
    pub fn to_assets(&self, shares: u128, total_assets: u128, rounding: Rounding) -> VaultResult<u128> {
        if self.total_supply == 0 {
            return Ok(shares);
        }
        mul_div(shares, total_assets, self.total_supply, rounding)
    }

    pub fn mint(&mut self, to: Principal, shares: u128) -> VaultResult<()> {
        let total_supply = self
            .total_supply
            .checked_add(shares)
            .ok_or_else(|| arithmetic_err("Total supply overflowed."))?;
        let balance = self.balances.entry(to).or_default();
        *balance += shares;
        self.total_supply = total_supply;
        Ok(())
    }

    pub fn burn(&mut self, from: Principal, shares: u128) -> VaultResult<()> {
        let available = self.balance_of(&from);
        if shares > available {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        if available == shares {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, available - shares);
        }
        self.total_supply -= shares;
        Ok(())
    }
}
