//! Book-entry strategy held inside the canister
//!
//! Tracks the principal deposited by the vault as a book balance. The off-canister
//! position behind it is operated by a manager, who reports its current value
//! (including yield or losses) and toggles the lockup period.

use std::cell::Cell;

use candid::Principal;

use crate::utils::error::{arithmetic_err, VaultResult};

use super::Strategy;

/// Strategy whose value and lock status are reported by a manager
#[derive(Debug, Default)]
pub struct BookStrategy {
    /// Current value held for the vault
    balance: Cell<u128>,
    /// Lockup status. Withdrawals return nothing while set.
    locked: Cell<bool>,
}

impl BookStrategy {
    pub fn new(has_lockup: bool) -> Self {
        Self {
            balance: Cell::new(0),
            locked: Cell::new(has_lockup),
        }
    }

    /// Overwrites the current value with a reported one
    pub fn report(&self, total_assets: u128) -> &Self {
        self.balance.set(total_assets);
        self
    }

    /// Sets the lockup status
    pub fn set_lockup(&self, locked: bool) -> &Self {
        self.locked.set(locked);
        self
    }
}

impl Strategy for BookStrategy {
    fn deposit(&self, amount: u128) -> VaultResult<()> {
        let balance = self
            .balance
            .get()
            .checked_add(amount)
            .ok_or_else(|| arithmetic_err("Strategy balance overflowed."))?;
        self.balance.set(balance);
        Ok(())
    }

    fn withdraw(&self, amount: u128, _to: Principal) -> VaultResult<u128> {
        if self.locked.get() {
            return Ok(0);
        }
        let withdrawn = amount.min(self.balance.get());
        self.balance.set(self.balance.get() - withdrawn);
        Ok(withdrawn)
    }

    fn total_assets(&self) -> u128 {
        self.balance.get()
    }

    fn has_lockup(&self) -> bool {
        self.locked.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_and_withdraw_move_the_balance() {
        let strategy = BookStrategy::new(false);
        strategy.deposit(600).unwrap();
        assert_eq!(strategy.withdraw(200, Principal::anonymous()), Ok(200));
        assert_eq!(strategy.total_assets(), 400);
    }

    #[test]
    fn withdraw_is_capped_by_the_balance() {
        let strategy = BookStrategy::new(false);
        strategy.deposit(100).unwrap();
        assert_eq!(strategy.withdraw(250, Principal::anonymous()), Ok(100));
        assert_eq!(strategy.total_assets(), 0);
    }

    #[test]
    fn locked_strategy_returns_nothing() {
        let strategy = BookStrategy::new(true);
        strategy.deposit(400).unwrap();
        assert!(strategy.has_lockup());
        assert_eq!(strategy.withdraw(400, Principal::anonymous()), Ok(0));
        assert_eq!(strategy.total_assets(), 400);

        strategy.set_lockup(false);
        assert_eq!(strategy.withdraw(400, Principal::anonymous()), Ok(400));
    }

    #[test]
    fn report_overwrites_the_value() {
        let strategy = BookStrategy::new(false);
        strategy.deposit(600).unwrap();
        strategy.report(660);
        assert_eq!(strategy.total_assets(), 660);
    }
}
