//! Aggregate value, instantly available liquidity and the shared liquidity pull.
//!
//! Values are read from the strategies on every call. Strategy values and lock
//! status can change between two calls, so nothing here is cached.

use crate::{
    journal::{JournalCollection, LogType},
    utils::error::{arithmetic_err, VaultError, VaultResult},
};

use super::{allocation::Allocation, Vault};

impl Vault {
    /// Idle balance plus the value of every allocated strategy
    pub fn total_assets(&self) -> VaultResult<u128> {
        self.sum_with_idle(self.allocations.iter())
    }

    /// Idle balance plus the value of the allocated strategies without a lockup
    pub fn available_liquidity(&self) -> VaultResult<u128> {
        self.sum_with_idle(
            self.allocations
                .iter()
                .filter(|allocation| !allocation.strategy.has_lockup()),
        )
    }

    fn sum_with_idle<'a>(&self, allocations: impl Iterator<Item = &'a Allocation>) -> VaultResult<u128> {
        allocations.try_fold(self.idle, |total, allocation| {
            total
                .checked_add(allocation.strategy.total_assets())
                .ok_or_else(|| arithmetic_err("Aggregate value overflowed."))
        })
    }

    /// Principal held directly by the vault
    pub fn idle_balance(&self) -> u128 {
        self.idle
    }

    /// Makes sure at least `amount` is idle, withdrawing the missing part from the
    /// unlocked strategies in allocation order.
    ///
    /// Earlier strategies in the list are always drained first. Fails with
    /// `InsufficientLiquidity` if the unlocked strategies cannot cover the amount,
    /// which only happens when liquidity changed since the caller checked it.
    pub(super) fn pull_liquid_funds(&mut self, amount: u128, journal: &mut JournalCollection) -> VaultResult<()> {
        let mut remaining = amount.saturating_sub(self.idle);

        for allocation in self.allocations.snapshot() {
            if remaining == 0 {
                break;
            }
            if allocation.strategy.has_lockup() {
                continue;
            }
            let value = allocation.strategy.total_assets();
            if value == 0 {
                continue;
            }

            let take = value.min(remaining);
            remaining -= take;
            let withdrawn = allocation.strategy.withdraw(take, self.id)?;
            self.idle = self
                .idle
                .checked_add(withdrawn)
                .ok_or_else(|| arithmetic_err("Idle balance overflowed."))?;
            // a short return leaves the gap for the next strategies
            remaining += take.saturating_sub(withdrawn);

            journal
                .append(Ok(()), LogType::Info)
                .strategy(allocation.strategy_id)
                .amount(withdrawn)
                .note("Pulled liquidity from strategy.");
        }

        if remaining != 0 {
            return Err(VaultError::InsufficientLiquidity {
                shortfall: remaining,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use candid::Principal;

    use super::*;
    use crate::{
        strategy::{MockStrategy, Strategy},
        types::AllocationInput,
        vault::testing::{allocate, manager, user, vault_with},
    };

    #[test]
    fn locked_strategies_count_towards_total_but_not_liquidity() {
        let (mut vault, strategies) = vault_with(&[false, true]);
        allocate(&mut vault, &[(0, 6000), (1, 4000)]);
        vault.deposit(user(), 1000, user()).unwrap();

        assert_eq!(vault.total_assets().unwrap(), 1000);
        assert_eq!(vault.available_liquidity().unwrap(), 600);

        strategies[1].set_lockup(false);
        assert_eq!(vault.available_liquidity().unwrap(), 1000);
    }

    #[test]
    fn pull_uses_idle_first_then_list_order() {
        let (mut vault, strategies) = vault_with(&[false, false]);
        allocate(&mut vault, &[(0, 4000), (1, 4000)]);
        vault.deposit(user(), 1000, user()).unwrap();
        assert_eq!(vault.idle_balance(), 200);

        let mut journal = JournalCollection::open();
        vault.pull_liquid_funds(500, &mut journal).unwrap();

        assert_eq!(vault.idle_balance(), 500);
        assert_eq!(strategies[0].total_assets(), 100);
        assert_eq!(strategies[1].total_assets(), 400);
    }

    #[test]
    fn pull_skips_locked_strategies_and_reports_shortfall() {
        let (mut vault, strategies) = vault_with(&[true, false]);
        allocate(&mut vault, &[(0, 5000), (1, 5000)]);
        vault.deposit(user(), 1000, user()).unwrap();

        let mut journal = JournalCollection::open();
        assert_eq!(
            vault.pull_liquid_funds(800, &mut journal),
            Err(VaultError::InsufficientLiquidity { shortfall: 300 })
        );
        assert_eq!(strategies[0].total_assets(), 500);
        assert_eq!(strategies[1].total_assets(), 0);
        assert_eq!(vault.idle_balance(), 500);
        assert_eq!(vault.total_assets().unwrap(), 1000);
    }

    #[test]
    fn short_withdrawal_moves_on_to_the_next_strategy() {
        let (mut vault, strategies) = vault_with(&[false]);

        let mut stingy = MockStrategy::new();
        stingy.expect_has_lockup().return_const(false);
        stingy.expect_total_assets().return_const(300u128);
        stingy
            .expect_withdraw()
            .times(1)
            .returning(|amount, _| Ok(amount / 2));
        let stingy: Rc<dyn Strategy> = Rc::new(stingy);
        vault.register_strategy(manager(), 9, stingy).unwrap();
        vault
            .set_allocations(
                manager(),
                vec![
                    AllocationInput {
                        strategy_id: 9,
                        target_bps: 1000,
                    },
                    AllocationInput {
                        strategy_id: 0,
                        target_bps: 1000,
                    },
                ],
            )
            .unwrap();
        strategies[0].deposit(500).unwrap();

        let mut journal = JournalCollection::open();
        vault.pull_liquid_funds(400, &mut journal).unwrap();

        // 150 from the stingy strategy, the 250 gap from the next one
        assert_eq!(vault.idle_balance(), 400);
        assert_eq!(strategies[0].total_assets(), 250);
    }

    #[test]
    fn withdrawals_go_to_the_vault() {
        let (mut vault, _) = vault_with(&[]);
        let vault_id = vault.id();

        let mut strategy = MockStrategy::new();
        strategy.expect_has_lockup().return_const(false);
        strategy.expect_total_assets().return_const(100u128);
        strategy
            .expect_withdraw()
            .withf(move |amount, to| *amount == 100 && *to == vault_id)
            .times(1)
            .returning(|amount, _| Ok(amount));
        let strategy: Rc<dyn Strategy> = Rc::new(strategy);
        vault.register_strategy(manager(), 1, strategy).unwrap();
        allocate(&mut vault, &[(1, 1000)]);

        let mut journal = JournalCollection::open();
        vault.pull_liquid_funds(100, &mut journal).unwrap();
        assert_ne!(vault_id, Principal::anonymous());
    }

    #[test]
    fn overflowing_aggregate_value_is_an_error() {
        let (mut vault, strategies) = vault_with(&[false, true]);
        allocate(&mut vault, &[(0, 5000), (1, 5000)]);
        strategies[0].report(u128::MAX);
        strategies[1].report(1);

        assert!(matches!(vault.total_assets(), Err(VaultError::Arithmetic(_))));
        assert_eq!(vault.available_liquidity(), Ok(u128::MAX));
        assert!(matches!(vault.deposit(user(), 1, user()), Err(VaultError::Arithmetic(_))));
    }
}
