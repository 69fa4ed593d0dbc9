//! Two-pass rebalancing towards the target allocations.
//!
//! ```plain
//!  snapshot total ──► pass 1: drain ──────────────► pass 2: fill
//!                     unlocked strategies above      every strategy below
//!                     target return the excess       target receives the
//!                     to the idle balance            deficit from idle
//! ```
//!
//! Both passes use the same total, taken once at the start of the call.

use candid::Principal;

use crate::{
    journal::{JournalCollection, LogType},
    types::Role,
    utils::{
        error::{arithmetic_err, VaultResult},
        math::bps_of,
    },
};

use super::Vault;

impl Vault {
    /// Moves capital between strategies towards their targets. Manager only.
    pub fn rebalance(&mut self, caller: Principal) -> VaultResult<()> {
        self.gate.ensure_role(&caller, Role::Manager)?;
        self.gate.ensure_not_paused()?;

        let mut journal = JournalCollection::open();
        let total = self.total_assets()?;
        let allocations = self.allocations.snapshot();

        for allocation in allocations.iter().filter(|a| !a.strategy.has_lockup()) {
            let target = bps_of(total, allocation.target_bps)?;
            let current = allocation.strategy.total_assets();
            if current <= target {
                continue;
            }
            let withdrawn = allocation.strategy.withdraw(current - target, self.id)?;
            self.idle = self
                .idle
                .checked_add(withdrawn)
                .ok_or_else(|| arithmetic_err("Idle balance overflowed."))?;
            journal
                .append(Ok(()), LogType::Info)
                .strategy(allocation.strategy_id)
                .amount(withdrawn)
                .note("Drained excess above target.");
        }

        for allocation in allocations.iter() {
            let target = bps_of(total, allocation.target_bps)?;
            let current = allocation.strategy.total_assets();
            if current >= target {
                continue;
            }
            let amount = (target - current).min(self.idle);
            if amount == 0 {
                journal
                    .append(Ok(()), LogType::Info)
                    .strategy(allocation.strategy_id)
                    .note(format!("No idle balance left to fill a deficit of {}.", target - current));
                continue;
            }

            self.idle -= amount;
            if let Err(err) = allocation.strategy.deposit(amount) {
                self.idle += amount;
                journal
                    .append(Err(err.clone()), LogType::Rebalanced)
                    .strategy(allocation.strategy_id)
                    .amount(amount);
                return Err(err);
            }
            journal
                .append(Ok(()), LogType::Info)
                .strategy(allocation.strategy_id)
                .amount(amount)
                .note("Filled deficit below target.");
        }

        journal
            .append(Ok(()), LogType::Rebalanced)
            .amount(total)
            .note(format!("Rebalanced against a total of {}.", total));
        Ok(())
    }
}
