//! Deposits, mints and the post-deposit routing hook

use candid::Principal;

use crate::{
    journal::{JournalCollection, LogType},
    utils::{
        error::{arithmetic_err, VaultError, VaultResult},
        math::{bps_of, Rounding},
    },
};

use super::Vault;

impl Vault {
    /// Shares minted for `assets` at the current price
    pub fn preview_deposit(&self, assets: u128) -> VaultResult<u128> {
        self.ledger.to_shares(assets, self.total_assets()?, Rounding::Down)
    }

    /// Assets required to mint `shares` at the current price
    pub fn preview_mint(&self, shares: u128) -> VaultResult<u128> {
        self.ledger.to_assets(shares, self.total_assets()?, Rounding::Up)
    }

    /// Deposits `assets` on behalf of `receiver` and returns the minted shares.
    pub fn deposit(&mut self, caller: Principal, assets: u128, receiver: Principal) -> VaultResult<u128> {
        self.gate.ensure_not_paused()?;
        if assets == 0 {
            return Err(VaultError::AssetsMustBePositive);
        }
        let shares = self.preview_deposit(assets)?;
        if shares == 0 {
            return Err(VaultError::DepositTooSmall);
        }
        self.settle_deposit(caller, receiver, assets, shares)?;
        Ok(shares)
    }

    /// Mints exactly `shares` to `receiver` and returns the assets taken.
    pub fn mint(&mut self, caller: Principal, shares: u128, receiver: Principal) -> VaultResult<u128> {
        self.gate.ensure_not_paused()?;
        if shares == 0 {
            return Err(VaultError::SharesMustBePositive);
        }
        let assets = self.preview_mint(shares)?;
        if assets == 0 {
            return Err(VaultError::AssetsMustBePositive);
        }
        self.settle_deposit(caller, receiver, assets, shares)?;
        Ok(assets)
    }

    fn settle_deposit(
        &mut self,
        caller: Principal,
        receiver: Principal,
        assets: u128,
        shares: u128,
    ) -> VaultResult<()> {
        let mut journal = JournalCollection::open();

        self.idle = self
            .idle
            .checked_add(assets)
            .ok_or_else(|| arithmetic_err("Idle balance overflowed."))?;
        self.ledger.mint(receiver, shares)?;
        journal.append(Ok(()), LogType::Deposit).amount(assets).note(format!(
            "{} deposited {} for {}, minting {} shares.",
            caller, assets, receiver, shares
        ));

        self.route_deposit(assets, &mut journal)
    }

    /// Pushes a fresh deposit into the strategies.
    ///
    /// Each strategy receives its proportional share of `assets`, limited to the
    /// headroom below its target of the post-deposit total. Strategies already at or
    /// above that target receive nothing. Whatever is not routed stays idle.
    fn route_deposit(&mut self, assets: u128, journal: &mut JournalCollection) -> VaultResult<()> {
        let new_total = self.total_assets()?;

        for allocation in self.allocations.snapshot() {
            let max_allowed = bps_of(new_total, allocation.target_bps)?;
            let current = allocation.strategy.total_assets();
            if current >= max_allowed {
                journal
                    .append(Ok(()), LogType::Info)
                    .strategy(allocation.strategy_id)
                    .note(format!(
                        "Skipped routing: strategy holds {} against a cap of {}.",
                        current, max_allowed
                    ));
                continue;
            }

            let proportional_share = bps_of(assets, allocation.target_bps)?;
            let amount = proportional_share.min(max_allowed - current);
            if amount == 0 {
                continue;
            }

            self.idle = self
                .idle
                .checked_sub(amount)
                .ok_or_else(|| arithmetic_err("Routing exceeded the idle balance."))?;
            if let Err(err) = allocation.strategy.deposit(amount) {
                self.idle += amount;
                journal
                    .append(Err(err.clone()), LogType::Deposit)
                    .strategy(allocation.strategy_id)
                    .amount(amount);
                return Err(err);
            }
            journal
                .append(Ok(()), LogType::Deposit)
                .strategy(allocation.strategy_id)
                .amount(amount);
        }

        Ok(())
    }
}
