//! Withdrawal queue
//!
//! A redemption pays what is instantly available and queues the remainder as a
//! [`WithdrawalRequest`]. The queued amount is fixed at the redemption-time share
//! price and is claimable once unlocked strategies hold enough value.
//!
//! ```plain
//! Request State Machine:
//!
//!   ┌─────────┐   liquidity >= pending   ┌───────────┐  claim_withdraw  ┌─────────┐
//!   │ Created ├─────────────────────────►│ Claimable ├─────────────────►│ Claimed │
//!   └─────────┘◄─────────────────────────┴───────────┘                  └─────────┘
//!                  liquidity consumed
//!
//! `Claimable` is evaluated on demand by `can_claim` and never stored.
//! ```

use std::collections::BTreeMap;

use candid::{CandidType, Principal};
use serde::Deserialize;

use crate::{
    journal::{JournalCollection, LogType},
    types::{Redemption, RequestId},
    utils::{
        error::{arithmetic_err, VaultError, VaultResult},
        math::Rounding,
    },
};

use super::Vault;

/// Unsettled remainder of a redemption
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub id: RequestId,
    pub owner: Principal,
    /// Fixed at creation, never recomputed
    pub pending_assets: u128,
    /// Set once, irreversibly, by a successful claim
    pub claimed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WithdrawalQueue {
    requests: BTreeMap<RequestId, WithdrawalRequest>,
    /// Every request an owner created, claimed ones included
    by_owner: BTreeMap<Principal, Vec<RequestId>>,
    next_id: RequestId,
}

impl WithdrawalQueue {
    /// Records a new request and returns its id
    pub fn enqueue(&mut self, owner: Principal, pending_assets: u128) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.requests.insert(
            id,
            WithdrawalRequest {
                id,
                owner,
                pending_assets,
                claimed: false,
            },
        );
        self.by_owner.entry(owner).or_default().push(id);
        id
    }

    pub fn get(&self, id: RequestId) -> Option<&WithdrawalRequest> {
        self.requests.get(&id)
    }

    fn set_claimed(&mut self, id: RequestId, claimed: bool) {
        if let Some(request) = self.requests.get_mut(&id) {
            request.claimed = claimed;
        }
    }

    /// All request ids created by `owner`
    pub fn owner_requests(&self, owner: &Principal) -> &[RequestId] {
        self.by_owner.get(owner).map_or(&[], Vec::as_slice)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Vault {
    /// Assets paid for redeeming `shares` at the current price
    pub fn preview_redeem(&self, shares: u128) -> VaultResult<u128> {
        self.ledger.to_assets(shares, self.total_assets()?, Rounding::Down)
    }

    /// Redeems `shares` of the caller.
    ///
    /// The shares are valued and burned before any capital moves. The instantly
    /// available part is paid at once; the rest is queued under a new request.
    /// Shares worth less than one unit of the asset are rejected.
    pub fn request_withdraw(&mut self, caller: Principal, shares: u128) -> VaultResult<Redemption> {
        self.gate.ensure_not_paused()?;
        if shares == 0 {
            return Err(VaultError::SharesMustBePositive);
        }

        let assets = self.preview_redeem(shares)?;
        if assets == 0 {
            return Err(VaultError::RedemptionTooSmall);
        }
        let paid = assets.min(self.available_liquidity()?);

        let mut journal = JournalCollection::open();
        self.ledger.burn(caller, shares)?;
        if paid > 0 {
            if let Err(err) = self.pull_liquid_funds(paid, &mut journal) {
                self.ledger.mint(caller, shares)?;
                journal.append_note(
                    Err(err.clone()),
                    LogType::WithdrawalRequested,
                    "Liquidity pull failed. The burned shares were restored.",
                );
                return Err(err);
            }
            self.idle = self
                .idle
                .checked_sub(paid)
                .ok_or_else(|| arithmetic_err("Payout exceeded the idle balance."))?;
        }

        let pending = assets - paid;
        let request_id = (pending > 0).then(|| self.queue.enqueue(caller, pending));

        let entry = journal.append(Ok(()), LogType::WithdrawalRequested).amount(paid);
        match request_id {
            Some(id) => {
                entry.request(id).note(format!(
                    "{} redeemed {} shares for {}: paid {}, queued {}.",
                    caller, shares, assets, paid, pending
                ));
            }
            None => {
                entry.note(format!(
                    "{} redeemed {} shares for {}, settled instantly.",
                    caller, shares, assets
                ));
            }
        }

        Ok(Redemption {
            assets,
            paid,
            request_id,
        })
    }

    /// Pays out a queued request to its owner and returns the amount paid.
    ///
    /// The request is marked claimed before the liquidity pull. If the pull fails the
    /// mark is reverted, so a failed claim can be retried.
    pub fn claim_withdraw(&mut self, caller: Principal, id: RequestId) -> VaultResult<u128> {
        self.gate.ensure_not_paused()?;

        let request = self.queue.get(id).cloned().ok_or(VaultError::NonExistentValue)?;
        if request.owner != caller {
            return Err(VaultError::NotRequestOwner(id));
        }
        if request.claimed {
            return Err(VaultError::AlreadyClaimed(id));
        }

        let mut journal = JournalCollection::open();
        self.queue.set_claimed(id, true);

        if let Err(err) = self.pull_liquid_funds(request.pending_assets, &mut journal) {
            self.queue.set_claimed(id, false);
            journal
                .append(Err(err.clone()), LogType::WithdrawalClaimed)
                .request(id)
                .note("Liquidity pull failed. The request stays claimable.");
            return Err(err);
        }
        self.idle = self
            .idle
            .checked_sub(request.pending_assets)
            .ok_or_else(|| arithmetic_err("Payout exceeded the idle balance."))?;

        journal
            .append(Ok(()), LogType::WithdrawalClaimed)
            .request(id)
            .amount(request.pending_assets);
        Ok(request.pending_assets)
    }

    /// Whether the request could be claimed right now.
    /// Advisory only: other redemptions or claims may consume the same liquidity first.
    pub fn can_claim(&self, id: RequestId) -> bool {
        match self.queue.get(id) {
            Some(request) if !request.claimed => {
                self
                    .available_liquidity()
                    .is_ok_and(|liquidity| liquidity >= request.pending_assets)
            }
            _ => false,
        }
    }

    /// Unclaimed request ids of `owner`, oldest first
    pub fn user_withdrawal_requests(&self, owner: &Principal) -> Vec<RequestId> {
        self.queue
            .owner_requests(owner)
            .iter()
            .copied()
            .filter(|id| self.queue.get(*id).is_some_and(|request| !request.claimed))
            .collect()
    }

    pub fn withdrawal_request(&self, id: RequestId) -> Option<WithdrawalRequest> {
        self.queue.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{
        strategy::{MockStrategy, Strategy},
        vault::testing::{admin, allocate, manager, user, vault_with},
    };

    fn stranger() -> Principal {
        Principal::from_slice(&[77])
    }

    #[test]
    fn queue_ids_are_monotonic_from_zero() {
        let mut queue = WithdrawalQueue::default();
        assert_eq!(queue.enqueue(user(), 10), 0);
        assert_eq!(queue.enqueue(stranger(), 20), 1);
        assert_eq!(queue.enqueue(user(), 30), 2);
        assert_eq!(queue.owner_requests(&user()), &[0, 2]);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn fully_liquid_redemption_creates_no_request() {
        let (mut vault, strategies) = vault_with(&[false, false]);
        allocate(&mut vault, &[(0, 6000), (1, 4000)]);
        vault.deposit(user(), 1000, user()).unwrap();

        let redemption = vault.request_withdraw(user(), 400).unwrap();

        assert_eq!(
            redemption,
            Redemption {
                assets: 400,
                paid: 400,
                request_id: None
            }
        );
        assert_eq!(strategies[0].total_assets(), 200);
        assert_eq!(strategies[1].total_assets(), 400);
        assert!(vault.queue.is_empty());
        assert_eq!(vault.balance_of(&user()), 600);
        assert_eq!(vault.total_assets().unwrap(), 600);
    }

    #[test]
    fn illiquid_remainder_is_queued_at_the_redemption_price() {
        let (mut vault, strategies) = vault_with(&[false, true]);
        allocate(&mut vault, &[(0, 6000), (1, 4000)]);
        vault.deposit(user(), 1000, user()).unwrap();

        let redemption = vault.request_withdraw(user(), 1000).unwrap();
        assert_eq!(redemption.assets, 1000);
        assert_eq!(redemption.paid, 600);
        assert_eq!(redemption.paid + 400, redemption.assets);
        let id = redemption.request_id.unwrap();

        // later yield does not change the queued amount
        strategies[1].report(500);
        let request = vault.withdrawal_request(id).unwrap();
        assert_eq!(request.pending_assets, 400);
        assert!(!request.claimed);
        assert_eq!(vault.total_supply(), 0);
    }

    #[test]
    fn zero_and_excess_shares_are_rejected() {
        let (mut vault, _) = vault_with(&[false]);
        allocate(&mut vault, &[(0, 5000)]);
        vault.deposit(user(), 100, user()).unwrap();

        assert_eq!(vault.request_withdraw(user(), 0), Err(VaultError::SharesMustBePositive));
        assert_eq!(
            vault.request_withdraw(user(), 101),
            Err(VaultError::InsufficientShares {
                requested: 101,
                available: 100
            })
        );
        assert_eq!(vault.balance_of(&user()), 100);
    }

    #[test]
    fn only_the_owner_can_claim_and_only_once() {
        let (mut vault, strategies) = vault_with(&[false, true]);
        allocate(&mut vault, &[(0, 6000), (1, 4000)]);
        vault.deposit(user(), 1000, user()).unwrap();
        let id = vault.request_withdraw(user(), 1000).unwrap().request_id.unwrap();
        strategies[1].set_lockup(false);

        assert_eq!(vault.claim_withdraw(stranger(), id), Err(VaultError::NotRequestOwner(id)));
        assert_eq!(vault.claim_withdraw(user(), id), Ok(400));
        assert_eq!(vault.claim_withdraw(user(), id), Err(VaultError::AlreadyClaimed(id)));
        assert_eq!(strategies[1].total_assets(), 0);
        assert_eq!(vault.total_assets().unwrap(), 0);
        assert_eq!(vault.claim_withdraw(user(), id + 1), Err(VaultError::NonExistentValue));
    }

    #[test]
    fn failed_claim_stays_unclaimed() {
        let (mut vault, strategies) = vault_with(&[false, true]);
        allocate(&mut vault, &[(0, 6000), (1, 4000)]);
        vault.deposit(user(), 1000, user()).unwrap();
        let id = vault.request_withdraw(user(), 1000).unwrap().request_id.unwrap();

        assert!(!vault.can_claim(id));
        assert_eq!(
            vault.claim_withdraw(user(), id),
            Err(VaultError::InsufficientLiquidity { shortfall: 400 })
        );
        assert!(!vault.withdrawal_request(id).unwrap().claimed);
        assert_eq!(vault.user_withdrawal_requests(&user()), vec![id]);

        strategies[1].set_lockup(false);
        assert!(vault.can_claim(id));
        assert_eq!(vault.claim_withdraw(user(), id), Ok(400));
    }

    #[test]
    fn can_claim_is_not_a_reservation() {
        let (mut vault, strategies) = vault_with(&[true, false]);
        allocate(&mut vault, &[(0, 6000), (1, 4000)]);
        vault.deposit(user(), 1000, user()).unwrap();
        vault.deposit(stranger(), 1000, stranger()).unwrap();

        let first = vault.request_withdraw(user(), 1000).unwrap();
        assert_eq!((first.paid, first.assets), (800, 1000));
        let second = vault.request_withdraw(stranger(), 1000).unwrap();
        assert_eq!((second.paid, second.assets), (0, 1200));
        let (first, second) = (first.request_id.unwrap(), second.request_id.unwrap());

        strategies[0].set_lockup(false);
        assert!(vault.can_claim(first));
        assert!(vault.can_claim(second));

        vault.claim_withdraw(stranger(), second).unwrap();
        assert!(!vault.can_claim(first));
    }

    #[test]
    fn pending_list_hides_claimed_requests() {
        let (mut vault, strategies) = vault_with(&[true]);
        allocate(&mut vault, &[(0, 5000)]);
        vault.deposit(user(), 1000, user()).unwrap();

        let first = vault.request_withdraw(user(), 800).unwrap();
        assert_eq!(first.paid, 500);
        let second = vault.request_withdraw(user(), 200).unwrap();
        assert_eq!(second.paid, 0);
        let (first, second) = (first.request_id.unwrap(), second.request_id.unwrap());
        assert_eq!(vault.user_withdrawal_requests(&user()), vec![first, second]);

        strategies[0].set_lockup(false);
        vault.claim_withdraw(user(), first).unwrap();
        assert_eq!(vault.user_withdrawal_requests(&user()), vec![second]);
        assert_eq!(vault.queue.owner_requests(&user()), &[first, second]);
    }

    #[test]
    fn failed_pull_restores_burned_shares() {
        let (mut vault, _) = vault_with(&[]);
        vault.deposit(user(), 1000, user()).unwrap();

        // reports value it never returns
        let mut hollow = MockStrategy::new();
        hollow.expect_has_lockup().return_const(false);
        hollow.expect_total_assets().return_const(500u128);
        hollow.expect_withdraw().returning(|_, _| Ok(0));
        vault
            .register_strategy(manager(), 5, Rc::new(hollow) as Rc<dyn Strategy>)
            .unwrap();
        allocate(&mut vault, &[(5, 1000)]);

        let total_before = vault.total_assets().unwrap();
        let result = vault.request_withdraw(user(), 1000);

        assert_eq!(result, Err(VaultError::InsufficientLiquidity { shortfall: 500 }));
        assert_eq!(vault.balance_of(&user()), 1000);
        assert_eq!(vault.total_supply(), 1000);
        assert_eq!(vault.total_assets().unwrap(), total_before);
        assert!(vault.queue.is_empty());
    }

    #[test]
    fn paused_vault_rejects_withdrawals_but_not_views() {
        let (mut vault, _) = vault_with(&[true]);
        allocate(&mut vault, &[(0, 5000)]);
        vault.deposit(user(), 1000, user()).unwrap();
        let id = vault.request_withdraw(user(), 1000).unwrap().request_id.unwrap();

        vault.pause(admin()).unwrap();
        assert_eq!(vault.request_withdraw(user(), 1), Err(VaultError::EnginePaused));
        assert_eq!(vault.claim_withdraw(user(), id), Err(VaultError::EnginePaused));
        assert!(!vault.can_claim(id));
        assert_eq!(vault.total_assets().unwrap(), 500);
        assert_eq!(vault.available_liquidity().unwrap(), 0);
    }

    #[test]
    fn dust_redemption_keeps_the_shares() {
        let (mut vault, strategies) = vault_with(&[false]);
        allocate(&mut vault, &[(0, 5000)]);
        vault.deposit(user(), 1000, user()).unwrap();
        // a loss leaves one share worth half a unit
        strategies[0].report(0);

        assert_eq!(vault.preview_redeem(1), Ok(0));
        assert_eq!(vault.request_withdraw(user(), 1), Err(VaultError::RedemptionTooSmall));
        assert_eq!(vault.balance_of(&user()), 1000);
        assert_eq!(vault.total_supply(), 1000);
        assert!(vault.queue.is_empty());
    }
}
