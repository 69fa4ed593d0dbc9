use crate::{
    access::PauseStatus,
    api::{init_state, report_strategy_assets, set_strategy_lockup},
    journal::JournalEntry,
    state::{journal_entries, with_vault, with_vault_mut},
    timers::start_timers,
    types::{AllocationInput, AllocationQuery, InitArgs, Redemption, RequestId, Role, StrategyId},
    utils::error::VaultResult,
    vault::withdrawal::WithdrawalRequest,
};
use ic_canister::{generate_idl, init, query, update, Canister, Idl, PreUpdate};
use ic_exports::{
    candid::Principal,
    ic_cdk::{api::trap, caller},
};

#[derive(Canister)]
pub struct VaultManager {
    #[id]
    id: Principal,
}

impl PreUpdate for VaultManager {}

impl VaultManager {
    // INITIALIZATION
    #[init]
    pub fn init(&mut self, args: InitArgs) {
        if let Err(err) = init_state(self.id, args) {
            trap(&format!("Vault initialization failed: {:?}", err));
        }
        start_timers();
    }

    // CONFIGURATION
    #[update]
    pub fn set_allocations(&mut self, allocations: Vec<AllocationInput>) -> VaultResult<()> {
        let caller = caller();
        with_vault_mut(|vault| vault.set_allocations(caller, allocations))
    }

    #[update]
    pub fn report_strategy_assets(&mut self, strategy_id: StrategyId, total_assets: u128) -> VaultResult<()> {
        report_strategy_assets(caller(), strategy_id, total_assets)
    }

    #[update]
    pub fn set_strategy_lockup(&mut self, strategy_id: StrategyId, locked: bool) -> VaultResult<()> {
        set_strategy_lockup(caller(), strategy_id, locked)
    }

    #[update]
    pub fn rebalance(&mut self) -> VaultResult<()> {
        let caller = caller();
        with_vault_mut(|vault| vault.rebalance(caller))
    }

    // ACCESS
    #[update]
    pub fn pause(&mut self) -> VaultResult<()> {
        let caller = caller();
        with_vault_mut(|vault| vault.pause(caller))
    }

    #[update]
    pub fn unpause(&mut self) -> VaultResult<()> {
        let caller = caller();
        with_vault_mut(|vault| vault.unpause(caller))
    }

    #[update]
    pub fn grant_role(&mut self, account: Principal, role: Role) -> VaultResult<bool> {
        let caller = caller();
        with_vault_mut(|vault| vault.grant_role(caller, account, role))
    }

    #[update]
    pub fn revoke_role(&mut self, account: Principal, role: Role) -> VaultResult<bool> {
        let caller = caller();
        with_vault_mut(|vault| vault.revoke_role(caller, account, role))
    }

    // SHARES
    #[update]
    pub fn deposit(&mut self, assets: u128, receiver: Principal) -> VaultResult<u128> {
        let caller = caller();
        with_vault_mut(|vault| vault.deposit(caller, assets, receiver))
    }

    #[update]
    pub fn mint(&mut self, shares: u128, receiver: Principal) -> VaultResult<u128> {
        let caller = caller();
        with_vault_mut(|vault| vault.mint(caller, shares, receiver))
    }

    #[update]
    pub fn request_withdraw(&mut self, shares: u128) -> VaultResult<Redemption> {
        let caller = caller();
        with_vault_mut(|vault| vault.request_withdraw(caller, shares))
    }

    #[update]
    pub fn claim_withdraw(&mut self, request_id: RequestId) -> VaultResult<u128> {
        let caller = caller();
        with_vault_mut(|vault| vault.claim_withdraw(caller, request_id))
    }

    // QUERIES
    #[query]
    pub fn total_assets(&self) -> VaultResult<u128> {
        with_vault(|vault| vault.total_assets())?
    }

    #[query]
    pub fn available_liquidity(&self) -> VaultResult<u128> {
        with_vault(|vault| vault.available_liquidity())?
    }

    #[query]
    pub fn idle_balance(&self) -> VaultResult<u128> {
        with_vault(|vault| vault.idle_balance())
    }

    #[query]
    pub fn total_supply(&self) -> VaultResult<u128> {
        with_vault(|vault| vault.total_supply())
    }

    #[query]
    pub fn balance_of(&self, owner: Principal) -> VaultResult<u128> {
        with_vault(|vault| vault.balance_of(&owner))
    }

    #[query]
    pub fn convert_to_shares(&self, assets: u128) -> VaultResult<u128> {
        with_vault(|vault| vault.convert_to_shares(assets))?
    }

    #[query]
    pub fn convert_to_assets(&self, shares: u128) -> VaultResult<u128> {
        with_vault(|vault| vault.convert_to_assets(shares))?
    }

    #[query]
    pub fn preview_deposit(&self, assets: u128) -> VaultResult<u128> {
        with_vault(|vault| vault.preview_deposit(assets))?
    }

    #[query]
    pub fn preview_mint(&self, shares: u128) -> VaultResult<u128> {
        with_vault(|vault| vault.preview_mint(shares))?
    }

    #[query]
    pub fn preview_redeem(&self, shares: u128) -> VaultResult<u128> {
        with_vault(|vault| vault.preview_redeem(shares))?
    }

    #[query]
    pub fn can_claim(&self, request_id: RequestId) -> VaultResult<bool> {
        with_vault(|vault| vault.can_claim(request_id))
    }

    #[query]
    pub fn get_user_withdrawal_requests(&self, owner: Principal) -> VaultResult<Vec<RequestId>> {
        with_vault(|vault| vault.user_withdrawal_requests(&owner))
    }

    #[query]
    pub fn get_withdrawal_request(&self, request_id: RequestId) -> VaultResult<Option<WithdrawalRequest>> {
        with_vault(|vault| vault.withdrawal_request(request_id))
    }

    #[query]
    pub fn get_allocations(&self) -> VaultResult<Vec<AllocationQuery>> {
        with_vault(|vault| vault.allocations())
    }

    #[query]
    pub fn get_strategies(&self) -> VaultResult<Vec<StrategyId>> {
        with_vault(|vault| vault.strategy_ids())
    }

    #[query]
    pub fn get_pause_status(&self) -> VaultResult<PauseStatus> {
        with_vault(|vault| vault.pause_status())
    }

    #[query]
    pub fn is_paused(&self) -> VaultResult<bool> {
        with_vault(|vault| vault.is_paused())
    }

    #[query]
    pub fn has_role(&self, account: Principal, role: Role) -> VaultResult<bool> {
        with_vault(|vault| vault.has_role(&account, role))
    }

    #[query]
    pub fn get_logs(&self, depth: u64) -> Vec<JournalEntry> {
        journal_entries(depth)
    }

    pub fn idl() -> Idl {
        generate_idl!()
    }
}
