//! Access gate: role assignments and the pause flag
//!
//! The gate is created together with the vault and owned by it. Mutating vault
//! entry points consult it first; views never do.

use std::collections::BTreeSet;

use candid::{CandidType, Principal};
use serde::Deserialize;

use crate::{
    types::Role,
    utils::{
        common::time_nanos,
        error::{VaultError, VaultResult},
    },
};

/// Pause status of the vault
#[derive(Clone, CandidType, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum PauseStatus {
    /// Functioning as expected
    #[default]
    Functional,
    /// Mutating entry points are rejected
    Paused {
        /// Timestamp of the pause in nanoseconds
        paused_at: u64,
    },
}

/// Role assignments and pause flag
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessGate {
    admins: BTreeSet<Principal>,
    managers: BTreeSet<Principal>,
    status: PauseStatus,
}

impl AccessGate {
    pub fn new<A, M>(admins: A, managers: M) -> Self
    where
        A: IntoIterator<Item = Principal>,
        M: IntoIterator<Item = Principal>,
    {
        Self {
            admins: admins.into_iter().collect(),
            managers: managers.into_iter().collect(),
            status: PauseStatus::Functional,
        }
    }

    fn members(&self, role: Role) -> &BTreeSet<Principal> {
        match role {
            Role::Admin => &self.admins,
            Role::Manager => &self.managers,
        }
    }

    fn members_mut(&mut self, role: Role) -> &mut BTreeSet<Principal> {
        match role {
            Role::Admin => &mut self.admins,
            Role::Manager => &mut self.managers,
        }
    }

    pub fn has_role(&self, principal: &Principal, role: Role) -> bool {
        self.members(role).contains(principal)
    }

    /// Returns Err if `caller` does not hold `role`
    pub fn ensure_role(&self, caller: &Principal, role: Role) -> VaultResult<()> {
        if !self.has_role(caller, role) {
            return Err(VaultError::Unauthorized);
        }
        Ok(())
    }

    /// Returns Err while the vault is paused
    pub fn ensure_not_paused(&self) -> VaultResult<()> {
        if self.is_paused() {
            return Err(VaultError::EnginePaused);
        }
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.status, PauseStatus::Paused { .. })
    }

    pub fn status(&self) -> &PauseStatus {
        &self.status
    }

    pub fn pause(&mut self, caller: &Principal) -> VaultResult<()> {
        self.ensure_role(caller, Role::Admin)?;
        self.ensure_not_paused()?;
        self.status = PauseStatus::Paused {
            paused_at: time_nanos(),
        };
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Principal) -> VaultResult<()> {
        self.ensure_role(caller, Role::Admin)?;
        if !self.is_paused() {
            return Err(VaultError::Custom("The vault is not paused.".to_string()));
        }
        self.status = PauseStatus::Functional;
        Ok(())
    }

    /// Grants `role` to `account`. Returns `false` if it was already held.
    pub fn grant_role(&mut self, caller: &Principal, account: Principal, role: Role) -> VaultResult<bool> {
        self.ensure_role(caller, Role::Admin)?;
        Ok(self.members_mut(role).insert(account))
    }

    /// Revokes `role` from `account`. Returns `false` if it was not held.
    pub fn revoke_role(&mut self, caller: &Principal, account: Principal, role: Role) -> VaultResult<bool> {
        self.ensure_role(caller, Role::Admin)?;
        Ok(self.members_mut(role).remove(&account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Principal {
        Principal::from_slice(&[1])
    }

    fn manager() -> Principal {
        Principal::from_slice(&[2])
    }

    fn gate() -> AccessGate {
        AccessGate::new([admin()], [manager()])
    }

    #[test]
    fn roles_are_distinct() {
        let gate = gate();
        assert!(gate.ensure_role(&admin(), Role::Admin).is_ok());
        assert_eq!(gate.ensure_role(&admin(), Role::Manager), Err(VaultError::Unauthorized));
        assert_eq!(gate.ensure_role(&manager(), Role::Admin), Err(VaultError::Unauthorized));
    }

    #[test]
    fn only_admin_toggles_pause() {
        let mut gate = gate();
        assert_eq!(gate.pause(&manager()), Err(VaultError::Unauthorized));
        assert!(!gate.is_paused());

        gate.pause(&admin()).unwrap();
        assert!(gate.is_paused());
        assert_eq!(gate.ensure_not_paused(), Err(VaultError::EnginePaused));
        assert_eq!(gate.pause(&admin()), Err(VaultError::EnginePaused));

        assert_eq!(gate.unpause(&manager()), Err(VaultError::Unauthorized));
        gate.unpause(&admin()).unwrap();
        assert_eq!(gate.status(), &PauseStatus::Functional);
        assert!(gate.unpause(&admin()).is_err());
    }

    #[test]
    fn grant_and_revoke() {
        let mut gate = gate();
        let newcomer = Principal::from_slice(&[3]);

        assert_eq!(gate.grant_role(&manager(), newcomer, Role::Manager), Err(VaultError::Unauthorized));
        assert_eq!(gate.grant_role(&admin(), newcomer, Role::Manager), Ok(true));
        assert_eq!(gate.grant_role(&admin(), newcomer, Role::Manager), Ok(false));
        assert!(gate.has_role(&newcomer, Role::Manager));

        assert_eq!(gate.revoke_role(&admin(), newcomer, Role::Manager), Ok(true));
        assert!(!gate.has_role(&newcomer, Role::Manager));
    }
}
