//! Generates the candid file automatically

use vault_manager::VaultManager;

fn main() {
    let canister_idl = VaultManager::idl();
    let idl = candid::pretty::candid::compile(&canister_idl.env.env, &Some(canister_idl.actor));

    println!("{}", idl);
}
