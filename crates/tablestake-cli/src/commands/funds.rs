//! Sandbox token commands: mint, approve, balance.

use crate::state::Sandbox;
use serde_json::json;
use tablestake_canonical::{AccountId, Amount};
use tablestake_core::EscrowCustodian;

pub fn mint(sandbox: &Sandbox, account: AccountId, amount: Amount) -> Result<(), Box<dyn std::error::Error>> {
    let mut snapshot = sandbox.load()?;
    snapshot.token.mint(&account, amount)?;
    sandbox.save(&snapshot)?;
    println!(
        "Minted {} {} to {}",
        amount,
        snapshot.token.symbol(),
        account
    );
    Ok(())
}

pub fn approve(sandbox: &Sandbox, owner: AccountId, amount: Amount) -> Result<(), Box<dyn std::error::Error>> {
    let mut snapshot = sandbox.load()?;
    let spender = snapshot.config.ledger_account.clone();
    snapshot.token.approve(&owner, &spender, amount);
    sandbox.save(&snapshot)?;
    println!("{} approved {} for {}", owner, spender, amount);
    Ok(())
}

pub fn balance(sandbox: &Sandbox, account: AccountId, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = sandbox.load()?;
    let ledger = &snapshot.config.ledger_account;
    let balance = snapshot.token.balance_of(&account);
    let allowance = snapshot.token.allowance(&account, ledger);

    if json {
        let value = json!({
            "account": account,
            "symbol": snapshot.token.symbol(),
            "balance": balance,
            "allowance": allowance,
            "total_supply": snapshot.token.total_supply(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("account:   {}", account);
        println!("balance:   {} {}", balance, snapshot.token.symbol());
        println!("allowance: {} (to {})", allowance, ledger);
    }
    Ok(())
}
