//! Escrow token custodian.
//!
//! The ledger only needs two moves from the token: pull a deposit in
//! against a prior allowance, and push it back out. Both either complete or
//! change nothing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tablestake_canonical::{AccountId, Amount};
use thiserror::Error;

/// Reasons a custodian transfer can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// Sender does not hold enough tokens.
    #[error("insufficient balance: {account} holds {available}, needs {required}")]
    InsufficientBalance {
        /// Account being debited.
        account: AccountId,
        /// Current balance.
        available: Amount,
        /// Requested amount.
        required: Amount,
    },
    /// Spender has not been approved for enough tokens.
    #[error("insufficient allowance: {owner} approved {spender} for {available}, needs {required}")]
    InsufficientAllowance {
        /// Token owner.
        owner: AccountId,
        /// Approved spender.
        spender: AccountId,
        /// Remaining allowance.
        available: Amount,
        /// Requested amount.
        required: Amount,
    },
    /// Credit would exceed the representable amount.
    #[error("balance overflow crediting {0}")]
    Overflow(AccountId),
}

/// Minimal fungible-token contract backing the escrow.
pub trait EscrowCustodian {
    /// Token balance of `account`.
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError>;

    /// Moves `amount` held by `from` to `to`.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount)
        -> Result<(), CustodyError>;
}

/// In-memory token with balances and allowances.
///
/// Serializable so a host can persist it next to the ledger state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryToken {
    symbol: String,
    total_supply: Amount,
    balances: BTreeMap<AccountId, Amount>,
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, Amount>>,
}

impl InMemoryToken {
    /// Creates an empty token.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Token symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Sum of all minted tokens.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Credits freshly minted tokens to `account`.
    pub fn mint(&mut self, account: &AccountId, amount: Amount) -> Result<(), CustodyError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow(account.clone()))?;
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow(account.clone()))?;
        self.total_supply = supply;
        self.balances.insert(account.clone(), balance);
        Ok(())
    }

    /// Sets the allowance `owner` grants `spender`, replacing any previous value.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    /// Remaining allowance `owner` grants `spender`.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|by_spender| by_spender.get(spender))
            .copied()
            .unwrap_or_default()
    }

    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let from_balance = self.balance_of(from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or_else(|| CustodyError::InsufficientBalance {
                account: from.clone(),
                available: from_balance,
                required: amount,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow(to.clone()))?;
        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl EscrowCustodian for InMemoryToken {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let allowance = self.allowance(from, spender);
        let remaining =
            allowance
                .checked_sub(amount)
                .ok_or_else(|| CustodyError::InsufficientAllowance {
                    owner: from.clone(),
                    spender: spender.clone(),
                    available: allowance,
                    required: amount,
                })?;
        self.move_balance(from, to, amount)?;
        self.approve(from, spender, remaining);
        Ok(())
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.move_balance(from, to, amount)
    }
}
