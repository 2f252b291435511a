//! Token collaborator interfaces and in-memory reference ledgers
//!
//! The engine consumes two tokens through traits: a vote token that answers
//! historical balance/supply queries as of a given block, and a stake token
//! with standard transfer/approve semantics. The reference implementations
//! here back the test suites and the CLI sandbox; a deployment wires real
//! tokens behind the same traits.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Address, Amount, BlockNumber};

/// Token transfer failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("insufficient allowance: requested {requested}, approved {approved}")]
    InsufficientAllowance { requested: Amount, approved: Amount },
}

/// Vote token: snapshot-consistent historical queries.
pub trait VoteToken: Send + Sync {
    /// Balance of `holder` as of `block`.
    fn balance_of_at(&self, holder: &Address, block: BlockNumber) -> Amount;

    /// Total supply as of `block`.
    fn total_supply_at(&self, block: BlockNumber) -> Amount;
}

/// Stake token: standard transfer/approve surface.
///
/// Callers are identified explicitly (there is no ambient transaction
/// sender in-process), so `transfer` names the debited account and
/// `transfer_from` names the spender whose allowance is consumed.
pub trait StakeToken: Send + Sync {
    fn balance_of(&self, who: &Address) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount);

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError>;

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;
}

/// One recorded balance value, effective from `block` onward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Checkpoint {
    block: BlockNumber,
    value: Amount,
}

/// Serializable state of a [`CheckpointToken`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointTokenState {
    holders: HashMap<Address, Vec<Checkpoint>>,
    supply: Vec<Checkpoint>,
}

impl CheckpointTokenState {
    fn lookup(checkpoints: &[Checkpoint], block: BlockNumber) -> Amount {
        // Checkpoints are appended in block order; take the last one at or
        // before the queried block.
        match checkpoints.partition_point(|c| c.block <= block) {
            0 => 0,
            n => checkpoints[n - 1].value,
        }
    }

    fn push(checkpoints: &mut Vec<Checkpoint>, block: BlockNumber, value: Amount) {
        match checkpoints.last_mut() {
            Some(last) if last.block == block => last.value = value,
            _ => checkpoints.push(Checkpoint { block, value }),
        }
    }
}

/// In-memory vote token with per-block balance history.
///
/// Mints and transfers are recorded against an explicit block height;
/// queries at any earlier block return the balances as they stood then.
#[derive(Debug, Default)]
pub struct CheckpointToken {
    inner: Mutex<CheckpointTokenState>,
}

impl CheckpointToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: CheckpointTokenState) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> CheckpointTokenState {
        self.inner.lock().clone()
    }

    /// Mint `amount` to `holder`, effective at `block`.
    pub fn mint(&self, holder: &Address, amount: Amount, block: BlockNumber) {
        let mut state = self.inner.lock();
        let balance = CheckpointTokenState::lookup(
            state.holders.get(holder.as_str()).map(|v| v.as_slice()).unwrap_or(&[]),
            block,
        );
        let supply = CheckpointTokenState::lookup(&state.supply, block);
        CheckpointTokenState::push(
            state.holders.entry(holder.clone()).or_default(),
            block,
            balance + amount,
        );
        CheckpointTokenState::push(&mut state.supply, block, supply + amount);
    }

    /// Move `amount` between holders, effective at `block`.
    pub fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Amount,
        block: BlockNumber,
    ) -> Result<(), TokenError> {
        let mut state = self.inner.lock();
        let from_balance = CheckpointTokenState::lookup(
            state.holders.get(from.as_str()).map(|v| v.as_slice()).unwrap_or(&[]),
            block,
        );
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                requested: amount,
                available: from_balance,
            });
        }
        let to_balance = CheckpointTokenState::lookup(
            state.holders.get(to.as_str()).map(|v| v.as_slice()).unwrap_or(&[]),
            block,
        );
        CheckpointTokenState::push(
            state.holders.entry(from.clone()).or_default(),
            block,
            from_balance - amount,
        );
        CheckpointTokenState::push(
            state.holders.entry(to.clone()).or_default(),
            block,
            to_balance + amount,
        );
        Ok(())
    }
}

impl VoteToken for CheckpointToken {
    fn balance_of_at(&self, holder: &Address, block: BlockNumber) -> Amount {
        let state = self.inner.lock();
        CheckpointTokenState::lookup(
            state.holders.get(holder.as_str()).map(|v| v.as_slice()).unwrap_or(&[]),
            block,
        )
    }

    fn total_supply_at(&self, block: BlockNumber) -> Amount {
        CheckpointTokenState::lookup(&self.inner.lock().supply, block)
    }
}

/// Serializable state of a [`LedgerToken`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerTokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<Address, HashMap<Address, Amount>>,
}

/// In-memory stake token: balances plus owner→spender allowances.
///
/// Transfers are all-or-nothing; a failed check leaves no partial effects.
#[derive(Debug, Default)]
pub struct LedgerToken {
    inner: Mutex<LedgerTokenState>,
}

impl LedgerToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: LedgerTokenState) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> LedgerTokenState {
        self.inner.lock().clone()
    }

    pub fn mint(&self, holder: &Address, amount: Amount) {
        *self.inner.lock().balances.entry(holder.clone()).or_insert(0) += amount;
    }

    fn move_balance(
        state: &mut LedgerTokenState,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = state.balances.get(from.as_str()).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        *state.balances.entry(from.clone()).or_insert(0) -= amount;
        *state.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }
}

impl StakeToken for LedgerToken {
    fn balance_of(&self, who: &Address) -> Amount {
        self.inner.lock().balances.get(who.as_str()).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.inner
            .lock()
            .allowances
            .get(owner.as_str())
            .and_then(|per_spender| per_spender.get(spender.as_str()))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) {
        self.inner
            .lock()
            .allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.inner.lock();
        Self::move_balance(&mut state, from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let mut state = self.inner.lock();
        let approved = state
            .allowances
            .get(from.as_str())
            .and_then(|per_spender| per_spender.get(spender.as_str()))
            .copied()
            .unwrap_or(0);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                requested: amount,
                approved,
            });
        }
        Self::move_balance(&mut state, from, to, amount)?;
        if let Some(approved) = state
            .allowances
            .get_mut(from.as_str())
            .and_then(|per_spender| per_spender.get_mut(spender.as_str()))
        {
            *approved -= amount;
        }
        Ok(())
    }
}
