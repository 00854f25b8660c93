//! Escrow custody.
//!
//! All tournaments share the contract's token accounts; each tournament's
//! share is tracked in the `held` balances of its `Vault` record and the
//! per-kind `Custody` total is the sum over every vault. Every movement
//! updates both and is checked against the contract's real token balance.
//! Callers persist the vault they pass in.

use soroban_sdk::{token, Address, Env};

use crate::errors::Error;
use crate::storage;
use crate::types::{Registry, TokenKind, Vault};

fn client<'a>(env: &'a Env, registry: &Registry, kind: TokenKind) -> token::Client<'a> {
    token::Client::new(env, &registry.token(kind))
}

/// Move `amount` of `kind` from `from` into `vault`.
pub(crate) fn deposit(
    env: &Env,
    registry: &Registry,
    vault: &mut Vault,
    kind: TokenKind,
    from: &Address,
    amount: i128,
) -> Result<(), Error> {
    let token = client(env, registry, kind);
    let custodian = env.current_contract_address();

    if token.balance(from) < amount {
        return Err(Error::InsufficientBalance);
    }

    vault.held.credit(kind, amount)?;
    let custody = storage::get_custody(env, kind)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;

    let before = token.balance(&custodian);
    token.transfer(from, &custodian, &amount);
    let after = token.balance(&custodian);

    // Fee-on-transfer or otherwise misbehaving tokens would leave the vault
    // crediting more than it holds.
    if after - before != amount {
        return Err(Error::InvariantViolation);
    }

    storage::set_custody(env, kind, custody);
    assert_backed(env, &token, custody)
}

/// Pay `amount` of `kind` out of `vault` to `to`.
pub(crate) fn release(
    env: &Env,
    registry: &Registry,
    vault: &mut Vault,
    kind: TokenKind,
    to: &Address,
    amount: i128,
) -> Result<(), Error> {
    let token = client(env, registry, kind);
    let custody = withdraw(env, vault, kind, amount)?;

    token.transfer(&env.current_contract_address(), to, &amount);
    assert_backed(env, &token, custody)
}

/// Burn `amount` of the voting token held in `vault`.
pub(crate) fn burn_voting(
    env: &Env,
    registry: &Registry,
    vault: &mut Vault,
    amount: i128,
) -> Result<(), Error> {
    let token = client(env, registry, TokenKind::Voting);
    let custody = withdraw(env, vault, TokenKind::Voting, amount)?;

    token.burn(&env.current_contract_address(), &amount);
    assert_backed(env, &token, custody)
}

/// Every kind must cover what unsettled bets can still claim.
pub(crate) fn assert_solvent(vault: &Vault) -> Result<(), Error> {
    for kind in [TokenKind::Wagering, TokenKind::Collateral, TokenKind::Voting] {
        if vault.surplus(kind) < 0 {
            return Err(Error::InvariantViolation);
        }
    }
    Ok(())
}

fn withdraw(env: &Env, vault: &mut Vault, kind: TokenKind, amount: i128) -> Result<i128, Error> {
    vault.held.debit(kind, amount, Error::InsufficientBalance)?;

    let custody = storage::get_custody(env, kind);
    if custody < amount {
        return Err(Error::InvariantViolation);
    }
    let custody = custody - amount;

    storage::set_custody(env, kind, custody);
    Ok(custody)
}

/// The contract must hold at least what its vaults claim to hold.
fn assert_backed(env: &Env, token: &token::Client, custody: i128) -> Result<(), Error> {
    if token.balance(&env.current_contract_address()) < custody {
        return Err(Error::InvariantViolation);
    }
    Ok(())
}
