#![no_std]

//! Voting token with delegated, quantity-bound minting.
//!
//! The admin hands out mint allowances and keeps a list of approved
//! custodian contracts. An allowance holder may pass part of an allowance to
//! one approved custodian with `delegate_mint`; only that custodian can spend
//! the grant through `mint_from`, and never beyond what was delegated. The
//! allowance holder cannot redeem its own allowance.
//!
//! The SEP-41 surface (`transfer`, `approve`, `transfer_from`, `burn`,
//! `burn_from`, `balance`, `allowance`) lets other contracts drive this token
//! through `soroban_sdk::token::Client`.

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Env, IntoVal,
    String, Val,
};

const BALANCE_BUMP_THRESHOLD: u32 = 17_280;
const BALANCE_BUMP_AMOUNT: u32 = 518_400;

#[contracttype]
pub enum DataKey {
    Admin,
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    Balance(Address),
    Allowance(Address, Address), // (owner, spender)
    Custodian(Address),
    MintAllowance(Address),
    MintGrant(Address, Address), // (grantor, grantee)
}

/// A minting capability passed from `grantor` to `grantee`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintGrant {
    pub grantor: Address,
    pub grantee: Address,
    /// Units the grantee may still mint.
    pub remaining: i128,
    /// Units already minted through this grant.
    pub minted: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceValue {
    pub amount: i128,
    pub expiration_ledger: u32,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum TokenError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidAmount = 3,
    InsufficientBalance = 4,
    InsufficientAllowance = 5,
    GrantExceeded = 6,
    CustodianNotApproved = 7,
    Overflow = 8,
    InvalidExpiration = 9,
}

#[contract]
pub struct VoteToken;

#[contractimpl]
impl VoteToken {
    /// Initialize the token with its admin and metadata
    pub fn initialize(
        env: Env,
        admin: Address,
        name: String,
        symbol: String,
        decimals: u32,
    ) -> Result<(), TokenError> {
        let storage = env.storage().instance();
        if storage.has(&DataKey::Admin) {
            return Err(TokenError::AlreadyInitialized);
        }

        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::Name, &name);
        storage.set(&DataKey::Symbol, &symbol);
        storage.set(&DataKey::Decimals, &decimals);
        storage.set(&DataKey::TotalSupply, &0i128);
        storage.extend_ttl(BALANCE_BUMP_THRESHOLD, BALANCE_BUMP_AMOUNT);

        Ok(())
    }

    pub fn name(env: Env) -> String {
        env.storage()
            .instance()
            .get(&DataKey::Name)
            .unwrap_or(String::from_str(&env, "Vote"))
    }

    pub fn symbol(env: Env) -> String {
        env.storage()
            .instance()
            .get(&DataKey::Symbol)
            .unwrap_or(String::from_str(&env, "VOTE"))
    }

    pub fn decimals(env: Env) -> u32 {
        env.storage().instance().get(&DataKey::Decimals).unwrap_or(9)
    }

    pub fn admin(env: Env) -> Result<Address, TokenError> {
        Self::load_admin(&env)
    }

    // ───────────── MINT AUTHORITY ─────────────

    /// Allow `custodian` to receive delegated grants (admin only)
    pub fn approve_custodian(env: Env, custodian: Address) -> Result<(), TokenError> {
        Self::load_admin(&env)?.require_auth();

        let storage = env.storage().instance();
        storage.set(&DataKey::Custodian(custodian.clone()), &true);
        storage.extend_ttl(BALANCE_BUMP_THRESHOLD, BALANCE_BUMP_AMOUNT);

        env.events().publish((symbol_short!("CUSTODY"), custodian), true);
        Ok(())
    }

    /// Stop `custodian` from receiving or spending grants (admin only)
    pub fn revoke_custodian(env: Env, custodian: Address) -> Result<(), TokenError> {
        Self::load_admin(&env)?.require_auth();

        env.storage()
            .instance()
            .remove(&DataKey::Custodian(custodian.clone()));

        env.events().publish((symbol_short!("CUSTODY"), custodian), false);
        Ok(())
    }

    pub fn is_custodian(env: Env, custodian: Address) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::Custodian(custodian))
            .unwrap_or(false)
    }

    /// Give `minter` the right to mint up to `amount` more units (admin only)
    pub fn grant_mint_allowance(env: Env, minter: Address, amount: i128) -> Result<(), TokenError> {
        Self::load_admin(&env)?.require_auth();
        Self::assert_positive(amount)?;

        let allowance = Self::mint_allowance(env.clone(), minter.clone())
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Self::put(&env, &DataKey::MintAllowance(minter.clone()), &allowance);

        env.events()
            .publish((symbol_short!("M_ALLOW"), minter), amount);
        Ok(())
    }

    /// Drop whatever allowance `minter` still holds (admin only)
    pub fn revoke_mint_allowance(env: Env, minter: Address) -> Result<(), TokenError> {
        Self::load_admin(&env)?.require_auth();

        env.storage()
            .persistent()
            .remove(&DataKey::MintAllowance(minter.clone()));

        env.events().publish((symbol_short!("M_REVOKE"), minter), ());
        Ok(())
    }

    pub fn mint_allowance(env: Env, minter: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::MintAllowance(minter))
            .unwrap_or(0)
    }

    /// Move `amount` of the grantor's mint allowance into a grant that only
    /// the approved custodian `grantee` may consume.
    pub fn delegate_mint(
        env: Env,
        grantor: Address,
        grantee: Address,
        amount: i128,
    ) -> Result<(), TokenError> {
        grantor.require_auth();
        Self::assert_positive(amount)?;

        if grantee == grantor || !Self::is_custodian(env.clone(), grantee.clone()) {
            return Err(TokenError::CustodianNotApproved);
        }

        let allowance = Self::mint_allowance(env.clone(), grantor.clone());
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance);
        }

        let key = DataKey::MintGrant(grantor.clone(), grantee.clone());
        let mut grant = env
            .storage()
            .persistent()
            .get(&key)
            .unwrap_or(MintGrant {
                grantor: grantor.clone(),
                grantee: grantee.clone(),
                remaining: 0,
                minted: 0,
            });
        grant.remaining = grant
            .remaining
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        Self::put(&env, &DataKey::MintAllowance(grantor.clone()), &(allowance - amount));
        Self::put(&env, &key, &grant);

        env.events()
            .publish((symbol_short!("M_DELEG"), grantor, grantee), amount);
        Ok(())
    }

    pub fn mint_grant(env: Env, grantor: Address, grantee: Address) -> Option<MintGrant> {
        env.storage()
            .persistent()
            .get(&DataKey::MintGrant(grantor, grantee))
    }

    /// Units `grantee` can still mint on behalf of `grantor`
    pub fn granted(env: Env, grantor: Address, grantee: Address) -> i128 {
        if !Self::is_custodian(env.clone(), grantee.clone()) {
            return 0;
        }
        Self::mint_grant(env, grantor, grantee)
            .map(|g| g.remaining)
            .unwrap_or(0)
    }

    /// Mint new tokens (admin only)
    pub fn mint(env: Env, to: Address, amount: i128) -> Result<(), TokenError> {
        Self::load_admin(&env)?.require_auth();
        Self::assert_positive(amount)?;

        Self::credit(&env, &to, amount)?;

        env.events().publish((symbol_short!("mint"), to), amount);
        Ok(())
    }

    /// Mint by consuming a delegated grant
    pub fn mint_from(
        env: Env,
        grantee: Address,
        grantor: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), TokenError> {
        grantee.require_auth();
        Self::assert_positive(amount)?;

        if !Self::is_custodian(env.clone(), grantee.clone()) {
            return Err(TokenError::CustodianNotApproved);
        }

        let key = DataKey::MintGrant(grantor.clone(), grantee.clone());
        let mut grant: MintGrant = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(TokenError::GrantExceeded)?;
        if grant.remaining < amount {
            return Err(TokenError::GrantExceeded);
        }

        grant.remaining -= amount;
        grant.minted = grant
            .minted
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Self::put(&env, &key, &grant);
        Self::credit(&env, &to, amount)?;

        env.events()
            .publish((symbol_short!("mint_from"), grantor, to), amount);
        Ok(())
    }

    // ───────────── TOKEN INTERFACE ─────────────

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        Self::live_allowance(&env, &from, &spender)
    }

    /// Let `spender` move up to `amount` of `from`'s balance until
    /// `expiration_ledger`.
    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), TokenError> {
        from.require_auth();

        if amount < 0 {
            return Err(TokenError::InvalidAmount);
        }
        if amount > 0 && expiration_ledger < env.ledger().sequence() {
            return Err(TokenError::InvalidExpiration);
        }

        let value = AllowanceValue {
            amount,
            expiration_ledger,
        };
        Self::put(&env, &DataKey::Allowance(from.clone(), spender.clone()), &value);

        env.events().publish(
            (symbol_short!("approve"), from, spender),
            (amount, expiration_ledger),
        );
        Ok(())
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), TokenError> {
        from.require_auth();
        Self::assert_positive(amount)?;

        Self::debit(&env, &from, amount)?;
        Self::credit_balance(&env, &to, amount)?;

        env.events()
            .publish((symbol_short!("transfer"), from, to), amount);
        Ok(())
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), TokenError> {
        spender.require_auth();
        Self::assert_positive(amount)?;

        Self::spend_allowance(&env, &from, &spender, amount)?;
        Self::debit(&env, &from, amount)?;
        Self::credit_balance(&env, &to, amount)?;

        env.events()
            .publish((symbol_short!("transfer"), from, to), amount);
        Ok(())
    }

    pub fn burn(env: Env, from: Address, amount: i128) -> Result<(), TokenError> {
        from.require_auth();
        Self::assert_positive(amount)?;

        Self::destroy(&env, &from, amount)?;

        env.events().publish((symbol_short!("burn"), from), amount);
        Ok(())
    }

    pub fn burn_from(
        env: Env,
        spender: Address,
        from: Address,
        amount: i128,
    ) -> Result<(), TokenError> {
        spender.require_auth();
        Self::assert_positive(amount)?;

        Self::spend_allowance(&env, &from, &spender, amount)?;
        Self::destroy(&env, &from, amount)?;

        env.events().publish((symbol_short!("burn"), from), amount);
        Ok(())
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(id))
            .unwrap_or(0)
    }

    pub fn total_supply(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    // ───────────── INTERNAL HELPERS ─────────────

    fn load_admin(env: &Env) -> Result<Address, TokenError> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(TokenError::NotInitialized)
    }

    fn assert_positive(amount: i128) -> Result<(), TokenError> {
        if amount <= 0 {
            return Err(TokenError::InvalidAmount);
        }
        Ok(())
    }

    fn put<V: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &V) {
        let storage = env.storage().persistent();
        storage.set(key, value);
        storage.extend_ttl(key, BALANCE_BUMP_THRESHOLD, BALANCE_BUMP_AMOUNT);
    }

    fn live_allowance(env: &Env, from: &Address, spender: &Address) -> i128 {
        let value: Option<AllowanceValue> = env
            .storage()
            .persistent()
            .get(&DataKey::Allowance(from.clone(), spender.clone()));
        match value {
            Some(v) if v.expiration_ledger >= env.ledger().sequence() => v.amount,
            _ => 0,
        }
    }

    fn spend_allowance(
        env: &Env,
        from: &Address,
        spender: &Address,
        amount: i128,
    ) -> Result<(), TokenError> {
        let key = DataKey::Allowance(from.clone(), spender.clone());
        let mut value: AllowanceValue = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(TokenError::InsufficientAllowance)?;
        if value.expiration_ledger < env.ledger().sequence() || value.amount < amount {
            return Err(TokenError::InsufficientAllowance);
        }

        value.amount -= amount;
        Self::put(env, &key, &value);
        Ok(())
    }

    fn credit(env: &Env, to: &Address, amount: i128) -> Result<(), TokenError> {
        let supply = Self::total_supply(env.clone())
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Self::credit_balance(env, to, amount)?;

        let storage = env.storage().instance();
        storage.set(&DataKey::TotalSupply, &supply);
        storage.extend_ttl(BALANCE_BUMP_THRESHOLD, BALANCE_BUMP_AMOUNT);
        Ok(())
    }

    fn credit_balance(env: &Env, to: &Address, amount: i128) -> Result<(), TokenError> {
        let balance = Self::balance(env.clone(), to.clone())
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Self::put(env, &DataKey::Balance(to.clone()), &balance);
        Ok(())
    }

    fn debit(env: &Env, from: &Address, amount: i128) -> Result<(), TokenError> {
        let balance = Self::balance(env.clone(), from.clone());
        if balance < amount {
            return Err(TokenError::InsufficientBalance);
        }
        Self::put(env, &DataKey::Balance(from.clone()), &(balance - amount));
        Ok(())
    }

    fn destroy(env: &Env, from: &Address, amount: i128) -> Result<(), TokenError> {
        Self::debit(env, from, amount)?;
        let supply = Self::total_supply(env.clone());
        env.storage()
            .instance()
            .set(&DataKey::TotalSupply, &(supply - amount));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::testutils::{Address as _, Ledger};

    fn setup(env: &Env) -> (VoteTokenClient, Address) {
        let contract_id = env.register_contract(None, VoteToken);
        let client = VoteTokenClient::new(env, &contract_id);
        let admin = Address::generate(env);

        client.initialize(
            &admin,
            &String::from_str(env, "Tournament Vote"),
            &String::from_str(env, "VOTE"),
            &9,
        );

        (client, admin)
    }

    #[test]
    fn test_initialization() {
        let env = Env::default();
        let (client, admin) = setup(&env);

        assert_eq!(client.name(), String::from_str(&env, "Tournament Vote"));
        assert_eq!(client.symbol(), String::from_str(&env, "VOTE"));
        assert_eq!(client.decimals(), 9);
        assert_eq!(client.admin(), admin);
        assert_eq!(client.total_supply(), 0);
    }

    #[test]
    fn test_double_initialization() {
        let env = Env::default();
        let (client, admin) = setup(&env);

        let result = client.try_initialize(
            &admin,
            &String::from_str(&env, "Again"),
            &String::from_str(&env, "AGN"),
            &6,
        );
        assert_eq!(result, Err(Ok(TokenError::AlreadyInitialized)));
    }

    #[test]
    fn test_delegated_mint_is_bounded() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let organizer = Address::generate(&env);
        let vault = Address::generate(&env);

        client.approve_custodian(&vault);
        client.grant_mint_allowance(&organizer, &1_000);
        client.delegate_mint(&organizer, &vault, &600);

        assert_eq!(client.mint_allowance(&organizer), 400);
        assert_eq!(client.granted(&organizer, &vault), 600);

        client.mint_from(&vault, &organizer, &organizer, &600);
        assert_eq!(client.balance(&organizer), 600);
        assert_eq!(client.total_supply(), 600);

        let grant = client.mint_grant(&organizer, &vault).unwrap();
        assert_eq!(grant.remaining, 0);
        assert_eq!(grant.minted, 600);

        let result = client.try_mint_from(&vault, &organizer, &organizer, &1);
        assert_eq!(result, Err(Ok(TokenError::GrantExceeded)));
    }

    #[test]
    fn test_self_delegation_is_rejected() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let organizer = Address::generate(&env);
        client.grant_mint_allowance(&organizer, &1_000);

        let result = client.try_delegate_mint(&organizer, &organizer, &1_000);
        assert_eq!(result, Err(Ok(TokenError::CustodianNotApproved)));

        let result = client.try_mint_from(&organizer, &organizer, &organizer, &1_000);
        assert_eq!(result, Err(Ok(TokenError::CustodianNotApproved)));

        // Approving the organizer as a custodian still does not let it redeem
        // its own allowance.
        client.approve_custodian(&organizer);
        let result = client.try_delegate_mint(&organizer, &organizer, &1_000);
        assert_eq!(result, Err(Ok(TokenError::CustodianNotApproved)));

        assert_eq!(client.total_supply(), 0);
        assert_eq!(client.balance(&organizer), 0);
        assert_eq!(client.mint_allowance(&organizer), 1_000);
    }

    #[test]
    fn test_delegation_needs_approved_custodian() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let organizer = Address::generate(&env);
        let accomplice = Address::generate(&env);
        client.grant_mint_allowance(&organizer, &500);

        let result = client.try_delegate_mint(&organizer, &accomplice, &500);
        assert_eq!(result, Err(Ok(TokenError::CustodianNotApproved)));
        assert_eq!(client.granted(&organizer, &accomplice), 0);
    }

    #[test]
    fn test_revoked_custodian_cannot_mint() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let organizer = Address::generate(&env);
        let vault = Address::generate(&env);

        client.approve_custodian(&vault);
        client.grant_mint_allowance(&organizer, &500);
        client.delegate_mint(&organizer, &vault, &500);
        client.revoke_custodian(&vault);

        assert!(!client.is_custodian(&vault));
        assert_eq!(client.granted(&organizer, &vault), 0);
        let result = client.try_mint_from(&vault, &organizer, &organizer, &100);
        assert_eq!(result, Err(Ok(TokenError::CustodianNotApproved)));
    }

    #[test]
    fn test_grant_belongs_to_single_grantee() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let organizer = Address::generate(&env);
        let vault = Address::generate(&env);
        let other = Address::generate(&env);

        client.approve_custodian(&vault);
        client.approve_custodian(&other);
        client.grant_mint_allowance(&organizer, &500);
        client.delegate_mint(&organizer, &vault, &500);

        let result = client.try_mint_from(&other, &organizer, &other, &100);
        assert_eq!(result, Err(Ok(TokenError::GrantExceeded)));
        assert_eq!(client.total_supply(), 0);
    }

    #[test]
    fn test_delegate_beyond_allowance() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let organizer = Address::generate(&env);
        let vault = Address::generate(&env);

        client.approve_custodian(&vault);
        client.grant_mint_allowance(&organizer, &100);
        let result = client.try_delegate_mint(&organizer, &vault, &101);
        assert_eq!(result, Err(Ok(TokenError::InsufficientAllowance)));
    }

    #[test]
    fn test_allowance_overflow_is_typed() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let minter = Address::generate(&env);
        client.grant_mint_allowance(&minter, &i128::MAX);

        let result = client.try_grant_mint_allowance(&minter, &1);
        assert_eq!(result, Err(Ok(TokenError::Overflow)));
        assert_eq!(client.mint_allowance(&minter), i128::MAX);
    }

    #[test]
    fn test_revoke_allowance() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let minter = Address::generate(&env);
        client.grant_mint_allowance(&minter, &100);
        client.revoke_mint_allowance(&minter);

        assert_eq!(client.mint_allowance(&minter), 0);
    }

    #[test]
    fn test_transfer_and_burn() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let user1 = Address::generate(&env);
        let user2 = Address::generate(&env);

        client.mint(&user1, &1_000);
        client.transfer(&user1, &user2, &300);
        client.burn(&user2, &100);

        assert_eq!(client.balance(&user1), 700);
        assert_eq!(client.balance(&user2), 200);
        assert_eq!(client.total_supply(), 900);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let user1 = Address::generate(&env);
        let user2 = Address::generate(&env);

        client.mint(&user1, &100);
        let result = client.try_transfer(&user1, &user2, &200);
        assert_eq!(result, Err(Ok(TokenError::InsufficientBalance)));
    }

    #[test]
    fn test_approve_and_spend() {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().set_sequence_number(100);
        let (client, _) = setup(&env);

        let owner = Address::generate(&env);
        let spender = Address::generate(&env);
        let recipient = Address::generate(&env);

        client.mint(&owner, &1_000);
        client.approve(&owner, &spender, &400, &200);
        assert_eq!(client.allowance(&owner, &spender), 400);

        client.transfer_from(&spender, &owner, &recipient, &250);
        client.burn_from(&spender, &owner, &100);

        assert_eq!(client.balance(&owner), 650);
        assert_eq!(client.balance(&recipient), 250);
        assert_eq!(client.allowance(&owner, &spender), 50);
        assert_eq!(client.total_supply(), 900);

        let result = client.try_transfer_from(&spender, &owner, &recipient, &51);
        assert_eq!(result, Err(Ok(TokenError::InsufficientAllowance)));
    }

    #[test]
    fn test_allowance_expires() {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().set_sequence_number(100);
        let (client, _) = setup(&env);

        let owner = Address::generate(&env);
        let spender = Address::generate(&env);

        client.mint(&owner, &1_000);
        assert_eq!(
            client.try_approve(&owner, &spender, &10, &99),
            Err(Ok(TokenError::InvalidExpiration))
        );

        client.approve(&owner, &spender, &400, &150);
        env.ledger().set_sequence_number(151);

        assert_eq!(client.allowance(&owner, &spender), 0);
        let result = client.try_burn_from(&spender, &owner, &1);
        assert_eq!(result, Err(Ok(TokenError::InsufficientAllowance)));
    }
}
