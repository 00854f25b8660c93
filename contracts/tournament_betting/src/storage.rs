use soroban_sdk::{Address, Env, IntoVal, TryFromVal, Val, Vec};

use crate::errors::Error;
use crate::types::{
    Bet, BetId, DataKey, Registry, Round, RoundId, Stake, Team, TeamId, TokenKind, Tournament,
    Vault,
};

/// ~1 day at 5s ledgers.
const BUMP_THRESHOLD: u32 = 17_280;
/// ~30 days at 5s ledgers.
const BUMP_AMOUNT: u32 = 518_400;

fn read<V: TryFromVal<Env, Val>>(env: &Env, key: &DataKey) -> Option<V> {
    env.storage().persistent().get(key)
}

fn write<V: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &V) {
    let storage = env.storage().persistent();
    storage.set(key, value);
    storage.extend_ttl(key, BUMP_THRESHOLD, BUMP_AMOUNT);
}

fn has(env: &Env, key: &DataKey) -> bool {
    env.storage().persistent().has(key)
}

// ───────────── REGISTRY ─────────────

pub(crate) fn has_registry(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Registry)
}

pub(crate) fn get_registry(env: &Env) -> Result<Registry, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Registry)
        .ok_or(Error::NotInitialized)
}

pub(crate) fn set_registry(env: &Env, registry: &Registry) {
    env.storage().instance().set(&DataKey::Registry, registry);
    extend_instance(env);
}

/// Keep the contract instance (code and registry) alive.
pub(crate) fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(BUMP_THRESHOLD, BUMP_AMOUNT);
}

pub(crate) fn get_custody(env: &Env, kind: TokenKind) -> i128 {
    read(env, &DataKey::Custody(kind)).unwrap_or(0)
}

pub(crate) fn set_custody(env: &Env, kind: TokenKind, amount: i128) {
    write(env, &DataKey::Custody(kind), &amount);
}

// ───────────── TOURNAMENTS ─────────────

pub(crate) fn has_tournament(env: &Env, organizer: &Address) -> bool {
    has(env, &DataKey::Tournament(organizer.clone()))
}

pub(crate) fn get_tournament(env: &Env, organizer: &Address) -> Result<Tournament, Error> {
    read(env, &DataKey::Tournament(organizer.clone())).ok_or(Error::NotFound)
}

pub(crate) fn set_tournament(env: &Env, tournament: &Tournament) {
    write(env, &DataKey::Tournament(tournament.authority.clone()), tournament);
}

pub(crate) fn get_vault(env: &Env, organizer: &Address) -> Result<Vault, Error> {
    read(env, &DataKey::Vault(organizer.clone())).ok_or(Error::NotFound)
}

pub(crate) fn set_vault(env: &Env, organizer: &Address, vault: &Vault) {
    write(env, &DataKey::Vault(organizer.clone()), vault);
}

pub(crate) fn get_rounds(env: &Env, organizer: &Address) -> Vec<u32> {
    read(env, &DataKey::TournamentRounds(organizer.clone())).unwrap_or_else(|| Vec::new(env))
}

pub(crate) fn set_rounds(env: &Env, organizer: &Address, rounds: &Vec<u32>) {
    write(env, &DataKey::TournamentRounds(organizer.clone()), rounds);
}

// ───────────── ROUNDS ─────────────

pub(crate) fn has_round(env: &Env, id: &RoundId) -> bool {
    has(env, &DataKey::Round(id.clone()))
}

pub(crate) fn get_round(env: &Env, id: &RoundId) -> Result<Round, Error> {
    read(env, &DataKey::Round(id.clone())).ok_or(Error::NotFound)
}

pub(crate) fn set_round(env: &Env, round: &Round) {
    write(env, &DataKey::Round(round.id.clone()), round);
}

pub(crate) fn get_round_stakes(env: &Env, id: &RoundId) -> Vec<Stake> {
    read(env, &DataKey::RoundStakes(id.clone())).unwrap_or_else(|| Vec::new(env))
}

pub(crate) fn set_round_stakes(env: &Env, id: &RoundId, stakes: &Vec<Stake>) {
    write(env, &DataKey::RoundStakes(id.clone()), stakes);
}

// ───────────── TEAMS & BETS ─────────────

pub(crate) fn has_team(env: &Env, id: &TeamId) -> bool {
    has(env, &DataKey::Team(id.clone()))
}

pub(crate) fn get_team(env: &Env, id: &TeamId) -> Result<Team, Error> {
    read(env, &DataKey::Team(id.clone())).ok_or(Error::NotFound)
}

pub(crate) fn set_team(env: &Env, team: &Team) {
    write(env, &DataKey::Team(team.id.clone()), team);
}

pub(crate) fn has_bet(env: &Env, id: &BetId) -> bool {
    has(env, &DataKey::Bet(id.clone()))
}

pub(crate) fn get_bet(env: &Env, id: &BetId) -> Result<Bet, Error> {
    read(env, &DataKey::Bet(id.clone())).ok_or(Error::NotFound)
}

pub(crate) fn set_bet(env: &Env, bet: &Bet) {
    write(env, &DataKey::Bet(bet.id.clone()), bet);
}
