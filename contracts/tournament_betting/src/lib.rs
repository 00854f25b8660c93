#![no_std]

//! Tournament wagering with per-round pari-mutuel settlement.
//!
//! Organizers run one tournament each, keyed by their address. Users wager on
//! teams within a round; once the organizer marks the winning team, every bet
//! is settled exactly once and winners split the forfeited pool in proportion
//! to their stakes. A tournament can be staked with collateral, which mints
//! the same amount of the voting token through a delegated grant; from then
//! on wagers are denominated in the voting token.

use soroban_sdk::{contract, contractimpl, log, symbol_short, token, Address, Env, String, Vec};

mod errors;
mod payout;
mod storage;
mod types;
mod vault;
mod vote;

pub use errors::Error;
pub use payout::PoolTotals;
pub use types::{
    Balances, Bet, BetId, Registry, Round, RoundId, Stake, Team, TeamId, TokenKind, Tournament,
    Vault,
};

// A round's whole ledger is one storage entry read by settlement and completion.
const MAX_NAME_LEN: u32 = 32;
const MAX_ROUNDS_PER_TOURNAMENT: u32 = 32;
const MAX_TEAMS_PER_ROUND: u32 = 16;
const MAX_BETS_PER_ROUND: u32 = 64;

#[contract]
pub struct TournamentBetting;

#[contractimpl]
impl TournamentBetting {
    // ───────────── REGISTRY ─────────────

    /// Create the process-wide registry. Can only run once.
    pub fn init_registry(
        env: Env,
        authority: Address,
        wagering_token: Address,
        collateral_token: Address,
        voting_token: Address,
        faucet: Address,
    ) -> Result<(), Error> {
        authority.require_auth();

        if storage::has_registry(&env) {
            return Err(Error::AlreadyInitialized);
        }
        if wagering_token == collateral_token
            || wagering_token == voting_token
            || collateral_token == voting_token
        {
            return Err(Error::InvalidState);
        }

        let registry = Registry {
            authority: authority.clone(),
            wagering_token: wagering_token.clone(),
            collateral_token: collateral_token.clone(),
            voting_token: voting_token.clone(),
            faucet,
            settler: None,
        };
        storage::set_registry(&env, &registry);

        env.events().publish(
            (symbol_short!("REG_INIT"), authority),
            (wagering_token, collateral_token, voting_token),
        );

        Ok(())
    }

    /// Point the registry at a new faucet (authority only)
    pub fn update_faucet(env: Env, authority: Address, faucet: Address) -> Result<(), Error> {
        authority.require_auth();
        let mut registry = Self::assert_authority(&env, &authority)?;

        registry.faucet = faucet.clone();
        storage::set_registry(&env, &registry);

        env.events().publish((symbol_short!("FAUCET"), authority), faucet);

        Ok(())
    }

    /// Name (or clear) the automated settler (authority only)
    pub fn set_settler(
        env: Env,
        authority: Address,
        settler: Option<Address>,
    ) -> Result<(), Error> {
        authority.require_auth();
        let mut registry = Self::assert_authority(&env, &authority)?;

        registry.settler = settler.clone();
        storage::set_registry(&env, &registry);

        env.events().publish((symbol_short!("SETTLER"), authority), settler);

        Ok(())
    }

    // ───────────── TOURNAMENT LIFECYCLE ─────────────

    /// Open a tournament for `organizer`. `stake_amount` is the intended
    /// collateral target; 0 means the tournament will never be staked.
    pub fn create_tournament(
        env: Env,
        organizer: Address,
        name: String,
        stake_amount: i128,
    ) -> Result<Tournament, Error> {
        organizer.require_auth();
        storage::get_registry(&env)?;
        Self::assert_name(&name)?;

        if stake_amount < 0 {
            return Err(Error::InvalidAmount);
        }
        if storage::has_tournament(&env, &organizer) {
            return Err(Error::DuplicateEntity);
        }

        let tournament = Tournament {
            authority: organizer.clone(),
            name: name.clone(),
            stake_amount,
            is_staked: false,
            is_active: true,
            created_at: env.ledger().timestamp(),
            voting_minted: 0,
        };
        storage::extend_instance(&env);
        storage::set_tournament(&env, &tournament);
        storage::set_vault(&env, &organizer, &Vault::empty());
        storage::set_rounds(&env, &organizer, &Vec::new(&env));

        env.events()
            .publish((symbol_short!("T_CREATE"), organizer), (name, stake_amount));

        Ok(tournament)
    }

    /// Deposit collateral and mint the same amount of voting token to the
    /// organizer through the grant delegated to this contract.
    pub fn stake_tournament(env: Env, organizer: Address, stake_amount: i128) -> Result<(), Error> {
        organizer.require_auth();
        let registry = storage::get_registry(&env)?;
        let mut tournament = storage::get_tournament(&env, &organizer)?;

        if !tournament.is_active {
            return Err(Error::InvalidState);
        }
        if tournament.is_staked {
            return Err(Error::AlreadyStaked);
        }
        if stake_amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if tournament.stake_amount != 0 && tournament.stake_amount != stake_amount {
            return Err(Error::InvalidAmount);
        }
        let mut vault = storage::get_vault(&env, &organizer)?;
        // Staking switches the wager currency; a tournament never mixes kinds.
        if vault.bet_count > 0 {
            return Err(Error::InvalidState);
        }

        let custodian = env.current_contract_address();
        if vote::granted(&env, &registry.voting_token, &organizer, &custodian) < stake_amount {
            return Err(Error::MintDelegationMissing);
        }

        vault::deposit(
            &env,
            &registry,
            &mut vault,
            TokenKind::Collateral,
            &organizer,
            stake_amount,
        )?;

        let voting = token::Client::new(&env, &registry.voting_token);
        let before = voting.balance(&organizer);
        vote::mint_from(
            &env,
            &registry.voting_token,
            &custodian,
            &organizer,
            &organizer,
            stake_amount,
        );
        if voting.balance(&organizer) - before != stake_amount {
            return Err(Error::InvariantViolation);
        }

        tournament.is_staked = true;
        tournament.stake_amount = stake_amount;
        tournament.voting_minted = stake_amount;

        storage::extend_instance(&env);
        storage::set_vault(&env, &organizer, &vault);
        storage::set_tournament(&env, &tournament);

        env.events()
            .publish((symbol_short!("T_STAKE"), organizer), stake_amount);

        Ok(())
    }

    /// Deactivate the tournament. Collateral goes back to the organizer;
    /// wager-token surplus nobody can still claim (forfeits and dust) is swept
    /// to the organizer, voting-token surplus is burned. Anything an unsettled
    /// bet can still claim stays in the vault.
    pub fn close_tournament(env: Env, organizer: Address) -> Result<(), Error> {
        organizer.require_auth();
        let registry = storage::get_registry(&env)?;
        let mut tournament = storage::get_tournament(&env, &organizer)?;

        if !tournament.is_active {
            return Err(Error::InvalidState);
        }

        let mut vault = storage::get_vault(&env, &organizer)?;
        vault::assert_solvent(&vault)?;

        let collateral = vault.held.collateral;
        let wagering_surplus = vault.surplus(TokenKind::Wagering);
        let voting_surplus = vault.surplus(TokenKind::Voting);

        if collateral > 0 {
            vault::release(
                &env,
                &registry,
                &mut vault,
                TokenKind::Collateral,
                &organizer,
                collateral,
            )?;
        }
        if wagering_surplus > 0 {
            vault::release(
                &env,
                &registry,
                &mut vault,
                TokenKind::Wagering,
                &organizer,
                wagering_surplus,
            )?;
        }
        if voting_surplus > 0 {
            vault::burn_voting(&env, &registry, &mut vault, voting_surplus)?;
        }

        tournament.is_active = false;
        storage::extend_instance(&env);
        storage::set_vault(&env, &organizer, &vault);
        storage::set_tournament(&env, &tournament);

        log!(
            &env,
            "tournament closed",
            collateral,
            wagering_surplus,
            voting_surplus
        );
        env.events().publish(
            (symbol_short!("T_CLOSE"), organizer),
            (collateral, wagering_surplus, voting_surplus),
        );

        Ok(())
    }

    // ───────────── ROUNDS & TEAMS ─────────────

    pub fn create_round(
        env: Env,
        organizer: Address,
        name: String,
        round_number: u32,
    ) -> Result<RoundId, Error> {
        organizer.require_auth();
        let tournament = Self::load_active_tournament(&env, &organizer)?;
        Self::assert_name(&name)?;

        let id = RoundId {
            tournament: organizer.clone(),
            number: round_number,
        };
        if storage::has_round(&env, &id) {
            return Err(Error::DuplicateEntity);
        }

        let mut rounds = storage::get_rounds(&env, &organizer);
        if rounds.len() >= MAX_ROUNDS_PER_TOURNAMENT {
            return Err(Error::CapacityExceeded);
        }
        rounds.push_back(round_number);

        let round = Round {
            id: id.clone(),
            name: name.clone(),
            is_active: true,
            is_completed: false,
            winner: None,
            currency: tournament.wager_kind(),
            created_at: env.ledger().timestamp(),
            team_count: 0,
            bet_count: 0,
            settled_count: 0,
            total_staked: 0,
            paid_out: 0,
        };
        storage::extend_instance(&env);
        storage::set_round(&env, &round);
        storage::set_rounds(&env, &organizer, &rounds);

        env.events()
            .publish((symbol_short!("R_CREATE"), organizer, round_number), name);

        Ok(id)
    }

    pub fn create_team(
        env: Env,
        organizer: Address,
        round_number: u32,
        name: String,
    ) -> Result<TeamId, Error> {
        organizer.require_auth();
        Self::load_active_tournament(&env, &organizer)?;
        let mut round = Self::load_open_round(&env, &organizer, round_number)?;
        Self::assert_name(&name)?;

        let id = TeamId {
            round: round.id.clone(),
            name: name.clone(),
        };
        if storage::has_team(&env, &id) {
            return Err(Error::DuplicateEntity);
        }

        if round.team_count >= MAX_TEAMS_PER_ROUND {
            return Err(Error::CapacityExceeded);
        }
        round.team_count += 1;

        let team = Team {
            id: id.clone(),
            is_winner: false,
            is_eliminated: false,
            total_staked: 0,
        };
        storage::extend_instance(&env);
        storage::set_team(&env, &team);
        storage::set_round(&env, &round);

        env.events()
            .publish((symbol_short!("TM_CREATE"), organizer, round_number), name);

        Ok(id)
    }

    /// Stop a team from taking further wagers in an open round
    pub fn eliminate_team(
        env: Env,
        organizer: Address,
        round_number: u32,
        name: String,
    ) -> Result<(), Error> {
        organizer.require_auth();
        Self::load_active_tournament(&env, &organizer)?;
        let round = Self::load_open_round(&env, &organizer, round_number)?;

        let id = TeamId {
            round: round.id,
            name: name.clone(),
        };
        let mut team = storage::get_team(&env, &id).map_err(|_| Error::TeamNotInRound)?;
        if team.is_eliminated {
            return Err(Error::InvalidState);
        }

        team.is_eliminated = true;
        storage::extend_instance(&env);
        storage::set_team(&env, &team);

        env.events()
            .publish((symbol_short!("TM_ELIM"), organizer, round_number), name);

        Ok(())
    }

    /// Fix the outcome of an open round. Moves no tokens; the round's
    /// reservation in the vault drops from face value to the exact winner
    /// payouts.
    pub fn complete_round(
        env: Env,
        organizer: Address,
        round_number: u32,
        winner_team: String,
    ) -> Result<(), Error> {
        organizer.require_auth();
        Self::load_active_tournament(&env, &organizer)?;
        let mut round = Self::load_open_round(&env, &organizer, round_number)?;

        let id = TeamId {
            round: round.id.clone(),
            name: winner_team.clone(),
        };
        let mut team = storage::get_team(&env, &id).map_err(|_| Error::TeamNotInRound)?;
        if team.is_eliminated {
            return Err(Error::InvalidState);
        }
        if round.team_count < 2 {
            return Err(Error::InvalidState);
        }

        if round.total_staked > 0 {
            let stakes = storage::get_round_stakes(&env, &round.id);
            let totals = payout::round_totals(&stakes, &winner_team, round.total_staked)?;
            let claims = payout::winning_claims(&stakes, &winner_team, &totals)?;

            let mut vault = storage::get_vault(&env, &organizer)?;
            vault
                .owed
                .debit(round.currency, round.total_staked, Error::InvariantViolation)?;
            vault.owed.credit(round.currency, claims)?;
            vault::assert_solvent(&vault)?;
            storage::set_vault(&env, &organizer, &vault);
        }

        round.is_active = false;
        round.is_completed = true;
        round.winner = Some(winner_team.clone());
        team.is_winner = true;

        storage::extend_instance(&env);
        storage::set_round(&env, &round);
        storage::set_team(&env, &team);

        env.events().publish(
            (symbol_short!("R_DONE"), organizer, round_number),
            (winner_team, round.total_staked),
        );

        Ok(())
    }

    // ───────────── BETTING LEDGER ─────────────

    /// Escrow `amount` on `team`. `token` must be the tournament's current
    /// wager token: the wagering token while unstaked, the voting token after.
    pub fn place_bet(
        env: Env,
        user: Address,
        organizer: Address,
        round_number: u32,
        team: String,
        token: Address,
        amount: i128,
    ) -> Result<BetId, Error> {
        user.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let registry = storage::get_registry(&env)?;
        let tournament = Self::load_active_tournament(&env, &organizer)?;
        let mut round = Self::load_open_round(&env, &organizer, round_number)?;

        let team_id = TeamId {
            round: round.id.clone(),
            name: team,
        };
        let mut team = storage::get_team(&env, &team_id).map_err(|_| Error::TeamNotInRound)?;
        if team.is_eliminated {
            return Err(Error::InvalidState);
        }

        let currency = tournament.wager_kind();
        if registry.token(currency) != token {
            return Err(Error::InvalidState);
        }

        let id = BetId {
            team: team_id,
            user: user.clone(),
        };
        if storage::has_bet(&env, &id) {
            return Err(Error::DuplicateEntity);
        }

        if round.bet_count >= MAX_BETS_PER_ROUND {
            return Err(Error::CapacityExceeded);
        }

        round.total_staked = round
            .total_staked
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        team.total_staked = team
            .total_staked
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        round.bet_count += 1;
        round.currency = currency;

        let mut stakes = storage::get_round_stakes(&env, &round.id);
        stakes.push_back(Stake {
            user: user.clone(),
            team: id.team.name.clone(),
            amount,
        });

        let mut vault = storage::get_vault(&env, &organizer)?;
        vault::deposit(&env, &registry, &mut vault, currency, &user, amount)?;
        vault.owed.credit(currency, amount)?;
        vault.bet_count += 1;

        let bet = Bet {
            id: id.clone(),
            amount,
            currency,
            created_at: env.ledger().timestamp(),
            is_settled: false,
            is_winner: false,
            refunded: false,
            payout: 0,
        };
        storage::extend_instance(&env);
        storage::set_bet(&env, &bet);
        storage::set_round_stakes(&env, &round.id, &stakes);
        storage::set_team(&env, &team);
        storage::set_round(&env, &round);
        storage::set_vault(&env, &organizer, &vault);

        env.events().publish(
            (symbol_short!("BET"), user, round_number),
            (id.team.name.clone(), amount, currency),
        );

        Ok(id)
    }

    // ───────────── PAYOUT ENGINE ─────────────

    /// Settle one bet of a completed round. Winners receive their stake plus
    /// a proportional share of the forfeited pool; losers receive nothing.
    /// Returns the amount paid.
    pub fn settle_bet(env: Env, settler: Address, round: RoundId, bet: BetId) -> Result<i128, Error> {
        settler.require_auth();
        let registry = storage::get_registry(&env)?;
        let tournament = storage::get_tournament(&env, &round.tournament)?;

        let automated = registry.settler.as_ref() == Some(&settler);
        if tournament.authority != settler && !automated {
            return Err(Error::Unauthorized);
        }

        let mut round = storage::get_round(&env, &round)?;
        let mut bet = storage::get_bet(&env, &bet)?;

        if *bet.id.round() != round.id {
            return Err(Error::BetNotInRound);
        }
        if !round.is_completed {
            return Err(Error::InvalidState);
        }
        if bet.is_settled {
            return Err(Error::AlreadySettled);
        }

        let winner = round.winner.clone().ok_or(Error::InvariantViolation)?;
        let stakes = storage::get_round_stakes(&env, &round.id);
        let totals = payout::round_totals(&stakes, &winner, round.total_staked)?;

        let is_winner = bet.id.team.name == winner;
        let amount = if is_winner {
            payout::winner_payout(bet.amount, &totals)?
        } else {
            0
        };

        if amount > 0 {
            let paid_out = round.paid_out.checked_add(amount).ok_or(Error::Overflow)?;
            if paid_out > round.total_staked {
                return Err(Error::InvariantViolation);
            }
            round.paid_out = paid_out;

            let mut vault = storage::get_vault(&env, &round.id.tournament)?;
            vault.owed.debit(bet.currency, amount, Error::InvariantViolation)?;
            vault::release(
                &env,
                &registry,
                &mut vault,
                bet.currency,
                &bet.id.user,
                amount,
            )?;
            vault::assert_solvent(&vault)?;
            storage::set_vault(&env, &round.id.tournament, &vault);
        }

        bet.is_settled = true;
        bet.is_winner = is_winner;
        bet.payout = amount;
        round.settled_count += 1;

        storage::extend_instance(&env);
        storage::set_bet(&env, &bet);
        storage::set_round(&env, &round);

        log!(&env, "bet settled", is_winner, amount, totals.winning, totals.forfeited);
        env.events().publish(
            (symbol_short!("SETTLE"), bet.id.user.clone(), round.id.number),
            (is_winner, amount),
        );

        Ok(amount)
    }

    /// Return the stake of a bet whose round was never completed before the
    /// tournament closed.
    pub fn refund_bet(env: Env, user: Address, bet: BetId) -> Result<i128, Error> {
        user.require_auth();
        let registry = storage::get_registry(&env)?;
        let mut bet = storage::get_bet(&env, &bet)?;

        if bet.id.user != user {
            return Err(Error::Unauthorized);
        }

        let tournament = storage::get_tournament(&env, bet.id.tournament())?;
        let mut round = storage::get_round(&env, bet.id.round())?;
        if tournament.is_active || round.is_completed {
            return Err(Error::InvalidState);
        }
        if bet.is_settled {
            return Err(Error::AlreadySettled);
        }

        let paid_out = round
            .paid_out
            .checked_add(bet.amount)
            .ok_or(Error::Overflow)?;
        if paid_out > round.total_staked {
            return Err(Error::InvariantViolation);
        }
        round.paid_out = paid_out;
        round.settled_count += 1;

        let mut vault = storage::get_vault(&env, &tournament.authority)?;
        vault
            .owed
            .debit(bet.currency, bet.amount, Error::InvariantViolation)?;
        vault::release(&env, &registry, &mut vault, bet.currency, &user, bet.amount)?;

        bet.is_settled = true;
        bet.refunded = true;
        bet.payout = bet.amount;
        storage::extend_instance(&env);
        storage::set_bet(&env, &bet);
        storage::set_round(&env, &round);
        storage::set_vault(&env, &tournament.authority, &vault);

        env.events().publish(
            (symbol_short!("REFUND"), user, round.id.number),
            bet.amount,
        );

        Ok(bet.amount)
    }

    // ───────────── VIEWS ─────────────

    pub fn get_registry(env: Env) -> Result<Registry, Error> {
        storage::get_registry(&env)
    }

    pub fn get_tournament(env: Env, organizer: Address) -> Result<Tournament, Error> {
        storage::get_tournament(&env, &organizer)
    }

    pub fn get_vault(env: Env, organizer: Address) -> Result<Vault, Error> {
        storage::get_vault(&env, &organizer)
    }

    /// Total of `kind` held for all tournaments
    pub fn get_custody(env: Env, kind: TokenKind) -> i128 {
        storage::get_custody(&env, kind)
    }

    pub fn get_round(env: Env, organizer: Address, round_number: u32) -> Result<Round, Error> {
        storage::get_round(
            &env,
            &RoundId {
                tournament: organizer,
                number: round_number,
            },
        )
    }

    pub fn get_team(
        env: Env,
        organizer: Address,
        round_number: u32,
        name: String,
    ) -> Result<Team, Error> {
        let round = RoundId {
            tournament: organizer,
            number: round_number,
        };
        storage::get_team(&env, &TeamId { round, name })
    }

    pub fn get_bet(env: Env, bet: BetId) -> Result<Bet, Error> {
        storage::get_bet(&env, &bet)
    }

    /// Round numbers of a tournament in creation order
    pub fn get_rounds(env: Env, organizer: Address) -> Vec<u32> {
        storage::get_rounds(&env, &organizer)
    }

    pub fn get_round_bets(env: Env, organizer: Address, round_number: u32) -> Vec<BetId> {
        let round = RoundId {
            tournament: organizer,
            number: round_number,
        };
        let mut bets = Vec::new(&env);
        for stake in storage::get_round_stakes(&env, &round).iter() {
            bets.push_back(BetId {
                team: TeamId {
                    round: round.clone(),
                    name: stake.team,
                },
                user: stake.user,
            });
        }
        bets
    }

    /// Winning and forfeited pools of a completed round
    pub fn get_round_pool(
        env: Env,
        organizer: Address,
        round_number: u32,
    ) -> Result<PoolTotals, Error> {
        let round = Self::get_round(env.clone(), organizer, round_number)?;
        match round.winner.clone() {
            Some(winner) if round.is_completed => {
                let stakes = storage::get_round_stakes(&env, &round.id);
                payout::round_totals(&stakes, &winner, round.total_staked)
            }
            _ => Err(Error::InvalidState),
        }
    }

    // ───────────── INTERNAL HELPERS ─────────────

    fn assert_authority(env: &Env, authority: &Address) -> Result<Registry, Error> {
        let registry = storage::get_registry(env)?;
        if registry.authority != *authority {
            return Err(Error::Unauthorized);
        }
        Ok(registry)
    }

    fn assert_name(name: &String) -> Result<(), Error> {
        if name.len() == 0 || name.len() > MAX_NAME_LEN {
            return Err(Error::InvalidName);
        }
        Ok(())
    }

    fn load_active_tournament(env: &Env, organizer: &Address) -> Result<Tournament, Error> {
        let tournament = storage::get_tournament(env, organizer)?;
        if !tournament.is_active {
            return Err(Error::InvalidState);
        }
        Ok(tournament)
    }

    fn load_open_round(env: &Env, organizer: &Address, round_number: u32) -> Result<Round, Error> {
        let id = RoundId {
            tournament: organizer.clone(),
            number: round_number,
        };
        let round = storage::get_round(env, &id)?;
        if !round.is_active || round.is_completed {
            return Err(Error::InvalidState);
        }
        Ok(round)
    }
}
