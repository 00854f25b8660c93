use soroban_sdk::{contracttype, Address, String};

use crate::errors::Error;

/// The three token kinds a tournament can hold in escrow.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum TokenKind {
    /// Default wagering token, used while a tournament is unstaked.
    Wagering = 0,
    /// Deposited by the organizer to stake a tournament.
    Collateral = 1,
    /// Minted against collateral; used for wagers once a tournament is staked.
    Voting = 2,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registry {
    pub authority: Address,
    pub wagering_token: Address,
    pub collateral_token: Address,
    pub voting_token: Address,
    pub faucet: Address,
    /// Automated settler allowed to call `settle_bet` besides the organizer.
    pub settler: Option<Address>,
}

impl Registry {
    pub fn token(&self, kind: TokenKind) -> Address {
        match kind {
            TokenKind::Wagering => self.wagering_token.clone(),
            TokenKind::Collateral => self.collateral_token.clone(),
            TokenKind::Voting => self.voting_token.clone(),
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tournament {
    pub authority: Address,
    pub name: String,
    /// Intended collateral target until staked, the deposited amount after.
    pub stake_amount: i128,
    pub is_staked: bool,
    pub is_active: bool,
    pub created_at: u64,
    /// Voting supply minted against this tournament's collateral.
    pub voting_minted: i128,
}

impl Tournament {
    /// Token kind every wager on this tournament is denominated in.
    pub fn wager_kind(&self) -> TokenKind {
        if self.is_staked {
            TokenKind::Voting
        } else {
            TokenKind::Wagering
        }
    }
}

/// One amount per token kind.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Balances {
    pub wagering: i128,
    pub collateral: i128,
    pub voting: i128,
}

impl Balances {
    pub fn empty() -> Self {
        Balances {
            wagering: 0,
            collateral: 0,
            voting: 0,
        }
    }

    pub fn get(&self, kind: TokenKind) -> i128 {
        match kind {
            TokenKind::Wagering => self.wagering,
            TokenKind::Collateral => self.collateral,
            TokenKind::Voting => self.voting,
        }
    }

    fn slot(&mut self, kind: TokenKind) -> &mut i128 {
        match kind {
            TokenKind::Wagering => &mut self.wagering,
            TokenKind::Collateral => &mut self.collateral,
            TokenKind::Voting => &mut self.voting,
        }
    }

    pub(crate) fn credit(&mut self, kind: TokenKind, amount: i128) -> Result<(), Error> {
        let slot = self.slot(kind);
        *slot = slot.checked_add(amount).ok_or(Error::Overflow)?;
        Ok(())
    }

    /// Fails with `shortfall` when the slot holds less than `amount`.
    pub(crate) fn debit(&mut self, kind: TokenKind, amount: i128, shortfall: Error) -> Result<(), Error> {
        let slot = self.slot(kind);
        if *slot < amount {
            return Err(shortfall);
        }
        *slot -= amount;
        Ok(())
    }
}

/// Per-tournament escrow.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Vault {
    /// Tokens held for the tournament, one sub-account per kind.
    pub held: Balances,
    /// What unsettled bets can still draw: face value while their round is
    /// open, the exact winner payout once it is completed.
    pub owed: Balances,
    /// Wagers ever placed against the tournament.
    pub bet_count: u32,
}

impl Vault {
    pub fn empty() -> Self {
        Vault {
            held: Balances::empty(),
            owed: Balances::empty(),
            bet_count: 0,
        }
    }

    /// Held balance of `kind` no unsettled bet can claim.
    pub fn surplus(&self, kind: TokenKind) -> i128 {
        self.held.get(kind) - self.owed.get(kind)
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundId {
    pub tournament: Address,
    pub number: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Round {
    pub id: RoundId,
    pub name: String,
    pub is_active: bool,
    pub is_completed: bool,
    pub winner: Option<String>,
    /// Kind every stake in this round is denominated in.
    pub currency: TokenKind,
    pub created_at: u64,
    pub team_count: u32,
    pub bet_count: u32,
    pub settled_count: u32,
    /// Running sum of every stake placed in this round.
    pub total_staked: i128,
    /// Running sum of every payout and refund drawn from this round.
    pub paid_out: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TeamId {
    pub round: RoundId,
    pub name: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub is_winner: bool,
    pub is_eliminated: bool,
    pub total_staked: i128,
}

/// One wager per (round, team, user).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BetId {
    pub team: TeamId,
    pub user: Address,
}

impl BetId {
    pub fn round(&self) -> &RoundId {
        &self.team.round
    }

    pub fn tournament(&self) -> &Address {
        &self.team.round.tournament
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bet {
    pub id: BetId,
    pub amount: i128,
    pub currency: TokenKind,
    pub created_at: u64,
    pub is_settled: bool,
    pub is_winner: bool,
    pub refunded: bool,
    pub payout: i128,
}

/// A round ledger line: who staked how much on which team.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stake {
    pub user: Address,
    pub team: String,
    pub amount: i128,
}

#[contracttype]
pub enum DataKey {
    Registry,
    Custody(TokenKind),        // i128 held for all tournaments
    Tournament(Address),       // keyed by organizer
    Vault(Address),
    TournamentRounds(Address), // Vec<u32>
    Round(RoundId),
    RoundStakes(RoundId),      // Vec<Stake>, the round's full bet population
    Team(TeamId),
    Bet(BetId),
}
