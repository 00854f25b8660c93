//! Pari-mutuel settlement math.

use soroban_sdk::{contracttype, String, Vec};

use crate::errors::Error;
use crate::types::Stake;

/// Stake totals of a resolved round.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolTotals {
    /// Sum of stakes on the winning team.
    pub winning: i128,
    /// Sum of stakes on every other team.
    pub forfeited: i128,
}

impl PoolTotals {
    pub fn empty() -> Self {
        PoolTotals {
            winning: 0,
            forfeited: 0,
        }
    }

    pub(crate) fn add(&mut self, on_winner: bool, amount: i128) -> Result<(), Error> {
        let pool = if on_winner {
            &mut self.winning
        } else {
            &mut self.forfeited
        };
        *pool = pool.checked_add(amount).ok_or(Error::Overflow)?;
        Ok(())
    }

    pub fn total(&self) -> Result<i128, Error> {
        self.winning
            .checked_add(self.forfeited)
            .ok_or(Error::Overflow)
    }
}

/// Stake plus a share of the forfeited pool proportional to the stake's share
/// of the winning pool, truncated. Zero when nobody backed the winner.
pub(crate) fn winner_payout(amount: i128, totals: &PoolTotals) -> Result<i128, Error> {
    if totals.winning == 0 {
        return Ok(0);
    }
    let share = totals
        .forfeited
        .checked_mul(amount)
        .ok_or(Error::Overflow)?
        / totals.winning;
    amount.checked_add(share).ok_or(Error::Overflow)
}

/// Recompute a round's totals from its full bet population. `total_staked`
/// is the round's running sum and must agree.
pub(crate) fn round_totals(
    stakes: &Vec<Stake>,
    winner: &String,
    total_staked: i128,
) -> Result<PoolTotals, Error> {
    let mut totals = PoolTotals::empty();
    for stake in stakes.iter() {
        totals.add(stake.team == *winner, stake.amount)?;
    }

    if totals.total()? != total_staked {
        return Err(Error::InvariantViolation);
    }
    Ok(totals)
}

/// Sum of every winner payout of a resolved round.
pub(crate) fn winning_claims(
    stakes: &Vec<Stake>,
    winner: &String,
    totals: &PoolTotals,
) -> Result<i128, Error> {
    let mut claims: i128 = 0;
    for stake in stakes.iter() {
        if stake.team == *winner {
            let payout = winner_payout(stake.amount, totals)?;
            claims = claims.checked_add(payout).ok_or(Error::Overflow)?;
        }
    }
    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{testutils::Address as _, vec, Address, Env};

    fn totals(winning: i128, forfeited: i128) -> PoolTotals {
        PoolTotals { winning, forfeited }
    }

    fn stake(env: &Env, team: &str, amount: i128) -> Stake {
        Stake {
            user: Address::generate(env),
            team: String::from_str(env, team),
            amount,
        }
    }

    #[test]
    fn test_single_backer_takes_whole_pool() {
        // 1000 on the winner, 2000 forfeited.
        assert_eq!(winner_payout(1000, &totals(1000, 2000)), Ok(3000));
    }

    #[test]
    fn test_three_teams_many_backers() {
        // X: 1000 + 3000, Y: 2000, Z: 1500; X wins.
        let pool = totals(4000, 3500);
        let a = winner_payout(1000, &pool).unwrap();
        let c = winner_payout(3000, &pool).unwrap();

        assert_eq!(a, 1875);
        assert_eq!(c, 5625);
        assert_eq!(a + c, pool.total().unwrap());
    }

    #[test]
    fn test_truncation_leaves_dust() {
        // X: 1000 + 2000, forfeited 2000 split in thirds.
        let pool = totals(3000, 2000);
        let a = winner_payout(1000, &pool).unwrap();
        let c = winner_payout(2000, &pool).unwrap();

        assert_eq!(a, 1666);
        assert_eq!(c, 3333);
        assert_eq!(pool.total().unwrap() - (a + c), 1);
    }

    #[test]
    fn test_no_forfeits_returns_stake() {
        assert_eq!(winner_payout(750, &totals(750, 0)), Ok(750));
    }

    #[test]
    fn test_empty_winning_pool_pays_nothing() {
        assert_eq!(winner_payout(500, &totals(0, 500)), Ok(0));
    }

    #[test]
    fn test_overflow_is_reported() {
        let pool = totals(1, i128::MAX);
        assert_eq!(winner_payout(2, &pool), Err(Error::Overflow));
    }

    #[test]
    fn test_tally_splits_by_winner() {
        let mut pool = PoolTotals::empty();
        pool.add(true, 100).unwrap();
        pool.add(false, 40).unwrap();
        pool.add(true, 10).unwrap();

        assert_eq!(pool, totals(110, 40));
        assert_eq!(pool.add(true, i128::MAX), Err(Error::Overflow));
    }

    #[test]
    fn test_round_ledger_totals_and_claims() {
        let env = Env::default();
        let winner = String::from_str(&env, "X");
        let stakes = vec![
            &env,
            stake(&env, "X", 1000),
            stake(&env, "Y", 1000),
            stake(&env, "X", 2000),
            stake(&env, "Z", 1000),
        ];

        let pool = round_totals(&stakes, &winner, 5000).unwrap();
        assert_eq!(pool, totals(3000, 2000));
        assert_eq!(winning_claims(&stakes, &winner, &pool), Ok(4999));
    }

    #[test]
    fn test_round_ledger_must_match_running_total() {
        let env = Env::default();
        let winner = String::from_str(&env, "X");
        let stakes = vec![&env, stake(&env, "X", 1000), stake(&env, "Y", 500)];

        assert_eq!(
            round_totals(&stakes, &winner, 1400),
            Err(Error::InvariantViolation)
        );
    }
}
