use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    /// Caller is not the authority, organizer, settler or bettor the call requires.
    Unauthorized = 3,
    /// Wrong lifecycle state, or a wager addressed to the inactive token kind.
    InvalidState = 4,
    DuplicateEntity = 5,
    AlreadySettled = 6,
    AlreadyStaked = 7,
    InsufficientBalance = 8,
    /// An escrow accounting check failed; the whole call is aborted.
    InvariantViolation = 9,
    InvalidAmount = 10,
    InvalidName = 11,
    NotFound = 12,
    TeamNotInRound = 13,
    BetNotInRound = 14,
    CapacityExceeded = 15,
    Overflow = 16,
    MintDelegationMissing = 17,
}
