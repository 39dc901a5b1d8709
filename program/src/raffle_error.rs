use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

use crate::raffle_state::RaffleState;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Payment is below the entrance fee
    #[error("Insufficient payment: paid {paid} lamports, entrance fee is {required}")]
    InsufficientPayment { paid: u64, required: u64 },

    /// Entries are only accepted while the raffle is open
    #[error("Raffle is not open")]
    RaffleNotOpen,

    /// A draw was requested before the raffle was ready
    #[error("Upkeep not needed: balance {balance}, players {players}, state {state:?}")]
    UpkeepNotReady {
        balance: u64,
        players: u64,
        state: RaffleState,
    },

    /// The prize could not be moved to the winner
    #[error("Payout transfer to the winner failed")]
    PayoutTransferFailed,

    /// Fulfillment was not signed by the configured oracle authority
    #[error("Only the configured oracle authority can deliver randomness")]
    UnauthorizedOracle,

    /// Fulfillment arrived while no draw was outstanding
    #[error("No draw is pending")]
    NoDrawPending,

    #[error("Randomness response carried no random words")]
    EmptyRandomWords,

    #[error("Raffle pool is full")]
    PoolFull,

    #[error("Arithmetic overflow")]
    Overflow,

    /// Raffle config rejected at initialization
    #[error("Invalid raffle config")]
    InvalidConfig,

    /// Account does not match the raffle address derived from its seeds
    #[error("Invalid raffle account")]
    InvalidRaffleAccount,

    /// The coordinator did not hand back a request id
    #[error("Invalid randomness request response")]
    InvalidRandomnessResponse,
}

impl RaffleError {
    /// Stable custom error code surfaced through `ProgramError::Custom`
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::InvalidInstructionData => 0,
            RaffleError::InsufficientPayment { .. } => 1,
            RaffleError::RaffleNotOpen => 2,
            RaffleError::UpkeepNotReady { .. } => 3,
            RaffleError::PayoutTransferFailed => 4,
            RaffleError::UnauthorizedOracle => 5,
            RaffleError::NoDrawPending => 6,
            RaffleError::EmptyRandomWords => 7,
            RaffleError::PoolFull => 8,
            RaffleError::Overflow => 9,
            RaffleError::InvalidConfig => 10,
            RaffleError::InvalidRaffleAccount => 11,
            RaffleError::InvalidRandomnessResponse => 12,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e.code())
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
