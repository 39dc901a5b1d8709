// Raffle Program - Utility Functions
use solana_program::{account_info::AccountInfo, msg, pubkey::Pubkey};

use crate::raffle_error::RaffleError;
use crate::raffle_state::Payout;

pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Find the program derived address of a raffle
pub fn find_raffle_address(program_id: &Pubkey, authority: &Pubkey, nonce: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[RAFFLE_SEED, authority.as_ref(), &nonce.to_le_bytes()],
        program_id,
    )
}

/// Move the prize out of the program-owned raffle account into the winner
pub fn transfer_prize(
    raffle_info: &AccountInfo,
    winner_info: &AccountInfo,
    payout: &Payout,
) -> Result<(), RaffleError> {
    if *winner_info.key != payout.winner {
        msg!(
            "Winner account {} does not match selected winner {}",
            winner_info.key,
            payout.winner
        );
        return Err(RaffleError::PayoutTransferFailed);
    }
    if !winner_info.is_writable {
        msg!("Winner account must be writable");
        return Err(RaffleError::PayoutTransferFailed);
    }

    let raffle_lamports = raffle_info
        .lamports()
        .checked_sub(payout.amount)
        .ok_or(RaffleError::PayoutTransferFailed)?;
    let winner_lamports = winner_info
        .lamports()
        .checked_add(payout.amount)
        .ok_or(RaffleError::PayoutTransferFailed)?;

    let mut from = raffle_info
        .try_borrow_mut_lamports()
        .map_err(|_| RaffleError::PayoutTransferFailed)?;
    let mut to = winner_info
        .try_borrow_mut_lamports()
        .map_err(|_| RaffleError::PayoutTransferFailed)?;
    **from = raffle_lamports;
    **to = winner_lamports;
    Ok(())
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}
