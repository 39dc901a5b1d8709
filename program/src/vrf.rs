// VRF coordinator integration for the raffle program
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke_signed},
    program_error::ProgramError,
};

use crate::raffle_error::RaffleError;
use crate::raffle_state::RaffleConfig;

/// Randomness request sent to the VRF coordinator.
///
/// The coordinator receives the raffle account as signing consumer, followed
/// by whatever extra accounts the caller forwarded, and answers with the
/// request id as little-endian `u64` return data.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VrfRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl From<&RaffleConfig> for VrfRequest {
    fn from(config: &RaffleConfig) -> Self {
        Self {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: config.request_confirmations,
            callback_gas_limit: config.callback_gas_limit,
            num_words: config.num_words,
        }
    }
}

// Request random words from the coordinator, returning its request id
pub fn request_random_words<'a>(
    raffle_info: &AccountInfo<'a>,
    coordinator_program: &AccountInfo<'a>,
    remaining_accounts: &[AccountInfo<'a>],
    request: &VrfRequest,
    raffle_seeds: &[&[u8]],
) -> Result<u64, ProgramError> {
    let mut accounts = vec![AccountMeta::new_readonly(*raffle_info.key, true)];
    accounts.extend(remaining_accounts.iter().map(|acc| AccountMeta {
        pubkey: *acc.key,
        is_signer: acc.is_signer,
        is_writable: acc.is_writable,
    }));

    let mut account_infos = vec![raffle_info.clone(), coordinator_program.clone()];
    account_infos.extend_from_slice(remaining_accounts);

    invoke_signed(
        &Instruction {
            program_id: *coordinator_program.key,
            accounts,
            data: request.try_to_vec()?,
        },
        &account_infos,
        &[raffle_seeds],
    )?;

    let request_id = match get_return_data() {
        Some((program_id, data)) if program_id == *coordinator_program.key => {
            parse_request_id(&data)?
        }
        _ => {
            msg!("VRF coordinator did not return a request id");
            return Err(RaffleError::InvalidRandomnessResponse.into());
        }
    };
    Ok(request_id)
}

fn parse_request_id(data: &[u8]) -> Result<u64, RaffleError> {
    let bytes: [u8; 8] = data.try_into().map_err(|_| {
        msg!("Expected an 8 byte request id, got {} bytes", data.len());
        RaffleError::InvalidRandomnessResponse
    })?;
    Ok(u64::from_le_bytes(bytes))
}

// Only the configured oracle authority may deliver randomness
pub fn verify_oracle_authority(
    oracle_info: &AccountInfo,
    config: &RaffleConfig,
) -> Result<(), RaffleError> {
    if !oracle_info.is_signer {
        msg!("Oracle authority must sign the fulfillment");
        return Err(RaffleError::UnauthorizedOracle);
    }
    if *oracle_info.key != config.oracle_authority {
        msg!("Fulfillment signer {} is not the configured oracle", oracle_info.key);
        return Err(RaffleError::UnauthorizedOracle);
    }
    Ok(())
}

// Map a random word onto a pool position
pub fn winner_index(random_word: u64, players: usize) -> Option<usize> {
    if players == 0 {
        return None;
    }
    Some((random_word % players as u64) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::pubkey::Pubkey;

    #[test]
    fn test_winner_index_is_word_modulo_players() {
        assert_eq!(winner_index(7, 4), Some(3));
        assert_eq!(winner_index(8, 4), Some(0));
        assert_eq!(winner_index(u64::MAX, 1), Some(0));
        assert_eq!(winner_index(5, 0), None);
    }

    #[test]
    fn test_parse_request_id() {
        assert_eq!(parse_request_id(&42u64.to_le_bytes()), Ok(42));
        assert_eq!(parse_request_id(&0u64.to_le_bytes()), Ok(0));
        assert_eq!(
            parse_request_id(&[]),
            Err(RaffleError::InvalidRandomnessResponse)
        );
        assert_eq!(
            parse_request_id(&[0x2a]),
            Err(RaffleError::InvalidRandomnessResponse)
        );
        assert_eq!(
            parse_request_id(&[1u8; 9]),
            Err(RaffleError::InvalidRandomnessResponse)
        );
    }

    #[test]
    fn test_verify_oracle_authority() {
        let oracle = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let config = RaffleConfig {
            entrance_fee: 100,
            interval: 60,
            vrf_coordinator: Pubkey::new_unique(),
            oracle_authority: oracle,
            key_hash: [0u8; 32],
            subscription_id: 0,
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 1,
        };

        let mut lamports = 0;
        let mut data: Vec<u8> = vec![];
        let signed = AccountInfo::new(&oracle, true, false, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(verify_oracle_authority(&signed, &config), Ok(()));

        let mut lamports = 0;
        let mut data: Vec<u8> = vec![];
        let unsigned = AccountInfo::new(&oracle, false, false, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(
            verify_oracle_authority(&unsigned, &config),
            Err(RaffleError::UnauthorizedOracle)
        );

        let impostor = Pubkey::new_unique();
        let mut lamports = 0;
        let mut data: Vec<u8> = vec![];
        let other = AccountInfo::new(&impostor, true, false, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(
            verify_oracle_authority(&other, &config),
            Err(RaffleError::UnauthorizedOracle)
        );
    }

    #[test]
    fn test_request_mirrors_config() {
        let config = RaffleConfig {
            entrance_fee: 100,
            interval: 60,
            vrf_coordinator: Pubkey::new_unique(),
            oracle_authority: Pubkey::new_unique(),
            key_hash: [3u8; 32],
            subscription_id: 11,
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 2,
        };
        let request = VrfRequest::from(&config);
        assert_eq!(request.key_hash, [3u8; 32]);
        assert_eq!(request.subscription_id, 11);
        assert_eq!(request.request_confirmations, 3);
        assert_eq!(request.callback_gas_limit, 500_000);
        assert_eq!(request.num_words, 2);
    }
}
