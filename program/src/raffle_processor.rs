use borsh::BorshSerialize;

use crate::events::RaffleEvent;
use crate::raffle_error::RaffleError;
use crate::raffle_instruction::RaffleInstruction;
use crate::raffle_state::{Raffle, RaffleConfig};
use crate::utils::{self, RAFFLE_SEED};
use crate::vrf::{self, VrfRequest};

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle { nonce, config } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, nonce, config, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep {} => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    /// Create the raffle PDA and write its initial Open state
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        nonce: u64,
        config: RaffleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        // Verify the authority signed
        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        config.validate().map_err(|e| {
            msg!("Entrance fee and word count must be non-zero");
            e
        })?;

        // Verify the raffle address is the expected PDA
        let (expected_raffle_pubkey, bump_seed) =
            utils::find_raffle_address(program_id, authority_info.key, nonce);
        if *raffle_info.key != expected_raffle_pubkey {
            msg!("Invalid raffle account address");
            return Err(RaffleError::InvalidRaffleAccount.into());
        }

        if raffle_info.owner == program_id {
            if let Ok(raffle) = Raffle::unpack_unchecked(&raffle_info.data.borrow()) {
                if raffle.is_initialized {
                    msg!("Raffle account is already initialized");
                    return Err(ProgramError::AccountAlreadyInitialized);
                }
            }
        } else {
            msg!("Creating new raffle account");
            let rent = Rent::get()?;
            let rent_lamports = rent.minimum_balance(Raffle::LEN);

            invoke_signed(
                &system_instruction::create_account(
                    authority_info.key,
                    raffle_info.key,
                    rent_lamports,
                    Raffle::LEN as u64,
                    program_id,
                ),
                &[
                    authority_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
                &[&[
                    RAFFLE_SEED,
                    authority_info.key.as_ref(),
                    &nonce.to_le_bytes(),
                    &[bump_seed],
                ]],
            )?;
        }

        let clock = Clock::get()?;
        let raffle = Raffle::new(*authority_info.key, nonce, bump_seed, config, clock.unix_timestamp);
        let entrance_fee = raffle.config.entrance_fee;
        let interval = raffle.config.interval;
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: Address={}, EntranceFee={} SOL, Interval={}s",
            raffle_info.key,
            utils::lamports_to_sol(entrance_fee),
            interval
        );
        Ok(())
    }

    /// Record an entry and move the paid lamports into the raffle account
    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let entrant_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !entrant_info.is_signer {
            msg!("Entrant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::unpack(&raffle_info.data.borrow())?;

        raffle.enter(*entrant_info.key, amount).map_err(|e| {
            msg!("Entry rejected: {}", e);
            e
        })?;

        invoke(
            &system_instruction::transfer(entrant_info.key, raffle_info.key, amount),
            &[
                entrant_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        let players = raffle.number_of_players();
        let balance = raffle.balance;
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!("Entry recorded: players={}, balance={} lamports", players, balance);
        RaffleEvent::EntryRecorded {
            entrant: *entrant_info.key,
        }
        .emit()
    }

    /// Readiness is recomputed from the clock on every call and published as
    /// a borsh `UpkeepStatus`. The raffle account is never written.
    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::unpack(&raffle_info.data.borrow())?;
        let clock = Clock::get()?;
        let status = raffle.upkeep_status(clock.unix_timestamp);

        msg!(
            "Upkeep needed: {} (balance={}, players={}, state={:?}, last={})",
            status.upkeep_needed,
            status.balance,
            status.players,
            raffle.state,
            raffle.last_timestamp
        );
        set_return_data(&status.try_to_vec()?);
        Ok(())
    }

    /// Start a draw: persist `Calculating`, then ask the coordinator for
    /// randomness. A failed request puts the account back as it was.
    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let remaining_accounts = account_info_iter.as_slice();

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::unpack(&raffle_info.data.borrow())?;

        if *coordinator_info.key != raffle.config.vrf_coordinator {
            msg!("VRF coordinator does not match the one configured for this raffle");
            return Err(ProgramError::IncorrectProgramId);
        }

        let snapshot = raffle.clone();
        let clock = Clock::get()?;
        raffle.begin_draw(clock.unix_timestamp).map_err(|e| {
            msg!("{}", e);
            e
        })?;

        // Calculating is persisted before the coordinator is invoked
        Raffle::pack(raffle.clone(), &mut raffle_info.data.borrow_mut())?;

        let nonce_bytes = raffle.nonce.to_le_bytes();
        let bump = [raffle.bump];
        let raffle_seeds: &[&[u8]] = &[
            RAFFLE_SEED,
            raffle.authority.as_ref(),
            &nonce_bytes,
            &bump,
        ];
        let request = VrfRequest::from(&raffle.config);

        let request_id = match vrf::request_random_words(
            raffle_info,
            coordinator_info,
            remaining_accounts,
            &request,
            raffle_seeds,
        ) {
            Ok(request_id) => request_id,
            Err(err) => {
                msg!("Randomness request failed, reopening raffle");
                Raffle::pack(snapshot, &mut raffle_info.data.borrow_mut())?;
                return Err(err);
            }
        };

        raffle.record_request(request_id);
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        RaffleEvent::DrawRequested { request_id }.emit()
    }

    /// Pay the winner chosen by the delivered random words
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u64],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::unpack(&raffle_info.data.borrow())?;

        // Request ids are matched by the coordinator, not here
        vrf::verify_oracle_authority(oracle_info, &raffle.config)?;
        msg!("Fulfilling randomness request {}", request_id);

        let clock = Clock::get()?;
        let payout = raffle
            .fulfill(random_words, clock.unix_timestamp, |payout| {
                utils::transfer_prize(raffle_info, winner_info, payout)
            })
            .map_err(|e| {
                msg!("Fulfillment rejected: {}", e);
                e
            })?;

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Winner index {} paid {} SOL",
            payout.winner_index,
            utils::lamports_to_sol(payout.amount)
        );
        RaffleEvent::WinnerPicked {
            winner: payout.winner,
        }
        .emit()
    }
}
