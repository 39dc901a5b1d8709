use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::raffle_error::RaffleError;
use crate::vrf;

/// Maximum number of entries a single raffle account can hold
pub const MAX_PLAYERS: usize = 128;

const HEADER_LEN: usize = 235;
const POOL_LEN: usize = 32 * MAX_PLAYERS;

/// State of the raffle draw cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Entries accepted, a draw may be requested once ready
    Open,
    /// A randomness request is outstanding
    Calculating,
}

impl TryFrom<u8> for RaffleState {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err("Invalid raffle state"),
        }
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Raffle parameters, fixed once the raffle is initialized
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum payment per entry in lamports
    pub entrance_fee: u64,
    /// Minimum seconds between draws
    pub interval: u64,
    /// Program that accepts randomness requests
    pub vrf_coordinator: Pubkey,
    /// Identity that must sign randomness fulfillments
    pub oracle_authority: Pubkey,
    /// Oracle key hash, passed through untouched
    pub key_hash: [u8; 32],
    /// Oracle subscription, passed through untouched
    pub subscription_id: u64,
    /// Confirmations the oracle waits before answering
    pub request_confirmations: u16,
    /// Compute budget the oracle should attach to the fulfillment
    pub callback_gas_limit: u32,
    /// Number of random words requested per draw
    pub num_words: u32,
}

impl RaffleConfig {
    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 || self.num_words == 0 {
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }
}

/// Prize transfer computed by a fulfillment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub winner: Pubkey,
    pub winner_index: usize,
    pub amount: u64,
}

/// Last byte of every `UpkeepStatus` encoding
pub const UPKEEP_STATUS_MARKER: u8 = 0xA5;

/// Readiness answer published as return data by `CheckUpkeep`.
///
/// The runtime trims trailing zero bytes from return data, so the encoding
/// always ends with `UPKEEP_STATUS_MARKER`.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub upkeep_needed: bool,
    pub balance: u64,
    pub players: u32,
    /// `RaffleState` as stored in the account
    pub state: u8,
    pub marker: u8,
}

impl UpkeepStatus {
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let status = Self::try_from_slice(data)
            .map_err(|_| ProgramError::from(RaffleError::InvalidInstructionData))?;
        if status.marker != UPKEEP_STATUS_MARKER {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        Ok(status)
    }
}

/// Raffle account data
#[derive(Clone, Debug, PartialEq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Bump seed of the raffle PDA
    pub bump: u8,
    /// Account that created the raffle
    pub authority: Pubkey,
    /// Creator-chosen seed distinguishing raffles of the same authority
    pub nonce: u64,
    pub config: RaffleConfig,
    pub state: RaffleState,
    /// Time of initialization or of the last completed draw
    pub last_timestamp: UnixTimestamp,
    /// Lamports held for the prize, excluding rent
    pub balance: u64,
    pub recent_winner: Option<Pubkey>,
    /// Id of the most recent randomness request
    pub last_request_id: Option<u64>,
    /// Entrants in entry order
    pub players: Vec<Pubkey>,
}

impl Raffle {
    pub fn new(
        authority: Pubkey,
        nonce: u64,
        bump: u8,
        config: RaffleConfig,
        now: UnixTimestamp,
    ) -> Self {
        Self {
            is_initialized: true,
            bump,
            authority,
            nonce,
            config,
            state: RaffleState::Open,
            last_timestamp: now,
            balance: 0,
            recent_winner: None,
            last_request_id: None,
            players: Vec::new(),
        }
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.players.get(index)
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    /// Record a paid entry
    pub fn enter(&mut self, entrant: Pubkey, amount: u64) -> Result<(), RaffleError> {
        if amount < self.config.entrance_fee {
            return Err(RaffleError::InsufficientPayment {
                paid: amount,
                required: self.config.entrance_fee,
            });
        }
        if self.state != RaffleState::Open {
            return Err(RaffleError::RaffleNotOpen);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RaffleError::PoolFull);
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(RaffleError::Overflow)?;

        self.players.push(entrant);
        self.balance = balance;
        Ok(())
    }

    /// Whether a draw may be requested at `now`
    pub fn is_ready_for_draw(&self, now: UnixTimestamp) -> bool {
        let elapsed = now.saturating_sub(self.last_timestamp);
        let time_passed = elapsed >= 0 && elapsed as u64 >= self.config.interval;

        self.state == RaffleState::Open
            && time_passed
            && !self.players.is_empty()
            && self.balance > 0
    }

    /// Move to `Calculating` ahead of the randomness request
    pub fn begin_draw(&mut self, now: UnixTimestamp) -> Result<(), RaffleError> {
        if !self.is_ready_for_draw(now) {
            return Err(RaffleError::UpkeepNotReady {
                balance: self.balance,
                players: self.players.len() as u64,
                state: self.state,
            });
        }
        self.state = RaffleState::Calculating;
        Ok(())
    }

    /// Diagnostic snapshot answered by `CheckUpkeep`
    pub fn upkeep_status(&self, now: UnixTimestamp) -> UpkeepStatus {
        UpkeepStatus {
            upkeep_needed: self.is_ready_for_draw(now),
            balance: self.balance,
            players: self.players.len() as u32,
            state: self.state.into(),
            marker: UPKEEP_STATUS_MARKER,
        }
    }

    /// Remember the coordinator's id for the outstanding draw
    pub fn record_request(&mut self, request_id: u64) {
        self.last_request_id = Some(request_id);
    }

    /// Pick the winner from `random_words`, reset the raffle and hand the
    /// prize to `pay`.
    ///
    /// The reset is applied before `pay` runs. If `pay` fails the raffle is
    /// restored to its state before the call and `PayoutTransferFailed` is
    /// returned.
    pub fn fulfill<F>(
        &mut self,
        random_words: &[u64],
        now: UnixTimestamp,
        pay: F,
    ) -> Result<Payout, RaffleError>
    where
        F: FnOnce(&Payout) -> Result<(), RaffleError>,
    {
        if self.state != RaffleState::Calculating {
            return Err(RaffleError::NoDrawPending);
        }
        let random_word = *random_words.first().ok_or(RaffleError::EmptyRandomWords)?;
        // Calculating always holds a non-empty pool since entries are blocked
        let winner_index =
            vrf::winner_index(random_word, self.players.len()).ok_or(RaffleError::NoDrawPending)?;

        let snapshot = self.clone();
        let payout = Payout {
            winner: self.players[winner_index],
            winner_index,
            amount: self.balance,
        };

        self.recent_winner = Some(payout.winner);
        self.players.clear();
        self.last_timestamp = now;
        self.state = RaffleState::Open;
        self.balance = 0;

        if pay(&payout).is_err() {
            *self = snapshot;
            return Err(RaffleError::PayoutTransferFailed);
        }
        Ok(payout)
    }
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

fn unpack_option_key(tag: &[u8; 1], key: &[u8; 32]) -> Result<Option<Pubkey>, ProgramError> {
    match tag[0] {
        0 => Ok(None),
        1 => Ok(Some(Pubkey::new_from_array(*key))),
        _ => Err(ProgramError::InvalidAccountData),
    }
}

fn pack_option_key(src: &Option<Pubkey>, tag: &mut [u8; 1], key: &mut [u8; 32]) {
    match src {
        Some(pubkey) => {
            tag[0] = 1;
            key.copy_from_slice(pubkey.as_ref());
        }
        None => {
            tag[0] = 0;
            *key = [0u8; 32];
        }
    }
}

fn unpack_option_u64(tag: &[u8; 1], value: &[u8; 8]) -> Result<Option<u64>, ProgramError> {
    match tag[0] {
        0 => Ok(None),
        1 => Ok(Some(u64::from_le_bytes(*value))),
        _ => Err(ProgramError::InvalidAccountData),
    }
}

fn pack_option_u64(src: &Option<u64>, tag: &mut [u8; 1], value: &mut [u8; 8]) {
    match src {
        Some(v) => {
            tag[0] = 1;
            *value = v.to_le_bytes();
        }
        None => {
            tag[0] = 0;
            *value = [0u8; 8];
        }
    }
}

impl Pack for Raffle {
    const LEN: usize = HEADER_LEN + POOL_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        if src.len() < Raffle::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        let src = array_ref![src, 0, Raffle::LEN];
        let (header, pool) = array_refs![src, HEADER_LEN, POOL_LEN];
        let (
            is_initialized,
            bump,
            authority,
            nonce,
            entrance_fee,
            interval,
            vrf_coordinator,
            oracle_authority,
            key_hash,
            subscription_id,
            request_confirmations,
            callback_gas_limit,
            num_words,
            state,
            last_timestamp,
            balance,
            recent_winner_tag,
            recent_winner,
            request_tag,
            last_request_id,
            players_len,
        ) = array_refs![
            header, 1, 1, 32, 8, 8, 8, 32, 32, 32, 8, 2, 4, 4, 1, 8, 8, 1, 32, 1, 8, 4
        ];

        let state =
            RaffleState::try_from(state[0]).map_err(|_| ProgramError::InvalidAccountData)?;

        let players_len = u32::from_le_bytes(*players_len) as usize;
        if players_len > MAX_PLAYERS {
            return Err(ProgramError::InvalidAccountData);
        }
        let players = pool
            .chunks_exact(32)
            .take(players_len)
            .map(|chunk| {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(chunk);
                Pubkey::new_from_array(bytes)
            })
            .collect();

        Ok(Raffle {
            is_initialized: is_initialized[0] != 0,
            bump: bump[0],
            authority: Pubkey::new_from_array(*authority),
            nonce: u64::from_le_bytes(*nonce),
            config: RaffleConfig {
                entrance_fee: u64::from_le_bytes(*entrance_fee),
                interval: u64::from_le_bytes(*interval),
                vrf_coordinator: Pubkey::new_from_array(*vrf_coordinator),
                oracle_authority: Pubkey::new_from_array(*oracle_authority),
                key_hash: *key_hash,
                subscription_id: u64::from_le_bytes(*subscription_id),
                request_confirmations: u16::from_le_bytes(*request_confirmations),
                callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
                num_words: u32::from_le_bytes(*num_words),
            },
            state,
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            balance: u64::from_le_bytes(*balance),
            recent_winner: unpack_option_key(recent_winner_tag, recent_winner)?,
            last_request_id: unpack_option_u64(request_tag, last_request_id)?,
            players,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Raffle::LEN];
        let (header_dst, pool_dst) = mut_array_refs![dst, HEADER_LEN, POOL_LEN];
        let (
            is_initialized_dst,
            bump_dst,
            authority_dst,
            nonce_dst,
            entrance_fee_dst,
            interval_dst,
            vrf_coordinator_dst,
            oracle_authority_dst,
            key_hash_dst,
            subscription_id_dst,
            request_confirmations_dst,
            callback_gas_limit_dst,
            num_words_dst,
            state_dst,
            last_timestamp_dst,
            balance_dst,
            recent_winner_tag_dst,
            recent_winner_dst,
            request_tag_dst,
            last_request_id_dst,
            players_len_dst,
        ) = mut_array_refs![
            header_dst, 1, 1, 32, 8, 8, 8, 32, 32, 32, 8, 2, 4, 4, 1, 8, 8, 1, 32, 1, 8, 4
        ];

        is_initialized_dst[0] = self.is_initialized as u8;
        bump_dst[0] = self.bump;
        authority_dst.copy_from_slice(self.authority.as_ref());
        *nonce_dst = self.nonce.to_le_bytes();
        *entrance_fee_dst = self.config.entrance_fee.to_le_bytes();
        *interval_dst = self.config.interval.to_le_bytes();
        vrf_coordinator_dst.copy_from_slice(self.config.vrf_coordinator.as_ref());
        oracle_authority_dst.copy_from_slice(self.config.oracle_authority.as_ref());
        *key_hash_dst = self.config.key_hash;
        *subscription_id_dst = self.config.subscription_id.to_le_bytes();
        *request_confirmations_dst = self.config.request_confirmations.to_le_bytes();
        *callback_gas_limit_dst = self.config.callback_gas_limit.to_le_bytes();
        *num_words_dst = self.config.num_words.to_le_bytes();
        state_dst[0] = self.state.into();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();
        *balance_dst = self.balance.to_le_bytes();
        pack_option_key(&self.recent_winner, recent_winner_tag_dst, recent_winner_dst);
        pack_option_u64(&self.last_request_id, request_tag_dst, last_request_id_dst);
        *players_len_dst = (self.players.len() as u32).to_le_bytes();

        pool_dst.fill(0);
        for (slot, player) in pool_dst.chunks_exact_mut(32).zip(self.players.iter()) {
            slot.copy_from_slice(player.as_ref());
        }
    }
}
