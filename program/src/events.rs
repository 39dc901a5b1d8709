// Observable raffle events for indexers and front-ends
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{entrypoint::ProgramResult, log::sol_log_data, msg, pubkey::Pubkey};

/// Events are logged twice: a readable `msg!` line, and the borsh encoding
/// through `sol_log_data` so clients can decode them from transaction logs.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    EntryRecorded { entrant: Pubkey },
    DrawRequested { request_id: u64 },
    WinnerPicked { winner: Pubkey },
}

impl RaffleEvent {
    pub fn emit(&self) -> ProgramResult {
        match self {
            RaffleEvent::EntryRecorded { entrant } => msg!("EntryRecorded: {}", entrant),
            RaffleEvent::DrawRequested { request_id } => msg!("DrawRequested: {}", request_id),
            RaffleEvent::WinnerPicked { winner } => msg!("WinnerPicked: {}", winner),
        }
        sol_log_data(&[&self.try_to_vec()?]);
        Ok(())
    }

    /// Decode an event from a `Program data: <base64>` transaction log line
    pub fn from_log(line: &str) -> Option<Self> {
        let encoded = line.strip_prefix("Program data: ")?;
        let data = base64::decode(encoded).ok()?;
        Self::try_from_slice(&data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_encoding_is_tagged() {
        let winner = Pubkey::new_unique();
        let data = RaffleEvent::WinnerPicked { winner }.try_to_vec().unwrap();

        assert_eq!(data[0], 2);
        assert_eq!(&data[1..], winner.as_ref());
        assert_eq!(
            RaffleEvent::try_from_slice(&data).unwrap(),
            RaffleEvent::WinnerPicked { winner }
        );
    }

    #[test]
    fn test_from_log_reads_program_data() {
        let event = RaffleEvent::DrawRequested { request_id: 42 };
        let line = format!(
            "Program data: {}",
            base64::encode(event.try_to_vec().unwrap())
        );

        assert_eq!(RaffleEvent::from_log(&line), Some(event));
        assert_eq!(RaffleEvent::from_log("Program log: DrawRequested: 42"), None);
        assert_eq!(RaffleEvent::from_log("Program data: !!"), None);
    }
}
