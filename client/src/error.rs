use solana_client::client_error::ClientError;
use solana_sdk::instruction::InstructionError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction::SystemError;
use solana_sdk::transaction::TransactionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("account is already initialized")]
    AlreadyInitialized,
    #[error("signer cannot cover the fee or rent for this transaction")]
    InsufficientFunds,
    #[error("network error: {0}")]
    Network(String),
    #[error("transaction failed: {0}")]
    Program(TransactionError),
    #[error("account {0} does not exist")]
    AccountNotFound(Pubkey),
    #[error(transparent)]
    AccountDecode(#[from] anchor_lang::error::Error),
    #[error("failed to load keypair: {0}")]
    Keypair(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("program interface mismatch: {0}")]
    Interface(String),
}

impl Error {
    /// Transient failures that are safe to retry with a fresh blockhash.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// The custom error code of a failed instruction, e.g. an Anchor `TahuError`.
    pub fn program_error_code(&self) -> Option<u32> {
        match self {
            Error::Program(TransactionError::InstructionError(_, InstructionError::Custom(code))) => {
                Some(*code)
            }
            _ => None,
        }
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        match err {
            // Raised by the system program when `init` targets an account that already exists.
            TransactionError::InstructionError(_, InstructionError::Custom(code))
                if code == SystemError::AccountAlreadyInUse as u32 =>
            {
                Error::AlreadyInitialized
            }
            TransactionError::InstructionError(_, InstructionError::Custom(code))
                if code == SystemError::ResultWithNegativeLamports as u32 =>
            {
                Error::InsufficientFunds
            }
            TransactionError::InstructionError(_, InstructionError::InsufficientFunds)
            | TransactionError::InsufficientFundsForFee
            | TransactionError::InsufficientFundsForRent { .. }
            | TransactionError::AccountNotFound => Error::InsufficientFunds,
            TransactionError::BlockhashNotFound => {
                Error::Network("blockhash expired before confirmation".to_string())
            }
            other => Error::Program(other),
        }
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        match err.get_transaction_error() {
            Some(tx_err) => tx_err.into(),
            None => Error::Network(err.to_string()),
        }
    }
}
