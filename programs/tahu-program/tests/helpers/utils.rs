use super::{Error, Result};
use anchor_lang::error::ERROR_CODE_OFFSET;
use solana_program_test::{BanksClientError, ProgramTestContext};
use solana_sdk::instruction::{Instruction, InstructionError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::{Transaction, TransactionError};

pub async fn send_and_confirm_tx(
    ctx: &mut ProgramTestContext,
    ix: Vec<Instruction>,
    signers: Option<Vec<&Keypair>>,
) -> Result<()> {
    let mut signers = signers.unwrap_or_default();
    signers.push(&ctx.payer);

    let tx = Transaction::new_signed_with_payer(
        &ix,
        Some(&ctx.payer.pubkey()),
        &signers,
        ctx.last_blockhash,
    );

    ctx.banks_client.process_transaction(tx).await?;

    Ok(())
}

pub fn transfer_lamports(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    system_instruction::transfer(from, to, lamports)
}

/// The custom error code an instruction failed with, if any.
pub fn custom_error_code(err: &Error) -> Option<u32> {
    let tx_err = match err {
        Error::Client(BanksClientError::TransactionError(e)) => e,
        Error::Client(BanksClientError::SimulationError { err, .. }) => err,
        _ => return None,
    };
    match tx_err {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
        _ => None,
    }
}

pub fn assert_tahu_error(result: Result<()>, expected: tahu_program::TahuError) {
    let err = result.expect_err("instruction unexpectedly succeeded");
    assert_eq!(
        custom_error_code(&err),
        Some(expected as u32 + ERROR_CODE_OFFSET),
        "unexpected error: {err:?}"
    );
}
