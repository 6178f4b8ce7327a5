use std::cell::Cell;
use std::time::Duration;

use async_trait::async_trait;
use solana_program_test::{processor, BanksClient, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::{self, Transaction};
use tahu_client::{Error, Ledger, Result, SendOptions, TahuClient};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub fn program_test() -> ProgramTest {
    let mut program_test = ProgramTest::new(
        "tahu_program",
        tahu_program::ID,
        processor!(tahu_program::entry),
    );
    program_test.prefer_bpf(false);
    program_test
}

/// A [`Ledger`] over the in-process bank.
#[derive(Clone)]
pub struct BanksLedger(pub BanksClient);

fn banks_error(err: BanksClientError) -> Error {
    match err {
        BanksClientError::TransactionError(err) => err.into(),
        BanksClientError::SimulationError { err, .. } => err.into(),
        other => Error::Network(other.to_string()),
    }
}

#[async_trait(?Send)]
impl Ledger for BanksLedger {
    async fn latest_blockhash(&self) -> Result<Hash> {
        self.0.clone().get_latest_blockhash().await.map_err(banks_error)
    }

    async fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        self.0.clone().get_account(*address).await.map_err(banks_error)
    }

    async fn submit(&self, transaction: &Transaction) -> Result<Signature> {
        self.0
            .clone()
            .process_transaction(transaction.clone())
            .await
            .map_err(banks_error)?;
        Ok(transaction.signatures[0])
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<transaction::Result<()>>> {
        let status = self
            .0
            .clone()
            .get_transaction_status(*signature)
            .await
            .map_err(banks_error)?;
        Ok(status.map(|status| match status.err {
            Some(err) => Err(err),
            None => Ok(()),
        }))
    }
}

/// Processes the first submission, then stalls instead of reporting back.
pub struct LandsThenStalls {
    pub inner: BanksLedger,
    pub submissions: Cell<u32>,
}

#[async_trait(?Send)]
impl Ledger for LandsThenStalls {
    async fn latest_blockhash(&self) -> Result<Hash> {
        self.inner.latest_blockhash().await
    }

    async fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        self.inner.account(address).await
    }

    async fn submit(&self, transaction: &Transaction) -> Result<Signature> {
        self.submissions.set(self.submissions.get() + 1);
        let signature = self.inner.submit(transaction).await?;
        if self.submissions.get() == 1 {
            std::future::pending::<()>().await;
        }
        Ok(signature)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<transaction::Result<()>>> {
        self.inner.signature_status(signature).await
    }
}

pub fn test_options() -> SendOptions {
    SendOptions {
        confirm_timeout: Duration::from_secs(10),
        retry_max_elapsed: Duration::from_secs(2),
        retry_initial_interval: Duration::from_millis(50),
    }
}

pub fn clone_keypair(keypair: &Keypair) -> Keypair {
    Keypair::from_bytes(&keypair.to_bytes()).unwrap()
}

pub async fn fund(ctx: &mut ProgramTestContext, to: &Pubkey, lamports: u64) {
    let blockhash = ctx.banks_client.get_latest_blockhash().await.unwrap();
    let tx = Transaction::new_signed_with_payer(
        &[system_instruction::transfer(&ctx.payer.pubkey(), to, lamports)],
        Some(&ctx.payer.pubkey()),
        &[&ctx.payer],
        blockhash,
    );
    ctx.banks_client.process_transaction(tx).await.unwrap();
}

/// A client for a fresh keypair holding `lamports`.
pub async fn funded_client(ctx: &mut ProgramTestContext, lamports: u64) -> TahuClient<BanksLedger> {
    let payer = Keypair::new();
    fund(ctx, &payer.pubkey(), lamports).await;
    TahuClient::new(
        BanksLedger(ctx.banks_client.clone()),
        payer,
        test_options(),
    )
    .unwrap()
}
