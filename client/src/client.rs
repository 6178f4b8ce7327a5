use std::time::Duration;

use anchor_lang::{AccountDeserialize, Discriminator};
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use solana_account_decoder::UiAccountEncoding;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tahu_program::{
    CreateDaoArgs, CreateProposalArgs, Dao, DaoUpdate, Proposal, State, VoteRecord, VoteType,
    VotingThresholds,
};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::interface;
use crate::instructions;
use crate::ledger::{Ledger, RpcLedger};

/// Bounds on how long a single submission may take.
#[derive(Debug, Clone, Copy)]
pub struct SendOptions {
    /// How long to wait for one attempt to confirm before treating it as a network failure.
    pub confirm_timeout: Duration,
    /// Total time spent retrying network failures.
    pub retry_max_elapsed: Duration,
    pub retry_initial_interval: Duration,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            confirm_timeout: Duration::from_secs(60),
            retry_max_elapsed: Duration::from_secs(120),
            retry_initial_interval: Duration::from_millis(500),
        }
    }
}

/// Submits tahu instructions to a [`Ledger`], signed and paid for by `payer`.
pub struct TahuClient<L> {
    ledger: L,
    payer: Keypair,
    options: SendOptions,
}

impl<L: Ledger> TahuClient<L> {
    /// Fails with [`Error::Interface`] if the program bindings disagree with
    /// [`interface::PROGRAM_INTERFACE`].
    pub fn new(ledger: L, payer: Keypair, options: SendOptions) -> Result<Self> {
        interface::verify_all()?;
        Ok(Self {
            ledger,
            payer,
            options,
        })
    }

    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The payer's state account.
    pub fn state_address(&self) -> Pubkey {
        State::address(&self.payer.pubkey()).0
    }

    /// Creates the payer's state account.
    ///
    /// Returns [`Error::AlreadyInitialized`] without submitting anything if the account
    /// already exists.
    pub async fn initialize(&self) -> Result<Signature> {
        let state = self.state_address();
        self.ensure_vacant(&state).await?;

        let signature = self.send(instructions::initialize(&self.payer())).await?;
        info!(%state, %signature, "state initialized");
        Ok(signature)
    }

    /// Creates a DAO under the payer's state and returns its address.
    pub async fn create_dao(&self, args: CreateDaoArgs) -> Result<(Pubkey, Signature)> {
        let state = self.state().await?;
        let (dao, _) = Dao::address(&self.state_address(), state.dao_count);

        let signature = self
            .send(instructions::create_dao(&self.payer(), state.dao_count, args))
            .await?;
        info!(%dao, id = state.dao_count, %signature, "dao created");
        Ok((dao, signature))
    }

    pub async fn update_dao(&self, dao: &Pubkey, update: DaoUpdate) -> Result<Signature> {
        self.send(instructions::update_dao(&self.payer(), dao, update))
            .await
    }

    pub async fn add_member(&self, dao: &Pubkey, member: &Pubkey) -> Result<Signature> {
        let signature = self
            .send(instructions::add_member(&self.payer(), dao, member))
            .await?;
        info!(%dao, %member, "member added");
        Ok(signature)
    }

    pub async fn remove_member(&self, dao: &Pubkey, member: &Pubkey) -> Result<Signature> {
        let signature = self
            .send(instructions::remove_member(&self.payer(), dao, member))
            .await?;
        info!(%dao, %member, "member removed");
        Ok(signature)
    }

    pub async fn change_voting_thresholds(
        &self,
        dao: &Pubkey,
        thresholds: VotingThresholds,
    ) -> Result<Signature> {
        self.send(instructions::change_voting_thresholds(
            &self.payer(),
            dao,
            thresholds,
        ))
        .await
    }

    /// Opens a proposal on `dao` and returns its address.
    pub async fn create_proposal(
        &self,
        dao: &Pubkey,
        args: CreateProposalArgs,
    ) -> Result<(Pubkey, Signature)> {
        let index = self.dao(dao).await?.proposal_count;
        let (proposal, _) = Proposal::address(dao, index);

        let signature = self
            .send(instructions::create_proposal(&self.payer(), dao, index, args))
            .await?;
        info!(%dao, %proposal, id = index, %signature, "proposal created");
        Ok((proposal, signature))
    }

    /// Casts the payer's vote. A member votes at most once per proposal; a repeat vote
    /// returns [`Error::AlreadyInitialized`].
    pub async fn vote(&self, proposal: &Pubkey, vote_type: VoteType) -> Result<Signature> {
        let (record, _) = VoteRecord::address(proposal, &self.payer());
        self.ensure_vacant(&record).await?;

        let dao = self.proposal(proposal).await?.dao;
        let signature = self
            .send(instructions::vote_on_proposal(
                &self.payer(),
                &dao,
                proposal,
                vote_type,
            ))
            .await?;
        info!(%proposal, ?vote_type, %signature, "vote cast");
        Ok(signature)
    }

    pub async fn execute_proposal(&self, proposal: &Pubkey) -> Result<Signature> {
        let dao = self.proposal(proposal).await?.dao;
        let signature = self
            .send(instructions::execute_proposal(&dao, proposal))
            .await?;
        info!(%dao, %proposal, %signature, "proposal executed");
        Ok(signature)
    }

    pub async fn fetch<T: AccountDeserialize>(&self, address: &Pubkey) -> Result<T> {
        let account = self
            .ledger
            .account(address)
            .await?
            .ok_or(Error::AccountNotFound(*address))?;
        Ok(T::try_deserialize(&mut account.data.as_slice())?)
    }

    pub async fn state(&self) -> Result<State> {
        self.fetch(&self.state_address()).await
    }

    pub async fn dao(&self, address: &Pubkey) -> Result<Dao> {
        self.fetch(address).await
    }

    pub async fn proposal(&self, address: &Pubkey) -> Result<Proposal> {
        self.fetch(address).await
    }

    /// Fails with [`Error::AlreadyInitialized`] once the program owns `address`. Lamports
    /// sent to a still-unallocated address do not count.
    async fn ensure_vacant(&self, address: &Pubkey) -> Result<()> {
        match self.ledger.account(address).await? {
            Some(account) if account.owner == tahu_program::ID || !account.data.is_empty() => {
                Err(Error::AlreadyInitialized)
            }
            _ => Ok(()),
        }
    }

    /// Submits `instruction`, retrying network failures with exponential backoff.
    ///
    /// Before each retry the signatures of earlier attempts are looked up, so an attempt that
    /// landed after its confirmation wait ran out is reported instead of being signed again.
    async fn send(&self, instruction: Instruction) -> Result<Signature> {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.options.retry_initial_interval,
            max_interval: Duration::from_secs(30),
            max_elapsed_time: Some(self.options.retry_max_elapsed),
            ..ExponentialBackoff::default()
        };
        backoff.reset();
        let mut submitted = Vec::new();

        loop {
            let err = match self.try_send(&instruction, &mut submitted).await {
                Ok(signature) => return Ok(signature),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            let delay = backoff.next_backoff();
            if let Some(delay) = delay {
                warn!(?delay, %err, "retrying transaction");
                tokio::time::sleep(delay).await;
            }
            if let Some(outcome) = self.earlier_outcome(&submitted).await {
                return outcome;
            }
            if delay.is_none() {
                return Err(err);
            }
        }
    }

    async fn earlier_outcome(&self, submitted: &[Signature]) -> Option<Result<Signature>> {
        for signature in submitted {
            match self.ledger.signature_status(signature).await {
                Ok(Some(Ok(()))) => {
                    info!(%signature, "earlier attempt confirmed");
                    return Some(Ok(*signature));
                }
                Ok(Some(Err(err))) => return Some(Err(err.into())),
                Ok(None) => {}
                Err(err) => debug!(%signature, %err, "signature status unavailable"),
            }
        }
        None
    }

    async fn try_send(
        &self,
        instruction: &Instruction,
        submitted: &mut Vec<Signature>,
    ) -> Result<Signature> {
        let blockhash = self.ledger.latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            std::slice::from_ref(instruction),
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );
        let signature = transaction.signatures[0];
        debug!(%signature, "submitting transaction");
        submitted.push(signature);

        tokio::time::timeout(
            self.options.confirm_timeout,
            self.ledger.submit(&transaction),
        )
        .await
        .map_err(|_| {
            Error::Network(format!(
                "transaction {signature} not confirmed within {:?}",
                self.options.confirm_timeout
            ))
        })?
    }
}

impl TahuClient<RpcLedger> {
    /// All DAOs created under the payer's state.
    pub async fn daos(&self) -> Result<Vec<(Pubkey, Dao)>> {
        self.program_accounts(Dao::DISCRIMINATOR, &self.state_address())
            .await
    }

    /// All proposals opened on `dao`.
    pub async fn proposals(&self, dao: &Pubkey) -> Result<Vec<(Pubkey, Proposal)>> {
        self.program_accounts(Proposal::DISCRIMINATOR, dao).await
    }

    /// Program accounts with the given discriminator whose first field is `owner`.
    async fn program_accounts<T: AccountDeserialize>(
        &self,
        discriminator: [u8; 8],
        owner: &Pubkey,
    ) -> Result<Vec<(Pubkey, T)>> {
        let rpc = self.ledger.rpc();
        let account_type_filter =
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(0, discriminator.to_vec()));
        let owner_filter = RpcFilterType::Memcmp(Memcmp::new_raw_bytes(8, owner.to_bytes().to_vec()));

        let config = RpcProgramAccountsConfig {
            filters: Some(vec![account_type_filter, owner_filter]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(rpc.commitment()),
                ..RpcAccountInfoConfig::default()
            },
            with_context: Some(true),
        };

        let accounts = rpc
            .get_program_accounts_with_config(&tahu_program::ID, config)
            .await?;
        accounts
            .into_iter()
            .map(|(key, account)| Ok((key, T::try_deserialize(&mut account.data.as_slice())?)))
            .collect()
    }
}
