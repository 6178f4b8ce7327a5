use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{self, Transaction};

use crate::config::ProviderConfig;
use crate::error::Result;

/// The ledger a [`crate::TahuClient`] submits transactions to.
///
/// `submit` resolves once the transaction is confirmed or has failed. Callers bound the
/// wait themselves.
#[async_trait(?Send)]
pub trait Ledger {
    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn account(&self, address: &Pubkey) -> Result<Option<Account>>;

    async fn submit(&self, transaction: &Transaction) -> Result<Signature>;

    /// The outcome of a previously submitted transaction, or `None` if the ledger has not
    /// processed it.
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<transaction::Result<()>>>;
}

/// A [`Ledger`] backed by a cluster's JSON RPC endpoint.
pub struct RpcLedger {
    rpc: RpcClient,
    skip_preflight: bool,
}

impl RpcLedger {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let rpc = RpcClient::new_with_commitment(config.rpc_url().to_string(), config.commitment()?);
        Ok(Self {
            rpc,
            skip_preflight: config.skip_preflight,
        })
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }
}

#[async_trait(?Send)]
impl Ledger for RpcLedger {
    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    async fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value)
    }

    async fn submit(&self, transaction: &Transaction) -> Result<Signature> {
        let signature = self
            .rpc
            .send_and_confirm_transaction_with_spinner_and_config(
                transaction,
                self.rpc.commitment(),
                RpcSendTransactionConfig {
                    skip_preflight: self.skip_preflight,
                    preflight_commitment: Some(self.rpc.commitment().commitment),
                    ..RpcSendTransactionConfig::default()
                },
            )
            .await?;
        Ok(signature)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<transaction::Result<()>>> {
        Ok(self.rpc.get_signature_status(signature).await?)
    }
}
