//! JSON-RPC connection handle

use std::time::Duration;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, message::Message, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};
use tracing::debug;

use crate::rpc_manager::rpc_config::RpcEndpointConfig;
use crate::rpc_manager::rpc_errors::{from_query_error, from_submit_error};
use crate::rpc_manager::LedgerRpc;
use crate::tx_builder::LedgerError;

/// A session to one ledger endpoint
///
/// Created once per process and used strictly serially.
pub struct RpcConnection {
    client: RpcClient,
    endpoint: String,
}

impl RpcConnection {
    /// Connect using an endpoint configuration
    pub fn new(config: &RpcEndpointConfig) -> Self {
        Self::with_commitment(
            config.resolved_url(),
            config.commitment.into(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_commitment(url: String, commitment: CommitmentConfig, timeout: Duration) -> Self {
        debug!(endpoint = %url, commitment = ?commitment.commitment, "Opening RPC connection");
        Self {
            client: RpcClient::new_with_timeout_and_commitment(url.clone(), timeout, commitment),
            endpoint: url,
        }
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.client.commitment()
    }
}

impl std::fmt::Debug for RpcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConnection")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LedgerRpc for RpcConnection {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        self.client
            .get_balance(address)
            .await
            .map_err(|e| from_query_error(e, &self.endpoint))
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        size: usize,
    ) -> Result<u64, LedgerError> {
        self.client
            .get_minimum_balance_for_rent_exemption(size)
            .await
            .map_err(|e| from_query_error(e, &self.endpoint))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| from_query_error(e, &self.endpoint))
    }

    async fn get_fee_for_message(&self, message: &Message) -> Result<u64, LedgerError> {
        self.client
            .get_fee_for_message(message)
            .await
            .map_err(|e| from_query_error(e, &self.endpoint))
    }

    async fn send_and_confirm_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, LedgerError> {
        self.client
            .send_and_confirm_transaction(tx)
            .await
            .map_err(|e| from_submit_error(e, &self.endpoint, tx))
    }
}
