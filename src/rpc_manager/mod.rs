//! RPC Manager Module
//!
//! The remote connection handle and the trait every ledger-facing call goes
//! through. [`RpcConnection`] talks JSON-RPC to a real endpoint; tests plug in
//! an in-memory ledger behind the same trait.

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash, message::Message, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};

use crate::tx_builder::LedgerError;

// Submodules
pub mod rpc_client;
pub mod rpc_config;
pub mod rpc_errors;

// Re-exports for convenience
pub use rpc_client::RpcConnection;
pub use rpc_config::{Cluster, Commitment, RpcEndpointConfig};

/// Ledger operations the transaction builder depends on
///
/// Calls are issued one at a time by a single task; implementations do not
/// need to be reentrant beyond what `Send + Sync` already implies.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Endpoint this handle is bound to, for logs and error context
    fn endpoint(&self) -> &str;

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError>;

    async fn get_minimum_balance_for_rent_exemption(&self, size: usize)
        -> Result<u64, LedgerError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError>;

    async fn get_fee_for_message(&self, message: &Message) -> Result<u64, LedgerError>;

    /// Send a fully signed transaction and wait for confirmation
    async fn send_and_confirm_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, LedgerError>;
}
