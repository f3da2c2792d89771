//! End-to-end procedures
//!
//! Each flow queries what it needs, assembles exactly one bundle (balance
//! reads assemble none), submits it and returns a report that renders as the
//! lines the CLI prints.

pub mod balance;
pub mod create_token;
pub mod mint;
pub mod token_metadata;
pub mod transfer;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
};

use crate::rpc_manager::{rpc_config::explorer_tx_url, LedgerRpc};
use crate::structured_logging::StructuredLogger;
use crate::tx_builder::{
    assemble_bundle, build_operation, latest_recency_token, submit, Bundle, LedgerError,
    OperationParams,
};

/// Build every operation and stamp the bundle with a fresh blockhash
pub(crate) async fn prepare_bundle(
    rpc: &dyn LedgerRpc,
    params: Vec<OperationParams>,
    fee_payer: Pubkey,
) -> Result<Bundle, LedgerError> {
    let operations = params
        .into_iter()
        .map(build_operation)
        .collect::<Result<Vec<_>, _>>()?;
    let blockhash = latest_recency_token(rpc).await?;
    assemble_bundle(operations, fee_payer, blockhash)
}

/// Prepare and submit in one step
pub(crate) async fn execute(
    rpc: &dyn LedgerRpc,
    params: Vec<OperationParams>,
    fee_payer: Pubkey,
    signers: &[&Keypair],
    logger: &StructuredLogger,
) -> Result<Signature, LedgerError> {
    let bundle = prepare_bundle(rpc, params, fee_payer).await?;
    submit(rpc, &bundle, signers, logger).await
}

/// Explorer link for a confirmed signature, when the endpoint is a public cluster
pub(crate) fn explorer_link(rpc: &dyn LedgerRpc, signature: &Signature) -> Option<String> {
    explorer_tx_url(&signature.to_string(), rpc.endpoint())
}
