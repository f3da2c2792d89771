//! Queries and submission against a ledger connection
//!
//! Every call here is awaited to completion before the caller moves on; there
//! is no retry, batching or cancellation.

use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

use crate::rpc_manager::LedgerRpc;
use crate::structured_logging::StructuredLogger;
use crate::tx_builder::bundle::Bundle;
use crate::tx_builder::errors::{LedgerError, RejectionReason};

/// Current balance of `address` in lamports
pub async fn query_balance(rpc: &dyn LedgerRpc, address: &Pubkey) -> Result<u64, LedgerError> {
    rpc.get_balance(address).await
}

/// Balance an account of `size` bytes must hold to be rent exempt
pub async fn query_minimum_reserve(rpc: &dyn LedgerRpc, size: usize) -> Result<u64, LedgerError> {
    rpc.get_minimum_balance_for_rent_exemption(size).await
}

/// Recent blockhash to stamp a new bundle with
pub async fn latest_recency_token(rpc: &dyn LedgerRpc) -> Result<Hash, LedgerError> {
    rpc.get_latest_blockhash().await
}

/// Fee the ledger would charge for the bundle as compiled right now
pub async fn estimate_fee(rpc: &dyn LedgerRpc, bundle: &Bundle) -> Result<u64, LedgerError> {
    rpc.get_fee_for_message(&bundle.message()).await
}

/// Sign a bundle and submit it, blocking until it is confirmed or refused
///
/// Dependency order and signer coverage are checked before anything leaves
/// the process. `signers` may hold more key pairs than the bundle needs; only
/// the required ones sign.
///
/// # Errors
///
/// - `SubmissionRejected` for local validation failures and ledger refusals
/// - `Connectivity` when the endpoint cannot be reached
/// - `Signing` if the SDK refuses to sign the compiled message
pub async fn submit(
    rpc: &dyn LedgerRpc,
    bundle: &Bundle,
    signers: &[&Keypair],
    logger: &StructuredLogger,
) -> Result<Signature, LedgerError> {
    let kinds: Vec<&'static str> = bundle.operations().map(|op| op.kind().as_str()).collect();
    logger.log_bundle_assembled(&kinds, bundle.fee_payer());

    if let Err(e) = bundle.sanity_check_order() {
        logger.log_rejected(&e);
        return Err(e);
    }

    let required = bundle.required_signers();
    let mut signing: Vec<&Keypair> = Vec::with_capacity(required.len());
    for key in &required {
        match signers.iter().find(|kp| kp.pubkey() == *key) {
            Some(kp) => signing.push(*kp),
            None => {
                let err = LedgerError::rejected(RejectionReason::MissingSignature(*key));
                logger.log_rejected(&err);
                return Err(err);
            }
        }
    }

    let mut tx = Transaction::new_unsigned(bundle.message());
    tx.try_sign(signing.as_slice(), *bundle.recent_blockhash())
        .map_err(|e| LedgerError::Signing(e.to_string()))?;

    logger.log_submit_attempt(rpc.endpoint(), bundle.len(), required.len());
    match rpc.send_and_confirm_transaction(&tx).await {
        Ok(signature) => {
            logger.log_confirmed(&signature);
            Ok(signature)
        }
        Err(e) => {
            logger.log_rejected(&e);
            Err(e)
        }
    }
}
