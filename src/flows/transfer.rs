//! Native currency transfer between two wallets

use std::fmt;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};

use crate::amount::lamports_to_sol;
use crate::flows::{explorer_link, prepare_bundle};
use crate::rpc_manager::LedgerRpc;
use crate::structured_logging::StructuredLogger;
use crate::tx_builder::{estimate_fee, query_balance, submit, LedgerError, OperationParams};

/// Outcome of a confirmed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub lamports: u64,
    /// Fee quoted by the ledger for the compiled message before submission
    pub estimated_fee: u64,
    pub signature: Signature,
    pub explorer_url: Option<String>,
    /// (sender, recipient) before submission
    pub balances_before: (u64, u64),
    /// (sender, recipient) after confirmation
    pub balances_after: (u64, u64),
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sender balance: {} SOL", lamports_to_sol(self.balances_before.0))?;
        writeln!(f, "Recipient balance: {} SOL", lamports_to_sol(self.balances_before.1))?;
        writeln!(f, "Estimated transaction fee in lamports: {}", self.estimated_fee)?;
        writeln!(
            f,
            "Estimated transaction fee in SOL: {}",
            lamports_to_sol(self.estimated_fee)
        )?;
        writeln!(
            f,
            "Transferred {} SOL to {}",
            lamports_to_sol(self.lamports),
            self.recipient
        )?;
        writeln!(f, "Transaction successful with signature: {}", self.signature)?;
        if let Some(url) = &self.explorer_url {
            writeln!(f, "Explorer: {}", url)?;
        }
        writeln!(f, "Sender balance: {} SOL", lamports_to_sol(self.balances_after.0))?;
        write!(f, "Recipient balance: {} SOL", lamports_to_sol(self.balances_after.1))
    }
}

/// Move `lamports` from `sender` to `recipient`, paying the fee from `sender`
pub async fn run(
    rpc: &dyn LedgerRpc,
    sender: &Keypair,
    recipient: &Pubkey,
    lamports: u64,
) -> Result<TransferReport, LedgerError> {
    let logger = StructuredLogger::for_run();
    let from = sender.pubkey();

    let balances_before = (
        query_balance(rpc, &from).await?,
        query_balance(rpc, recipient).await?,
    );

    let bundle = prepare_bundle(
        rpc,
        vec![OperationParams::Transfer {
            from,
            to: *recipient,
            lamports,
        }],
        from,
    )
    .await?;
    let estimated_fee = estimate_fee(rpc, &bundle).await?;
    logger.log_query("fee", &from.to_string(), estimated_fee);

    let signature = submit(rpc, &bundle, &[sender], &logger).await?;

    let balances_after = (
        query_balance(rpc, &from).await?,
        query_balance(rpc, recipient).await?,
    );

    Ok(TransferReport {
        sender: from,
        recipient: *recipient,
        lamports,
        estimated_fee,
        explorer_url: explorer_link(rpc, &signature),
        signature,
        balances_before,
        balances_after,
    })
}
