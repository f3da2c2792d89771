//! Mint more supply of an existing token

use std::fmt;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};

use crate::amount::{scale_amount, to_ui_amount};
use crate::flows::{execute, explorer_link};
use crate::rpc_manager::LedgerRpc;
use crate::structured_logging::StructuredLogger;
use crate::token::{associated_account, TokenProgram};
use crate::tx_builder::{LedgerError, OperationParams};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReport {
    pub mint: Pubkey,
    pub destination: Pubkey,
    pub decimals: u8,
    /// Minor units minted
    pub minted: u64,
    pub signature: Signature,
    pub explorer_url: Option<String>,
}

impl fmt::Display for MintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Associated Token Account: {}", self.destination)?;
        let ui = to_ui_amount(self.minted, self.decimals).map_err(|_| fmt::Error)?;
        writeln!(f, "Minted {} tokens to {}", ui, self.destination)?;
        write!(f, "Signature: {}", self.signature)?;
        if let Some(url) = &self.explorer_url {
            write!(f, "\nExplorer: {}", url)?;
        }
        Ok(())
    }
}

/// Mint `amount` whole tokens of `mint` to the associated account of
/// `owner`, creating that account when it does not exist yet
///
/// `authority` must be the mint authority; it also pays fees and rent.
pub async fn run(
    rpc: &dyn LedgerRpc,
    authority: &Keypair,
    mint: &Pubkey,
    owner: &Pubkey,
    amount: u64,
    decimals: u8,
    program: TokenProgram,
) -> Result<MintReport, LedgerError> {
    let logger = StructuredLogger::for_run();
    let payer = authority.pubkey();
    let minted = scale_amount(amount, decimals)?;
    let destination = associated_account(owner, mint, program);

    let params = vec![
        OperationParams::CreateAssociatedAccount {
            payer,
            owner: *owner,
            mint: *mint,
            program,
        },
        OperationParams::MintTo {
            mint: *mint,
            destination,
            authority: payer,
            amount: minted,
            decimals,
            program,
        },
    ];

    let signature = execute(rpc, params, payer, &[authority], &logger).await?;

    Ok(MintReport {
        mint: *mint,
        destination,
        decimals,
        minted,
        explorer_url: explorer_link(rpc, &signature),
        signature,
    })
}
