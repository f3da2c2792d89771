//! New mint with an associated account and an initial supply

use std::fmt;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};

use crate::amount::{lamports_to_sol, scale_amount, to_ui_amount};
use crate::flows::{execute, explorer_link};
use crate::rpc_manager::LedgerRpc;
use crate::structured_logging::StructuredLogger;
use crate::token::{associated_account, mint_account_len, TokenProgram};
use crate::tx_builder::{
    query_balance, query_minimum_reserve, LedgerError, OperationKind, OperationParams,
};

/// Outcome of a confirmed token creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTokenReport {
    pub mint: Pubkey,
    pub associated_account: Pubkey,
    pub program: TokenProgram,
    pub decimals: u8,
    /// Supply minted into the associated account, in minor units
    pub minted: u64,
    pub signature: Signature,
    pub explorer_url: Option<String>,
    pub payer_balance_before: u64,
    pub payer_balance_after: u64,
}

impl fmt::Display for CreateTokenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Balance: {} SOL", lamports_to_sol(self.payer_balance_before))?;
        writeln!(f, "Token created: {} ({})", self.mint, self.program)?;
        writeln!(f, "Associated Token Account: {}", self.associated_account)?;
        let ui = to_ui_amount(self.minted, self.decimals).map_err(|_| fmt::Error)?;
        writeln!(f, "Minted {} tokens to {}", ui, self.associated_account)?;
        writeln!(f, "Signature: {}", self.signature)?;
        if let Some(url) = &self.explorer_url {
            writeln!(f, "Explorer: {}", url)?;
        }
        write!(f, "Balance: {} SOL", lamports_to_sol(self.payer_balance_after))
    }
}

/// Create a mint owned by `payer`, its associated account, and mint
/// `initial_supply` whole tokens into it, all in one bundle
pub async fn run(
    rpc: &dyn LedgerRpc,
    payer: &Keypair,
    decimals: u8,
    initial_supply: u64,
    program: TokenProgram,
) -> Result<CreateTokenReport, LedgerError> {
    let logger = StructuredLogger::for_run();
    let owner = payer.pubkey();
    let minted = scale_amount(initial_supply, decimals)?;

    let payer_balance_before = query_balance(rpc, &owner).await?;

    let mint_keypair = Keypair::new();
    let mint = mint_keypair.pubkey();
    let space = mint_account_len(&[])
        .map_err(|e| LedgerError::invalid_operation(OperationKind::CreateAccount, e.to_string()))?;
    let rent = query_minimum_reserve(rpc, space).await?;
    logger.log_query("rent", &mint.to_string(), rent);

    let ata = associated_account(&owner, &mint, program);
    let params = vec![
        OperationParams::CreateAccount {
            payer: owner,
            new_account: mint,
            lamports: rent,
            space: space as u64,
            owner: program.id(),
        },
        OperationParams::InitializeMint {
            mint,
            decimals,
            mint_authority: owner,
            freeze_authority: None,
            program,
        },
        OperationParams::CreateAssociatedAccount {
            payer: owner,
            owner,
            mint,
            program,
        },
        OperationParams::MintTo {
            mint,
            destination: ata,
            authority: owner,
            amount: minted,
            decimals,
            program,
        },
    ];

    let signature = execute(rpc, params, owner, &[payer, &mint_keypair], &logger).await?;
    let payer_balance_after = query_balance(rpc, &owner).await?;

    Ok(CreateTokenReport {
        mint,
        associated_account: ata,
        program,
        decimals,
        minted,
        explorer_url: explorer_link(rpc, &signature),
        signature,
        payer_balance_before,
        payer_balance_after,
    })
}
