//! Token-2022 mint carrying its own metadata

use std::fmt;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};

use crate::flows::{execute, explorer_link};
use crate::rpc_manager::LedgerRpc;
use crate::structured_logging::StructuredLogger;
use crate::token::{MintSpace, TokenMetadataSpec, TokenProgram};
use crate::tx_builder::{
    query_minimum_reserve, LedgerError, OperationKind, OperationParams,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataMintReport {
    pub mint: Pubkey,
    pub decimals: u8,
    pub space: MintSpace,
    /// Lamports deposited into the mint account
    pub rent: u64,
    pub signature: Signature,
    pub explorer_url: Option<String>,
}

impl fmt::Display for MetadataMintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mint: {}", self.mint)?;
        writeln!(
            f,
            "Account space: {} bytes allocated, {} bytes funded ({} lamports)",
            self.space.allocated, self.space.funded, self.rent
        )?;
        write!(f, "Create Mint Account: {}", self.signature)?;
        if let Some(url) = &self.explorer_url {
            write!(f, "\nExplorer: {}", url)?;
        }
        Ok(())
    }
}

/// Build the parameter list for a metadata mint, in submission order
///
/// The pointer must be initialized before the mint, and the metadata after
/// both. `payer` is mint authority, pointer authority and update authority.
pub fn metadata_mint_params(
    payer: &Pubkey,
    mint: &Pubkey,
    spec: &TokenMetadataSpec,
    decimals: u8,
    space: MintSpace,
    rent: u64,
) -> Vec<OperationParams> {
    let mut params = vec![
        OperationParams::CreateAccount {
            payer: *payer,
            new_account: *mint,
            lamports: rent,
            space: space.allocated as u64,
            owner: TokenProgram::Token2022.id(),
        },
        OperationParams::InitializeMetadataPointer {
            mint: *mint,
            authority: Some(*payer),
            metadata_address: Some(*mint),
        },
        OperationParams::InitializeMint {
            mint: *mint,
            decimals,
            mint_authority: *payer,
            freeze_authority: None,
            program: TokenProgram::Token2022,
        },
        OperationParams::InitializeMetadata {
            mint: *mint,
            update_authority: *payer,
            mint_authority: *payer,
            name: spec.name.clone(),
            symbol: spec.symbol.clone(),
            uri: spec.uri.clone(),
        },
    ];
    params.extend(
        spec.additional_fields()
            .map(|(field, value)| OperationParams::UpdateMetadataField {
                mint: *mint,
                update_authority: *payer,
                field,
                value,
            }),
    );
    params
}

/// Create a Token-2022 mint whose metadata lives in the mint account itself
///
/// The account is allocated for the mint and pointer only, but funded for
/// its final size so the metadata writes that grow it stay rent exempt.
pub async fn run(
    rpc: &dyn LedgerRpc,
    payer: &Keypair,
    spec: &TokenMetadataSpec,
    decimals: u8,
) -> Result<MetadataMintReport, LedgerError> {
    let logger = StructuredLogger::for_run();
    let owner = payer.pubkey();
    let mint_keypair = Keypair::new();
    let mint = mint_keypair.pubkey();

    let space = MintSpace::for_metadata(spec)
        .map_err(|e| LedgerError::invalid_operation(OperationKind::CreateAccount, e.to_string()))?;
    let rent = query_minimum_reserve(rpc, space.funded).await?;
    logger.log_query("rent", &mint.to_string(), rent);

    let params = metadata_mint_params(&owner, &mint, spec, decimals, space, rent);
    let signature = execute(rpc, params, owner, &[payer, &mint_keypair], &logger).await?;

    Ok(MetadataMintReport {
        mint,
        decimals,
        space,
        rent,
        explorer_url: explorer_link(rpc, &signature),
        signature,
    })
}
