//! Operation construction and dependency declaration
//!
//! An [`Operation`] wraps exactly one SDK instruction together with the
//! ledger resources it needs to already exist (`requires`), the resources it
//! brings into existence (`provides`) and the resources that must *not* exist
//! yet when it runs (`precludes`). Bundles use these declarations to check
//! ordering locally instead of learning about it from a remote rejection.
//!
//! Construction is pure: no I/O and no validation beyond what the SDK
//! constructors themselves perform.

use std::fmt;

use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_instruction};
use spl_token_metadata_interface::state::Field;

use crate::token::{associated_account, TokenProgram};
use crate::tx_builder::errors::LedgerError;

/// The kinds of operation a bundle can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Transfer,
    CreateAccount,
    InitializeMint,
    InitializeMetadataPointer,
    InitializeMetadata,
    UpdateMetadataField,
    CreateAssociatedAccount,
    MintTo,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::CreateAccount => "create-account",
            Self::InitializeMint => "initialize-mint",
            Self::InitializeMetadataPointer => "initialize-metadata-pointer",
            Self::InitializeMetadata => "initialize-metadata",
            Self::UpdateMetadataField => "update-metadata-field",
            Self::CreateAssociatedAccount => "create-associated-account",
            Self::MintTo => "mint-to",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger-side object an operation depends on or creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// An allocated account at this address
    Account(Pubkey),
    /// An initialized mint
    Mint(Pubkey),
    /// An initialized metadata-pointer extension on a mint
    MetadataPointer(Pubkey),
    /// Initialized token metadata stored in a mint
    Metadata(Pubkey),
    /// An initialized token account
    TokenAccount(Pubkey),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(key) => write!(f, "account {}", key),
            Self::Mint(key) => write!(f, "mint {}", key),
            Self::MetadataPointer(key) => write!(f, "metadata pointer on {}", key),
            Self::Metadata(key) => write!(f, "metadata on {}", key),
            Self::TokenAccount(key) => write!(f, "token account {}", key),
        }
    }
}

/// Parameters for each operation kind
///
/// Amounts are already in minor units; scale human amounts with
/// [`crate::amount`] before filling these in.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationParams {
    Transfer {
        from: Pubkey,
        to: Pubkey,
        lamports: u64,
    },
    CreateAccount {
        payer: Pubkey,
        new_account: Pubkey,
        lamports: u64,
        space: u64,
        owner: Pubkey,
    },
    InitializeMint {
        mint: Pubkey,
        decimals: u8,
        mint_authority: Pubkey,
        freeze_authority: Option<Pubkey>,
        program: TokenProgram,
    },
    /// Token-2022 only
    InitializeMetadataPointer {
        mint: Pubkey,
        authority: Option<Pubkey>,
        metadata_address: Option<Pubkey>,
    },
    /// Metadata stored in the mint itself (Token-2022)
    InitializeMetadata {
        mint: Pubkey,
        update_authority: Pubkey,
        mint_authority: Pubkey,
        name: String,
        symbol: String,
        uri: String,
    },
    UpdateMetadataField {
        mint: Pubkey,
        update_authority: Pubkey,
        field: Field,
        value: String,
    },
    /// Idempotent: succeeds if the account already exists
    CreateAssociatedAccount {
        payer: Pubkey,
        owner: Pubkey,
        mint: Pubkey,
        program: TokenProgram,
    },
    /// Checked: `decimals` must equal the mint's declared decimals
    MintTo {
        mint: Pubkey,
        destination: Pubkey,
        authority: Pubkey,
        amount: u64,
        decimals: u8,
        program: TokenProgram,
    },
}

impl OperationParams {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Transfer { .. } => OperationKind::Transfer,
            Self::CreateAccount { .. } => OperationKind::CreateAccount,
            Self::InitializeMint { .. } => OperationKind::InitializeMint,
            Self::InitializeMetadataPointer { .. } => OperationKind::InitializeMetadataPointer,
            Self::InitializeMetadata { .. } => OperationKind::InitializeMetadata,
            Self::UpdateMetadataField { .. } => OperationKind::UpdateMetadataField,
            Self::CreateAssociatedAccount { .. } => OperationKind::CreateAssociatedAccount,
            Self::MintTo { .. } => OperationKind::MintTo,
        }
    }
}

/// One immutable step of a bundle
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    kind: OperationKind,
    instruction: Instruction,
    requires: Vec<Resource>,
    provides: Vec<Resource>,
    precludes: Vec<Resource>,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    pub fn requires(&self) -> &[Resource] {
        &self.requires
    }

    pub fn provides(&self) -> &[Resource] {
        &self.provides
    }

    pub fn precludes(&self) -> &[Resource] {
        &self.precludes
    }

    /// Identities that must sign any bundle containing this operation
    pub fn signers(&self) -> Vec<Pubkey> {
        self.instruction
            .accounts
            .iter()
            .filter(|meta| meta.is_signer)
            .map(|meta| meta.pubkey)
            .collect()
    }

    pub fn into_instruction(self) -> Instruction {
        self.instruction
    }
}

/// Build an operation from its parameters
///
/// # Errors
///
/// Returns `LedgerError::InvalidOperation` if the SDK constructor rejects the
/// parameters (for example a program id it does not recognise).
pub fn build_operation(params: OperationParams) -> Result<Operation, LedgerError> {
    let kind = params.kind();
    let sdk_err = |e: &dyn fmt::Display| LedgerError::invalid_operation(kind, e.to_string());

    let (instruction, requires, provides, precludes) = match params {
        OperationParams::Transfer { from, to, lamports } => (
            system_instruction::transfer(&from, &to, lamports),
            vec![],
            vec![],
            vec![],
        ),
        OperationParams::CreateAccount {
            payer,
            new_account,
            lamports,
            space,
            owner,
        } => (
            system_instruction::create_account(&payer, &new_account, lamports, space, &owner),
            vec![],
            vec![Resource::Account(new_account)],
            vec![],
        ),
        OperationParams::InitializeMint {
            mint,
            decimals,
            mint_authority,
            freeze_authority,
            program,
        } => (
            program
                .initialize_mint(&mint, &mint_authority, freeze_authority.as_ref(), decimals)
                .map_err(|e| sdk_err(&e))?,
            vec![Resource::Account(mint)],
            vec![Resource::Mint(mint)],
            vec![],
        ),
        OperationParams::InitializeMetadataPointer {
            mint,
            authority,
            metadata_address,
        } => (
            spl_token_2022::extension::metadata_pointer::instruction::initialize(
                &spl_token_2022::id(),
                &mint,
                authority,
                metadata_address,
            )
            .map_err(|e| sdk_err(&e))?,
            vec![Resource::Account(mint)],
            vec![Resource::MetadataPointer(mint)],
            // extensions are initialized before the mint itself
            vec![Resource::Mint(mint)],
        ),
        OperationParams::InitializeMetadata {
            mint,
            update_authority,
            mint_authority,
            name,
            symbol,
            uri,
        } => (
            spl_token_metadata_interface::instruction::initialize(
                &spl_token_2022::id(),
                &mint,
                &update_authority,
                &mint,
                &mint_authority,
                name,
                symbol,
                uri,
            ),
            vec![Resource::Mint(mint), Resource::MetadataPointer(mint)],
            vec![Resource::Metadata(mint)],
            vec![],
        ),
        OperationParams::UpdateMetadataField {
            mint,
            update_authority,
            field,
            value,
        } => (
            spl_token_metadata_interface::instruction::update_field(
                &spl_token_2022::id(),
                &mint,
                &update_authority,
                field,
                value,
            ),
            vec![Resource::Metadata(mint)],
            vec![],
            vec![],
        ),
        OperationParams::CreateAssociatedAccount {
            payer,
            owner,
            mint,
            program,
        } => (
            spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                &payer,
                &owner,
                &mint,
                &program.id(),
            ),
            vec![Resource::Mint(mint)],
            vec![Resource::TokenAccount(associated_account(&owner, &mint, program))],
            vec![],
        ),
        OperationParams::MintTo {
            mint,
            destination,
            authority,
            amount,
            decimals,
            program,
        } => (
            program
                .mint_to(&mint, &destination, &authority, amount, decimals)
                .map_err(|e| sdk_err(&e))?,
            vec![Resource::Mint(mint), Resource::TokenAccount(destination)],
            vec![],
            vec![],
        ),
    };

    Ok(Operation {
        kind,
        instruction,
        requires,
        provides,
        precludes,
    })
}
