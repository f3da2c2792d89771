//! Token program selection, mint sizing and metadata description

use std::fmt;
use std::str::FromStr;

use solana_sdk::{instruction::Instruction, program_error::ProgramError, pubkey::Pubkey};
use spl_token_2022::extension::ExtensionType;
use spl_token_2022::state::Mint;
use spl_token_metadata_interface::state::{Field, TokenMetadata};
use spl_type_length_value::variable_len_pack::VariableLenPack;

/// Token-2022 extension TLV header: 2-byte type + 2-byte length
pub const EXTENSION_TLV_HEADER: usize = 4;

/// Which token program owns a mint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TokenProgram {
    /// The original SPL Token program
    #[default]
    Legacy,
    /// Token Extensions (Token-2022)
    Token2022,
}

impl TokenProgram {
    pub fn id(&self) -> Pubkey {
        match self {
            Self::Legacy => spl_token::id(),
            Self::Token2022 => spl_token_2022::id(),
        }
    }

    pub fn initialize_mint(
        &self,
        mint: &Pubkey,
        mint_authority: &Pubkey,
        freeze_authority: Option<&Pubkey>,
        decimals: u8,
    ) -> Result<Instruction, ProgramError> {
        match self {
            Self::Legacy => spl_token::instruction::initialize_mint2(
                &spl_token::id(),
                mint,
                mint_authority,
                freeze_authority,
                decimals,
            ),
            Self::Token2022 => spl_token_2022::instruction::initialize_mint2(
                &spl_token_2022::id(),
                mint,
                mint_authority,
                freeze_authority,
                decimals,
            ),
        }
    }

    /// Checked mint-to: the ledger refuses it unless `decimals` matches the mint
    pub fn mint_to(
        &self,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
        amount: u64,
        decimals: u8,
    ) -> Result<Instruction, ProgramError> {
        match self {
            Self::Legacy => spl_token::instruction::mint_to_checked(
                &spl_token::id(),
                mint,
                destination,
                authority,
                &[],
                amount,
                decimals,
            ),
            Self::Token2022 => spl_token_2022::instruction::mint_to_checked(
                &spl_token_2022::id(),
                mint,
                destination,
                authority,
                &[],
                amount,
                decimals,
            ),
        }
    }
}

impl FromStr for TokenProgram {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" | "spl-token" | "token" => Ok(Self::Legacy),
            "token-2022" | "token2022" | "extensions" => Ok(Self::Token2022),
            other => Err(format!("unknown token program '{}'", other)),
        }
    }
}

impl fmt::Display for TokenProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("spl-token"),
            Self::Token2022 => f.write_str("token-2022"),
        }
    }
}

/// Associated token account of `owner` for `mint`
pub fn associated_account(owner: &Pubkey, mint: &Pubkey, program: TokenProgram) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        owner,
        mint,
        &program.id(),
    )
}

/// Mint account length with the given extensions
///
/// Both programs share the 82-byte base layout, so an empty extension list
/// gives the plain mint size for either.
pub fn mint_account_len(extensions: &[ExtensionType]) -> Result<usize, ProgramError> {
    ExtensionType::try_calculate_account_len::<Mint>(extensions)
}

/// Name, symbol, uri and extra key/value fields of a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadataSpec {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub additional: Vec<(String, String)>,
}

impl TokenMetadataSpec {
    /// The metadata as the mint stores it once every field is written
    pub fn to_token_metadata(&self, mint: &Pubkey) -> TokenMetadata {
        TokenMetadata {
            mint: *mint,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            additional_metadata: self.additional.clone(),
            ..Default::default()
        }
    }

    /// Packed length of the metadata, excluding the TLV header
    pub fn packed_len(&self) -> Result<usize, ProgramError> {
        self.to_token_metadata(&Pubkey::default()).get_packed_len()
    }

    /// Update-field payloads for the additional entries
    pub fn additional_fields(&self) -> impl Iterator<Item = (Field, String)> + '_ {
        self.additional
            .iter()
            .map(|(key, value)| (Field::Key(key.clone()), value.clone()))
    }
}

/// Space for a Token-2022 mint carrying its own metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintSpace {
    /// Bytes allocated by create-account (mint + metadata pointer)
    pub allocated: usize,
    /// Bytes the account grows to once metadata is written; rent is sized on this
    pub funded: usize,
}

impl MintSpace {
    pub fn for_metadata(spec: &TokenMetadataSpec) -> Result<Self, ProgramError> {
        let allocated = mint_account_len(&[ExtensionType::MetadataPointer])?;
        Ok(Self {
            allocated,
            funded: allocated + EXTENSION_TLV_HEADER + spec.packed_len()?,
        })
    }
}

/// Parse a `key=value` pair for additional metadata
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> TokenMetadataSpec {
        TokenMetadataSpec {
            name: "Second TOKEN".to_string(),
            symbol: "STOK".to_string(),
            uri: "https://example.com/image.png".to_string(),
            additional: vec![("author".to_string(), "Jeferson".to_string())],
        }
    }

    #[test]
    fn test_program_ids_differ() {
        assert_ne!(TokenProgram::Legacy.id(), TokenProgram::Token2022.id());
        assert_eq!("token-2022".parse::<TokenProgram>(), Ok(TokenProgram::Token2022));
        assert!("nope".parse::<TokenProgram>().is_err());
    }

    #[test]
    fn test_plain_mint_len() {
        assert_eq!(mint_account_len(&[]).unwrap(), 82);
    }

    #[test]
    fn test_metadata_mint_space() {
        let spec = sample_spec();
        let space = MintSpace::for_metadata(&spec).unwrap();

        // mint + account type + pointer extension (authority, address)
        assert!(space.allocated > 82);
        let packed = 32 + 32
            + (4 + spec.name.len())
            + (4 + spec.symbol.len())
            + (4 + spec.uri.len())
            + 4
            + (4 + "author".len() + 4 + "Jeferson".len());
        assert_eq!(spec.packed_len().unwrap(), packed);
        assert_eq!(space.funded - space.allocated, EXTENSION_TLV_HEADER + packed);
    }

    #[test]
    fn test_mint_to_carries_decimals() {
        let mint = Pubkey::new_unique();
        let destination = Pubkey::new_unique();
        let authority = Pubkey::new_unique();

        for program in [TokenProgram::Legacy, TokenProgram::Token2022] {
            let ix = program
                .mint_to(&mint, &destination, &authority, 5_000_000, 6)
                .unwrap();
            assert_eq!(ix.program_id, program.id());
            assert_eq!(
                spl_token_2022::instruction::TokenInstruction::unpack(&ix.data).unwrap(),
                spl_token_2022::instruction::TokenInstruction::MintToChecked {
                    amount: 5_000_000,
                    decimals: 6
                }
            );
        }
    }

    #[test]
    fn test_additional_fields() {
        let spec = sample_spec();
        let fields: Vec<_> = spec.additional_fields().collect();
        assert_eq!(
            fields,
            vec![(Field::Key("author".to_string()), "Jeferson".to_string())]
        );
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("author=Jeferson"),
            Ok(("author".to_string(), "Jeferson".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_associated_account_depends_on_program() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_ne!(
            associated_account(&owner, &mint, TokenProgram::Legacy),
            associated_account(&owner, &mint, TokenProgram::Token2022)
        );
    }
}
