//! Test Utilities Module
//!
//! An in-memory ledger behind [`LedgerRpc`] for deterministic tests without a
//! validator. It applies system transfers and account creation, token mint
//! initialization, associated account creation, checked mint-to and
//! Token-2022 embedded metadata, charging a fixed fee per signature. A
//! transaction is applied to a copy of the state and committed only if every
//! instruction succeeds.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    message::Message,
    pubkey::Pubkey,
    signature::Signature,
    system_instruction::SystemInstruction,
    system_program,
    transaction::Transaction,
};
use spl_token_2022::instruction::TokenInstruction;
use spl_token_metadata_interface::{instruction::TokenMetadataInstruction, state::TokenMetadata};
use spl_type_length_value::variable_len_pack::VariableLenPack;
use tokio::sync::Mutex;

use crate::rpc_manager::LedgerRpc;
use crate::tx_builder::{LedgerError, RejectionReason};

/// Fee charged per required signature
pub const FEE_PER_SIGNATURE: u64 = 5_000;

/// Size of an SPL token account
pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// Token-2022 extension TLV header
const TLV_HEADER_LEN: u64 = 4;

/// Rent-exempt minimum for `size` bytes, matching the default cluster rent
pub fn rent_for(size: usize) -> u64 {
    (128 + size as u64) * 6_960
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAccount {
    pub lamports: u64,
    pub owner: Pubkey,
    pub space: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockMint {
    pub decimals: u8,
    pub mint_authority: Pubkey,
    pub supply: u64,
    pub has_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, MockAccount>,
    mints: HashMap<Pubkey, MockMint>,
    token_accounts: HashMap<Pubkey, MockTokenAccount>,
    pointers: HashMap<Pubkey, Pubkey>,
    /// Embedded metadata keyed by mint, with the account size before it
    metadata: HashMap<Pubkey, (u64, TokenMetadata)>,
}

impl LedgerState {
    fn lamports(&self, key: &Pubkey) -> u64 {
        self.accounts.get(key).map_or(0, |a| a.lamports)
    }

    fn debit(&mut self, key: &Pubkey, lamports: u64) -> Result<(), RejectionReason> {
        let account = self
            .accounts
            .get_mut(key)
            .ok_or(RejectionReason::InsufficientFunds)?;
        account.lamports = account
            .lamports
            .checked_sub(lamports)
            .ok_or(RejectionReason::InsufficientFunds)?;
        Ok(())
    }

    /// Resize `key` to hold `base` bytes plus `metadata` as one extension
    fn store_metadata(
        &mut self,
        key: &Pubkey,
        base: u64,
        metadata: TokenMetadata,
    ) -> Result<(), RejectionReason> {
        let packed = metadata
            .get_packed_len()
            .map_err(|e| RejectionReason::Other(format!("metadata does not pack: {}", e)))?;
        let space = base + TLV_HEADER_LEN + packed as u64;
        let account = self
            .accounts
            .get_mut(key)
            .ok_or_else(|| RejectionReason::Other(format!("account {} not found", key)))?;
        if account.lamports < rent_for(space as usize) {
            return Err(RejectionReason::InsufficientFunds);
        }
        account.space = space;
        self.metadata.insert(*key, (base, metadata));
        if let Some(mint) = self.mints.get_mut(key) {
            mint.has_metadata = true;
        }
        Ok(())
    }

    fn credit(&mut self, key: &Pubkey, lamports: u64) {
        self.accounts
            .entry(*key)
            .or_insert_with(|| MockAccount {
                lamports: 0,
                owner: system_program::id(),
                space: 0,
            })
            .lamports += lamports;
    }
}

/// Mock ledger for testing
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MockLedger {
    endpoint: String,
    state: Arc<Mutex<LedgerState>>,
    blockhash: Arc<Mutex<Hash>>,
    offline: Arc<Mutex<bool>>,
    submitted: Arc<Mutex<usize>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::with_endpoint("mock://ledger")
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            state: Arc::new(Mutex::new(LedgerState::default())),
            blockhash: Arc::new(Mutex::new(Hash::new_unique())),
            offline: Arc::new(Mutex::new(false)),
            submitted: Arc::new(Mutex::new(0)),
        }
    }

    /// Credit `lamports` to a system-owned account
    pub async fn fund(&self, key: &Pubkey, lamports: u64) {
        self.state.lock().await.credit(key, lamports);
    }

    pub async fn balance(&self, key: &Pubkey) -> u64 {
        self.state.lock().await.lamports(key)
    }

    pub async fn account(&self, key: &Pubkey) -> Option<MockAccount> {
        self.state.lock().await.accounts.get(key).cloned()
    }

    pub async fn mint(&self, key: &Pubkey) -> Option<MockMint> {
        self.state.lock().await.mints.get(key).cloned()
    }

    pub async fn token_account(&self, key: &Pubkey) -> Option<MockTokenAccount> {
        self.state.lock().await.token_accounts.get(key).cloned()
    }

    /// Metadata stored in the mint account, as the ledger decoded it
    pub async fn metadata(&self, key: &Pubkey) -> Option<TokenMetadata> {
        self.state
            .lock()
            .await
            .metadata
            .get(key)
            .map(|(_, metadata)| metadata.clone())
    }

    /// Register an initialized mint directly, bypassing any transaction
    pub async fn seed_mint(&self, key: &Pubkey, program: &Pubkey, decimals: u8, authority: &Pubkey) {
        let mut state = self.state.lock().await;
        state.accounts.insert(
            *key,
            MockAccount {
                lamports: rent_for(82),
                owner: *program,
                space: 82,
            },
        );
        state.mints.insert(
            *key,
            MockMint {
                decimals,
                mint_authority: *authority,
                supply: 0,
                has_metadata: false,
            },
        );
    }

    /// Make every call fail as if the endpoint were unreachable
    pub async fn set_offline(&self, offline: bool) {
        *self.offline.lock().await = offline;
    }

    /// Move to a new blockhash; bundles stamped with the old one go stale
    pub async fn advance_blockhash(&self) -> Hash {
        let mut blockhash = self.blockhash.lock().await;
        *blockhash = Hash::new_unique();
        *blockhash
    }

    /// Transactions that reached the ledger, accepted or not
    pub async fn submitted_count(&self) -> usize {
        *self.submitted.lock().await
    }

    async fn check_online(&self) -> Result<(), LedgerError> {
        if *self.offline.lock().await {
            return Err(LedgerError::connectivity(&self.endpoint, "connection refused"));
        }
        Ok(())
    }

    fn apply(state: &mut LedgerState, tx: &Transaction) -> Result<(), RejectionReason> {
        let keys = &tx.message.account_keys;
        let fee_payer = keys
            .first()
            .ok_or_else(|| RejectionReason::Other("transaction has no accounts".to_string()))?;
        let num_signers = usize::from(tx.message.header.num_required_signatures);
        let signers = &keys[..num_signers.min(keys.len())];
        let fee = FEE_PER_SIGNATURE * num_signers as u64;
        state.debit(fee_payer, fee)?;

        for ix in &tx.message.instructions {
            let program_id = *ix.program_id(keys);
            let accounts: Vec<Pubkey> = ix.accounts.iter().map(|&i| keys[i as usize]).collect();
            let account = |n: usize| {
                accounts
                    .get(n)
                    .copied()
                    .ok_or_else(|| RejectionReason::Other("not enough account keys".to_string()))
            };

            if program_id == system_program::id() {
                let instruction: SystemInstruction = bincode::deserialize(&ix.data)
                    .map_err(|_| RejectionReason::Other("invalid system instruction".to_string()))?;
                match instruction {
                    SystemInstruction::Transfer { lamports } => {
                        state.debit(&account(0)?, lamports)?;
                        state.credit(&account(1)?, lamports);
                    }
                    SystemInstruction::CreateAccount {
                        lamports,
                        space,
                        owner,
                    } => {
                        let new_account = account(1)?;
                        if state.lamports(&new_account) > 0 {
                            return Err(RejectionReason::Other(format!(
                                "account {} already in use",
                                new_account
                            )));
                        }
                        state.debit(&account(0)?, lamports)?;
                        state.accounts.insert(
                            new_account,
                            MockAccount {
                                lamports,
                                owner,
                                space,
                            },
                        );
                    }
                    other => {
                        return Err(RejectionReason::Other(format!(
                            "unsupported system instruction {:?}",
                            other
                        )))
                    }
                }
            } else if program_id == spl_token::id() || program_id == spl_token_2022::id() {
                Self::apply_token(state, &program_id, &accounts, signers, &ix.data)?;
            } else if program_id == spl_associated_token_account::id() {
                let (payer, ata, owner, mint) = (account(0)?, account(1)?, account(2)?, account(3)?);
                if state.token_accounts.contains_key(&ata) {
                    continue;
                }
                if !state.mints.contains_key(&mint) {
                    return Err(RejectionReason::Other(format!("mint {} not initialized", mint)));
                }
                let token_program = account(5)?;
                let rent = rent_for(TOKEN_ACCOUNT_LEN);
                state.debit(&payer, rent)?;
                state.accounts.insert(
                    ata,
                    MockAccount {
                        lamports: rent,
                        owner: token_program,
                        space: TOKEN_ACCOUNT_LEN as u64,
                    },
                );
                state.token_accounts.insert(
                    ata,
                    MockTokenAccount {
                        mint,
                        owner,
                        amount: 0,
                    },
                );
            } else {
                return Err(RejectionReason::Other(format!(
                    "unsupported program {}",
                    program_id
                )));
            }
        }
        Ok(())
    }

    fn apply_token(
        state: &mut LedgerState,
        program_id: &Pubkey,
        accounts: &[Pubkey],
        signers: &[Pubkey],
        data: &[u8],
    ) -> Result<(), RejectionReason> {
        let reject = |msg: String| RejectionReason::Other(msg);
        let mint = *accounts
            .first()
            .ok_or_else(|| reject("missing mint account".to_string()))?;
        let account = |n: usize| {
            accounts
                .get(n)
                .copied()
                .ok_or_else(|| reject("not enough account keys".to_string()))
        };
        let owned = state
            .accounts
            .get(&mint)
            .is_some_and(|a| a.owner == *program_id);

        // token-metadata interface instructions use 8-byte discriminators
        if let Ok(instruction) = TokenMetadataInstruction::unpack(data) {
            return Self::apply_metadata(state, instruction, accounts, signers);
        }

        match TokenInstruction::unpack(data) {
            Ok(TokenInstruction::InitializeMint2 {
                decimals,
                mint_authority,
                ..
            }) => {
                if !owned {
                    return Err(reject(format!("account {} not owned by {}", mint, program_id)));
                }
                if state.mints.contains_key(&mint) {
                    return Err(reject(format!("mint {} already initialized", mint)));
                }
                state.mints.insert(
                    mint,
                    MockMint {
                        decimals,
                        mint_authority,
                        supply: 0,
                        has_metadata: false,
                    },
                );
            }
            Ok(TokenInstruction::MintTo { amount }) => {
                Self::mint_to(state, &mint, &account(1)?, &account(2)?, signers, amount, None)?;
            }
            Ok(TokenInstruction::MintToChecked { amount, decimals }) => {
                Self::mint_to(
                    state,
                    &mint,
                    &account(1)?,
                    &account(2)?,
                    signers,
                    amount,
                    Some(decimals),
                )?;
            }
            Ok(TokenInstruction::MetadataPointerExtension) => {
                if !owned {
                    return Err(reject(format!("account {} not owned by {}", mint, program_id)));
                }
                if state.mints.contains_key(&mint) {
                    return Err(reject(format!("mint {} already initialized", mint)));
                }
                state.pointers.insert(mint, mint);
            }
            Ok(other) => {
                return Err(reject(format!("unsupported token instruction {:?}", other)));
            }
            Err(e) => return Err(reject(format!("invalid token instruction: {}", e))),
        }
        Ok(())
    }

    fn mint_to(
        state: &mut LedgerState,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
        signers: &[Pubkey],
        amount: u64,
        expected_decimals: Option<u8>,
    ) -> Result<(), RejectionReason> {
        let reject = |msg: String| RejectionReason::Other(msg);
        let minted = state
            .mints
            .get_mut(mint)
            .ok_or_else(|| reject(format!("mint {} not initialized", mint)))?;
        if let Some(decimals) = expected_decimals {
            if decimals != minted.decimals {
                return Err(reject(format!(
                    "mint {} has {} decimals, instruction says {}",
                    mint, minted.decimals, decimals
                )));
            }
        }
        if minted.mint_authority != *authority {
            return Err(reject(format!("{} is not the mint authority of {}", authority, mint)));
        }
        if !signers.contains(authority) {
            return Err(RejectionReason::MissingSignature(*authority));
        }
        minted.supply = minted
            .supply
            .checked_add(amount)
            .ok_or_else(|| reject("supply overflow".to_string()))?;
        let target = state
            .token_accounts
            .get_mut(destination)
            .ok_or_else(|| reject(format!("token account {} not found", destination)))?;
        if target.mint != *mint {
            return Err(reject(format!("token account {} belongs to another mint", destination)));
        }
        target.amount = target
            .amount
            .checked_add(amount)
            .ok_or_else(|| reject("balance overflow".to_string()))?;
        Ok(())
    }

    fn apply_metadata(
        state: &mut LedgerState,
        instruction: TokenMetadataInstruction,
        accounts: &[Pubkey],
        signers: &[Pubkey],
    ) -> Result<(), RejectionReason> {
        let reject = |msg: String| RejectionReason::Other(msg);
        let account = |n: usize| {
            accounts
                .get(n)
                .copied()
                .ok_or_else(|| reject("not enough account keys".to_string()))
        };
        let metadata_address = account(0)?;
        let update_authority = account(1)?;

        match instruction {
            TokenMetadataInstruction::Initialize(init) => {
                let mint = account(2)?;
                let mint_authority = account(3)?;
                if metadata_address != mint {
                    return Err(reject("metadata must live in the mint account".to_string()));
                }
                if state.pointers.get(&mint) != Some(&metadata_address) {
                    return Err(reject(format!("mint {} has no metadata pointer", mint)));
                }
                let current = state
                    .mints
                    .get(&mint)
                    .ok_or_else(|| reject(format!("mint {} not initialized", mint)))?;
                if current.mint_authority != mint_authority {
                    return Err(reject(format!(
                        "{} is not the mint authority of {}",
                        mint_authority, mint
                    )));
                }
                if !signers.contains(&mint_authority) {
                    return Err(RejectionReason::MissingSignature(mint_authority));
                }
                if state.metadata.contains_key(&mint) {
                    return Err(reject(format!("mint {} already has metadata", mint)));
                }
                let base = state.accounts.get(&mint).map_or(0, |a| a.space);
                let metadata = TokenMetadata {
                    update_authority: Some(update_authority).try_into().map_err(|_| {
                        reject("invalid update authority".to_string())
                    })?,
                    mint,
                    name: init.name,
                    symbol: init.symbol,
                    uri: init.uri,
                    ..Default::default()
                };
                state.store_metadata(&mint, base, metadata)
            }
            TokenMetadataInstruction::UpdateField(update) => {
                let (base, mut metadata) = state
                    .metadata
                    .get(&metadata_address)
                    .cloned()
                    .ok_or_else(|| reject(format!("mint {} has no metadata", metadata_address)))?;
                if Option::<Pubkey>::from(metadata.update_authority) != Some(update_authority) {
                    return Err(reject(format!(
                        "{} is not the update authority of {}",
                        update_authority, metadata_address
                    )));
                }
                if !signers.contains(&update_authority) {
                    return Err(RejectionReason::MissingSignature(update_authority));
                }
                metadata.update(update.field, update.value);
                state.store_metadata(&metadata_address, base, metadata)
            }
            other => Err(reject(format!("unsupported metadata instruction {:?}", other))),
        }
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        self.check_online().await?;
        Ok(self.balance(address).await)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        size: usize,
    ) -> Result<u64, LedgerError> {
        self.check_online().await?;
        Ok(rent_for(size))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.check_online().await?;
        Ok(*self.blockhash.lock().await)
    }

    async fn get_fee_for_message(&self, message: &Message) -> Result<u64, LedgerError> {
        self.check_online().await?;
        Ok(FEE_PER_SIGNATURE * u64::from(message.header.num_required_signatures))
    }

    async fn send_and_confirm_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, LedgerError> {
        self.check_online().await?;
        *self.submitted.lock().await += 1;

        if tx.message.recent_blockhash != *self.blockhash.lock().await {
            return Err(LedgerError::rejected(RejectionReason::StaleRecencyToken));
        }
        if !tx.is_signed() || tx.verify().is_err() {
            let missing = tx.message.account_keys.first().copied().unwrap_or_default();
            return Err(LedgerError::rejected(RejectionReason::MissingSignature(
                missing,
            )));
        }

        let mut state = self.state.lock().await;
        let mut next = state.clone();
        Self::apply(&mut next, tx).map_err(LedgerError::rejected)?;
        *state = next;

        Ok(tx.signatures[0])
    }
}
