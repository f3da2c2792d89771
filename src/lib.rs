//! mintforge - native transfers and SPL token minting on a Solana ledger
//!
//! The library builds ordered bundles of ledger operations, checks their
//! declared dependencies locally and submits them through a [`LedgerRpc`]
//! connection. The `flows` module strings these together into the procedures
//! the `mintforge` binary exposes.
//!
//! [`LedgerRpc`]: rpc_manager::LedgerRpc

pub mod amount;
pub mod config;
pub mod flows;
pub mod rpc_manager;
pub mod structured_logging;
pub mod token;
pub mod tx_builder;
pub mod wallet;

pub mod test_utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
