//! Transaction builder and submitter
//!
//! Turns a set of desired ledger effects into a single atomically applied
//! transaction:
//!
//! - **operations**: one SDK instruction per [`Operation`], with explicit
//!   dependency declarations
//! - **bundle**: ordered, non-empty operation lists and local order checks
//! - **builder**: balance/rent/fee queries and sign-and-submit
//! - **errors**: the [`LedgerError`] taxonomy
//!
//! ## Ordering
//!
//! The ledger applies a bundle all-or-nothing and rejects it when an
//! operation runs before the resource it needs exists. [`submit`] checks the
//! declared dependencies first, so an ordering mistake surfaces as
//! `SubmissionRejected(DependencyOrder)` without a round trip.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use mintforge::rpc_manager::LedgerRpc;
//! use mintforge::structured_logging::StructuredLogger;
//! use mintforge::tx_builder::{
//!     assemble_bundle, build_operation, latest_recency_token, submit, LedgerError,
//!     OperationParams,
//! };
//! use solana_sdk::{pubkey::Pubkey, signature::{Keypair, Signer}};
//!
//! # async fn example(rpc: &dyn LedgerRpc, sender: &Keypair, to: Pubkey) -> Result<(), LedgerError> {
//! let op = build_operation(OperationParams::Transfer {
//!     from: sender.pubkey(),
//!     to,
//!     lamports: 1_000_000,
//! })?;
//! let blockhash = latest_recency_token(rpc).await?;
//! let bundle = assemble_bundle(vec![op], sender.pubkey(), blockhash)?;
//! let signature = submit(rpc, &bundle, &[sender], &StructuredLogger::for_run()).await?;
//! # let _ = signature;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub use errors::{LedgerError, OrderViolation, RejectionReason};

mod builder;
mod bundle;
mod operations;

pub use builder::{
    estimate_fee, latest_recency_token, query_balance, query_minimum_reserve, submit,
};
pub use bundle::{assemble_bundle, Bundle};
pub use operations::{build_operation, Operation, OperationKind, OperationParams, Resource};
