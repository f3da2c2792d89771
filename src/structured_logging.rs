//! Structured logging for bundle submission

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use uuid::Uuid;

use crate::tx_builder::LedgerError;

/// Structured logger tagging every event with a run id
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    run_id: String,
}

impl StructuredLogger {
    pub fn new(run_id: String) -> Self {
        Self { run_id }
    }

    /// Logger with a fresh random run id
    pub fn for_run() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log_bundle_assembled(&self, operations: &[&str], fee_payer: &Pubkey) {
        tracing::debug!(
            run_id = %self.run_id,
            operations = ?operations,
            fee_payer = %fee_payer,
            "Bundle assembled"
        );
    }

    pub fn log_submit_attempt(&self, endpoint: &str, operation_count: usize, signer_count: usize) {
        tracing::info!(
            run_id = %self.run_id,
            endpoint = %endpoint,
            operation_count = %operation_count,
            signer_count = %signer_count,
            "Submitting bundle"
        );
    }

    pub fn log_confirmed(&self, signature: &Signature) {
        tracing::info!(
            run_id = %self.run_id,
            signature = %signature,
            "Bundle confirmed"
        );
    }

    pub fn log_rejected(&self, error: &LedgerError) {
        tracing::warn!(
            run_id = %self.run_id,
            category = %error.category(),
            error = %error,
            "Bundle not applied"
        );
    }

    pub fn log_query(&self, query: &str, subject: &str, value: u64) {
        tracing::debug!(
            run_id = %self.run_id,
            query = %query,
            subject = %subject,
            value = %value,
            "Ledger query"
        );
    }
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::for_run()
    }
}
