//! Mapping of SDK client errors onto [`LedgerError`]
//!
//! Transport failures are connectivity errors regardless of the call. Other
//! failures depend on the call: a refused submission becomes
//! `SubmissionRejected`, a failed query becomes `Rpc`.

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{
    instruction::InstructionError,
    pubkey::Pubkey,
    system_program,
    transaction::{Transaction, TransactionError},
};

use crate::tx_builder::{LedgerError, RejectionReason};

/// True if the error never reached (or never came back from) the endpoint
pub fn is_transport_error(err: &ClientError) -> bool {
    match err.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) | ClientErrorKind::Middleware(_) => {
            true
        }
        _ => {
            let msg = err.to_string().to_lowercase();
            msg.contains("timed out") || msg.contains("connection refused")
        }
    }
}

/// Classify a failed read-only query
pub fn from_query_error(err: ClientError, endpoint: &str) -> LedgerError {
    if is_transport_error(&err) {
        LedgerError::connectivity(endpoint, err.to_string())
    } else {
        LedgerError::Rpc {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }
}

/// Classify a failed send-and-confirm of `tx`
pub fn from_submit_error(err: ClientError, endpoint: &str, tx: &Transaction) -> LedgerError {
    if is_transport_error(&err) {
        return LedgerError::connectivity(endpoint, err.to_string());
    }

    let reason = match err.get_transaction_error() {
        Some(tx_err) => rejection_from_transaction_error(&tx_err, &instruction_programs(tx)),
        None => rejection_from_message(&err.to_string()),
    };
    LedgerError::rejected(reason)
}

/// Program id of each instruction of `tx`, in order
pub fn instruction_programs(tx: &Transaction) -> Vec<Pubkey> {
    let keys = &tx.message.account_keys;
    tx.message
        .instructions
        .iter()
        .map(|ix| keys.get(usize::from(ix.program_id_index)).copied().unwrap_or_default())
        .collect()
}

/// True if custom error 1 of `program` means the debited account is short
///
/// System `ResultWithNegativeLamports` and token `InsufficientFunds` both use
/// code 1; other programs assign it unrelated meanings.
fn custom_one_is_insufficient_funds(program: &Pubkey) -> bool {
    *program == system_program::id()
        || *program == spl_token::id()
        || *program == spl_token_2022::id()
}

/// Map a ledger-reported transaction error to a rejection reason
///
/// `programs` lists the program invoked by each instruction, as returned by
/// [`instruction_programs`]; it resolves program-specific custom errors.
pub fn rejection_from_transaction_error(
    err: &TransactionError,
    programs: &[Pubkey],
) -> RejectionReason {
    match err {
        TransactionError::InsufficientFundsForFee
        | TransactionError::InsufficientFundsForRent { .. }
        | TransactionError::InstructionError(_, InstructionError::InsufficientFunds) => {
            RejectionReason::InsufficientFunds
        }
        TransactionError::InstructionError(index, InstructionError::Custom(1))
            if programs
                .get(usize::from(*index))
                .is_some_and(custom_one_is_insufficient_funds) =>
        {
            RejectionReason::InsufficientFunds
        }
        TransactionError::BlockhashNotFound => RejectionReason::StaleRecencyToken,
        TransactionError::SignatureFailure | TransactionError::MissingSignatureForFee => {
            RejectionReason::InvalidSignature(err.to_string())
        }
        other => RejectionReason::Other(other.to_string()),
    }
}

/// Fallback classification on the error text
pub fn rejection_from_message(message: &str) -> RejectionReason {
    let lower = message.to_lowercase();
    if lower.contains("insufficient funds") || lower.contains("insufficient lamports") {
        RejectionReason::InsufficientFunds
    } else if lower.contains("blockhash not found")
        || lower.contains("block height exceeded")
        || lower.contains("transaction expired")
    {
        RejectionReason::StaleRecencyToken
    } else {
        RejectionReason::Other(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_variants() {
        assert_eq!(
            rejection_from_transaction_error(&TransactionError::InsufficientFundsForFee, &[]),
            RejectionReason::InsufficientFunds
        );
        for program in [system_program::id(), spl_token::id(), spl_token_2022::id()] {
            assert_eq!(
                rejection_from_transaction_error(
                    &TransactionError::InstructionError(1, InstructionError::Custom(1)),
                    &[spl_associated_token_account::id(), program]
                ),
                RejectionReason::InsufficientFunds
            );
        }
    }

    #[test]
    fn test_custom_one_of_other_programs_kept_distinct() {
        let err = TransactionError::InstructionError(0, InstructionError::Custom(1));
        assert!(matches!(
            rejection_from_transaction_error(&err, &[spl_associated_token_account::id()]),
            RejectionReason::Other(_)
        ));
        // unknown instruction index
        assert!(matches!(
            rejection_from_transaction_error(&err, &[]),
            RejectionReason::Other(_)
        ));
    }

    #[test]
    fn test_signature_failures_are_invalid_signature() {
        for err in [
            TransactionError::SignatureFailure,
            TransactionError::MissingSignatureForFee,
        ] {
            assert!(matches!(
                rejection_from_transaction_error(&err, &[]),
                RejectionReason::InvalidSignature(_)
            ));
        }
    }

    #[test]
    fn test_instruction_programs_in_order() {
        let payer = Pubkey::new_unique();
        let tx = Transaction::new_with_payer(
            &[
                solana_sdk::system_instruction::transfer(&payer, &Pubkey::new_unique(), 1),
                spl_token::instruction::mint_to_checked(
                    &spl_token::id(),
                    &Pubkey::new_unique(),
                    &Pubkey::new_unique(),
                    &payer,
                    &[],
                    1,
                    9,
                )
                .unwrap(),
            ],
            Some(&payer),
        );
        assert_eq!(
            instruction_programs(&tx),
            vec![system_program::id(), spl_token::id()]
        );
    }

    #[test]
    fn test_stale_blockhash() {
        assert_eq!(
            rejection_from_transaction_error(&TransactionError::BlockhashNotFound, &[]),
            RejectionReason::StaleRecencyToken
        );
        assert_eq!(
            rejection_from_message("Transaction simulation failed: Blockhash not found"),
            RejectionReason::StaleRecencyToken
        );
    }

    #[test]
    fn test_unknown_message_kept_verbatim() {
        let reason = rejection_from_message("custom program error: 0x10");
        assert_eq!(
            reason,
            RejectionReason::Other("custom program error: 0x10".to_string())
        );
    }

    #[test]
    fn test_message_classification_is_case_insensitive() {
        assert_eq!(
            rejection_from_message("Attempt to debit an account but found no record; INSUFFICIENT FUNDS"),
            RejectionReason::InsufficientFunds
        );
    }
}
