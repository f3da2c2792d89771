use proptest::prelude::*;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use crate::flows;
use crate::test_utils::{MockLedger, FEE_PER_SIGNATURE};
use crate::tx_builder::{LedgerError, RejectionReason};

/// Balances of (sender, recipient) after attempting the transfer
fn transfer_outcome(balance: u64, lamports: u64) -> (Result<(), LedgerError>, u64, u64) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let ledger = MockLedger::new();
        let sender = Keypair::new();
        let recipient = Pubkey::new_unique();
        ledger.fund(&sender.pubkey(), balance).await;

        let result = flows::transfer::run(&ledger, &sender, &recipient, lamports)
            .await
            .map(|_| ());
        (
            result,
            ledger.balance(&sender.pubkey()).await,
            ledger.balance(&recipient).await,
        )
    })
}

#[test]
fn test_transfer_of_entire_balance_less_fee_leaves_zero() {
    let (result, sender, recipient) = transfer_outcome(1_000_000 + FEE_PER_SIGNATURE, 1_000_000);
    assert!(result.is_ok());
    assert_eq!(sender, 0);
    assert_eq!(recipient, 1_000_000);
}

#[test]
fn test_transfer_one_lamport_short_rejected() {
    let (result, sender, recipient) = transfer_outcome(1_000_000 + FEE_PER_SIGNATURE - 1, 1_000_000);
    assert!(matches!(
        result,
        Err(LedgerError::SubmissionRejected(RejectionReason::InsufficientFunds))
    ));
    assert_eq!(sender, 1_000_000 + FEE_PER_SIGNATURE - 1);
    assert_eq!(recipient, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_transfer_conserves_or_changes_nothing(
        balance in 0u64..10_000_000_000,
        lamports in 0u64..10_000_000_000,
    ) {
        let (result, sender, recipient) = transfer_outcome(balance, lamports);
        if balance >= lamports + FEE_PER_SIGNATURE {
            prop_assert!(result.is_ok());
            prop_assert_eq!(sender, balance - lamports - FEE_PER_SIGNATURE);
            prop_assert_eq!(recipient, lamports);
        } else {
            prop_assert!(matches!(
                result,
                Err(LedgerError::SubmissionRejected(RejectionReason::InsufficientFunds))
            ));
            prop_assert_eq!(sender, balance);
            prop_assert_eq!(recipient, 0);
        }
    }
}
