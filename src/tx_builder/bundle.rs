//! Bundles: ordered, atomically applied operation lists
//!
//! A [`Bundle`] keeps the caller's order untouched. The order is checked
//! against each operation's declared dependencies by
//! [`Bundle::sanity_check_order`] before anything is signed or sent.

use std::collections::HashMap;

use nonempty::NonEmpty;
use solana_sdk::{hash::Hash, instruction::Instruction, message::Message, pubkey::Pubkey};

use crate::tx_builder::errors::{LedgerError, OrderViolation, RejectionReason};
use crate::tx_builder::operations::{Operation, Resource};

/// An ordered operation list with its fee payer and recency token
#[derive(Debug, Clone)]
pub struct Bundle {
    operations: NonEmpty<Operation>,
    fee_payer: Pubkey,
    recent_blockhash: Hash,
}

/// Assemble operations into a bundle, preserving their order
///
/// # Errors
///
/// Returns `LedgerError::MalformedBundle` if `operations` is empty.
pub fn assemble_bundle(
    operations: Vec<Operation>,
    fee_payer: Pubkey,
    recent_blockhash: Hash,
) -> Result<Bundle, LedgerError> {
    let operations = NonEmpty::from_vec(operations)
        .ok_or_else(|| LedgerError::MalformedBundle("bundle has no operations".to_string()))?;

    Ok(Bundle {
        operations,
        fee_payer,
        recent_blockhash,
    })
}

impl Bundle {
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn fee_payer(&self) -> &Pubkey {
        &self.fee_payer
    }

    pub fn recent_blockhash(&self) -> &Hash {
        &self.recent_blockhash
    }

    pub fn instructions(&self) -> Vec<Instruction> {
        self.operations
            .iter()
            .map(|op| op.instruction().clone())
            .collect()
    }

    /// Compile the bundle into a legacy message
    pub fn message(&self) -> Message {
        Message::new_with_blockhash(
            &self.instructions(),
            Some(&self.fee_payer),
            &self.recent_blockhash,
        )
    }

    /// Every identity that has to sign, fee payer first
    pub fn required_signers(&self) -> Vec<Pubkey> {
        self.message().signer_keys().into_iter().copied().collect()
    }

    /// Check the operation order against the declared dependencies
    ///
    /// Only resources provided by an operation *inside* this bundle are
    /// checked; anything else is assumed to exist (or not) on the ledger
    /// already and is left for the ledger to judge.
    ///
    /// # Errors
    ///
    /// `LedgerError::SubmissionRejected(RejectionReason::DependencyOrder)` for
    /// the first misplaced operation.
    pub fn sanity_check_order(&self) -> Result<(), LedgerError> {
        // first provider of each resource
        let mut providers: HashMap<Resource, usize> = HashMap::new();
        for (idx, op) in self.operations.iter().enumerate() {
            for resource in op.provides() {
                providers.entry(*resource).or_insert(idx);
            }
        }

        for (idx, op) in self.operations.iter().enumerate() {
            for resource in op.requires() {
                if let Some(&provider) = providers.get(resource) {
                    if provider >= idx {
                        return Err(order_error(
                            idx,
                            op,
                            OrderViolation::RequiredLater {
                                resource: *resource,
                                provider,
                            },
                        ));
                    }
                }
            }

            for resource in op.precludes() {
                if let Some(&provider) = providers.get(resource) {
                    if provider < idx {
                        return Err(order_error(
                            idx,
                            op,
                            OrderViolation::PrecludedEarlier {
                                resource: *resource,
                                provider,
                            },
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

fn order_error(position: usize, op: &Operation, violation: OrderViolation) -> LedgerError {
    LedgerError::rejected(RejectionReason::DependencyOrder {
        position,
        kind: op.kind(),
        violation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenProgram;
    use crate::tx_builder::operations::{build_operation, OperationKind, OperationParams};

    fn metadata_mint_ops(payer: Pubkey, mint: Pubkey) -> Vec<Operation> {
        vec![
            build_operation(OperationParams::CreateAccount {
                payer,
                new_account: mint,
                lamports: 3_000_000,
                space: 234,
                owner: spl_token_2022::id(),
            })
            .unwrap(),
            build_operation(OperationParams::InitializeMetadataPointer {
                mint,
                authority: Some(payer),
                metadata_address: Some(mint),
            })
            .unwrap(),
            build_operation(OperationParams::InitializeMint {
                mint,
                decimals: 6,
                mint_authority: payer,
                freeze_authority: None,
                program: TokenProgram::Token2022,
            })
            .unwrap(),
            build_operation(OperationParams::InitializeMetadata {
                mint,
                update_authority: payer,
                mint_authority: payer,
                name: "Second TOKEN".to_string(),
                symbol: "STOK".to_string(),
                uri: "https://example.com/image.png".to_string(),
            })
            .unwrap(),
        ]
    }

    #[test]
    fn test_assemble_empty_is_malformed() {
        let result = assemble_bundle(vec![], Pubkey::new_unique(), Hash::new_unique());
        assert!(matches!(result, Err(LedgerError::MalformedBundle(_))));
    }

    #[test]
    fn test_assemble_preserves_order() {
        let payer = Pubkey::new_unique();
        let ops = metadata_mint_ops(payer, Pubkey::new_unique());
        let kinds: Vec<OperationKind> = ops.iter().map(|op| op.kind()).collect();

        let bundle = assemble_bundle(ops.clone(), payer, Hash::new_unique()).unwrap();

        assert_eq!(bundle.len(), 4);
        assert_eq!(
            bundle.operations().map(|op| op.kind()).collect::<Vec<_>>(),
            kinds
        );
        assert_eq!(
            bundle.instructions(),
            ops.into_iter()
                .map(Operation::into_instruction)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_required_signers_fee_payer_first() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let bundle =
            assemble_bundle(metadata_mint_ops(payer, mint), payer, Hash::new_unique()).unwrap();

        let signers = bundle.required_signers();
        assert_eq!(signers[0], payer);
        assert!(signers.contains(&mint));
        assert_eq!(signers.len(), 2);
    }

    #[test]
    fn test_valid_order_passes() {
        let payer = Pubkey::new_unique();
        let bundle = assemble_bundle(
            metadata_mint_ops(payer, Pubkey::new_unique()),
            payer,
            Hash::new_unique(),
        )
        .unwrap();

        assert!(bundle.sanity_check_order().is_ok());
    }

    #[test]
    fn test_reversed_order_rejected() {
        let payer = Pubkey::new_unique();
        let mut ops = metadata_mint_ops(payer, Pubkey::new_unique());
        ops.reverse();
        let bundle = assemble_bundle(ops, payer, Hash::new_unique()).unwrap();

        match bundle.sanity_check_order() {
            Err(LedgerError::SubmissionRejected(RejectionReason::DependencyOrder {
                position,
                kind,
                violation: OrderViolation::RequiredLater { .. },
            })) => {
                assert_eq!(position, 0);
                assert_eq!(kind, OperationKind::InitializeMetadata);
            }
            other => panic!("Expected DependencyOrder rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_extension_after_mint_rejected() {
        let payer = Pubkey::new_unique();
        let mut ops = metadata_mint_ops(payer, Pubkey::new_unique());
        // initialize-mint ahead of initialize-metadata-pointer
        ops.swap(1, 2);
        let bundle = assemble_bundle(ops, payer, Hash::new_unique()).unwrap();

        match bundle.sanity_check_order() {
            Err(LedgerError::SubmissionRejected(RejectionReason::DependencyOrder {
                position,
                violation: OrderViolation::PrecludedEarlier { provider, .. },
                ..
            })) => {
                assert_eq!(position, 2);
                assert_eq!(provider, 1);
            }
            other => panic!("Expected PrecludedEarlier rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_dependencies_outside_bundle_are_assumed() {
        // mint-to against a mint created by an earlier bundle
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let op = build_operation(OperationParams::MintTo {
            mint,
            destination: Pubkey::new_unique(),
            authority: payer,
            amount: 1,
            decimals: 9,
            program: TokenProgram::Legacy,
        })
        .unwrap();
        let bundle = assemble_bundle(vec![op], payer, Hash::new_unique()).unwrap();

        assert!(bundle.sanity_check_order().is_ok());
    }
}
