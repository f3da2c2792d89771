//! Benchmarks for bundle construction and submission
//!
//! - Operation building and assembly for a metadata mint bundle
//! - Local dependency-order check as the bundle grows
//! - Sign-and-submit round trip against the in-memory ledger

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use mintforge::flows::token_metadata::metadata_mint_params;
use mintforge::rpc_manager::LedgerRpc;
use mintforge::structured_logging::StructuredLogger;
use mintforge::test_utils::{rent_for, MockLedger};
use mintforge::token::{MintSpace, TokenMetadataSpec};
use mintforge::tx_builder::{assemble_bundle, build_operation, submit, OperationParams};

fn metadata_spec(fields: usize) -> TokenMetadataSpec {
    TokenMetadataSpec {
        name: "Bench TOKEN".to_string(),
        symbol: "BNCH".to_string(),
        uri: "https://example.com/bench.json".to_string(),
        additional: (0..fields)
            .map(|i| (format!("key{}", i), format!("value{}", i)))
            .collect(),
    }
}

fn params_for(payer: &Pubkey, mint: &Pubkey, spec: &TokenMetadataSpec) -> Vec<OperationParams> {
    let space = MintSpace::for_metadata(spec).unwrap();
    metadata_mint_params(payer, mint, spec, 6, space, rent_for(space.funded))
}

fn bench_assembly(c: &mut Criterion) {
    let payer = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let spec = metadata_spec(1);

    c.bench_function("assemble_metadata_bundle", |b| {
        b.iter(|| {
            let operations: Vec<_> = params_for(&payer, &mint, &spec)
                .into_iter()
                .map(|p| build_operation(p).unwrap())
                .collect();
            let bundle = assemble_bundle(operations, payer, Hash::default()).unwrap();
            black_box(bundle.message())
        })
    });
}

fn bench_order_check(c: &mut Criterion) {
    let payer = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let mut group = c.benchmark_group("sanity_check_order");

    for fields in [0usize, 4, 16] {
        let spec = metadata_spec(fields);
        let operations: Vec<_> = params_for(&payer, &mint, &spec)
            .into_iter()
            .map(|p| build_operation(p).unwrap())
            .collect();
        let bundle = assemble_bundle(operations, payer, Hash::default()).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(fields), &bundle, |b, bundle| {
            b.iter(|| black_box(bundle.sanity_check_order()).unwrap())
        });
    }
    group.finish();
}

fn bench_submit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = MockLedger::new();
    let payer = Keypair::new();
    let logger = StructuredLogger::for_run();
    rt.block_on(ledger.fund(&payer.pubkey(), u64::MAX / 2));

    c.bench_function("submit_transfer_mock_ledger", |b| {
        b.iter(|| {
            rt.block_on(async {
                let op = build_operation(OperationParams::Transfer {
                    from: payer.pubkey(),
                    to: Pubkey::new_unique(),
                    lamports: 1,
                })
                .unwrap();
                let blockhash = ledger.get_latest_blockhash().await.unwrap();
                let bundle = assemble_bundle(vec![op], payer.pubkey(), blockhash).unwrap();
                black_box(submit(&ledger, &bundle, &[&payer], &logger).await.unwrap())
            })
        })
    });
}

criterion_group!(benches, bench_assembly, bench_order_check, bench_submit);
criterion_main!(benches);
