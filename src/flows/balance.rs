//! Native balance lookup

use std::fmt;

use solana_sdk::pubkey::Pubkey;

use crate::amount::lamports_to_sol;
use crate::rpc_manager::LedgerRpc;
use crate::tx_builder::{query_balance, LedgerError};

/// Balance of one address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceLine {
    pub address: Pubkey,
    pub lamports: u64,
}

impl fmt::Display for BalanceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account balance: {} SOL ({})",
            lamports_to_sol(self.lamports),
            self.address
        )
    }
}

/// Read balances in the order given; the first failing query aborts
pub async fn run(rpc: &dyn LedgerRpc, addresses: &[Pubkey]) -> Result<Vec<BalanceLine>, LedgerError> {
    let mut lines = Vec::with_capacity(addresses.len());
    for address in addresses {
        let lamports = query_balance(rpc, address).await?;
        tracing::debug!(address = %address, lamports = %lamports, "Balance read");
        lines.push(BalanceLine {
            address: *address,
            lamports,
        });
    }
    Ok(lines)
}
