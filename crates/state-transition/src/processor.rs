use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    apply_message, ChainRules, Evm, ExecutionResult, GasPool, Interpreter, StateDb,
    TransitionError, TxEnvelope, TxInspector,
};

/// The receipt fields produced by the state transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    /// The EIP-2718 type byte of the transaction.
    pub tx_type: u8,
    /// Whether execution completed normally.
    pub status: bool,
    /// The gas used by the transaction.
    pub gas_used: u64,
    /// The gas used by the block up to and including the transaction.
    pub cumulative_gas_used: u64,
}

/// Applies a transaction of the current block and commits its changes.
///
/// # Arguments
///
/// * `evm` - The execution context of the block
/// * `gas_pool` - The gas left in the block
/// * `tx` - The transaction
/// * `sender` - The recovered signer, ignored for deposits
/// * `used_gas` - The gas used by the block so far, increased by the gas used by `tx`
///
/// # Returns
///
/// The receipt and the execution result, or the consensus error that excludes `tx` from the
/// block. On error `used_gas` is unchanged and so is the state, except for the mint of a deposit
/// that did not fit in the block.
pub fn apply_transaction<S, I, C, N>(
    evm: &mut Evm<S, I, C, N>,
    gas_pool: &mut GasPool,
    tx: &TxEnvelope,
    sender: Address,
    used_gas: &mut u64,
) -> Result<(TxReceipt, ExecutionResult), TransitionError>
where
    S: StateDb,
    I: Interpreter<S>,
    C: ChainRules,
    N: TxInspector,
{
    let msg = tx.as_message(sender, evm.block.base_fee);
    let result = apply_message(evm, &msg, gas_pool)?;
    evm.state.finalize();

    *used_gas = used_gas.saturating_add(result.used_gas);
    let receipt = TxReceipt {
        tx_type: tx.tx_type(),
        status: !result.failed(),
        gas_used: result.used_gas,
        cumulative_gas_used: *used_gas,
    };
    debug!(
        tx_type = receipt.tx_type,
        status = receipt.status,
        gas_used = receipt.gas_used,
        cumulative_gas_used = receipt.cumulative_gas_used,
        "Applied transaction"
    );
    Ok((receipt, result))
}
