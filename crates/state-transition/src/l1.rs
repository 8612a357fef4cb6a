//! L1 data cost of rollup transactions.

use core::fmt::Debug;

use alloy_primitives::U256;
use auto_impl::auto_impl;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{frontier, istanbul, optimism},
    Message,
};

/// Prices the L1 data a rollup transaction occupies.
///
/// The cost is charged to the sender when gas is bought and credited to the
/// [`L1_FEE_RECIPIENT`](optimism::L1_FEE_RECIPIENT) after execution.
#[auto_impl(&, Box, Arc)]
pub trait L1CostFn: Debug {
    /// Returns the L1 data cost of a message.
    ///
    /// # Arguments
    ///
    /// * `block_number` - The number of the L2 block the message is applied in
    /// * `msg` - The message
    ///
    /// # Returns
    ///
    /// The cost in wei, or `None` when the message pays no L1 data cost.
    fn l1_cost(&self, block_number: u64, msg: &dyn Message) -> Option<U256>;
}

/// The L1 fee parameters of a Bedrock block, as published by the L1 block attributes deposit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1BlockInfo {
    /// The base fee of the latest known L1 block.
    pub l1_base_fee: U256,
    /// Fixed data gas added to every transaction.
    pub overhead: U256,
    /// Fee multiplier, scaled by [`L1_FEE_SCALAR_DIVISOR`](optimism::L1_FEE_SCALAR_DIVISOR).
    pub scalar: U256,
}

impl L1BlockInfo {
    /// Creates the fee parameters.
    pub const fn new(l1_base_fee: U256, overhead: U256, scalar: U256) -> Self {
        Self { l1_base_fee, overhead, scalar }
    }

    /// `(rollup_data_gas + overhead) * l1_base_fee * scalar / 1_000_000`
    pub fn data_cost(&self, rollup_data_gas: u64) -> U256 {
        (U256::from(rollup_data_gas) + self.overhead)
            .saturating_mul(self.l1_base_fee)
            .saturating_mul(self.scalar)
            / U256::from(optimism::L1_FEE_SCALAR_DIVISOR)
    }
}

impl L1CostFn for L1BlockInfo {
    fn l1_cost(&self, _block_number: u64, msg: &dyn Message) -> Option<U256> {
        let rollup_data_gas = msg.rollup_data_gas();
        if msg.is_deposit_tx() || rollup_data_gas == 0 {
            return None;
        }
        Some(self.data_cost(rollup_data_gas))
    }
}

/// The L1 data gas of an encoded transaction: zero bytes cost 4 and non-zero bytes cost 16.
pub fn rollup_data_gas(encoded: &[u8]) -> u64 {
    encoded.iter().fold(0u64, |gas, byte| {
        let cost =
            if *byte == 0 { frontier::TX_DATA_ZERO_GAS } else { istanbul::TX_DATA_NON_ZERO_GAS };
        gas.saturating_add(cost)
    })
}
