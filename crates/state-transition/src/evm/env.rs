use alloy_eips::eip4844::calc_blob_gasprice;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// The block a transaction is applied in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockEnv {
    /// The block number.
    pub number: u64,
    /// The block timestamp.
    pub timestamp: u64,
    /// The fee recipient.
    pub coinbase: Address,
    /// The base fee, present from London on.
    pub base_fee: Option<U256>,
    /// The beacon randomness value. Its presence marks a post-merge block.
    pub random: Option<B256>,
    /// The excess data gas of the parent, present once data sharding is active.
    pub excess_data_gas: Option<u64>,
}

impl BlockEnv {
    /// Whether the block was produced after the merge.
    pub const fn is_merge(&self) -> bool {
        self.random.is_some()
    }

    /// The price per data gas, derived from the excess data gas.
    pub fn data_gas_price(&self) -> Option<U256> {
        self.excess_data_gas.map(|excess| U256::from(calc_blob_gasprice(excess)))
    }
}

/// Execution switches that are not part of the protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvmConfig {
    /// Lets messages with zero fee fields run below the base fee, without paying the coinbase.
    /// Used by read-only calls and gas estimation.
    pub no_base_fee: bool,
}

impl EvmConfig {
    /// Sets [`Self::no_base_fee`].
    pub const fn with_no_base_fee(mut self, no_base_fee: bool) -> Self {
        self.no_base_fee = no_base_fee;
        self
    }
}
