use core::fmt::Debug;

use auto_impl::auto_impl;
pub use revm::primitives::hardfork::SpecId;
use serde::{Deserialize, Serialize};

/// The set of protocol rules in force for one block.
///
/// The state transition only consumes these flags, it never decides them. They are produced by
/// a [`ChainRules`] implementation from the block number, the block timestamp and whether the
/// block was produced after the merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    /// The chain id.
    pub chain_id: u64,
    /// Contract creations pay the creation base cost.
    pub is_homestead: bool,
    /// Precompiles 0x05..=0x08 are available.
    pub is_byzantium: bool,
    /// EIP-2028 calldata pricing.
    pub is_istanbul: bool,
    /// EIP-2929/2930 access lists and warm sets.
    pub is_berlin: bool,
    /// EIP-1559 fee market and EIP-3529 refund reduction.
    pub is_london: bool,
    /// The block was produced under proof-of-stake.
    pub is_merge: bool,
    /// EIP-3860 init code limit and metering, EIP-3651 warm coinbase.
    pub is_shanghai: bool,
    /// EIP-4844 data gas.
    pub is_sharding: bool,
    /// The rollup fee surcharge (base fee and L1 fee vaults) applies.
    pub is_optimism_bedrock: bool,
}

impl Rules {
    /// Derives the rules of a fixed-fork chain.
    ///
    /// Rollup rules are never active for a plain Ethereum fork.
    pub fn from_spec(spec: SpecId, is_merge: bool) -> Self {
        Self {
            chain_id: 1,
            is_homestead: spec.is_enabled_in(SpecId::HOMESTEAD),
            is_byzantium: spec.is_enabled_in(SpecId::BYZANTIUM),
            is_istanbul: spec.is_enabled_in(SpecId::ISTANBUL),
            is_berlin: spec.is_enabled_in(SpecId::BERLIN),
            is_london: spec.is_enabled_in(SpecId::LONDON),
            is_merge,
            is_shanghai: spec.is_enabled_in(SpecId::SHANGHAI),
            is_sharding: spec.is_enabled_in(SpecId::CANCUN),
            is_optimism_bedrock: false,
        }
    }
}

/// Rule activation for a chain.
///
/// This is a pure function of the block coordinates: implementations must return the same
/// [`Rules`] for the same inputs.
#[auto_impl(&, Box, Arc)]
pub trait ChainRules: Debug {
    /// Returns the rules in force for a block.
    ///
    /// # Arguments
    ///
    /// * `number` - The block number
    /// * `is_merge` - Whether the block carries a beacon randomness value
    /// * `timestamp` - The block timestamp
    fn rules(&self, number: u64, is_merge: bool, timestamp: u64) -> Rules;
}

impl ChainRules for SpecId {
    fn rules(&self, _number: u64, is_merge: bool, _timestamp: u64) -> Rules {
        Rules::from_spec(*self, is_merge)
    }
}

/// Rollup-specific chain configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimismConfig {
    /// First block under Bedrock rules. `None` disables the rollup fee surcharge.
    pub bedrock_block: Option<u64>,
}

/// Activation schedule of a chain.
///
/// Forks up to London activate by block number, later forks by block timestamp. An absent
/// activation point means the fork never activates.
///
/// ```rust,ignore
/// let config: ChainConfig = serde_json::from_str(r#"{
///     "chainId": 10,
///     "homesteadBlock": 0,
///     "londonBlock": 0,
///     "shanghaiTime": 1704992401,
///     "optimism": { "bedrockBlock": 0 }
/// }"#)?;
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChainConfig {
    /// The chain id.
    pub chain_id: u64,
    /// Homestead activation block.
    pub homestead_block: Option<u64>,
    /// Byzantium activation block.
    pub byzantium_block: Option<u64>,
    /// Istanbul activation block.
    pub istanbul_block: Option<u64>,
    /// Berlin activation block.
    pub berlin_block: Option<u64>,
    /// London activation block.
    pub london_block: Option<u64>,
    /// Shanghai activation timestamp.
    pub shanghai_time: Option<u64>,
    /// Data sharding activation timestamp.
    pub sharding_time: Option<u64>,
    /// Rollup configuration, `None` for L1 chains.
    pub optimism: Option<OptimismConfig>,
}

impl ChainConfig {
    /// Creates a config with every block-activated fork live from genesis and no time-activated
    /// forks.
    pub fn all_blocks_from_genesis(chain_id: u64) -> Self {
        Self {
            chain_id,
            homestead_block: Some(0),
            byzantium_block: Some(0),
            istanbul_block: Some(0),
            berlin_block: Some(0),
            london_block: Some(0),
            ..Default::default()
        }
    }

    /// Sets the Shanghai activation timestamp.
    pub fn with_shanghai_time(mut self, time: u64) -> Self {
        self.shanghai_time = Some(time);
        self
    }

    /// Sets the data sharding activation timestamp.
    pub fn with_sharding_time(mut self, time: u64) -> Self {
        self.sharding_time = Some(time);
        self
    }

    /// Sets the Bedrock activation block, turning the chain into a rollup.
    pub fn with_bedrock_block(mut self, block: u64) -> Self {
        self.optimism = Some(OptimismConfig { bedrock_block: Some(block) });
        self
    }

    /// Whether the chain is a rollup.
    pub const fn is_optimism(&self) -> bool {
        self.optimism.is_some()
    }

    /// Whether the EIP-1559 fee market is active at the given block.
    pub fn is_london(&self, number: u64) -> bool {
        is_block_forked(self.london_block, number)
    }

    /// Whether data gas is priced at the given timestamp.
    pub fn is_sharding(&self, timestamp: u64) -> bool {
        is_timestamp_forked(self.sharding_time, timestamp)
    }

    /// Whether Bedrock rules are active at the given block.
    pub fn is_optimism_bedrock(&self, number: u64) -> bool {
        self.optimism.is_some_and(|op| is_block_forked(op.bedrock_block, number))
    }
}

impl ChainRules for ChainConfig {
    fn rules(&self, number: u64, is_merge: bool, timestamp: u64) -> Rules {
        Rules {
            chain_id: self.chain_id,
            is_homestead: is_block_forked(self.homestead_block, number),
            is_byzantium: is_block_forked(self.byzantium_block, number),
            is_istanbul: is_block_forked(self.istanbul_block, number),
            is_berlin: is_block_forked(self.berlin_block, number),
            is_london: self.is_london(number),
            is_merge,
            is_shanghai: is_timestamp_forked(self.shanghai_time, timestamp),
            is_sharding: self.is_sharding(timestamp),
            is_optimism_bedrock: self.is_optimism_bedrock(number),
        }
    }
}

fn is_block_forked(activation: Option<u64>, number: u64) -> bool {
    activation.is_some_and(|block| block <= number)
}

fn is_timestamp_forked(activation: Option<u64>, timestamp: u64) -> bool {
    activation.is_some_and(|time| time <= timestamp)
}
