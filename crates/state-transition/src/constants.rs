//! Protocol constants used by the state transition.
//!
//! It groups the constants by the fork that introduced (or last changed) them, so that the value
//! in force for a given set of [`Rules`](crate::Rules) is easy to find.

/// Constants in force since genesis.
pub mod frontier {
    pub use revm::primitives::KECCAK_EMPTY;

    /// Base cost of every transaction that is not a contract creation.
    pub const TX_GAS: u64 = 21_000;
    /// Cost per zero byte of transaction payload.
    pub const TX_DATA_ZERO_GAS: u64 = 4;
    /// Cost per non-zero byte of transaction payload before Istanbul.
    pub const TX_DATA_NON_ZERO_GAS: u64 = 68;
    /// Maximum fraction of the used gas that may be refunded before London, expressed as the
    /// divisor `used_gas / REFUND_QUOTIENT`.
    pub const REFUND_QUOTIENT: u64 = 2;
}

/// Constants for the `HOMESTEAD` fork.
pub mod homestead {
    /// Base cost of a contract creation transaction. Before Homestead creations paid
    /// [`TX_GAS`](super::frontier::TX_GAS).
    pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
}

/// Constants for the `ISTANBUL` fork (EIP-2028).
pub mod istanbul {
    /// Cost per non-zero byte of transaction payload.
    pub const TX_DATA_NON_ZERO_GAS: u64 = 16;
}

/// Constants for the `BERLIN` fork (EIP-2930).
pub mod berlin {
    /// Cost per address listed in an access list.
    pub const TX_ACCESS_LIST_ADDRESS_GAS: u64 = 2_400;
    /// Cost per storage key listed in an access list.
    pub const TX_ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1_900;
}

/// Constants for the `LONDON` fork.
pub mod london {
    /// Refund divisor after EIP-3529.
    pub const REFUND_QUOTIENT: u64 = 5;
}

/// Constants for the `SHANGHAI` fork (EIP-3860).
pub mod shanghai {
    pub use revm::primitives::MAX_INITCODE_SIZE;

    /// Cost per 32-byte word of init code in a creation transaction.
    pub const INIT_CODE_WORD_GAS: u64 = 2;
}

/// Constants for data sharding (EIP-4844).
pub mod sharding {
    pub use alloy_eips::eip4844::DATA_GAS_PER_BLOB;

    /// Maximum number of data blobs a single block may reference.
    pub const MAX_BLOBS_PER_BLOCK: u64 = 6;
    /// Maximum data gas a single block may consume.
    pub const MAX_DATA_GAS_PER_BLOCK: u64 = DATA_GAS_PER_BLOB * MAX_BLOBS_PER_BLOCK;
}

/// Constants for the rollup (Optimism Bedrock) extension.
pub mod optimism {
    use alloy_primitives::{address, Address};

    /// Gas allowance declared by every deposit transaction. It is large enough that it is never
    /// the binding constraint of a deposit; deposits never receive refunds of it.
    pub const DEPOSIT_TX_GAS: u64 = 100_000_000;

    /// Nonce reported by deposit transactions. Deposits are authenticated on L1 and carry no
    /// nonce of their own.
    pub const DEPOSIT_TX_NONCE: u64 = u64::MAX;

    /// Vault credited with `gas_used × base_fee` after every non-deposit transaction.
    pub const BASE_FEE_RECIPIENT: Address = address!("0x4200000000000000000000000000000000000019");

    /// Vault credited with the L1 data cost of every non-deposit transaction.
    pub const L1_FEE_RECIPIENT: Address = address!("0x420000000000000000000000000000000000001a");

    /// Divisor applied to the L1 fee scalar.
    pub const L1_FEE_SCALAR_DIVISOR: u64 = 1_000_000;
}
